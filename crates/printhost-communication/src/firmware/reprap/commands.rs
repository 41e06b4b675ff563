//! RepRap G/M-code constants used by the host itself

/// Report hotend temperature
pub const REPORT_TEMPERATURE: &str = "M105";

/// Commands issued when a print is stopped: heater off, lift the nozzle
/// 5mm in relative mode, back to absolute, home X and Y
pub const SHUTDOWN_SEQUENCE: [&str; 5] = ["M104 S0", "G91", "G1 Z5 F300", "G90", "G28 X0 Y0"];

/// Separator for multi-command scripts submitted in one call
pub const SCRIPT_SEPARATOR: char = ';';

/// Split a script into trimmed, non-empty commands
pub fn split_script(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(SCRIPT_SEPARATOR)
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
}
