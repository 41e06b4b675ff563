//! RepRap response parser
//!
//! Recognizes the two inbound line kinds the host reacts to: the `ok`
//! acknowledgment and temperature telemetry (`T:<int>.<digit>`). Everything
//! else is passed through to observers untouched.

use regex::Regex;
use std::sync::OnceLock;

fn temperature_pattern() -> &'static Regex {
    static TEMPERATURE_REGEX: OnceLock<Regex> = OnceLock::new();
    TEMPERATURE_REGEX.get_or_init(|| Regex::new(r"T:(\d+\.\d)").expect("invalid regex pattern"))
}

/// Classified inbound line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// Line acknowledges the in-flight command
    pub acknowledged: bool,
    /// Hotend reading carried by the line, in °C
    pub temperature: Option<f64>,
}

/// Whether the line acknowledges the in-flight command
pub fn is_acknowledgment(line: &str) -> bool {
    line.trim_start().starts_with("ok")
}

/// First `T:<int>.<digit>` reading in the line
pub fn parse_temperature(line: &str) -> Option<f64> {
    temperature_pattern()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Classify a line
pub fn parse(line: &str) -> ParsedResponse {
    ParsedResponse {
        acknowledged: is_acknowledgment(line),
        temperature: parse_temperature(line),
    }
}
