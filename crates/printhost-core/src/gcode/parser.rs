//! Instruction parser
//!
//! Reduces raw G-code text to executable command lines. Only `;` comments
//! are recognised; everything else on a line is passed through untouched.

/// Marker that starts a comment running to the end of the line
pub const COMMENT_MARKER: char = ';';

/// Strip the comment from a single line and trim the remainder.
///
/// Returns `None` when nothing executable is left.
pub fn strip_comment(line: &str) -> Option<&str> {
    let code = match line.find(COMMENT_MARKER) {
        Some(pos) => &line[..pos],
        None => line,
    };

    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse instruction file text into ordered command lines.
///
/// Whole-line comments and blank lines are dropped, inline comments are cut
/// off, and the order of surviving lines is preserved. An empty result means
/// the file holds nothing to print.
pub fn parse_instructions(text: &str) -> Vec<String> {
    let commands: Vec<String> = text
        .split('\n')
        .filter_map(strip_comment)
        .map(str::to_string)
        .collect();

    tracing::debug!(
        "Parsed {} executable lines from {} bytes of G-code",
        commands.len(),
        text.len()
    );
    commands
}
