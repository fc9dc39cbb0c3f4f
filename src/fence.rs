//! Markdown fence handling for model responses.
//!
//! Callers strip fences before handing source to a [`crate::CodeExecutor`];
//! the executor itself treats its input as plain program text.

/// Opening and closing marker of a fenced block.
const FENCE: &str = "```";

/// Extracts the program from a model response.
///
/// A response starting with a fence (```` ```python ```` or a bare
/// ```` ``` ````) yields the text between the opening line and the next
/// fence, trimmed. Anything else is returned trimmed.
pub fn strip_code_fence(response: &str) -> &str {
    let response = response.trim();

    let Some(after_fence) = response.strip_prefix(FENCE) else {
        return response;
    };

    // The info string (e.g. `python`) runs to the end of the opening line.
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        None => "",
    };

    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };

    body.trim()
}
