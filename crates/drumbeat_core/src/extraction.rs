//! Utilities for extracting structured data from completion-service output.
//!
//! Completions often wrap JSON in markdown code blocks or mix it with
//! explanatory text. These helpers pull out the JSON payload; parsing and
//! error mapping stay with the caller.

/// Extract JSON from a response that may contain markdown or extra text.
///
/// Tries, in order: ```` ```json ```` code blocks, balanced brackets,
/// balanced braces (whichever opens first). Returns `None` when no
/// candidate payload is found.
///
/// # Examples
///
/// ```
/// use drumbeat_core::extraction::extract_json;
///
/// let response = "Here you go:\n```json\n{\"id\": 123}\n```\n";
/// assert!(extract_json(response).unwrap().contains("123"));
/// ```
pub fn extract_json(response: &str) -> Option<String> {
    if let Some(json) = extract_from_code_block(response, "json") {
        return Some(json);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    match (bracket_pos, brace_pos) {
        (Some(b_pos), Some(c_pos)) if b_pos < c_pos => {
            extract_balanced(response, '[', ']').or_else(|| extract_balanced(response, '{', '}'))
        }
        (Some(_), None) => extract_balanced(response, '[', ']'),
        _ => {
            extract_balanced(response, '{', '}').or_else(|| extract_balanced(response, '[', ']'))
        }
    }
}

/// Extract the contents of the first fenced code block with the given tag,
/// or any untagged fence as a fallback.
fn extract_from_code_block(response: &str, tag: &str) -> Option<String> {
    let fence = format!("```{tag}");
    let start = response
        .find(&fence)
        .map(|pos| pos + fence.len())
        .or_else(|| response.find("```").map(|pos| pos + 3))?;
    let rest = &response[start..];
    let end = rest.find("```")?;
    let block = rest[..end].trim();
    if block.is_empty() {
        None
    } else {
        Some(block.to_string())
    }
}

/// Extract a balanced `open`..`close` span, respecting JSON string quoting.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in response[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
