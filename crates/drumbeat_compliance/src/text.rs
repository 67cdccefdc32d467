//! Markup stripping.

use regex::Regex;

/// Strip HTML markup down to plain text.
///
/// Script and style elements are dropped with their contents, remaining
/// tags are replaced with spaces, common entities are decoded, and
/// whitespace is collapsed.
///
/// # Examples
///
/// ```
/// use drumbeat_compliance::strip_html;
///
/// let plain = strip_html("<h2>Costs</h2><p>From&nbsp;&amp; up</p>");
/// assert_eq!(plain, "Costs From & up");
/// ```
pub fn strip_html(html: &str) -> String {
    // Compiled per call; content screening is not on a hot path.
    let embedded = Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>")
        .ok()
        .map(|re| re.replace_all(html, " ").into_owned())
        .unwrap_or_else(|| html.to_string());

    let stripped = Regex::new(r"<[^>]+>")
        .ok()
        .map(|re| re.replace_all(&embedded, " ").into_owned())
        .unwrap_or(embedded);

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
