//! Deterministic SEO scorer.
//!
//! Pure point allocation over a draft; the same inputs always produce the
//! same score, so drafts can be compared across runs.

use drumbeat_compliance::strip_html;
use regex::Regex;

/// Everything the scorer looks at.
#[derive(Debug, Clone)]
pub struct SeoInput<'a> {
    /// Article title
    pub title: &'a str,
    /// Rendered HTML body
    pub body_html: &'a str,
    /// Target keyword
    pub keyword: &'a str,
    /// SEO meta title, when the draft produced one
    pub meta_title: Option<&'a str>,
    /// SEO meta description, when the draft produced one
    pub meta_description: Option<&'a str>,
}

/// Score a draft, capped at 100.
///
/// Point table: keyword in title (+15), keyword in the first 500 characters
/// of plain text (+10), keyword in any H2 (+5), keyword density in
/// \[1%, 3%\] of total words (+15), average sentence length in \[10, 20\]
/// words (+10), meta title 50-70 chars (+10), meta description 120-160
/// chars (+10), at least one hyperlink (+10), at least one H2/H3 (+10),
/// word count over 800 (+5).
pub fn score_seo(input: &SeoInput<'_>) -> u8 {
    let plain = strip_html(input.body_html);
    let plain_lower = plain.to_lowercase();
    let keyword = input.keyword.to_lowercase();
    let html_lower = input.body_html.to_lowercase();

    let mut score: u32 = 0;

    if !keyword.is_empty() && input.title.to_lowercase().contains(&keyword) {
        score += 15;
    }

    let first_window = first_chars(&plain_lower, 500);
    if !keyword.is_empty() && first_window.contains(&keyword) {
        score += 10;
    }

    if keyword_in_h2(&html_lower, &keyword) {
        score += 5;
    }

    let total_words = plain.split_whitespace().count();
    if total_words > 0 && !keyword.is_empty() {
        let occurrences = count_occurrences(&plain_lower, &keyword);
        let density = occurrences as f64 / total_words as f64 * 100.0;
        if (1.0..=3.0).contains(&density) {
            score += 15;
        }
    }

    if let Some(average) = average_sentence_length(&plain) {
        if (10.0..=20.0).contains(&average) {
            score += 10;
        }
    }

    if matches!(input.meta_title.map(|t| t.chars().count()), Some(50..=70)) {
        score += 10;
    }
    if matches!(
        input.meta_description.map(|d| d.chars().count()),
        Some(120..=160)
    ) {
        score += 10;
    }

    if html_lower.contains("<a ") || html_lower.contains("href=") {
        score += 10;
    }

    if html_lower.contains("<h2") || html_lower.contains("<h3") {
        score += 10;
    }

    if total_words > 800 {
        score += 5;
    }

    score.min(100) as u8
}

/// Strip the body and count whitespace-delimited tokens.
pub fn word_count(html: &str) -> usize {
    strip_html(html).split_whitespace().count()
}

fn first_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn keyword_in_h2(html_lower: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let Ok(re) = Regex::new(r"(?s)<h2[^>]*>(.*?)</h2>") else {
        return false;
    };
    re.captures_iter(html_lower)
        .any(|caps| caps[1].contains(keyword))
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.match_indices(needle).count()
}

fn average_sentence_length(plain: &str) -> Option<f64> {
    let sentences: Vec<&str> = plain
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return None;
    }
    let words: usize = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum();
    Some(words as f64 / sentences.len() as f64)
}
