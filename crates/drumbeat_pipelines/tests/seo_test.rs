//! Deterministic SEO scorer properties.

use drumbeat_pipelines::{SeoInput, score_seo, word_count};

const KEYWORD: &str = "dental implants";

/// A draft engineered to earn every point in the table.
///
/// 900 words across 60 sentences (the 3-word H2 merges into the first
/// sentence) for an average length of exactly 15; the keyword occurs 19
/// times for a density of 19/900 = 2.1%.
fn perfect_draft() -> String {
    let mut html = String::from("<h2>Dental implants overview</h2>\n<p>");
    // 12 words, completing a 15-word first sentence with the H2.
    html.push_str(
        "Dental implants can be discussed with <a href=\"/contact\">our care team</a> \
         during any visit.",
    );
    // 17 keyword sentences and 42 filler sentences, 15 words each.
    for _ in 0..17 {
        html.push_str(
            " Dental implants are one option many patients ask about during a regular \
             checkup visit here.",
        );
    }
    for _ in 0..42 {
        html.push_str(
            " Many patients in our area ask thoughtful questions about their available \
             options at every visit.",
        );
    }
    html.push_str("</p>");
    html
}

fn padded(prefix: &str, target_chars: usize, pad: char) -> String {
    let mut out = String::from(prefix);
    while out.chars().count() < target_chars {
        out.push(pad);
    }
    out
}

#[test]
fn engineered_draft_scores_exactly_one_hundred() {
    let html = perfect_draft();
    let meta_title = padded("Dental Implants in Austin", 60, 'x');
    assert_eq!(meta_title.chars().count(), 60);
    let meta_description = padded("Dental implants explained for Austin patients. ", 140, 'y');
    assert_eq!(meta_description.chars().count(), 140);

    let score = score_seo(&SeoInput {
        title: "Dental Implants Guide for Austin Patients",
        body_html: &html,
        keyword: KEYWORD,
        meta_title: Some(&meta_title),
        meta_description: Some(&meta_description),
    });
    assert_eq!(score, 100);
}

#[test]
fn score_stays_within_bounds() {
    let score = score_seo(&SeoInput {
        title: "",
        body_html: "",
        keyword: KEYWORD,
        meta_title: None,
        meta_description: None,
    });
    assert_eq!(score, 0);

    let score = score_seo(&SeoInput {
        title: "Dental implants",
        body_html: "<p>Dental implants.</p>",
        keyword: KEYWORD,
        meta_title: Some("short"),
        meta_description: Some("short"),
    });
    assert!(score <= 100);
}

#[test]
fn missing_meta_fields_earn_no_meta_points() {
    let html = perfect_draft();
    let with_meta = score_seo(&SeoInput {
        title: "Dental Implants Guide",
        body_html: &html,
        keyword: KEYWORD,
        meta_title: Some(&padded("Dental Implants in Austin", 60, 'x')),
        meta_description: None,
    });
    let without_meta = score_seo(&SeoInput {
        title: "Dental Implants Guide",
        body_html: &html,
        keyword: KEYWORD,
        meta_title: None,
        meta_description: None,
    });
    assert_eq!(with_meta - without_meta, 10);
}

#[test]
fn word_count_strips_markup_first() {
    assert_eq!(word_count("<p>one <strong>two</strong> three</p>"), 3);
    assert_eq!(word_count(""), 0);
}
