//! Visible-text extraction from HTML.
//!
//! Paragraph-oriented: we collect `<p>` content outside obvious boilerplate
//! containers (nav/header/footer/aside) and join the blocks. Script and
//! style bodies never appear because they contain no paragraph elements.
//! Exact selector rules are a heuristic, not a contract.

use scraper::{ElementRef, Html, Selector};

const BOILERPLATE_ANCESTORS: &[&str] = &["nav", "header", "footer", "aside", "noscript"];

/// Reduce an HTML document to readable body text, paragraphs separated by
/// blank lines. Returns an empty string when nothing readable is found.
pub fn extract_visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    // Static selector, cannot fail.
    let sel = Selector::parse("p").expect("valid selector");

    let mut blocks: Vec<String> = Vec::new();
    for p in doc.select(&sel) {
        if in_boilerplate(&p) {
            continue;
        }
        let joined = p.text().collect::<Vec<_>>().join(" ");
        let t = normalize_whitespace(&joined);
        if !t.is_empty() {
            blocks.push(t);
        }
    }

    blocks.join("\n\n")
}

/// Whether `body` plausibly is HTML at all. Lets the fetcher fall back to
/// treating plain-text responses as their own content.
pub fn looks_like_html(body: &str) -> bool {
    body.trim_start().starts_with('<') || body.contains("</")
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn in_boilerplate(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| BOILERPLATE_ANCESTORS.contains(&a.value().name()))
}

/// Truncate to at most `max_chars` characters, preferring a paragraph or
/// sentence boundary inside the tail of the allowance over a hard cut.
/// Appends `…` when anything was dropped. Returns the text and whether it
/// was truncated.
pub fn truncate_at_boundary(text: &str, max_chars: usize) -> (String, bool) {
    let total: usize = text.chars().count();
    if total <= max_chars {
        return (text.to_string(), false);
    }
    if max_chars == 0 {
        return (String::new(), true);
    }

    // Hard cut at max_chars - 1 to leave room for the ellipsis.
    let hard: String = text.chars().take(max_chars.saturating_sub(1)).collect();

    // Look for a boundary in the final 20% of the allowance.
    let window_start = hard.len().saturating_sub(hard.len() / 5);
    let boundary = ["\n", ". ", "! ", "? "]
        .iter()
        .filter_map(|pat| hard.rfind(pat).map(|i| i + pat.len()))
        .filter(|&i| i >= window_start)
        .max();

    let mut cut = match boundary {
        Some(i) => hard[..i].to_string(),
        None => hard,
    };
    while cut.ends_with(char::is_whitespace) {
        cut.pop();
    }
    cut.push('…');
    (cut, true)
}
