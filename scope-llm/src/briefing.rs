//! Structures a raw completion into a [`Briefing`].
//!
//! Models are asked for six named sections but do not always comply; the
//! parser is deliberately forgiving about numbering, markdown decoration,
//! and casing, and degrades missing sections to an explicit marker instead
//! of failing the run.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

/// Marker used when the model omitted or mangled a required section.
pub const NOT_PROVIDED: &str = "not provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Terminal artifact of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Briefing {
    pub summary: String,
    pub recommended_tools: Vec<String>,
    pub adoption_steps: Vec<String>,
    pub trade_offs: String,
    pub confidence: Confidence,
    pub limitations: String,
    /// Urls of the context chunks actually passed to synthesis.
    pub sources: Vec<Url>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Tools,
    Steps,
    TradeOffs,
    Confidence,
    Limitations,
}

/// Parse a raw completion into a [`Briefing`], attaching provenance.
///
/// Never fails: anything the scanner cannot locate degrades to
/// [`NOT_PROVIDED`] (or [`Confidence::Low`] for the confidence section).
pub fn parse(raw: &str, sources: Vec<Url>) -> Briefing {
    let mut bodies: [Vec<&str>; 6] = Default::default();
    let mut current: Option<Section> = None;

    for line in raw.lines() {
        if let Some(section) = match_heading(line) {
            current = Some(section);
            // Inline content after the heading ("Summary: short answer").
            if let Some((_, rest)) = line.split_once(':') {
                let rest = rest.trim().trim_start_matches(['*', '_']).trim();
                if !rest.is_empty() {
                    bodies[section as usize].push(rest);
                }
            }
            continue;
        }
        if let Some(section) = current {
            bodies[section as usize].push(line);
        }
    }

    let text_of = |section: Section| -> String {
        let joined = bodies[section as usize].join("\n");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            trimmed.to_string()
        }
    };

    let confidence_body = bodies[Section::Confidence as usize].join("\n");

    Briefing {
        summary: text_of(Section::Summary),
        recommended_tools: parse_list(&bodies[Section::Tools as usize]),
        adoption_steps: parse_list(&bodies[Section::Steps as usize]),
        trade_offs: text_of(Section::TradeOffs),
        confidence: parse_confidence(&confidence_body),
        limitations: text_of(Section::Limitations),
        sources,
    }
}

/// Recognize a section heading, tolerating markdown and numbering such as
/// `## 2. Recommended tools & platforms` or `**Trade-offs & caveats:**`.
fn match_heading(line: &str) -> Option<Section> {
    static DECORATION: OnceLock<Regex> = OnceLock::new();
    let decoration = DECORATION
        .get_or_init(|| Regex::new(r"^[\s#*_>]*(?:\d+[.)]\s*)?").unwrap());

    let trimmed = line.trim();
    // Headings are short lines; anything longer is body text that happens
    // to mention a keyword.
    if trimmed.is_empty() || trimmed.len() > 64 {
        return None;
    }

    let stripped = decoration.replace(trimmed, "");
    let lowered = stripped.trim_matches(['*', '_', ':', ' ']).to_lowercase();

    if lowered.starts_with("summary") {
        Some(Section::Summary)
    } else if lowered.starts_with("recommended") {
        Some(Section::Tools)
    } else if lowered.starts_with("adoption") || lowered.starts_with("how to adopt") {
        Some(Section::Steps)
    } else if lowered.starts_with("trade-off")
        || lowered.starts_with("tradeoff")
        || lowered.starts_with("trade off")
    {
        Some(Section::TradeOffs)
    } else if lowered.starts_with("confidence") {
        Some(Section::Confidence)
    } else if lowered.starts_with("limitation") {
        Some(Section::Limitations)
    } else {
        None
    }
}

/// Split a section body into items, accepting `-`/`*` bullets and `1.`
/// numbering; bare non-empty lines count as items too.
fn parse_list(lines: &[&str]) -> Vec<String> {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    let bullet = BULLET.get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").unwrap());

    let items: Vec<String> = lines
        .iter()
        .map(|line| bullet.replace(line, "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        vec![NOT_PROVIDED.to_string()]
    } else {
        items
    }
}

fn parse_confidence(body: &str) -> Confidence {
    static LEVEL: OnceLock<Regex> = OnceLock::new();
    // Whole words only, so "following" never reads as "low". First mention
    // wins; a phrase like "medium, not high" should read as medium.
    let level = LEVEL.get_or_init(|| Regex::new(r"(?i)\b(low|medium|moderate|high)\b").unwrap());

    match level.find(body).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(word) if word == "high" => Confidence::High,
        Some(word) if word == "medium" || word == "moderate" => Confidence::Medium,
        Some(_) => Confidence::Low,
        None => Confidence::Low,
    }
}
