//! Enumerated run options.
//!
//! These cross the core boundary as typed fields, never as free-form
//! dictionaries. Serde names match the configuration file spelling.

use serde::{Deserialize, Serialize};

/// Which vertical the search provider should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Web,
    Academic,
}

impl SearchMode {
    /// Provider wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Web => "web",
            SearchMode::Academic => "academic",
        }
    }
}

/// Recency window forwarded to the search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl Recency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recency::Day => "day",
            Recency::Week => "week",
            Recency::Month => "month",
            Recency::Year => "year",
        }
    }
}

/// How detailed the synthesized briefing should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Quick,
    #[default]
    Standard,
    Deep,
}

/// What kind of answer the user is after; steers how the search query is
/// phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// Find tools that help with a described problem.
    #[default]
    Discover,
    /// Compare the popular tools in a named category.
    Compare,
    /// Dig into one specific tool.
    DeepDive,
}

/// Soft hint used in the synthesis prompt; `Any` adds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FocusArea {
    #[default]
    Any,
    Backend,
    Frontend,
    MlopsData,
    DevexCollaboration,
    TestingQa,
}

impl FocusArea {
    /// Human phrasing for prompts; `None` when no hint should be added.
    pub fn prompt_hint(&self) -> Option<&'static str> {
        match self {
            FocusArea::Any => None,
            FocusArea::Backend => Some("backend services and APIs"),
            FocusArea::Frontend => Some("frontend and UI development"),
            FocusArea::MlopsData => Some("MLOps and data engineering"),
            FocusArea::DevexCollaboration => Some("developer experience and collaboration"),
            FocusArea::TestingQa => Some("testing and quality assurance"),
        }
    }
}
