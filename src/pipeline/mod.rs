//! Classification and reply composition.
//!
//! Strict two-stage pipeline: a fetched message is classified into one
//! label, then the label drives template selection for the reply. Each
//! stage's output is the next stage's sole input.

mod classifier;
mod composer;

pub use classifier::Classifier;
pub use composer::Composer;

use serde::{Deserialize, Serialize};

// ── Classification label ────────────────────────────────────────────

/// Intent label for an inbound message.
///
/// Closed set. `NotSure` is the mandatory fallback for any completion
/// output that does not exactly match one of the other three labels —
/// verbatim keyword matching, not semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Interested,
    NotInterested,
    MoreInformation,
    NotSure,
}

impl Label {
    /// The verbatim strings the completion service is asked to emit.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Interested => "Interested",
            Self::NotInterested => "Not Interested",
            Self::MoreInformation => "More information",
            Self::NotSure => "Not Sure",
        }
    }

    /// Exact-match a trimmed completion response against the three
    /// explicit labels. Anything else, including empty output, is
    /// `NotSure`.
    pub fn from_response(text: &str) -> Self {
        match text.trim() {
            "Interested" => Self::Interested,
            "Not Interested" => Self::NotInterested,
            "More information" => Self::MoreInformation,
            _ => Self::NotSure,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ── Composed reply ──────────────────────────────────────────────────

/// A reply ready for delivery through a provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedReply {
    /// Plain-text subject line, `"<label> of <product>"`.
    pub subject: String,
    /// Styled HTML: heading, feature list, benefit list in a wrapper div.
    pub html_body: String,
}
