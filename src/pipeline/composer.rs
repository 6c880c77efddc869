//! Reply composition — one template per label, one completion call,
//! strict three-section assembly into styled HTML.

use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::llm::{CompletionModel, CompletionOptions};
use crate::pipeline::{ComposedReply, Label};

/// Max tokens for the compose call.
const COMPOSE_MAX_TOKENS: u32 = 350;

/// Temperature for composition.
const COMPOSE_TEMPERATURE: f32 = 0.5;

/// Appended to every template so the response splits cleanly.
const SECTION_INSTRUCTION: &str = "Format the reply as exactly three sections separated by \
     blank lines: a one-line heading, then a feature list with one item per line, then a \
     benefit list with one item per line. Do not address the user by name, use 'Dear user'.";

const INTERESTED_TEMPLATE: &str = "Dear user, We're excited to share with you how our \
     product can benefit you: \
     - Secure Mailing: Our platform offers end-to-end encryption to ensure your emails \
     remain private and secure. \
     - Automated Emails: Easily automate your email workflows by setting timers and \
     triggers. Schedule emails to be sent at specific times or based on user actions. \
     - Customizable Templates: Create personalized email templates and automate \
     repetitive tasks, saving you time and effort. \
     Would you like to learn more about how our platform can streamline your email \
     communication? Feel free to reply to this email.";

const NOT_INTERESTED_TEMPLATE: &str = "Dear user, we would appreciate your feedback on \
     why you are not interested. Please let us know in around 100-150 words.";

const MORE_INFORMATION_TEMPLATE: &str = "Dear user, thank you for expressing interest in \
     our product! Here are some of its key features: \
     - Secure Mailing: End-to-end encryption keeps your communication private. \
     - Automated Emails: Schedule messages and set triggers to send at the perfect time. \
     - Customizable Templates: Tailor stunning templates to your brand and audience. \
     Reply to this email to learn more.";

/// Fixed prompt template for a label. `NotSure` has none — composing a
/// reply for it is not a supported pipeline path.
fn template_for(label: Label) -> Option<&'static str> {
    match label {
        Label::Interested => Some(INTERESTED_TEMPLATE),
        Label::NotInterested => Some(NOT_INTERESTED_TEMPLATE),
        Label::MoreInformation => Some(MORE_INFORMATION_TEMPLATE),
        Label::NotSure => None,
    }
}

/// Composes the templated HTML reply for a classified message.
pub struct Composer {
    llm: Arc<dyn CompletionModel>,
    product_name: String,
}

impl Composer {
    pub fn new(llm: Arc<dyn CompletionModel>, product_name: &str) -> Self {
        Self {
            llm,
            product_name: product_name.to_string(),
        }
    }

    /// Whether a reply template exists for `label`. Workers complete
    /// jobs without a delivery when this is false.
    pub fn can_reply(&self, label: Label) -> bool {
        template_for(label).is_some()
    }

    /// Compose the reply for `label`.
    ///
    /// Fails with `CompositionFailed` when the label has no template,
    /// the completion call fails, or the response does not split into
    /// exactly three sections.
    pub async fn compose(
        &self,
        label: Label,
        recipient: &str,
    ) -> Result<ComposedReply, PipelineError> {
        let template = template_for(label).ok_or_else(|| PipelineError::CompositionFailed {
            reason: format!("no reply template for label {label}"),
        })?;

        debug!(label = %label, recipient = %recipient, "Composing reply");

        let prompt = format!("{template}\n\n{SECTION_INSTRUCTION}");
        let response = self
            .llm
            .complete(
                &prompt,
                CompletionOptions {
                    max_tokens: COMPOSE_MAX_TOKENS,
                    temperature: COMPOSE_TEMPERATURE,
                },
            )
            .await
            .map_err(|e| PipelineError::CompositionFailed {
                reason: format!("completion call failed: {e}"),
            })?;

        let [heading, features, benefits] = split_sections(&response)?;

        Ok(ComposedReply {
            subject: format!("{} of {}", label.wire_name(), self.product_name),
            html_body: render_html(&heading, &features, &benefits),
        })
    }
}

// ── Response handling ───────────────────────────────────────────────

/// Split a completion response into exactly three non-empty sections on
/// blank-line boundaries. Any other shape is a composition failure, not
/// something to paper over.
fn split_sections(raw: &str) -> Result<[String; 3], PipelineError> {
    let sections: Vec<String> = raw
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    <[String; 3]>::try_from(sections).map_err(|v| PipelineError::CompositionFailed {
        reason: format!("expected 3 blank-line-separated sections, got {}", v.len()),
    })
}

/// Render heading + two bulleted lists inside the styled wrapper.
fn render_html(heading: &str, features: &str, benefits: &str) -> String {
    format!(
        "<div style=\"background-color: #f5f5f5; padding: 20px; border-radius: 10px;\">\
         <h2>{heading}</h2><ul>{}</ul><ul>{}</ul></div>",
        list_items(features),
        list_items(benefits),
    )
}

fn list_items(section: &str) -> String {
    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<li>{line}</li>"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::LlmError;

    struct MockCompletion {
        response: String,
    }

    #[async_trait]
    impl CompletionModel for MockCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _opts: CompletionOptions,
        ) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }
    }

    struct DownCompletion;

    #[async_trait]
    impl CompletionModel for DownCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _opts: CompletionOptions,
        ) -> Result<String, LlmError> {
            Err(LlmError::RequestFailed {
                reason: "quota exhausted".to_string(),
            })
        }
    }

    const THREE_SECTIONS: &str = "Welcome to our platform\n\n\
         Secure mailing\nAutomated emails\n\n\
         Save time\nStay private";

    fn composer(response: &str) -> Composer {
        Composer::new(
            Arc::new(MockCompletion {
                response: response.to_string(),
            }),
            "ReachInbox",
        )
    }

    #[tokio::test]
    async fn three_sections_render_heading_and_two_lists() {
        let reply = composer(THREE_SECTIONS)
            .compose(Label::Interested, "b@y.com")
            .await
            .unwrap();

        assert_eq!(reply.html_body.matches("<h2>").count(), 1);
        assert_eq!(reply.html_body.matches("<ul>").count(), 2);
        assert!(reply.html_body.contains("<h2>Welcome to our platform</h2>"));
        assert!(reply.html_body.contains("<li>Secure mailing</li>"));
        assert!(reply.html_body.contains("<li>Automated emails</li>"));
        assert!(reply.html_body.contains("<li>Save time</li>"));
        assert!(reply.html_body.contains("<li>Stay private</li>"));
        assert!(reply.html_body.starts_with("<div style="));
    }

    #[tokio::test]
    async fn subject_is_label_of_product() {
        let reply = composer(THREE_SECTIONS)
            .compose(Label::MoreInformation, "b@y.com")
            .await
            .unwrap();
        assert_eq!(reply.subject, "More information of ReachInbox");
    }

    #[tokio::test]
    async fn two_sections_fail_composition() {
        let err = composer("Heading only\n\nOne list")
            .compose(Label::Interested, "b@y.com")
            .await
            .unwrap_err();
        match err {
            PipelineError::CompositionFailed { reason } => {
                assert!(reason.contains("got 2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn four_sections_fail_composition() {
        let err = composer("a\n\nb\n\nc\n\nd")
            .compose(Label::Interested, "b@y.com")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::CompositionFailed { .. }));
    }

    #[tokio::test]
    async fn unsegmented_paragraph_fails_composition() {
        let err = composer("One long paragraph with no blank lines at all.")
            .compose(Label::NotInterested, "b@y.com")
            .await
            .unwrap_err();
        match err {
            PipelineError::CompositionFailed { reason } => {
                assert!(reason.contains("got 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn trailing_blank_lines_are_tolerated() {
        let reply = composer("Heading\n\nf1\nf2\n\nb1\nb2\n\n")
            .compose(Label::Interested, "b@y.com")
            .await
            .unwrap();
        assert_eq!(reply.html_body.matches("<ul>").count(), 2);
    }

    #[tokio::test]
    async fn not_sure_has_no_template() {
        let err = composer(THREE_SECTIONS)
            .compose(Label::NotSure, "b@y.com")
            .await
            .unwrap_err();
        match err {
            PipelineError::CompositionFailed { reason } => {
                assert!(reason.contains("no reply template"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_completion_is_composition_failed() {
        let composer = Composer::new(Arc::new(DownCompletion), "ReachInbox");
        let err = composer
            .compose(Label::Interested, "b@y.com")
            .await
            .unwrap_err();
        match err {
            PipelineError::CompositionFailed { reason } => {
                assert!(reason.contains("completion call failed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn list_items_skip_blank_lines() {
        let items = list_items("one\n\n  two  \n");
        assert_eq!(items, "<li>one</li><li>two</li>");
    }

    #[test]
    fn every_actionable_label_has_a_template() {
        assert!(template_for(Label::Interested).is_some());
        assert!(template_for(Label::NotInterested).is_some());
        assert!(template_for(Label::MoreInformation).is_some());
        assert!(template_for(Label::NotSure).is_none());
    }
}
