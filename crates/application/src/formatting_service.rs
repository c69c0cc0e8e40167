//! Formal-complaint formatting adapter.
//!
//! Wraps the external text formatter and fails closed to a fixed local
//! template so submission is never blocked by formatter unavailability.
//! The result is always a proposal; the caller decides at submission time
//! whether to use it.

use std::sync::Arc;

use redressa_core::{AppError, AppResult};

use crate::grievance_ports::TextFormatter;

/// Instruction prefix sent to the formatter ahead of the raw description.
const FORMAT_PROMPT_PREFIX: &str = "Convert this grievance to formal complaint format. \
Only give the final content, nothing else. And only use the info given. Grievance:\n";

/// Application service producing formal-complaint renderings.
#[derive(Clone)]
pub struct FormattingService {
    formatter: Arc<dyn TextFormatter>,
}

impl FormattingService {
    /// Creates a new formatting service.
    #[must_use]
    pub fn new(formatter: Arc<dyn TextFormatter>) -> Self {
        Self { formatter }
    }

    /// Returns a formal rendering of the description.
    ///
    /// Rejects an empty description before calling out. Any formatter
    /// failure, or an empty formatter response, yields the deterministic
    /// local template embedding the original text verbatim.
    pub async fn propose_formal_text(&self, title: &str, description: &str) -> AppResult<String> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "description must not be empty".to_owned(),
            ));
        }

        let prompt = format!("{FORMAT_PROMPT_PREFIX}{description}");
        match self.formatter.format(&prompt).await {
            Ok(formatted) if !formatted.trim().is_empty() => Ok(formatted),
            Ok(_) => Ok(fallback_template(title, description)),
            Err(error) => {
                tracing::warn!(%error, "text formatter unavailable, using local template");
                Ok(fallback_template(title, description))
            }
        }
    }
}

fn fallback_template(title: &str, description: &str) -> String {
    let title = title.trim();
    let subject_line = if title.is_empty() {
        String::new()
    } else {
        format!("Subject: {title}\n\n")
    };

    format!(
        "FORMAL COMPLAINT\n\n{subject_line}Description: {description}\n\n\
I hereby formally submit this complaint for your consideration and request \
appropriate action to resolve this matter."
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use redressa_core::{AppError, AppResult};

    use crate::grievance_ports::TextFormatter;

    use super::FormattingService;

    struct FakeFormatter {
        response: AppResult<String>,
    }

    impl FakeFormatter {
        fn succeeding(text: &str) -> Self {
            Self {
                response: Ok(text.to_owned()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(AppError::Upstream("formatter quota exhausted".to_owned())),
            }
        }
    }

    #[async_trait]
    impl TextFormatter for FakeFormatter {
        async fn format(&self, _prompt: &str) -> AppResult<String> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(AppError::Upstream(message)) => Err(AppError::Upstream(message.clone())),
                Err(_) => Err(AppError::Internal("unexpected fake response".to_owned())),
            }
        }
    }

    #[tokio::test]
    async fn formatter_output_is_passed_through() -> AppResult<()> {
        let service = FormattingService::new(Arc::new(FakeFormatter::succeeding(
            "FORMAL COMPLAINT\n\nRewritten.",
        )));

        let proposal = service
            .propose_formal_text("Noise", "Loud construction at night")
            .await?;
        assert_eq!(proposal, "FORMAL COMPLAINT\n\nRewritten.");
        Ok(())
    }

    #[tokio::test]
    async fn formatter_failure_falls_back_to_local_template() -> AppResult<()> {
        let service = FormattingService::new(Arc::new(FakeFormatter::failing()));

        let proposal = service
            .propose_formal_text("Noise complaint", "Loud construction at night")
            .await?;

        assert!(proposal.starts_with("FORMAL COMPLAINT"));
        assert!(proposal.contains("Loud construction at night"));
        assert!(proposal.contains("Noise complaint"));
        Ok(())
    }

    #[tokio::test]
    async fn blank_formatter_output_falls_back_to_local_template() -> AppResult<()> {
        let service = FormattingService::new(Arc::new(FakeFormatter::succeeding("  \n")));

        let proposal = service
            .propose_formal_text("Noise", "Loud construction at night")
            .await?;
        assert!(proposal.contains("Description: Loud construction at night"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_description_is_rejected_before_calling_out() {
        let service = FormattingService::new(Arc::new(FakeFormatter::failing()));

        let outcome = service.propose_formal_text("Noise", "   ").await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }
}
