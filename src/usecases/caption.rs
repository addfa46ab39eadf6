//! Caption expansion: environment variables plus the changelog digest.

use crate::domain::DomainError;
use crate::domain::changelog::{self, CAPTION_MAX_CHARS, CHANGELOG_VARIABLE};
use crate::domain::expand::{count_references, escape_dollars, expand_one};
use crate::ports::{BuildSource, Environment};
use std::sync::Arc;
use tracing::debug;

pub struct CaptionExpander {
    env: Arc<dyn Environment>,
    build: Arc<dyn BuildSource>,
}

impl CaptionExpander {
    pub fn new(env: Arc<dyn Environment>, build: Arc<dyn BuildSource>) -> Self {
        Self { env, build }
    }

    /// Expands `template`. Blank or missing templates yield `None` (no caption).
    ///
    /// `$TELEGRAM_UPLOADER_CHANGELOG` is replaced by the changelog digest, which
    /// gets whatever is left of the 1024 character caption budget once the rest
    /// of the template is expanded. Several references share that budget. The
    /// changelog is only fetched when the template references it.
    pub async fn expand(&self, template: Option<&str>) -> Result<Option<String>, DomainError> {
        let Some(template) = template.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let references = count_references(template, CHANGELOG_VARIABLE);
        if references == 0 {
            let expanded = self.expand_env(template).await?;
            return Ok(Some(expanded));
        }

        let without_changelog = self
            .expand_env(&expand_one(template, CHANGELOG_VARIABLE, ""))
            .await?;
        let budget =
            CAPTION_MAX_CHARS.saturating_sub(without_changelog.chars().count()) / references;
        let history = self
            .build
            .change_history()
            .await
            .map_err(|e| caption_error(template, e))?;
        let digest = changelog::digest(&history, budget);
        debug!(
            budget,
            references,
            digest_chars = digest.chars().count(),
            "changelog digest assembled"
        );

        let with_digest = expand_one(template, CHANGELOG_VARIABLE, &escape_dollars(&digest));
        Ok(Some(self.expand_env(&with_digest).await?))
    }

    async fn expand_env(&self, template: &str) -> Result<String, DomainError> {
        self.env
            .expand(template)
            .await
            .map_err(|e| caption_error(template, e))
    }
}

fn caption_error(template: &str, err: DomainError) -> DomainError {
    match err {
        e @ DomainError::CaptionExpansion { .. } => e,
        other => DomainError::CaptionExpansion {
            template: template.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::build::StaticBuildSource;
    use crate::adapters::env::MapEnvironment;
    use crate::domain::{BuildChanges, BuildResult, ChangeEntry};
    use std::collections::HashMap;

    struct BrokenEnv;

    #[async_trait::async_trait]
    impl Environment for BrokenEnv {
        async fn expand(&self, _template: &str) -> Result<String, DomainError> {
            Err(DomainError::Config("environment unavailable".into()))
        }
    }

    fn env() -> Arc<dyn Environment> {
        Arc::new(MapEnvironment::new(HashMap::from([(
            "BUILD_NUMBER".to_string(),
            "7".to_string(),
        )])))
    }

    fn history() -> Vec<BuildChanges> {
        vec![
            BuildChanges {
                result: None,
                changes: vec![ChangeEntry {
                    author: "ann".into(),
                    message: "Add dark_mode".into(),
                }],
            },
            BuildChanges {
                result: Some(BuildResult::Failure),
                changes: vec![ChangeEntry {
                    author: "bob".into(),
                    message: "Break build".into(),
                }],
            },
        ]
    }

    fn expander(history: Vec<BuildChanges>) -> CaptionExpander {
        CaptionExpander::new(
            env(),
            Arc::new(StaticBuildSource::new(Some(BuildResult::Success)).with_history(history)),
        )
    }

    #[tokio::test]
    async fn blank_caption_is_absent() {
        let exp = expander(vec![]);
        assert_eq!(exp.expand(None).await.unwrap(), None);
        assert_eq!(exp.expand(Some("   ")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expands_environment() {
        let exp = expander(vec![]);
        let out = exp.expand(Some(" Build #$BUILD_NUMBER ")).await.unwrap();
        assert_eq!(out.as_deref(), Some("Build #7"));
    }

    #[tokio::test]
    async fn injects_changelog_digest() {
        let exp = expander(history());
        let out = exp
            .expand(Some("Build #${BUILD_NUMBER}${TELEGRAM_UPLOADER_CHANGELOG}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out, "Build #7\n* bob: Break build\n* ann: Add dark\\_mode");
    }

    #[tokio::test]
    async fn digest_respects_remaining_budget() {
        let exp = expander(history());
        let prefix = "x".repeat(1000);
        let template = format!("{}$TELEGRAM_UPLOADER_CHANGELOG", prefix);
        let out = exp.expand(Some(&template)).await.unwrap().unwrap();
        assert!(out.chars().count() <= CAPTION_MAX_CHARS);
        // only the newest entry (22 chars) fits into the 24 left
        assert_eq!(out, format!("{}\n* ann: Add dark\\_mode", prefix));
    }

    #[tokio::test]
    async fn escaped_changelog_reference_stays_literal() {
        let exp = expander(history());
        let out = exp
            .expand(Some("Use $$TELEGRAM_UPLOADER_CHANGELOG in #$BUILD_NUMBER"))
            .await
            .unwrap();
        assert_eq!(
            out.as_deref(),
            Some("Use $TELEGRAM_UPLOADER_CHANGELOG in #7")
        );
    }

    #[tokio::test]
    async fn digest_text_is_not_expanded() {
        let exp = expander(vec![BuildChanges {
            result: None,
            changes: vec![ChangeEntry {
                author: "ann".into(),
                message: "Print $HOME and $$".into(),
            }],
        }]);
        let out = exp
            .expand(Some("$TELEGRAM_UPLOADER_CHANGELOG"))
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("\n* ann: Print $HOME and $$"));
    }

    #[tokio::test]
    async fn repeated_references_share_the_budget() {
        let long = "y".repeat(400);
        let exp = expander(vec![BuildChanges {
            result: None,
            changes: vec![
                ChangeEntry {
                    author: "ann".into(),
                    message: long.clone(),
                },
                ChangeEntry {
                    author: "bob".into(),
                    message: long.clone(),
                },
            ],
        }]);
        let out = exp
            .expand(Some("$TELEGRAM_UPLOADER_CHANGELOG --- ${TELEGRAM_UPLOADER_CHANGELOG}"))
            .await
            .unwrap()
            .unwrap();
        assert!(out.chars().count() <= CAPTION_MAX_CHARS);
        // each copy gets (1024 - 5) / 2 = 509 chars: one 408 char entry
        assert_eq!(out.matches("* bob: ").count(), 2);
        assert_eq!(out.matches("* ann: ").count(), 0);
    }

    #[tokio::test]
    async fn environment_failure_is_caption_error() {
        let exp = CaptionExpander::new(
            Arc::new(BrokenEnv),
            Arc::new(StaticBuildSource::new(None)),
        );
        let err = exp.expand(Some("$X")).await.unwrap_err();
        assert!(matches!(err, DomainError::CaptionExpansion { .. }));
        assert!(err.to_string().contains("environment unavailable"));
    }
}
