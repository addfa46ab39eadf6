//! Upload workflow: check build result -> list artifacts -> expand caption ->
//! per artifact: size check -> document | link | skip -> forwards.
//!
//! - Artifacts are processed one at a time, in enumeration order
//! - Every error branch goes through the `FailurePolicy`
//! - Forwards only follow a primary delivery that returned a message id

use crate::domain::{
    Artifact, BuildResult, Delivery, DeliveryKind, DomainError, Forward, RunReport, UploadJob,
};
use crate::ports::{
    ArtifactLink, ArtifactStore, BotApi, BuildSource, DocumentUpload, Environment, ProgressPort,
};
use crate::usecases::caption::CaptionExpander;
use crate::usecases::failure_policy::FailurePolicy;
use std::sync::Arc;
use tracing::{debug, info};

/// Upload service. Delivers a build's artifacts to a Telegram chat.
pub struct UploadService {
    bot: Arc<dyn BotApi>,
    artifacts: Arc<dyn ArtifactStore>,
    build: Arc<dyn BuildSource>,
    captions: CaptionExpander,
    progress: Option<Arc<dyn ProgressPort>>,
}

impl UploadService {
    pub fn new(
        bot: Arc<dyn BotApi>,
        artifacts: Arc<dyn ArtifactStore>,
        build: Arc<dyn BuildSource>,
        env: Arc<dyn Environment>,
    ) -> Self {
        let captions = CaptionExpander::new(env, Arc::clone(&build));
        Self {
            bot,
            artifacts,
            build,
            captions,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressPort>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs the workflow once.
    ///
    /// Returns `Err(DomainError::Aborted)` only when the failure policy escalates;
    /// every other failure is recorded in the report.
    pub async fn run(&self, job: &UploadJob) -> Result<RunReport, DomainError> {
        let policy = FailurePolicy::new(job.fail_on_error);
        let mut report = RunReport::start();

        match self.build.result().await {
            Ok(Some(result)) if result.is_worse_or_equal_to(BuildResult::Failure) => {
                info!(result = %result, "skipping artifacts upload because of build failure");
                report.skipped = true;
                return Ok(report.finish());
            }
            Ok(_) => {}
            Err(e) => {
                policy.fail(&mut report, e)?;
                return Ok(report.finish());
            }
        }

        let artifacts = match self.artifacts.list(&job.filter_glob).await {
            Ok(found) if found.is_empty() => {
                let err = DomainError::NoArtifacts {
                    filter: job.filter_glob.clone(),
                };
                policy.fail(&mut report, err)?;
                return Ok(report.finish());
            }
            Ok(found) => found,
            Err(e) => {
                policy.fail(&mut report, e)?;
                return Ok(report.finish());
            }
        };

        let caption = match self.captions.expand(job.caption_template.as_deref()).await {
            Ok(caption) => caption,
            Err(e) => {
                policy.fail(&mut report, e)?;
                return Ok(report.finish());
            }
        };

        info!(
            count = artifacts.len(),
            chat_id = %job.chat_id,
            filter = %job.filter_glob,
            "artifacts matched for upload"
        );
        if let Some(p) = &self.progress {
            p.started(artifacts.len());
        }

        for artifact in &artifacts {
            if let Some(p) = &self.progress {
                p.artifact_started(&artifact.relative_path);
            }
            let failures_before = report.failures.len();
            let processed = self
                .process_artifact(job, artifact, caption.as_deref(), &policy, &mut report)
                .await;
            let outcome = match processed {
                Ok(()) => Ok(()),
                Err(e) => policy.fail(&mut report, e),
            };
            if let Some(p) = &self.progress {
                let ok = outcome.is_ok() && report.failures.len() == failures_before;
                p.artifact_finished(&artifact.relative_path, ok);
            }
            if let Err(abort) = outcome {
                if let Some(p) = &self.progress {
                    p.finished();
                }
                return Err(abort);
            }
        }

        if let Some(p) = &self.progress {
            p.finished();
        }
        let report = report.finish();
        info!(
            delivered = report.delivered.len(),
            forwarded = report.forwarded.len(),
            failures = report.failures.len(),
            "upload run finished"
        );
        Ok(report)
    }

    async fn process_artifact(
        &self,
        job: &UploadJob,
        artifact: &Artifact,
        caption: Option<&str>,
        policy: &FailurePolicy,
        report: &mut RunReport,
    ) -> Result<(), DomainError> {
        let limit = self.bot.upload_size_limit();
        let path = &artifact.relative_path;

        let (kind, response) = if artifact.size_bytes > limit {
            if !job.link_on_oversize {
                return Err(DomainError::UploadSizeExceeded {
                    artifact: path.clone(),
                    size: artifact.size_bytes,
                    limit,
                });
            }
            let url = artifact
                .public_url
                .clone()
                .ok_or_else(|| DomainError::MissingArtifactUrl(path.clone()))?;
            info!(
                artifact = %path,
                size = artifact.size_bytes,
                limit,
                chat_id = %job.chat_id,
                "artifact exceeds upload limit, sending link"
            );
            let link = ArtifactLink {
                file_name: artifact.file_name().to_string(),
                url,
                size: artifact.size_bytes,
            };
            let response = self
                .bot
                .send_link(&job.chat_id, caption, job.silent, &link)
                .await?;
            (DeliveryKind::Link, response)
        } else {
            info!(artifact = %path, chat_id = %job.chat_id, "uploading artifact to Telegram chat");
            let content = self.artifacts.open(artifact).await?;
            let document = DocumentUpload {
                file_name: artifact.file_name().to_string(),
                size: artifact.size_bytes,
                content,
            };
            let response = self
                .bot
                .send_document(&job.chat_id, caption, job.silent, document)
                .await?;
            (DeliveryKind::Document, response)
        };

        report.delivered.push(Delivery {
            artifact: path.clone(),
            kind,
            message_id: response.result_message_id,
        });

        let Some(message_id) = response.result_message_id else {
            if !job.forward_chat_ids.is_empty() {
                debug!(artifact = %path, "no message id in reply, skipping forwards");
            }
            return Ok(());
        };

        for target in &job.forward_chat_ids {
            match self
                .bot
                .forward_message(target, &job.chat_id, message_id, job.silent)
                .await
            {
                Ok(_) => {
                    info!(artifact = %path, chat_id = %target, message_id, "forwarded");
                    report.forwarded.push(Forward {
                        artifact: path.clone(),
                        chat_id: target.clone(),
                        message_id,
                    });
                }
                Err(e) => policy.fail(report, e)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::build::StaticBuildSource;
    use crate::adapters::env::MapEnvironment;
    use crate::domain::TelegramResponse;
    use crate::domain::limits::{CLOUD_UPLOAD_LIMIT, LOCAL_UPLOAD_LIMIT};
    use crate::ports::ArtifactReader;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Document {
            chat_id: String,
            file_name: String,
            caption: Option<String>,
        },
        Link {
            chat_id: String,
            url: String,
            size: u64,
        },
        Forward {
            chat_id: String,
            from_chat_id: String,
            message_id: i64,
        },
    }

    /// Records calls; replies are popped from a script, defaulting to ok with id 42.
    struct RecordingBot {
        limit: u64,
        calls: Mutex<Vec<Call>>,
        /// `silent` flag of each call, parallel to `calls`.
        silent: Mutex<Vec<bool>>,
        replies: Mutex<VecDeque<Result<TelegramResponse, DomainError>>>,
    }

    impl RecordingBot {
        fn new(limit: u64) -> Self {
            Self {
                limit,
                calls: Mutex::new(Vec::new()),
                silent: Mutex::new(Vec::new()),
                replies: Mutex::new(VecDeque::new()),
            }
        }

        fn reply(self, r: Result<TelegramResponse, DomainError>) -> Self {
            self.replies.lock().unwrap().push_back(r);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn silent_flags(&self) -> Vec<bool> {
            self.silent.lock().unwrap().clone()
        }

        fn next(&self, call: Call, silent: bool) -> Result<TelegramResponse, DomainError> {
            self.calls.lock().unwrap().push(call);
            self.silent.lock().unwrap().push(silent);
            self.replies.lock().unwrap().pop_front().unwrap_or(Ok(ok(42)))
        }
    }

    fn ok(message_id: i64) -> TelegramResponse {
        TelegramResponse {
            ok: true,
            result_message_id: Some(message_id),
            error_description: None,
        }
    }

    fn blocked() -> DomainError {
        DomainError::TelegramApi {
            method: "sendDocument",
            description: "blocked".into(),
        }
    }

    #[async_trait::async_trait]
    impl BotApi for RecordingBot {
        fn upload_size_limit(&self) -> u64 {
            self.limit
        }

        async fn send_document(
            &self,
            chat_id: &str,
            caption: Option<&str>,
            silent: bool,
            document: DocumentUpload,
        ) -> Result<TelegramResponse, DomainError> {
            self.next(
                Call::Document {
                    chat_id: chat_id.into(),
                    file_name: document.file_name,
                    caption: caption.map(String::from),
                },
                silent,
            )
        }

        async fn send_link(
            &self,
            chat_id: &str,
            _caption: Option<&str>,
            silent: bool,
            link: &ArtifactLink,
        ) -> Result<TelegramResponse, DomainError> {
            self.next(
                Call::Link {
                    chat_id: chat_id.into(),
                    url: link.url.clone(),
                    size: link.size,
                },
                silent,
            )
        }

        async fn forward_message(
            &self,
            chat_id: &str,
            from_chat_id: &str,
            message_id: i64,
            silent: bool,
        ) -> Result<TelegramResponse, DomainError> {
            self.next(
                Call::Forward {
                    chat_id: chat_id.into(),
                    from_chat_id: from_chat_id.into(),
                    message_id,
                },
                silent,
            )
        }

        async fn get_updates(&self) -> Result<TelegramResponse, DomainError> {
            Ok(ok(0))
        }

        async fn log_out(&self) -> Result<TelegramResponse, DomainError> {
            Ok(ok(0))
        }
    }

    struct FakeStore {
        artifacts: Vec<Artifact>,
    }

    #[async_trait::async_trait]
    impl ArtifactStore for FakeStore {
        async fn list(&self, glob: &str) -> Result<Vec<Artifact>, DomainError> {
            if glob == "broken" {
                return Err(DomainError::ArtifactList("permission denied".into()));
            }
            Ok(self
                .artifacts
                .iter()
                .filter(|a| glob == "**" || a.relative_path.ends_with(glob.trim_start_matches('*')))
                .cloned()
                .collect())
        }

        async fn open(&self, _artifact: &Artifact) -> Result<ArtifactReader, DomainError> {
            Ok(Box::new(std::io::Cursor::new(b"payload".to_vec())))
        }
    }

    fn artifact(path: &str, size: u64) -> Artifact {
        Artifact {
            relative_path: path.into(),
            size_bytes: size,
            location: format!("/builds/1/{}", path),
            public_url: Some(format!("https://ci.example.com/1/artifact/{}", path)),
        }
    }

    fn service(
        bot: Arc<RecordingBot>,
        artifacts: Vec<Artifact>,
        result: Option<BuildResult>,
    ) -> UploadService {
        UploadService::new(
            bot,
            Arc::new(FakeStore { artifacts }),
            Arc::new(StaticBuildSource::new(result)),
            Arc::new(MapEnvironment::new(HashMap::from([(
                "JOB_NAME".to_string(),
                "app".to_string(),
            )]))),
        )
    }

    fn job() -> UploadJob {
        UploadJob::new("100")
    }

    #[tokio::test]
    async fn failed_build_makes_no_calls() {
        for result in [BuildResult::Failure, BuildResult::NotBuilt, BuildResult::Aborted] {
            let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
            let svc = service(bot.clone(), vec![artifact("a.apk", 10)], Some(result));
            let report = svc.run(&job()).await.unwrap();
            assert!(report.skipped);
            assert!(bot.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn unstable_and_undecided_builds_still_upload() {
        for result in [Some(BuildResult::Unstable), None] {
            let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
            let svc = service(bot.clone(), vec![artifact("a.apk", 10)], result);
            let report = svc.run(&job()).await.unwrap();
            assert!(!report.skipped);
            assert_eq!(bot.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn no_matches_reports_and_makes_no_calls() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(bot.clone(), vec![artifact("a.apk", 10)], None);
        let mut j = job();
        j.filter_glob = "*.ipa".into();
        let report = svc.run(&j).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("No artifacts"));
        assert!(bot.calls().is_empty());

        j.fail_on_error = true;
        let err = svc.run(&j).await.unwrap_err();
        assert!(err.is_abort());
    }

    #[tokio::test]
    async fn listing_failure_goes_through_policy() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(bot.clone(), vec![], None);
        let mut j = job();
        j.filter_glob = "broken".into();
        let report = svc.run(&j).await.unwrap();
        assert!(report.failures[0].contains("permission denied"));
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn uploads_in_enumeration_order_with_caption() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(
            bot.clone(),
            vec![artifact("z/last.apk", 1), artifact("a/first.apk", 2)],
            None,
        );
        let mut j = job();
        j.caption_template = Some("$JOB_NAME build".into());
        let report = svc.run(&j).await.unwrap();

        assert_eq!(
            bot.calls(),
            vec![
                Call::Document {
                    chat_id: "100".into(),
                    file_name: "last.apk".into(),
                    caption: Some("app build".into()),
                },
                Call::Document {
                    chat_id: "100".into(),
                    file_name: "first.apk".into(),
                    caption: Some("app build".into()),
                },
            ]
        );
        assert_eq!(report.delivered.len(), 2);
        assert!(report.is_clean());
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn oversize_without_link_fallback_is_skipped() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(
            bot.clone(),
            vec![artifact("big.bin", CLOUD_UPLOAD_LIMIT + 1)],
            None,
        );
        let report = svc.run(&job()).await.unwrap();
        assert!(bot.calls().is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("big.bin"));
    }

    #[tokio::test]
    async fn oversize_with_link_fallback_sends_one_link() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let size = CLOUD_UPLOAD_LIMIT + 1;
        let svc = service(bot.clone(), vec![artifact("big.bin", size)], None);
        let mut j = job();
        j.link_on_oversize = true;
        let report = svc.run(&j).await.unwrap();
        assert_eq!(
            bot.calls(),
            vec![Call::Link {
                chat_id: "100".into(),
                url: "https://ci.example.com/1/artifact/big.bin".into(),
                size,
            }]
        );
        assert_eq!(report.delivered[0].kind, DeliveryKind::Link);
    }

    #[tokio::test]
    async fn local_server_limit_allows_larger_documents() {
        let bot = Arc::new(RecordingBot::new(LOCAL_UPLOAD_LIMIT));
        let svc = service(
            bot.clone(),
            vec![artifact("big.bin", CLOUD_UPLOAD_LIMIT + 1)],
            None,
        );
        svc.run(&job()).await.unwrap();
        assert!(matches!(bot.calls()[0], Call::Document { .. }));
    }

    #[tokio::test]
    async fn link_fallback_without_url_fails() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let mut big = artifact("big.bin", CLOUD_UPLOAD_LIMIT + 1);
        big.public_url = None;
        let svc = service(bot.clone(), vec![big], None);
        let mut j = job();
        j.link_on_oversize = true;
        let report = svc.run(&j).await.unwrap();
        assert!(bot.calls().is_empty());
        assert!(report.failures[0].contains("no public URL"));
    }

    #[tokio::test]
    async fn forwards_to_each_target_skipping_blanks() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(bot.clone(), vec![artifact("a.apk", 1)], None);
        let mut j = job();
        j.forward_chat_ids = crate::domain::entities::parse_chat_list("111, , 222");
        let report = svc.run(&j).await.unwrap();

        let forwards: Vec<Call> = bot
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Forward { .. }))
            .collect();
        assert_eq!(
            forwards,
            vec![
                Call::Forward {
                    chat_id: "111".into(),
                    from_chat_id: "100".into(),
                    message_id: 42,
                },
                Call::Forward {
                    chat_id: "222".into(),
                    from_chat_id: "100".into(),
                    message_id: 42,
                },
            ]
        );
        assert_eq!(report.forwarded.len(), 2);
    }

    #[tokio::test]
    async fn failed_forward_does_not_stop_siblings() {
        let bot = Arc::new(
            RecordingBot::new(CLOUD_UPLOAD_LIMIT)
                .reply(Ok(ok(7)))
                .reply(Err(DomainError::TelegramApi {
                    method: "forwardMessage",
                    description: "chat not found".into(),
                })),
        );
        let svc = service(bot.clone(), vec![artifact("a.apk", 1), artifact("b.apk", 1)], None);
        let mut j = job();
        j.forward_chat_ids = vec!["111".into(), "222".into()];
        let report = svc.run(&j).await.unwrap();

        // document, forward (fails), forward, document, forward, forward
        assert_eq!(bot.calls().len(), 6);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.forwarded.len(), 3);
    }

    #[tokio::test]
    async fn no_message_id_means_no_forwards() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT).reply(Ok(TelegramResponse {
            ok: true,
            result_message_id: None,
            error_description: None,
        })));
        let svc = service(bot.clone(), vec![artifact("a.apk", 1)], None);
        let mut j = job();
        j.forward_chat_ids = vec!["111".into()];
        svc.run(&j).await.unwrap();
        assert_eq!(bot.calls().len(), 1);
    }

    #[tokio::test]
    async fn strict_policy_aborts_before_second_artifact() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT).reply(Err(blocked())));
        let svc = service(bot.clone(), vec![artifact("a.apk", 1), artifact("b.apk", 1)], None);
        let mut j = job();
        j.fail_on_error = true;
        let err = svc.run(&j).await.unwrap_err();
        assert!(err.is_abort());
        assert!(err.to_string().contains("blocked"));
        assert_eq!(bot.calls().len(), 1);
    }

    #[tokio::test]
    async fn lenient_policy_attempts_second_artifact() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT).reply(Err(blocked())));
        let svc = service(bot.clone(), vec![artifact("a.apk", 1), artifact("b.apk", 1)], None);
        let report = svc.run(&job()).await.unwrap();
        assert_eq!(bot.calls().len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.delivered.len(), 1);
        assert_eq!(report.delivered[0].artifact, "b.apk");
    }

    #[tokio::test]
    async fn strict_policy_aborts_on_failed_forward() {
        let bot = Arc::new(
            RecordingBot::new(CLOUD_UPLOAD_LIMIT)
                .reply(Ok(ok(7)))
                .reply(Err(DomainError::Transport("connection reset".into()))),
        );
        let svc = service(bot.clone(), vec![artifact("a.apk", 1), artifact("b.apk", 1)], None);
        let mut j = job();
        j.fail_on_error = true;
        j.forward_chat_ids = vec!["111".into(), "222".into()];
        let err = svc.run(&j).await.unwrap_err();
        assert!(err.is_abort());
        assert_eq!(bot.calls().len(), 2);
    }

    #[tokio::test]
    async fn silent_flag_reaches_every_call() {
        let bot = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(
            bot.clone(),
            vec![artifact("a.apk", 1), artifact("big.bin", CLOUD_UPLOAD_LIMIT + 1)],
            None,
        );
        let mut j = job();
        j.silent = true;
        j.link_on_oversize = true;
        j.forward_chat_ids = vec!["111".into()];
        svc.run(&j).await.unwrap();

        let calls = bot.calls();
        assert!(matches!(calls[0], Call::Document { .. }));
        assert!(matches!(calls[1], Call::Forward { .. }));
        assert!(matches!(calls[2], Call::Link { .. }));
        assert!(matches!(calls[3], Call::Forward { .. }));
        assert_eq!(bot.silent_flags(), vec![true; 4]);

        let loud = Arc::new(RecordingBot::new(CLOUD_UPLOAD_LIMIT));
        let svc = service(loud.clone(), vec![artifact("a.apk", 1)], None);
        svc.run(&job()).await.unwrap();
        assert_eq!(loud.silent_flags(), vec![false]);
    }
}
