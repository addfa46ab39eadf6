//! Wiring & DI. Entry point: load config, bootstrap adapters, inject into services, run.
//! No business logic here; the workflow lives in UploadService.

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tg_uploader::adapters::artifacts::FsArtifactStore;
use tg_uploader::adapters::build::{StaticBuildSource, load_build_info};
use tg_uploader::adapters::env::MapEnvironment;
use tg_uploader::adapters::telegram::BotApiClient;
use tg_uploader::adapters::ui::{self, BarProgress};
use tg_uploader::domain::{BotConfig, RunReport, UploadJob};
use tg_uploader::ports::{ArtifactStore, BotApi, BuildSource, Environment};
use tg_uploader::shared::config::AppConfig;
use tg_uploader::usecases::{AdminService, FailurePolicy, UploadService};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tg-uploader", version, about = "Upload CI build artifacts to Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload matching artifacts (default).
    Upload,
    /// Check that the bot token and API server work (getUpdates).
    TestConnection,
    /// Log the bot out of the cloud Bot API server.
    LogOut {
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', env = "TG_UPLOADER_ASSUME_YES")]
        yes: bool,
    },
    /// Validate configuration fields and exit.
    CheckConfig,
}

/// Per-run settings; each one wins over the loaded configuration.
/// Flags take an optional value: `--silent` or `--silent=false`.
#[derive(Args, Debug, Default)]
struct Overrides {
    #[arg(long, global = true)]
    chat_id: Option<String>,
    /// Comma-separated.
    #[arg(long, global = true)]
    forward_chat_ids: Option<String>,
    #[arg(long, global = true)]
    caption: Option<String>,
    /// Ant-style glob, e.g. `**/*.apk`.
    #[arg(long, global = true)]
    filter: Option<String>,
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    silent: Option<bool>,
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    fail_on_error: Option<bool>,
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    link_on_oversize: Option<bool>,
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    artifacts_url: Option<String>,
    #[arg(long, global = true)]
    build_result: Option<String>,
    /// JSON file with the build result and change history.
    #[arg(long, global = true)]
    build_info: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(v) = self.chat_id {
            cfg.chat_id = Some(v);
        }
        if let Some(v) = self.forward_chat_ids {
            cfg.forward_chat_ids = Some(v);
        }
        if let Some(v) = self.caption {
            cfg.caption = Some(v);
        }
        if let Some(v) = self.filter {
            cfg.filter = Some(v);
        }
        if let Some(v) = self.silent {
            cfg.silent = v;
        }
        if let Some(v) = self.fail_on_error {
            cfg.fail_build_if_upload_failed = v;
        }
        if let Some(v) = self.link_on_oversize {
            cfg.send_link_if_upload_size_limit_exceeded = v;
        }
        if let Some(v) = self.artifacts_dir {
            cfg.artifacts_dir = Some(v.display().to_string());
        }
        if let Some(v) = self.artifacts_url {
            cfg.artifacts_url = Some(v);
        }
        if let Some(v) = self.build_result {
            cfg.build_result = Some(v);
        }
        if let Some(v) = self.build_info {
            cfg.build_info = Some(v.display().to_string());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cli = Cli::parse();
    let interactive = std::io::stdout().is_terminal();
    if interactive {
        ui::init_ui();
    }

    let mut cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    cli.overrides.apply(&mut cfg);

    match cli.command.unwrap_or(Command::Upload) {
        Command::Upload => run_upload(&cfg, interactive).await,
        Command::TestConnection => {
            let admin = AdminService::new(bot_client(&cfg.bot_config()?)?);
            let result = admin.test_connection().await;
            println!("{}", result);
            if !result.is_ok() {
                anyhow::bail!("connection test failed");
            }
            Ok(())
        }
        Command::LogOut { yes } => {
            let bot_config = cfg.bot_config()?;
            if !yes && !ui::prompt::confirm_log_out(&bot_config.api_base_url)? {
                info!("log out cancelled");
                return Ok(());
            }
            let admin = AdminService::new(bot_client(&bot_config)?);
            let result = admin.log_out().await;
            println!("{}", result);
            if !result.is_ok() {
                anyhow::bail!("log out failed");
            }
            Ok(())
        }
        Command::CheckConfig => {
            let checks = cfg.validate();
            for check in &checks {
                println!("{}: {}", check.field, check.result);
            }
            if checks.iter().any(|c| !c.result.is_ok()) {
                anyhow::bail!("configuration is invalid");
            }
            Ok(())
        }
    }
}

fn bot_client(config: &BotConfig) -> anyhow::Result<Arc<dyn BotApi>> {
    Ok(Arc::new(BotApiClient::new(config)?))
}

async fn run_upload(cfg: &AppConfig, interactive: bool) -> anyhow::Result<()> {
    let invalid: Vec<_> = cfg
        .validate()
        .into_iter()
        .filter(|c| !c.result.is_ok())
        .collect();
    if !invalid.is_empty() {
        for check in &invalid {
            error!(field = check.field, result = %check.result, "invalid configuration");
        }
        anyhow::bail!("configuration is invalid; run `tg-uploader check-config`");
    }

    let job = cfg.upload_job()?;
    let bot_config = cfg.bot_config()?;

    let mut build_source = match cfg.build_info_path() {
        Some(path) => load_build_info(path).await?,
        None => StaticBuildSource::new(None),
    };
    if let Some(result) = cfg.build_result()? {
        build_source = build_source.with_result(Some(result));
    }

    // Proxy setup failures are upload failures, so the job's policy decides.
    let bot: Arc<dyn BotApi> = match BotApiClient::new(&bot_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            let mut report = RunReport::start();
            FailurePolicy::new(job.fail_on_error)
                .fail(&mut report, e)
                .inspect_err(|abort| error!(error = %abort, "upload aborted"))?;
            log_report(&job, &report.finish());
            return Ok(());
        }
    };

    let artifacts_dir = cfg.artifacts_dir_or_default();
    info!(
        path = %artifacts_dir.display(),
        api = %bot_config.api_base_url,
        "artifact directory"
    );
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(FsArtifactStore::new(&artifacts_dir, cfg.artifacts_url()));
    let build: Arc<dyn BuildSource> = Arc::new(build_source);
    let env: Arc<dyn Environment> = Arc::new(MapEnvironment::from_process());

    let mut service = UploadService::new(bot, artifacts, build, env);
    if interactive || std::io::stderr().is_terminal() {
        service = service.with_progress(Arc::new(BarProgress::new()));
    }

    match service.run(&job).await {
        Ok(report) => {
            log_report(&job, &report);
            Ok(())
        }
        Err(abort) => {
            error!(error = %abort, "upload aborted");
            Err(abort.into())
        }
    }
}

fn log_report(job: &UploadJob, report: &RunReport) {
    if report.skipped {
        info!("upload skipped");
        return;
    }
    for failure in &report.failures {
        warn!(chat_id = %job.chat_id, failure = %failure, "upload failure reported");
    }
    let elapsed_ms = report
        .finished_at
        .map(|end| (end - report.started_at).num_milliseconds())
        .unwrap_or_default();
    info!(
        delivered = report.delivered.len(),
        forwarded = report.forwarded.len(),
        failures = report.failures.len(),
        elapsed_ms,
        clean = report.is_clean(),
        "upload summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(args: &[&str], base: AppConfig) -> AppConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut cfg = base;
        cli.overrides.apply(&mut cfg);
        cfg
    }

    #[test]
    fn bare_flag_turns_setting_on() {
        let cfg = configured(
            &["tg-uploader", "upload", "--silent", "--link-on-oversize"],
            AppConfig::default(),
        );
        assert!(cfg.silent);
        assert!(cfg.send_link_if_upload_size_limit_exceeded);
        assert!(!cfg.fail_build_if_upload_failed);
    }

    #[test]
    fn explicit_false_turns_setting_off() {
        let base = AppConfig {
            silent: true,
            fail_build_if_upload_failed: true,
            send_link_if_upload_size_limit_exceeded: true,
            ..AppConfig::default()
        };
        let cfg = configured(
            &[
                "tg-uploader",
                "--silent=false",
                "--fail-on-error=false",
                "--link-on-oversize=false",
            ],
            base,
        );
        assert!(!cfg.silent);
        assert!(!cfg.fail_build_if_upload_failed);
        assert!(!cfg.send_link_if_upload_size_limit_exceeded);
    }

    #[test]
    fn absent_flags_keep_loaded_values() {
        let base = AppConfig {
            silent: true,
            chat_id: Some("@loaded".into()),
            ..AppConfig::default()
        };
        let cfg = configured(&["tg-uploader", "--chat-id", "@cli"], base);
        assert!(cfg.silent);
        assert_eq!(cfg.chat_id.as_deref(), Some("@cli"));
    }
}
