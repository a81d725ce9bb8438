use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reel_core::app::{PollOutcome, Session, SessionBuilder};
use reel_core::domain::{DiscoveryOutcome, PendingUpload, Sender, TaskHandle};
use reel_core::impls::HttpApi;
use reel_core::ports::TaskService;
use reel_core::{ClientConfig, ConfigSource};

#[derive(Parser)]
#[command(name = "reel", about = "Client for the Reel video-processing service")]
struct Cli {
    /// Config file (TOML or JSON). Defaults to REEL_CONFIG_PATH, then ./reel.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `api_base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video, poll until it is processed and print the result as JSON
    Process { file: PathBuf },
    /// Query a task's status once
    Status { task_id: String },
    /// Ask the assistant; simulated unless --remote
    Ask {
        text: String,
        #[arg(long)]
        remote: bool,
    },
    /// Find a video similar to an image (simulated)
    Similar { image: PathBuf },
    /// Reset the remote agent's memory
    ResetMemory,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.base_url)?;
    let api = HttpApi::from_config(&config).context("failed to create HTTP client")?;

    match cli.command {
        Command::Process { file } => process(config, api, &file).await,
        Command::Status { task_id } => status(&api, task_id).await,
        Command::Ask { text, remote } => ask(config, api, &text, remote).await,
        Command::Similar { image } => similar(config, api, &image).await,
        Command::ResetMemory => {
            let message = api.reset_memory().await.context("reset-memory failed")?;
            println!("{message}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, base_url: Option<String>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => {
            let mut config = ClientConfig::load_from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            tracing::info!(path = %path.display(), "loaded config");
            config
        }
        None => {
            let (config, source) = ClientConfig::load_from_env()?;
            if source == ConfigSource::Default {
                tracing::debug!("no config file found, using defaults");
            }
            config
        }
    };

    if let Some(base_url) = base_url {
        config.api_base_url = base_url;
    }
    config.validate()?;
    Ok(config)
}

fn build_session(config: ClientConfig, api: HttpApi, remote_discovery: bool) -> Result<Session> {
    let api = Arc::new(api);
    let mut builder = SessionBuilder::new(config).task_service(api.clone());
    if remote_discovery {
        builder = builder.discovery_resolver(api);
    }
    Ok(builder.build()?)
}

async fn process(config: ClientConfig, api: HttpApi, file: &Path) -> Result<()> {
    let upload = PendingUpload::from_path(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let session = build_session(config, api, false)?;
    session.stage(upload);

    let Some(ticket) = session.submit().await? else {
        bail!("nothing was staged");
    };
    tracing::info!(task = %ticket.handle(), "polling");

    match ticket.outcome().await {
        Some(PollOutcome::Completed(artifact)) => {
            println!("{}", serde_json::to_string_pretty(&artifact)?);
            Ok(())
        }
        Some(PollOutcome::Failed(err)) => bail!("task failed: {err}"),
        None => bail!("session ended before the task finished"),
    }
}

async fn status(api: &HttpApi, task_id: String) -> Result<()> {
    let handle = TaskHandle::new(task_id).context("task id must not be empty")?;
    let report = api.status(&handle).await?;
    let value = serde_json::json!({
        "taskId": handle,
        "status": report.status.as_str(),
        "videoUrl": report.video_url,
        "thumbnailUrl": report.thumbnail_url,
        "title": report.title,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn ask(config: ClientConfig, api: HttpApi, text: &str, remote: bool) -> Result<()> {
    let session = build_session(config, api, remote)?;
    let Some(ticket) = session.send_query(text) else {
        bail!("query is empty");
    };
    let outcome = ticket.outcome().await;
    print_transcript(&session);
    report_discovery(outcome)
}

async fn similar(config: ClientConfig, api: HttpApi, image: &Path) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("failed to read {}", image.display()))?;
    let file_name = image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.display().to_string());

    let session = build_session(config, api, false)?;
    let outcome = session.send_image(bytes, &file_name).outcome().await;
    print_transcript(&session);
    report_discovery(outcome)
}

fn print_transcript(session: &Session) {
    for message in session.transcript() {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        println!("[{who}] {}", message.text);
    }
}

fn report_discovery(outcome: Option<DiscoveryOutcome>) -> Result<()> {
    match outcome {
        Some(DiscoveryOutcome::Video(artifact)) => {
            println!("{}", serde_json::to_string_pretty(&artifact)?);
            Ok(())
        }
        Some(DiscoveryOutcome::Answer(_)) => Ok(()),
        Some(DiscoveryOutcome::Failed(err)) => bail!("discovery failed: {err}"),
        None => bail!("session ended before discovery finished"),
    }
}
