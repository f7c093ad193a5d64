use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use storyreel::api::{HttpGateway, PhotoFile, PipelineGateway, StylePreference};
use storyreel::config::Config;
use storyreel::session::{
    SessionEvent, SessionId, SessionObserver, MAX_PHOTOS, MIN_NARRATIVE_CHARS, MIN_PHOTOS,
};
use storyreel::workflow::{Workflow, WorkflowOutcome};

/// Turn your photos and a short narrative into an AI-generated video
#[derive(Parser)]
#[command(name = "storyreel")]
#[command(about = "Assemble a short video from photos and a narrative", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a video from photos and a narrative, waiting for completion
    Create {
        /// Photo files, in the order they should appear in the video (3-10)
        #[arg(required = true, num_args = 1..)]
        photos: Vec<PathBuf>,

        /// The story behind the photos (at least 20 characters)
        #[arg(short, long)]
        narrative: String,

        /// Presentation style for the generated video
        #[arg(short, long, value_enum, default_value_t)]
        style: StylePreference,

        /// Optional project title
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Show the generation status of a project
    Status {
        /// Remote project identifier
        project_id: String,
    },
    /// Show a project's details
    Show {
        /// Remote project identifier
        project_id: String,
    },
    /// Delete a remote project
    Delete {
        /// Remote project identifier
        project_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("storyreel started with verbosity level: {}", cli.verbose);

    let result = match cli.command {
        Commands::Create {
            photos,
            narrative,
            style,
            title,
        } => run_create(photos, narrative, style, title, cli.config.as_deref()).await,
        Commands::Status { project_id } => run_status(&project_id, cli.config.as_deref()).await,
        Commands::Show { project_id } => run_show(&project_id, cli.config.as_deref()).await,
        Commands::Delete { project_id } => run_delete(&project_id, cli.config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn gateway_from(config_path: Option<&Path>) -> anyhow::Result<(Config, Arc<HttpGateway>)> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let gateway = Arc::new(HttpGateway::new(&config.api)?);
    Ok((config, gateway))
}

async fn run_create(
    photos: Vec<PathBuf>,
    narrative: String,
    style: StylePreference,
    title: Option<String>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    // Mirror the step guards up front so bad input fails before any remote
    // call is made.
    if photos.len() < MIN_PHOTOS || photos.len() > MAX_PHOTOS {
        bail!(
            "Select between {MIN_PHOTOS} and {MAX_PHOTOS} photos ({} given)",
            photos.len()
        );
    }
    if narrative.chars().count() < MIN_NARRATIVE_CHARS {
        bail!("The narrative needs at least {MIN_NARRATIVE_CHARS} characters");
    }

    let (config, gateway) = gateway_from(config_path)?;
    let workflow = Workflow::new(gateway, config.poll.interval());

    for path in &photos {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(String::from)
            .ok_or_else(|| anyhow!("Invalid photo path: {}", path.display()))?;
        let photo = PhotoFile::new(filename, bytes);
        if !photo.content_type().starts_with("image/") {
            bail!("Not an image file: {}", path.display());
        }
        workflow.add_photo(photo).await;
    }

    workflow.set_narrative(narrative).await;
    workflow.set_style(style).await;
    if let Some(title) = title {
        workflow.set_title(title).await;
    }
    workflow.add_observer(Arc::new(ProgressRenderer::new())).await;

    workflow.next().await;
    let step = workflow.next().await;
    debug!(step = %step, "Pipeline dispatched");

    match workflow.wait_for_outcome().await {
        WorkflowOutcome::Completed { video_url } => {
            println!("Your video is ready: {video_url}");
            Ok(())
        }
        WorkflowOutcome::Failed { error } => Err(anyhow!(error)),
    }
}

async fn run_status(project_id: &str, config_path: Option<&Path>) -> anyhow::Result<()> {
    let (_, gateway) = gateway_from(config_path)?;
    let status = gateway.generation_status(project_id).await?;

    println!("Project:  {}", status.project_id);
    println!("Status:   {}", status.status);
    println!("Progress: {}%", status.progress);
    if !status.message.is_empty() {
        println!("Message:  {}", status.message);
    }
    if let Some(url) = &status.video_url {
        println!("Video:    {url}");
    }
    Ok(())
}

async fn run_show(project_id: &str, config_path: Option<&Path>) -> anyhow::Result<()> {
    let (_, gateway) = gateway_from(config_path)?;
    let project = gateway.get_project(project_id).await?;

    println!("Project:  {}", project.id);
    println!("Title:    {}", project.title.as_deref().unwrap_or("-"));
    println!("Status:   {}", project.status);
    println!("Photos:   {}", project.photo_count);
    println!("Created:  {}", project.created_at);
    if let Some(completed) = project.completed_at {
        println!("Finished: {completed}");
    }
    if let Some(url) = &project.video_url {
        println!("Video:    {url}");
    }
    Ok(())
}

async fn run_delete(project_id: &str, config_path: Option<&Path>) -> anyhow::Result<()> {
    let (_, gateway) = gateway_from(config_path)?;
    gateway.delete_project(project_id).await?;
    println!("Deleted project {project_id}");
    Ok(())
}

/// Renders session progress as a terminal progress bar
struct ProgressRenderer {
    bar: ProgressBar,
}

impl ProgressRenderer {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

#[async_trait]
impl SessionObserver for ProgressRenderer {
    async fn on_event(&self, _session_id: &SessionId, event: &SessionEvent) {
        match event {
            SessionEvent::Milestone { progress, message } => {
                self.bar.set_position(u64::from(*progress));
                self.bar.set_message(message.clone());
            }
            SessionEvent::StatusUpdated { status } => {
                self.bar.set_position(u64::from(status.progress));
                self.bar.set_message(status.message.clone());
            }
            SessionEvent::Completed { .. } => {
                self.bar.set_position(100);
                self.bar.finish_with_message("Video ready");
            }
            SessionEvent::Failed { error } => {
                self.bar.abandon_with_message(error.clone());
            }
            _ => {}
        }
    }
}
