use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use storyreels::args::{Args, Cmd};
use storyreels::capabilities::Capabilities;
use storyreels::feed::RssFeedClient;
use storyreels::render::select_renderer;
use storyreels::tts::{NarratorSettings, select_narrator};
use storyreels::upload::GithubUploader;
use storyreels::{Pipeline, ProjectStore, RunReport, StoryConfig};

fn load_config(args: &Args) -> anyhow::Result<StoryConfig> {
    let mut config = match &args.config {
        Some(path) => StoryConfig::from_file(path)?,
        None => StoryConfig::default(),
    };
    if let Some(segments) = args.segments {
        config.script.segment_count = segments;
    }
    if let Some(total) = args.total_seconds {
        config.script.total_seconds = total;
    }
    if let Some(repo) = &args.github_repo {
        config.github_repo = repo.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_pipeline(args: &Args, config: StoryConfig) -> anyhow::Result<Pipeline> {
    let store = ProjectStore::open(&args.output_dir)?;
    let caps = Capabilities::probe();
    let narrator = select_narrator(
        args.narrator,
        &caps,
        &NarratorSettings {
            piper_model: args.piper_model.clone(),
            openai_api_key: args.openai_api_key.clone(),
            openai_voice: args.openai_voice.clone(),
        },
    );
    let uploader = match (&args.github_token, config.github_repo.is_empty()) {
        (Some(token), false) => Some(GithubUploader::new(&config.github_repo, &config.github_dir, token)),
        _ => None,
    };
    Ok(Pipeline {
        used_links_path: args.output_dir.join("used_links.json"),
        renderer: select_renderer(args.renderer, &caps),
        config,
        store,
        narrator,
        uploader,
    })
}

async fn run(args: &Args) -> anyhow::Result<RunReport> {
    let config = load_config(args)?;
    let pipeline = build_pipeline(args, config)?;
    let feeds = RssFeedClient::new();

    let report = match &args.command {
        Cmd::Generate => pipeline.generate_report(&feeds).await?,
        Cmd::Render { id, upload } => pipeline.render(id, *upload).await?,
        Cmd::Auto { upload } => pipeline.auto(&feeds, *upload).await?,
        Cmd::Status { id } => {
            let status = pipeline.store.status(id);
            println!("{}", serde_json::to_string_pretty(&status)?);
            let report = if status.project {
                RunReport::success("Project found")
            } else {
                RunReport::failure("Project not found")
            };
            RunReport {
                project_id: Some(id.clone()),
                ..report
            }
        }
        Cmd::List { limit } => {
            let projects = pipeline.store.recent(*limit)?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
            RunReport::success(format!("{} projects", projects.len()))
        }
    };
    Ok(report)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("Starting story video pipeline");

    let report = match run(&args).await {
        Ok(report) => report,
        Err(e) => {
            error!("Error: {:#}", e);
            RunReport::failure(format!("{:#}", e))
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Could not serialize report: {}", e),
    }
    if !report.success {
        std::process::exit(1);
    }
}
