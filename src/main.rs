use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use picture_poet::app::App;
use picture_poet::history::{FileStore, PoemHistory};
use picture_poet::image::normalize_file;
use picture_poet::models::{Config, GenerationOutcome, PoemInput, PoemResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "picture-poet")]
#[command(about = "Generate poems from your favorite pictures")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a poem inspired by an image.
    Generate(GenerateArgs),
    /// Inspect or clear previously generated poems.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct ImageArgs {
    /// Remote image URL.
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// Local image file.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Inline `data:image/...;base64,...` URI.
    #[arg(long, value_name = "URI")]
    data_uri: Option<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    image: ImageArgs,
    /// Print the raw `{ success, poem, image | error }` result.
    #[arg(long)]
    json: bool,
    /// Do not save the poem to history.
    #[arg(long)]
    no_history: bool,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    /// List saved poems, newest first.
    List,
    /// Print one saved poem.
    Show { id: String },
    /// Remove every saved poem.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "picture_poet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let outcome = match args.command {
        Command::Generate(generate) => run_generate(generate).await,
        Command::History { action } => run_history(action).await,
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let app = App::from_config(&config);

    let input = match args.image {
        ImageArgs {
            file: Some(path), ..
        } => {
            // Local uploads are read and encoded before reaching the pipeline.
            let image = normalize_file(&path)
                .await
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            PoemInput::inline(image.into_string())
        }
        ImageArgs {
            url, data_uri, ..
        } => PoemInput {
            inline_image: data_uri,
            image_url: url,
        },
    };

    let outcome = app.generate(&input).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        GenerationOutcome::Success { poem, image } => {
            if !args.json {
                println!("{}", poem);
            }
            if !args.no_history {
                let history = open_history(config.history_dir);
                let entry = history.record(&PoemResult { poem, image }).await?;
                info!("Saved to history as {}", entry.id);
            }
            Ok(())
        }
        GenerationOutcome::Failure { error } => {
            anyhow::bail!("Error generating poem: {}", error)
        }
    }
}

async fn run_history(action: HistoryAction) -> Result<()> {
    let history_dir = Config::history_dir_from_env().context("Failed to load configuration")?;
    let history = open_history(history_dir);

    match action {
        HistoryAction::List => {
            let entries = history.entries().await;
            if entries.is_empty() {
                println!("No poems yet.");
            }
            for entry in entries {
                let first_line = entry.poem.lines().next().unwrap_or_default();
                println!("{}  {}", entry.id, first_line);
            }
        }
        HistoryAction::Show { id } => {
            let entry = history
                .get(&id)
                .await
                .with_context(|| format!("No poem with id {}", id))?;
            println!("{}", entry.poem);
        }
        HistoryAction::Clear => {
            history.clear().await?;
            println!("History cleared.");
        }
    }
    Ok(())
}

fn open_history(dir: PathBuf) -> PoemHistory {
    PoemHistory::new(Arc::new(FileStore::new(dir)))
}
