use anyhow::Result;
use clap::{Parser, Subcommand};
use maeum_core::config::MaeumConfig;
use maeum_core::{Category, ConversationHistory, ConversationTurn, CoreError};
use maeum_gateway::GatewayServer;
use maeum_reasoning::TurnContext;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

mod app;

use app::Services;

#[derive(Parser, Debug)]
#[command(name = "maeum", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "maeum.toml", env = "MAEUM_CONFIG")]
    config: PathBuf,

    /// Override the SQLite database path
    #[arg(long)]
    db: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Also write daily-rotated JSON logs into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Insert the built-in sample catalog
    Seed,
    /// Import crawler output (a JSON array of content records)
    Import {
        file: PathBuf,
        /// Category for records that do not name one
        #[arg(long)]
        category: Option<String>,
    },
    /// Print recommendations as JSON
    Recommend {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        emotion: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        /// One item per category for a coarse bucket (기쁨, 평온, 슬픔, 분노, 불안, 중립)
        #[arg(long, conflicts_with_all = ["category", "emotion", "limit"])]
        grouped: Option<String>,
    },
    /// Classify the emotion of a text
    Analyze { text: String },
    /// Talk in the terminal; each reply is prefixed with its mode
    Chat {
        /// Log turns to this diary's conversation
        #[arg(long)]
        diary: Option<i64>,
    },
}

fn init_logging(json: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
    }

    let guard = log_dir.map(|dir| {
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "maeum.log"));
        layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
        guard
    });

    tracing_subscriber::registry().with(layers).with(filter).init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _guard = init_logging(args.log_json, args.log_dir.as_deref());

    let mut config = MaeumConfig::load_or_default(&args.config);
    if let Some(db) = args.db {
        config.storage.db_path = db;
    }

    match args.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Seed => {
            let store = Services::open_store(&config).await?;
            let report = store.seed_sample_catalog().await?;
            println!(
                "Seeded {} item(s), {} already present",
                report.inserted, report.duplicates
            );
            Ok(())
        }
        Command::Import { file, category } => {
            let category = category.map(parse_category).transpose()?;
            let store = Services::open_store(&config).await?;
            let report = store.import_json(&file, category).await?;
            println!(
                "Imported {} item(s) from {}: {} duplicate(s), {} skipped",
                report.inserted,
                file.display(),
                report.duplicates,
                report.skipped
            );
            Ok(())
        }
        Command::Recommend {
            category,
            emotion,
            limit,
            grouped,
        } => {
            let store = Services::open_store(&config).await?;
            let matcher = Services::matcher(&store, &config);
            let json = if let Some(bucket) = grouped {
                serde_json::to_string_pretty(&matcher.recommend_grouped(&bucket).await?)?
            } else if let Some(category) = category {
                let category = parse_category(category)?;
                let items = matcher
                    .recommend_shaped(category, emotion.as_deref(), limit)
                    .await?;
                serde_json::to_string_pretty(&items)?
            } else {
                serde_json::to_string_pretty(&matcher.recommend_all(emotion.as_deref()).await)?
            };
            println!("{}", json);
            Ok(())
        }
        Command::Analyze { text } => {
            let services = Services::build(&config).await?;
            let result = services.journal.analyze(&text).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Chat { diary } => chat(config, diary).await,
    }
}

fn parse_category(raw: String) -> Result<Category, CoreError> {
    Category::parse(&raw).ok_or(CoreError::UnknownCategory(raw))
}

async fn serve(mut config: MaeumConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    info!("Initializing Maeum...");
    let verifier = app::build_verifier(&config.auth)?;
    let services = Services::build(&config).await?;
    let state = services.into_app_state(verifier);
    GatewayServer::new(state, &config.gateway.host, config.gateway.port)
        .serve()
        .await
}

async fn chat(config: MaeumConfig, diary: Option<i64>) -> Result<()> {
    let services = Services::build(&config).await?;
    if let Some(id) = diary {
        let log = services.store.load_log(id, usize::MAX).await?;
        println!("Diary {}: {} earlier turn(s)", id, log.len());
    }

    println!("Maeum online. Type 'quit' to exit.");
    let mut rl = DefaultEditor::new()?;
    let mut history = ConversationHistory::new();

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        let ctx = match diary {
            Some(id) => TurnContext::for_diary(id),
            None => TurnContext::inline(history.clone()),
        };
        match services.session.turn_text(trimmed, ctx).await {
            Ok(outcome) => {
                println!("\n[{}] {}\n", outcome.mode, outcome.response);
                for warning in &outcome.warnings {
                    println!("(warning: {} failed: {})", warning.stage, warning.message);
                }
                history.push(ConversationTurn::new(
                    outcome.input,
                    outcome.response,
                    outcome.mode,
                ));
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                println!("\n[System Error]: {}\n", e);
            }
        }
    }

    Ok(())
}
