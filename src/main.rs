use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod api;
mod assistant;
mod cli_output;
mod config;
mod file_tree;
mod formatter;
mod models;
mod requester;
mod state;
mod tui;
mod upload;

use api::{ApiError, HttpBackend};
use cli_output::{OutputMode, OutputWriter};
use config::Config;
use formatter::format_analysis_result;
use models::{AnalysisRequest, Category};
use requester::{analyze_all, analyze_one};
use state::AppState;
use upload::FolderUpload;

#[derive(Parser)]
#[command(name = "cognitia")]
#[command(about = "Request AI code analyses and read them in the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Analysis service address (overrides config and COGNITIA_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Output format (human, plain, json). Auto-detected when omitted
    #[arg(short, long, global = true)]
    format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze code for one category, or all four at once
    Analyze {
        /// bug, style, performance, security or all
        category: String,

        /// Source file to analyze (reads stdin when neither --file nor --code is given)
        #[arg(long, conflicts_with = "code")]
        file: Option<PathBuf>,

        /// Code passed inline
        #[arg(long)]
        code: Option<String>,

        /// Programming language (inferred from --file when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Team conventions, sent with style analysis
        #[arg(long)]
        team_conventions: Option<String>,

        /// Additional context, sent with performance analysis
        #[arg(long)]
        context: Option<String>,

        /// Print the service's raw answer without formatting
        #[arg(long)]
        raw: bool,
    },

    /// Format a saved raw analysis offline
    Format {
        /// File holding the raw text (default: stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Category used for presentation
        #[arg(short, long, default_value = "bug")]
        category: String,
    },

    /// Show the project tree of a folder as the explorer would build it
    Tree {
        /// Folder to upload
        dir: PathBuf,

        /// Include hidden files
        #[arg(long)]
        hidden: bool,
    },

    /// Code assistant suggestions and context review
    Suggest {
        /// Source file (default: stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(short, long)]
        language: Option<String>,

        /// Free-text description of the project
        #[arg(long)]
        project_context: Option<String>,
    },

    /// Interactive terminal UI
    Tui {
        /// Source file to start with
        #[arg(long)]
        file: Option<PathBuf>,

        /// Folder to load into the explorer
        #[arg(long)]
        dir: Option<PathBuf>,

        #[arg(short, long)]
        language: Option<String>,

        #[arg(long)]
        team_conventions: Option<String>,

        #[arg(long)]
        context: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Set a configuration key (base_url, timeout_secs, default_language)
    Set { key: String, value: String },
}

fn init_logging(verbose: bool, to_file: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);

    if to_file {
        // The TUI owns the terminal, so logs go to a file instead
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cognitia");
        fs::create_dir_all(&dir)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("cognitia.log"))?;
        let subscriber = builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = builder.with_writer(io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Code from --code, --file or stdin, in that order
fn read_code(code: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code);
    }
    if let Some(path) = file {
        return upload::read_source_file(path);
    }
    if io::stdin().is_terminal() {
        return Err(anyhow!("No code given. Use --file, --code or pipe code on stdin"));
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

/// Explicit flag, then the file extension, then the configured default
fn resolve_language(flag: Option<String>, file: Option<&Path>, config: &Config) -> String {
    flag.map(|l| models::canonical_language(&l))
        .or_else(|| {
            file.and_then(|p| p.to_str())
                .map(|p| file_tree::display_language(file_tree::language_for_path(p)).to_string())
        })
        .or_else(|| config.default_language.clone())
        .unwrap_or_default()
}

/// Next step to suggest after a failed request
fn failure_hint(error: &ApiError, base_url: &str) -> Option<String> {
    if error.is_network_error() {
        Some(format!("Is the analysis service running at {}?", base_url))
    } else if error.is_timeout() {
        Some("Raise timeout_secs with `cognitia config set timeout_secs <n>`".to_string())
    } else if error.is_server_error() {
        Some("The analysis service failed internally, try again later".to_string())
    } else {
        None
    }
}

fn spinner(out: &OutputWriter, message: String) -> Option<ProgressBar> {
    if !out.is_human() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    init_logging(cli.verbose, matches!(cli.command, Commands::Tui { .. }))?;

    let mut config = Config::load()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    let out = OutputWriter::new(OutputMode::from_flag(cli.format.as_deref())?);

    match cli.command {
        Commands::Analyze {
            category,
            file,
            code,
            language,
            team_conventions,
            context,
            raw,
        } => {
            let categories = if category.eq_ignore_ascii_case("all") {
                Category::ALL.to_vec()
            } else {
                vec![Category::from_str(&category)?]
            };
            let code = read_code(code, file.as_deref())?;
            if code.trim().is_empty() {
                return Err(anyhow!("No code provided"));
            }
            let request = AnalysisRequest::new(
                code,
                resolve_language(language, file.as_deref(), &config),
            )
            .with_team_conventions(team_conventions)
            .with_context(context);

            let backend = HttpBackend::new(&config.base_url, config.timeout())?;
            info!("🔍 Analyzing with {}", backend.base_url());

            let pb = spinner(&out, format!("Running {} analysis...", category.to_lowercase()));
            let outcome = match categories.as_slice() {
                [single] => analyze_one(&backend, *single, &request)
                    .await
                    .map(|text| vec![(*single, text)]),
                all => analyze_all(&backend, all, &request).await.map(|batch| {
                    all.iter()
                        .filter_map(|c| batch.get(*c).map(|text| (*c, text.to_string())))
                        .collect()
                }),
            };
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            let results = match outcome {
                Ok(results) => results,
                Err(failure) => {
                    out.error(&failure.to_string());
                    if let Some(hint) = failure_hint(&failure.source, backend.base_url()) {
                        out.warning(&hint);
                    }
                    return Err(anyhow!("{} analysis did not complete", failure.category));
                }
            };

            for (category, text) in &results {
                if raw {
                    out.raw_result(*category, text);
                } else {
                    out.formatted_result(*category, format_analysis_result(Some(text)).as_ref());
                }
            }
            Ok(())
        }

        Commands::Format { file, category } => {
            let category = Category::from_str(&category)?;
            let text = read_code(None, file.as_deref())?;
            out.formatted_result(category, format_analysis_result(Some(&text)).as_ref());
            Ok(())
        }

        Commands::Tree { dir, hidden } => {
            info!("📂 Reading {}", dir.display());
            let files = FolderUpload::new(dir).with_hidden(hidden).read_all().await?;
            if files.is_empty() {
                out.warning("No readable files found");
                return Ok(());
            }
            let tree = file_tree::build_file_tree(files);
            out.file_tree(&tree);
            Ok(())
        }

        Commands::Suggest {
            file,
            language,
            project_context,
        } => {
            let code = read_code(None, file.as_deref())?;
            let language = resolve_language(language, file.as_deref(), &config);
            out.assistant(
                &assistant::suggestions(&code, &language),
                &assistant::context_review(&code, &language, project_context.as_deref()),
                &assistant::previous_suggestions(),
            );
            Ok(())
        }

        Commands::Tui {
            file,
            dir,
            language,
            team_conventions,
            context,
        } => {
            let code = match file.as_deref() {
                Some(path) => upload::read_source_file(path)?,
                None => String::new(),
            };
            let request = AnalysisRequest::new(
                code,
                resolve_language(language, file.as_deref(), &config),
            )
            .with_team_conventions(team_conventions)
            .with_context(context);

            let mut app = AppState::new(request);
            app.selected_file = file.map(|p| p.display().to_string());

            let backend = HttpBackend::new(&config.base_url, config.timeout())?;
            tui::run_tui(app, backend, dir.map(FolderUpload::new))
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                out.section("Configuration");
                out.table(&config.rows());
                Ok(())
            }
            ConfigAction::Path => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            ConfigAction::Set { key, value } => {
                // Start from the file, not the env-overridden view
                let mut stored = Config::load_from(&Config::config_file_path()?)?;
                stored.set(&key, &value)?;
                stored.save()?;
                out.success(&format!("Set {} = {}", key, value));
                Ok(())
            }
        },
    }
}
