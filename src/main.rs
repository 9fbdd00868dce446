//! # Merger Dashboard CLI (`mdash`)
//!
//! The `mdash` binary talks to the merger-integration backend. Each
//! subcommand performs one backend call and renders the result; `mdash shell`
//! keeps pages mounted in an interactive session.
//!
//! ## Usage
//!
//! ```bash
//! mdash --config ./config/mdash.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mdash dashboard` | Status cards and service health checks |
//! | `mdash health` | Raw health summary |
//! | `mdash clients "<query>"` | Search the merged client database |
//! | `mdash ask "<question>"` | Ask the knowledge base (RAG) |
//! | `mdash chat "<message>"` | Chat with the model directly |
//! | `mdash docs search "<query>"` | Vector search over indexed documents |
//! | `mdash docs stats` | Indexed document count |
//! | `mdash docs ingest <file>` | Add a text document to the index |
//! | `mdash models` | Models available on the LLM host |
//! | `mdash reports` | Reports catalog |
//! | `mdash shell` | Interactive session |
//! | `mdash completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! # Watch backend health, refreshing every 30 seconds
//! mdash dashboard --watch
//!
//! # Point at a staging backend without touching the config file
//! mdash --api-url http://staging:5001 clients "acme"
//!
//! # Machine-readable output
//! mdash --json ask "What are the audit procedures?"
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;
use std::path::PathBuf;
use std::sync::Arc;

use merger_dashboard::api::{ApiClient, Backend};
use merger_dashboard::chat::{self, AskMode};
use merger_dashboard::{config, dashboard, docs, logging, reports, search, shell};

/// Merger Dashboard CLI: system status, client search, knowledge-base
/// chat, and reports for the merger-integration platform.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "mdash",
    about = "Merger Dashboard: terminal console for the merger-integration platform",
    version,
    long_about = "Merger Dashboard talks to the merger-integration REST backend: system health, \
    unified client search across the merged databases, retrieval-augmented questions over the \
    document index, and the reports catalog."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/mdash.toml`. When the file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/mdash.toml")]
    config: PathBuf,

    /// Backend base URL. Overrides `[api].base_url` and `MDASH_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print raw JSON instead of rendered text.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Show the system dashboard.
    ///
    /// Fetches `/health` and `/api/v1/documents` and prints the status
    /// cards, the per-service checks, and the quick actions.
    Dashboard {
        /// Keep running and re-check health every `dashboard.health_poll_ms`.
        #[arg(long)]
        watch: bool,
    },

    /// Print the backend health report.
    Health,

    /// Search the unified client database.
    ///
    /// Matches legal names and DBA names across every merged source.
    Clients {
        /// Search text.
        query: String,
    },

    /// Ask the knowledge base a question.
    ///
    /// The backend retrieves matching documents and answers from them.
    /// The answer is printed with its source citations.
    Ask {
        /// The question.
        question: String,

        /// Answer without retrieved context.
        #[arg(long)]
        no_context: bool,
    },

    /// Chat with the model directly, without retrieval.
    Chat {
        /// The message.
        message: String,
    },

    /// Work with the document index.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// List models available on the LLM host.
    Models,

    /// Show the reports catalog.
    Reports {
        /// Open the preview for a report (id or name).
        #[arg(long)]
        show: Option<String>,
    },

    /// Start an interactive session.
    ///
    /// Pages stay mounted between commands: the dashboard polls health,
    /// the knowledge base keeps its transcript. Type `:help` inside.
    Shell,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: CompletionShell,
    },
}

/// Document index subcommands.
#[derive(Subcommand)]
enum DocsAction {
    /// Vector search over indexed documents.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results. Defaults to `search.document_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the indexed document count.
    Stats,

    /// Add a text file to the index.
    Ingest {
        /// Path to the document.
        file: PathBuf,

        /// Document id. The backend assigns one when omitted.
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "mdash", &mut std::io::stdout());
        return Ok(());
    }

    let mut cfg = config::load_or_default(&cli.config)?;
    if let Some(url) = &cli.api_url {
        cfg.api.base_url = url.clone();
        config::validate(&cfg)?;
    }
    logging::init(&cfg.logging, cli.verbose)?;

    if let Commands::Reports { show } = &cli.command {
        return reports::run_reports(&cfg, show.as_deref());
    }

    let client = ApiClient::new(&cfg.api)?;
    tracing::debug!(base_url = client.base_url(), "backend configured");
    let backend: Arc<dyn Backend> = Arc::new(client);
    let json = cli.json;

    match cli.command {
        Commands::Dashboard { watch } => {
            dashboard::run_dashboard(&cfg, backend, watch).await?;
        }
        Commands::Health => {
            dashboard::run_health(&cfg, backend.as_ref(), json).await?;
        }
        Commands::Clients { query } => {
            search::run_client_search(&cfg, backend.as_ref(), &query, json).await?;
        }
        Commands::Ask {
            question,
            no_context,
        } => {
            let use_context = if no_context { Some(false) } else { None };
            chat::run_exchange(&cfg, backend.as_ref(), &question, AskMode::Rag, use_context, json)
                .await?;
        }
        Commands::Chat { message } => {
            chat::run_exchange(&cfg, backend.as_ref(), &message, AskMode::Direct, None, json)
                .await?;
        }
        Commands::Docs { action } => match action {
            DocsAction::Search { query, limit } => {
                docs::run_search_documents(&cfg, backend.as_ref(), &query, limit, json).await?;
            }
            DocsAction::Stats => {
                docs::run_document_stats(backend.as_ref(), json).await?;
            }
            DocsAction::Ingest { file, id } => {
                docs::run_ingest(backend.as_ref(), &file, id, json).await?;
            }
        },
        Commands::Models => {
            dashboard::run_models(backend.as_ref(), json).await?;
        }
        Commands::Shell => {
            shell::run_shell(cfg, backend).await?;
        }
        Commands::Reports { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}
