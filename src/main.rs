use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use composer::api::{EntityApi, HttpEntityApi, MockEntityApi, SubmissionDispatcher};
use composer::config::Config;
use composer::drafts::{DraftStore, JsonFileDraftStore};
use composer::error::SubmitFailure;
use composer::logging;
use composer::rest;
use composer::wizard::step::LabelContext;
use composer::wizard::value::{from_json, DraftValue};
use composer::wizard::{Composer, Outcome, SubmitMode, WizardKind};

#[derive(Parser)]
#[command(name = "composer")]
#[command(about = "Multi-step entity composer with resumable drafts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (default: rest_api.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the steps of a wizard
    Steps {
        /// Wizard kind (project, organization)
        wizard: String,
    },

    /// Manage stored drafts
    Drafts {
        #[command(subcommand)]
        action: DraftsAction,
    },

    /// Run a wizard interactively: one JSON object per step on stdin
    Compose {
        /// Wizard kind (project, organization)
        wizard: String,

        /// Resume the draft at this index
        #[arg(long)]
        draft: Option<usize>,

        /// Step to open when resuming
        #[arg(long, requires = "draft")]
        step: Option<String>,

        /// Edit the existing record with this id
        #[arg(long, conflicts_with_all = ["duplicate", "draft"])]
        edit: Option<String>,

        /// Create a copy of an existing record
        #[arg(long)]
        duplicate: bool,

        /// Initial value as a JSON object (edit and duplicate flows)
        #[arg(long)]
        value: Option<String>,

        /// Echo submissions locally instead of calling the remote API
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the OpenAPI document
    Openapi,

    /// Write a default config to .composer/config.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum DraftsAction {
    /// List drafts of a wizard
    List { wizard: String },
    /// Discard a draft; other drafts keep their indices
    Discard { wizard: String, index: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_server_mode = matches!(cli.command, Commands::Serve { .. });
    let logging_handle = logging::init_logging(&config, is_server_mode, cli.debug)?;
    if let Some(path) = &logging_handle.log_file_path {
        eprintln!("Logging to {}", path.display());
    }

    match cli.command {
        Commands::Serve { port } => cmd_serve(&config, port).await?,
        Commands::Steps { wizard } => cmd_steps(&wizard)?,
        Commands::Drafts { action } => match action {
            DraftsAction::List { wizard } => cmd_drafts_list(&config, &wizard)?,
            DraftsAction::Discard { wizard, index } => {
                cmd_drafts_discard(&config, &wizard, index)?
            }
        },
        Commands::Compose {
            wizard,
            draft,
            step,
            edit,
            duplicate,
            value,
            dry_run,
        } => {
            let mode = match (edit, duplicate) {
                (Some(id), _) => SubmitMode::Edit { id },
                (None, true) => SubmitMode::Duplicate,
                (None, false) => SubmitMode::Create,
            };
            cmd_compose(&config, &wizard, mode, draft, step, value, dry_run).await?
        }
        Commands::Openapi => println!("{}", rest::ApiDoc::json()?),
        Commands::Init { force } => cmd_init(&config, force)?,
    }

    Ok(())
}

fn parse_kind(wizard: &str) -> Result<WizardKind> {
    wizard.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn draft_store(config: &Config, kind: WizardKind) -> JsonFileDraftStore {
    JsonFileDraftStore::new(config.drafts_path(), kind.slug())
}

fn entity_api(config: &Config, dry_run: bool) -> Result<Arc<dyn EntityApi>> {
    if dry_run {
        return Ok(Arc::new(MockEntityApi::new()));
    }
    let api = HttpEntityApi::from_config(&config.api)
        .context("Remote API is not configured; set api.base_url or pass --dry-run")?;
    Ok(Arc::new(api))
}

async fn cmd_serve(config: &Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.rest_api.port);
    let api: Arc<dyn EntityApi> = match HttpEntityApi::from_config(&config.api) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            tracing::warn!("{}; submissions will be echoed locally", e);
            Arc::new(MockEntityApi::new())
        }
    };

    println!("Starting REST API server...");
    println!("  Port:   {}", port);
    println!("  Drafts: {}", config.drafts_path().display());
    println!("  Endpoints:");
    println!("    GET    /api/v1/wizards                         List wizards");
    println!("    GET    /api/v1/wizards/:kind/steps             Wizard steps");
    println!("    GET    /api/v1/wizards/:kind/drafts            List drafts");
    println!("    POST   /api/v1/wizards/:kind/sessions          Start a session");
    println!("    POST   /api/v1/sessions/:id/steps/:step_id     Submit a step");
    println!("    GET    /api/v1/openapi.json                    OpenAPI document");
    println!();

    let state = rest::ApiState::new(config.clone(), api);
    rest::serve(state, port).await
}

fn cmd_steps(wizard: &str) -> Result<()> {
    let kind = parse_kind(wizard)?;
    let registry = kind.registry();

    println!("{} wizard ({} steps)", kind.display_name(), registry.steps().len());
    println!("{}", "─".repeat(60));
    for (i, step) in registry.steps().iter().enumerate() {
        let label = step.label.render(&LabelContext {
            mode: &SubmitMode::Create,
            value: &DraftValue::new(),
        });
        println!("{}. {} [{}]", i + 1, label, step.id);
        for field in step.fields {
            let marker = if field.required { "*" } else { " " };
            println!("     {} {} ({:?})", marker, field.name, field.field_type);
        }
    }
    Ok(())
}

fn cmd_drafts_list(config: &Config, wizard: &str) -> Result<()> {
    let kind = parse_kind(wizard)?;
    let drafts = draft_store(config, kind).entries()?;

    if drafts.is_empty() {
        println!("No {} drafts", kind);
        return Ok(());
    }

    println!("{} drafts ({})", kind.display_name(), drafts.len());
    println!("{}", "─".repeat(60));
    for (index, draft) in &drafts {
        let updated = chrono::DateTime::from_timestamp_millis(draft.updated_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "[{}] {}  step: {}  fields: {}",
            index,
            updated,
            draft.step_id.as_deref().unwrap_or("-"),
            draft.value.len()
        );
    }
    Ok(())
}

fn cmd_drafts_discard(config: &Config, wizard: &str, index: usize) -> Result<()> {
    let kind = parse_kind(wizard)?;
    draft_store(config, kind).discard(index)?;
    println!("Discarded {} draft {}", kind, index);
    Ok(())
}

fn cmd_init(config: &Config, force: bool) -> Result<()> {
    let path = Config::local_config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config.save()?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn cmd_compose(
    config: &Config,
    wizard: &str,
    mode: SubmitMode,
    draft: Option<usize>,
    step: Option<String>,
    value: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let kind = parse_kind(wizard)?;
    let store: Arc<dyn DraftStore> = Arc::new(draft_store(config, kind));
    let dispatcher = SubmissionDispatcher::new(kind, entity_api(config, dry_run)?);

    let mut composer = match draft {
        Some(index) => Composer::resume(
            kind.registry(),
            index,
            step.as_deref(),
            mode,
            store,
            dispatcher,
        )?,
        None => {
            let seed = match value {
                Some(raw) => {
                    let json = serde_json::from_str(&raw).context("--value is not valid JSON")?;
                    from_json(json).context("--value must be a JSON object")?
                }
                None => DraftValue::new(),
            };
            Composer::with_value(kind.registry(), mode, seed, store, dispatcher)
        }
    };

    println!("Commands: a JSON object submits the current step, :back, :go <step>, :discard, :quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_current_step(&composer);

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let outcome = match line {
            ":quit" => break,
            ":back" => composer.go_back(),
            ":discard" => {
                composer.discard()?;
                println!("Draft discarded");
                return Ok(());
            }
            cmd if cmd.starts_with(":go ") => composer.go_to_step(cmd[4..].trim()),
            json => {
                let parsed = serde_json::from_str(json)
                    .ok()
                    .and_then(from_json);
                let Some(partial) = parsed else {
                    eprintln!("Expected a JSON object");
                    continue;
                };
                let step_id = composer.state().current_step.clone();
                composer.submit_step(&step_id, partial).await
            }
        };

        match outcome {
            Outcome::Completed => {
                let entity = composer.state().entity.clone().unwrap_or_default();
                println!("Submitted:");
                println!("{}", serde_json::to_string_pretty(&entity)?);
                return Ok(());
            }
            Outcome::Failed(failure) => {
                eprintln!("Submission failed: {}", failure);
                if let SubmitFailure::ServerValidation { errors } = &failure {
                    for e in errors {
                        eprintln!(
                            "  [{}] {}: {}",
                            e.step_id.as_deref().unwrap_or("?"),
                            e.field,
                            e.message
                        );
                    }
                }
                eprintln!("Enter {{}} to retry");
            }
            Outcome::Rejected(errors) => {
                for (field, message) in errors {
                    eprintln!("  {}: {}", field, message);
                }
            }
            Outcome::Blocked(reason) => eprintln!("Not allowed: {:?}", reason),
            _ => {}
        }
    }

    if let Some(index) = composer.draft_index() {
        println!("Draft saved as {} #{}", kind, index);
    }
    Ok(())
}

fn print_current_step(composer: &Composer) {
    let step = composer.current_step();
    let position = composer
        .registry()
        .position(step.id)
        .map(|p| p + 1)
        .unwrap_or(1);
    println!();
    println!(
        "Step {}/{}: {} [{}]",
        position,
        composer.registry().steps().len(),
        composer.label(step),
        step.id
    );
    for field in step.fields {
        let current = composer
            .state()
            .value
            .get(field.name)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let marker = if field.required { "*" } else { " " };
        println!("  {} {:<14} {}", marker, field.name, current);
    }
}
