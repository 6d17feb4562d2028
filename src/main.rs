use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use callshield::config::AppConfig;
use callshield::logging::init_logging;
use callshield::models::{CallDirection, SettingsPatch};
use callshield::seed;
use callshield::service::ResolutionService;
use callshield::validation::InputValidator;
use callshield::Database;

#[derive(Parser)]
#[command(author, version, about = "Offline caller-ID and spam protection", long_about = None)]
struct Cli {
    /// Path to the SQLite database (overrides configuration)
    #[arg(long)]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and default settings
    Init,
    /// Load the bundled offline dataset
    Seed,
    /// Resolve a number against the offline database
    Lookup {
        /// The number, in any format
        number: String,
    },
    /// Record a call event (classification is resolved first)
    RecordCall {
        /// The number, in any format
        number: String,

        /// Call direction: incoming, outgoing or missed
        #[arg(short, long, default_value = "incoming")]
        direction: String,

        /// Connected duration in seconds
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Put a number on the block list
    Block {
        /// The number, in any format
        number: String,

        /// Name to record with the block
        #[arg(short, long)]
        name: Option<String>,

        /// Reason for the block
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Remove a number from the block list
    Unblock {
        /// The number, in any format
        number: String,
    },
    /// List or search the block list
    Blocked {
        /// Filter by number or name substring
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show recent call history
    History {
        /// Maximum entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Show database statistics
    Stats,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Update one or more settings
    Set {
        /// Master switch for automatic blocking
        #[arg(long)]
        auto_block_spam: Option<bool>,

        /// Spam score threshold for auto-blocking (0-100)
        #[arg(long)]
        auto_block_threshold: Option<u8>,

        /// Show the incoming call overlay
        #[arg(long)]
        show_call_overlay: Option<bool>,

        /// Prompt for feedback after unknown calls
        #[arg(long)]
        post_call_prompt: Option<bool>,

        /// Restrict database sync to Wi-Fi
        #[arg(long)]
        wifi_only_sync: Option<bool>,

        /// Allow notifications
        #[arg(long)]
        enable_notifications: Option<bool>,

        /// Theme preference: system, light or dark
        #[arg(long)]
        dark_mode: Option<String>,

        /// Interface language code
        #[arg(long)]
        language: Option<String>,
    },
    /// Reset settings to defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(database) = &cli.database {
        config.database.url.clone_from(database);
    } else {
        config.database.url = config.get_database_url();
    }

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.get_log_level());
    let _guard = init_logging(Some(&level), config.logging.file_path.as_deref().map(Path::new))?;
    callshield::metrics::describe();

    InputValidator::validate_database_url(&config.database.url)?;
    let db = Arc::new(Database::open_with(&config.database)?);

    match cli.command {
        Commands::Init => {
            db.initialize()?;
            println!("Database initialized at {}", config.database.url);
        }
        Commands::Seed => {
            if seed::seed_database(&db)? {
                println!("Database seeded with the bundled offline dataset");
            } else {
                println!("Database already seeded, nothing to do");
            }
        }
        Commands::Lookup { number } => {
            InputValidator::validate_phone_input(&number)?;
            let mut service = service_for(&config, Arc::clone(&db)).await?;
            let result = service.lookup_phone_number(&number).await?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            println!(
                "=> {} ({})",
                result.classification.label(),
                result.classification.severity()
            );
            if service.is_auto_block_candidate(&result) {
                println!("=> auto-block candidate at the current threshold");
            }
        }
        Commands::RecordCall {
            number,
            direction,
            duration,
        } => {
            InputValidator::validate_phone_input(&number)?;
            let direction: CallDirection = direction.parse()?;

            let mut service = service_for(&config, Arc::clone(&db)).await?;
            let lookup = service.lookup_phone_number(&number).await?;
            let id = service
                .record_call(&number, direction, lookup.classification, duration)
                .await?;

            info!(id, "call recorded");
            println!(
                "Recorded {} call from {} ({})",
                direction,
                lookup.phone_number,
                lookup.classification.label()
            );
        }
        Commands::Block {
            number,
            name,
            reason,
        } => {
            InputValidator::validate_phone_input(&number)?;
            if let Some(name) = &name {
                InputValidator::validate_display_name(name)?;
            }
            if let Some(reason) = &reason {
                InputValidator::validate_reason(reason)?;
            }

            let mut service = service_for(&config, Arc::clone(&db)).await?;
            let id = service
                .add_blocked_number(&number, name.as_deref(), reason.as_deref(), false)
                .await?;
            println!("Blocked {} (record {id})", callshield::format_phone_number(&number));
        }
        Commands::Unblock { number } => {
            InputValidator::validate_phone_input(&number)?;
            let mut service = service_for(&config, Arc::clone(&db)).await?;
            service.remove_blocked_number(&number).await?;
            println!("Unblocked {}", callshield::format_phone_number(&number));
        }
        Commands::Blocked { query } => {
            let service = service_for(&config, Arc::clone(&db)).await?;

            let records = service.search_blocked_numbers(query.as_deref().unwrap_or(""));
            if records.is_empty() {
                println!("Block list is empty");
            }
            for record in records {
                println!(
                    "{}  {}  {}  {}",
                    callshield::format_phone_number(&record.phone_number),
                    record.blocked_at.format("%Y-%m-%d %H:%M"),
                    if record.auto_blocked { "auto" } else { "manual" },
                    record.reason.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::History { limit } => {
            let calls = db.recent_calls(limit)?;
            if calls.is_empty() {
                println!("No call history");
            }
            for call in calls {
                println!(
                    "{}  {:<8}  {}  {}{}",
                    call.timestamp.format("%Y-%m-%d %H:%M"),
                    call.direction.as_str(),
                    callshield::format_phone_number(&call.phone_number),
                    call.classification.label(),
                    if call.blocked { "  [blocked]" } else { "" },
                );
            }
        }
        Commands::Settings { action } => {
            run_settings(&config, Arc::clone(&db), action).await?;
        }
        Commands::Stats => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Build a ready resolution service over the shared database handle.
async fn service_for(config: &AppConfig, db: Arc<Database>) -> Result<ResolutionService> {
    db.initialize()?;
    let mut service = ResolutionService::with_history_limits(
        db,
        config.history.load_limit,
        config.history.view_limit,
    );
    service.init().await?;
    Ok(service)
}

async fn run_settings(
    config: &AppConfig,
    db: Arc<Database>,
    action: SettingsAction,
) -> Result<()> {
    let mut service = service_for(config, db).await?;

    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(service.settings())?);
        }
        SettingsAction::Set {
            auto_block_spam,
            auto_block_threshold,
            show_call_overlay,
            post_call_prompt,
            wifi_only_sync,
            enable_notifications,
            dark_mode,
            language,
        } => {
            if let Some(threshold) = auto_block_threshold {
                InputValidator::validate_threshold(threshold)?;
            }
            if let Some(language) = &language {
                InputValidator::validate_language(language)?;
            }

            let patch = SettingsPatch {
                auto_block_spam,
                auto_block_threshold,
                show_call_overlay,
                post_call_prompt,
                wifi_only_sync,
                enable_notifications,
                dark_mode: dark_mode.as_deref().map(str::parse).transpose()?,
                language,
                last_sync_at: None,
            };

            service.apply_settings(patch).await?;
            println!("{}", serde_json::to_string_pretty(service.settings())?);
        }
        SettingsAction::Reset => {
            service.reset_settings().await?;
            println!("Settings reset to defaults");
        }
    }

    Ok(())
}
