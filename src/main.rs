// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use message_db::app_config::{Config, LogLevel};
use message_db::database::schema::{creation_script, drop_script};
use message_db::{DatabaseConnection, Dialect, MemoryCache, MessageStore, SchemaManager};

/// CLI Wrapper for Dialect to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDialect {
    Mysql,
    Pgsql,
    Sqlsrv,
    Oci,
    Sqlite,
}

impl From<CliDialect> for Dialect {
    fn from(cli_dialect: CliDialect) -> Self {
        match cli_dialect {
            CliDialect::Mysql => Dialect::MySql,
            CliDialect::Pgsql => Dialect::PgSql,
            CliDialect::Sqlsrv => Dialect::SqlServer,
            CliDialect::Oci => Dialect::Oracle,
            CliDialect::Sqlite => Dialect::Sqlite,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the message tables unless they already exist
    Ensure,

    /// Drop the message tables
    Drop,

    /// Print the creation (or teardown) script for a dialect
    DumpSql {
        /// Dialect to render, the configured driver when omitted
        #[arg(long, value_enum)]
        dialect: Option<CliDialect>,

        /// Print the teardown script instead
        #[arg(long)]
        down: bool,
    },

    /// Write messages from a JSON file of `id -> {"message", "comment"}` entries
    Import {
        /// Message category
        category: String,
        /// Target locale
        locale: String,
        /// JSON file to read
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the catalog of a category and locale as JSON
    Export {
        /// Message category
        category: String,
        /// Locale to export
        locale: String,
    },

    /// Print a single translation
    Get {
        /// Message ID
        id: String,
        /// Message category
        category: String,
        /// Locale to read
        locale: String,
    },

    /// Show catalog statistics
    Stats,

    /// Generate shell completions for message-db
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// message-db - translation message storage
///
/// Manages the two-table translation schema and reads or writes
/// message catalogs stored in it.
#[derive(Parser, Debug)]
#[command(name = "message-db")]
#[command(version)]
#[command(about = "Relational storage for translation messages")]
#[command(long_about = "message-db creates the source_message/message tables and reads or writes translation catalogs.

EXAMPLES:
    message-db ensure                              # Create the tables in the default database
    message-db import app de de.json               # Write the German catalog of category app
    message-db export app de                       # Print it back as JSON
    message-db get greet app de                    # Print a single translation
    message-db dump-sql --dialect pgsql            # Print the PostgreSQL creation script
    message-db dump-sql --dialect oci --down       # Print the Oracle teardown script
    message-db completions bash > message-db.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// SQLite database file, overrides the configured path
    #[arg(short, long, env = "MESSAGE_DB_PATH", global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything up to trace; the effective level is
    // applied with set_max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "message-db", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(&cli.config_path, cli.log_level)?;
    if let Some(database) = cli.database {
        config.database.path = Some(database);
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let command = cli.command;
    tokio::task::spawn_blocking(move || run_command(command, &config))
        .await
        .context("Command task panicked")?
}

/// Load the config file, creating a default one when it is missing
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        config.save(config_path)?;
        config
    };

    // Command line log level wins over the file
    if let Some(log_level) = log_level {
        config.log_level = log_level.into();
    }

    Ok(config)
}

fn run_command(command: Commands, config: &Config) -> Result<()> {
    let tables = config.table_names()?;

    match command {
        Commands::DumpSql { dialect, down } => {
            let dialect = match dialect {
                Some(dialect) => dialect.into(),
                None => config.dialect()?,
            };
            let script = if down {
                drop_script(dialect, &tables)
            } else {
                creation_script(dialect, &tables)
            };
            for statement in script {
                println!("{};\n", statement);
            }
        }
        Commands::Ensure => {
            let db = open_database(config)?;
            SchemaManager::new(db)?.ensure_schema(&tables)?;
        }
        Commands::Drop => {
            let db = open_database(config)?;
            SchemaManager::new(db)?.drop_schema(&tables)?;
        }
        Commands::Import {
            category,
            locale,
            file,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read message file: {:?}", file))?;
            let payload: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse message file: {:?}", file))?;

            let db = open_database(config)?;
            SchemaManager::new(db.clone())?.ensure_schema(&tables)?;

            let summary = open_store(config, db)?.write_json(&category, &locale, &payload)?;
            info!("Imported {:?} into {}/{}: {}", file, category, locale, summary);
        }
        Commands::Export { category, locale } => {
            let store = open_store(config, open_database(config)?)?;
            let catalog = store.get_messages(&category, &locale)?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Commands::Get {
            id,
            category,
            locale,
        } => {
            let store = open_store(config, open_database(config)?)?;
            match store.get_message(&id, &category, &locale)? {
                Some(translation) => println!("{}", translation),
                None => {
                    return Err(anyhow!(
                        "No translation for \"{}\" in {}/{}",
                        id,
                        category,
                        locale
                    ));
                }
            }
        }
        Commands::Stats => {
            let db = open_database(config)?;
            info!("Database: {:?}", db.path());
            info!("{}", db.stats(&tables)?);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<DatabaseConnection> {
    let dialect = config.dialect()?;
    if dialect != Dialect::Sqlite {
        return Err(anyhow!(
            "Only sqlite databases can be opened, use dump-sql to render the {} schema",
            dialect
        ));
    }

    match &config.database.path {
        Some(path) => DatabaseConnection::new(path),
        None => DatabaseConnection::new_default(),
    }
}

fn open_store(config: &Config, db: DatabaseConnection) -> Result<MessageStore<DatabaseConnection>> {
    let mut store = MessageStore::new(db, config.table_names()?)?
        .transactional_writes(config.transactional_writes);

    if config.cache.enabled {
        store = store
            .with_cache(Arc::new(MemoryCache::new()))
            .with_cache_duration(config.cache.duration());
    }

    Ok(store)
}
