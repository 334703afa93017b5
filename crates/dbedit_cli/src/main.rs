//! Command-line tool for the local dbedit document store.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use dbedit_core::constants::DOWNLOAD_FILE_TYPE;
use dbedit_core::guard::{check_new_collection_name, is_name_valid};
use dbedit_core::models::{DocumentMap, VersionRecord};
use dbedit_core::{Config, Database, DatabaseService, NEW_COLLECTION_SEED_KEY};
use serde_json::{json, Value};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbedit", about = "dbedit document store CLI", version)]
struct Cli {
    /// Store directory (defaults to DB_PATH or ~/.cache/dbedit/db)
    #[arg(short, long, global = true)]
    db_path: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// List databases
    List,
    /// Print a database, or one key of it
    Show { database: String, key: Option<String> },
    /// Create a database holding one empty key
    CreateDb { name: String },
    /// Write a key from a file or stdin
    PutKey {
        database: String,
        key: String,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    DeleteDb { name: String },
    DeleteKey { database: String, key: String },
    /// Show version history of a database, or only versions touching a key
    History { database: String, key: Option<String> },
    /// Revert a database to a version id
    Revert { database: String, version: String },
    /// Write a database or key to <out>/<name>.json
    Export {
        database: String,
        key: Option<String>,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("dbedit=warn,dbedit_core=info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn to_pretty(value: &impl serde::Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).context("response encoding error")
}

fn format_names(names: &[String], json: bool) -> Result<String> {
    if json {
        return to_pretty(&names);
    }
    Ok(names.join("\n"))
}

fn format_history(versions: &[VersionRecord], json: bool) -> Result<String> {
    if json {
        return to_pretty(&versions);
    }
    let rows: Vec<String> = versions
        .iter()
        .map(|version| {
            format!(
                "{:<8} {}  {:<16} {}",
                version.short_id(),
                version.timestamp.format("%Y-%m-%d %H:%M:%S"),
                version.author,
                version.message
            )
        })
        .collect();
    Ok(rows.join("\n"))
}

fn lookup_key(documents: &DocumentMap, database: &str, key: &str) -> Result<Value> {
    documents
        .get(key)
        .cloned()
        .with_context(|| {
            format!(
                "no data found! missing key [{}] in database [{}]",
                key, database
            )
        })
}

fn load_database(db: &Database, database: &str) -> Result<DocumentMap> {
    db.get_collection(database)
        .with_context(|| format!("no data found! missing database [{}]", database))
}

fn parse_document(text: &str) -> Result<Value> {
    serde_json::from_str(text).context("document is not valid JSON")
}

fn export_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, DOWNLOAD_FILE_TYPE))
}

/// Execute one non-completion command against `db`.
fn run(
    command: Commands,
    json: bool,
    db: &Database,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Completions { .. } => {
            bail!("completions are generated before opening the store")
        }
        Commands::List => {
            let names = db.list_collections().context("list failed")?;
            let output = format_names(&names, json)?;
            if !output.is_empty() {
                writeln!(out, "{}", output)?;
            }
        }
        Commands::Show { database, key } => {
            let documents = load_database(db, &database)?;
            let value = match key {
                Some(key) => lookup_key(&documents, &database, &key)?,
                None => Value::Object(documents),
            };
            writeln!(out, "{}", to_pretty(&value)?)?;
        }
        Commands::CreateDb { name } => {
            let existing = db.list_collections().context("list failed")?;
            check_new_collection_name(&name, &existing)?;
            let mut documents = DocumentMap::new();
            documents.insert(NEW_COLLECTION_SEED_KEY.to_string(), json!({}));
            db.put_collection(&name, &documents)
                .with_context(|| format!("create database [{}] failed", name))?;
            if json {
                writeln!(out, "{}", to_pretty(&json!({ "created": name }))?)?;
            } else {
                writeln!(out, "Added database [{}]", name)?;
            }
        }
        Commands::PutKey {
            database,
            key,
            file,
        } => {
            if !is_name_valid(&key) {
                bail!("key name cannot be empty");
            }
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    input.read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let value = parse_document(&text)?;
            db.put_key(&database, &key, &value)
                .with_context(|| format!("put key [{}] in database [{}] failed", key, database))?;
            writeln!(out, "Setting key [{}] in database [{}]", key, database)?;
        }
        Commands::DeleteDb { name } => {
            db.delete_collection(&name)
                .with_context(|| format!("delete database [{}] failed", name))?;
            writeln!(out, "Removed database [{}]", name)?;
        }
        Commands::DeleteKey { database, key } => {
            db.delete_key(&database, &key).with_context(|| {
                format!("delete key [{}] from database [{}] failed", key, database)
            })?;
            writeln!(out, "Removed key [{}] from database [{}]", key, database)?;
        }
        Commands::History { database, key } => {
            let versions = match key {
                Some(key) => db.get_key_history(&database, &key),
                None => db.collection_history(&database),
            }
            .context("history failed")?;
            if versions.is_empty() {
                bail!("no history found for database [{}]", database);
            }
            let output = format_history(&versions, json)?;
            writeln!(out, "{}", output)?;
        }
        Commands::Revert { database, version } => {
            db.revert_to_version(&database, &version).with_context(|| {
                format!("revert database [{}] to [{}] failed", database, version)
            })?;
            writeln!(out, "Reverted database [{}] to version [{}]", database, version)?;
        }
        Commands::Export { database, key, out: dir } => {
            let documents = load_database(db, &database)?;
            let (name, data) = match key {
                Some(key) => {
                    let value = lookup_key(&documents, &database, &key)?;
                    (key, value)
                }
                None => (database, Value::Object(documents)),
            };
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = export_path(&dir, &name);
            std::fs::write(&path, to_pretty(&data)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("exported {}", path.display());
            writeln!(out, "Exported {}", path.display())?;
        }
    }
    Ok(())
}

fn main() {
    init_tracing();
    let Cli {
        db_path,
        json,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return;
    }

    let mut config = Config::from_env();
    if let Some(path) = db_path {
        config.db_path = path;
    }
    let result = Database::open(&config)
        .with_context(|| format!("failed to open store at {}", config.db_path))
        .and_then(|db| run(command, json, &db, &mut io::stdin(), &mut io::stdout()));
    if let Err(err) = result {
        error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
