use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;

use crate::config::{self, Config, ConfigError};
use crate::database::{Database, DatabaseError};
use crate::export::{self, ExportError, ExportKind, Template};
use crate::models::{ItemPayload, Mood};
use crate::tags::parse_tag_list;
use crate::utils::Profile;

#[derive(Parser)]
#[command(name = "timemap")]
#[command(about = "Calendar-driven terminal app for linked files, diary entries, notes and todos")]
#[command(version)]
pub struct Cli {
    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Override the database path from config
    #[arg(long)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Link a file to a date
    Add {
        /// Path of the file to link
        path: String,
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Application to open the file with
        #[arg(long)]
        app: Option<String>,
    },
    /// Add a text note to a date
    #[command(name = "addnote")]
    AddNote {
        /// Note content
        content: String,
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Add a todo item
    #[command(name = "add2do")]
    Add2do {
        /// Todo content
        content: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Add a diary entry to a date
    #[command(name = "adddiary")]
    AddDiary {
        /// Entry title
        title: String,
        /// Entry content
        content: String,
        /// Mood: happy, neutral or stormy
        #[arg(long, default_value = "neutral")]
        mood: String,
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Move an item to the trash
    Del {
        /// Item id (shown by the trash command and the TUI)
        id: i64,
    },
    /// Bring an item back from the trash
    Restore {
        /// Item id
        id: i64,
    },
    /// List items in the trash
    Trash,
    /// Permanently delete everything in the trash
    #[command(name = "emptytrash")]
    EmptyTrash {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Export notes and diary entries to markdown files
    Output(OutputArgs),
}

#[derive(Args)]
pub struct OutputArgs {
    /// Export only notes
    #[arg(long)]
    pub note: bool,
    /// Export only diary entries
    #[arg(long)]
    pub diary: bool,
    /// Edit the output template and exit
    #[arg(long)]
    pub config: bool,
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<String>,
    /// Split exported files into YYYY/MM folders
    #[arg(long)]
    pub split: bool,
    /// Output directory (defaults to the configured one)
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Unknown mood '{0}', expected happy, neutral or stormy")]
    UnknownMood(String),
}

fn parse_tags_arg(tags: Option<String>) -> Vec<String> {
    tags.map(|t| parse_tag_list(&t)).unwrap_or_default()
}

/// Handle the add command (link a file)
pub fn handle_add(
    path: String,
    date: Option<String>,
    tags: Option<String>,
    app: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    let abs_path = std::path::absolute(&path)?;
    let payload = ItemPayload::FileLink {
        path: abs_path.to_string_lossy().to_string(),
        preferred_app: app,
    };
    let item = db.create(date.as_deref(), payload, &parse_tags_arg(tags))?;
    println!(
        "Linked {} to {} (ID: {})",
        abs_path.display(),
        item.date,
        item.id.unwrap_or_default()
    );
    Ok(())
}

/// Handle the addnote command
pub fn handle_add_note(
    content: String,
    date: Option<String>,
    tags: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    let item = db.create(
        date.as_deref(),
        ItemPayload::Note { content },
        &parse_tags_arg(tags),
    )?;
    println!("Added note to {} (ID: {})", item.date, item.id.unwrap_or_default());
    Ok(())
}

/// Handle the add2do command
pub fn handle_add_todo(
    content: String,
    tags: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    db.create(
        None,
        ItemPayload::Todo {
            content,
            checked: false,
        },
        &parse_tags_arg(tags),
    )?;
    println!("Added todo item.");
    Ok(())
}

/// Handle the adddiary command
pub fn handle_add_diary(
    title: String,
    content: String,
    mood: String,
    date: Option<String>,
    tags: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    let mood = Mood::parse(&mood).ok_or_else(|| CliError::UnknownMood(mood.clone()))?;
    let item = db.create(
        date.as_deref(),
        ItemPayload::Diary {
            title,
            mood,
            content,
        },
        &parse_tags_arg(tags),
    )?;
    println!(
        "Added diary entry to {} (ID: {})",
        item.date,
        item.id.unwrap_or_default()
    );
    Ok(())
}

/// Handle the del command (soft delete, recoverable until emptytrash)
pub fn handle_delete(id: i64, db: &Database) -> Result<(), CliError> {
    db.soft_delete(id)?;
    println!("Moved item {} to trash.", id);
    Ok(())
}

/// Handle the restore command
pub fn handle_restore(id: i64, db: &Database) -> Result<(), CliError> {
    db.restore(id)?;
    println!("Restored item {}.", id);
    Ok(())
}

/// Handle the trash command (list only; deletion happens elsewhere)
pub fn handle_trash(db: &Database) -> Result<(), CliError> {
    let trash = db.list_trash()?;
    if trash.is_empty() {
        println!("Trash is empty.");
        return Ok(());
    }
    for item in &trash {
        let deleted_at = item.deleted_at.as_deref().unwrap_or("-");
        println!(
            "{:>5}  {}  {:<5}  {}  (deleted {})",
            item.id.unwrap_or_default(),
            item.date,
            item.kind().as_str(),
            item.summary(),
            deleted_at
        );
    }
    Ok(())
}

/// Handle the emptytrash command. The purge is irreversible, so the
/// confirmation lives here at the boundary, not in the engine.
pub fn handle_empty_trash(yes: bool, db: &Database) -> Result<(), CliError> {
    let trash = db.list_trash()?;
    if trash.is_empty() {
        println!("Trash is already empty.");
        return Ok(());
    }

    if !yes {
        print!(
            "Permanently delete {} item(s)? This cannot be undone. [y/N] ",
            trash.len()
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let count = db.empty_trash()?;
    println!("Purged {} item(s) from trash.", count);
    Ok(())
}

/// Handle the output command
pub fn handle_output(
    args: OutputArgs,
    cfg: &Config,
    profile: Profile,
    db: &Database,
) -> Result<(), CliError> {
    if args.config {
        let path = config::ensure_default_template(profile)?;
        println!("Opening template: {}", path.display());
        let status = std::process::Command::new(cfg.get_editor())
            .arg(&path)
            .status()?;
        if status.success() {
            println!("Template saved.");
        }
        return Ok(());
    }

    let kind_filter = match (args.note, args.diary) {
        (true, false) => ExportKind::Note,
        (false, true) => ExportKind::Diary,
        _ => ExportKind::Both,
    };

    let start = args.from.unwrap_or_else(|| "0001-01-01".to_string());
    let end = args.to.unwrap_or_else(|| "9999-12-31".to_string());

    let template = Template {
        body: config::load_template(profile)?,
        front_matter: cfg.export.front_matter,
    };

    let files = export::export_range(db, &start, &end, kind_filter, &template)?;
    if files.is_empty() {
        println!("Nothing to export.");
        return Ok(());
    }

    let base = args.out.unwrap_or_else(|| cfg.export.output_dir.clone());
    let split = args.split || cfg.export.split_folders;
    let count = export::write_files(&files, Path::new(&base), split)?;

    for file in &files {
        println!("Exported: {}", file.filename);
    }
    println!("Done! {} file(s) exported to '{}'.", count, base);
    Ok(())
}
