use clap::Parser;
use color_eyre::Result;
use timemap::{
    Config, Database, Profile,
    cli::{self, Cli, Commands},
    launcher::CommandLauncher,
};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = Config::load_with_profile(profile)?;

    // --db overrides the configured database path (handy for scripts)
    let db_path = match &cli.db {
        Some(path) => std::path::PathBuf::from(path),
        None => config.get_database_path(),
    };
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;

    // Dispatch to appropriate command handler; no subcommand launches the TUI
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let launcher = Box::new(CommandLauncher::new(config.open_with.clone()));
            let app = timemap::tui::App::new(config, db, launcher)?;
            timemap::tui::run_event_loop(app)?;
        }
        Commands::Add {
            path,
            date,
            tags,
            app,
        } => {
            cli::handle_add(path, date, tags, app, &db)?;
        }
        Commands::AddNote {
            content,
            date,
            tags,
        } => {
            cli::handle_add_note(content, date, tags, &db)?;
        }
        Commands::Add2do { content, tags } => {
            cli::handle_add_todo(content, tags, &db)?;
        }
        Commands::AddDiary {
            title,
            content,
            mood,
            date,
            tags,
        } => {
            cli::handle_add_diary(title, content, mood, date, tags, &db)?;
        }
        Commands::Del { id } => {
            cli::handle_delete(id, &db)?;
        }
        Commands::Restore { id } => {
            cli::handle_restore(id, &db)?;
        }
        Commands::Trash => {
            cli::handle_trash(&db)?;
        }
        Commands::EmptyTrash { yes } => {
            cli::handle_empty_trash(yes, &db)?;
        }
        Commands::Output(args) => {
            cli::handle_output(args, &config, profile, &db)?;
        }
    }

    Ok(())
}
