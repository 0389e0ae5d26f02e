//! Teacher Board CLI - terminal front end for the job board's sync layer.

mod app;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use board_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use commands::{
    applications::ApplicationCommand, notifications::NotificationCommand, profile::ProfileCommand,
    vacancies::VacancyCommand,
};

/// Teacher Board command-line interface.
#[derive(Parser)]
#[command(name = "teacher-board")]
#[command(about = "Teacher and school job board client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config, local storage and logs. Defaults to ~/.teacherboard
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TEACHERBOARD_PASSWORD")]
        password: String,
        /// Role to use if this is the first sign-in (teacher or school)
        #[arg(long)]
        role: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TEACHERBOARD_PASSWORD")]
        password: String,
        /// teacher or school
        #[arg(long)]
        role: String,
    },
    /// Sign out and clear session storage
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Pick a role after signing in without one
    ChooseRole {
        /// teacher or school
        role: String,
    },
    /// Browse and manage vacancies
    #[command(subcommand)]
    Vacancies(VacancyCommand),
    /// Show and edit your profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Apply to a vacancy (teachers)
    Apply {
        vacancy_id: String,
        #[arg(long, default_value = "")]
        cover_letter: String,
    },
    /// Applications you sent or received
    #[command(subcommand)]
    Applications(ApplicationCommand),
    /// Your notifications
    #[command(subcommand)]
    Notifications(NotificationCommand),
    /// Admin moderation queue
    Moderation,
    /// Walk through a school and a teacher session against an in-memory backend
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths).context("failed to load configuration")?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, &paths);

    if let Commands::Demo = cli.command {
        return commands::demo::run().await;
    }

    let app = app::BoardApp::open(&config, &paths)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            role,
        } => commands::auth::login(&app, &email, &password, role).await,
        Commands::Signup {
            email,
            password,
            role,
        } => commands::auth::signup(&app, &email, &password, &role).await,
        Commands::Logout => commands::auth::logout(&app).await,
        Commands::Whoami => commands::auth::whoami(&app).await,
        Commands::ChooseRole { role } => commands::auth::choose_role(&app, &role).await,
        Commands::Vacancies(cmd) => commands::vacancies::run(&app, cmd).await,
        Commands::Profile(cmd) => commands::profile::run(&app, cmd).await,
        Commands::Apply {
            vacancy_id,
            cover_letter,
        } => commands::applications::apply(&app, vacancy_id, cover_letter).await,
        Commands::Applications(cmd) => commands::applications::run(&app, cmd).await,
        Commands::Notifications(cmd) => commands::notifications::run(&app, cmd).await,
        Commands::Moderation => {
            commands::moderation();
            Ok(())
        }
        Commands::Demo => Ok(()),
    }
}
