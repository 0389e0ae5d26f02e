//! Applying to vacancies and reviewing applications.

use crate::app::{read_error, BoardApp};
use crate::output;
use anyhow::{bail, Context};
use board_types::{ApplicationStatus, NewApplication, Role};
use clap::Subcommand;
use mutation_orchestrator::{Mutation, MutationOutput};

#[derive(Subcommand)]
pub enum ApplicationCommand {
    /// Teachers: applications you sent. Schools: pass --vacancy.
    List {
        #[arg(long)]
        vacancy: Option<String>,
    },
    /// Schools: move an application to reviewed, accepted or rejected
    SetStatus { id: String, status: String },
}

fn parse_status(raw: &str) -> anyhow::Result<ApplicationStatus> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .with_context(|| format!("unknown status {:?}", raw))
}

pub async fn apply(app: &BoardApp, vacancy_id: String, cover_letter: String) -> anyhow::Result<()> {
    app.require_identity().await?;
    let out = app
        .mutate(Mutation::ApplyToVacancy(NewApplication {
            vacancy_id,
            cover_letter,
        }))
        .await?;
    if let MutationOutput::Application(a) = out {
        println!("Applied: {}", output::application_line(&a));
    }
    Ok(())
}

pub async fn run(app: &BoardApp, cmd: ApplicationCommand) -> anyhow::Result<()> {
    match cmd {
        ApplicationCommand::List { vacancy } => {
            let identity = app.require_identity().await?;
            let applications = match (identity.role, vacancy) {
                (Role::Teacher, _) => app.queries.teacher_applications(&identity.id).await,
                (_, Some(vacancy_id)) => app.queries.vacancy_applications(&vacancy_id).await,
                (_, None) => bail!("pass --vacancy <id> to list applications for a vacancy"),
            }
            .map_err(read_error)?;

            if applications.is_empty() {
                println!("No applications.");
            }
            for a in &applications {
                println!("{}", output::application_line(a));
            }
        }
        ApplicationCommand::SetStatus { id, status } => {
            app.require_identity().await?;
            let status = parse_status(&status)?;
            let out = app
                .mutate(Mutation::UpdateApplicationStatus { id, status })
                .await?;
            if let MutationOutput::Application(a) = out {
                println!("Updated: {}", output::application_line(&a));
            }
        }
    }
    Ok(())
}
