//! Vacancy listing and management.

use crate::app::{read_error, BoardApp};
use crate::output;
use anyhow::bail;
use board_types::{EmploymentType, NewVacancy, Role, VacancyPatch};
use clap::{Args, Subcommand, ValueEnum};
use mutation_orchestrator::{Mutation, MutationOutput};

#[derive(Subcommand)]
pub enum VacancyCommand {
    /// Published vacancies, newest first
    List {
        /// Only the vacancies of the signed-in school, drafts included
        #[arg(long)]
        mine: bool,
    },
    /// Show one vacancy
    Show { id: String },
    /// Create a vacancy (schools). Published immediately unless --draft.
    Create {
        #[command(flatten)]
        fields: VacancyFields,
        #[arg(long)]
        draft: bool,
    },
    /// Edit a vacancy you own
    Update {
        id: String,
        #[command(flatten)]
        fields: VacancyFields,
    },
    /// Flip between published and draft
    Toggle { id: String },
    /// Delete a vacancy you own
    Delete { id: String },
}

#[derive(Args)]
pub struct VacancyFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long, value_enum)]
    employment: Option<Employment>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    salary_min: Option<u32>,
    #[arg(long)]
    salary_max: Option<u32>,
    /// Repeat for several requirements
    #[arg(long = "requirement")]
    requirements: Vec<String>,
    /// Repeat for several benefits
    #[arg(long = "benefit")]
    benefits: Vec<String>,
    #[arg(long)]
    contact_name: Option<String>,
    #[arg(long)]
    contact_phone: Option<String>,
    #[arg(long)]
    contact_email: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Employment {
    FullTime,
    PartTime,
    Contract,
    Temporary,
}

impl From<Employment> for EmploymentType {
    fn from(e: Employment) -> Self {
        match e {
            Employment::FullTime => EmploymentType::FullTime,
            Employment::PartTime => EmploymentType::PartTime,
            Employment::Contract => EmploymentType::Contract,
            Employment::Temporary => EmploymentType::Temporary,
        }
    }
}

impl VacancyFields {
    fn into_new(self, draft: bool) -> NewVacancy {
        NewVacancy {
            title: self.title.unwrap_or_default(),
            description: self.description,
            subject: self.subject,
            employment_type: self.employment.map(Into::into),
            location: self.location,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            requirements: self.requirements,
            benefits: self.benefits,
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            publish: Some(!draft),
        }
    }

    fn into_patch(self) -> VacancyPatch {
        let list = |v: Vec<String>| if v.is_empty() { None } else { Some(v) };
        VacancyPatch {
            title: self.title,
            description: self.description,
            subject: self.subject,
            employment_type: self.employment.map(Into::into),
            location: self.location,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            requirements: list(self.requirements),
            benefits: list(self.benefits),
            contact_name: self.contact_name,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
        }
    }
}

pub async fn run(app: &BoardApp, cmd: VacancyCommand) -> anyhow::Result<()> {
    match cmd {
        VacancyCommand::List { mine } => {
            let vacancies = if mine {
                let identity = app.require_identity().await?;
                if identity.role != Role::School {
                    bail!("only schools own vacancies");
                }
                app.queries.school_vacancies(&identity.id).await
            } else {
                app.resume().await?;
                app.queries.public_vacancies().await
            }
            .map_err(read_error)?;

            if vacancies.is_empty() {
                println!("No vacancies.");
            }
            for v in &vacancies {
                println!("{}", output::vacancy_line(v));
            }
        }
        VacancyCommand::Show { id } => {
            app.resume().await?;
            let vacancy = app.queries.vacancy(&id).await.map_err(read_error)?;
            println!("{}", output::vacancy_detail(&vacancy));
        }
        VacancyCommand::Create { fields, draft } => {
            app.require_identity().await?;
            let out = app.mutate(Mutation::CreateVacancy(fields.into_new(draft))).await?;
            print_vacancy("Created", out);
        }
        VacancyCommand::Update { id, fields } => {
            app.require_identity().await?;
            let out = app
                .mutate(Mutation::UpdateVacancy {
                    id,
                    patch: fields.into_patch(),
                })
                .await?;
            print_vacancy("Updated", out);
        }
        VacancyCommand::Toggle { id } => {
            app.require_identity().await?;
            let current = app.queries.vacancy(&id).await.map_err(read_error)?;
            let out = app
                .mutate(Mutation::ToggleVacancyActive {
                    id,
                    currently_active: current.is_active,
                })
                .await?;
            print_vacancy("Toggled", out);
        }
        VacancyCommand::Delete { id } => {
            app.require_identity().await?;
            app.mutate(Mutation::DeleteVacancy { id: id.clone() }).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn print_vacancy(verb: &str, out: MutationOutput) {
    if let Some(v) = out.into_vacancy() {
        println!("{}: {}", verb, output::vacancy_line(&v));
    }
}
