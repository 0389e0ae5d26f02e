//! Profile display, editing and publication.

use crate::app::{read_error, BoardApp};
use crate::output;
use anyhow::bail;
use board_types::{Role, SchoolProfilePatch, TeacherProfilePatch};
use clap::{Args, Subcommand};
use mutation_orchestrator::Mutation;

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Show your profile, or another user's by id
    Show { id: Option<String> },
    /// Edit your profile. Teacher and school flags apply to their own role only.
    Edit(ProfileFields),
    /// Make your profile visible (requires a complete profile)
    Publish,
    /// Hide your profile
    Unpublish,
    /// Show the edit saved after a failed submission
    Draft {
        /// Delete the saved draft instead of showing it
        #[arg(long)]
        discard: bool,
    },
    /// List published teachers or schools
    Directory {
        /// teacher or school
        role: String,
    },
}

#[derive(Args)]
pub struct ProfileFields {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    specialization: Option<String>,
    #[arg(long)]
    education: Option<String>,
    #[arg(long)]
    experience_years: Option<u16>,
    /// Repeat for several subjects
    #[arg(long = "subject")]
    subjects: Vec<String>,
    #[arg(long)]
    school_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    city: Option<String>,
    /// Repeat for several facilities
    #[arg(long = "facility")]
    facilities: Vec<String>,
    #[arg(long)]
    phone: Option<String>,
}

impl ProfileFields {
    fn into_mutation(self, role: Role) -> anyhow::Result<Mutation> {
        let list = |v: Vec<String>| if v.is_empty() { None } else { Some(v) };
        match role {
            Role::Teacher => Ok(Mutation::UpdateTeacherProfile(TeacherProfilePatch {
                full_name: self.full_name,
                specialization: self.specialization,
                education: self.education,
                experience_years: self.experience_years,
                subjects: list(self.subjects),
                phone: self.phone,
            })),
            Role::School => Ok(Mutation::UpdateSchoolProfile(SchoolProfilePatch {
                school_name: self.school_name,
                address: self.address,
                city: self.city,
                facilities: list(self.facilities),
                phone: self.phone,
            })),
            Role::Admin => bail!("admin profiles have no editable fields"),
        }
    }
}

pub async fn run(app: &BoardApp, cmd: ProfileCommand) -> anyhow::Result<()> {
    match cmd {
        ProfileCommand::Show { id } => {
            let id = match id {
                Some(id) => {
                    app.resume().await?;
                    id
                }
                None => app.require_identity().await?.id,
            };
            let profile = app.queries.profile(&id).await.map_err(read_error)?;
            println!("{}", output::profile(&profile));
        }
        ProfileCommand::Edit(fields) => {
            let identity = app.require_identity().await?;
            let mutation = fields.into_mutation(identity.role)?;
            match app.mutate(mutation.clone()).await {
                Ok(out) => {
                    app.storage.delete_draft_profile(&identity.id)?;
                    if let Some(profile) = out.into_profile() {
                        println!("{}", output::profile(&profile));
                    }
                }
                Err(e) => {
                    app.storage.save_draft_profile(&identity.id, &mutation)?;
                    eprintln!("Edit saved as a local draft.");
                    return Err(e);
                }
            }
        }
        ProfileCommand::Draft { discard } => {
            let identity = app.require_identity().await?;
            if discard {
                let removed = app.storage.delete_draft_profile(&identity.id)?;
                println!("{}", if removed { "Draft discarded." } else { "No draft." });
            } else {
                match app.storage.load_draft_profile::<Mutation>(&identity.id)? {
                    Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
                    None => println!("No draft."),
                }
            }
        }
        ProfileCommand::Publish => set_published(app, true).await?,
        ProfileCommand::Unpublish => set_published(app, false).await?,
        ProfileCommand::Directory { role } => {
            app.resume().await?;
            match role.parse::<Role>()? {
                Role::Teacher => {
                    for t in app.queries.published_teachers().await.map_err(read_error)? {
                        println!("{}  {}  {}", t.id, t.full_name, t.specialization);
                    }
                }
                Role::School => {
                    for s in app.queries.published_schools().await.map_err(read_error)? {
                        println!("{}  {}  {}", s.id, s.school_name, s.city);
                    }
                }
                Role::Admin => bail!("there is no admin directory"),
            }
        }
    }
    Ok(())
}

async fn set_published(app: &BoardApp, published: bool) -> anyhow::Result<()> {
    app.require_identity().await?;
    app.mutate(Mutation::SetProfilePublished { published }).await?;
    println!("{}", if published { "Profile published." } else { "Profile hidden." });
    Ok(())
}
