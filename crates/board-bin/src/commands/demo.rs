//! Scripted walk-through against the in-memory backend. Nothing leaves the
//! process and nothing is persisted.

use crate::app::{read_error, user_facing, wire};
use crate::output;
use anyhow::{anyhow, Context};
use board_storage::in_memory_storage;
use board_types::{AuthUser, Identity, NewApplication, NewVacancy, SchoolProfilePatch};
use entity_query_cache::QueryOptions;
use mutation_orchestrator::{spawn_cache_reset, Mutation, MutationOrchestrator};
use remote_data_client::MemoryRemote;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

async fn next_identity(rx: &mut watch::Receiver<Option<Identity>>) -> anyhow::Result<Option<Identity>> {
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .context("timed out waiting for the session")??;
    Ok(rx.borrow_and_update().clone())
}

async fn attempt(mutations: &MutationOrchestrator, label: &str, mutation: Mutation) {
    match mutations.mutate(mutation).await {
        Ok(_) => println!("  {}: ok", label),
        Err(e) => println!("  {}: {} [{}]", label, e.user_message(), e.kind),
    }
}

pub async fn run() -> anyhow::Result<()> {
    let remote = Arc::new(MemoryRemote::new());
    let (session, queries, mutations) =
        wire(remote.clone(), in_memory_storage(), QueryOptions::default());
    let mut identity = session.subscribe();
    let reset = spawn_cache_reset(session.subscribe(), queries.cache().clone());
    let worker = session.spawn();

    println!("School signs in for the first time with ?role=school");
    remote.sign_in(
        AuthUser {
            id: "school-61".into(),
            email: Some("director@school61.kg".into()),
        },
        Some("school"),
    );
    let school = next_identity(&mut identity)
        .await?
        .ok_or_else(|| anyhow!("school sign-in did not produce an identity"))?;
    println!("  identity: {} ({})", school.id, school.role);

    mutations
        .mutate(Mutation::UpdateSchoolProfile(SchoolProfilePatch {
            school_name: Some("Lyceum No. 61".into()),
            address: Some("Chui Ave 100".into()),
            city: Some("Bishkek".into()),
            ..Default::default()
        }))
        .await
        .map_err(user_facing)?;
    mutations
        .mutate(Mutation::SetProfilePublished { published: true })
        .await
        .map_err(user_facing)?;

    let vacancy = mutations
        .mutate(Mutation::CreateVacancy(NewVacancy {
            subject: Some("Mathematics".into()),
            location: Some("Bishkek".into()),
            salary_min: Some(25_000),
            salary_max: Some(35_000),
            contact_name: Some("Nurlan Asanov".into()),
            contact_phone: Some("+996 555 610 061".into()),
            ..NewVacancy::titled("Mathematics teacher")
        }))
        .await
        .map_err(user_facing)?
        .into_vacancy()
        .ok_or_else(|| anyhow!("create returned no vacancy"))?;
    println!("  created: {}", output::vacancy_line(&vacancy));

    let listed = queries.public_vacancies().await.map_err(read_error)?;
    println!("  public listing: {} vacancy(ies)", listed.len());

    mutations
        .mutate(Mutation::ToggleVacancyActive {
            id: vacancy.id.clone(),
            currently_active: vacancy.is_active,
        })
        .await
        .map_err(user_facing)?;
    let listed = queries.public_vacancies().await.map_err(read_error)?;
    println!("  after toggling to draft: {} vacancy(ies)", listed.len());
    mutations
        .mutate(Mutation::ToggleVacancyActive {
            id: vacancy.id.clone(),
            currently_active: false,
        })
        .await
        .map_err(user_facing)?;

    attempt(
        &mutations,
        "vacancy without a title",
        Mutation::CreateVacancy(NewVacancy::titled("  ")),
    )
    .await;

    println!("School signs out");
    remote.sign_out();
    next_identity(&mut identity).await?;

    println!("Teacher signs in for the first time with ?role=teacher");
    remote.sign_in(
        AuthUser {
            id: "teacher-7".into(),
            email: Some("aizada@example.kg".into()),
        },
        Some("teacher"),
    );
    let teacher = next_identity(&mut identity)
        .await?
        .ok_or_else(|| anyhow!("teacher sign-in did not produce an identity"))?;
    println!("  identity: {} ({})", teacher.id, teacher.role);

    let application = || {
        Mutation::ApplyToVacancy(NewApplication {
            vacancy_id: vacancy.id.clone(),
            cover_letter: "Eight years teaching algebra and geometry.".into(),
        })
    };
    attempt(&mutations, "apply", application()).await;
    attempt(&mutations, "apply again", application()).await;
    attempt(
        &mutations,
        "teacher creates a vacancy",
        Mutation::CreateVacancy(NewVacancy::titled("Not allowed")),
    )
    .await;

    super::moderation();

    worker.abort();
    reset.abort();
    Ok(())
}
