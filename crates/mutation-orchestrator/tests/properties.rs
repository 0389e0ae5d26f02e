//! End-to-end behaviour of the sync layer against the in-memory service.

use board_storage::in_memory_storage;
use board_types::{tables, AuthUser, NewVacancy, Role};
use entity_query_cache::{QueryCache, QueryOptions};
use futures_util::future::join_all;
use mutation_orchestrator::{
    keys, BoardQueries, ErrorKind, Mutation, MutationOrchestrator, MutationOutput,
};
use remote_data_client::{AuthEvent, Fault, MemoryRemote};
use serde_json::json;
use session_identity_store::{SessionOutcome, SessionStore};
use std::sync::Arc;
use std::time::Duration;

struct Board {
    remote: Arc<MemoryRemote>,
    session: Arc<SessionStore>,
    queries: BoardQueries,
    mutations: MutationOrchestrator,
}

fn board() -> Board {
    let remote = Arc::new(MemoryRemote::new());
    let session = Arc::new(SessionStore::new(remote.clone(), in_memory_storage()));
    let cache = QueryCache::new();
    let queries = BoardQueries::new(remote.clone(), cache.clone(), QueryOptions::default());
    let mutations = MutationOrchestrator::new(remote.clone(), cache, session.clone());
    Board {
        remote,
        session,
        queries,
        mutations,
    }
}

async fn sign_in(board: &Board, id: &str, redirect_role: Option<&str>) -> SessionOutcome {
    board
        .session
        .handle_auth_event(AuthEvent::SignedIn {
            user: AuthUser {
                id: id.to_string(),
                email: None,
            },
            redirect_role: redirect_role.map(str::to_string),
        })
        .await
        .unwrap()
}

fn form(title: &str) -> NewVacancy {
    NewVacancy {
        contact_name: Some("Principal".into()),
        contact_phone: Some("+996 700 111 222".into()),
        ..NewVacancy::titled(title)
    }
}

#[tokio::test]
async fn concurrent_reads_of_one_key_issue_one_request() {
    let board = board();
    board.remote.seed(
        tables::VACANCIES,
        [json!({
            "id": "v1", "owner_id": "s1", "title": "Biology", "is_active": true,
            "created_at": "2025-03-01T00:00:00Z", "updated_at": "2025-03-01T00:00:00Z"
        })],
    );
    board.remote.set_latency(Some(Duration::from_millis(20)));

    let reads = (0..8).map(|_| board.queries.public_vacancies());
    for result in join_all(reads).await {
        assert_eq!(result.unwrap().len(), 1);
    }
    assert_eq!(board.remote.select_count(), 1);
}

#[tokio::test]
async fn read_after_mutation_sees_the_write() {
    let board = board();
    sign_in(&board, "s1", Some("school")).await;

    assert!(board.queries.school_vacancies("s1").await.unwrap().is_empty());

    board
        .mutations
        .mutate(Mutation::CreateVacancy(form("Geography teacher")))
        .await
        .unwrap();

    let listing = board.queries.school_vacancies("s1").await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].title, "Geography teacher");
    assert!(board
        .queries
        .cache()
        .peek::<Vec<board_types::Vacancy>>(&keys::vacancies_by_school("s1"), QueryOptions::default())
        .unwrap()
        .data
        .is_some());
}

#[tokio::test]
async fn empty_title_fails_without_any_request() {
    let board = board();
    sign_in(&board, "s1", Some("school")).await;
    let before = board.remote.request_count();

    let err = board
        .mutations
        .mutate(Mutation::CreateVacancy(form("   ")))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(board.remote.request_count(), before);
}

#[tokio::test]
async fn toggling_twice_restores_visibility() {
    let board = board();
    sign_in(&board, "s1", Some("school")).await;

    let draft = NewVacancy {
        publish: Some(false),
        ..form("Literature teacher")
    };
    let created = board
        .mutations
        .mutate(Mutation::CreateVacancy(draft))
        .await
        .unwrap()
        .into_vacancy()
        .unwrap();
    assert!(!created.is_active);

    let mut active = created.is_active;
    let mut seen = vec![active];
    for _ in 0..2 {
        let out = board
            .mutations
            .mutate(Mutation::ToggleVacancyActive {
                id: created.id.clone(),
                currently_active: active,
            })
            .await
            .unwrap();
        let MutationOutput::Vacancy(vacancy) = out else {
            panic!("toggle returned {:?}", out);
        };
        active = vacancy.is_active;
        seen.push(active);
    }

    assert_eq!(seen, vec![false, true, false]);
    assert_eq!(board.remote.rows(tables::VACANCIES)[0]["is_active"], false);
}

#[tokio::test]
async fn stored_role_survives_a_conflicting_hint() {
    let board = board();
    board
        .remote
        .seed(tables::PROFILES, [json!({ "id": "t1", "role": "teacher" })]);

    let outcome = sign_in(&board, "t1", Some("school")).await;

    assert!(matches!(outcome, SessionOutcome::Ready(ref i) if i.role == Role::Teacher));
    assert_eq!(board.session.current_identity().map(|i| i.role), Some(Role::Teacher));
    assert_eq!(board.remote.rows(tables::PROFILES)[0]["role"], "teacher");
}

#[tokio::test]
async fn duplicate_key_maps_to_conflict() {
    let board = board();
    sign_in(&board, "s1", Some("school")).await;
    board.remote.fail_next(Fault::api(
        409,
        Some("23505"),
        "duplicate key value violates unique constraint \"vacancies_pkey\"",
    ));

    let conflict = board
        .mutations
        .mutate(Mutation::CreateVacancy(form("Physics teacher")))
        .await
        .unwrap_err();
    assert_eq!(conflict.kind, ErrorKind::Conflict);

    board
        .remote
        .fail_next(Fault::api(500, None, "could not serialize access"));
    let server = board
        .mutations
        .mutate(Mutation::CreateVacancy(form("Physics teacher")))
        .await
        .unwrap_err();
    assert_eq!(server.kind, ErrorKind::ServerError);
    assert_ne!(conflict.user_message(), server.user_message());
}

#[tokio::test]
async fn transport_failure_is_a_network_error() {
    let board = board();
    sign_in(&board, "s1", Some("school")).await;
    board.remote.fail_next(Fault::Transport("connection refused".into()));

    let err = board
        .mutations
        .mutate(Mutation::CreateVacancy(form("Music teacher")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NetworkError);
}
