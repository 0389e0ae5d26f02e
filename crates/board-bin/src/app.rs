//! Wiring of the sync layer for one CLI invocation.

use anyhow::{anyhow, Context};
use board_config_and_utils::{Config, Paths};
use board_storage::{open_file_storage, BoardStorage};
use board_types::Identity;
use entity_query_cache::{QueryCache, QueryError, QueryOptions};
use mutation_orchestrator::{
    BoardQueries, Mutation, MutationError, MutationOrchestrator, MutationOutput,
};
use remote_data_client::{AuthEvent, RemoteDataService, SupabaseClient};
use session_identity_store::{SessionOutcome, SessionStore};
use std::sync::Arc;
use tracing::{debug, info};

pub struct BoardApp {
    pub client: Arc<SupabaseClient>,
    pub storage: BoardStorage,
    pub session: Arc<SessionStore>,
    pub queries: BoardQueries,
    pub mutations: MutationOrchestrator,
}

impl BoardApp {
    pub fn open(config: &Config, paths: &Paths) -> anyhow::Result<Self> {
        let storage = open_file_storage(&paths.local_storage_file(), &paths.session_storage_file())
            .context("failed to open local storage")?;
        let purged = storage.purge_stale_demo_keys()?;
        if purged > 0 {
            debug!(purged, "Removed stale demo keys");
        }

        let client = Arc::new(SupabaseClient::new(
            config.supabase_url.clone(),
            config.supabase_publishable_key.clone(),
            storage.clone(),
        )?);
        let remote: Arc<dyn RemoteDataService> = client.clone();

        let options = QueryOptions {
            stale_time: config.stale_time(),
        };
        let (session, queries, mutations) = wire(remote, storage.clone(), options);

        Ok(Self {
            client,
            storage,
            session,
            queries,
            mutations,
        })
    }

    /// Restore a persisted session and resolve its identity.
    pub async fn resume(&self) -> anyhow::Result<SessionOutcome> {
        match self.client.restore_session().await? {
            Some(user) => Ok(self
                .session
                .handle_auth_event(AuthEvent::SignedIn {
                    user,
                    redirect_role: None,
                })
                .await?),
            None => Ok(SessionOutcome::SignedOut),
        }
    }

    /// Identity for commands that need one.
    pub async fn require_identity(&self) -> anyhow::Result<Identity> {
        match self.resume().await? {
            SessionOutcome::Ready(identity) => Ok(identity),
            SessionOutcome::RoleSelectionRequired { .. } => Err(anyhow!(
                "no role chosen yet; run `teacher-board choose-role <teacher|school>`"
            )),
            SessionOutcome::Anonymous => Err(anyhow!(
                "signed in, but the profile could not be loaded; try again later"
            )),
            SessionOutcome::SignedOut => Err(anyhow!("not signed in; run `teacher-board login`")),
        }
    }

    pub async fn mutate(&self, mutation: Mutation) -> anyhow::Result<MutationOutput> {
        let name = mutation.name();
        let output = self.mutations.mutate(mutation).await.map_err(user_facing)?;
        info!(mutation = name, "Done");
        Ok(output)
    }
}

/// Session store, reads and writes over one remote service and one cache.
pub fn wire(
    remote: Arc<dyn RemoteDataService>,
    storage: BoardStorage,
    options: QueryOptions,
) -> (Arc<SessionStore>, BoardQueries, MutationOrchestrator) {
    let cache = QueryCache::new();
    let session = Arc::new(SessionStore::new(remote.clone(), storage));
    let queries = BoardQueries::new(remote.clone(), cache.clone(), options);
    let mutations = MutationOrchestrator::new(remote, cache, session.clone());
    (session, queries, mutations)
}

pub fn user_facing(error: MutationError) -> anyhow::Error {
    anyhow!("{} ({})", error.user_message(), error.message)
}

pub fn read_error(error: QueryError) -> anyhow::Error {
    user_facing(MutationError::from_query(&error))
}
