//! Typed reads through the query cache.
//!
//! Every read uses the same keys the mutations invalidate, so a read issued
//! after a successful write always goes back to the remote service.

use crate::keys;
use board_types::{
    tables, Application, Identity, Notification, Profile, SchoolProfile, TeacherProfile, Vacancy,
};
use entity_query_cache::{QueryCache, QueryKey, QueryOptions, QueryResult};
use remote_data_client::{
    decode_row, decode_rows, Filter, IsValue, RemoteDataService, RemoteError, Select, NO_ROWS_CODE,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Clone)]
pub struct BoardQueries {
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
    options: QueryOptions,
}

impl BoardQueries {
    pub fn new(remote: Arc<dyn RemoteDataService>, cache: QueryCache, options: QueryOptions) -> Self {
        Self {
            remote,
            cache,
            options,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn list<T>(&self, key: QueryKey, select: Select) -> QueryResult<Vec<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let remote = self.remote.clone();
        self.cache
            .query(&key, self.options, move || async move {
                let rows = remote.select(&select).await?;
                decode_rows::<T>(rows)
            })
            .await
    }

    async fn one<T>(&self, key: QueryKey, select: Select) -> QueryResult<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let remote = self.remote.clone();
        let select = select.single();
        self.cache
            .query(&key, self.options, move || async move {
                let row = remote.select(&select).await?.into_iter().next().ok_or_else(|| {
                    RemoteError::api(406, Some(NO_ROWS_CODE), "no rows returned")
                })?;
                decode_row::<T>(row)
            })
            .await
    }

    /// Active vacancies, newest first.
    pub async fn public_vacancies(&self) -> QueryResult<Vec<Vacancy>> {
        let select = Select::from(tables::VACANCIES)
            .filter(Filter::Is("is_active".into(), IsValue::True))
            .order("created_at", false);
        self.list(keys::vacancies_public(), select).await
    }

    pub async fn active_vacancies(&self) -> QueryResult<Vec<Vacancy>> {
        let select = Select::from(tables::VACANCIES).filter(Filter::Is("is_active".into(), IsValue::True));
        self.list(keys::vacancies_active(), select).await
    }

    /// Every vacancy regardless of visibility. Moderation view.
    pub async fn all_vacancies(&self) -> QueryResult<Vec<Vacancy>> {
        let select = Select::from(tables::VACANCIES).order("created_at", false);
        self.list(keys::vacancies_all(), select).await
    }

    pub async fn school_vacancies(&self, school_id: &str) -> QueryResult<Vec<Vacancy>> {
        let select = Select::from(tables::VACANCIES)
            .eq("owner_id", school_id)
            .order("created_at", false);
        self.list(keys::vacancies_by_school(school_id), select).await
    }

    pub async fn vacancy(&self, id: &str) -> QueryResult<Vacancy> {
        let select = Select::from(tables::VACANCIES).eq("id", id);
        self.one(keys::vacancy(id), select).await
    }

    pub async fn profile(&self, id: &str) -> QueryResult<Profile> {
        let select = Select::from(tables::PROFILES).eq("id", id);
        self.one(keys::profile(id), select).await
    }

    pub async fn published_teachers(&self) -> QueryResult<Vec<TeacherProfile>> {
        let select = Select::from(tables::PROFILES)
            .eq("role", "teacher")
            .filter(Filter::Is("is_published".into(), IsValue::True));
        let profiles: Vec<Profile> = self.list(keys::published_teachers(), select).await?;
        Ok(profiles
            .into_iter()
            .filter_map(|p| match p {
                Profile::Teacher(t) => Some(t),
                _ => None,
            })
            .collect())
    }

    pub async fn published_schools(&self) -> QueryResult<Vec<SchoolProfile>> {
        let select = Select::from(tables::PROFILES)
            .eq("role", "school")
            .filter(Filter::Is("is_published".into(), IsValue::True));
        let profiles: Vec<Profile> = self.list(keys::published_schools(), select).await?;
        Ok(profiles
            .into_iter()
            .filter_map(|p| match p {
                Profile::School(s) => Some(s),
                _ => None,
            })
            .collect())
    }

    pub async fn teacher_applications(&self, teacher_id: &str) -> QueryResult<Vec<Application>> {
        let select = Select::from(tables::APPLICATIONS)
            .eq("teacher_id", teacher_id)
            .order("created_at", false);
        self.list(keys::applications_by_teacher(teacher_id), select).await
    }

    pub async fn vacancy_applications(&self, vacancy_id: &str) -> QueryResult<Vec<Application>> {
        let select = Select::from(tables::APPLICATIONS)
            .eq("vacancy_id", vacancy_id)
            .order("created_at", false);
        self.list(keys::applications_for_vacancy(vacancy_id), select).await
    }

    pub async fn notifications(&self, user_id: &str) -> QueryResult<Vec<Notification>> {
        let select = Select::from(tables::NOTIFICATIONS)
            .eq("user_id", user_id)
            .order("created_at", false);
        self.list(keys::notifications(user_id), select).await
    }
}

/// Drop every cached entry whenever the signed-in user changes, so one
/// user's data is never served to the next.
pub fn spawn_cache_reset(
    mut identity: watch::Receiver<Option<Identity>>,
    cache: QueryCache,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut current = identity.borrow_and_update().as_ref().map(|i| i.id.clone());
        while identity.changed().await.is_ok() {
            let next = identity.borrow_and_update().as_ref().map(|i| i.id.clone());
            if next != current {
                let cleared = cache.clear();
                debug!(cleared, "Identity changed, cleared query cache");
                current = next;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_data_client::MemoryRemote;
    use serde_json::json;

    fn vacancy_row(id: &str, owner: &str, active: bool, created: &str) -> serde_json::Value {
        json!({
            "id": id, "owner_id": owner, "title": format!("Vacancy {}", id),
            "is_active": active, "created_at": created, "updated_at": created
        })
    }

    fn queries(remote: &Arc<MemoryRemote>) -> BoardQueries {
        BoardQueries::new(remote.clone(), QueryCache::new(), QueryOptions::default())
    }

    #[tokio::test]
    async fn public_listing_hides_drafts_and_sorts_newest_first() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(
            tables::VACANCIES,
            [
                vacancy_row("v1", "s1", true, "2025-01-01T00:00:00Z"),
                vacancy_row("v2", "s1", false, "2025-01-02T00:00:00Z"),
                vacancy_row("v3", "s2", true, "2025-01-03T00:00:00Z"),
            ],
        );
        let q = queries(&remote);

        let ids: Vec<String> = q.public_vacancies().await.unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["v3", "v1"]);
        assert_eq!(q.school_vacancies("s1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn repeated_reads_hit_the_cache() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(tables::PROFILES, [json!({ "id": "t1", "role": "teacher" })]);
        let q = queries(&remote);

        q.profile("t1").await.unwrap();
        q.profile("t1").await.unwrap();
        assert_eq!(remote.select_count(), 1);
    }

    #[tokio::test]
    async fn missing_row_is_a_cached_not_found() {
        let remote = Arc::new(MemoryRemote::new());
        let q = queries(&remote);

        let err = q.vacancy("nope").await.unwrap_err();
        assert!(err.source_as::<RemoteError>().is_some_and(|e| e.is_not_found()));
        assert!(q.vacancy("nope").await.is_err());
        assert_eq!(remote.select_count(), 1);
    }

    #[tokio::test]
    async fn published_directories_filter_by_role() {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(
            tables::PROFILES,
            [
                json!({ "id": "t1", "role": "teacher", "is_published": true }),
                json!({ "id": "t2", "role": "teacher", "is_published": false }),
                json!({ "id": "s1", "role": "school", "is_published": true }),
            ],
        );
        let q = queries(&remote);

        assert_eq!(q.published_teachers().await.unwrap().len(), 1);
        assert_eq!(q.published_schools().await.unwrap()[0].id, "s1");
    }

    #[tokio::test]
    async fn cache_is_cleared_when_identity_changes() {
        let cache = QueryCache::new();
        cache.set_data(&keys::profile("u1"), 1u8);
        let (tx, rx) = watch::channel(None::<Identity>);
        let task = spawn_cache_reset(rx, cache.clone());

        tx.send_replace(Some(Identity {
            id: "u1".into(),
            email: None,
            role: board_types::Role::Teacher,
        }));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(cache.is_empty());

        drop(tx);
        task.await.unwrap();
    }
}
