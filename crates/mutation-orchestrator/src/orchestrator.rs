//! Executes mutations: check, write once, invalidate.

use crate::validation::{
    check_application, check_patched_salary, check_school_patch, check_teacher_patch, check_title,
    check_vacancy_patch, check_vacancy_row, touches_one_salary_bound,
};
use crate::{keys, Mutation, MutationError, MutationOutput, MutationResult};
use board_types::{
    tables, Application, ApplicationStatus, Identity, NewApplication, NewVacancy, Notification,
    Profile, Role, Vacancy, VacancyPatch, VacancyVisibility,
};
use entity_query_cache::{KeyFilter, QueryCache, QueryKey};
use remote_data_client::{decode_row, decode_rows, Filter, RemoteDataService, RemoteError, Select};
use serde::Serialize;
use serde_json::{json, Value};
use session_identity_store::SessionStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decrements the in-flight counter when a mutation finishes, however it ends.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MutationOrchestrator {
    remote: Arc<dyn RemoteDataService>,
    cache: QueryCache,
    session: Arc<SessionStore>,
    in_flight: AtomicUsize,
}

impl std::fmt::Debug for MutationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationOrchestrator")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl MutationOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        cache: QueryCache,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            remote,
            cache,
            session,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Mutations currently awaiting the remote service.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// True while any mutation is running. Forms use it to block double
    /// submission.
    pub fn is_pending(&self) -> bool {
        self.in_flight() > 0
    }

    /// Run one mutation. Validation failures never reach the network, and
    /// the cache is only invalidated after the remote write succeeded. A
    /// write that lands but comes back undecodable still invalidates.
    pub async fn mutate(&self, mutation: Mutation) -> MutationResult<MutationOutput> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        let name = mutation.name();

        let result = self.execute(mutation).await;
        match &result {
            Ok(_) => info!(mutation = name, "Mutation succeeded"),
            Err(e) => warn!(mutation = name, kind = %e.kind, error = %e.message, "Mutation failed"),
        }
        result
    }

    async fn execute(&self, mutation: Mutation) -> MutationResult<MutationOutput> {
        let identity = self
            .session
            .current_identity()
            .ok_or_else(MutationError::not_authenticated)?;

        match mutation {
            Mutation::CreateVacancy(new) => self.create_vacancy(&identity, new).await,
            Mutation::UpdateVacancy { id, patch } => {
                self.update_vacancy(&identity, &id, patch).await
            }
            Mutation::ToggleVacancyActive {
                id,
                currently_active,
            } => self.toggle_vacancy(&identity, &id, currently_active).await,
            Mutation::DeleteVacancy { id } => self.delete_vacancy(&identity, &id).await,
            Mutation::UpdateTeacherProfile(patch) => {
                require_role(&identity, Role::Teacher)?;
                check_teacher_patch(&patch)?;
                self.update_profile(&identity, &patch).await
            }
            Mutation::UpdateSchoolProfile(patch) => {
                require_role(&identity, Role::School)?;
                check_school_patch(&patch)?;
                self.update_profile(&identity, &patch).await
            }
            Mutation::SetProfilePublished { published } => {
                self.set_profile_published(&identity, published).await
            }
            Mutation::ApplyToVacancy(application) => self.apply(&identity, application).await,
            Mutation::UpdateApplicationStatus { id, status } => {
                self.update_application_status(&identity, &id, status).await
            }
            Mutation::MarkNotificationRead { id } => {
                self.mark_notification_read(&identity, &id).await
            }
            Mutation::MarkAllNotificationsRead => self.mark_all_notifications_read(&identity).await,
        }
    }

    fn invalidate(&self, keys: Vec<QueryKey>) {
        for key in keys {
            self.cache.invalidate(&KeyFilter::Exact(key));
        }
    }

    // ==========================================
    // Vacancies
    // ==========================================

    async fn create_vacancy(
        &self,
        identity: &Identity,
        new: NewVacancy,
    ) -> MutationResult<MutationOutput> {
        require_role(identity, Role::School)?;
        check_title(&new.title)?;
        let row = new.into_insert(&identity.id);
        check_vacancy_row(&row)?;

        let stored = self
            .remote
            .insert(tables::VACANCIES, serde_json::to_value(&row)?)
            .await?;
        self.invalidate(keys::vacancy_write_set(&identity.id, raw_str(&stored, "id")));
        let vacancy: Vacancy = decode_row(stored)?;

        debug!(vacancy_id = %vacancy.id, is_active = vacancy.is_active, "Vacancy created");
        Ok(MutationOutput::Vacancy(vacancy))
    }

    async fn update_vacancy(
        &self,
        identity: &Identity,
        id: &str,
        patch: VacancyPatch,
    ) -> MutationResult<MutationOutput> {
        require_role(identity, Role::School)?;
        check_vacancy_patch(&patch)?;
        if touches_one_salary_bound(&patch) {
            let stored = self.own_vacancy(identity, id).await?;
            check_patched_salary(&patch, &stored)?;
        }
        let vacancy = self.patch_own_vacancy(identity, id, &patch).await?;
        Ok(MutationOutput::Vacancy(vacancy))
    }

    async fn toggle_vacancy(
        &self,
        identity: &Identity,
        id: &str,
        currently_active: bool,
    ) -> MutationResult<MutationOutput> {
        require_role(identity, Role::School)?;
        let next = VacancyVisibility::from_active(currently_active).toggled();
        let vacancy = self
            .patch_own_vacancy(identity, id, &json!({ "is_active": next.is_active() }))
            .await?;
        Ok(MutationOutput::Vacancy(vacancy))
    }

    async fn own_vacancy(&self, identity: &Identity, id: &str) -> MutationResult<Vacancy> {
        let query = Select::from(tables::VACANCIES)
            .eq("id", id)
            .eq("owner_id", &identity.id)
            .single();
        let row = match self.remote.select(&query).await {
            Ok(rows) => rows.into_iter().next(),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        let row =
            row.ok_or_else(|| MutationError::not_authorized(format!("vacancy {} is not yours", id)))?;
        Ok(decode_row(row)?)
    }

    /// Patch a vacancy scoped to the caller's own rows. Zero rows back means
    /// the vacancy is missing or belongs to someone else.
    async fn patch_own_vacancy<P: Serialize>(
        &self,
        identity: &Identity,
        id: &str,
        patch: &P,
    ) -> MutationResult<Vacancy> {
        let filters = [Filter::eq("id", id), Filter::eq("owner_id", &identity.id)];
        let rows = self
            .remote
            .update(tables::VACANCIES, &filters, serde_json::to_value(patch)?)
            .await?;
        if !rows.is_empty() {
            self.invalidate(keys::vacancy_write_set(&identity.id, id));
        }
        first_row::<Vacancy>(rows)?
            .ok_or_else(|| MutationError::not_authorized(format!("vacancy {} is not yours", id)))
    }

    async fn delete_vacancy(&self, identity: &Identity, id: &str) -> MutationResult<MutationOutput> {
        require_role(identity, Role::School)?;
        let filters = [Filter::eq("id", id), Filter::eq("owner_id", &identity.id)];
        let removed = self.remote.delete(tables::VACANCIES, &filters).await?;
        if removed == 0 {
            return Err(MutationError::not_authorized(format!(
                "vacancy {} is not yours",
                id
            )));
        }

        self.invalidate(keys::vacancy_write_set(&identity.id, id));
        Ok(MutationOutput::VacancyDeleted { id: id.to_string() })
    }

    // ==========================================
    // Profiles
    // ==========================================

    fn profile_keys(identity: &Identity) -> Vec<QueryKey> {
        let listing = match identity.role {
            Role::School => keys::published_schools(),
            _ => keys::published_teachers(),
        };
        vec![keys::profile(&identity.id), listing]
    }

    async fn update_profile<P: Serialize>(
        &self,
        identity: &Identity,
        patch: &P,
    ) -> MutationResult<MutationOutput> {
        let patch = serde_json::to_value(patch)?;
        if patch.as_object().is_some_and(|fields| fields.is_empty()) {
            return Err(MutationError::validation("nothing to update"));
        }
        let profile = self.write_own_profile(identity, patch).await?;
        Ok(MutationOutput::Profile(profile))
    }

    /// Publishing reads the stored profile first and refuses when required
    /// fields are blank.
    async fn set_profile_published(
        &self,
        identity: &Identity,
        published: bool,
    ) -> MutationResult<MutationOutput> {
        if identity.role == Role::Admin {
            return Err(MutationError::not_authorized("admin profiles are never published"));
        }

        if published {
            let query = Select::from(tables::PROFILES).eq("id", &identity.id).single();
            let row = self
                .remote
                .select(&query)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| MutationError::not_authorized("profile not found"))?;
            let current: Profile = decode_row(row)?;
            let missing = current.missing_fields();
            if !missing.is_empty() {
                return Err(MutationError::validation(format!(
                    "profile is incomplete: missing {}",
                    missing.join(", ")
                )));
            }
        }

        let profile = self
            .write_own_profile(identity, json!({ "is_published": published }))
            .await?;
        Ok(MutationOutput::Profile(profile))
    }

    async fn write_own_profile(&self, identity: &Identity, patch: Value) -> MutationResult<Profile> {
        let filters = [Filter::eq("id", &identity.id)];
        let rows = self.remote.update(tables::PROFILES, &filters, patch).await?;
        if !rows.is_empty() {
            self.invalidate(Self::profile_keys(identity));
        }
        Ok(first_row::<Profile>(rows)?
            .ok_or_else(|| MutationError::not_authorized("profile not found"))?)
    }

    // ==========================================
    // Applications
    // ==========================================

    async fn apply(
        &self,
        identity: &Identity,
        application: NewApplication,
    ) -> MutationResult<MutationOutput> {
        require_role(identity, Role::Teacher)?;
        check_application(&application)?;
        let vacancy_id = application.vacancy_id.trim();

        let row = json!({
            "vacancy_id": vacancy_id,
            "teacher_id": identity.id,
            "cover_letter": application.cover_letter.trim(),
            "status": ApplicationStatus::Pending,
        });
        let stored = self.remote.insert(tables::APPLICATIONS, row).await?;
        self.invalidate(vec![
            keys::applications_by_teacher(&identity.id),
            keys::applications_for_vacancy(vacancy_id),
        ]);

        let application: Application = decode_row(stored)?;
        Ok(MutationOutput::Application(application))
    }

    /// Schools review applications to their vacancies. Which applications a
    /// school may touch is enforced remotely.
    async fn update_application_status(
        &self,
        identity: &Identity,
        id: &str,
        status: ApplicationStatus,
    ) -> MutationResult<MutationOutput> {
        require_role(identity, Role::School)?;
        let rows = self
            .remote
            .update(
                tables::APPLICATIONS,
                &[Filter::eq("id", id)],
                json!({ "status": status }),
            )
            .await?;
        if let Some(row) = rows.first() {
            self.invalidate(vec![
                keys::applications_for_vacancy(raw_str(row, "vacancy_id")),
                keys::applications_by_teacher(raw_str(row, "teacher_id")),
            ]);
        }
        let application = first_row::<Application>(rows)?
            .ok_or_else(|| MutationError::not_authorized(format!("application {} not found", id)))?;
        Ok(MutationOutput::Application(application))
    }

    // ==========================================
    // Notifications
    // ==========================================

    async fn mark_notification_read(
        &self,
        identity: &Identity,
        id: &str,
    ) -> MutationResult<MutationOutput> {
        let filters = [Filter::eq("id", id), Filter::eq("user_id", &identity.id)];
        let rows = self
            .remote
            .update(tables::NOTIFICATIONS, &filters, json!({ "is_read": true }))
            .await?;
        if !rows.is_empty() {
            self.invalidate(vec![keys::notifications(&identity.id)]);
        }
        let notification = first_row::<Notification>(rows)?
            .ok_or_else(|| MutationError::not_authorized(format!("notification {} not found", id)))?;
        Ok(MutationOutput::Notification(notification))
    }

    async fn mark_all_notifications_read(
        &self,
        identity: &Identity,
    ) -> MutationResult<MutationOutput> {
        let filters = [
            Filter::eq("user_id", &identity.id),
            Filter::eq("is_read", false),
        ];
        let rows = self
            .remote
            .update(tables::NOTIFICATIONS, &filters, json!({ "is_read": true }))
            .await?;

        self.invalidate(vec![keys::notifications(&identity.id)]);
        Ok(MutationOutput::NotificationsMarked { count: rows.len() })
    }
}

fn require_role(identity: &Identity, role: Role) -> MutationResult<()> {
    if identity.role != role {
        return Err(MutationError::not_authorized(format!(
            "requires role {}, signed in as {}",
            role, identity.role
        )));
    }
    Ok(())
}

/// String column of an undecoded row, empty when absent.
fn raw_str<'a>(row: &'a Value, field: &str) -> &'a str {
    row.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn first_row<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, RemoteError> {
    Ok(decode_rows::<T>(rows)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use board_storage::in_memory_storage;
    use board_types::AuthUser;
    use entity_query_cache::QueryOptions;
    use remote_data_client::{AuthEvent, Fault, MemoryRemote};

    struct Harness {
        remote: Arc<MemoryRemote>,
        cache: QueryCache,
        orchestrator: MutationOrchestrator,
    }

    async fn harness(role: Option<&str>) -> Harness {
        let remote = Arc::new(MemoryRemote::new());
        let session = Arc::new(SessionStore::new(remote.clone(), in_memory_storage()));
        if let Some(role) = role {
            remote.seed(
                tables::PROFILES,
                [json!({ "id": "u1", "role": role, "full_name": "Aibek" })],
            );
            session
                .handle_auth_event(AuthEvent::SignedIn {
                    user: AuthUser {
                        id: "u1".into(),
                        email: None,
                    },
                    redirect_role: None,
                })
                .await
                .unwrap();
        }
        let cache = QueryCache::new();
        let orchestrator = MutationOrchestrator::new(remote.clone(), cache.clone(), session);
        Harness {
            remote,
            cache,
            orchestrator,
        }
    }

    fn vacancy_form() -> NewVacancy {
        NewVacancy {
            contact_name: Some("Director".into()),
            contact_phone: Some("+996 312 000 000".into()),
            ..NewVacancy::titled("History teacher")
        }
    }

    #[tokio::test]
    async fn signed_out_callers_are_rejected_before_network() {
        let h = harness(None).await;
        let err = h
            .orchestrator
            .mutate(Mutation::CreateVacancy(vacancy_form()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAuthenticated);
        assert_eq!(h.remote.request_count(), 0);
    }

    #[tokio::test]
    async fn teachers_cannot_write_vacancies() {
        let h = harness(Some("teacher")).await;
        let before = h.remote.request_count();
        let err = h
            .orchestrator
            .mutate(Mutation::CreateVacancy(vacancy_form()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAuthorized);
        assert_eq!(h.remote.request_count(), before);
    }

    #[tokio::test]
    async fn create_invalidates_listing_keys() {
        let h = harness(Some("school")).await;
        let listing = keys::vacancies_by_school("u1");
        h.cache.set_data(&listing, Vec::<Vacancy>::new());
        h.cache.set_data(&keys::profile("u1"), 1u8);

        let vacancy = h
            .orchestrator
            .mutate(Mutation::CreateVacancy(vacancy_form()))
            .await
            .unwrap()
            .into_vacancy()
            .unwrap();

        assert_eq!(vacancy.owner_id, "u1");
        assert!(vacancy.is_active);
        assert!(h.cache.peek::<Vec<Vacancy>>(&listing, QueryOptions::default()).unwrap().is_stale);
        assert!(!h.cache.peek::<u8>(&keys::profile("u1"), QueryOptions::default()).unwrap().is_stale);
    }

    #[tokio::test]
    async fn failed_write_leaves_cache_untouched() {
        let h = harness(Some("school")).await;
        let listing = keys::vacancies_public();
        h.cache.set_data(&listing, Vec::<Vacancy>::new());
        h.remote.fail_next(Fault::api(500, None, "internal error"));

        let err = h
            .orchestrator
            .mutate(Mutation::CreateVacancy(vacancy_form()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert!(!h.cache.peek::<Vec<Vacancy>>(&listing, QueryOptions::default()).unwrap().is_stale);
    }

    #[tokio::test]
    async fn data_layer_rejects_missing_contact() {
        let h = harness(Some("school")).await;
        let before = h.remote.request_count();
        let err = h
            .orchestrator
            .mutate(Mutation::CreateVacancy(NewVacancy::titled("Art teacher")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert!(err.message.contains("contact_name"));
        assert_eq!(h.remote.request_count(), before);
    }

    #[tokio::test]
    async fn foreign_vacancy_update_is_not_authorized() {
        let h = harness(Some("school")).await;
        h.remote.seed(
            tables::VACANCIES,
            [json!({
                "id": "v9", "owner_id": "other", "title": "Music", "is_active": true,
                "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
            })],
        );

        let err = h
            .orchestrator
            .mutate(Mutation::ToggleVacancyActive {
                id: "v9".into(),
                currently_active: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAuthorized);
        assert_eq!(h.remote.rows(tables::VACANCIES)[0]["is_active"], true);
    }

    #[tokio::test]
    async fn delete_removes_own_vacancy() {
        let h = harness(Some("school")).await;
        let created = h
            .orchestrator
            .mutate(Mutation::CreateVacancy(vacancy_form()))
            .await
            .unwrap()
            .into_vacancy()
            .unwrap();

        let out = h
            .orchestrator
            .mutate(Mutation::DeleteVacancy {
                id: created.id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(out, MutationOutput::VacancyDeleted { id: created.id });
        assert!(h.remote.rows(tables::VACANCIES).is_empty());
    }

    #[tokio::test]
    async fn incomplete_profile_cannot_be_published() {
        let h = harness(Some("teacher")).await;
        let err = h
            .orchestrator
            .mutate(Mutation::SetProfilePublished { published: true })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert!(err.message.contains("specialization"));
        assert_eq!(h.remote.rows(tables::PROFILES)[0].get("is_published"), None);
    }

    #[tokio::test]
    async fn completed_profile_is_published() {
        let h = harness(Some("teacher")).await;
        h.orchestrator
            .mutate(Mutation::UpdateTeacherProfile(board_types::TeacherProfilePatch {
                specialization: Some("Mathematics".into()),
                education: Some("KNU, 2015".into()),
                ..Default::default()
            }))
            .await
            .unwrap();

        let profile = h
            .orchestrator
            .mutate(Mutation::SetProfilePublished { published: true })
            .await
            .unwrap()
            .into_profile()
            .unwrap();
        assert!(profile.is_published());
    }

    #[tokio::test]
    async fn applications_are_teacher_only_and_unique() {
        let h = harness(Some("teacher")).await;
        let apply = || {
            Mutation::ApplyToVacancy(NewApplication {
                vacancy_id: "v1".into(),
                cover_letter: "I have taught for six years.".into(),
            })
        };

        let first = h.orchestrator.mutate(apply()).await.unwrap();
        assert!(matches!(first, MutationOutput::Application(ref a) if a.teacher_id == "u1"));

        let err = h.orchestrator.mutate(apply()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn notifications_are_marked_read() {
        let h = harness(Some("teacher")).await;
        h.remote.seed(
            tables::NOTIFICATIONS,
            ["n1", "n2"].map(|id| {
                json!({
                    "id": id, "user_id": "u1", "title": "New vacancy", "is_read": false,
                    "created_at": "2025-01-01T00:00:00Z"
                })
            }),
        );

        let one = h
            .orchestrator
            .mutate(Mutation::MarkNotificationRead { id: "n1".into() })
            .await
            .unwrap();
        assert!(matches!(one, MutationOutput::Notification(ref n) if n.is_read));

        let rest = h.orchestrator.mutate(Mutation::MarkAllNotificationsRead).await.unwrap();
        assert_eq!(rest, MutationOutput::NotificationsMarked { count: 1 });
    }

    #[tokio::test]
    async fn in_flight_counter_tracks_running_mutations() {
        let h = harness(Some("school")).await;
        h.remote.set_latency(Some(std::time::Duration::from_millis(20)));

        let running = h.orchestrator.mutate(Mutation::CreateVacancy(vacancy_form()));
        tokio::pin!(running);
        assert!(futures_util::poll!(running.as_mut()).is_pending());
        assert!(h.orchestrator.is_pending());

        running.await.unwrap();
        assert_eq!(h.orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn published_profile_keeps_required_fields() {
        let h = harness(None).await;
        h.remote.seed(
            tables::PROFILES,
            [json!({
                "id": "t1", "role": "teacher", "full_name": "Aizada",
                "specialization": "Mathematics", "education": "KNU", "is_published": true
            })],
        );
        let session = Arc::new(SessionStore::new(h.remote.clone(), in_memory_storage()));
        session
            .handle_auth_event(AuthEvent::SignedIn {
                user: AuthUser {
                    id: "t1".into(),
                    email: None,
                },
                redirect_role: None,
            })
            .await
            .unwrap();
        let orchestrator = MutationOrchestrator::new(h.remote.clone(), h.cache.clone(), session);

        let err = orchestrator
            .mutate(Mutation::UpdateTeacherProfile(board_types::TeacherProfilePatch {
                full_name: Some("".into()),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert_eq!(h.remote.write_count(), 0);
        assert_eq!(h.remote.rows(tables::PROFILES)[0]["full_name"], "Aizada");
    }

    #[tokio::test]
    async fn landed_write_invalidates_even_when_row_is_unreadable() {
        let h = harness(Some("school")).await;
        // No timestamps, so the returned row cannot be decoded.
        h.remote.seed(
            tables::VACANCIES,
            [json!({ "id": "v5", "owner_id": "u1", "title": "Physics", "is_active": true })],
        );
        let listing = keys::vacancies_by_school("u1");
        h.cache.set_data(&listing, Vec::<Vacancy>::new());

        let err = h
            .orchestrator
            .mutate(Mutation::ToggleVacancyActive {
                id: "v5".into(),
                currently_active: true,
            })
            .await
            .unwrap_err();
        assert_ne!(err.kind, ErrorKind::NotAuthorized);
        assert_eq!(h.remote.rows(tables::VACANCIES)[0]["is_active"], false);
        assert!(h.cache.peek::<Vec<Vacancy>>(&listing, QueryOptions::default()).unwrap().is_stale);
    }

    #[tokio::test]
    async fn single_salary_bound_is_checked_against_stored_row() {
        let h = harness(Some("school")).await;
        h.remote.seed(
            tables::VACANCIES,
            [json!({
                "id": "v6", "owner_id": "u1", "title": "Biology", "is_active": true,
                "salary_max": 50000,
                "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
            })],
        );
        let patch = |min| Mutation::UpdateVacancy {
            id: "v6".into(),
            patch: VacancyPatch {
                salary_min: Some(min),
                ..Default::default()
            },
        };

        let err = h.orchestrator.mutate(patch(90_000)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert!(err.message.contains("salary_min"));
        assert_eq!(h.remote.write_count(), 0);
        assert_eq!(h.remote.rows(tables::VACANCIES)[0].get("salary_min"), None);

        let vacancy = h
            .orchestrator
            .mutate(patch(30_000))
            .await
            .unwrap()
            .into_vacancy()
            .unwrap();
        assert_eq!(vacancy.salary_min, Some(30_000));
        assert_eq!(vacancy.salary_max, Some(50_000));
    }
}
