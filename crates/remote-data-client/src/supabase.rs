//! Supabase REST (PostgREST) and auth (GoTrue) client.

use crate::error::{RemoteError, RemoteResult};
use crate::query::filter_pairs;
use crate::service::{AuthEvent, RemoteDataService};
use crate::{Filter, Select};
use async_trait::async_trait;
use board_storage::{BoardStorage, StoredSession};
use board_types::AuthUser;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

const AUTH_EVENT_CAPACITY: usize = 32;
/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: Value,
}

/// Token response from `/auth/v1/token` and `/auth/v1/signup`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

/// `/auth/v1/signup` either starts a session or waits for email confirmation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    PendingConfirmation(AuthUser),
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and signed in.
    SignedIn(AuthUser),
    /// Account created; the user must confirm their email before signing in.
    ConfirmationRequired(AuthUser),
}

/// Supabase client for table access and auth.
pub struct SupabaseClient {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
    storage: BoardStorage,
    session: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// * `api_url` - project URL, e.g. `https://xyz.supabase.co`
    /// * `anon_key` - publishable anonymous key
    /// * `storage` - where the auth session is persisted between runs
    pub fn new(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        storage: BoardStorage,
    ) -> RemoteResult<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Url::parse(&api_url).map_err(|e| RemoteError::Config(format!("{}: {}", api_url, e)))?;
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(RemoteError::Config("missing publishable key".to_string()));
        }

        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Ok(Self {
            http_client: reqwest::Client::new(),
            api_url,
            anon_key,
            storage,
            session: RwLock::new(None),
            events,
        })
    }

    fn rest_url(&self, table: &str, pairs: &[(String, String)]) -> RemoteResult<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.api_url, table))
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Sign in with email and password. `redirect_role` is forwarded on the
    /// `SignedIn` event the same way an OAuth callback would carry it.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        redirect_role: Option<String>,
    ) -> RemoteResult<AuthUser> {
        debug!(email, "Signing in with password");
        let response = self
            .http_client
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let tokens: TokenResponse = Self::parse_response(response).await?;
        let user = self.install_session(tokens)?;
        info!(user_id = %user.id, "Signed in");
        self.emit(AuthEvent::SignedIn {
            user: user.clone(),
            redirect_role,
        });
        Ok(user)
    }

    /// Create an account. The chosen role goes into user metadata so the
    /// profile can still be created if the local hint is lost.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> RemoteResult<SignUpOutcome> {
        let data = match role {
            Some(role) => serde_json::json!({ "role": role }),
            None => serde_json::json!({}),
        };

        let response = self
            .http_client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&SignUpRequest {
                email,
                password,
                data,
            })
            .send()
            .await?;

        match Self::parse_response::<SignUpResponse>(response).await? {
            SignUpResponse::Session(tokens) => {
                let user = self.install_session(tokens)?;
                info!(user_id = %user.id, "Signed up and signed in");
                self.emit(AuthEvent::SignedIn {
                    user: user.clone(),
                    redirect_role: role.map(str::to_string),
                });
                Ok(SignUpOutcome::SignedIn(user))
            }
            SignUpResponse::PendingConfirmation(user) => {
                info!(user_id = %user.id, "Signed up, awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired(user))
            }
        }
    }

    /// Load the persisted session, refreshing it when expired.
    ///
    /// Returns `Ok(None)` when there is no session or it could not be
    /// refreshed (the stale session is cleared).
    pub async fn restore_session(&self) -> RemoteResult<Option<AuthUser>> {
        let Some(stored) = self.storage.load_session()? else {
            debug!("No stored session");
            return Ok(None);
        };

        let user = AuthUser {
            id: stored.user_id.clone(),
            email: stored.email.clone(),
        };

        if !Self::needs_refresh(&stored) {
            *self.session.write() = Some(stored);
            info!(user_id = %user.id, "Restored session");
            self.emit(AuthEvent::SignedIn {
                user: user.clone(),
                redirect_role: None,
            });
            return Ok(Some(user));
        }

        match self.refresh(&stored.refresh_token).await {
            Ok(user) => {
                self.emit(AuthEvent::SignedIn {
                    user: user.clone(),
                    redirect_role: None,
                });
                Ok(Some(user))
            }
            Err(e) => {
                warn!(error = %e, "Stored session could not be refreshed, clearing it");
                self.storage.clear_session()?;
                Ok(None)
            }
        }
    }

    /// End the session locally and remotely. Remote failures are logged only;
    /// the local session is always cleared.
    pub async fn sign_out(&self) -> RemoteResult<()> {
        let session = self.session.write().take();
        if let Some(session) = session {
            let result = self
                .http_client
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .header("Authorization", format!("Bearer {}", session.access_token))
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!(status = %response.status(), "Remote logout rejected");
                }
                Err(e) => warn!(error = %e, "Remote logout failed"),
                Ok(_) => {}
            }
        }

        self.storage.clear_session()?;
        info!("Signed out");
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> RemoteResult<AuthUser> {
        debug!("Refreshing access token");
        let response = self
            .http_client
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.anon_key)
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;

        let tokens: TokenResponse = Self::parse_response(response).await?;
        self.install_session(tokens)
    }

    fn install_session(&self, tokens: TokenResponse) -> RemoteResult<AuthUser> {
        let stored = StoredSession {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
            user_id: tokens.user.id.clone(),
            email: tokens.user.email.clone(),
        };
        self.storage.save_session(&stored)?;
        *self.session.write() = Some(stored);
        Ok(tokens.user)
    }

    fn needs_refresh(session: &StoredSession) -> bool {
        session.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) <= Utc::now()
    }

    /// Bearer token for the next request: the session's access token
    /// (refreshed if close to expiry), or the publishable key when signed out.
    async fn bearer(&self) -> RemoteResult<String> {
        let current = self.session.read().clone();
        let Some(session) = current else {
            return Ok(self.anon_key.clone());
        };

        if !Self::needs_refresh(&session) {
            return Ok(session.access_token);
        }

        match self.refresh(&session.refresh_token).await {
            Ok(user) => {
                self.emit(AuthEvent::TokenRefreshed { user });
                let token = self.session.read().as_ref().map(|s| s.access_token.clone());
                token.ok_or(RemoteError::SessionExpired)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                *self.session.write() = None;
                self.storage.clear_session()?;
                self.emit(AuthEvent::SignedOut);
                Err(RemoteError::SessionExpired)
            }
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    // =========================================================================
    // HTTP helpers
    // =========================================================================

    fn rest_request(&self, method: reqwest::Method, url: Url, bearer: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Content-Type", "application/json")
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> RemoteResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "Supabase request failed");
            return Err(RemoteError::from_body(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RemoteDataService for SupabaseClient {
    async fn select(&self, query: &Select) -> RemoteResult<Vec<Value>> {
        let url = self.rest_url(&query.table, &query.query_pairs())?;
        let bearer = self.bearer().await?;

        debug!(table = %query.table, single = query.single, "Selecting rows");
        let mut request = self.rest_request(reqwest::Method::GET, url, &bearer);
        if query.single {
            request = request.header("Accept", "application/vnd.pgrst.object+json");
        }

        let response = request.send().await?;
        if query.single {
            let row: Value = Self::parse_response(response).await?;
            Ok(vec![row])
        } else {
            Self::parse_response(response).await
        }
    }

    async fn insert(&self, table: &str, row: Value) -> RemoteResult<Value> {
        let url = self.rest_url(table, &[])?;
        let bearer = self.bearer().await?;

        debug!(table, "Inserting row");
        let response = self
            .rest_request(reqwest::Method::POST, url, &bearer)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let mut rows: Vec<Value> = Self::parse_response(response).await?;
        rows.pop().ok_or_else(|| {
            RemoteError::api(500, None, format!("insert into {} returned no row", table))
        })
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> RemoteResult<Vec<Value>> {
        let url = self.rest_url(table, &filter_pairs(filters))?;
        let bearer = self.bearer().await?;

        debug!(table, filters = filters.len(), "Updating rows");
        let response = self
            .rest_request(reqwest::Method::PATCH, url, &bearer)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> RemoteResult<usize> {
        if filters.is_empty() {
            return Err(RemoteError::Config(format!(
                "refusing unfiltered delete on {}",
                table
            )));
        }
        let url = self.rest_url(table, &filter_pairs(filters))?;
        let bearer = self.bearer().await?;

        debug!(table, "Deleting rows");
        let response = self
            .rest_request(reqwest::Method::DELETE, url, &bearer)
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<Value> = Self::parse_response(response).await?;
        Ok(rows.len())
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.read().as_ref().map(|s| AuthUser {
            id: s.user_id.clone(),
            email: s.email.clone(),
        })
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_storage::in_memory_storage;

    fn client() -> SupabaseClient {
        SupabaseClient::new("https://test.supabase.co/", "test-key", in_memory_storage()).unwrap()
    }

    #[test]
    fn test_client_creation_trims_trailing_slash() {
        let client = client();
        assert_eq!(client.api_url, "https://test.supabase.co");
        assert!(client.current_user().is_none());
    }

    #[test]
    fn test_client_rejects_bad_config() {
        assert!(matches!(
            SupabaseClient::new("not a url", "k", in_memory_storage()),
            Err(RemoteError::Config(_))
        ));
        assert!(matches!(
            SupabaseClient::new("https://x.supabase.co", " ", in_memory_storage()),
            Err(RemoteError::Config(_))
        ));
    }

    #[test]
    fn test_rest_url_encodes_filters() {
        let client = client();
        let select = Select::from("vacancies")
            .eq("subject", "Русский язык")
            .order("created_at", false);
        let url = client.rest_url("vacancies", &select.query_pairs()).unwrap();

        assert_eq!(url.path(), "/rest/v1/vacancies");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[1], ("subject".to_string(), "eq.Русский язык".to_string()));
        assert_eq!(pairs[2], ("order".to_string(), "created_at.desc".to_string()));
    }

    #[test]
    fn test_signup_response_variants() {
        let session: SignUpResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"user":{"id":"u1","email":"a@b.kg"}}"#,
        )
        .unwrap();
        assert!(matches!(session, SignUpResponse::Session(_)));

        let pending: SignUpResponse =
            serde_json::from_str(r#"{"id":"u2","email":"c@d.kg"}"#).unwrap();
        assert!(matches!(pending, SignUpResponse::PendingConfirmation(_)));
    }

    #[tokio::test]
    async fn test_bearer_falls_back_to_anon_key() {
        let client = client();
        assert_eq!(client.bearer().await.unwrap(), "test-key");
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused() {
        let client = client();
        let err = client.delete("vacancies", &[]).await.unwrap_err();
        assert!(matches!(err, RemoteError::Config(_)));
    }

    #[tokio::test]
    async fn test_restore_without_session_is_none() {
        let client = client();
        assert_eq!(client.restore_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_fresh_session_emits_signed_in() {
        let storage = in_memory_storage();
        storage
            .save_session(&StoredSession {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
                user_id: "u1".to_string(),
                email: None,
            })
            .unwrap();
        let client = SupabaseClient::new("https://test.supabase.co", "k", storage).unwrap();
        let mut events = client.auth_events();

        let user = client.restore_session().await.unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(client.bearer().await.unwrap(), "access");
        assert!(matches!(
            events.recv().await.unwrap(),
            AuthEvent::SignedIn { .. }
        ));
    }
}
