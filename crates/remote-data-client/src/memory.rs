//! In-process stand-in for the hosted backend.
//!
//! Behaves like the REST API for the operations the sync layer uses: ids and
//! timestamps are assigned on insert, unique keys raise `23505`, single-row
//! reads of nothing raise `PGRST116`. Every request is counted, and faults or
//! latency can be injected per request.

use crate::error::{RemoteError, RemoteResult, NO_ROWS_CODE};
use crate::query::cell_text;
use crate::service::{AuthEvent, RemoteDataService};
use crate::{Filter, Select};
use async_trait::async_trait;
use board_types::AuthUser;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// A failure to return from the next request instead of executing it.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    Transport(String),
}

impl Fault {
    pub fn api(status: u16, code: Option<&str>, message: &str) -> Self {
        Fault::Api {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    fn into_error(self) -> RemoteError {
        match self {
            Fault::Api {
                status,
                code,
                message,
            } => RemoteError::Api {
                status,
                code,
                message,
                details: None,
                hint: None,
            },
            Fault::Transport(msg) => RemoteError::Transport(msg),
        }
    }
}

/// Per-operation request counters.
#[derive(Debug, Default)]
struct Counters {
    select: AtomicUsize,
    insert: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

pub struct MemoryRemote {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    unique_keys: HashMap<&'static str, Vec<&'static str>>,
    faults: Mutex<VecDeque<Fault>>,
    latency: Mutex<Option<Duration>>,
    counters: Counters,
    user: Mutex<Option<AuthUser>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        let unique_keys = HashMap::from([
            ("profiles", vec!["id"]),
            ("vacancies", vec!["id"]),
            ("applications", vec!["vacancy_id", "teacher_id"]),
            ("notifications", vec!["id"]),
        ]);
        Self {
            tables: Mutex::new(HashMap::new()),
            unique_keys,
            faults: Mutex::new(VecDeque::new()),
            latency: Mutex::new(None),
            counters: Counters::default(),
            user: Mutex::new(None),
            events,
        }
    }

    /// Insert rows directly, bypassing counters and constraints.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a table.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    /// Queue a failure for the next request.
    pub fn fail_next(&self, fault: Fault) {
        self.faults.lock().push_back(fault);
    }

    /// Delay every request by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn select_count(&self) -> usize {
        self.counters.select.load(AtomicOrdering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.counters.insert.load(AtomicOrdering::SeqCst)
            + self.counters.update.load(AtomicOrdering::SeqCst)
            + self.counters.delete.load(AtomicOrdering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.select_count() + self.write_count()
    }

    /// Simulate a completed sign-in (password or OAuth redirect).
    pub fn sign_in(&self, user: AuthUser, redirect_role: Option<&str>) {
        *self.user.lock() = Some(user.clone());
        let _ = self.events.send(AuthEvent::SignedIn {
            user,
            redirect_role: redirect_role.map(str::to_string),
        });
    }

    pub fn sign_out(&self) {
        *self.user.lock() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    /// Count the request, apply latency, and pop a queued fault if any.
    async fn begin(&self, counter: &AtomicUsize) -> RemoteResult<()> {
        counter.fetch_add(1, AtomicOrdering::SeqCst);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let fault = self.faults.lock().pop_front();
        match fault {
            Some(fault) => Err(fault.into_error()),
            None => Ok(()),
        }
    }

    fn violates_unique(&self, table: &str, rows: &[Value], candidate: &Value) -> bool {
        let Some(columns) = self.unique_keys.get(table) else {
            return false;
        };
        rows.iter().any(|row| {
            columns.iter().all(|col| {
                let a = row.get(*col).unwrap_or(&Value::Null);
                let b = candidate.get(*col).unwrap_or(&Value::Null);
                !a.is_null() && a == b
            })
        })
    }
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (x, y) => cell_text(x).cmp(&cell_text(y)),
    }
}

#[async_trait]
impl RemoteDataService for MemoryRemote {
    async fn select(&self, query: &Select) -> RemoteResult<Vec<Value>> {
        self.begin(&self.counters.select).await?;

        let mut rows: Vec<Value> = self
            .tables
            .lock()
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_cells(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if query.single && rows.len() != 1 {
            return Err(RemoteError::api(
                406,
                Some(NO_ROWS_CODE),
                format!(
                    "JSON object requested, multiple (or no) rows returned ({} rows)",
                    rows.len()
                ),
            ));
        }

        debug!(table = %query.table, rows = rows.len(), "memory select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> RemoteResult<Value> {
        self.begin(&self.counters.insert).await?;

        let Value::Object(mut fields) = row else {
            return Err(RemoteError::api(400, Some("PGRST102"), "row must be an object"));
        };
        let now = Value::String(Utc::now().to_rfc3339());
        fields
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        fields.entry("created_at").or_insert_with(|| now.clone());
        fields.entry("updated_at").or_insert(now);
        let row = Value::Object(fields);

        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();
        if self.violates_unique(table, rows, &row) {
            return Err(RemoteError::Api {
                status: 409,
                code: Some("23505".to_string()),
                message: format!(
                    "duplicate key value violates unique constraint \"{}_pkey\"",
                    table
                ),
                details: None,
                hint: None,
            });
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> RemoteResult<Vec<Value>> {
        self.begin(&self.counters.update).await?;

        let Value::Object(patch) = patch else {
            return Err(RemoteError::api(400, Some("PGRST102"), "patch must be an object"));
        };
        let now = Value::String(Utc::now().to_rfc3339());

        let mut tables = self.tables.lock();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !filters.iter().all(|f| f.matches(row)) {
                    continue;
                }
                if let Value::Object(fields) = &mut *row {
                    merge(fields, &patch);
                    fields.insert("updated_at".to_string(), now.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> RemoteResult<usize> {
        self.begin(&self.counters.delete).await?;

        let mut tables = self.tables.lock();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok(before - rows.len())
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.user.lock().clone()
    }
}

fn merge(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_id_and_enforces_unique_keys() {
        let remote = MemoryRemote::new();
        let row = remote
            .insert("profiles", json!({ "id": "u1", "role": "teacher" }))
            .await
            .unwrap();
        assert_eq!(row["id"], "u1");
        assert!(row.get("created_at").is_some());

        let err = remote
            .insert("profiles", json!({ "id": "u1", "role": "school" }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("23505"));
        assert!(err.full_text().contains("duplicate key"));

        let generated = remote
            .insert("vacancies", json!({ "title": "Math" }))
            .await
            .unwrap();
        assert!(generated["id"].as_str().is_some());
        assert_eq!(remote.write_count(), 3);
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let remote = MemoryRemote::new();
        remote.seed(
            "vacancies",
            vec![
                json!({ "id": "a", "owner_id": "s1", "salary_min": 100 }),
                json!({ "id": "b", "owner_id": "s1", "salary_min": 300 }),
                json!({ "id": "c", "owner_id": "s2", "salary_min": 200 }),
            ],
        );

        let rows = remote
            .select(
                &Select::from("vacancies")
                    .eq("owner_id", "s1")
                    .order("salary_min", false)
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({ "id": "b", "owner_id": "s1", "salary_min": 300 })]);
        assert_eq!(remote.select_count(), 1);
    }

    #[tokio::test]
    async fn single_select_without_rows_is_not_found() {
        let remote = MemoryRemote::new();
        let err = remote
            .select(&Select::from("profiles").eq("id", "nobody").single())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_merges_and_returns_matches() {
        let remote = MemoryRemote::new();
        remote.seed("vacancies", vec![json!({ "id": "v1", "is_active": false })]);

        let rows = remote
            .update(
                "vacancies",
                &[Filter::eq("id", "v1")],
                json!({ "is_active": true }),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["is_active"], true);

        let none = remote
            .update("vacancies", &[Filter::eq("id", "v2")], json!({ "x": 1 }))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn queued_fault_replaces_one_request() {
        let remote = MemoryRemote::new();
        remote.fail_next(Fault::Transport("connection reset".into()));

        let err = remote.select(&Select::from("vacancies")).await.unwrap_err();
        assert!(err.is_transport());
        assert!(remote.select(&Select::from("vacancies")).await.is_ok());
        assert_eq!(remote.select_count(), 2);
    }

    #[tokio::test]
    async fn delete_removes_matching_rows() {
        let remote = MemoryRemote::new();
        remote.seed(
            "vacancies",
            vec![json!({ "id": "v1" }), json!({ "id": "v2" })],
        );
        let removed = remote
            .delete("vacancies", &[Filter::eq("id", "v1")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(remote.rows("vacancies"), vec![json!({ "id": "v2" })]);
    }

    #[tokio::test]
    async fn sign_in_broadcasts_event() {
        let remote = MemoryRemote::new();
        let mut events = remote.auth_events();
        let user = AuthUser {
            id: "u1".into(),
            email: None,
        };

        remote.sign_in(user.clone(), Some("school"));
        assert_eq!(remote.current_user(), Some(user.clone()));
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedIn {
                user,
                redirect_role: Some("school".into())
            }
        );

        remote.sign_out();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(remote.current_user().is_none());
    }
}
