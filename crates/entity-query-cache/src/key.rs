//! Cache keys and key filters.

use std::fmt;
use std::sync::Arc;

/// Composite key: resource name followed by filter/id parts, e.g.
/// `vacancies/school/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(parts: &[&str]) -> Self {
        Self(parts.iter().map(|p| p.to_string()).collect())
    }

    pub fn from_parts(parts: Vec<String>) -> Self {
        Self(parts)
    }

    pub fn resource(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &[String]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Selects which entries an invalidation applies to.
#[derive(Clone)]
pub enum KeyFilter {
    Exact(QueryKey),
    /// Every key whose leading parts equal these.
    Prefix(Vec<String>),
    Predicate(Arc<dyn Fn(&QueryKey) -> bool + Send + Sync>),
}

impl KeyFilter {
    pub fn prefix(parts: &[&str]) -> Self {
        KeyFilter::Prefix(parts.iter().map(|p| p.to_string()).collect())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&QueryKey) -> bool + Send + Sync + 'static,
    {
        KeyFilter::Predicate(Arc::new(f))
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyFilter::Exact(k) => k == key,
            KeyFilter::Prefix(prefix) => key.starts_with(prefix),
            KeyFilter::Predicate(f) => f(key),
        }
    }
}

impl From<QueryKey> for KeyFilter {
    fn from(key: QueryKey) -> Self {
        KeyFilter::Exact(key)
    }
}

impl fmt::Debug for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFilter::Exact(k) => write!(f, "Exact({})", k),
            KeyFilter::Prefix(p) => write!(f, "Prefix({})", p.join("/")),
            KeyFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
