//! Row filters and select requests in PostgREST terms.

use serde_json::Value;

/// A column filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Neq(String, String),
    In(String, Vec<String>),
    /// `is.null`, `is.true`, `is.false`
    Is(String, IsValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsValue {
    Null,
    True,
    False,
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq(column.to_string(), value.to_string())
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::Neq(c, _) | Filter::In(c, _) | Filter::Is(c, _) => c,
        }
    }

    /// Query-string value, e.g. `eq.42` or `in.(a,b)`.
    pub fn operand(&self) -> String {
        match self {
            Filter::Eq(_, v) => format!("eq.{}", v),
            Filter::Neq(_, v) => format!("neq.{}", v),
            Filter::In(_, vs) => format!("in.({})", vs.join(",")),
            Filter::Is(_, IsValue::Null) => "is.null".to_string(),
            Filter::Is(_, IsValue::True) => "is.true".to_string(),
            Filter::Is(_, IsValue::False) => "is.false".to_string(),
        }
    }

    /// Evaluate against a JSON row. Used by the in-memory service.
    pub fn matches(&self, row: &Value) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq(_, v) => !cell.is_null() && cell_text(cell) == *v,
            Filter::Neq(_, v) => cell.is_null() || cell_text(cell) != *v,
            Filter::In(_, vs) => !cell.is_null() && vs.contains(&cell_text(cell)),
            Filter::Is(_, IsValue::Null) => cell.is_null(),
            Filter::Is(_, IsValue::True) => cell == &Value::Bool(true),
            Filter::Is(_, IsValue::False) => cell == &Value::Bool(false),
        }
    }
}

pub(crate) fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    /// Expect exactly one row; zero rows is a not-found error.
    pub single: bool,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            single: false,
        }
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Query-string pairs in request order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(filter_pairs(&self.filters));
        if let Some(order) = &self.order {
            let dir = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

pub(crate) fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column().to_string(), f.operand()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_renders_postgrest_pairs() {
        let select = Select::from("vacancies")
            .eq("owner_id", "s1")
            .filter(Filter::Is("deleted_at".into(), IsValue::Null))
            .order("created_at", false)
            .limit(20);

        assert_eq!(
            select.query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("owner_id".to_string(), "eq.s1".to_string()),
                ("deleted_at".to_string(), "is.null".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn filters_match_json_rows() {
        let row = json!({ "id": "v1", "is_active": true, "salary_min": 20000, "note": null });

        assert!(Filter::eq("is_active", true).matches(&row));
        assert!(Filter::eq("salary_min", 20000).matches(&row));
        assert!(!Filter::eq("id", "v2").matches(&row));
        assert!(Filter::Neq("id".into(), "v2".into()).matches(&row));
        assert!(Filter::In("id".into(), vec!["v0".into(), "v1".into()]).matches(&row));
        assert!(Filter::Is("note".into(), IsValue::Null).matches(&row));
        assert!(Filter::Is("missing".into(), IsValue::Null).matches(&row));
        assert!(Filter::Is("is_active".into(), IsValue::True).matches(&row));
    }
}
