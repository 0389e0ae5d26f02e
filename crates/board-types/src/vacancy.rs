//! Vacancy rows and the request shapes used to create or edit them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Temporary,
}

/// A vacancy as stored on the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: String,
    /// School profile that owns the vacancy.
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Publicly visible when true. Toggling never deletes the row.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vacancy form input. Only `title` is required; every other field falls back
/// to a default when the row is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVacancy {
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub location: Option<String>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    /// Whether the vacancy is public right after creation. Defaults to `true`:
    /// creating a vacancy publishes it unless the caller asks for a draft.
    pub publish: Option<bool>,
}

impl NewVacancy {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Build the insert row for `owner_id`, trimming text and applying defaults.
    pub fn into_insert(self, owner_id: &str) -> VacancyInsert {
        let text = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        let list = |v: Vec<String>| {
            v.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };

        VacancyInsert {
            owner_id: owner_id.to_string(),
            title: self.title.trim().to_string(),
            description: text(self.description),
            subject: text(self.subject),
            employment_type: self.employment_type.unwrap_or_default(),
            location: text(self.location),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            requirements: list(self.requirements),
            benefits: list(self.benefits),
            contact_name: text(self.contact_name),
            contact_phone: text(self.contact_phone),
            contact_email: self
                .contact_email
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            is_active: self.publish.unwrap_or(true),
        }
    }
}

/// Fully defaulted row sent to the remote insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyInsert {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub employment_type: EmploymentType,
    pub location: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub is_active: bool,
}

/// Partial edit of an existing vacancy. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VacancyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl VacancyPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
