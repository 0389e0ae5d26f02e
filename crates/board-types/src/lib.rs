//! Domain types for the Teacher Board job board.
//!
//! Rows are shaped the way the hosted backend stores them (snake_case
//! columns, string ids), so every type here round-trips through the REST API
//! with plain serde.

mod application;
mod identity;
mod notification;
mod profile;
mod vacancy;
pub mod visibility;

pub use application::{Application, ApplicationStatus, NewApplication};
pub use identity::{AuthUser, Identity, ParseRoleError, Role};
pub use notification::Notification;
pub use profile::{
    AdminProfile, Profile, SchoolProfile, SchoolProfilePatch, TeacherProfile,
    TeacherProfilePatch,
};
pub use vacancy::{EmploymentType, NewVacancy, Vacancy, VacancyInsert, VacancyPatch};
pub use visibility::{VacancyVisibility, VisibilityInput};

/// Table names on the remote service.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const VACANCIES: &str = "vacancies";
    pub const APPLICATIONS: &str = "applications";
    pub const NOTIFICATIONS: &str = "notifications";
}
