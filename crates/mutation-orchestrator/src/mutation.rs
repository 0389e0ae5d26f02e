//! Mutation requests and their results.

use board_types::{
    Application, ApplicationStatus, NewApplication, NewVacancy, Notification, Profile,
    SchoolProfilePatch, TeacherProfilePatch, Vacancy, VacancyPatch,
};
use serde::{Deserialize, Serialize};

/// One write against the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Mutation {
    CreateVacancy(NewVacancy),
    UpdateVacancy {
        id: String,
        patch: VacancyPatch,
    },
    /// Flip public visibility. `currently_active` is the value the caller
    /// last saw; the write sets its negation.
    ToggleVacancyActive {
        id: String,
        currently_active: bool,
    },
    DeleteVacancy {
        id: String,
    },
    UpdateTeacherProfile(TeacherProfilePatch),
    UpdateSchoolProfile(SchoolProfilePatch),
    /// Publishing requires a complete profile; unpublishing never does.
    SetProfilePublished {
        published: bool,
    },
    ApplyToVacancy(NewApplication),
    UpdateApplicationStatus {
        id: String,
        status: ApplicationStatus,
    },
    MarkNotificationRead {
        id: String,
    },
    MarkAllNotificationsRead,
}

impl Mutation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateVacancy(_) => "create_vacancy",
            Mutation::UpdateVacancy { .. } => "update_vacancy",
            Mutation::ToggleVacancyActive { .. } => "toggle_vacancy_active",
            Mutation::DeleteVacancy { .. } => "delete_vacancy",
            Mutation::UpdateTeacherProfile(_) => "update_teacher_profile",
            Mutation::UpdateSchoolProfile(_) => "update_school_profile",
            Mutation::SetProfilePublished { .. } => "set_profile_published",
            Mutation::ApplyToVacancy(_) => "apply_to_vacancy",
            Mutation::UpdateApplicationStatus { .. } => "update_application_status",
            Mutation::MarkNotificationRead { .. } => "mark_notification_read",
            Mutation::MarkAllNotificationsRead => "mark_all_notifications_read",
        }
    }
}

/// What a successful mutation returns.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutput {
    Vacancy(Vacancy),
    VacancyDeleted { id: String },
    Profile(Profile),
    Application(Application),
    Notification(Notification),
    NotificationsMarked { count: usize },
}

impl MutationOutput {
    pub fn into_vacancy(self) -> Option<Vacancy> {
        match self {
            MutationOutput::Vacancy(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_profile(self) -> Option<Profile> {
        match self {
            MutationOutput::Profile(p) => Some(p),
            _ => None,
        }
    }
}
