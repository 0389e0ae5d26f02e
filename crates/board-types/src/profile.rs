//! Teacher and school profiles.
//!
//! All roles share one `profiles` table; the `role` column selects which
//! optional columns are meaningful. Profiles are never deleted, only hidden
//! by clearing `is_published`.

use crate::{Identity, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub experience_years: Option<u16>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A stored profile, tagged by its immutable role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Teacher(TeacherProfile),
    School(SchoolProfile),
    Admin(AdminProfile),
}

impl Profile {
    /// Empty profile for a freshly registered user.
    pub fn new_for(role: Role, id: &str, email: Option<String>) -> Self {
        let id = id.to_string();
        match role {
            Role::Teacher => Profile::Teacher(TeacherProfile {
                id,
                email,
                ..Default::default()
            }),
            Role::School => Profile::School(SchoolProfile {
                id,
                email,
                ..Default::default()
            }),
            Role::Admin => Profile::Admin(AdminProfile { id, email }),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Profile::Teacher(p) => &p.id,
            Profile::School(p) => &p.id,
            Profile::Admin(p) => &p.id,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Profile::Teacher(p) => p.email.as_deref(),
            Profile::School(p) => p.email.as_deref(),
            Profile::Admin(p) => p.email.as_deref(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Profile::Teacher(_) => Role::Teacher,
            Profile::School(_) => Role::School,
            Profile::Admin(_) => Role::Admin,
        }
    }

    pub fn is_published(&self) -> bool {
        match self {
            Profile::Teacher(p) => p.is_published,
            Profile::School(p) => p.is_published,
            Profile::Admin(_) => false,
        }
    }

    /// Names of the required fields that are still blank. Empty when the
    /// profile may be published.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |s: &str| s.trim().is_empty();
        let mut missing = Vec::new();
        match self {
            Profile::Teacher(p) => {
                if blank(&p.full_name) {
                    missing.push("full_name");
                }
                if blank(&p.specialization) {
                    missing.push("specialization");
                }
                if blank(&p.education) {
                    missing.push("education");
                }
            }
            Profile::School(p) => {
                if blank(&p.school_name) {
                    missing.push("school_name");
                }
                if blank(&p.address) {
                    missing.push("address");
                }
            }
            Profile::Admin(_) => {}
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id().to_string(),
            email: self.email().map(str::to_string),
            role: self.role(),
        }
    }
}

/// Editable teacher fields. The role column is never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Editable school fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_row_decodes_by_role_column() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "u1",
            "role": "school",
            "school_name": "School No. 5",
            "address": "Bishkek, Chui 12"
        }))
        .unwrap();

        assert_eq!(profile.role(), Role::School);
        assert!(profile.is_complete());
        assert!(!profile.is_published());
    }

    #[test]
    fn new_profile_serializes_role_tag() {
        let profile = Profile::new_for(Role::Teacher, "u2", Some("t@example.kg".to_string()));
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["role"], "teacher");
        assert_eq!(json["id"], "u2");
        assert_eq!(profile.identity().role, Role::Teacher);
    }

    #[test]
    fn teacher_completeness_lists_blank_fields() {
        let profile = Profile::Teacher(TeacherProfile {
            id: "u3".to_string(),
            full_name: "Aida".to_string(),
            specialization: "   ".to_string(),
            ..Default::default()
        });
        assert_eq!(profile.missing_fields(), vec!["specialization", "education"]);
        assert!(!profile.is_complete());
    }

    #[test]
    fn admin_profiles_are_always_complete() {
        let profile = Profile::new_for(Role::Admin, "a1", None);
        assert!(profile.is_complete());
    }
}
