//! Storage key constants.

/// Keys used in the local and session stores.
pub struct StorageKeys;

impl StorageKeys {
    /// Role chosen before an OAuth/email sign-up round trip.
    pub const ROLE_HINT: &'static str = "teacherboard.role_hint";

    /// Older key names that may still hold a role hint, checked in this order
    /// after [`Self::ROLE_HINT`]. Values found there are moved to the
    /// canonical key.
    pub const LEGACY_ROLE_HINTS: &'static [&'static str] = &[
        "pendingRole",
        "selectedRole",
        "oauth_role",
        "signup_role",
        "userRole",
    ];

    /// Auth tokens and user metadata (JSON).
    pub const SESSION: &'static str = "teacherboard.session";

    /// Prefix for per-user draft profile JSON.
    pub const DRAFT_PROFILE_PREFIX: &'static str = "teacherboard.draft_profile.";

    /// Marker written once the demo-key purge has run.
    pub const DEMO_PURGE_MARKER: &'static str = "teacherboard.demo_purged.v1";

    /// Keys left behind by demo builds. Removed once at startup.
    pub const STALE_DEMO_KEYS: &'static [&'static str] = &[
        "demo_user",
        "demo_profile",
        "demo_vacancies",
        "mockNotifications",
        "adminMockData",
    ];

    pub fn draft_profile(user_id: &str) -> String {
        format!("{}{}", Self::DRAFT_PROFILE_PREFIX, user_id)
    }
}
