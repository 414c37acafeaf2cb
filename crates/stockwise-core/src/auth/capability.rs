use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Roles the backend hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a role name. The legacy name `general` means `user`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" | "general" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// What the current session is allowed to do, derived from `/auth/validate`.
///
/// Pages receive this value and gate admin-only actions on it instead of
/// consulting shared mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct SessionCapability {
    pub user_id: Option<i64>,
    pub role: Option<Role>,
}

impl SessionCapability {
    /// No usable session: treated as non-privileged.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Read the capability from a validate payload.
    ///
    /// Accepts both the unwrapped `{id, role}` and a still-enveloped
    /// `{data: {id, role}}` shape.
    pub fn from_payload(payload: &Value) -> Self {
        let inner = payload.get("data").filter(|d| d.is_object()).unwrap_or(payload);
        let role = inner.get("role").and_then(Value::as_str).and_then(Role::parse);
        let user_id = inner.get("id").and_then(|id| {
            id.as_i64()
                .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
        });
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }
}
