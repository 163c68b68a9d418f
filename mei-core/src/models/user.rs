use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Plan;

/// An account as known to this service. `id` is the subject issued by the
/// identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For provisioning users (no timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub email: Option<String>,
    pub plan: Plan,
}
