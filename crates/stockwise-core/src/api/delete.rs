use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::{ApiClient, ApiResult};

/// A destructive call that has not been sent yet.
///
/// `delete_*` operations hand this back instead of deleting right away. The
/// caller shows [`PendingDelete::prompt`] and either awaits
/// [`PendingDelete::confirm`] or drops the value, which cancels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "nothing is deleted until `confirm` is awaited"]
pub struct PendingDelete {
    resource: &'static str,
    id: i64,
}

/// What the backend reported after a confirmed delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub resource: &'static str,
    pub id: i64,
    pub payload: Value,
}

impl PendingDelete {
    pub(crate) fn new(resource: &'static str, id: i64) -> Self {
        Self { resource, id }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn path(&self) -> String {
        format!("/{}/{}", self.resource, self.id)
    }

    /// Question to put to the user before confirming.
    pub fn prompt(&self) -> String {
        format!("Delete {} #{}?", singular(self.resource), self.id)
    }

    pub async fn confirm(self, client: &ApiClient) -> ApiResult<DeleteOutcome> {
        debug!(path = %self.path(), "Delete confirmed");
        let payload = client.delete(&self.path()).await?;
        Ok(DeleteOutcome {
            resource: self.resource,
            id: self.id,
            payload,
        })
    }
}

impl fmt::Display for PendingDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", singular(self.resource), self.id)
    }
}

fn singular(resource: &str) -> &str {
    match resource {
        "categories" => "category",
        other => other.strip_suffix('s').unwrap_or(other),
    }
}
