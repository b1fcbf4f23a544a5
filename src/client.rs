//! The remote client capability the reconcilers are handed.
//!
//! The HTTP transport, authentication and retry policy all live behind
//! [`ResourceClient`]. Reconcilers only ever issue `get`, `create_or_update`
//! and `delete` against a [`ResourceAddress`] and inspect the returned
//! [`ApiError`] status to recognise not-found.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{
    Account, AccountCreateOrUpdateParameters, Credential, CredentialCreateOrUpdateParameters,
    Runbook, RunbookCreateOrUpdateParameters, Schedule, ScheduleCreateOrUpdateParameters,
};

/// HTTP status the remote API uses for a missing resource.
pub const STATUS_NOT_FOUND: u16 = 404;

/// An error reported by the remote API or the transport underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status {status}: {message}")]
pub struct ApiError {
    /// HTTP-style status code of the failed response (0 if no response was received).
    pub status: u16,
    /// Error message from the remote side.
    pub message: String,
}

impl ApiError {
    /// Create an error with the given status and message.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(STATUS_NOT_FOUND, message)
    }

    /// Whether the remote side reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == STATUS_NOT_FOUND
    }
}

/// Addressing information for a single remote call.
///
/// Top-level accounts have no `account_name`; child resources (credentials,
/// runbooks, schedules) are addressed inside their parent account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    /// Resource group containing the resource.
    pub resource_group: String,
    /// Parent automation account, for child resources.
    pub account_name: Option<String>,
    /// The resource's own name.
    pub name: String,
}

impl ResourceAddress {
    /// Address a top-level automation account.
    pub fn account(resource_group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            account_name: None,
            name: name.into(),
        }
    }

    /// Address a resource nested in an automation account.
    pub fn child(
        resource_group: impl Into<String>,
        account_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            account_name: Some(account_name.into()),
            name: name.into(),
        }
    }
}

/// Remote CRUD capability for one resource kind.
///
/// `Req` is the create-or-update payload, `Resp` the resource representation
/// returned by `get` and `create_or_update`. Each call is awaited to
/// completion before the reconciler moves on.
#[async_trait::async_trait]
pub trait ResourceClient<Req, Resp>: Send + Sync {
    /// Fetch the current remote representation.
    async fn get(&self, address: &ResourceAddress) -> Result<Resp, ApiError>;

    /// Create the resource, or update it in place if the name already exists.
    async fn create_or_update(
        &self,
        address: &ResourceAddress,
        parameters: Req,
    ) -> Result<Resp, ApiError>;

    /// Delete the resource.
    async fn delete(&self, address: &ResourceAddress) -> Result<(), ApiError>;
}

/// Client for automation accounts.
pub type AccountClient = dyn ResourceClient<AccountCreateOrUpdateParameters, Account>;
/// Client for automation credentials.
pub type CredentialClient = dyn ResourceClient<CredentialCreateOrUpdateParameters, Credential>;
/// Client for automation runbooks.
pub type RunbookClient = dyn ResourceClient<RunbookCreateOrUpdateParameters, Runbook>;
/// Client for automation schedules.
pub type ScheduleClient = dyn ResourceClient<ScheduleCreateOrUpdateParameters, Schedule>;

/// The set of clients a provider instance is built from.
#[derive(Clone)]
pub struct AutomationClients {
    /// Automation account client.
    pub accounts: Arc<AccountClient>,
    /// Automation credential client.
    pub credentials: Arc<CredentialClient>,
    /// Automation runbook client.
    pub runbooks: Arc<RunbookClient>,
    /// Automation schedule client.
    pub schedules: Arc<ScheduleClient>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_not_found() {
        assert!(ApiError::not_found("missing").is_not_found());
        assert!(!ApiError::new(500, "boom").is_not_found());
        assert_eq!(
            format!("{}", ApiError::new(409, "Conflict")),
            "status 409: Conflict"
        );
    }

    #[test]
    fn test_address_constructors() {
        let account = ResourceAddress::account("rg", "acct");
        assert!(account.account_name.is_none());
        assert_eq!(account.name, "acct");

        let runbook = ResourceAddress::child("rg", "acct", "rb");
        assert_eq!(runbook.account_name.as_deref(), Some("acct"));
        assert_eq!(runbook.name, "rb");
    }
}
