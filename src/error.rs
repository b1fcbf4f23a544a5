//! Error types for the Azure Automation provider.

use thiserror::Error;

use crate::client::ApiError;

/// The remote operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A `Get` request.
    Read,
    /// A `CreateOrUpdate` request.
    CreateOrUpdate,
    /// A `Delete` request.
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Self::Read => "read",
            Self::CreateOrUpdate => "create/update",
            Self::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Errors that can occur while reconciling Automation resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The resource identity could not be split into key/value segments.
    #[error("Malformed resource ID: {0}")]
    MalformedIdentity(String),

    /// A segment the caller requires is absent from the resource identity.
    #[error("Resource ID {id:?} has no '{segment}' segment")]
    MissingSegment {
        /// The segment key that was looked up.
        segment: String,
        /// The identity that was parsed.
        id: String,
    },

    /// The declared configuration is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A call to the remote API failed with something other than not-found.
    #[error("Error issuing {operation} request for {resource} '{name}' (resource group '{resource_group}'): {source}")]
    RemoteCall {
        /// The request that failed.
        operation: Operation,
        /// Human readable resource kind, e.g. `Automation Runbook`.
        resource: &'static str,
        /// The resource name.
        name: String,
        /// The resource group the resource lives in.
        resource_group: String,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// Create succeeded but the remote API returned no identity for the resource.
    #[error("Cannot read {resource} '{name}' (resource group '{resource_group}') ID")]
    IdentityMissing {
        /// Human readable resource kind.
        resource: &'static str,
        /// The resource name.
        name: String,
        /// The resource group the resource lives in.
        resource_group: String,
    },

    /// The requested resource was not found where it had to exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The remote API answered with a payload missing a field we cannot do without.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A provider configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether this error wraps a remote not-found response.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::RemoteCall { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::MalformedIdentity("/subscriptions".to_string());
        assert_eq!(format!("{}", err), "Malformed resource ID: /subscriptions");

        let err = ProviderError::MissingSegment {
            segment: "runbooks".to_string(),
            id: "/subscriptions/s/resourceGroups/rg".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Resource ID \"/subscriptions/s/resourceGroups/rg\" has no 'runbooks' segment"
        );

        let err = ProviderError::Validation("sku: expected exactly one block".to_string());
        assert_eq!(
            format!("{}", err),
            "Validation error: sku: expected exactly one block"
        );
    }

    #[test]
    fn test_remote_call_carries_context() {
        let err = ProviderError::RemoteCall {
            operation: Operation::Delete,
            resource: "Automation Runbook",
            name: "rb1".to_string(),
            resource_group: "rg1".to_string(),
            source: ApiError::new(409, "Conflict"),
        };

        let display = format!("{}", err);
        assert!(display.contains("delete request"));
        assert!(display.contains("Automation Runbook 'rb1'"));
        assert!(display.contains("rg1"));
        assert!(display.contains("Conflict"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        let err = ProviderError::RemoteCall {
            operation: Operation::Read,
            resource: "Automation Account",
            name: "acct".to_string(),
            resource_group: "rg".to_string(),
            source: ApiError::not_found("gone"),
        };
        assert!(err.is_not_found());
        assert!(ProviderError::NotFound("x".to_string()).is_not_found());
        assert!(!ProviderError::Configuration("x".to_string()).is_not_found());
    }

    #[test]
    fn test_identity_missing_display() {
        let err = ProviderError::IdentityMissing {
            resource: "Automation Schedule",
            name: "nightly".to_string(),
            resource_group: "rg".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Cannot read Automation Schedule 'nightly' (resource group 'rg') ID"
        );
    }
}
