//! Provider configuration.
//!
//! The provider block carries the subscription resources are managed in.
//! When it is omitted the `ARM_SUBSCRIPTION_ID` environment variable is used.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::identity::ResourceId;
use crate::schema::{Attribute, Schema};

/// Environment variable consulted when `subscription_id` is not configured.
pub const SUBSCRIPTION_ID_ENV: &str = "ARM_SUBSCRIPTION_ID";

/// Provider-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Subscription the managed resources belong to.
    pub subscription_id: String,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    subscription_id: Option<String>,
}

impl ProviderConfig {
    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0().with_attribute(
            "subscription_id",
            Attribute::optional_string()
                .with_description("Subscription ID. Defaults to $ARM_SUBSCRIPTION_ID."),
        )
    }

    /// Build the configuration from the provider block, falling back to the environment.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        let env = std::env::var(SUBSCRIPTION_ID_ENV).ok();
        Self::resolve(value, env)
    }

    fn resolve(value: &Value, env: Option<String>) -> Result<Self, ProviderError> {
        let raw: RawConfig = if value.is_null() {
            RawConfig {
                subscription_id: None,
            }
        } else {
            serde_json::from_value(value.clone())?
        };

        let subscription_id = raw
            .subscription_id
            .filter(|s| !s.is_empty())
            .or(env.filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "subscription_id must be set in the provider block or via {}",
                    SUBSCRIPTION_ID_ENV
                ))
            })?;

        Ok(Self { subscription_id })
    }

    /// Reject identities that belong to another subscription.
    pub fn check_subscription(&self, id: &ResourceId) -> Result<(), ProviderError> {
        if id.subscription_id.eq_ignore_ascii_case(&self.subscription_id) {
            Ok(())
        } else {
            Err(ProviderError::Configuration(format!(
                "resource {:?} belongs to subscription {:?}, provider is configured for {:?}",
                id.as_str(),
                id.subscription_id,
                self.subscription_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_subscription_wins() {
        let config =
            ProviderConfig::resolve(&json!({"subscription_id": "abc"}), Some("env".to_string()))
                .unwrap();
        assert_eq!(config.subscription_id, "abc");
    }

    #[test]
    fn test_falls_back_to_environment() {
        let config = ProviderConfig::resolve(&json!({}), Some("env-sub".to_string())).unwrap();
        assert_eq!(config.subscription_id, "env-sub");

        let config = ProviderConfig::resolve(&Value::Null, Some("env-sub".to_string())).unwrap();
        assert_eq!(config.subscription_id, "env-sub");
    }

    #[test]
    fn test_missing_subscription() {
        let err = ProviderConfig::resolve(&json!({"subscription_id": ""}), None).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_check_subscription() {
        let config = ProviderConfig {
            subscription_id: "S1".to_string(),
        };
        let ours = ResourceId::parse("/subscriptions/s1/resourceGroups/rg").unwrap();
        assert!(config.check_subscription(&ours).is_ok());

        let theirs = ResourceId::parse("/subscriptions/S2/resourceGroups/rg").unwrap();
        assert!(matches!(
            config.check_subscription(&theirs),
            Err(ProviderError::Configuration(_))
        ));
    }
}
