//! `azurerm_automation_credential`
//!
//! The remote API accepts a password but never returns it. Reading a
//! credential therefore keeps whatever password is held locally instead of
//! overwriting it with remote truth. A password changed outside of this
//! provider is not detected; that drift is expected.

use serde::{Deserialize, Serialize};

use crate::client::ResourceAddress;
use crate::error::ProviderError;
use crate::identity::{ResourceId, AUTOMATION_ACCOUNTS, CREDENTIALS};
use crate::models::{Credential, CredentialCreateOrUpdateParameters, CredentialCreateOrUpdateProperties};
use crate::reconciler::ResourceKind;
use crate::schema::{Attribute, Schema};

/// Declared configuration of an automation credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub credential_name: String,
    pub account_name: String,
    pub resource_group_name: String,
    pub user_name: String,
    /// Write-only. Never read back from the remote API.
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Automation credential resource kind.
pub struct AutomationCredential;

impl ResourceKind for AutomationCredential {
    const TYPE_NAME: &'static str = "azurerm_automation_credential";
    const DISPLAY_NAME: &'static str = "Automation Credential";

    type Config = CredentialConfig;
    type Request = CredentialCreateOrUpdateParameters;
    type Response = Credential;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "credential_name",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute("account_name", Attribute::required_string().with_force_new())
            .with_attribute(
                "resource_group_name",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute("user_name", Attribute::required_string())
            .with_attribute("password", Attribute::required_string().sensitive())
            .with_attribute("description", Attribute::optional_string())
    }

    fn address(config: &CredentialConfig) -> ResourceAddress {
        ResourceAddress::child(
            &config.resource_group_name,
            &config.account_name,
            &config.credential_name,
        )
    }

    fn address_from_id(id: &ResourceId) -> Result<ResourceAddress, ProviderError> {
        Ok(ResourceAddress::child(
            &id.resource_group,
            id.segment(AUTOMATION_ACCOUNTS)?,
            id.segment(CREDENTIALS)?,
        ))
    }

    fn expand(config: &CredentialConfig) -> CredentialCreateOrUpdateParameters {
        CredentialCreateOrUpdateParameters {
            name: config.credential_name.clone(),
            properties: CredentialCreateOrUpdateProperties {
                user_name: config.user_name.clone(),
                password: config.password.clone(),
                description: config.description.clone(),
            },
        }
    }

    fn response_id(response: &Credential) -> Option<&str> {
        response.id.as_deref()
    }

    fn flatten(
        response: &Credential,
        address: &ResourceAddress,
        prior: Option<&CredentialConfig>,
    ) -> Result<CredentialConfig, ProviderError> {
        let user_name = response
            .properties
            .user_name
            .clone()
            .or_else(|| prior.map(|p| p.user_name.clone()))
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "Automation Credential '{}' has no user name",
                    address.name
                ))
            })?;

        Ok(CredentialConfig {
            credential_name: response.name.clone().unwrap_or_else(|| address.name.clone()),
            account_name: address.account_name.clone().unwrap_or_default(),
            resource_group_name: address.resource_group.clone(),
            user_name,
            // The API never echoes the password back.
            password: prior.map(|p| p.password.clone()).unwrap_or_default(),
            description: response.properties.description.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CredentialProperties;

    fn config() -> CredentialConfig {
        CredentialConfig {
            credential_name: "DefaultAzureCredential".to_string(),
            account_name: "acctest".to_string(),
            resource_group_name: "acctestRG".to_string(),
            user_name: "kemy".to_string(),
            password: "pwd".to_string(),
            description: Some("This is a test credential".to_string()),
        }
    }

    // What the API returns for a credential: everything but the password.
    fn echo(params: &CredentialCreateOrUpdateParameters) -> Credential {
        Credential {
            id: Some("/subscriptions/S/resourceGroups/acctestRG/providers/Microsoft.Automation/automationAccounts/acctest/credentials/DefaultAzureCredential".to_string()),
            name: Some(params.name.clone()),
            properties: CredentialProperties {
                user_name: Some(params.properties.user_name.clone()),
                description: params.properties.description.clone(),
            },
        }
    }

    #[test]
    fn test_round_trip_keeps_local_password() {
        let config = config();
        let address = AutomationCredential::address(&config);
        let response = echo(&AutomationCredential::expand(&config));

        let flattened = AutomationCredential::flatten(&response, &address, Some(&config)).unwrap();
        assert_eq!(flattened, config);
    }

    #[test]
    fn test_password_is_not_recoverable_without_prior_state() {
        // Expected drift: an imported credential has no password in state.
        let config = config();
        let address = AutomationCredential::address(&config);
        let response = echo(&AutomationCredential::expand(&config));

        let flattened = AutomationCredential::flatten(&response, &address, None).unwrap();
        assert_eq!(flattened.password, "");
        assert_eq!(flattened.user_name, "kemy");
    }

    #[test]
    fn test_expand_sends_password() {
        let params = AutomationCredential::expand(&config());
        assert_eq!(params.properties.password, "pwd");
        assert_eq!(params.name, "DefaultAzureCredential");
    }

    #[test]
    fn test_password_is_sensitive() {
        let schema = AutomationCredential::schema();
        assert!(schema.block.attributes["password"].flags.sensitive);
    }

    #[test]
    fn test_address_from_id() {
        let id = ResourceId::parse(
            "/subscriptions/S/resourceGroups/rg/providers/Microsoft.Automation/automationAccounts/a/credentials/c",
        )
        .unwrap();
        assert_eq!(
            AutomationCredential::address_from_id(&id).unwrap(),
            ResourceAddress::child("rg", "a", "c")
        );
    }
}
