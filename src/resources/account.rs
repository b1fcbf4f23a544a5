//! `azurerm_automation_account`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::SetElement;
use crate::client::ResourceAddress;
use crate::error::ProviderError;
use crate::identity::{ResourceId, AUTOMATION_ACCOUNTS};
use crate::models::{Account, AccountCreateOrUpdateParameters, AccountCreateOrUpdateProperties, Sku};
use crate::reconciler::ResourceKind;
use crate::schema::{normalize_location, Attribute, Block, Diagnostic, NestedBlock, Schema, StateFunc};
use crate::validation::validate_tags;

/// Allowed values of `sku.name`.
pub const SKU_NAMES: [&str; 2] = ["Free", "Basic"];

/// Declared `sku` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuBlock {
    /// `Free` or `Basic`, any case.
    pub name: String,
}

impl SetElement for SkuBlock {
    fn set_key(&self) -> &str {
        &self.name
    }
}

/// Declared configuration of an automation account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub location: String,
    pub resource_group_name: String,
    #[serde(with = "crate::block")]
    pub sku: SkuBlock,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Automation account resource kind.
pub struct AutomationAccount;

impl ResourceKind for AutomationAccount {
    const TYPE_NAME: &'static str = "azurerm_automation_account";
    const DISPLAY_NAME: &'static str = "Automation Account";

    type Config = AccountConfig;
    type Request = AccountCreateOrUpdateParameters;
    type Response = Account;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute(
                "location",
                Attribute::required_string()
                    .with_force_new()
                    .with_state_func(StateFunc::NormalizeLocation),
            )
            .with_attribute(
                "resource_group_name",
                Attribute::required_string().with_force_new(),
            )
            .with_block(
                "sku",
                NestedBlock::exactly_one(
                    Block::new().with_attribute("name", Attribute::string_enum(&SKU_NAMES)),
                    "name",
                )
                .with_force_new(),
            )
            .with_attribute("tags", Attribute::tags())
    }

    fn validate(config: &AccountConfig) -> Vec<Diagnostic> {
        validate_tags(&config.tags)
    }

    fn address(config: &AccountConfig) -> ResourceAddress {
        ResourceAddress::account(&config.resource_group_name, &config.name)
    }

    fn address_from_id(id: &ResourceId) -> Result<ResourceAddress, ProviderError> {
        Ok(ResourceAddress::account(
            &id.resource_group,
            id.segment(AUTOMATION_ACCOUNTS)?,
        ))
    }

    fn expand(config: &AccountConfig) -> AccountCreateOrUpdateParameters {
        AccountCreateOrUpdateParameters {
            name: config.name.clone(),
            location: config.location.clone(),
            tags: config.tags.clone(),
            properties: AccountCreateOrUpdateProperties {
                sku: Sku {
                    name: config.sku.name.clone(),
                },
            },
        }
    }

    fn response_id(response: &Account) -> Option<&str> {
        response.id.as_deref()
    }

    fn flatten(
        response: &Account,
        address: &ResourceAddress,
        prior: Option<&AccountConfig>,
    ) -> Result<AccountConfig, ProviderError> {
        let sku = match (&response.properties.sku, prior) {
            (Some(sku), _) => SkuBlock {
                name: sku.name.clone(),
            },
            (None, Some(prior)) => prior.sku.clone(),
            (None, None) => {
                return Err(ProviderError::InvalidResponse(format!(
                    "Automation Account '{}' has no sku",
                    address.name
                )))
            },
        };
        let location = response
            .location
            .as_deref()
            .or(prior.map(|p| p.location.as_str()))
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "Automation Account '{}' has no location",
                    address.name
                ))
            })?;

        Ok(AccountConfig {
            name: response.name.clone().unwrap_or_else(|| address.name.clone()),
            location: normalize_location(location),
            resource_group_name: address.resource_group.clone(),
            sku,
            tags: response.tags.clone(),
        })
    }
}
