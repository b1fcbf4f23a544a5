//! `azurerm_automation_runbook`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::SetElement;
use crate::client::ResourceAddress;
use crate::error::ProviderError;
use crate::identity::{ResourceId, AUTOMATION_ACCOUNTS, RUNBOOKS};
use crate::models::{ContentLink, Runbook, RunbookCreateOrUpdateParameters, RunbookCreateOrUpdateProperties};
use crate::reconciler::ResourceKind;
use crate::schema::{
    normalize_location, Attribute, Block, Diagnostic, NestedBlock, Schema, StateFunc,
};
use crate::validation::validate_tags;

/// Allowed values of `runbook_type`.
pub const RUNBOOK_TYPES: [&str; 6] = [
    "Graph",
    "GraphPowerShell",
    "GraphPowerShellWorkflow",
    "PowerShell",
    "PowerShellWorkflow",
    "Script",
];

/// Declared `publish_content_link` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLinkBlock {
    pub uri: String,
}

impl SetElement for ContentLinkBlock {
    fn set_key(&self) -> &str {
        &self.uri
    }
}

/// Declared configuration of an automation runbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunbookConfig {
    pub name: String,
    pub account_name: String,
    pub location: String,
    pub resource_group_name: String,
    pub runbook_type: String,
    pub log_progress: bool,
    pub log_verbose: bool,
    pub description: String,
    #[serde(with = "crate::block")]
    pub publish_content_link: ContentLinkBlock,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Automation runbook resource kind.
pub struct AutomationRunbook;

impl ResourceKind for AutomationRunbook {
    const TYPE_NAME: &'static str = "azurerm_automation_runbook";
    const DISPLAY_NAME: &'static str = "Automation Runbook";

    type Config = RunbookConfig;
    type Request = RunbookCreateOrUpdateParameters;
    type Response = Runbook;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("account_name", Attribute::required_string().with_force_new())
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
            .with_attribute(
                "runbook_type",
                Attribute::string_enum(&RUNBOOK_TYPES).with_force_new(),
            )
            .with_attribute("log_progress", Attribute::required_bool())
            .with_attribute("log_verbose", Attribute::required_bool())
            .with_attribute("description", Attribute::required_string().with_force_new())
            .with_block(
                "publish_content_link",
                NestedBlock::exactly_one(
                    Block::new().with_attribute("uri", Attribute::required_string()),
                    "uri",
                )
                .with_force_new(),
            )
            .with_attribute("tags", Attribute::tags())
    }

    fn validate(config: &RunbookConfig) -> Vec<Diagnostic> {
        let mut diagnostics = validate_tags(&config.tags);
        if config.publish_content_link.uri.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error("publish_content_link.uri must not be empty")
                    .with_attribute("publish_content_link.0.uri"),
            );
        }
        diagnostics
    }

    fn address(config: &RunbookConfig) -> ResourceAddress {
        ResourceAddress::child(&config.resource_group_name, &config.account_name, &config.name)
    }

    fn address_from_id(id: &ResourceId) -> Result<ResourceAddress, ProviderError> {
        Ok(ResourceAddress::child(
            &id.resource_group,
            id.segment(AUTOMATION_ACCOUNTS)?,
            id.segment(RUNBOOKS)?,
        ))
    }

    fn expand(config: &RunbookConfig) -> RunbookCreateOrUpdateParameters {
        RunbookCreateOrUpdateParameters {
            name: config.name.clone(),
            location: config.location.clone(),
            tags: config.tags.clone(),
            properties: RunbookCreateOrUpdateProperties {
                runbook_type: config.runbook_type.clone(),
                log_progress: config.log_progress,
                log_verbose: config.log_verbose,
                description: config.description.clone(),
                publish_content_link: ContentLink {
                    uri: config.publish_content_link.uri.clone(),
                },
            },
        }
    }

    fn response_id(response: &Runbook) -> Option<&str> {
        response.id.as_deref()
    }

    fn flatten(
        response: &Runbook,
        address: &ResourceAddress,
        prior: Option<&RunbookConfig>,
    ) -> Result<RunbookConfig, ProviderError> {
        let props = &response.properties;
        let missing = |field: &str| {
            ProviderError::InvalidResponse(format!(
                "Automation Runbook '{}' has no {}",
                address.name, field
            ))
        };

        let location = response
            .location
            .as_deref()
            .or(prior.map(|p| p.location.as_str()))
            .ok_or_else(|| missing("location"))?;
        let runbook_type = props
            .runbook_type
            .clone()
            .or_else(|| prior.map(|p| p.runbook_type.clone()))
            .ok_or_else(|| missing("runbook type"))?;
        let log_progress = props
            .log_progress
            .or(prior.map(|p| p.log_progress))
            .ok_or_else(|| missing("log_progress"))?;
        let log_verbose = props
            .log_verbose
            .or(prior.map(|p| p.log_verbose))
            .ok_or_else(|| missing("log_verbose"))?;
        let description = props
            .description
            .clone()
            .or_else(|| prior.map(|p| p.description.clone()))
            .ok_or_else(|| missing("description"))?;
        let publish_content_link = match (&props.publish_content_link, prior) {
            (Some(link), _) => ContentLinkBlock {
                uri: link.uri.clone(),
            },
            (None, Some(prior)) => prior.publish_content_link.clone(),
            (None, None) => return Err(missing("publish content link")),
        };

        Ok(RunbookConfig {
            name: response.name.clone().unwrap_or_else(|| address.name.clone()),
            account_name: address.account_name.clone().unwrap_or_default(),
            location: normalize_location(location),
            resource_group_name: address.resource_group.clone(),
            runbook_type,
            log_progress,
            log_verbose,
            description,
            publish_content_link,
            tags: response.tags.clone(),
        })
    }
}
