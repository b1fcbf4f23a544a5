//! `azurerm_automation_schedule`
//!
//! The remote API does not take a flat interval. It expects a single-entry
//! map keyed by the lowercased frequency, so `frequency = "Week"` with
//! `interval = 2` travels as `{"week": 2}`. Flattening reads the entry back.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::ResourceAddress;
use crate::error::ProviderError;
use crate::identity::{ResourceId, AUTOMATION_ACCOUNTS, SCHEDULES};
use crate::models::{Schedule, ScheduleCreateOrUpdateParameters, ScheduleCreateOrUpdateProperties};
use crate::reconciler::ResourceKind;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Allowed values of `frequency`.
pub const FREQUENCIES: [&str; 5] = ["Day", "Hour", "Month", "OneTime", "Week"];

/// Declared configuration of an automation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub name: String,
    pub account_name: String,
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<String>,
    pub frequency: String,
    pub interval: i64,
}

/// Encode the flat frequency/interval pair as the remote interval map.
pub fn expand_interval(frequency: &str, interval: i64) -> BTreeMap<String, i64> {
    BTreeMap::from([(frequency.to_ascii_lowercase(), interval)])
}

/// Decode the remote interval map.
///
/// The entry keyed by `frequency` wins; otherwise the map's only entry is used.
pub fn flatten_interval(frequency: &str, interval: &BTreeMap<String, i64>) -> Option<i64> {
    interval
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(frequency))
        .or_else(|| interval.iter().next())
        .map(|(_, value)| *value)
}

/// Automation schedule resource kind.
pub struct AutomationSchedule;

impl ResourceKind for AutomationSchedule {
    const TYPE_NAME: &'static str = "azurerm_automation_schedule";
    const DISPLAY_NAME: &'static str = "Automation Schedule";

    type Config = ScheduleConfig;
    type Request = ScheduleCreateOrUpdateParameters;
    type Response = Schedule;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("account_name", Attribute::required_string().with_force_new())
            .with_attribute(
                "resource_group_name",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute("start_time", Attribute::optional_string())
            .with_attribute("expiry_time", Attribute::optional_string())
            .with_attribute("frequency", Attribute::string_enum(&FREQUENCIES))
            .with_attribute("interval", Attribute::required_int64())
    }

    fn validate(config: &ScheduleConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if config.interval < 1 {
            diagnostics.push(
                Diagnostic::error("interval must be at least 1")
                    .with_detail(format!("Got {}", config.interval))
                    .with_attribute("interval"),
            );
        }

        let mut parse = |attribute: &str, value: &Option<String>| -> Option<DateTime<FixedOffset>> {
            let value = value.as_deref()?;
            match DateTime::parse_from_rfc3339(value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::error(format!("{} is not a valid RFC 3339 timestamp", attribute))
                            .with_detail(format!("{:?}: {}", value, e))
                            .with_attribute(attribute),
                    );
                    None
                },
            }
        };
        let start = parse("start_time", &config.start_time);
        let expiry = parse("expiry_time", &config.expiry_time);

        if let (Some(start), Some(expiry)) = (start, expiry) {
            if expiry <= start {
                diagnostics.push(
                    Diagnostic::error("expiry_time must be after start_time")
                        .with_attribute("expiry_time"),
                );
            }
        }

        diagnostics
    }

    fn address(config: &ScheduleConfig) -> ResourceAddress {
        ResourceAddress::child(&config.resource_group_name, &config.account_name, &config.name)
    }

    fn address_from_id(id: &ResourceId) -> Result<ResourceAddress, ProviderError> {
        Ok(ResourceAddress::child(
            &id.resource_group,
            id.segment(AUTOMATION_ACCOUNTS)?,
            id.segment(SCHEDULES)?,
        ))
    }

    fn expand(config: &ScheduleConfig) -> ScheduleCreateOrUpdateParameters {
        ScheduleCreateOrUpdateParameters {
            name: config.name.clone(),
            properties: ScheduleCreateOrUpdateProperties {
                description: config.description.clone(),
                start_time: config.start_time.clone(),
                expiry_time: config.expiry_time.clone(),
                interval: expand_interval(&config.frequency, config.interval),
                frequency: config.frequency.clone(),
            },
        }
    }

    fn response_id(response: &Schedule) -> Option<&str> {
        response.id.as_deref()
    }

    fn flatten(
        response: &Schedule,
        address: &ResourceAddress,
        prior: Option<&ScheduleConfig>,
    ) -> Result<ScheduleConfig, ProviderError> {
        let props = &response.properties;
        let frequency = props
            .frequency
            .clone()
            .or_else(|| prior.map(|p| p.frequency.clone()))
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "Automation Schedule '{}' has no frequency",
                    address.name
                ))
            })?;

        let interval = match flatten_interval(&frequency, &props.interval) {
            Some(interval) => interval,
            None => {
                warn!(name = %address.name, "schedule returned without an interval");
                prior.map(|p| p.interval).ok_or_else(|| {
                    ProviderError::InvalidResponse(format!(
                        "Automation Schedule '{}' has no interval",
                        address.name
                    ))
                })?
            },
        };

        Ok(ScheduleConfig {
            name: response.name.clone().unwrap_or_else(|| address.name.clone()),
            account_name: address.account_name.clone().unwrap_or_default(),
            resource_group_name: address.resource_group.clone(),
            description: props.description.clone(),
            start_time: props.start_time.clone(),
            expiry_time: props.expiry_time.clone(),
            frequency,
            interval,
        })
    }
}
