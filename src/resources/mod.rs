//! The Automation resource kinds.

pub mod account;
pub mod credential;
pub mod runbook;
pub mod schedule;

pub use account::{AccountConfig, AutomationAccount};
pub use credential::{AutomationCredential, CredentialConfig};
pub use runbook::{AutomationRunbook, RunbookConfig};
pub use schedule::{AutomationSchedule, ScheduleConfig};

use std::str::FromStr;

use crate::error::ProviderError;
use crate::reconciler::ResourceKind;

/// The resource types this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// `azurerm_automation_account`
    Account,
    /// `azurerm_automation_credential`
    Credential,
    /// `azurerm_automation_runbook`
    Runbook,
    /// `azurerm_automation_schedule`
    Schedule,
}

impl ResourceType {
    /// Every resource type, in a stable order.
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Account,
        ResourceType::Credential,
        ResourceType::Runbook,
        ResourceType::Schedule,
    ];

    /// The configuration name of this resource type.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Account => AutomationAccount::TYPE_NAME,
            Self::Credential => AutomationCredential::TYPE_NAME,
            Self::Runbook => AutomationRunbook::TYPE_NAME,
            Self::Schedule => AutomationSchedule::TYPE_NAME,
        }
    }
}

impl FromStr for ResourceType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.type_name() == s)
            .ok_or_else(|| ProviderError::UnknownResource(s.to_string()))
    }
}
