//! Parsing of remote-issued resource identities.
//!
//! Azure resource IDs are path-like strings of alternating keys and values:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Automation/automationAccounts/{account}/runbooks/{name}
//! ```
//!
//! Identities are only ever parsed. The remote API hands back the canonical
//! string on every successful `Get`, so nothing here composes one.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ProviderError;

/// Segment key of the subscription.
pub const SUBSCRIPTIONS: &str = "subscriptions";
/// Segment key of the resource group.
pub const RESOURCE_GROUPS: &str = "resourceGroups";
/// Segment key of the resource provider namespace.
pub const PROVIDERS: &str = "providers";
/// Segment key of an automation account.
pub const AUTOMATION_ACCOUNTS: &str = "automationAccounts";
/// Segment key of a runbook.
pub const RUNBOOKS: &str = "runbooks";
/// Segment key of a schedule.
pub const SCHEDULES: &str = "schedules";
/// Segment key of a credential.
pub const CREDENTIALS: &str = "credentials";

const KNOWN_SEGMENTS: [&str; 7] = [
    SUBSCRIPTIONS,
    RESOURCE_GROUPS,
    PROVIDERS,
    AUTOMATION_ACCOUNTS,
    RUNBOOKS,
    SCHEDULES,
    CREDENTIALS,
];

/// A parsed resource identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    raw: String,
    /// Subscription the resource belongs to.
    pub subscription_id: String,
    /// Resource group the resource belongs to.
    pub resource_group: String,
    /// Provider namespace, e.g. `Microsoft.Automation`.
    pub provider: Option<String>,
    /// Remaining segments keyed by segment type (e.g. `automationAccounts`).
    pub path: HashMap<String, String>,
}

impl ResourceId {
    /// Parse an identity string.
    ///
    /// Fails with [`ProviderError::MalformedIdentity`] when the string is empty,
    /// has an odd number of segments or contains an empty segment, and with
    /// [`ProviderError::MissingSegment`] when the subscription or resource
    /// group is absent.
    pub fn parse(id: &str) -> Result<Self, ProviderError> {
        let trimmed = id.trim_matches('/');
        if trimmed.is_empty() {
            return Err(ProviderError::MalformedIdentity(format!(
                "{:?}: identity is empty",
                id
            )));
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(ProviderError::MalformedIdentity(format!(
                "{:?}: expected key/value pairs, got {} segments",
                id,
                components.len()
            )));
        }
        if components.iter().any(|c| c.is_empty()) {
            return Err(ProviderError::MalformedIdentity(format!(
                "{:?}: contains an empty segment",
                id
            )));
        }

        let mut path = HashMap::with_capacity(components.len() / 2);
        for pair in components.chunks_exact(2) {
            let key = canonical_key(pair[0]);
            if path.insert(key.to_string(), pair[1].to_string()).is_some() {
                return Err(ProviderError::MalformedIdentity(format!(
                    "{:?}: segment '{}' appears more than once",
                    id, key
                )));
            }
        }

        let missing = |segment: &str| ProviderError::MissingSegment {
            segment: segment.to_string(),
            id: id.to_string(),
        };
        let subscription_id = path
            .remove(SUBSCRIPTIONS)
            .ok_or_else(|| missing(SUBSCRIPTIONS))?;
        let resource_group = path
            .remove(RESOURCE_GROUPS)
            .ok_or_else(|| missing(RESOURCE_GROUPS))?;
        let provider = path.remove(PROVIDERS);

        Ok(Self {
            raw: id.to_string(),
            subscription_id,
            resource_group,
            provider,
            path,
        })
    }

    /// Look up a required segment by its exact key.
    pub fn segment(&self, key: &str) -> Result<&str, ProviderError> {
        self.path
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ProviderError::MissingSegment {
                segment: key.to_string(),
                id: self.raw.clone(),
            })
    }

    /// The identity string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ResourceId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Map known segment keys onto their canonical spelling, ignoring case.
fn canonical_key(key: &str) -> &str {
    KNOWN_SEGMENTS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(key))
        .copied()
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNBOOK_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG/providers/Microsoft.Automation/automationAccounts/acct1/runbooks/Get-AzureVMTutorial";

    #[test]
    fn test_parse_child_identity() {
        let id = ResourceId::parse(RUNBOOK_ID).unwrap();
        assert_eq!(id.subscription_id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(id.resource_group, "acctestRG");
        assert_eq!(id.provider.as_deref(), Some("Microsoft.Automation"));
        assert_eq!(id.segment(AUTOMATION_ACCOUNTS).unwrap(), "acct1");
        assert_eq!(id.segment(RUNBOOKS).unwrap(), "Get-AzureVMTutorial");
        assert_eq!(id.as_str(), RUNBOOK_ID);
    }

    #[test]
    fn test_known_keys_are_case_insensitive() {
        let id = ResourceId::parse(
            "/subscriptions/s/resourcegroups/rg/providers/Microsoft.Automation/AutomationAccounts/a/Schedules/daily",
        )
        .unwrap();
        assert_eq!(id.resource_group, "rg");
        assert_eq!(id.segment(AUTOMATION_ACCOUNTS).unwrap(), "a");
        assert_eq!(id.segment(SCHEDULES).unwrap(), "daily");
    }

    #[test]
    fn test_values_keep_their_case() {
        let id = ResourceId::parse("/subscriptions/S/resourceGroups/MyRG/providers/P/automationAccounts/MyAcct")
            .unwrap();
        assert_eq!(id.resource_group, "MyRG");
        assert_eq!(id.segment(AUTOMATION_ACCOUNTS).unwrap(), "MyAcct");
    }

    #[test]
    fn test_unknown_keys_are_kept_verbatim() {
        let id = ResourceId::parse("/subscriptions/s/resourceGroups/rg/widgets/w1").unwrap();
        assert_eq!(id.segment("widgets").unwrap(), "w1");
        assert!(id.segment("Widgets").is_err());
    }

    #[test]
    fn test_empty_identity_is_malformed() {
        assert!(matches!(
            ResourceId::parse(""),
            Err(ProviderError::MalformedIdentity(_))
        ));
        assert!(matches!(
            ResourceId::parse("/"),
            Err(ProviderError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_odd_segment_count_is_malformed() {
        assert!(matches!(
            ResourceId::parse("/subscriptions/s/resourceGroups"),
            Err(ProviderError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_empty_segment_is_malformed() {
        assert!(matches!(
            ResourceId::parse("/subscriptions//resourceGroups/rg"),
            Err(ProviderError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_repeated_segment_is_malformed() {
        let err = ResourceId::parse(
            "/subscriptions/S/resourceGroups/RG1/resourceGroups/RG2/providers/Microsoft.Automation/automationAccounts/a",
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedIdentity(ref msg) if msg.contains("resourceGroups")));

        // Known keys collide regardless of case.
        assert!(matches!(
            ResourceId::parse("/subscriptions/S/resourceGroups/RG/resourcegroups/RG"),
            Err(ProviderError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_missing_resource_group() {
        let err = ResourceId::parse("/subscriptions/s/providers/P").unwrap_err();
        match err {
            ProviderError::MissingSegment { segment, .. } => assert_eq!(segment, RESOURCE_GROUPS),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_child_segment() {
        let id = ResourceId::parse("/subscriptions/s/resourceGroups/rg/providers/P/automationAccounts/a")
            .unwrap();
        let err = id.segment(RUNBOOKS).unwrap_err();
        assert!(matches!(err, ProviderError::MissingSegment { ref segment, .. } if segment == RUNBOOKS));
    }

    #[test]
    fn test_from_str() {
        let id: ResourceId = RUNBOOK_ID.parse().unwrap();
        assert_eq!(id.resource_group, "acctestRG");
    }
}
