//! Result types exchanged with the orchestration engine.

use serde::{Deserialize, Serialize};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if removing).
    pub after: Option<serde_json::Value>,
    /// Whether this change forces the resource to be replaced.
    #[serde(default)]
    pub requires_replace: bool,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
            requires_replace: false,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    /// Mark the change as forcing replacement.
    pub fn forcing_replace(mut self, requires_replace: bool) -> Self {
        self.requires_replace = requires_replace;
        self
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result from a list of changes.
    ///
    /// Replacement is required if any change requires it.
    pub fn with_changes(planned_state: serde_json::Value, changes: Vec<AttributeChange>) -> Self {
        let requires_replace = changes.iter().any(|c| c.requires_replace);
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the resource types it manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("acct1"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("acct1")));
        assert!(!added.requires_replace);

        let removed = AttributeChange::removed("tags", json!({"env": "dev"}));
        assert_eq!(removed.before, Some(json!({"env": "dev"})));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("interval", json!(1), json!(2)).forcing_replace(true);
        assert_eq!(modified.before, Some(json!(1)));
        assert_eq!(modified.after, Some(json!(2)));
        assert!(modified.requires_replace);
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"id": "123"}));
        assert!(no_change.changes.is_empty());
        assert!(!no_change.requires_replace);

        let in_place = PlanResult::with_changes(
            json!({"id": "123"}),
            vec![AttributeChange::modified("log_verbose", json!(false), json!(true))],
        );
        assert!(!in_place.requires_replace);

        let replace = PlanResult::with_changes(
            json!({}),
            vec![AttributeChange::modified("location", json!("westus"), json!("eastus"))
                .forcing_replace(true)],
        );
        assert!(replace.requires_replace);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("azurerm_automation_account", json!({"id": "x"}));
        assert_eq!(imported.resource_type, "azurerm_automation_account");
        assert_eq!(imported.state["id"], "x");
    }
}
