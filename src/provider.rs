//! [`AutomationProvider`]: the four Automation reconcilers behind [`ProviderService`].

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::client::AutomationClients;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::identity::ResourceId;
use crate::plan;
use crate::reconciler::{decode_config, Reconciler, ResourceKind};
use crate::resources::{
    AutomationAccount, AutomationCredential, AutomationRunbook, AutomationSchedule, ResourceType,
};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Azure Automation provider.
pub struct AutomationProvider {
    accounts: Reconciler<AutomationAccount>,
    credentials: Reconciler<AutomationCredential>,
    runbooks: Reconciler<AutomationRunbook>,
    schedules: Reconciler<AutomationSchedule>,
    config: RwLock<Option<ProviderConfig>>,
}

impl AutomationProvider {
    /// Build a provider on top of the given remote clients.
    pub fn new(clients: AutomationClients) -> Self {
        Self {
            accounts: Reconciler::new(clients.accounts),
            credentials: Reconciler::new(clients.credentials),
            runbooks: Reconciler::new(clients.runbooks),
            schedules: Reconciler::new(clients.schedules),
            config: RwLock::new(None),
        }
    }

    /// The configuration set by the last successful `configure`, if any.
    pub async fn config(&self) -> Option<ProviderConfig> {
        self.config.read().await.clone()
    }
}

/// Run `$body` with `$r` bound to the reconciler for `$resource_type`.
macro_rules! with_reconciler {
    ($self:ident, $resource_type:expr, $r:ident => $body:expr) => {
        match $resource_type.parse::<ResourceType>()? {
            ResourceType::Account => {
                let $r = &$self.accounts;
                $body
            },
            ResourceType::Credential => {
                let $r = &$self.credentials;
                $body
            },
            ResourceType::Runbook => {
                let $r = &$self.runbooks;
                $body
            },
            ResourceType::Schedule => {
                let $r = &$self.schedules;
                $body
            },
        }
    };
}

#[async_trait::async_trait]
impl ProviderService for AutomationProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(AutomationAccount::TYPE_NAME, AutomationAccount::schema())
            .with_resource(AutomationCredential::TYPE_NAME, AutomationCredential::schema())
            .with_resource(AutomationRunbook::TYPE_NAME, AutomationRunbook::schema())
            .with_resource(AutomationSchedule::TYPE_NAME, AutomationSchedule::schema())
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&ProviderConfig::schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        match ProviderConfig::from_value(&config) {
            Ok(config) => {
                info!(subscription_id = %config.subscription_id, "provider configured");
                *self.config.write().await = Some(config);
                Ok(vec![])
            },
            Err(ProviderError::Configuration(msg)) => Ok(vec![Diagnostic::error(msg)]),
            Err(e) => Err(e),
        }
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(with_reconciler!(self, resource_type, r => validate_config(r, &config)))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = with_reconciler!(self, resource_type, r => schema_of(r));
        Ok(plan::plan(&schema, prior_state.as_ref(), &proposed_state))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        with_reconciler!(self, resource_type, r => apply(r, &planned_state).await)
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        with_reconciler!(self, resource_type, r => refresh(r, &current_state).await)
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        with_reconciler!(self, resource_type, r => {
            check_same_resource(r, &prior_state, &planned_state)?;
            apply(r, &planned_state).await
        })
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let id = state_id(&current_state)?;
        with_reconciler!(self, resource_type, r => r.delete(id).await)
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let parsed = ResourceId::parse(id)?;
        if let Some(config) = self.config.read().await.as_ref() {
            config.check_subscription(&parsed)?;
        }

        let state = with_reconciler!(self, resource_type, r => import(r, id).await)?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}

fn schema_of<K: ResourceKind>(_: &Reconciler<K>) -> Schema {
    K::schema()
}

fn validate_config<K: ResourceKind>(_: &Reconciler<K>, config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = validation::validate(&K::schema(), config);
    if diagnostics.iter().any(Diagnostic::is_error) {
        return diagnostics;
    }
    match serde_json::from_value::<K::Config>(config.clone()) {
        Ok(typed) => diagnostics.extend(K::validate(&typed)),
        Err(e) => diagnostics.push(Diagnostic::error("Invalid configuration").with_detail(e.to_string())),
    }
    diagnostics
}

fn state_id(state: &Value) -> Result<&str, ProviderError> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::MalformedIdentity("state carries no resource ID".to_string()))
}

async fn apply<K: ResourceKind>(r: &Reconciler<K>, planned: &Value) -> Result<Value, ProviderError> {
    let config = decode_config::<K>(planned)?;
    let state = r.create_or_update(&config).await?;
    Ok(serde_json::to_value(state)?)
}

async fn refresh<K: ResourceKind>(
    r: &Reconciler<K>,
    current: &Value,
) -> Result<Option<Value>, ProviderError> {
    let id = state_id(current)?;
    // Prior configuration supplies attributes the API never returns.
    let prior = serde_json::from_value::<K::Config>(current.clone()).ok();
    match r.read(id, prior.as_ref()).await? {
        Some(state) => Ok(Some(serde_json::to_value(state)?)),
        None => Ok(None),
    }
}

async fn import<K: ResourceKind>(r: &Reconciler<K>, id: &str) -> Result<Value, ProviderError> {
    let state = r.read(id, None).await?.ok_or_else(|| {
        ProviderError::NotFound(format!("cannot import non-existent {} {:?}", K::DISPLAY_NAME, id))
    })?;
    Ok(serde_json::to_value(state)?)
}

/// An in-place update must address the resource the prior state identifies.
fn check_same_resource<K: ResourceKind>(
    _: &Reconciler<K>,
    prior: &Value,
    planned: &Value,
) -> Result<(), ProviderError> {
    let current = K::address_from_id(&ResourceId::parse(state_id(prior)?)?)?;
    let target = K::address(&decode_config::<K>(planned)?);

    let same = |a: &str, b: &str| a.eq_ignore_ascii_case(b);
    let same_account = match (&current.account_name, &target.account_name) {
        (Some(a), Some(b)) => same(a, b),
        (None, None) => true,
        _ => false,
    };
    if same(&current.resource_group, &target.resource_group)
        && same_account
        && same(&current.name, &target.name)
    {
        Ok(())
    } else {
        Err(ProviderError::Validation(format!(
            "{} '{}' cannot be renamed or moved in place; it must be replaced",
            K::DISPLAY_NAME,
            current.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{in_memory_clients, InMemoryApi, RecordedCall};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    const SUB: &str = "S";

    fn provider() -> (AutomationProvider, InMemoryApi) {
        let api = InMemoryApi::new(SUB);
        (AutomationProvider::new(in_memory_clients(&api)), api)
    }

    fn account_config() -> Value {
        json!({
            "name": "acct1",
            "location": "West US",
            "resource_group_name": "RG",
            "sku": [{"name": "Basic"}]
        })
    }

    fn runbook_config() -> Value {
        json!({
            "name": "Get-AzureVMTutorial",
            "account_name": "acct1",
            "location": "westus",
            "resource_group_name": "RG",
            "runbook_type": "PowerShellWorkflow",
            "log_progress": true,
            "log_verbose": false,
            "description": "Lists the VMs in a subscription",
            "publish_content_link": [{"uri": "https://example.com/Get-AzureVMTutorial.ps1"}]
        })
    }

    #[tokio::test]
    async fn test_create_then_read_account() {
        let (provider, _api) = provider();

        let state = provider
            .create("azurerm_automation_account", account_config())
            .await
            .unwrap();
        assert_eq!(
            state["id"],
            "/subscriptions/S/resourceGroups/RG/providers/Microsoft.Automation/automationAccounts/acct1"
        );

        let read = provider
            .read("azurerm_automation_account", state.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read["sku"], json!([{"name": "Basic"}]));
        assert_eq!(read["location"], "westus");
        assert_eq!(read, state);
    }

    #[tokio::test]
    async fn test_read_absent_resource() {
        let (provider, _api) = provider();
        let state = json!({
            "id": "/subscriptions/S/resourceGroups/RG/providers/Microsoft.Automation/automationAccounts/acct1/schedules/gone"
        });
        let read = provider.read("azurerm_automation_schedule", state).await;
        assert_eq!(assert_ok!(read), None);
    }

    #[tokio::test]
    async fn test_delete_missing_runbook_succeeds() {
        let (provider, api) = provider();
        let state = json!({
            "id": "/subscriptions/S/resourceGroups/RG/providers/Microsoft.Automation/automationAccounts/acct1/runbooks/missing"
        });
        assert_ok!(provider.delete("azurerm_automation_runbook", state).await);
        assert_eq!(
            api.calls(),
            vec![RecordedCall::Delete {
                collection: "runbooks".to_string(),
                resource_group: "RG".to_string(),
                account_name: Some("acct1".to_string()),
                name: "missing".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_runbook_delete_addresses_runbook_not_account() {
        let (provider, api) = provider();
        provider
            .create("azurerm_automation_account", account_config())
            .await
            .unwrap();
        let state = provider
            .create("azurerm_automation_runbook", runbook_config())
            .await
            .unwrap();

        provider
            .delete("azurerm_automation_runbook", state.clone())
            .await
            .unwrap();

        assert!(!api.contains("runbooks", "RG", Some("acct1"), "Get-AzureVMTutorial"));
        assert!(api.contains("accounts", "RG", None, "acct1"));
        assert_eq!(
            provider.read("azurerm_automation_runbook", state).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_update_in_place_keeps_identity() {
        let (provider, _api) = provider();
        let created = provider
            .create("azurerm_automation_runbook", runbook_config())
            .await
            .unwrap();

        let mut planned = runbook_config();
        planned["log_verbose"] = json!(true);
        planned["tags"] = json!({"team": "ops"});
        let updated = provider
            .update("azurerm_automation_runbook", created.clone(), planned)
            .await
            .unwrap();

        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["log_verbose"], true);
        assert_eq!(updated["tags"]["team"], "ops");
    }

    #[tokio::test]
    async fn test_update_rejects_rename() {
        let (provider, api) = provider();
        let created = provider
            .create("azurerm_automation_runbook", runbook_config())
            .await
            .unwrap();
        let calls_before = api.calls().len();

        let mut planned = runbook_config();
        planned["name"] = json!("Renamed");
        let err = provider
            .update("azurerm_automation_runbook", created, planned)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Validation(_)));
        assert_eq!(api.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_credential_password_survives_refresh() {
        let (provider, _api) = provider();
        let state = provider
            .create(
                "azurerm_automation_credential",
                json!({
                    "credential_name": "DefaultAzureCredential",
                    "account_name": "acct1",
                    "resource_group_name": "RG",
                    "user_name": "kemy",
                    "password": "pwd",
                    "description": "test credential"
                }),
            )
            .await
            .unwrap();
        assert_eq!(state["password"], "pwd");

        let read = provider
            .read("azurerm_automation_credential", state)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read["password"], "pwd");
        assert_eq!(read["user_name"], "kemy");
    }

    #[tokio::test]
    async fn test_schedule_wire_interval() {
        let (provider, api) = provider();
        let state = provider
            .create(
                "azurerm_automation_schedule",
                json!({
                    "name": "fortnightly",
                    "account_name": "acct1",
                    "resource_group_name": "RG",
                    "frequency": "Week",
                    "interval": 2
                }),
            )
            .await
            .unwrap();

        let stored = api
            .stored("schedules", "RG", Some("acct1"), "fortnightly")
            .unwrap();
        assert_eq!(stored["properties"]["interval"], json!({"week": 2}));
        assert_eq!(state["frequency"], "Week");
        assert_eq!(state["interval"], 2);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config() {
        let (provider, api) = provider();
        let mut config = account_config();
        config["sku"] = json!([]);

        let err = assert_err!(provider.create("azurerm_automation_account", config).await);
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let (provider, _api) = provider();
        let err = provider
            .create("azurerm_automation_module", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let (provider, _api) = provider();

        let diagnostics = provider
            .validate_resource_config("azurerm_automation_account", account_config())
            .await
            .unwrap();
        assert!(diagnostics.is_empty());

        let mut config = account_config();
        config["sku"] = json!([{"name": "Premium"}]);
        let diagnostics = provider
            .validate_resource_config("azurerm_automation_account", config)
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_configure_and_import() {
        let (provider, _api) = provider();
        let diagnostics = provider
            .configure(json!({"subscription_id": SUB}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(provider.config().await.unwrap().subscription_id, SUB);

        let created = provider
            .create("azurerm_automation_account", account_config())
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let imported = provider
            .import_resource("azurerm_automation_account", id)
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state, created);

        let foreign = id.replacen("/subscriptions/S/", "/subscriptions/other/", 1);
        let err = provider
            .import_resource("azurerm_automation_account", &foreign)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_import_missing_resource() {
        let (provider, _api) = provider();
        let err = provider
            .import_resource(
                "azurerm_automation_account",
                "/subscriptions/S/resourceGroups/RG/providers/Microsoft.Automation/automationAccounts/nope",
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_metadata_lists_resources() {
        let (provider, _api) = provider();
        assert_eq!(
            provider.metadata().resources,
            vec![
                "azurerm_automation_account",
                "azurerm_automation_credential",
                "azurerm_automation_runbook",
                "azurerm_automation_schedule",
            ]
        );
    }
}
