//! Testing utilities for the Automation provider.
//!
//! [`InMemoryApi`] stands in for the Azure Automation REST API: it keeps
//! resources in memory, issues ARM-style identities and records every call
//! so tests can assert on what reached the remote side. [`ProviderTester`]
//! drives a [`ProviderService`] through the plan/apply lifecycle.
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_azure_automation::testing::{in_memory_clients, InMemoryApi, ProviderTester};
//! use hemmer_provider_azure_automation::AutomationProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_account() {
//!     let api = InMemoryApi::new("00000000-0000-0000-0000-000000000000");
//!     let tester = ProviderTester::new(AutomationProvider::new(in_memory_clients(&api)));
//!
//!     let state = tester
//!         .lifecycle_create("azurerm_automation_account", json!({
//!             "name": "acct1",
//!             "location": "westus",
//!             "resource_group_name": "rg",
//!             "sku": [{"name": "Basic"}]
//!         }))
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(state["sku"][0]["name"], "Basic");
//! }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::{ApiError, AutomationClients, ResourceAddress, ResourceClient};
use crate::error::ProviderError;
use crate::identity::{AUTOMATION_ACCOUNTS, CREDENTIALS, RUNBOOKS, SCHEDULES};
use crate::models::{
    Account, AccountCreateOrUpdateParameters, AccountProperties, Credential,
    CredentialCreateOrUpdateParameters, CredentialProperties, Runbook,
    RunbookCreateOrUpdateParameters, RunbookProperties, Schedule,
    ScheduleCreateOrUpdateParameters, ScheduleProperties,
};
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Collection name for automation accounts.
pub const ACCOUNTS: &str = "accounts";

/// A call received by the in-memory API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `get` on a resource.
    Get {
        /// Collection the call targeted (`accounts`, `credentials`, `runbooks`, `schedules`).
        collection: String,
        /// Resource group.
        resource_group: String,
        /// Parent account, for child resources.
        account_name: Option<String>,
        /// Resource name.
        name: String,
    },
    /// `create_or_update` on a resource.
    CreateOrUpdate {
        /// Collection the call targeted.
        collection: String,
        /// Resource group.
        resource_group: String,
        /// Parent account, for child resources.
        account_name: Option<String>,
        /// Resource name.
        name: String,
    },
    /// `delete` on a resource.
    Delete {
        /// Collection the call targeted.
        collection: String,
        /// Resource group.
        resource_group: String,
        /// Parent account, for child resources.
        account_name: Option<String>,
        /// Resource name.
        name: String,
    },
}

type Key = (String, String, Option<String>, String);

fn key(collection: &str, resource_group: &str, account_name: Option<&str>, name: &str) -> Key {
    (
        collection.to_string(),
        resource_group.to_ascii_lowercase(),
        account_name.map(str::to_ascii_lowercase),
        name.to_ascii_lowercase(),
    )
}

#[derive(Debug, Clone)]
struct Stored {
    request: Value,
    response: Value,
}

#[derive(Debug, Default)]
struct ApiState {
    resources: HashMap<Key, Stored>,
    calls: Vec<RecordedCall>,
    failures: HashMap<String, VecDeque<ApiError>>,
    omit_ids: HashSet<String>,
}

/// In-memory stand-in for the Azure Automation REST API.
///
/// Cheap to clone; clones share the same backing store. Names are matched
/// case-insensitively, as Azure does.
#[derive(Debug, Clone)]
pub struct InMemoryApi {
    subscription_id: String,
    state: Arc<Mutex<ApiState>>,
}

impl InMemoryApi {
    /// Create an empty API issuing identities under `subscription_id`.
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            state: Arc::new(Mutex::new(ApiState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Make the next call against `collection` fail with `error`.
    pub fn fail_next(&self, collection: &str, error: ApiError) {
        self.lock()
            .failures
            .entry(collection.to_string())
            .or_default()
            .push_back(error);
    }

    /// Strip the identity from every response of `collection`.
    pub fn omit_ids(&self, collection: &str) {
        self.lock().omit_ids.insert(collection.to_string());
    }

    /// Whether a resource currently exists.
    pub fn contains(
        &self,
        collection: &str,
        resource_group: &str,
        account_name: Option<&str>,
        name: &str,
    ) -> bool {
        self.lock()
            .resources
            .contains_key(&key(collection, resource_group, account_name, name))
    }

    /// The last create-or-update payload accepted for a resource, as sent on the wire.
    pub fn stored(
        &self,
        collection: &str,
        resource_group: &str,
        account_name: Option<&str>,
        name: &str,
    ) -> Option<Value> {
        self.lock()
            .resources
            .get(&key(collection, resource_group, account_name, name))
            .map(|stored| stored.request.clone())
    }

    /// Replace the remote representation of an existing resource.
    ///
    /// Simulates changes made outside of this provider.
    pub fn set_response(
        &self,
        collection: &str,
        resource_group: &str,
        account_name: Option<&str>,
        name: &str,
        response: Value,
    ) -> bool {
        match self
            .lock()
            .resources
            .get_mut(&key(collection, resource_group, account_name, name))
        {
            Some(stored) => {
                stored.response = response;
                true
            },
            None => false,
        }
    }

    /// Delete a resource behind the provider's back.
    pub fn remove(
        &self,
        collection: &str,
        resource_group: &str,
        account_name: Option<&str>,
        name: &str,
    ) -> bool {
        self.lock()
            .resources
            .remove(&key(collection, resource_group, account_name, name))
            .is_some()
    }

    fn id_for(&self, segment: &str, address: &ResourceAddress) -> String {
        let base = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Automation/{}",
            self.subscription_id, address.resource_group, AUTOMATION_ACCOUNTS
        );
        match &address.account_name {
            Some(account) => format!("{}/{}/{}/{}", base, account, segment, address.name),
            None => format!("{}/{}", base, address.name),
        }
    }
}

/// Builds the remote representation from an accepted payload and the issued identity.
pub type Responder<Req, Resp> = fn(&Req, String) -> Resp;

/// A [`ResourceClient`] backed by an [`InMemoryApi`] collection.
pub struct InMemoryClient<Req, Resp> {
    api: InMemoryApi,
    collection: &'static str,
    segment: &'static str,
    respond: Responder<Req, Resp>,
    _payload: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> InMemoryClient<Req, Resp> {
    /// Create a client for `collection`, whose identities end in `/{segment}/{name}`.
    pub fn new(
        api: &InMemoryApi,
        collection: &'static str,
        segment: &'static str,
        respond: Responder<Req, Resp>,
    ) -> Self {
        Self {
            api: api.clone(),
            collection,
            segment,
            respond,
            _payload: PhantomData,
        }
    }

    fn record(
        &self,
        address: &ResourceAddress,
        call: fn(String, String, Option<String>, String) -> RecordedCall,
    ) -> Result<(), ApiError> {
        let mut state = self.api.lock();
        state.calls.push(call(
            self.collection.to_string(),
            address.resource_group.clone(),
            address.account_name.clone(),
            address.name.clone(),
        ));
        match state
            .failures
            .get_mut(self.collection)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn key(&self, address: &ResourceAddress) -> Key {
        key(
            self.collection,
            &address.resource_group,
            address.account_name.as_deref(),
            &address.name,
        )
    }
}

fn get_call(collection: String, resource_group: String, account_name: Option<String>, name: String) -> RecordedCall {
    RecordedCall::Get {
        collection,
        resource_group,
        account_name,
        name,
    }
}

fn put_call(collection: String, resource_group: String, account_name: Option<String>, name: String) -> RecordedCall {
    RecordedCall::CreateOrUpdate {
        collection,
        resource_group,
        account_name,
        name,
    }
}

fn delete_call(collection: String, resource_group: String, account_name: Option<String>, name: String) -> RecordedCall {
    RecordedCall::Delete {
        collection,
        resource_group,
        account_name,
        name,
    }
}

fn decode_error(e: serde_json::Error) -> ApiError {
    ApiError::new(500, format!("in-memory payload could not be encoded: {}", e))
}

#[async_trait::async_trait]
impl<Req, Resp> ResourceClient<Req, Resp> for InMemoryClient<Req, Resp>
where
    Req: Serialize + Send + Sync + 'static,
    Resp: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, address: &ResourceAddress) -> Result<Resp, ApiError> {
        self.record(address, get_call)?;
        let response = self
            .api
            .lock()
            .resources
            .get(&self.key(address))
            .map(|stored| stored.response.clone())
            .ok_or_else(|| ApiError::not_found(format!("{} '{}' not found", self.collection, address.name)))?;
        serde_json::from_value(response).map_err(decode_error)
    }

    async fn create_or_update(
        &self,
        address: &ResourceAddress,
        parameters: Req,
    ) -> Result<Resp, ApiError> {
        self.record(address, put_call)?;

        let id = self.api.id_for(self.segment, address);
        let request = serde_json::to_value(&parameters).map_err(decode_error)?;
        let mut response =
            serde_json::to_value((self.respond)(&parameters, id)).map_err(decode_error)?;

        let mut state = self.api.lock();
        if state.omit_ids.contains(self.collection) {
            if let Value::Object(map) = &mut response {
                map.remove("id");
            }
        }
        state.resources.insert(
            self.key(address),
            Stored {
                request,
                response: response.clone(),
            },
        );
        drop(state);

        serde_json::from_value(response).map_err(decode_error)
    }

    async fn delete(&self, address: &ResourceAddress) -> Result<(), ApiError> {
        self.record(address, delete_call)?;
        match self.api.lock().resources.remove(&self.key(address)) {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!(
                "{} '{}' not found",
                self.collection, address.name
            ))),
        }
    }
}

impl InMemoryClient<AccountCreateOrUpdateParameters, Account> {
    /// Automation account collection.
    pub fn accounts(api: &InMemoryApi) -> Self {
        Self::new(api, ACCOUNTS, AUTOMATION_ACCOUNTS, |p, id| Account {
            id: Some(id),
            name: Some(p.name.clone()),
            location: Some(p.location.clone()),
            tags: p.tags.clone(),
            properties: AccountProperties {
                sku: Some(p.properties.sku.clone()),
                state: Some("Ok".to_string()),
            },
        })
    }
}

impl InMemoryClient<CredentialCreateOrUpdateParameters, Credential> {
    /// Credential collection. Passwords are accepted but never returned.
    pub fn credentials(api: &InMemoryApi) -> Self {
        Self::new(api, CREDENTIALS, CREDENTIALS, |p, id| Credential {
            id: Some(id),
            name: Some(p.name.clone()),
            properties: CredentialProperties {
                user_name: Some(p.properties.user_name.clone()),
                description: p.properties.description.clone(),
            },
        })
    }
}

impl InMemoryClient<RunbookCreateOrUpdateParameters, Runbook> {
    /// Runbook collection.
    pub fn runbooks(api: &InMemoryApi) -> Self {
        Self::new(api, RUNBOOKS, RUNBOOKS, |p, id| Runbook {
            id: Some(id),
            name: Some(p.name.clone()),
            location: Some(p.location.clone()),
            tags: p.tags.clone(),
            properties: RunbookProperties {
                runbook_type: Some(p.properties.runbook_type.clone()),
                log_progress: Some(p.properties.log_progress),
                log_verbose: Some(p.properties.log_verbose),
                description: Some(p.properties.description.clone()),
                publish_content_link: Some(p.properties.publish_content_link.clone()),
            },
        })
    }
}

impl InMemoryClient<ScheduleCreateOrUpdateParameters, Schedule> {
    /// Schedule collection.
    pub fn schedules(api: &InMemoryApi) -> Self {
        Self::new(api, SCHEDULES, SCHEDULES, |p, id| Schedule {
            id: Some(id),
            name: Some(p.name.clone()),
            properties: ScheduleProperties {
                description: p.properties.description.clone(),
                start_time: p.properties.start_time.clone(),
                expiry_time: p.properties.expiry_time.clone(),
                interval: p.properties.interval.clone(),
                frequency: Some(p.properties.frequency.clone()),
            },
        })
    }
}

/// Clients for every resource kind, all backed by `api`.
pub fn in_memory_clients(api: &InMemoryApi) -> AutomationClients {
    AutomationClients {
        accounts: Arc::new(InMemoryClient::accounts(api)),
        credentials: Arc::new(InMemoryClient::credentials(api)),
        runbooks: Arc::new(InMemoryClient::runbooks(api)),
        schedules: Arc::new(InMemoryClient::schedules(api)),
    }
}

/// A test harness for provider implementations.
///
/// Wraps a [`ProviderService`] and offers the plan/apply sequences the
/// orchestration engine would run.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, None, proposed_state).await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), proposed_state)
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource. `None` if it no longer exists.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Run a full create lifecycle: plan → create → read.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created_state = self.create(resource_type, plan_result.planned_state).await?;
        self.read_back(resource_type, created_state).await
    }

    /// Run a full update lifecycle: plan → update → read.
    ///
    /// Fails if the plan requires replacement.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        if plan_result.requires_replace {
            return Err(ProviderError::Validation(format!(
                "{} cannot be updated in place: {:?}",
                resource_type,
                plan_result.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
            )));
        }
        if plan_result.changes.is_empty() {
            return Ok(plan_result.planned_state);
        }

        let updated_state = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;
        self.read_back(resource_type, updated_state).await
    }

    /// Run a full delete lifecycle: plan → delete.
    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;
        let updated_state = self
            .lifecycle_update(resource_type, created_state, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated_state.clone())
            .await?;
        Ok(updated_state)
    }

    async fn read_back(&self, resource_type: &str, state: Value) -> Result<Value, ProviderError> {
        self.read(resource_type, state).await?.ok_or_else(|| {
            ProviderError::NotFound(format!("{} vanished after apply", resource_type))
        })
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan has changes that can be applied in place.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(!plan.changes.is_empty(), "Expected plan to have changes, but got no changes");
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error whose summary or detail contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let matches = |d: &&Diagnostic| {
        d.is_error()
            && (d.summary.contains(substring)
                || d.detail.as_deref().is_some_and(|detail| detail.contains(substring)))
    };
    assert!(
        diagnostics.iter().any(|d| matches(&d)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AutomationProvider;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn tester() -> (ProviderTester<AutomationProvider>, InMemoryApi) {
        let api = InMemoryApi::new("sub-1");
        (
            ProviderTester::new(AutomationProvider::new(in_memory_clients(&api))),
            api,
        )
    }

    fn schedule(interval: i64) -> Value {
        json!({
            "name": "nightly",
            "account_name": "acct1",
            "resource_group_name": "rg",
            "frequency": "Day",
            "interval": interval,
            "start_time": "2030-01-01T02:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_in_memory_client_issues_child_ids() {
        let api = InMemoryApi::new("sub-1");
        let client = InMemoryClient::schedules(&api);
        let address = ResourceAddress::child("rg", "acct1", "nightly");

        let err = assert_err!(client.get(&address).await);
        assert!(err.is_not_found());

        let params = ScheduleCreateOrUpdateParameters {
            name: "nightly".to_string(),
            properties: crate::models::ScheduleCreateOrUpdateProperties {
                description: None,
                start_time: None,
                expiry_time: None,
                interval: [("day".to_string(), 1)].into_iter().collect(),
                frequency: "Day".to_string(),
            },
        };
        let created = assert_ok!(client.create_or_update(&address, params).await);
        assert_eq!(
            created.id.as_deref(),
            Some("/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Automation/automationAccounts/acct1/schedules/nightly")
        );

        // Lookups ignore case.
        let fetched = assert_ok!(client.get(&ResourceAddress::child("RG", "ACCT1", "Nightly")).await);
        assert_eq!(fetched, created);

        assert_ok!(client.delete(&address).await);
        assert!(assert_err!(client.delete(&address).await).is_not_found());
        assert_eq!(api.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let api = InMemoryApi::new("sub-1");
        let client = InMemoryClient::accounts(&api);
        let address = ResourceAddress::account("rg", "acct1");

        api.fail_next(ACCOUNTS, ApiError::new(429, "throttled"));
        assert_eq!(assert_err!(client.get(&address).await).status, 429);
        assert!(assert_err!(client.get(&address).await).is_not_found());
    }

    #[tokio::test]
    async fn test_tester_resource_types() {
        let (tester, _api) = tester();
        assert_eq!(tester.resource_types().len(), 4);
        assert!(tester.schema().resources.contains_key("azurerm_automation_schedule"));
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let (tester, _api) = tester();
        assert_ok!(tester.configure(json!({"subscription_id": "sub-1"})).await);
        let config = tester.provider().config().await.unwrap();
        assert_eq!(config.subscription_id, "sub-1");
        assert_ok!(tester.validate_provider_config(json!({"subscription_id": "sub-1"})).await);
    }

    #[tokio::test]
    async fn test_tester_validate_resource_config_reports_diagnostics() {
        let (tester, _api) = tester();
        let err = tester
            .validate_resource_config("azurerm_automation_schedule", schedule(0))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diags) => assert_error_contains(&diags, "interval"),
            other => panic!("expected diagnostics, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_tester_interval_change_updates_in_place() {
        let (tester, _api) = tester();
        let state = tester
            .lifecycle_create("azurerm_automation_schedule", schedule(1))
            .await
            .unwrap();

        let plan = tester
            .plan_update("azurerm_automation_schedule", state, schedule(3))
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);
        assert_plan_changes_attribute(&plan, "interval");
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let (tester, api) = tester();
        let final_state = tester
            .lifecycle_crud("azurerm_automation_schedule", schedule(1), schedule(3))
            .await
            .unwrap();

        assert_eq!(final_state["interval"], 3);
        assert!(!api.contains("schedules", "rg", Some("acct1"), "nightly"));
    }

    #[tokio::test]
    async fn test_tester_lifecycle_update_without_changes() {
        let (tester, api) = tester();
        let state = tester
            .lifecycle_create("azurerm_automation_schedule", schedule(1))
            .await
            .unwrap();
        let calls = api.calls().len();

        let plan = tester
            .plan_update("azurerm_automation_schedule", state.clone(), schedule(1))
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let same = tester
            .lifecycle_update("azurerm_automation_schedule", state.clone(), schedule(1))
            .await
            .unwrap();
        assert_eq!(same, state);
        assert_eq!(api.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_update_refuses_replacement() {
        let (tester, _api) = tester();
        let state = tester
            .lifecycle_create("azurerm_automation_schedule", schedule(1))
            .await
            .unwrap();

        let mut proposed = schedule(1);
        proposed["name"] = json!("hourly");
        let plan = tester
            .plan_update("azurerm_automation_schedule", state.clone(), proposed.clone())
            .await
            .unwrap();
        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "name");

        let err = tester
            .lifecycle_update("azurerm_automation_schedule", state, proposed)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("sku"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("sku"));
        assert!(display.contains("More info"));
    }
}
