//! The reconciliation contract shared by every Automation resource.
//!
//! A [`ResourceKind`] describes one resource type: its schema, how to address
//! it, and the Expand/Flatten pair converting between the typed configuration
//! and the remote payload. [`Reconciler`] drives the create-or-update, read
//! and delete sequences for any kind on top of an injected
//! [`ResourceClient`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::{ApiError, ResourceAddress, ResourceClient};
use crate::error::{Operation, ProviderError};
use crate::identity::ResourceId;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

/// One kind of Automation resource.
pub trait ResourceKind: Send + Sync + 'static {
    /// Resource type name as used in configuration, e.g. `azurerm_automation_runbook`.
    const TYPE_NAME: &'static str;
    /// Human readable name used in messages, e.g. `Automation Runbook`.
    const DISPLAY_NAME: &'static str;

    /// Typed declared configuration.
    type Config: Serialize + DeserializeOwned + Clone + Send + Sync;
    /// Create-or-update payload.
    type Request: Send + Sync;
    /// Remote representation returned by `get`.
    type Response: Send + Sync;

    /// Schema the declared configuration is validated against.
    fn schema() -> Schema;

    /// Checks that go beyond what the schema can express.
    fn validate(config: &Self::Config) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Address of the resource described by `config`.
    fn address(config: &Self::Config) -> ResourceAddress;

    /// Recover the address from a remote-issued identity.
    fn address_from_id(id: &ResourceId) -> Result<ResourceAddress, ProviderError>;

    /// Map declared configuration onto the remote payload.
    fn expand(config: &Self::Config) -> Self::Request;

    /// Identity carried by a remote response, if any.
    fn response_id(response: &Self::Response) -> Option<&str>;

    /// Map a remote response back onto declared configuration.
    ///
    /// `prior` is the locally held configuration, used for attributes the
    /// remote API never returns.
    fn flatten(
        response: &Self::Response,
        address: &ResourceAddress,
        prior: Option<&Self::Config>,
    ) -> Result<Self::Config, ProviderError>;
}

/// Persisted state of a resource: its identity plus the flattened configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<C> {
    /// Remote-issued identity.
    pub id: String,
    /// Flattened configuration.
    #[serde(flatten)]
    pub config: C,
}

/// Validate and decode declared configuration for kind `K`.
pub fn decode_config<K: ResourceKind>(value: &Value) -> Result<K::Config, ProviderError> {
    validation::into_result(validation::validate(&K::schema(), value))?;
    let config: K::Config = serde_json::from_value(value.clone())
        .map_err(|e| ProviderError::Validation(format!("{}: {}", K::TYPE_NAME, e)))?;
    validation::into_result(K::validate(&config))?;
    Ok(config)
}

/// Drives the reconciliation sequences for one resource kind.
pub struct Reconciler<K: ResourceKind> {
    client: Arc<dyn ResourceClient<K::Request, K::Response>>,
    _kind: PhantomData<K>,
}

impl<K: ResourceKind> Clone for Reconciler<K> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            _kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> Reconciler<K> {
    /// Create a reconciler on top of `client`.
    pub fn new(client: Arc<dyn ResourceClient<K::Request, K::Response>>) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// Create the resource or update it in place, then read back canonical state.
    #[instrument(skip_all, fields(resource = K::TYPE_NAME))]
    pub async fn create_or_update(
        &self,
        config: &K::Config,
    ) -> Result<ResourceState<K::Config>, ProviderError> {
        let declared = serde_json::to_value(config)?;
        validation::into_result(validation::validate(&K::schema(), &declared))?;
        validation::into_result(K::validate(config))?;

        let address = K::address(config);
        info!(name = %address.name, resource_group = %address.resource_group, "preparing arguments for {} creation", K::DISPLAY_NAME);

        let parameters = K::expand(config);
        debug!("submitting create-or-update request");
        self.client
            .create_or_update(&address, parameters)
            .await
            .map_err(|e| remote_error::<K>(Operation::CreateOrUpdate, &address, e))?;

        let created = self
            .client
            .get(&address)
            .await
            .map_err(|e| remote_error::<K>(Operation::Read, &address, e))?;
        let id = K::response_id(&created)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::IdentityMissing {
                resource: K::DISPLAY_NAME,
                name: address.name.clone(),
                resource_group: address.resource_group.clone(),
            })?
            .to_string();

        self.read(&id, Some(config)).await?.ok_or_else(|| {
            ProviderError::NotFound(format!(
                "{} '{}' disappeared right after it was created",
                K::DISPLAY_NAME,
                address.name
            ))
        })
    }

    /// Read the resource addressed by `id`.
    ///
    /// Returns `Ok(None)` when the remote API reports the resource as gone;
    /// the caller should drop it from state.
    #[instrument(skip_all, fields(resource = K::TYPE_NAME, id = %id))]
    pub async fn read(
        &self,
        id: &str,
        prior: Option<&K::Config>,
    ) -> Result<Option<ResourceState<K::Config>>, ProviderError> {
        let parsed = ResourceId::parse(id)?;
        let address = K::address_from_id(&parsed)?;

        let response = match self.client.get(&address).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                warn!(name = %address.name, "{} no longer exists, removing from state", K::DISPLAY_NAME);
                return Ok(None);
            },
            Err(e) => return Err(remote_error::<K>(Operation::Read, &address, e)),
        };

        let config = K::flatten(&response, &address, prior)?;
        Ok(Some(ResourceState {
            id: id.to_string(),
            config,
        }))
    }

    /// Delete the resource addressed by `id`. Deleting a missing resource succeeds.
    #[instrument(skip_all, fields(resource = K::TYPE_NAME, id = %id))]
    pub async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let parsed = ResourceId::parse(id)?;
        let address = K::address_from_id(&parsed)?;

        match self.client.delete(&address).await {
            Ok(()) => {
                info!(name = %address.name, "deleted {}", K::DISPLAY_NAME);
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                debug!(name = %address.name, "{} already deleted", K::DISPLAY_NAME);
                Ok(())
            },
            Err(e) => Err(remote_error::<K>(Operation::Delete, &address, e)),
        }
    }
}

fn remote_error<K: ResourceKind>(
    operation: Operation,
    address: &ResourceAddress,
    source: ApiError,
) -> ProviderError {
    ProviderError::RemoteCall {
        operation,
        resource: K::DISPLAY_NAME,
        name: address.name.clone(),
        resource_group: address.resource_group.clone(),
        source,
    }
}
