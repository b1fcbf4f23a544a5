//! Hemmer Provider for Azure Automation
//!
//! Reconciles declared configuration for four Azure Automation resources
//! against the Azure Automation REST API:
//!
//! - `azurerm_automation_account`
//! - `azurerm_automation_credential`
//! - `azurerm_automation_runbook`
//! - `azurerm_automation_schedule`
//!
//! # Overview
//!
//! Each resource is a [`reconciler::ResourceKind`]: a schema, an
//! Expand/Flatten pair mapping declared configuration to and from the wire
//! payload, and the addressing rules that recover a resource's location from
//! its ARM identity. A generic [`Reconciler`] runs the create-or-update, read
//! and delete sequences for every kind on top of an injected
//! [`client::ResourceClient`].
//!
//! [`AutomationProvider`] bundles the four reconcilers behind the
//! [`ProviderService`] trait the orchestration engine drives. State crosses
//! that boundary as JSON: the remote-issued `id` plus the flattened
//! configuration.
//!
//! # Quick Start
//!
//! ```ignore
//! use hemmer_provider_azure_automation::{
//!     init_logging, AutomationClients, AutomationProvider, ProviderService,
//! };
//! use serde_json::json;
//!
//! let clients: AutomationClients = build_clients(&credentials);
//! let provider = AutomationProvider::new(clients);
//! provider.configure(json!({"subscription_id": subscription})).await?;
//!
//! let state = provider
//!     .create("azurerm_automation_account", json!({
//!         "name": "acct1",
//!         "location": "westus",
//!         "resource_group_name": "rg",
//!         "sku": [{"name": "Basic"}]
//!     }))
//!     .await?;
//! ```
//!
//! # Behavior worth knowing
//!
//! - Reading a resource the API reports as not found yields `None`; deleting
//!   one succeeds.
//! - Credential passwords are write-only. A read keeps the locally held
//!   password, so a password changed outside of this provider goes unnoticed.
//! - Enumerations (sku name, runbook type, schedule frequency) are accepted
//!   in any case and sent with the case they were declared in.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
#[allow(missing_docs)]
pub mod models;
pub mod plan;
pub mod provider;
pub mod reconciler;
#[allow(missing_docs)]
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{ApiError, AutomationClients, ResourceAddress, ResourceClient};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use identity::ResourceId;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::AutomationProvider;
pub use reconciler::{Reconciler, ResourceKind, ResourceState};
pub use resources::ResourceType;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
