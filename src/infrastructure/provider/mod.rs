//! Provider infrastructure
//!
//! # Structure
//! - `registry` - provider table, key resolution and adapter loading
//! - `factory` - per-request adapter construction
//! - `traits` - the `ProviderAdapter` trait
//! - `types` - model listing and filtering
//! - `error` - registry and adapter errors
//! - `adapters` - vendor implementations

pub mod adapters;
pub mod error;
pub mod factory;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{AdapterError, RegistryError, Unavailability};
pub use factory::{AdapterFactory, AdapterRuntime};
pub use registry::{AdapterKind, ProviderDescriptor, ProviderRegistry};
pub use traits::ProviderAdapter;
pub use types::{ModelFilter, ModelListing};
