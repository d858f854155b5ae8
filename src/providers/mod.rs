//! Provider registry: mapping logical capabilities to concrete workers.

mod registry;

pub use registry::{
    Capability, CredentialKey, Credentials, ProviderRegistry, ProviderSpec, RegistryError,
};
