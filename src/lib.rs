pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigLoader, ContainerConfig};
pub use errors::{ConfigError, ContainerError};
pub use infrastructure::container::{
    ContainerStats, Implements, Initializer, Injectable, Injector, ServiceContainer,
    ServiceDescriptor, ServiceIdentity, ServiceLifetime, DEFAULT_KEY,
};
