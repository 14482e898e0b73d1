pub mod configuration;
pub mod credentials;
pub mod monarch;
pub mod network;
pub mod reachability;
pub mod telemetry;
pub mod trust_store;

// Re-exports for convenience
pub use credentials::KeyringTokenStore;
pub use monarch::{MonarchClient, MonarchConnector};
pub use reachability::HttpReachabilityProbe;
