pub mod client;
pub mod config;
#[cfg(test)]
pub mod mock;
pub mod opensearch;
pub mod provisioner;
pub mod schema;

pub use client::{IndexName, SharedSearchClient};
pub use config::SearchConfig;
pub use opensearch::OpenSearchClient;
pub use provisioner::IndexProvisioner;
