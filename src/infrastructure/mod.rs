// Infrastructure layer - Adapters and backing-store implementations
pub mod config;
pub mod http_response;
pub mod memory_store;
pub mod payload;
