// Application layer - Use cases and repository contracts
pub mod correlation_engine;
pub mod correlation_service;
pub mod dataset_service;
pub mod error;
pub mod extraction;
pub mod repositories;
