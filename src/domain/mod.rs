// Domain layer - Core data types
pub mod correlation;
pub mod dataset;
