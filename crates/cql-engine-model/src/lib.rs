//! CQL data model abstraction
//!
//! This crate provides:
//! - ModelInfo abstraction for FHIR and other data models
//! - Version-agnostic FHIR support
//! - Data provider and retriever traits

pub mod fhir;
pub mod model_info;
pub mod provider;
pub mod registry;
pub mod retriever;

pub use model_info::*;
pub use provider::*;
pub use registry::ModelRegistry;
pub use retriever::{json_to_cql_value, JsonDataRetriever, NoOpDataRetriever};
