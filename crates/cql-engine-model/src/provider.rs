//! Contracts an external data model and its retrieval backend must satisfy.
//!
//! `ModelProvider` answers structural questions about a `using`-declared data
//! model (its types, their fields, and which types are retrievable). It is
//! backed by a parsed [`ModelInfo`](crate::model_info::ModelInfo) via
//! [`ModelRegistry`](crate::registry::ModelRegistry), but the trait lets the
//! analyzer and retrieval adapter stay agnostic of that representation.
//!
//! `DataRetriever` is the patient-data side: given a resource type and
//! optional code/date filters, it returns the matching records as `Named`
//! values. The evaluation engine never talks to a `DataRetriever` directly;
//! it goes through `cql_engine_eval::retrieve::DataRetrieverAdapter`, which
//! adapts this trait to the engine's own `DataProvider` trait.

use crate::model_info::{PropertyInfo, TypeInfo};
use async_trait::async_trait;
use cql_engine_types::{CqlCode, CqlInterval, CqlValue};

/// Structural introspection over a `using`-declared data model.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Look up a declared type by name.
    async fn get_type(&self, type_name: &str) -> Result<Option<TypeInfo>, ModelProviderError>;

    /// Look up a property on a type, walking the base-type chain.
    async fn get_property_type(
        &self,
        parent: &str,
        property: &str,
    ) -> Result<Option<PropertyInfo>, ModelProviderError>;

    /// Whether `type_name` can appear in a `[TypeName: ...]` retrieve.
    fn is_retrievable(&self, type_name: &str) -> bool;

    /// The property path used for code-based retrieve filtering, if any.
    fn get_primary_code_path(&self, type_name: &str) -> Option<String>;
}

/// Errors raised while resolving or parsing a data model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelProviderError {
    #[error("failed to parse model info: {0}")]
    ParseError(String),

    #[error("I/O error loading model info: {0}")]
    IoError(String),

    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Retrieves patient records of a given resource type for the current context.
///
/// Implementations own the actual connection to whatever backs the data
/// model (a FHIR server, an in-memory bundle, a database). Code and date
/// filters are advisory: an implementation that cannot push a filter down
/// returns the unfiltered set and lets the engine filter in memory.
#[async_trait]
pub trait DataRetriever: Send + Sync {
    /// Retrieve records of `data_type` for `context` (e.g. a patient id).
    ///
    /// `code_path` names the property to filter on; `codes` and `value_set`
    /// are mutually informative ways of expressing which codes are wanted.
    /// `date_path`/`date_range` filter on a temporal property.
    async fn retrieve(
        &self,
        context: &str,
        data_type: &str,
        code_path: Option<&str>,
        codes: Option<&[CqlCode]>,
        value_set: Option<&str>,
        date_path: Option<&str>,
        date_range: Option<&CqlInterval>,
    ) -> Result<Vec<CqlValue>, DataRetrieverError>;
}

/// Errors raised while retrieving records.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DataRetrieverError {
    #[error("retrieve failed: {0}")]
    RetrieveFailed(String),

    #[error("unknown resource type: {0}")]
    UnknownType(String),

    #[error("I/O error: {0}")]
    Io(String),
}
