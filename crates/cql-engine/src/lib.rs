//! Clinical Quality Language (CQL) implementation for Rust
//!
//! This crate provides a complete CQL 1.5 implementation including:
//! - Parsing CQL expressions and libraries
//! - Type checking and semantic analysis
//! - ELM (Expression Logical Model) output
//! - Expression evaluation
//! - Version-agnostic FHIR support
//!
//! # Example
//!
//! ```ignore
//! use cql_engine::parse;
//!
//! let cql = r#"
//! library Example version '1.0.0'
//!
//! define InPopulation:
//!     AgeInYears() >= 18
//! "#;
//!
//! let library = parse(cql)?;
//! ```

// Re-export all public APIs from internal crates
pub use cql_engine_ast as ast;
pub use cql_engine_diagnostics as diagnostics;
pub use cql_engine_elm as elm;
pub use cql_engine_eval as eval;
pub use cql_engine_model as model;
pub use cql_engine_parser as parser;
pub use cql_engine_types as types;

// Convenience re-exports
pub use cql_engine_ast::{Expression, Library};
pub use cql_engine_diagnostics::{CqlError, Result};
pub use cql_engine_parser::parse;

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
