//! Terminology integration
//!
//! This module provides integration with octofhir-fhir-model's TerminologyProvider
//! for CQL terminology operations (InValueSet, InCodeSystem, etc.)

use crate::context::TerminologyProvider as EvalTerminologyProvider;
use cql_engine_types::{CqlCode, CqlConcept, CqlValue};
use octofhir_fhir_model::TerminologyProvider as FhirTerminologyProvider;
use std::sync::Arc;

/// Adapter that wraps a FHIR TerminologyProvider to implement the eval crate's TerminologyProvider trait
pub struct TerminologyAdapter {
    provider: Arc<dyn FhirTerminologyProvider>,
}

impl TerminologyAdapter {
    /// Create a new adapter for a FHIR TerminologyProvider
    pub fn new(provider: Arc<dyn FhirTerminologyProvider>) -> Self {
        Self { provider }
    }

    /// Get the underlying FHIR terminology provider
    pub fn inner(&self) -> &Arc<dyn FhirTerminologyProvider> {
        &self.provider
    }
}

/// Collect every `CqlCode` carried by a value: a single `Code`, all of a
/// `Concept`'s codes, or (flattened) all codes of a `List<Code>`/
/// `List<Concept>`. Returns `None` when the value isn't code-shaped at all.
fn extract_codes(value: &CqlValue) -> Option<Vec<&CqlCode>> {
    match value {
        CqlValue::Code(c) => Some(vec![c]),
        CqlValue::Concept(concept) => Some(concept.codes.iter().collect()),
        CqlValue::List(list) => {
            let mut codes = Vec::new();
            for item in list.iter() {
                match item {
                    CqlValue::Code(c) => codes.push(c),
                    CqlValue::Concept(concept) => codes.extend(concept.codes.iter()),
                    _ => return None,
                }
            }
            Some(codes)
        }
        _ => None,
    }
}

impl EvalTerminologyProvider for TerminologyAdapter {
    fn in_value_set(&self, code: &CqlValue, value_set_id: &str) -> Option<bool> {
        log::debug!("checking membership in value set {value_set_id}");
        let codes = extract_codes(code)?;

        // "X in ValueSet" is true iff any of X's codes is a member; if none
        // are members but at least one membership check was undetermined,
        // the overall result is undetermined rather than false.
        let mut any_undetermined = false;
        for cql_code in codes {
            let code_str = &cql_code.code;
            let system = Some(cql_code.system.as_str());
            let display = cql_code.display.as_deref();

            let result = tokio::runtime::Handle::try_current()
                .ok()
                .and_then(|handle| {
                    handle.block_on(async {
                        self.provider
                            .validate_code_vs(value_set_id, system, code_str, display)
                            .await
                            .inspect_err(|err| {
                                log::warn!("value set validation for {value_set_id} failed: {err}");
                            })
                            .ok()
                    })
                })
                .map(|validation_result| validation_result.result);

            match result {
                Some(true) => return Some(true),
                Some(false) => {}
                None => {
                    log::warn!("membership of {code_str} in {value_set_id} is undetermined");
                    any_undetermined = true;
                }
            }
        }

        if any_undetermined { None } else { Some(false) }
    }

    fn in_code_system(&self, code: &CqlValue, code_system_id: &str) -> Option<bool> {
        log::debug!("checking membership in code system {code_system_id}");
        let codes = extract_codes(code)?;
        Some(codes.iter().any(|c| c.system == code_system_id))
    }

    fn expand_value_set(&self, value_set_id: &str) -> Option<Vec<CqlValue>> {
        // Call the FHIR terminology provider to expand the value set
        let result = tokio::runtime::Handle::try_current()
            .ok()
            .and_then(|handle| {
                handle.block_on(async {
                    self.provider
                        .expand_valueset(value_set_id, None)
                        .await
                        .ok()
                })
            });

        result.map(|expansion| {
            expansion
                .contains
                .into_iter()
                .map(|concept| {
                    CqlValue::Code(CqlCode {
                        system: concept.system.unwrap_or_default(),
                        version: None,
                        code: concept.code,
                        display: concept.display,
                    })
                })
                .collect()
        })
    }

    fn lookup_display(&self, code: &CqlValue) -> Option<String> {
        // Extract code from CqlValue
        let cql_code = match code {
            CqlValue::Code(c) => c,
            CqlValue::Concept(concept) => concept.codes.first()?,
            _ => return None,
        };

        // If the code already has a display, return it
        if let Some(ref display) = cql_code.display {
            return Some(display.clone());
        }

        // Otherwise, try to look it up
        let system = &cql_code.system;
        let code_str = &cql_code.code;
        let version = cql_code.version.as_deref();

        let result = tokio::runtime::Handle::try_current()
            .ok()
            .and_then(|handle| {
                handle.block_on(async {
                    self.provider
                        .lookup_code(system, code_str, version, None)
                        .await
                        .ok()
                })
            });

        result.and_then(|lookup_result| lookup_result.display)
    }
}
