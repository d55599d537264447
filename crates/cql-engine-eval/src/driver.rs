//! Library loader and context driver.
//!
//! Sits above [`crate::engine::CqlEngine`]: given a set of already-parsed
//! libraries (parsing and analysis are out of scope for this crate) and
//! their `include` relationships, orders them topologically and drives one
//! fresh [`EvaluationContext`] per context value (e.g. per patient) through
//! each library in turn, collecting a result bundle keyed by
//! (library, definition, context key).

use crate::context::{DataProvider, EvaluationContext, TerminologyProvider};
use crate::engine::CqlEngine;
use crate::error::EvalError;
use chrono::{DateTime, FixedOffset};
use cql_engine_elm::Library;
use cql_engine_types::CqlValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One (library, definition, context key) entry in a [`ResultBundle`].
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub library: String,
    pub definition: String,
    pub context_key: String,
    pub result: Result<CqlValue, EvalError>,
}

/// The output of a driver run: every definition evaluated for every context key.
#[derive(Debug, Default)]
pub struct ResultBundle {
    pub entries: Vec<BundleEntry>,
}

impl ResultBundle {
    pub fn get(&self, library: &str, definition: &str, context_key: &str) -> Option<&BundleEntry> {
        self.entries
            .iter()
            .find(|e| e.library == library && e.definition == definition && e.context_key == context_key)
    }
}

/// Drives evaluation of a library graph across a set of context values.
pub struct LibraryDriver {
    engine: CqlEngine,
    libraries: Vec<Arc<Library>>,
    data_provider: Option<Arc<dyn DataProvider>>,
    terminology_provider: Option<Arc<dyn TerminologyProvider>>,
    parameters: HashMap<String, CqlValue>,
    evaluation_timestamp: Option<DateTime<FixedOffset>>,
}

impl LibraryDriver {
    pub fn new(libraries: Vec<Arc<Library>>) -> Self {
        Self {
            engine: CqlEngine::new(),
            libraries,
            data_provider: None,
            terminology_provider: None,
            parameters: HashMap::new(),
            evaluation_timestamp: None,
        }
    }

    pub fn with_engine(mut self, engine: CqlEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.data_provider = Some(provider);
        self
    }

    pub fn with_terminology_provider(mut self, provider: Arc<dyn TerminologyProvider>) -> Self {
        self.terminology_provider = Some(provider);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: CqlValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.evaluation_timestamp = Some(timestamp);
        self
    }

    /// Topologically sort libraries by their `include` declarations (Kahn's
    /// algorithm). Returns an error naming the cycle if one exists.
    fn topological_order(&self) -> Result<Vec<Arc<Library>>, EvalError> {
        let index_by_id: HashMap<&str, usize> = self
            .libraries
            .iter()
            .enumerate()
            .map(|(i, lib)| (lib.identifier.id.as_str(), i))
            .collect();

        let mut in_degree = vec![0usize; self.libraries.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.libraries.len()];

        for (i, lib) in self.libraries.iter().enumerate() {
            if let Some(includes) = &lib.includes {
                for include in &includes.defs {
                    if let Some(&dep_idx) = index_by_id.get(include.path.as_str()) {
                        dependents[dep_idx].push(i);
                        in_degree[i] += 1;
                    }
                    // Includes of libraries not present in this driver's set
                    // are assumed already resolved (e.g. a shared model
                    // library loaded once and referenced by id elsewhere).
                }
            }
        }

        let mut queue: Vec<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut ordered = Vec::with_capacity(self.libraries.len());
        let mut visited = HashSet::new();

        while let Some(idx) = queue.pop() {
            if !visited.insert(idx) {
                continue;
            }
            ordered.push(self.libraries[idx].clone());
            for &dependent in &dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if ordered.len() != self.libraries.len() {
            return Err(EvalError::LibraryCycle);
        }

        Ok(ordered)
    }

    /// Run every library, in dependency order, once per context key.
    ///
    /// `context_type` is the CQL context name (commonly `"Patient"`);
    /// `context_values` is one value per entity the caller wants results for
    /// (e.g. one per patient), each paired with the key used to label bundle
    /// entries (e.g. the patient id).
    pub fn run(
        &self,
        context_type: &str,
        context_values: &[(String, CqlValue)],
    ) -> Result<ResultBundle, EvalError> {
        let order = self.topological_order()?;
        let mut bundle = ResultBundle::default();

        for (context_key, context_value) in context_values {
            for library in &order {
                log::debug!(
                    "loading library {} for context key {context_key}",
                    library.identifier.id
                );
                let mut ctx = EvaluationContext::new()
                    .with_context(context_type.to_string(), context_value.clone())
                    .with_library(library.clone());

                if let Some(ts) = self.evaluation_timestamp {
                    ctx = ctx.with_timestamp(ts);
                }
                if let Some(provider) = &self.data_provider {
                    ctx = ctx.with_data_provider(provider.clone());
                }
                if let Some(provider) = &self.terminology_provider {
                    ctx = ctx.with_terminology_provider(provider.clone());
                }
                for (name, value) in &self.parameters {
                    ctx.set_parameter(name.clone(), value.clone());
                }

                // Each definition's result is independent: one failing
                // definition doesn't discard its already-computed siblings.
                for (definition, result) in self.engine.evaluate_library(library, &mut ctx) {
                    bundle.entries.push(BundleEntry {
                        library: library.identifier.id.clone(),
                        definition,
                        context_key: context_key.clone(),
                        result,
                    });
                }
            }
        }

        Ok(bundle)
    }
}
