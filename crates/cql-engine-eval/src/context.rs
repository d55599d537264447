//! Evaluation context: the mutable state threaded through a single evaluation.
//!
//! An [`EvaluationContext`] carries everything that varies while walking an
//! expression tree but does not belong on [`crate::CqlEngine`] itself: the
//! current context value (e.g. the patient), query scopes (aliases, lets,
//! special identifiers like `$this`), parameters, the external data and
//! terminology providers, a per-(library, definition) result cache, and a
//! recursion guard. The engine is stateless and reentrant; the context is
//! not - each top-level evaluation (one context value, e.g. one patient)
//! gets its own.

use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike};
use cql_engine_elm::Library;
use cql_engine_types::{CqlDate, CqlDateTime, CqlTime, CqlValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Default maximum expression recursion depth before evaluation aborts.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// External record source an [`EvaluationContext`] can retrieve against.
///
/// Implemented by [`crate::retrieve::DataRetrieverAdapter`], which bridges
/// this synchronous trait to an async `cql_engine_model::DataRetriever`.
pub trait DataProvider: Send + Sync {
    /// Retrieve records of `data_type` matching the given filters.
    #[allow(clippy::too_many_arguments)]
    fn retrieve(
        &self,
        data_type: &str,
        context_type: Option<&str>,
        context_value: Option<&CqlValue>,
        template_id: Option<&str>,
        code_property: Option<&str>,
        codes: Option<&CqlValue>,
        date_property: Option<&str>,
        date_range: Option<&CqlValue>,
    ) -> Vec<CqlValue>;

    /// Read a property off an opaque record value returned by `retrieve`.
    fn get_property(&self, resource: &CqlValue, path: &str) -> Option<CqlValue>;
}

/// External terminology source an [`EvaluationContext`] can query.
///
/// Implemented by [`crate::terminology::TerminologyAdapter`], which bridges
/// this synchronous trait to an async `octofhir_fhir_model::TerminologyProvider`.
pub trait TerminologyProvider: Send + Sync {
    /// Whether `code` is a member of the named value set, if determinable.
    fn in_value_set(&self, code: &CqlValue, value_set_id: &str) -> Option<bool>;

    /// Whether `code` belongs to the named code system, if determinable.
    fn in_code_system(&self, code: &CqlValue, code_system_id: &str) -> Option<bool>;

    /// Expand a value set into its member codes, if the provider supports it.
    fn expand_value_set(&self, value_set_id: &str) -> Option<Vec<CqlValue>>;

    /// Look up the display string for a code, if known.
    fn lookup_display(&self, code: &CqlValue) -> Option<String>;
}

/// One level of query scope: aliased sources, `let` bindings, and the
/// special identifiers (`$this`, `$index`, an aggregate's accumulator name)
/// bound while evaluating inside a query clause.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    aliases: HashMap<String, CqlValue>,
    lets: HashMap<String, CqlValue>,
    specials: HashMap<String, CqlValue>,
}

impl Scope {
    fn new() -> Self {
        Self::default()
    }
}

/// Mutable state for one evaluation pass (one library, one context value).
pub struct EvaluationContext {
    /// Name of the `context` declaration currently in effect (e.g. `"Patient"`).
    pub context_type: Option<String>,
    /// The value bound to the current context (e.g. the patient record).
    pub context_value: Option<CqlValue>,

    parameters: HashMap<String, CqlValue>,
    qualified_parameters: HashMap<(String, String), CqlValue>,
    scopes: Vec<Scope>,
    cache: HashMap<String, CqlValue>,
    recursion_depth: usize,
    recursion_limit: usize,
    main_library: Option<Arc<Library>>,
    data_provider: Option<Arc<dyn DataProvider>>,
    terminology_provider: Option<Arc<dyn TerminologyProvider>>,
    evaluation_timestamp: DateTime<FixedOffset>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    /// Create a context with no parameters, providers, or bound context value.
    ///
    /// The evaluation timestamp (what `Now()`/`Today()`/`TimeOfDay()` read)
    /// is fixed at creation time, per CQL's "single instant for the whole
    /// evaluation" rule.
    pub fn new() -> Self {
        Self {
            context_type: None,
            context_value: None,
            parameters: HashMap::new(),
            qualified_parameters: HashMap::new(),
            scopes: vec![Scope::new()],
            cache: HashMap::new(),
            recursion_depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            main_library: None,
            data_provider: None,
            terminology_provider: None,
            evaluation_timestamp: Local::now().fixed_offset(),
        }
    }

    /// Bind the context declaration (e.g. `.with_context("Patient", patient_value)`).
    pub fn with_context(mut self, context_type: impl Into<String>, value: CqlValue) -> Self {
        self.context_type = Some(context_type.into());
        self.context_value = Some(value);
        self
    }

    /// Pin the evaluation timestamp instead of using the creation-time clock.
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.evaluation_timestamp = timestamp;
        self
    }

    /// Attach the main library, enabling unqualified `ExpressionRef` lookups.
    pub fn with_library(mut self, library: Arc<Library>) -> Self {
        self.main_library = Some(library);
        self
    }

    /// Attach the data retriever backing `Retrieve` expressions.
    pub fn with_data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.data_provider = Some(provider);
        self
    }

    /// Attach the terminology provider backing `InValueSet`/`InCodeSystem`.
    pub fn with_terminology_provider(mut self, provider: Arc<dyn TerminologyProvider>) -> Self {
        self.terminology_provider = Some(provider);
        self
    }

    /// Override the default recursion depth limit.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    // -- parameters ----------------------------------------------------

    /// Bind a top-level (unqualified) parameter value.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: CqlValue) {
        self.parameters.insert(name.into(), value);
    }

    /// Bind a parameter value qualified by the library that declares it.
    pub fn set_parameter_qualified(
        &mut self,
        library_name: impl Into<String>,
        name: impl Into<String>,
        value: CqlValue,
    ) {
        self.qualified_parameters
            .insert((library_name.into(), name.into()), value);
    }

    /// Look up an unqualified parameter.
    pub fn get_parameter(&self, name: &str) -> Option<&CqlValue> {
        self.parameters.get(name)
    }

    /// Look up a parameter, optionally qualified by library name.
    ///
    /// Falls back to the unqualified parameter map when `library_name` is
    /// `None`, matching how a `ParameterRef` inside its own defining library
    /// omits the qualifier.
    pub fn get_parameter_qualified(
        &self,
        library_name: Option<&str>,
        name: &str,
    ) -> Option<&CqlValue> {
        match library_name {
            Some(lib) => self
                .qualified_parameters
                .get(&(lib.to_string(), name.to_string()))
                .or_else(|| self.parameters.get(name)),
            None => self.parameters.get(name),
        }
    }

    // -- query scopes ----------------------------------------------------

    /// Push a new, empty scope (entering a query clause or nested source).
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost scope (leaving a query clause).
    ///
    /// A no-op on the root scope, which is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind a query alias (e.g. `from [Condition] C`) in the innermost scope.
    pub fn set_alias(&mut self, name: impl Into<String>, value: CqlValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.aliases.insert(name.into(), value);
        }
    }

    /// Look up a query alias, searching from the innermost scope outward.
    pub fn get_alias(&self, name: &str) -> Option<&CqlValue> {
        self.scopes.iter().rev().find_map(|s| s.aliases.get(name))
    }

    /// Bind a `let` variable in the innermost scope.
    pub fn set_let(&mut self, name: impl Into<String>, value: CqlValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.lets.insert(name.into(), value);
        }
    }

    /// Look up a `let` variable, searching from the innermost scope outward.
    pub fn get_let(&self, name: &str) -> Option<&CqlValue> {
        self.scopes.iter().rev().find_map(|s| s.lets.get(name))
    }

    /// Bind a special identifier (`$this`, `$index`, an aggregate accumulator).
    pub fn set_special(&mut self, name: impl Into<String>, value: CqlValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.specials.insert(name.into(), value);
        }
    }

    /// Look up a special identifier, searching from the innermost scope outward.
    pub fn get_special(&self, name: &str) -> Option<&CqlValue> {
        self.scopes.iter().rev().find_map(|s| s.specials.get(name))
    }

    // -- caching ---------------------------------------------------------

    /// Fetch a cached definition result, if evaluated earlier in this pass.
    pub fn get_cached(&self, key: &str) -> Option<CqlValue> {
        let hit = self.cache.get(key).cloned();
        if hit.is_some() {
            log::trace!("cache hit for {key}");
        } else {
            log::trace!("cache miss for {key}");
        }
        hit
    }

    /// Record a definition result under `key` (typically `library:name`).
    ///
    /// Caching is per-context-pass: a fresh `EvaluationContext` per context
    /// value (e.g. per patient) keeps results from leaking across patients,
    /// while still giving at-most-once evaluation per (library, definition)
    /// within a single patient's pass.
    pub fn cache_result(&mut self, key: impl Into<String>, value: CqlValue) {
        let key = key.into();
        log::trace!("caching result for {key}");
        self.cache.insert(key, value);
    }

    // -- recursion guard ---------------------------------------------------

    /// Enter one level of expression recursion; `false` if the limit is hit.
    pub fn enter_recursion(&mut self) -> bool {
        if self.recursion_depth >= self.recursion_limit {
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    /// Leave one level of expression recursion.
    pub fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    // -- providers ---------------------------------------------------------

    /// The attached data provider, if any.
    pub fn data_provider(&self) -> Option<&Arc<dyn DataProvider>> {
        self.data_provider.as_ref()
    }

    /// The attached terminology provider, if any.
    pub fn terminology_provider(&self) -> Option<&Arc<dyn TerminologyProvider>> {
        self.terminology_provider.as_ref()
    }

    /// The main library, if attached, for resolving unqualified references.
    pub fn main_library_arc(&self) -> Option<Arc<Library>> {
        self.main_library.clone()
    }

    // -- clock ---------------------------------------------------------

    /// The fixed `DateTime` that `Now()` resolves to for this evaluation pass.
    pub fn now(&self) -> CqlDateTime {
        let ts = self.evaluation_timestamp;
        CqlDateTime::new(
            ts.year(),
            ts.month() as u8,
            ts.day() as u8,
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            ts.timestamp_subsec_millis() as u16,
            Some((ts.offset().local_minus_utc() / 60) as i16),
        )
    }

    /// The fixed `Date` that `Today()` resolves to for this evaluation pass.
    pub fn today(&self) -> CqlDate {
        let ts = self.evaluation_timestamp;
        CqlDate::new(ts.year(), ts.month() as u8, ts.day() as u8)
    }

    /// The fixed `Time` that `TimeOfDay()` resolves to for this evaluation pass.
    pub fn time_of_day(&self) -> CqlTime {
        let ts = self.evaluation_timestamp;
        CqlTime::new(
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            ts.timestamp_subsec_millis() as u16,
        )
    }
}

/// Fluent builder for [`EvaluationContext`].
///
/// Equivalent to chaining `EvaluationContext::new().with_xxx(...)`, kept
/// around because it reads better at call sites that set several providers
/// at once.
#[derive(Default)]
pub struct EvaluationContextBuilder {
    context_type: Option<String>,
    context_value: Option<CqlValue>,
    timestamp: Option<DateTime<FixedOffset>>,
    library: Option<Arc<Library>>,
    data_provider: Option<Arc<dyn DataProvider>>,
    terminology_provider: Option<Arc<dyn TerminologyProvider>>,
    parameters: HashMap<String, CqlValue>,
    recursion_limit: Option<usize>,
}

impl EvaluationContextBuilder {
    /// Start building a new context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the context declaration.
    pub fn context(mut self, context_type: impl Into<String>, value: CqlValue) -> Self {
        self.context_type = Some(context_type.into());
        self.context_value = Some(value);
        self
    }

    /// Pin the evaluation timestamp.
    pub fn timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach the main library.
    pub fn library(mut self, library: Arc<Library>) -> Self {
        self.library = Some(library);
        self
    }

    /// Attach the data provider.
    pub fn data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.data_provider = Some(provider);
        self
    }

    /// Attach the terminology provider.
    pub fn terminology_provider(mut self, provider: Arc<dyn TerminologyProvider>) -> Self {
        self.terminology_provider = Some(provider);
        self
    }

    /// Bind a top-level parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: CqlValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Override the recursion depth limit.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    /// Finish building the context.
    pub fn build(self) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        if let (Some(t), Some(v)) = (self.context_type, self.context_value) {
            ctx = ctx.with_context(t, v);
        }
        if let Some(ts) = self.timestamp {
            ctx = ctx.with_timestamp(ts);
        }
        if let Some(lib) = self.library {
            ctx = ctx.with_library(lib);
        }
        if let Some(dp) = self.data_provider {
            ctx = ctx.with_data_provider(dp);
        }
        if let Some(tp) = self.terminology_provider {
            ctx = ctx.with_terminology_provider(tp);
        }
        if let Some(limit) = self.recursion_limit {
            ctx = ctx.with_recursion_limit(limit);
        }
        for (name, value) in self.parameters {
            ctx.set_parameter(name, value);
        }
        ctx
    }
}
