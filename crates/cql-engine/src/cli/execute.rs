//! Execute command implementation

use super::{output, resolver};
use anyhow::{Context, Result};
use crate::eval::driver::LibraryDriver;
use crate::eval::retrieve::DataRetrieverAdapter;
use crate::model::{JsonDataRetriever, NoOpDataRetriever};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for execute command
pub struct ExecuteConfig {
    pub file: PathBuf,
    pub params: Vec<String>,
    pub data: Option<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    pub verbose: bool,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

/// Execute a CQL file
pub async fn execute(config: ExecuteConfig) -> Result<()> {
    if config.verbose {
        eprintln!("Executing CQL file: {}", config.file.display());
    }

    // Set up library resolver
    let resolver = resolver::LibraryResolver::new(config.library_paths);

    if config.verbose {
        eprintln!("Library search paths:");
        for path in resolver.search_paths() {
            eprintln!("  - {}", path.display());
        }
    }

    // Load the CQL file
    let cql_content = fs::read_to_string(&config.file)
        .with_context(|| format!("Failed to read CQL file: {}", config.file.display()))?;

    if config.verbose {
        eprintln!("Loaded {} bytes from {}", cql_content.len(), config.file.display());
    }

    // Parse parameters
    let params = parse_parameters(&config.params)?;

    if config.verbose && !params.is_empty() {
        eprintln!("Parameters:");
        for (name, value) in &params {
            eprintln!("  {} = {}", name, value);
        }
    }

    // Load context data if provided
    let context_data = if let Some(data_path) = &config.data {
        let data_content = fs::read_to_string(data_path)
            .with_context(|| format!("Failed to read data file: {}", data_path.display()))?;

        let data: Value = serde_json::from_str(&data_content)
            .with_context(|| format!("Failed to parse data file: {}", data_path.display()))?;

        if config.verbose {
            eprintln!("Loaded context data from {}", data_path.display());
        }

        Some(data)
    } else {
        None
    };

    // Parse the CQL library
    let ast_library = crate::parser::parse(&cql_content)
        .with_context(|| format!("Failed to parse CQL file: {}", config.file.display()))?;

    let lib_name = ast_library
        .definition
        .as_ref()
        .map(|def| def.name.name.name.clone())
        .unwrap_or_else(|| "(unnamed)".to_string());
    let lib_version = ast_library
        .definition
        .as_ref()
        .and_then(|def| def.version.as_ref())
        .map(|v| v.version.clone());

    if config.verbose {
        eprintln!(
            "Parsed library: {} version {}",
            lib_name,
            lib_version.as_deref().unwrap_or("(no version)")
        );
    }

    // Convert to ELM, the typed model the evaluation engine walks
    let mut converter = crate::elm::converter::AstToElmConverter::new();
    let elm_library = Arc::new(converter.convert_library(&ast_library));

    // Wire an evaluation context: a JSON-backed retriever when `--data` was
    // given, otherwise a no-op retriever (retrieves always return empty).
    let data_provider = Arc::new(DataRetrieverAdapter::new(
        match &context_data {
            Some(doc) => Arc::new(JsonDataRetriever::from_json(doc)) as Arc<dyn crate::model::DataRetriever>,
            None => Arc::new(NoOpDataRetriever::new()) as Arc<dyn crate::model::DataRetriever>,
        },
        "Patient",
    ));

    let mut driver = LibraryDriver::new(vec![elm_library]).with_data_provider(data_provider);
    for (name, value) in &params {
        driver = driver.with_parameter(name.clone(), crate::model::json_to_cql_value(value));
    }

    // One context key per request for now: an explicit per-patient driver
    // loop (§11's "context_values" list) is future CLI surface once a
    // patient-bundle-splitting flag exists.
    let context_key = "context".to_string();
    let context_value = context_data
        .as_ref()
        .map(crate::model::json_to_cql_value)
        .unwrap_or(crate::types::CqlValue::Null);

    let bundle = driver
        .run("Patient", &[(context_key, context_value)])
        .map_err(|e| anyhow::anyhow!("Evaluation failed: {}", e))?;

    let results: serde_json::Map<String, Value> = bundle
        .entries
        .into_iter()
        .map(|entry| {
            let value = match entry.result {
                Ok(v) => json!(format!("{:?}", v)),
                Err(e) => json!({ "error": e.to_string() }),
            };
            (entry.definition, value)
        })
        .collect();

    let result = json!({
        "library": {
            "name": lib_name,
            "version": lib_version,
        },
        "parameters": params,
        "results": results,
    });

    // Format and output results
    let format = output::OutputFormat::from_str(
        config.output_format.as_deref().unwrap_or("pretty")
    );

    output::print_output(&result, format, config.output_file.as_deref())?;

    if config.verbose {
        eprintln!("{}", output::format_success("Execution completed"));
    }

    Ok(())
}

/// Parse parameter strings (name=value) into a map
fn parse_parameters(params: &[String]) -> Result<HashMap<String, Value>> {
    let mut result = HashMap::new();

    for param in params {
        let parts: Vec<&str> = param.splitn(2, '=').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid parameter format: '{}'. Expected 'name=value'", param);
        }

        let name = parts[0].trim().to_string();
        let value_str = parts[1].trim();

        // Try to parse as JSON value
        let value = if value_str.starts_with('@') {
            // Date/time literal
            json!(value_str)
        } else if let Ok(num) = value_str.parse::<i64>() {
            json!(num)
        } else if let Ok(num) = value_str.parse::<f64>() {
            json!(num)
        } else if value_str == "true" || value_str == "false" {
            json!(value_str == "true")
        } else if value_str == "null" {
            Value::Null
        } else if value_str.starts_with('{') || value_str.starts_with('[') {
            // Try to parse as JSON
            serde_json::from_str(value_str)
                .unwrap_or_else(|_| json!(value_str))
        } else {
            // Treat as string
            json!(value_str)
        };

        result.insert(name, value);
    }

    Ok(result)
}
