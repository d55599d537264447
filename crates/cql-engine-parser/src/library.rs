//! Library structure parser

use chumsky::prelude::*;

use crate::combinators::{
    identifier_parser, preprocess, qualified_identifier_parser, version_specifier_parser,
};
use crate::expression::expression_parser;
use cql_engine_ast::{
    AccessModifier, ContextDefinition, ExpressionDefinition, Library, LibraryDefinition,
    ParameterDefinition, Spanned, Statement, UsingDefinition,
};
use cql_engine_diagnostics::{CqlError, Result, Span, CQL0001};

/// Parse CQL source into a Library AST
pub fn parse(source: &str) -> Result<Library> {
    let cleaned = preprocess(source);
    let parser = library_parser();

    parser
        .parse(&cleaned)
        .into_result()
        .map_err(|errs| {
            let errors: Vec<CqlError> = errs
                .into_iter()
                .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                .collect();
            if errors.len() == 1 {
                errors.into_iter().next().unwrap()
            } else {
                CqlError::Multiple(errors)
            }
        })
}

/// Parse a single CQL expression
pub fn parse_expression(source: &str) -> Result<Spanned<cql_engine_ast::Expression>> {
    let cleaned = preprocess(source);
    let parser = expression_parser().padded().then_ignore(end());

    parser
        .parse(&cleaned)
        .into_result()
        .map_err(|errs| {
            let errors: Vec<CqlError> = errs
                .into_iter()
                .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                .collect();
            if errors.len() == 1 {
                errors.into_iter().next().unwrap()
            } else {
                CqlError::Multiple(errors)
            }
        })
}

/// Parse CQL source with specified mode
///
/// In Fast mode: fails on first error (default behavior)
/// In Analysis mode: collects all errors and returns partial AST if possible
pub fn parse_with_mode(source: &str, mode: crate::ParseMode) -> crate::ParseResult {
    let cleaned = preprocess(source);
    let parser = library_parser();

    match mode {
        crate::ParseMode::Fast => {
            // Fast mode: same as parse(), but returns ParseResult
            match parser.parse(&cleaned).into_result() {
                Ok(library) => crate::ParseResult::success(library),
                Err(errs) => {
                    let errors: Vec<CqlError> = errs
                        .into_iter()
                        .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                        .collect();
                    crate::ParseResult::error(errors)
                }
            }
        }
        crate::ParseMode::Analysis => {
            // Analysis mode: collect all errors
            let result = parser.parse(&cleaned);

            // Collect all errors from the parse result
            let errors: Vec<CqlError> = result
                .errors()
                .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                .collect();

            // Try to get a partial or complete AST
            match result.into_output() {
                Some(library) => crate::ParseResult {
                    library: Some(library),
                    errors,
                },
                None => crate::ParseResult {
                    library: None,
                    errors,
                },
            }
        }
    }
}

/// Library parser
fn library_parser<'a>() -> impl Parser<'a, &'a str, Library, extra::Err<Rich<'a, char>>> {
    let lib_def = library_definition().or_not();
    let using_defs = using_definition().repeated().collect::<Vec<_>>();
    let context_defs = context_definition().repeated().collect::<Vec<_>>();
    let param_defs = parameter_definition().repeated().collect::<Vec<_>>();
    let expr_defs = expression_definition().repeated().collect::<Vec<_>>();

    lib_def
        .then(using_defs)
        .then(context_defs)
        .then(param_defs)
        .then(expr_defs)
        .padded()
        .then_ignore(end())
        .map(|((((lib, usings), contexts), params), exprs)| {
            let mut library = Library::new();
            library.definition = lib;
            library.usings = usings;
            library.contexts = contexts;
            library.parameters = params;
            library.statements = exprs
                .into_iter()
                .map(|e| Spanned::new(Statement::ExpressionDef(e.inner), e.span))
                .collect();
            library
        })
}

/// Parse library definition
fn library_definition<'a>(
) -> impl Parser<'a, &'a str, LibraryDefinition, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("library")
        .padded()
        .ignore_then(qualified_identifier_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .map(|(name, version)| LibraryDefinition { name, version })
}

/// Parse using definition
fn using_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<UsingDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("using")
        .padded()
        .ignore_then(identifier_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .map_with(|(model, version), e| {
            Spanned::new(
                UsingDefinition { model, version },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse context definition
fn context_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ContextDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("context")
        .padded()
        .ignore_then(identifier_parser())
        .map_with(|ctx, e| {
            Spanned::new(
                ContextDefinition { context: ctx },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse parameter definition
fn parameter_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ParameterDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    let access = choice((
        text::keyword("public").to(AccessModifier::Public),
        text::keyword("private").to(AccessModifier::Private),
    ))
    .padded()
    .or_not()
    .map(|a| a.unwrap_or(AccessModifier::Public));

    access
        .then_ignore(text::keyword("parameter").padded())
        .then(identifier_parser())
        .then(
            text::keyword("default")
                .padded()
                .ignore_then(expression_parser())
                .or_not(),
        )
        .map_with(|((access, name), default), e| {
            Spanned::new(
                ParameterDefinition {
                    access,
                    name,
                    type_specifier: None,
                    default: default.map(Box::new),
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse expression definition
fn expression_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ExpressionDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    let access = choice((
        text::keyword("public").to(AccessModifier::Public),
        text::keyword("private").to(AccessModifier::Private),
    ))
    .padded()
    .or_not()
    .map(|a| a.unwrap_or(AccessModifier::Public));

    access
        .then_ignore(text::keyword("define").padded())
        .then(identifier_parser())
        .then_ignore(just(':').padded())
        .then(expression_parser())
        .map_with(|((access, name), expr), e| {
            Spanned::new(
                ExpressionDefinition {
                    access,
                    name,
                    expression: Box::new(expr),
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}
