//! Parsing test helpers
//!
//! Utilities for testing CQL parsing, including assertion helpers
//! and utilities for working with parse results and diagnostics.

use cql_engine_ast::{
    BinaryOp, Expression, FunctionRefExpr, Library, Literal, Query, Spanned, TupleElement,
    UnaryOp,
};
use cql_engine_diagnostics::CqlError;

/// Parse a single CQL expression
pub fn parse_expression(input: &str) -> Result<Spanned<Expression>, CqlError> {
    cql_engine_parser::parse_expression(input)
}

/// Parse CQL expression and expect success
pub fn parse_expression_ok(input: &str) -> Expression {
    parse_expression(input)
        .unwrap_or_else(|e| panic!("Failed to parse expression '{}': {}", input, e))
        .inner
}

/// Parse CQL expression and expect error
pub fn parse_expression_err(input: &str) -> CqlError {
    match parse_expression(input) {
        Ok(expr) => panic!("Expected parse error but got success for '{}': {:?}", input, expr.inner),
        Err(e) => e,
    }
}

/// Parse a CQL library and return the result
pub fn parse_library(input: &str) -> Result<Library, CqlError> {
    cql_engine_parser::parse(input)
}

/// Parse CQL library and expect success
pub fn parse_library_ok(input: &str) -> Library {
    parse_library(input).unwrap_or_else(|e| panic!("Failed to parse library: {}", e))
}

/// Parse CQL library and expect error
pub fn parse_library_err(input: &str) -> CqlError {
    match parse_library(input) {
        Ok(_) => panic!("Expected parse error but got success"),
        Err(e) => e,
    }
}

/// Assert that an expression is a literal
#[track_caller]
pub fn assert_literal(expr: &Expression) -> &Literal {
    match expr {
        Expression::Literal(lit) => lit,
        _ => panic!("Expected Literal, got: {:?}", expr),
    }
}

/// Assert that an expression is an integer literal
#[track_caller]
pub fn assert_integer_literal(expr: &Expression, expected: i64) {
    let lit = assert_literal(expr);
    match lit {
        Literal::Integer(val) => assert_eq!(*val as i64, expected),
        _ => panic!("Expected Integer literal, got: {:?}", lit),
    }
}

/// Assert that an expression is a string literal
#[track_caller]
pub fn assert_string_literal(expr: &Expression, expected: &str) {
    let lit = assert_literal(expr);
    match lit {
        Literal::String(val) => assert_eq!(val, expected),
        _ => panic!("Expected String literal, got: {:?}", lit),
    }
}

/// Assert that an expression is a boolean literal
#[track_caller]
pub fn assert_boolean_literal(expr: &Expression, expected: bool) {
    let lit = assert_literal(expr);
    match lit {
        Literal::Boolean(val) => assert_eq!(*val, expected),
        _ => panic!("Expected Boolean literal, got: {:?}", lit),
    }
}

/// Assert that an expression is a binary operation
#[track_caller]
pub fn assert_binary_op(expr: &Expression) -> (&Expression, BinaryOp, &Expression) {
    match expr {
        Expression::BinaryOp(op) => (&op.left.inner, op.op, &op.right.inner),
        _ => panic!("Expected BinaryOp, got: {:?}", expr),
    }
}

/// Assert that an expression is a unary operation
#[track_caller]
pub fn assert_unary_op(expr: &Expression) -> (UnaryOp, &Expression) {
    match expr {
        Expression::UnaryOp(op) => (op.op, &op.operand.inner),
        _ => panic!("Expected UnaryOp, got: {:?}", expr),
    }
}

/// Assert that an expression is an (unqualified) identifier reference
#[track_caller]
pub fn assert_identifier(expr: &Expression, expected: &str) {
    match expr {
        Expression::IdentifierRef(id) => assert_eq!(id.name.name, expected),
        _ => panic!("Expected IdentifierRef, got: {:?}", expr),
    }
}

/// Assert that an expression is a function call
#[track_caller]
pub fn assert_function_call(expr: &Expression) -> &FunctionRefExpr {
    match expr {
        Expression::FunctionRef(func) => func,
        _ => panic!("Expected FunctionRef, got: {:?}", expr),
    }
}

/// Assert that an expression is a query
#[track_caller]
pub fn assert_query(expr: &Expression) -> &Query {
    match expr {
        Expression::Query(query) => query,
        _ => panic!("Expected Query, got: {:?}", expr),
    }
}

/// Assert that an expression is a property access
#[track_caller]
pub fn assert_member_access(expr: &Expression) -> (&Expression, &str) {
    match expr {
        Expression::Property(prop) => (&prop.source.inner, prop.property.name.as_str()),
        _ => panic!("Expected Property, got: {:?}", expr),
    }
}

/// Assert that an expression is a list
#[track_caller]
pub fn assert_list(expr: &Expression) -> &[Spanned<Expression>] {
    match expr {
        Expression::List(list) => list.elements.as_slice(),
        _ => panic!("Expected List, got: {:?}", expr),
    }
}

/// Assert that an expression is a tuple
#[track_caller]
pub fn assert_tuple(expr: &Expression) -> &[TupleElement] {
    match expr {
        Expression::Tuple(tuple) => tuple.elements.as_slice(),
        _ => panic!("Expected Tuple, got: {:?}", expr),
    }
}

/// Assert that an expression is an interval
#[track_caller]
pub fn assert_interval(expr: &Expression) -> (Option<&Expression>, bool, Option<&Expression>, bool) {
    match expr {
        Expression::Interval(interval) => (
            interval.low.as_ref().map(|e| &e.inner),
            interval.low_closed,
            interval.high.as_ref().map(|e| &e.inner),
            interval.high_closed,
        ),
        _ => panic!("Expected Interval, got: {:?}", expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_literal() {
        let expr = parse_expression_ok("42");
        assert_integer_literal(&expr, 42);
    }

    #[test]
    fn test_parse_string_literal() {
        let expr = parse_expression_ok("'hello'");
        assert_string_literal(&expr, "hello");
    }

    #[test]
    fn test_parse_boolean_literal() {
        let expr = parse_expression_ok("true");
        assert_boolean_literal(&expr, true);
    }

    #[test]
    fn test_parse_binary_op() {
        let expr = parse_expression_ok("1 + 2");
        let (left, op, right) = assert_binary_op(&expr);
        assert_eq!(op, BinaryOp::Add);
        assert_integer_literal(left, 1);
        assert_integer_literal(right, 2);
    }

    #[test]
    fn test_parse_identifier() {
        let expr = parse_expression_ok("PatientAge");
        assert_identifier(&expr, "PatientAge");
    }

    #[test]
    fn test_parse_error() {
        parse_expression_err("1 + + 2");
    }

    #[test]
    fn test_parse_date_literal() {
        let expr = parse_expression_ok("@2024-01-15");
        if let Literal::Date(date) = assert_literal(&expr) {
            assert_eq!(date.year, 2024);
            assert_eq!(date.month, Some(1));
            assert_eq!(date.day, Some(15));
        } else {
            panic!("Expected Date literal");
        }
    }

    #[test]
    fn test_parse_retrieve_expression() {
        let expr = parse_expression_ok("[Patient]");
        match &expr {
            Expression::Retrieve(r) => {
                if let cql_engine_ast::TypeSpecifier::Named(named) = &r.data_type.inner {
                    assert_eq!(named.name, "Patient");
                } else {
                    panic!("Expected Named type specifier");
                }
            }
            _ => panic!("Expected Retrieve expression"),
        }
    }

    #[test]
    fn test_parse_list_expression() {
        let expr = parse_expression_ok("{ 1, 2, 3 }");
        assert_eq!(assert_list(&expr).len(), 3);
    }

    #[test]
    fn test_parse_property_access() {
        let expr = parse_expression_ok("Patient.name");
        let (_, property) = assert_member_access(&expr);
        assert_eq!(property, "name");
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse_expression_ok("AgeInYears()");
        let func = assert_function_call(&expr);
        assert_eq!(func.name.name, "AgeInYears");
        assert_eq!(func.arguments.len(), 0);
    }

    #[test]
    fn test_parse_function_call_with_args() {
        let expr = parse_expression_ok("Max(1, 2, 3)");
        let func = assert_function_call(&expr);
        assert_eq!(func.name.name, "Max");
        assert_eq!(func.arguments.len(), 3);
    }

    #[test]
    fn test_parse_simple_library() {
        let library = parse_library_ok(
            r#"
            library Test version '1.0.0'
            using FHIR version '4.0.1'
            context Patient
            define IsAdult: true
        "#,
        );
        assert!(library.definition.is_some());
        assert_eq!(library.usings.len(), 1);
        assert_eq!(library.contexts.len(), 1);
        assert_eq!(library.statements.len(), 1);
    }
}
