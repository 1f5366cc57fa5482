//! Compiled expressions and the per-text compilation cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::ast::Node;
use crate::deps::dependency_paths;
use crate::error::ExprResult;
use crate::eval::evaluate;
use crate::parser::parse;

/// A derived value computed from store state.
///
/// The store only needs two things from an expression: which data paths it
/// reads, so it can be registered as a listener, and its value for a given
/// state.
pub trait DerivedExpression: Send + Sync {
    /// Root-relative dotted paths the expression reads.
    fn extract_dependency_paths(&self) -> Vec<String>;

    /// Evaluate against `context`. `Ok(None)` means undefined.
    fn evaluate(&self, context: &Value) -> ExprResult<Option<Value>>;
}

/// Expression text compiled to an AST, with its dependencies precomputed.
#[derive(Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Node,
    dependencies: Vec<String>,
}

impl Expression {
    pub fn compile(source: &str) -> ExprResult<Self> {
        let ast = parse(source)?;
        let dependencies = dependency_paths(&ast);
        Ok(Self {
            source: source.to_string(),
            ast,
            dependencies,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }

    pub fn dependency_paths(&self) -> &[String] {
        &self.dependencies
    }

    pub fn evaluate(&self, context: &Value) -> ExprResult<Option<Value>> {
        evaluate(&self.ast, context)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("source", &self.source)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl DerivedExpression for Expression {
    fn extract_dependency_paths(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn evaluate(&self, context: &Value) -> ExprResult<Option<Value>> {
        Expression::evaluate(self, context)
    }
}

/// Compiles each distinct expression text once.
#[derive(Default)]
pub struct ExpressionCache {
    compiled: RwLock<HashMap<String, Arc<Expression>>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached compilation of `source`, compiling it on first use.
    /// Compilation errors are not cached.
    pub fn get_or_compile(&self, source: &str) -> ExprResult<Arc<Expression>> {
        {
            let compiled = self.compiled.read().unwrap_or_else(|e| e.into_inner());
            if let Some(expr) = compiled.get(source) {
                return Ok(Arc::clone(expr));
            }
        }

        let expr = Arc::new(Expression::compile(source)?);
        debug!(source = %source, deps = ?expr.dependency_paths(), "compiled expression");
        let mut compiled = self.compiled.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(
            compiled.entry(source.to_string()).or_insert(expr),
        ))
    }

    pub fn len(&self) -> usize {
        self.compiled.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExprError;
    use serde_json::json;

    #[test]
    fn compile_extracts_dependencies() {
        let expr = Expression::compile("a + b").unwrap();
        assert_eq!(expr.source(), "a + b");
        assert_eq!(expr.dependency_paths(), ["a", "b"]);
        assert_eq!(expr.evaluate(&json!({"a": 2, "b": 3})).unwrap(), Some(json!(5)));
    }

    #[test]
    fn trait_object_usage() {
        let expr: Arc<dyn DerivedExpression> = Arc::new(Expression::compile("x & '!'").unwrap());
        assert_eq!(expr.extract_dependency_paths(), vec!["x".to_string()]);
        assert_eq!(expr.evaluate(&json!({"x": "hi"})).unwrap(), Some(json!("hi!")));
    }

    #[test]
    fn cache_compiles_once() {
        let cache = ExpressionCache::new();
        let a = cache.get_or_compile("a * 2").unwrap();
        let b = cache.get_or_compile("a * 2").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_does_not_store_failures() {
        let cache = ExpressionCache::new();
        assert!(matches!(cache.get_or_compile("a +"), Err(ExprError::Parse { .. })));
        assert!(cache.is_empty());
    }
}
