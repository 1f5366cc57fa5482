//! Derived-value expressions for mvstore.
//!
//! Models declare derived component properties as short expressions over
//! store state, e.g. `a + b` or `$count(tasks[completed = true])`. This
//! crate compiles such text once, lists the data paths it reads (so the store
//! knows which listener keys to register), and evaluates it against a state
//! value.
//!
//! The language is a small JSONata-like subset:
//!
//! - dotted paths with optional `` `quoted names` ``, index and filter
//!   predicates (`tasks[0]`, `tasks[done = true]`)
//! - literals: numbers, `'strings'`, `true`, `false`, `null`, `[arrays]`
//! - `+ - * / %`, `&` (string concatenation), `= != < <= > >=`, `and`, `or`,
//!   `in`, unary `-`, `cond ? a : b`
//! - built-in functions such as `$count`, `$sum`, `$string`, `$join`
//!
//! Evaluation distinguishes *undefined* (`None`) from JSON `null`.
//!
//! # Modules
//!
//! - [`lexer`] / [`parser`]: text to [`ast::Node`]
//! - [`deps`]: static dependency path extraction
//! - [`eval`]: evaluation against a context value
//! - [`functions`]: the `$function` table
//! - [`template`]: `${…}` string templates

pub mod ast;
pub mod compiled;
pub mod deps;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod template;

pub use compiled::{DerivedExpression, Expression, ExpressionCache};
pub use deps::dependency_paths;
pub use error::{ExprError, ExprResult};
pub use eval::{evaluate, truthy};
pub use parser::parse;
pub use template::render_template;
