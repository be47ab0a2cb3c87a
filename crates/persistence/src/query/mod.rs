//! Query model and list query compilation.
//!
//! - [`QueryExpression`] - One `term`/`terms`/`fuzzy` clause over a document path
//! - [`BoolQuery`] - Flat must / must-not conjunction of expressions
//! - [`ListQueryCompiler`] - Turns [`ListOptions`](crate::types::ListOptions) into a query document

pub mod compiler;
pub mod expression;

pub use compiler::{CompiledQuery, ListQueryCompiler, SUPPORTED_ORDER_FIELDS, cluster_path};
pub use expression::{BoolQuery, ExprValue, MatchMode, QueryExpression};
