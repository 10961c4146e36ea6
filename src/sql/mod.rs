//! SQL processing module
//!
//! This module provides:
//! - `ast`: the parsed-`SELECT` shape the planner assumes it is handed;
//!   there is no parser in this crate, a caller supplies this shape
//! - `types`: SQL data types
//! - `schema`: the external catalog (table/field layout)
//! - `attribute`: projection lists with hidden-attribute tracking
//! - `expression`: the AND/OR term chain and its evaluation
//! - `plan`: the query tree, heuristic rewriter, and pull-based executor
//! - `explain`: the ASCII plan renderer
//! - `driver`: build → rewrite → execute → result sink, end to end

pub mod ast;
pub mod attribute;
pub mod driver;
pub mod explain;
pub mod expression;
pub mod plan;
pub mod schema;
pub mod types;