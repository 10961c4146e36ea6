//! Query planning: the arena-based query tree, the heuristic rewriter,
//! the pull-based executor, and the builder that bridges a parsed
//! `SELECT` into the first of those.

pub mod builder;
pub mod executor;
pub mod optimizer;
pub mod tree;

pub use builder::build_query_tree;
pub use optimizer::{cost_optimization, heuristic_optimization};
pub use tree::{JoinCond, JoinType, NodeId, NodeKind, NodeType, QueryNode, QueryTree};
