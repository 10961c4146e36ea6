//! DBXP - a heuristic query planner/executor and the Spartan pluggable
//! storage engine it runs against.
//!
//! A parsed `SELECT` AST (the caller's job to produce; there is no
//! lexer/parser here) plus a catalog and a set of open tables go in; a
//! heuristic rewriter pushes selection, projection and joins toward the
//! leaves, and a pull-based iterator executor drains the optimized tree
//! into an external [`sql::driver::ResultSink`]. The storage layer
//! (`storage::heap`, `storage::index`, `storage::table`) is a minimal
//! heap-file-plus-index engine, not a B-tree or WAL-backed one.

pub mod error;
pub mod sql;
pub mod storage;
