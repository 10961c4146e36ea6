//! Query builder / driver: the entry point that ties the planner and
//! executor together into one call.
//!
//! Bridges a parsed `SELECT` plus a list of base tables all the way to
//! an external [`ResultSink`]: build the initial combined node, rewrite
//! it, run the (identity) cost stage, prepare the executor, then drain
//! the root iterator, sending a metadata frame followed by one row per
//! tuple. Mirrors the source's `Session::execute` orchestration (parse,
//! plan, execute), minus the parse step, which happens before this
//! crate is ever called.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::sql::ast::SelectStatement;
use crate::sql::attribute::AttributeList;
use crate::sql::plan::{build_query_tree, cost_optimization, heuristic_optimization};
use crate::sql::plan::executor::Executor;
use crate::sql::schema::Catalog;
use crate::sql::types::Value;
use crate::storage::table::TableRegistry;

/// What a query result is delivered to. A metadata frame (the
/// client-visible projection, `hidden = false` only) always precedes
/// the row stream; there is no per-tuple error channel. A failed query
/// is the caller's `Err` from [`run_query`] itself, surfaced as an
/// empty result with only the metadata frame sent.
///
/// An external collaborator (SQL network protocol, terminal printer,
/// …) implements this; this crate ships [`VecSink`] only as a
/// lightweight in-memory collector for tests and simple embedding.
pub trait ResultSink {
    fn metadata(&mut self, columns: &AttributeList) -> Result<()>;
    fn row(&mut self, values: Vec<Value>) -> Result<()>;
}

/// Collects rows into memory; handy for tests and for embedding this
/// crate without a real network/terminal sink.
#[derive(Debug, Default)]
pub struct VecSink {
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSink for VecSink {
    fn metadata(&mut self, columns: &AttributeList) -> Result<()> {
        self.columns = columns.visible().map(|a| (a.table.clone(), a.name.clone())).collect();
        Ok(())
    }

    fn row(&mut self, values: Vec<Value>) -> Result<()> {
        self.rows.push(values);
        Ok(())
    }
}

/// Runs `select` over `base_tables` end to end: build → heuristic
/// rewrite → cost stage → prepare → drain → cleanup, streaming every
/// surfaced tuple's visible columns to `sink`.
pub fn run_query(
    select: &SelectStatement,
    base_tables: &[String],
    catalog: &Catalog,
    registry: &TableRegistry,
    table_paths: &HashMap<String, PathBuf>,
    sink: &mut impl ResultSink,
) -> Result<()> {
    let mut tree = build_query_tree(select, base_tables, catalog)?;
    heuristic_optimization(&mut tree);
    cost_optimization(&mut tree);

    let root = match tree.root() {
        Some(r) => r,
        None => return Ok(()),
    };

    sink.metadata(&tree.node(root).attributes)?;

    let mut exec = Executor::new(&tree, catalog, registry, table_paths);
    exec.prepare()?;
    let result = (|| -> Result<()> {
        while let Some(tuple) = exec.get_next(root)? {
            let mut values = Vec::new();
            for attr in tree.node(root).attributes.visible() {
                let buf = tuple.get(&attr.table).ok_or_else(|| {
                    crate::error::Error::Internal(format!("tuple missing buffer for {}", attr.table))
                })?;
                values.push(catalog.table(&attr.table)?.read_value(buf, &attr.name)?);
            }
            sink.row(values)?;
        }
        Ok(())
    })();
    exec.cleanup();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{CompareOp, Operand, Projection, Term};
    use crate::sql::schema::TableSchema;
    use crate::sql::types::DataType;
    use crate::storage::table::{LockMode, TableHandler};
    use tempfile::tempdir;

    #[test]
    fn run_query_streams_metadata_then_rows() -> Result<()> {
        let dir = tempdir().unwrap();
        let mut t = TableSchema::new("t");
        t.add_field("a", DataType::Integer, 0);
        t.add_field("b", DataType::String, 4);
        let mut catalog = Catalog::new();
        catalog.register(t.clone());

        let registry = TableRegistry::new();
        let path = dir.path().join("t.sde");
        TableHandler::create(&registry, "t", &path)?;
        {
            let mut h = TableHandler::open(&registry, "t", &path, t.rec_buff_length, LockMode::Write)?;
            for (a, b) in [(1i64, "x"), (2, "y"), (3, "z")] {
                let mut buf = vec![0u8; t.rec_buff_length];
                t.write_value(&mut buf, "a", &Value::Integer(a))?;
                t.write_value(&mut buf, "b", &Value::String(b.into()))?;
                h.write_row(&buf)?;
            }
        }
        let mut paths = HashMap::new();
        paths.insert("t".to_string(), path);

        let select = SelectStatement {
            distinct: false,
            projection: Projection::Columns(vec![("t".into(), "b".into())]),
            where_terms: vec![Term {
                left: Operand::Field("t".into(), "a".into()),
                op: CompareOp::Ge,
                right: Operand::IntLit(2),
                junction: None,
            }],
        };

        let mut sink = VecSink::default();
        run_query(&select, &["t".to_string()], &catalog, &registry, &paths, &mut sink)?;

        assert_eq!(sink.columns, vec![("t".to_string(), "b".to_string())]);
        assert_eq!(sink.rows, vec![vec![Value::String("y".into())], vec![Value::String("z".into())]]);
        Ok(())
    }
}
