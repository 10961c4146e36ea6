//! The pull-based executor: `prepare` / `get_next` / `cleanup` over a
//! rewritten [`QueryTree`].
//!
//! Per-node execution state (scan handlers, join buffers, dedup sets)
//! lives here, keyed by [`NodeId`], rather than on the tree itself. The
//! tree is rewritten once by the optimizer and then treated as
//! read-only for the rest of the query's life, with no mutable
//! execution state threaded through the arena.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::sql::expression::{Expression, Operand};
use crate::sql::plan::tree::{NodeId, NodeType, QueryTree};
use crate::sql::schema::Catalog;
use crate::storage::table::{LockMode, TableHandler, TableRegistry};

/// One row, carried as the raw per-table record buffers contributed by
/// every base relation reachable so far. A leaf scan produces a
/// single-entry tuple; a join merges its two children's tuples into one
/// with more entries. The catalog is what turns a `(table, field)` pair
/// back into a typed value out of these bytes.
pub type Tuple = HashMap<String, Vec<u8>>;

fn tuple_key(tuple: &Tuple) -> Vec<u8> {
    let mut tables: Vec<&String> = tuple.keys().collect();
    tables.sort();
    let mut out = Vec::new();
    for t in tables {
        out.extend_from_slice(t.as_bytes());
        out.push(0);
        out.extend_from_slice(&tuple[t]);
    }
    out
}

struct JoinState {
    pairs: Vec<(usize, usize)>,
    cursor: usize,
    l_buf: Vec<Tuple>,
    r_buf: Vec<Tuple>,
    prepared: bool,
}

impl JoinState {
    fn new() -> Self {
        Self { pairs: Vec::new(), cursor: 0, l_buf: Vec::new(), r_buf: Vec::new(), prepared: false }
    }
}

enum Phase {
    Left,
    Right,
    Done,
}

struct UnionState {
    phase: Phase,
}

struct IntersectState {
    right_counts: Option<HashMap<Vec<u8>, (usize, Tuple)>>,
}

struct DistinctState {
    seen: HashSet<Vec<u8>>,
}

/// Executes a rewritten query tree, one tuple per [`Executor::get_next`]
/// call.
pub struct Executor<'a> {
    tree: &'a QueryTree,
    catalog: &'a Catalog,
    registry: &'a TableRegistry,
    table_paths: &'a HashMap<String, PathBuf>,
    handlers: HashMap<NodeId, TableHandler>,
    joins: HashMap<NodeId, JoinState>,
    cross: HashMap<NodeId, JoinState>,
    unions: HashMap<NodeId, UnionState>,
    intersects: HashMap<NodeId, IntersectState>,
    distincts: HashMap<NodeId, DistinctState>,
}

impl<'a> Executor<'a> {
    pub fn new(tree: &'a QueryTree, catalog: &'a Catalog, registry: &'a TableRegistry, table_paths: &'a HashMap<String, PathBuf>) -> Self {
        Self {
            tree,
            catalog,
            registry,
            table_paths,
            handlers: HashMap::new(),
            joins: HashMap::new(),
            cross: HashMap::new(),
            unions: HashMap::new(),
            intersects: HashMap::new(),
            distincts: HashMap::new(),
        }
    }

    /// Opens a heap scan for every leaf relation in the tree. Index
    /// scans are never selected: `find_index_in_expr` is stubbed to "no
    /// usable index" in the source, so every leaf is a heap scan.
    pub fn prepare(&mut self) -> Result<()> {
        for id in self.tree.postorder() {
            let node = self.tree.node(id);
            if !node.is_leaf() {
                continue;
            }
            let table = node.relations.first().ok_or_else(|| {
                Error::Invariant(format!("leaf node {id} has no relation"))
            })?;
            let path = self.table_paths.get(table).ok_or_else(|| Error::NotFound(format!("heap path for table {table}")))?;
            let rec_len = self.catalog.table(table)?.rec_buff_length;
            let mut handler = TableHandler::open(self.registry, table, path, rec_len, LockMode::Read)?;
            handler.rnd_init()?;
            self.handlers.insert(id, handler);
        }
        Ok(())
    }

    /// Releases every leaf scan handler and discards per-node execution
    /// state. Mirrors the source's `ha_index_or_rnd_end` on every
    /// non-null relation.
    pub fn cleanup(&mut self) {
        self.handlers.clear();
        self.joins.clear();
        self.cross.clear();
        self.unions.clear();
        self.intersects.clear();
        self.distincts.clear();
    }

    pub fn get_next(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        match self.tree.node(id).node_type {
            NodeType::Restrict => self.do_restrict(id),
            NodeType::Project => self.do_project(id),
            NodeType::Join => self.do_join(id),
            NodeType::CrossProduct => self.do_cross_product(id),
            NodeType::Sort => self.do_sort(id),
            NodeType::Union => self.do_union(id),
            NodeType::Intersect => self.do_intersect(id),
            NodeType::Distinct => self.do_distinct(id),
        }
    }

    fn leaf_scan(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let table = self.tree.node(id).relations[0].clone();
        let rec_len = self.catalog.table(&table)?.rec_buff_length;
        let handler = self
            .handlers
            .get_mut(&id)
            .ok_or_else(|| Error::Invariant(format!("leaf node {id} scanned before prepare")))?;
        let mut buf = vec![0u8; rec_len];
        if handler.rnd_next(&mut buf)? {
            let mut tuple = Tuple::new();
            tuple.insert(table, buf);
            Ok(Some(tuple))
        } else {
            Ok(None)
        }
    }

    /// **Restrict.** Pulls from the left child (or this node's own heap
    /// scan, if it's a leaf); surfaces the first tuple whose single-table
    /// predicate is true, discarding the rest.
    fn do_restrict(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let is_leaf = self.tree.node(id).is_leaf();
        loop {
            let tuple = if is_leaf { self.leaf_scan(id)? } else {
                let left = self.tree.node(id).left.expect("non-leaf Restrict has a left child");
                self.get_next(left)?
            };
            let Some(tuple) = tuple else { return Ok(None) };

            let node = self.tree.node(id);
            if node.where_expr.is_empty() {
                return Ok(Some(tuple));
            }
            let table = node.relations.first().cloned().unwrap_or_else(|| {
                // after pushdown a Restrict's where_expr only ever
                // mentions the single relation it was split against.
                tuple.keys().next().cloned().unwrap_or_default()
            });
            let Some(buf) = tuple.get(&table) else { continue };
            if node.where_expr.evaluate(&table, buf, self.catalog)? {
                return Ok(Some(tuple));
            }
        }
    }

    /// **Project.** A leaf opens its own heap scan; an interior node
    /// simply passes its child's tuple through untouched. Column
    /// dropping happens at the sink, guided by the root's `attributes`.
    fn do_project(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        if self.tree.node(id).is_leaf() {
            self.leaf_scan(id)
        } else {
            let left = self.tree.node(id).left.expect("non-leaf Project has a left child");
            self.get_next(left)
        }
    }

    fn join_children(&self, id: NodeId) -> Result<(NodeId, NodeId)> {
        let (left, right) = self.tree.children(id);
        match (left, right) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(Error::Invariant(format!("join node {id} does not have two children"))),
        }
    }

    /// Which (table, field) each side of an equi-join term corresponds
    /// to, resolved against which child subtree actually carries that
    /// table, not by the term's own left/right orientation.
    fn split_term_sides(&self, term: &crate::sql::expression::Term, left: NodeId, right: NodeId) -> Result<((String, String), (String, String))> {
        let (Operand::Field(ta, fa), Operand::Field(tb, fb)) = (&term.left, &term.right) else {
            return Err(Error::Invariant("join term is not a field-field comparison".into()));
        };
        let left_has_a = self.tree.node(left).has_relation(ta);
        if left_has_a {
            Ok(((ta.clone(), fa.clone()), (tb.clone(), fb.clone())))
        } else if self.tree.node(left).has_relation(tb) {
            Ok(((tb.clone(), fb.clone()), (ta.clone(), fa.clone())))
        } else {
            Err(Error::Invariant(format!("neither join operand table is covered by the join's left child ({right})")))
        }
    }

    fn field_bytes<'t>(&self, tuple: &'t Tuple, table: &str, field: &str) -> Result<&'t [u8]> {
        let f = self.catalog.table(table)?.field(field)?;
        let buf = tuple.get(table).ok_or_else(|| Error::Internal(format!("tuple missing buffer for {table}")))?;
        Ok(&buf[f.offset..f.offset + f.length])
    }

    fn drain_sorted(&mut self, child: NodeId, table: &str, field: &str) -> Result<(Vec<Tuple>, Vec<Vec<u8>>)> {
        let data_type = self.catalog.table(table)?.field(field)?.data_type;
        let mut rows = Vec::new();
        while let Some(tuple) = self.get_next(child)? {
            let key = self.field_bytes(&tuple, table, field)?.to_vec();
            if Expression::join_key_is_skippable(&key, data_type) {
                continue;
            }
            rows.push((key, tuple));
        }
        // Stable sort preserves insertion order among equal keys, which
        // is the tie-break the source's insertion sort also gives.
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        let (keys, tuples) = rows.into_iter().map(|(k, t)| (k, t)).unzip();
        Ok((tuples, keys))
    }

    /// **Join (sort-merge with preemption).** On first use, drains both
    /// children into buffers sorted on the join key and computes the
    /// full list of matching `(left_index, right_index)` pairs via a
    /// single merge pass over the sorted buffers. This produces the
    /// same order and multiplicity as a call-by-call rewind cursor would,
    /// but computed once since both sides are already fully materialized
    /// for the sort-merge anyway (see DESIGN.md). Every combination
    /// within a matching run is enumerated by construction, so
    /// many-to-many equality joins are never under-produced.
    fn do_join(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let (left, right) = self.join_children(id)?;
        if !self.joins.contains_key(&id) {
            let node = self.tree.node(id);
            let join_expr = node.join_expr().cloned().ok_or_else(|| Error::Invariant(format!("join node {id} has no join predicate")))?;
            if join_expr.is_empty() {
                return Err(Error::Invariant(format!("join node {id} has an empty join predicate")));
            }
            let primary = join_expr.terms()[0].clone();
            let ((lt, lf), (rt, rf)) = self.split_term_sides(&primary, left, right)?;

            let (l_buf, l_keys) = self.drain_sorted(left, &lt, &lf)?;
            let (r_buf, r_keys) = self.drain_sorted(right, &rt, &rf)?;

            let mut pairs = Vec::new();
            let (mut i, mut j) = (0usize, 0usize);
            while i < l_keys.len() && j < r_keys.len() {
                match l_keys[i].cmp(&r_keys[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        let mut i2 = i;
                        while i2 < l_keys.len() && l_keys[i2] == l_keys[i] {
                            i2 += 1;
                        }
                        let mut j2 = j;
                        while j2 < r_keys.len() && r_keys[j2] == r_keys[j] {
                            j2 += 1;
                        }
                        for li in i..i2 {
                            for rj in j..j2 {
                                pairs.push((li, rj));
                            }
                        }
                        i = i2;
                        j = j2;
                    }
                }
            }

            self.joins.insert(id, JoinState { pairs, cursor: 0, l_buf, r_buf, prepared: true });
        }

        // Remaining terms beyond the primary equi-join key, if any, are
        // applied as an extra equality filter over the merged tuple.
        let extra_terms: Vec<_> = {
            let node = self.tree.node(id);
            node.join_expr().map(|e| e.terms()[1..].to_vec()).unwrap_or_default()
        };

        loop {
            let state = self.joins.get_mut(&id).expect("join state initialized above");
            if state.cursor >= state.pairs.len() {
                return Ok(None);
            }
            let (li, rj) = state.pairs[state.cursor];
            state.cursor += 1;
            let mut merged = state.l_buf[li].clone();
            merged.extend(state.r_buf[rj].clone());

            let mut all_match = true;
            for term in &extra_terms {
                let ((lt, lf), (rt, rf)) = self.split_term_sides(term, left, right)?;
                let lb = self.field_bytes(&merged, &lt, &lf)?;
                let rb = self.field_bytes(&merged, &rt, &rf)?;
                if lb != rb {
                    all_match = false;
                    break;
                }
            }
            if all_match {
                return Ok(Some(merged));
            }
        }
    }

    /// **CrossProduct.** Reserved operator kind; the builder never emits
    /// one (no `CROSS JOIN` in the assumed AST), but it's implemented as
    /// the conventional nested-loop cartesian product rather than
    /// stubbed to immediate EOF.
    fn do_cross_product(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let (left, right) = self.join_children(id)?;
        if !self.cross.contains_key(&id) {
            let mut l_buf = Vec::new();
            while let Some(t) = self.get_next(left)? {
                l_buf.push(t);
            }
            let mut r_buf = Vec::new();
            while let Some(t) = self.get_next(right)? {
                r_buf.push(t);
            }
            let mut pairs = Vec::with_capacity(l_buf.len() * r_buf.len());
            for li in 0..l_buf.len() {
                for rj in 0..r_buf.len() {
                    pairs.push((li, rj));
                }
            }
            self.cross.insert(id, JoinState { pairs, cursor: 0, l_buf, r_buf, prepared: true });
        }
        let state = self.cross.get_mut(&id).unwrap();
        if state.cursor >= state.pairs.len() {
            return Ok(None);
        }
        let (li, rj) = state.pairs[state.cursor];
        state.cursor += 1;
        let mut merged = state.l_buf[li].clone();
        merged.extend(state.r_buf[rj].clone());
        Ok(Some(merged))
    }

    /// **Sort.** Reserved operator kind; with no `ORDER BY` in the
    /// assumed input AST there is no key to sort by, so this is the
    /// identity pass-through over its left child.
    fn do_sort(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let left = self.tree.node(id).left.ok_or_else(|| Error::Invariant(format!("Sort node {id} has no child")))?;
        self.get_next(left)
    }

    /// **Union.** Streams every tuple of the left child, then every
    /// tuple of the right, with no deduplication (`UNION ALL`
    /// semantics). Wrap in `Distinct` for set union.
    fn do_union(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let (left, right) = self.join_children(id)?;
        let state = self.unions.entry(id).or_insert_with(|| UnionState { phase: Phase::Left });
        loop {
            match state.phase {
                Phase::Left => match self.get_next(left)? {
                    Some(t) => return Ok(Some(t)),
                    None => self.unions.get_mut(&id).unwrap().phase = Phase::Right,
                },
                Phase::Right => match self.get_next(right)? {
                    Some(t) => return Ok(Some(t)),
                    None => {
                        self.unions.get_mut(&id).unwrap().phase = Phase::Done;
                        return Ok(None);
                    }
                },
                Phase::Done => return Ok(None),
            }
        }
    }

    /// **Intersect.** Materializes the right child into a multiset of
    /// tuple keys, then streams the left child, surfacing each tuple at
    /// most as many times as it appears on the right.
    fn do_intersect(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let (left, right) = self.join_children(id)?;
        if !self.intersects.contains_key(&id) {
            let mut counts: HashMap<Vec<u8>, (usize, Tuple)> = HashMap::new();
            while let Some(t) = self.get_next(right)? {
                let key = tuple_key(&t);
                counts.entry(key).or_insert((0, t)).0 += 1;
            }
            self.intersects.insert(id, IntersectState { right_counts: Some(counts) });
        }
        loop {
            let Some(tuple) = self.get_next(left)? else { return Ok(None) };
            let key = tuple_key(&tuple);
            let state = self.intersects.get_mut(&id).unwrap();
            let counts = state.right_counts.as_mut().unwrap();
            if let Some(entry) = counts.get_mut(&key) {
                if entry.0 > 0 {
                    entry.0 -= 1;
                    return Ok(Some(tuple));
                }
            }
        }
    }

    /// **Distinct.** Streams its child, suppressing any tuple whose raw
    /// byte key (every table's record buffer, concatenated) has already
    /// been surfaced.
    fn do_distinct(&mut self, id: NodeId) -> Result<Option<Tuple>> {
        let left = self.tree.node(id).left.ok_or_else(|| Error::Invariant(format!("Distinct node {id} has no child")))?;
        self.distincts.entry(id).or_insert_with(|| DistinctState { seen: HashSet::new() });
        loop {
            let Some(tuple) = self.get_next(left)? else { return Ok(None) };
            let key = tuple_key(&tuple);
            let state = self.distincts.get_mut(&id).unwrap();
            if state.seen.insert(key) {
                return Ok(Some(tuple));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{CompareOp, Operand as AstOperand, Projection, SelectStatement, Term as AstTerm};
    use crate::sql::plan::{build_query_tree, heuristic_optimization};
    use crate::sql::schema::{encode_value, Catalog, TableSchema};
    use crate::sql::types::{DataType, Value};
    use crate::storage::table::TableHandler;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> Result<(Catalog, TableRegistry, HashMap<String, PathBuf>)> {
        let mut r = TableSchema::new("r");
        r.add_field("id", DataType::Integer, 0);
        r.add_field("val", DataType::String, 8);
        let mut s = TableSchema::new("s");
        s.add_field("id", DataType::Integer, 0);
        s.add_field("tag", DataType::String, 8);

        let mut catalog = Catalog::new();
        catalog.register(r.clone());
        catalog.register(s.clone());

        let registry = TableRegistry::new();
        let mut paths = HashMap::new();
        let r_path = dir.join("r.sde");
        let s_path = dir.join("s.sde");
        TableHandler::create(&registry, "r", &r_path)?;
        TableHandler::create(&registry, "s", &s_path)?;

        {
            let mut h = TableHandler::open(&registry, "r", &r_path, r.rec_buff_length, LockMode::Write)?;
            for (id, val) in [(1i64, "a"), (2, "b"), (3, "c")] {
                let mut buf = vec![0u8; r.rec_buff_length];
                r.write_value(&mut buf, "id", &Value::Integer(id))?;
                r.write_value(&mut buf, "val", &Value::String(val.into()))?;
                h.write_row(&buf)?;
            }
        }
        {
            let mut h = TableHandler::open(&registry, "s", &s_path, s.rec_buff_length, LockMode::Write)?;
            for (id, tag) in [(2i64, "T"), (3, "U"), (3, "V"), (4, "W")] {
                let mut buf = vec![0u8; s.rec_buff_length];
                s.write_value(&mut buf, "id", &Value::Integer(id))?;
                s.write_value(&mut buf, "tag", &Value::String(tag.into()))?;
                h.write_row(&buf)?;
            }
        }

        paths.insert("r".to_string(), r_path);
        paths.insert("s".to_string(), s_path);
        Ok((catalog, registry, paths))
    }

    #[test]
    fn inner_equi_join_produces_expected_stream() -> Result<()> {
        let dir = tempdir().unwrap();
        let (catalog, registry, paths) = setup(dir.path())?;

        let select = SelectStatement {
            distinct: false,
            projection: Projection::Columns(vec![("r".into(), "val".into()), ("s".into(), "tag".into())]),
            where_terms: vec![AstTerm {
                left: AstOperand::Field("r".into(), "id".into()),
                op: CompareOp::Eq,
                right: AstOperand::Field("s".into(), "id".into()),
                junction: None,
            }],
        };
        let mut tree = build_query_tree(&select, &["r".to_string(), "s".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let mut exec = Executor::new(&tree, &catalog, &registry, &paths);
        exec.prepare()?;
        let root = tree.root().unwrap();

        let mut results = Vec::new();
        while let Some(tuple) = exec.get_next(root)? {
            let r_val = catalog.table("r")?.read_value(&tuple["r"], "val")?;
            let s_tag = catalog.table("s")?.read_value(&tuple["s"], "tag")?;
            results.push((r_val, s_tag));
        }
        exec.cleanup();

        assert_eq!(
            results,
            vec![
                (Value::String("b".into()), Value::String("T".into())),
                (Value::String("c".into()), Value::String("U".into())),
                (Value::String("c".into()), Value::String("V".into())),
            ]
        );
        Ok(())
    }

    #[test]
    fn single_table_restrict_filters_rows() -> Result<()> {
        let dir = tempdir().unwrap();
        let (catalog, registry, paths) = setup(dir.path())?;

        let select = SelectStatement {
            distinct: false,
            projection: Projection::Columns(vec![("r".into(), "val".into())]),
            where_terms: vec![AstTerm {
                left: AstOperand::Field("r".into(), "id".into()),
                op: CompareOp::Ge,
                right: AstOperand::IntLit(2),
                junction: None,
            }],
        };
        let mut tree = build_query_tree(&select, &["r".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let mut exec = Executor::new(&tree, &catalog, &registry, &paths);
        exec.prepare()?;
        let root = tree.root().unwrap();

        let mut results = Vec::new();
        while let Some(tuple) = exec.get_next(root)? {
            results.push(catalog.table("r")?.read_value(&tuple["r"], "val")?);
        }
        assert_eq!(results, vec![Value::String("b".into()), Value::String("c".into())]);
        Ok(())
    }

    #[test]
    fn join_with_residual_restriction_pushes_down() -> Result<()> {
        let dir = tempdir().unwrap();
        let (catalog, registry, paths) = setup(dir.path())?;

        let select = SelectStatement {
            distinct: false,
            projection: Projection::Columns(vec![("r".into(), "val".into())]),
            where_terms: vec![
                AstTerm {
                    left: AstOperand::Field("r".into(), "id".into()),
                    op: CompareOp::Eq,
                    right: AstOperand::Field("s".into(), "id".into()),
                    junction: None,
                },
                AstTerm {
                    left: AstOperand::Field("s".into(), "tag".into()),
                    op: CompareOp::Ge,
                    right: AstOperand::StringLit("U".into()),
                    junction: Some(crate::sql::ast::Junction::And),
                },
            ],
        };
        let mut tree = build_query_tree(&select, &["r".to_string(), "s".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let mut exec = Executor::new(&tree, &catalog, &registry, &paths);
        exec.prepare()?;
        let root = tree.root().unwrap();

        let mut results = Vec::new();
        while let Some(tuple) = exec.get_next(root)? {
            results.push(catalog.table("r")?.read_value(&tuple["r"], "val")?);
        }
        assert_eq!(results, vec![Value::String("c".into()), Value::String("c".into())]);
        Ok(())
    }

    #[test]
    fn distinct_wrap_deduplicates_rows() -> Result<()> {
        let dir = tempdir().unwrap();
        let mut t = TableSchema::new("t");
        t.add_field("a", DataType::Integer, 0);
        let mut catalog = Catalog::new();
        catalog.register(t.clone());
        let registry = TableRegistry::new();
        let path = dir.path().join("t.sde");
        TableHandler::create(&registry, "t", &path)?;
        {
            let mut h = TableHandler::open(&registry, "t", &path, t.rec_buff_length, LockMode::Write)?;
            for v in [1i64, 1, 2] {
                let buf = encode_value(DataType::Integer, 8, &Value::Integer(v))?;
                h.write_row(&buf)?;
            }
        }
        let mut paths = HashMap::new();
        paths.insert("t".to_string(), path);

        let select = SelectStatement {
            distinct: true,
            projection: Projection::Columns(vec![("t".into(), "a".into())]),
            where_terms: vec![],
        };
        let mut tree = build_query_tree(&select, &["t".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let mut exec = Executor::new(&tree, &catalog, &registry, &paths);
        exec.prepare()?;
        let root = tree.root().unwrap();
        let mut results = Vec::new();
        while let Some(tuple) = exec.get_next(root)? {
            results.push(catalog.table("t")?.read_value(&tuple["t"], "a")?);
        }
        assert_eq!(results, vec![Value::Integer(1), Value::Integer(2)]);
        Ok(())
    }
}
