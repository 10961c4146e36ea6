//! Post-order ASCII renderer for an optimized [`QueryTree`]. Walks the
//! same post-order the executor prepares nodes in
//! (`QueryTree::postorder`) and builds one text "block" per node: a
//! leaf shows its `db.table` name over an arrow; a join shows both
//! children side by side merging into one arrow; every node gets a
//! 3-line box naming its kind and `Access Method: iterator`. The root's
//! block is followed by `Result Set`.
//!
//! The exact column widths and glyphs here are original rather than a
//! byte-for-byte port of any other renderer; see DESIGN.md.

use crate::sql::plan::tree::{NodeId, NodeType, QueryTree};

struct Block {
    lines: Vec<String>,
    width: usize,
}

fn label_for(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Restrict => "RESTRICT",
        NodeType::Project => "PROJECT",
        NodeType::Join => "JOIN",
        NodeType::CrossProduct => "CROSS PRODUCT",
        NodeType::Sort => "SORT",
        NodeType::Union => "UNION",
        NodeType::Intersect => "INTERSECT",
        NodeType::Distinct => "DISTINCT",
    }
}

fn center(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let total_pad = width - text.len();
    let left = total_pad / 2;
    let right = total_pad - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// The 3-line box every node gets: top/bottom rule, the node kind, and
/// the fixed `Access Method: iterator` line. Every leaf in this design
/// is a heap scan, so the access method never varies.
fn node_box(node_type: NodeType) -> Block {
    let title = label_for(node_type);
    let method = "Access Method: iterator";
    let inner_width = title.len().max(method.len()) + 2;
    let rule = format!("+{}+", "-".repeat(inner_width));
    let lines = vec![
        rule.clone(),
        format!("|{}|", center(title, inner_width)),
        format!("|{}|", center(method, inner_width)),
        rule,
    ];
    Block { width: inner_width + 2, lines }
}

fn pad_block_to(block: &mut Block, width: usize) {
    if block.width >= width {
        return;
    }
    let extra = width - block.width;
    let left = extra / 2;
    let right = extra - left;
    for line in &mut block.lines {
        *line = format!("{}{}{}", " ".repeat(left), line, " ".repeat(right));
    }
    block.width = width;
}

fn pad_height_to(block: &mut Block, height: usize) {
    while block.lines.len() < height {
        block.lines.insert(0, " ".repeat(block.width));
    }
}

/// Places `left` and `right` side by side with a fixed gap, top-padding
/// the shorter one so both blocks' bottoms (the merge point) line up.
fn side_by_side(mut left: Block, mut right: Block) -> Block {
    const GAP: usize = 4;
    let height = left.lines.len().max(right.lines.len());
    pad_height_to(&mut left, height);
    pad_height_to(&mut right, height);
    let width = left.width + GAP + right.width;
    let lines = (0..height)
        .map(|i| format!("{}{}{}", left.lines[i], " ".repeat(GAP), right.lines[i]))
        .collect();
    Block { lines, width }
}

fn arrow_down(width: usize, center_at: usize) -> Vec<String> {
    let col = center_at.min(width.saturating_sub(1));
    let mut pipe = " ".repeat(width);
    pipe.replace_range(col..col + 1, "|");
    let mut arrow = " ".repeat(width);
    arrow.replace_range(col..col + 1, "v");
    vec![pipe, arrow]
}

fn render(tree: &QueryTree, id: NodeId, db: &str) -> Block {
    let node = tree.node(id);
    let mut block = if node.is_leaf() {
        let table = node.relations.first().map(|s| s.as_str()).unwrap_or("?");
        let header = format!("{db}.{table}");
        let mut b = Block { width: header.len(), lines: vec![header] };
        let box_block = node_box(node.node_type);
        pad_block_to(&mut b, box_block.width);
        b.lines.extend(arrow_down(b.width, b.width / 2));
        b.lines.extend(box_block.lines);
        b
    } else {
        let (left, right) = tree.children(id);
        match (left, right) {
            (Some(l), Some(r)) => {
                // Join: both children side by side, merging into one
                // arrow at the midpoint.
                let children = side_by_side(render(tree, l, db), render(tree, r, db));
                let mut b = children;
                let box_block = node_box(node.node_type);
                pad_block_to(&mut b, box_block.width);
                b.lines.extend(arrow_down(b.width, b.width / 2));
                b.lines.extend(box_block.lines);
                b
            }
            (Some(only), None) | (None, Some(only)) => {
                let mut b = render(tree, only, db);
                let box_block = node_box(node.node_type);
                pad_block_to(&mut b, box_block.width);
                b.lines.extend(arrow_down(b.width, b.width / 2));
                b.lines.extend(box_block.lines);
                b
            }
            (None, None) => node_box(node.node_type),
        }
    };

    if Some(id) == tree.root() {
        block.lines.push("Result Set".to_string());
    }
    block
}

/// Renders the tree's optimized plan as an ASCII diagram, `db` naming
/// the database every leaf's table belongs to.
pub fn explain(tree: &QueryTree, db: &str) -> String {
    let Some(root) = tree.root() else { return String::new() };
    render(tree, root, db).lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::sql::ast::{CompareOp, Operand, Projection, SelectStatement, Term};
    use crate::sql::plan::{build_query_tree, heuristic_optimization};
    use crate::sql::schema::{Catalog, TableSchema};
    use crate::sql::types::DataType;

    #[test]
    fn single_table_restrict_explain_shows_leaf_and_box() -> Result<()> {
        let mut t = TableSchema::new("t");
        t.add_field("a", DataType::Integer, 0);
        let mut catalog = Catalog::new();
        catalog.register(t);

        let select = SelectStatement {
            distinct: false,
            projection: Projection::Columns(vec![("t".into(), "a".into())]),
            where_terms: vec![Term {
                left: Operand::Field("t".into(), "a".into()),
                op: CompareOp::Ge,
                right: Operand::IntLit(2),
                junction: None,
            }],
        };
        let mut tree = build_query_tree(&select, &["t".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let out = explain(&tree, "db");
        assert!(out.contains("db.t"));
        assert!(out.contains("Access Method: iterator"));
        assert!(out.ends_with("Result Set"));
        Ok(())
    }

    #[test]
    fn join_explain_shows_both_leaves_and_join_box() -> Result<()> {
        let mut r = TableSchema::new("r");
        r.add_field("id", DataType::Integer, 0);
        let mut s = TableSchema::new("s");
        s.add_field("id", DataType::Integer, 0);
        let mut catalog = Catalog::new();
        catalog.register(r);
        catalog.register(s);

        let select = SelectStatement {
            distinct: false,
            projection: Projection::Columns(vec![("r".into(), "id".into())]),
            where_terms: vec![Term {
                left: Operand::Field("r".into(), "id".into()),
                op: CompareOp::Eq,
                right: Operand::Field("s".into(), "id".into()),
                junction: None,
            }],
        };
        let mut tree = build_query_tree(&select, &["r".to_string(), "s".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let out = explain(&tree, "db");
        assert!(out.contains("db.r"));
        assert!(out.contains("db.s"));
        assert!(out.contains("JOIN"));
        assert!(out.ends_with("Result Set"));
        Ok(())
    }

    #[test]
    fn distinct_query_explain_ends_in_distinct_box() -> Result<()> {
        let mut t = TableSchema::new("t");
        t.add_field("a", DataType::Integer, 0);
        let mut catalog = Catalog::new();
        catalog.register(t);

        let select = SelectStatement {
            distinct: true,
            projection: Projection::Columns(vec![("t".into(), "a".into())]),
            where_terms: vec![],
        };
        let mut tree = build_query_tree(&select, &["t".to_string()], &catalog)?;
        heuristic_optimization(&mut tree);

        let out = explain(&tree, "db");
        assert!(out.contains("DISTINCT"));
        Ok(())
    }
}
