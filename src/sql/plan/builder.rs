//! Turns a parsed `SELECT` (`sql::ast`'s assumed input shape) into the
//! single combined `QueryTree` node the optimizer then splits apart.
//!
//! Mirrors the source's `init_node`: one node, no children yet, carrying
//! every base relation, the full projection, the residual restriction
//! and the not-yet-separated join predicate together. Everything after
//! this is the rewriter's job (`sql::plan::optimizer`).

use crate::error::Result;
use crate::sql::ast::{Projection as AstProjection, SelectStatement};
use crate::sql::attribute::{Attribute, AttributeList};
use crate::sql::expression::Expression;
use crate::sql::plan::tree::{NodeKind, NodeType, QueryTree};
use crate::sql::schema::Catalog;

/// Builds the initial, unoptimized query tree: a single node covering
/// `base_tables`, holding the projection's attributes and the full WHERE
/// expression before it has been split into join/restrict parts.
pub fn build_query_tree(select: &SelectStatement, base_tables: &[String], catalog: &Catalog) -> Result<QueryTree> {
    let mut tree = QueryTree::new();
    tree.distinct = select.distinct;

    let root = tree.alloc(NodeType::Restrict);
    {
        let node = tree.node_mut(root);
        node.relations = base_tables.to_vec();
    }

    let attributes = match &select.projection {
        AstProjection::All => {
            let mut list = AttributeList::new();
            for table in base_tables {
                for attr in AttributeList::all_fields_of(catalog, table)?.iter() {
                    list.push(attr.clone());
                }
            }
            list
        }
        AstProjection::Columns(cols) => {
            let mut list = AttributeList::new();
            for (table, name) in cols {
                list.push(Attribute::visible(table, name));
            }
            list
        }
    };

    let mut where_expr = Expression::convert(&select.where_terms, catalog)?;
    let join_expr = where_expr.get_join_expr();

    {
        let node = tree.node_mut(root);
        node.attributes = attributes;
        node.where_expr = where_expr;
        if !join_expr.is_empty() {
            node.kind = NodeKind::Join {
                join_expr,
                join_type: crate::sql::plan::tree::JoinType::Inner,
                join_cond: None,
            };
        }
    }

    tree.set_root(root);
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{CompareOp, Operand, Term};
    use crate::sql::schema::TableSchema;
    use crate::sql::types::DataType;

    fn catalog() -> Catalog {
        let mut r = TableSchema::new("r");
        r.add_field("id", DataType::Integer, 0);
        r.add_field("val", DataType::String, 16);
        let mut s = TableSchema::new("s");
        s.add_field("id", DataType::Integer, 0);
        s.add_field("tag", DataType::String, 16);
        let mut catalog = Catalog::new();
        catalog.register(r);
        catalog.register(s);
        catalog
    }

    #[test]
    fn combined_node_carries_join_and_residual_separately() -> Result<()> {
        let catalog = catalog();
        let select = SelectStatement {
            distinct: false,
            projection: AstProjection::Columns(vec![("r".into(), "val".into())]),
            where_terms: vec![
                Term {
                    left: Operand::Field("r".into(), "id".into()),
                    op: CompareOp::Eq,
                    right: Operand::Field("s".into(), "id".into()),
                    junction: None,
                },
                Term {
                    left: Operand::Field("s".into(), "tag".into()),
                    op: CompareOp::Ge,
                    right: Operand::StringLit("U".into()),
                    junction: Some(crate::sql::ast::Junction::And),
                },
            ],
        };

        let tree = build_query_tree(&select, &["r".to_string(), "s".to_string()], &catalog)?;
        let root = tree.node(tree.root().unwrap());
        assert!(root.is_leaf());
        assert_eq!(root.where_expr.len(), 1);
        assert!(root.join_expr().is_some());
        assert_eq!(root.join_expr().unwrap().len(), 1);
        Ok(())
    }
}
