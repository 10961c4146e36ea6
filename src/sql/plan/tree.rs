//! The query tree: a binary tree of relational operators, held in an
//! arena and addressed by `NodeId` rather than parent/child pointers.
//! An indexed arena sidesteps the ownership cycle a pointer-based
//! `parent_nodeid` would require.

use crate::sql::attribute::AttributeList;
use crate::sql::expression::Expression;

pub type NodeId = usize;

/// The operator a node performs. `join_type` and `join_cond` do not get
/// their own `NodeType` variants because they are payload of a `Join`
/// node, not a different operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Restrict,
    Project,
    Join,
    CrossProduct,
    Sort,
    Union,
    Intersect,
    Distinct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
}

/// The rewriter only ever produces `On` joins; kept as an enum rather
/// than a bare bool so a future join strategy (natural, using-list) has
/// somewhere to land without another struct field nobody else reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinCond {
    On,
}

/// Payload specific to one `NodeType`. Everything common to every
/// operator (relations, attributes, where_expr) lives directly on
/// `QueryNode`; only `Join` needs more, and only while it is a join.
/// Before `split_restrict_with_join` runs, a node can legitimately carry
/// both `where_expr` and a not-yet-promoted `join_expr` at once, which a
/// fully tag-per-variant design cannot express. `NodeKind::Plain` covers
/// every other operator.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Plain,
    Join {
        join_expr: Expression,
        join_type: JoinType,
        join_cond: Option<JoinCond>,
    },
}

impl NodeKind {
    pub fn join_expr(&self) -> Option<&Expression> {
        match self {
            NodeKind::Join { join_expr, .. } => Some(join_expr),
            NodeKind::Plain => None,
        }
    }

    pub fn join_expr_mut(&mut self) -> Option<&mut Expression> {
        match self {
            NodeKind::Join { join_expr, .. } => Some(join_expr),
            NodeKind::Plain => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Base tables reachable from this node (union of its children's, or
    /// a single entry for an un-split scan node).
    pub relations: Vec<String>,
    pub attributes: AttributeList,
    /// A node's own single-table restriction. A join's cross-table
    /// predicate lives in `kind` instead, not here, until it has been
    /// split out by `split_restrict_with_join`.
    pub where_expr: Expression,
    pub kind: NodeKind,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub parent: Option<NodeId>,
}

impl QueryNode {
    fn new(id: NodeId, node_type: NodeType) -> Self {
        Self {
            id,
            node_type,
            relations: Vec::new(),
            attributes: AttributeList::new(),
            where_expr: Expression::new(),
            kind: NodeKind::Plain,
            left: None,
            right: None,
            parent: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn has_relation(&self, table: &str) -> bool {
        self.relations.iter().any(|r| r == table)
    }

    pub fn join_expr(&self) -> Option<&Expression> {
        self.kind.join_expr()
    }
}

/// The arena. Node 0 is never a dangling id once `alloc`'d; ids are
/// stable for the lifetime of the tree (never reused, even across
/// `prune_tree`, so a stale `NodeId` held elsewhere simply becomes
/// unreachable rather than aliasing a different node).
#[derive(Debug, Clone, Default)]
pub struct QueryTree {
    nodes: Vec<QueryNode>,
    root: Option<NodeId>,
    pub distinct: bool,
}

impl QueryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(QueryNode::new(id, node_type));
        id
    }

    pub fn node(&self, id: NodeId) -> &QueryNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut QueryNode {
        &mut self.nodes[id]
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.nodes[id].parent = None;
        self.root = Some(id);
    }

    pub fn set_left(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].left = Some(child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn set_right(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].right = Some(child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn detach_left(&mut self, parent: NodeId) -> Option<NodeId> {
        self.nodes[parent].left.take()
    }

    pub fn detach_right(&mut self, parent: NodeId) -> Option<NodeId> {
        self.nodes[parent].right.take()
    }

    /// Which side of its parent a node sits on, if it has a parent.
    pub fn child_side(&self, id: NodeId) -> Option<ChildSide> {
        let parent = self.nodes[id].parent?;
        let p = &self.nodes[parent];
        if p.left == Some(id) {
            Some(ChildSide::Left)
        } else if p.right == Some(id) {
            Some(ChildSide::Right)
        } else {
            None
        }
    }

    /// Replaces a node's position in the tree with `replacement`,
    /// rewiring the parent (or the tree root) to point at it. Used by
    /// `prune_tree` to splice out a blank Project/Restrict.
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) {
        match self.nodes[old].parent {
            None => self.set_root(replacement),
            Some(parent) => match self.child_side(old) {
                Some(ChildSide::Left) => self.set_left(parent, replacement),
                Some(ChildSide::Right) => self.set_right(parent, replacement),
                None => unreachable!("node has a parent but isn't linked from it"),
            },
        }
    }

    pub fn children(&self, id: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        (self.nodes[id].left, self.nodes[id].right)
    }

    /// The leaf covering `table`, if the tree has one. Mirrors the
    /// source's `find_table_in_tree`.
    pub fn find_table_in_tree(&self, start: NodeId, table: &str) -> Option<NodeId> {
        let node = &self.nodes[start];
        if node.is_leaf() {
            return if node.has_relation(table) { Some(start) } else { None };
        }
        if let Some(left) = node.left {
            if let Some(found) = self.find_table_in_tree(left, table) {
                return Some(found);
            }
        }
        if let Some(right) = node.right {
            if let Some(found) = self.find_table_in_tree(right, table) {
                return Some(found);
            }
        }
        None
    }

    /// Post-order node ids from the root: the order the executor
    /// prepares nodes in and the EXPLAIN renderer walks in.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.postorder_from(root, &mut out);
        }
        out
    }

    fn postorder_from(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id];
        if let Some(left) = node.left {
            self.postorder_from(left, out);
        }
        if let Some(right) = node.right {
            self.postorder_from(right, out);
        }
        out.push(id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_left_right_link_parent_back_pointer() {
        let mut tree = QueryTree::new();
        let join = tree.alloc(NodeType::Join);
        let left = tree.alloc(NodeType::Restrict);
        let right = tree.alloc(NodeType::Restrict);
        tree.set_left(join, left);
        tree.set_right(join, right);
        tree.set_root(join);

        assert_eq!(tree.node(left).parent, Some(join));
        assert_eq!(tree.node(right).parent, Some(join));
        assert_eq!(tree.child_side(left), Some(ChildSide::Left));
        assert_eq!(tree.child_side(right), Some(ChildSide::Right));
        assert!(!tree.node(join).is_leaf());
        assert!(tree.node(left).is_leaf());
    }

    #[test]
    fn postorder_visits_children_before_parent() {
        let mut tree = QueryTree::new();
        let join = tree.alloc(NodeType::Join);
        let left = tree.alloc(NodeType::Restrict);
        let right = tree.alloc(NodeType::Restrict);
        tree.set_left(join, left);
        tree.set_right(join, right);
        tree.set_root(join);

        let order = tree.postorder();
        assert_eq!(order, vec![left, right, join]);
    }

    #[test]
    fn replace_node_rewires_parent_or_root() {
        let mut tree = QueryTree::new();
        let join = tree.alloc(NodeType::Join);
        let left = tree.alloc(NodeType::Restrict);
        tree.set_left(join, left);
        tree.set_root(join);

        let fresh = tree.alloc(NodeType::Restrict);
        tree.replace_node(left, fresh);
        assert_eq!(tree.children(join).0, Some(fresh));

        let new_root = tree.alloc(NodeType::Project);
        tree.replace_node(join, new_root);
        assert_eq!(tree.root(), Some(new_root));
    }
}
