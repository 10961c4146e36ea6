//! The parsed-SQL input shape the planner assumes it is handed. There is
//! no lexer/parser in this crate; a caller is expected to have already
//! parsed a `SELECT` into this shape before calling
//! [`crate::sql::plan::builder::build_query_tree`]. Its operand/term
//! shape mirrors [`crate::sql::expression`] deliberately: `Expression::
//! convert` does the catalog binding, nothing else needs to change shape
//! in between.

use crate::sql::types::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String, String),
    IntLit(i64),
    StringLit(String),
    DecimalLit(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

/// `(left_op, operator, right_op, junction)`. `junction` binds this term
/// to the *previous* one in left-to-right scan order; the first term's
/// junction is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
    pub junction: Option<Junction>,
}

/// What a SELECT projects: `*` or an explicit column list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<(String, String)>),
}

/// The parsed SELECT handed to `build_query_tree`, paired with the list
/// of base tables it ranges over.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub distinct: bool,
    pub projection: Projection,
    pub where_terms: Vec<Term>,
}
