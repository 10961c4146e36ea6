//! A chain of boolean-valued terms linked by AND/OR.
//!
//! Stored as a `Vec` walked front-to-back rather than a raw linked list.
//! It is read far more often than mutated, and a `Vec` preserves the
//! exact "walk in order, fold with the next term's junction" semantics
//! without pointer-chasing (the index gets the same treatment, for the
//! same reason).

use crate::error::{Error, Result};
use crate::sql::ast;
use crate::sql::schema::{Catalog, decode_value};
use crate::sql::types::Value;

pub use ast::{CompareOp, Junction};

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String, String),
    Int(i64),
    Str(String),
    Dec(crate::sql::types::Decimal),
}

impl Operand {
    fn is_field(&self) -> bool {
        matches!(self, Operand::Field(_, _))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
    pub junction: Option<Junction>,
}

impl Term {
    /// A join term has field operands on *both* sides.
    pub fn is_join_term(&self) -> bool {
        self.left.is_field() && self.right.is_field()
    }

    pub fn references_table(&self, table: &str) -> bool {
        matches!(&self.left, Operand::Field(t, _) if t == table)
            || matches!(&self.right, Operand::Field(t, _) if t == table)
    }
}

fn bind_operand(op: &ast::Operand, catalog: &Catalog) -> Result<Operand> {
    Ok(match op {
        ast::Operand::Field(table, name) => {
            if !catalog.has_field(table, name) {
                return Err(Error::NotFound(format!("field {table}.{name}")));
            }
            Operand::Field(table.clone(), name.clone())
        }
        ast::Operand::IntLit(i) => Operand::Int(*i),
        ast::Operand::StringLit(s) => Operand::Str(s.clone()),
        ast::Operand::DecimalLit(d) => Operand::Dec(*d),
    })
}

/// A linked list of boolean-valued terms, each chained to the previous
/// one by its own `junction`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    terms: Vec<Term>,
}

/// Sentinel the source returns when a single-table `evaluate` call hits a
/// term with two field operands: "not a simple comparison."
pub const NOT_SIMPLE_COMPARISON: i32 = 90125;

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    pub fn extend(&mut self, other: Expression) {
        self.terms.extend(other.terms);
    }

    /// Consumes the assumed parsed-AST terms `[junction?, operator,
    /// right_op, left_op]` per term, resolving fields against the
    /// catalog and binding them before first use.
    pub fn convert(raw: &[ast::Term], catalog: &Catalog) -> Result<Self> {
        let mut terms = Vec::with_capacity(raw.len());
        for t in raw {
            terms.push(Term {
                left: bind_operand(&t.left, catalog)?,
                op: t.op,
                right: bind_operand(&t.right, catalog)?,
                junction: t.junction,
            });
        }
        Ok(Self { terms })
    }

    /// Destructively extracts every term whose both operands are fields
    /// into a fresh join expression, preserving relative order. What
    /// remains is the single-table residual restriction.
    pub fn get_join_expr(&mut self) -> Expression {
        let mut join_terms = Vec::new();
        let mut residual = Vec::new();
        for term in self.terms.drain(..) {
            if term.is_join_term() {
                join_terms.push(term);
            } else {
                residual.push(term);
            }
        }
        self.terms = residual;
        Expression { terms: join_terms }
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.terms.iter().any(|t| t.references_table(table))
    }

    /// 1-based index of the first term mentioning `(table, name)`,
    /// matching the source's convention literally.
    pub fn index_of(&self, table: &str, name: &str) -> Option<usize> {
        self.terms.iter().position(|t| {
            matches!(&t.left, Operand::Field(tt, nn) if tt == table && nn == name)
                || matches!(&t.right, Operand::Field(tt, nn) if tt == table && nn == name)
        }).map(|i| i + 1)
    }

    /// Designated hook to fold always-true/always-false terms for a
    /// specific table. Left as a no-op stub rather than guessing at an
    /// undescribed constant-folding policy.
    pub fn reduce_expressions(&mut self, _table: &str) {}

    fn resolve(operand: &Operand, table_buf: &[(&str, &[u8])], catalog: &Catalog) -> Result<Value> {
        match operand {
            Operand::Field(table, name) => {
                let buf = table_buf
                    .iter()
                    .find(|(t, _)| *t == table)
                    .map(|(_, b)| *b)
                    .ok_or_else(|| Error::Internal(format!("no tuple buffer for table {table}")))?;
                catalog.table(table)?.read_value(buf, name)
            }
            Operand::Int(i) => Ok(Value::Integer(*i)),
            Operand::Str(s) => Ok(Value::String(s.clone())),
            Operand::Dec(d) => Ok(Value::Decimal(*d)),
        }
    }

    fn compare(left: &Value, right: &Value, op: CompareOp) -> bool {
        use std::cmp::Ordering::*;
        let ord = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => {
                // length-limited case-insensitive comparison over the
                // shorter common prefix.
                let n = a.len().min(b.len());
                let (al, bl) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
                al.as_bytes()[..n].cmp(&bl.as_bytes()[..n])
            }
            _ => return false,
        };
        match op {
            CompareOp::Eq => ord == Equal,
            CompareOp::Ne => ord != Equal,
            CompareOp::Lt => ord == Less,
            CompareOp::Le => ord != Greater,
            CompareOp::Gt => ord == Greater,
            CompareOp::Ge => ord != Less,
        }
    }

    /// Folds terms left-to-right over a single table's tuple buffer,
    /// using each term's `junction` to connect it to the accumulator. AND
    /// and OR have equal precedence and no short-circuit: both sides of
    /// every term are computed regardless of the running result.
    pub fn evaluate(&self, table: &str, buf: &[u8], catalog: &Catalog) -> Result<bool> {
        let table_buf = [(table, buf)];
        let mut acc: Option<bool> = None;
        for term in &self.terms {
            if term.is_join_term() {
                return Err(Error::Internal(format!("term is a join predicate, not a simple comparison ({NOT_SIMPLE_COMPARISON})")));
            }
            let left = Self::resolve(&term.left, &table_buf, catalog)?;
            let right = Self::resolve(&term.right, &table_buf, catalog)?;
            let this = Self::compare(&left, &right, term.op);
            acc = Some(match (acc, term.junction) {
                (None, _) => this,
                (Some(prev), Some(Junction::And)) => prev && this,
                (Some(prev), Some(Junction::Or)) => prev || this,
                (Some(_), None) => this,
            });
        }
        Ok(acc.unwrap_or(true))
    }

    /// Evaluates a join term's ordering between a left-table tuple buffer
    /// and a right-table tuple buffer, comparing raw bytes over the
    /// shorter common prefix.
    pub fn compare_join(term: &Term, table_l: &str, buf_l: &[u8], table_r: &str, buf_r: &[u8], catalog: &Catalog) -> Result<std::cmp::Ordering> {
        if !term.is_join_term() {
            return Err(Error::Internal("compare_join called on a non-join term".into()));
        }
        let (field_l, field_r) = match (&term.left, &term.right) {
            (Operand::Field(t, n), Operand::Field(_, n2)) if t == table_l => (n, n2),
            (Operand::Field(_, n2), Operand::Field(t, n)) if t == table_l => (n, n2),
            _ => return Err(Error::Internal("join term does not reference both given tables".into())),
        };
        let schema_l = catalog.table(table_l)?;
        let schema_r = catalog.table(table_r)?;
        let field_l = schema_l.field(field_l)?;
        let field_r = schema_r.field(field_r)?;
        let slice_l = &buf_l[field_l.offset..field_l.offset + field_l.length];
        let slice_r = &buf_r[field_r.offset..field_r.offset + field_r.length];
        let n = slice_l.len().min(slice_r.len());
        Ok(slice_l[..n].cmp(&slice_r[..n]))
    }

    /// The raw key bytes used to order a join buffer on one side of a
    /// join term, given which table that side's tuple came from.
    pub fn join_key_bytes<'a>(term: &Term, table: &str, buf: &'a [u8], catalog: &Catalog) -> Result<&'a [u8]> {
        let name = match (&term.left, &term.right) {
            (Operand::Field(t, n), _) if t == table => n,
            (_, Operand::Field(t, n)) if t == table => n,
            _ => return Err(Error::Internal(format!("join term does not reference table {table}"))),
        };
        let field = catalog.table(table)?.field(name)?;
        Ok(&buf[field.offset..field.offset + field.length])
    }

    /// Quick check used by the sort-merge buffer builder to skip tuples
    /// whose join field is NULL or stringifies to `"NONE"`.
    pub fn join_key_is_skippable(bytes: &[u8], data_type: crate::sql::types::DataType) -> bool {
        match decode_value(data_type, bytes) {
            Ok(Value::Null) => true,
            Ok(Value::String(s)) => s.trim_end_matches('\0') == "NONE",
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::schema::TableSchema;
    use crate::sql::types::DataType;

    fn catalog_with_int(table: &str, field: &str) -> Catalog {
        let mut schema = TableSchema::new(table);
        schema.add_field(field, DataType::Integer, 0);
        let mut catalog = Catalog::new();
        catalog.register(schema);
        catalog
    }

    #[test]
    fn and_or_evaluate_left_to_right_without_short_circuit() -> Result<()> {
        let catalog = catalog_with_int("t", "a");
        let mut buf = vec![0u8; 8];
        catalog.table("t")?.write_value(&mut buf, "a", &Value::Integer(5))?;

        let mut expr = Expression::new();
        expr.push(Term { left: Operand::Field("t".into(), "a".into()), op: CompareOp::Gt, right: Operand::Int(1), junction: None });
        expr.push(Term { left: Operand::Field("t".into(), "a".into()), op: CompareOp::Lt, right: Operand::Int(3), junction: Some(Junction::Or) });
        // (5 > 1) OR (5 < 3) => true OR false => true
        assert!(expr.evaluate("t", &buf, &catalog)?);
        Ok(())
    }

    #[test]
    fn get_join_expr_splits_cross_table_terms() -> Result<()> {
        let mut r_schema = TableSchema::new("r");
        r_schema.add_field("id", DataType::Integer, 0);
        let mut s_schema = TableSchema::new("s");
        s_schema.add_field("id", DataType::Integer, 0);
        let mut catalog = Catalog::new();
        catalog.register(r_schema);
        catalog.register(s_schema);

        let mut expr = Expression::new();
        expr.push(Term { left: Operand::Field("r".into(), "id".into()), op: CompareOp::Eq, right: Operand::Field("s".into(), "id".into()), junction: None });
        expr.push(Term { left: Operand::Field("r".into(), "id".into()), op: CompareOp::Gt, right: Operand::Int(1), junction: Some(Junction::And) });

        let join_expr = expr.get_join_expr();
        assert_eq!(join_expr.len(), 1);
        assert_eq!(expr.len(), 1);
        assert!(join_expr.terms()[0].is_join_term());
        assert!(!expr.terms()[0].is_join_term());
        Ok(())
    }
}
