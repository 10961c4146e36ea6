//! Ordered list of projected attributes, each carrying a `hidden` flag
//! used to flow join keys through a projection the client never asked
//! for.

use crate::sql::schema::Catalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub table: String,
    pub name: String,
    /// Flows through a Project solely to satisfy a downstream join; must
    /// not be surfaced to the client.
    pub hidden: bool,
}

impl Attribute {
    pub fn visible(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self { table: table.into(), name: name.into(), hidden: false }
    }

    pub fn hidden(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self { table: table.into(), name: name.into(), hidden: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList {
    items: Vec<Attribute>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: Attribute) {
        self.items.push(attr);
    }

    pub fn prepend(&mut self, attr: Attribute) {
        self.items.insert(0, attr);
    }

    pub fn remove_at(&mut self, idx: usize) -> Attribute {
        self.items.remove(idx)
    }

    pub fn find(&self, table: &str, name: &str) -> Option<usize> {
        self.items.iter().position(|a| a.table == table && a.name == name)
    }

    pub fn hide(&mut self, table: &str, name: &str) {
        if let Some(idx) = self.find(table, name) {
            self.items[idx].hidden = true;
        }
    }

    pub fn unhide(&mut self, table: &str, name: &str) {
        if let Some(idx) = self.find(table, name) {
            self.items[idx].hidden = false;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter().filter(|a| !a.hidden)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.items.iter().any(|a| a.table == table)
    }

    /// Every field of `table` present in the catalog, in catalog order.
    /// Used to expand a `*` wildcard that is scoped to a single relation.
    pub fn all_fields_of(catalog: &Catalog, table: &str) -> crate::error::Result<Self> {
        let schema = catalog.table(table)?;
        let mut list = Self::new();
        for field in &schema.fields {
            list.push(Attribute::visible(table, &field.name));
        }
        Ok(list)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Attribute) -> bool) {
        self.items.retain(|a| keep(a));
    }
}

impl std::fmt::Display for AttributeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.items.iter().map(|a| format!("{}.{}", a.table, a.name)).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_string_renders_comma_separated_pairs() {
        let mut list = AttributeList::new();
        list.push(Attribute::visible("r", "a"));
        list.push(Attribute::visible("r", "b"));
        assert_eq!(list.to_string(), "r.a, r.b");
    }

    #[test]
    fn hide_then_unhide_round_trips() {
        let mut list = AttributeList::new();
        list.push(Attribute::visible("r", "id"));
        list.hide("r", "id");
        assert!(list.iter().next().unwrap().hidden);
        list.unhide("r", "id");
        assert!(!list.iter().next().unwrap().hidden);
    }
}
