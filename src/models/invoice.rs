use std::collections::HashMap;

/// Existing invoices keyed by (insurer, invoice number).
/// Built once per run from the store, read-only during resolution.
#[derive(Debug, Clone, Default)]
pub struct InvoiceIndex {
    entries: HashMap<(i64, String), i64>,
}

impl InvoiceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index for one insurer from (invoice_id, invoice_number) rows
    pub fn for_insurer(insurer_id: i64, rows: impl IntoIterator<Item = (i64, String)>) -> Self {
        let mut index = Self::new();
        for (invoice_id, invoice_number) in rows {
            index.insert(insurer_id, invoice_number, invoice_id);
        }
        index
    }

    pub fn insert(&mut self, insurer_id: i64, invoice_number: impl Into<String>, invoice_id: i64) {
        self.entries.insert((insurer_id, invoice_number.into()), invoice_id);
    }

    /// Exact, case-sensitive lookup scoped to one insurer
    pub fn lookup(&self, insurer_id: i64, invoice_number: &str) -> Option<i64> {
        self.entries
            .get(&(insurer_id, invoice_number.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_and_insurer_scoped() {
        let mut index = InvoiceIndex::for_insurer(7, vec![(100, "FE-001".to_string())]);
        index.insert(8, "FE-002", 200);

        assert_eq!(index.lookup(7, "FE-001"), Some(100));
        assert_eq!(index.lookup(7, "fe-001"), None);
        assert_eq!(index.lookup(8, "FE-001"), None);
        assert_eq!(index.lookup(8, "FE-002"), Some(200));
        assert_eq!(index.len(), 2);
    }
}
