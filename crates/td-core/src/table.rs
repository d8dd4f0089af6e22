//! In-memory ticket table.
//!
//! A [`TicketTable`] keeps every source column as text so the detail view can
//! show the export verbatim, plus the two parsed timestamps and, once the SLA
//! stage has run, the derived classification of each row.

use chrono::NaiveDateTime;
use serde::Serialize;
use td_common::{MonthBucket, SlaCategory, StateTag};

/// Columns derived by the SLA stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlaFields {
    pub category: SlaCategory,
    pub breached: bool,
    pub month: MonthBucket,
    pub state: StateTag,
}

/// One ticket row.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRecord {
    cells: Vec<String>,
    pub opened_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub sla: Option<SlaFields>,
}

impl TicketRecord {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            opened_at: None,
            updated_at: None,
            sla: None,
        }
    }

    /// Cell text at `index`; empty when the row is shorter than the header.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub(crate) fn set_cell(&mut self, index: usize, value: String) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, String::new());
        }
        self.cells[index] = value;
    }
}

/// Ordered ticket rows sharing one header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketTable {
    columns: Vec<String>,
    records: Vec<TicketRecord>,
    sla_derived: bool,
}

impl TicketTable {
    pub fn new(columns: Vec<String>, records: Vec<TicketRecord>) -> Self {
        Self {
            columns,
            records,
            sla_derived: false,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[TicketRecord] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [TicketRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate a column's values in row order, or `None` if absent.
    pub fn values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let index = self.column_index(name)?;
        Some(self.records.iter().map(move |r| r.cell(index)))
    }

    /// Whether every row carries [`SlaFields`].
    pub fn is_sla_derived(&self) -> bool {
        self.sla_derived
    }

    pub(crate) fn with_sla_derived(mut self) -> Self {
        self.sla_derived = true;
        self
    }

    /// New table with the rows matching `keep`; the header is shared.
    pub fn filtered<F>(&self, keep: F) -> TicketTable
    where
        F: Fn(&TicketRecord) -> bool,
    {
        TicketTable {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
            sla_derived: self.sla_derived,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<TicketRecord>) {
        (self.columns, self.records)
    }
}

/// Strip surrounding whitespace, then drop every double quote.
pub fn clean_text(value: &str) -> String {
    value.trim().replace('"', "")
}

/// Blank or the textual missing marker.
pub fn is_missing(value: &str) -> bool {
    value.is_empty() || value == "nan"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TicketTable {
        TicketTable::new(
            vec!["Status".into(), "Localização".into()],
            vec![
                TicketRecord::new(vec!["Novo".into(), "Recife".into()]),
                TicketRecord::new(vec!["Fechado".into()]),
            ],
        )
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let t = table();
        let idx = t.column_index("Localização").expect("column");
        assert_eq!(t.records()[1].cell(idx), "");
    }

    #[test]
    fn test_values_absent_column() {
        let t = table();
        assert!(t.values("Entidade").is_none());
        let statuses: Vec<&str> = t.values("Status").expect("status").collect();
        assert_eq!(statuses, vec!["Novo", "Fechado"]);
    }

    #[test]
    fn test_filtered_keeps_header_and_order() {
        let t = table();
        let idx = t.column_index("Status").unwrap();
        let only_closed = t.filtered(|r| r.cell(idx) == "Fechado");
        assert_eq!(only_closed.columns(), t.columns());
        assert_eq!(only_closed.len(), 1);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  \"Sim\" "), "Sim");
        assert_eq!(clean_text("a\"b"), "ab");
        assert!(is_missing(""));
        assert!(is_missing("nan"));
        assert!(!is_missing("Nan Silva"));
    }
}
