//! SLA derivation stage.
//!
//! Adds category, breach flag, month bucket and state tag to each row and
//! drops rows without an opening timestamp. The stage is a pure function of
//! the raw cells, so running it on an already derived table yields the same
//! values.

use crate::table::{clean_text, SlaFields, TicketRecord, TicketTable};
use chrono::{Datelike, NaiveDateTime};
use std::borrow::Cow;
use td_common::{MonthBucket, SlaCategory, StateTag};
use td_config::rules::{columns, BREACH_TOKEN, CATEGORY_RULES, STATE_RULES};
use tracing::debug;

/// Category for a category path; the last matching rule wins.
pub fn categorize(category_path: &str) -> SlaCategory {
    CATEGORY_RULES
        .iter()
        .filter(|rule| category_path.contains(rule.pattern))
        .last()
        .map(|rule| rule.category)
        .unwrap_or(SlaCategory::Outros)
}

/// State tag for an entity path; the last matching rule wins.
pub fn state_tag(entity_path: &str) -> StateTag {
    let cleaned = clean_text(entity_path);
    STATE_RULES
        .iter()
        .filter(|rule| rule.matches(&cleaned))
        .last()
        .map(|rule| rule.tag)
        .unwrap_or(StateTag::Outros)
}

/// Whether the breach flag cell marks a missed deadline.
pub fn is_breached(flag: &str) -> bool {
    clean_text(flag) == BREACH_TOKEN
}

pub fn month_of(opened_at: &NaiveDateTime) -> Option<MonthBucket> {
    MonthBucket::new(opened_at.year(), opened_at.month())
}

struct SlaColumns {
    category: Option<usize>,
    breach: Option<usize>,
    entity: Option<usize>,
}

impl SlaColumns {
    fn locate(table: &TicketTable) -> Self {
        Self {
            category: table.column_index(columns::CATEGORY),
            breach: table.column_index(columns::BREACH_FLAG),
            entity: table.column_index(columns::ENTITY),
        }
    }

    fn derive(&self, record: &TicketRecord) -> Option<SlaFields> {
        let month = record.opened_at.as_ref().and_then(month_of)?;
        let cell = |idx: Option<usize>| idx.map(|i| record.cell(i)).unwrap_or("");
        Some(SlaFields {
            category: categorize(cell(self.category)),
            breached: is_breached(cell(self.breach)),
            month,
            state: state_tag(cell(self.entity)),
        })
    }
}

/// Derive the SLA columns into a new table.
///
/// Missing columns degrade to `Outros` / not breached; rows without an
/// opening timestamp are dropped.
pub fn derive_sla(table: &TicketTable) -> TicketTable {
    let located = SlaColumns::locate(table);
    let mut derived = table.filtered(|record| record.opened_at.is_some());
    for record in derived.records_mut() {
        record.sla = located.derive(record);
    }
    debug!(
        rows_in = table.len(),
        rows_out = derived.len(),
        "sla columns derived"
    );
    derived.with_sla_derived()
}

/// Borrow the table when it already carries SLA columns, derive otherwise.
pub fn ensure_sla(table: &TicketTable) -> Cow<'_, TicketTable> {
    if table.is_sla_derived() {
        Cow::Borrowed(table)
    } else {
        Cow::Owned(derive_sla(table))
    }
}
