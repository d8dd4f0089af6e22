//! View and detail filters.
//!
//! A [`ViewFilter`] narrows the dashboard by state tag and month bucket; an
//! empty set means "no filtering" on that axis. A [`DetailFilter`] narrows
//! the detail table by status, priority and department; there `None` means
//! every value and an explicit empty selection matches nothing.

use crate::sla::ensure_sla;
use crate::table::{TicketRecord, TicketTable};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use td_common::{MonthBucket, StateTag};
use td_config::rules::{columns, DEFAULT_STATES};

/// State and month selection shared by every aggregate view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    #[serde(default)]
    pub states: BTreeSet<StateTag>,
    #[serde(default)]
    pub months: BTreeSet<MonthBucket>,
}

impl ViewFilter {
    /// No filtering at all.
    pub fn all() -> Self {
        Self::default()
    }

    /// The initial selection: PE and RN, every month.
    pub fn default_selection() -> Self {
        Self::all().with_states(DEFAULT_STATES)
    }

    pub fn with_states(mut self, states: impl IntoIterator<Item = StateTag>) -> Self {
        self.states = states.into_iter().collect();
        self
    }

    pub fn with_months(mut self, months: impl IntoIterator<Item = MonthBucket>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    /// Same states, every month.
    pub fn without_months(&self) -> Self {
        Self {
            states: self.states.clone(),
            months: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.months.is_empty()
    }

    /// Whether a derived row passes the filter. Rows without SLA columns never do.
    pub fn admits(&self, record: &TicketRecord) -> bool {
        let Some(sla) = record.sla else {
            return false;
        };
        (self.states.is_empty() || self.states.contains(&sla.state))
            && (self.months.is_empty() || self.months.contains(&sla.month))
    }

    /// Derive SLA columns and keep the admitted rows.
    pub fn apply_derived(&self, table: &TicketTable) -> TicketTable {
        let derived = ensure_sla(table);
        if self.is_empty() {
            return derived.into_owned();
        }
        derived.filtered(|record| self.admits(record))
    }

    /// Like [`ViewFilter::apply_derived`], but an empty filter returns the
    /// input untouched, rows without an opening timestamp included.
    pub fn apply<'a>(&self, table: &'a TicketTable) -> Cow<'a, TicketTable> {
        if self.is_empty() {
            Cow::Borrowed(table)
        } else {
            Cow::Owned(self.apply_derived(table))
        }
    }
}

/// Status, priority and department selection for the detail table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFilter {
    #[serde(default)]
    pub statuses: Option<BTreeSet<String>>,
    #[serde(default)]
    pub priorities: Option<BTreeSet<String>>,
    #[serde(default)]
    pub departments: Option<BTreeSet<String>>,
}

impl DetailFilter {
    pub fn is_unrestricted(&self) -> bool {
        self.statuses.is_none() && self.priorities.is_none() && self.departments.is_none()
    }

    /// Keep rows whose status, priority and department are all selected.
    ///
    /// A selection on a column the table lacks matches nothing.
    pub fn apply(&self, table: &TicketTable) -> TicketTable {
        if self.is_unrestricted() {
            return table.clone();
        }
        let checks: Vec<(Option<usize>, &BTreeSet<String>)> = [
            (columns::STATUS, &self.statuses),
            (columns::PRIORITY, &self.priorities),
            (columns::DEPARTMENT, &self.departments),
        ]
        .into_iter()
        .filter_map(|(name, selection)| {
            selection
                .as_ref()
                .map(|set| (table.column_index(name), set))
        })
        .collect();

        table.filtered(|record| {
            checks.iter().all(|(index, set)| match index {
                Some(i) => set.contains(record.cell(*i)),
                None => false,
            })
        })
    }
}

/// Selectable values for the detail filter, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailOptions {
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub departments: Vec<String>,
}

impl DetailOptions {
    pub fn from_table(table: &TicketTable) -> Self {
        Self {
            statuses: unique_values(table, columns::STATUS),
            priorities: unique_values(table, columns::PRIORITY),
            departments: unique_values(table, columns::DEPARTMENT),
        }
    }
}

fn unique_values(table: &TicketTable, column: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    if let Some(values) = table.values(column) {
        for value in values {
            if seen.insert(value) {
                out.push(value.to_string());
            }
        }
    }
    out
}

/// Sorted month buckets present after the state part of `filter`.
pub fn month_options(table: &TicketTable, filter: &ViewFilter) -> Vec<MonthBucket> {
    let scoped = filter.without_months().apply_derived(table);
    scoped
        .records()
        .iter()
        .filter_map(|r| r.sla.map(|s| s.month))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;

    fn table() -> TicketTable {
        let cols = vec![
            columns::STATUS.to_string(),
            columns::PRIORITY.to_string(),
            columns::ENTITY.to_string(),
        ];
        let rows = [
            ("Novo", "Alta", "Ticket > TI > Cng PE", Some("01-03-2024 09:00")),
            ("Fechado", "Baixa", "Ticket > TI > Cng PE > Cng RN", Some("02-04-2024 09:00")),
            ("Novo", "Baixa", "Ticket > Outro", Some("03-04-2024 09:00")),
            ("Novo", "Alta", "Ticket > TI > Cng PE", None),
        ];
        let records = rows
            .iter()
            .map(|(s, p, e, d)| {
                let mut r = TicketRecord::new(vec![s.to_string(), p.to_string(), e.to_string()]);
                r.opened_at = d.and_then(parse_timestamp);
                r
            })
            .collect();
        TicketTable::new(cols, records)
    }

    fn month(s: &str) -> MonthBucket {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_filter_borrows_input() {
        let t = table();
        let out = ViewFilter::all().apply(&t);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_borrowed_view_outlives_filter() {
        let t = table();
        let out = {
            let filter = ViewFilter::all();
            filter.apply(&t)
        };
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_state_filter_drops_undated_and_other_states() {
        let t = table();
        let out = ViewFilter::default_selection().apply(&t);
        assert_eq!(out.len(), 2);
        assert!(out.is_sla_derived());
    }

    #[test]
    fn test_month_filter() {
        let t = table();
        let out = ViewFilter::all().with_months([month("2024-04")]).apply(&t);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_apply_derived_empty_filter_still_drops_undated() {
        let t = table();
        assert_eq!(ViewFilter::all().apply_derived(&t).len(), 3);
    }

    #[test]
    fn test_month_options_follow_state_filter() {
        let t = table();
        assert_eq!(
            month_options(&t, &ViewFilter::all()),
            vec![month("2024-03"), month("2024-04")]
        );
        let pe_only = ViewFilter::all()
            .with_states([StateTag::Pe])
            .with_months([month("2024-04")]);
        assert_eq!(month_options(&t, &pe_only), vec![month("2024-03")]);
    }

    #[test]
    fn test_detail_filter_selection_semantics() {
        let t = table();
        assert_eq!(DetailFilter::default().apply(&t).len(), 4);

        let only_new = DetailFilter {
            statuses: Some(["Novo".to_string()].into_iter().collect()),
            ..Default::default()
        };
        assert_eq!(only_new.apply(&t).len(), 3);

        let nothing = DetailFilter {
            priorities: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert_eq!(nothing.apply(&t).len(), 0);

        // No department column in this table.
        let by_dept = DetailFilter {
            departments: Some(["TI".to_string()].into_iter().collect()),
            ..Default::default()
        };
        assert_eq!(by_dept.apply(&t).len(), 0);
    }

    #[test]
    fn test_detail_options_first_appearance() {
        let opts = DetailOptions::from_table(&table());
        assert_eq!(opts.statuses, vec!["Novo", "Fechado"]);
        assert_eq!(opts.priorities, vec!["Alta", "Baixa"]);
        assert!(opts.departments.is_empty());
    }
}
