//! Aggregations feeding the dashboard charts.
//!
//! Every function is pure over its inputs: the team-scoped table and a
//! [`ViewFilter`]. Functions that need derived SLA columns derive them on
//! demand through [`crate::sla::ensure_sla`].

use crate::filter::ViewFilter;
use crate::sla::month_of;
use crate::table::{clean_text, is_missing, TicketTable};
use crate::team::split_technicians;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use td_common::{MonthBucket, SlaCategory};
use td_config::rules::{columns, DEPARTMENT_TOP_N, LOCATION_TOP_N};

/// Label of the all-categories row in the SLA summary.
pub const TOTAL_LABEL: &str = "Total";

/// One labelled count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: usize,
}

/// Tickets opened in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: MonthBucket,
    pub count: usize,
}

/// Count for one (month, category, breached) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceRow {
    pub month: MonthBucket,
    pub category: SlaCategory,
    pub breached: bool,
    pub count: usize,
}

/// Within-SLA and breached counts for one category or the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaSummaryRow {
    pub category: String,
    pub within: usize,
    pub breached: usize,
}

impl SlaSummaryRow {
    pub fn total(&self) -> usize {
        self.within + self.breached
    }
}

/// Count values in first-appearance order, then stable-sort by count.
///
/// Missing values are skipped.
pub fn value_counts<'a, I>(values: I) -> Vec<CountRow>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut rows: Vec<CountRow> = Vec::new();
    for value in values {
        if is_missing(value) {
            continue;
        }
        match positions.get(value) {
            Some(&pos) => rows[pos].count += 1,
            None => {
                positions.insert(value, rows.len());
                rows.push(CountRow {
                    label: value.to_string(),
                    count: 1,
                });
            }
        }
    }
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Tickets per opening month, ascending; months without tickets are absent.
///
/// Only the state part of `filter` is honoured; undated rows never count.
pub fn monthly_timeline(table: &TicketTable, filter: &ViewFilter) -> Vec<MonthlyPoint> {
    let scoped = filter.without_months().apply(table);
    let mut counts: BTreeMap<MonthBucket, usize> = BTreeMap::new();
    for record in scoped.records() {
        let month = match record.sla {
            Some(sla) => Some(sla.month),
            None => record.opened_at.as_ref().and_then(month_of),
        };
        if let Some(month) = month {
            *counts.entry(month).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(month, count)| MonthlyPoint { month, count })
        .collect()
}

fn ranking(
    table: &TicketTable,
    filter: &ViewFilter,
    column: &str,
    top: usize,
) -> Option<Vec<CountRow>> {
    let scoped = filter.apply(table);
    let mut rows = value_counts(scoped.values(column)?);
    rows.truncate(top);
    Some(rows)
}

/// Top departments by ticket count; `None` without a department column.
pub fn department_ranking(table: &TicketTable, filter: &ViewFilter) -> Option<Vec<CountRow>> {
    ranking(table, filter, columns::DEPARTMENT, DEPARTMENT_TOP_N)
}

/// Top locations by ticket count; `None` without a location column.
pub fn location_ranking(table: &TicketTable, filter: &ViewFilter) -> Option<Vec<CountRow>> {
    ranking(table, filter, columns::LOCATION, LOCATION_TOP_N)
}

/// Counts by month, tracked category and breach flag, in group-key order.
pub fn sla_compliance(table: &TicketTable, filter: &ViewFilter) -> Vec<ComplianceRow> {
    let scoped = filter.apply_derived(table);
    let mut groups: BTreeMap<(MonthBucket, SlaCategory, bool), usize> = BTreeMap::new();
    for sla in scoped.records().iter().filter_map(|r| r.sla) {
        if sla.category.is_tracked() {
            *groups.entry((sla.month, sla.category, sla.breached)).or_default() += 1;
        }
    }
    groups
        .into_iter()
        .map(|((month, category, breached), count)| ComplianceRow {
            month,
            category,
            breached,
            count,
        })
        .collect()
}

/// Per-category within/breached counts plus a `Total` row.
///
/// Categories without tickets are omitted; the total is always present.
pub fn sla_summary(table: &TicketTable, filter: &ViewFilter) -> Vec<SlaSummaryRow> {
    let scoped = filter.apply_derived(table);
    let mut per_category: BTreeMap<SlaCategory, (usize, usize)> = BTreeMap::new();
    for sla in scoped.records().iter().filter_map(|r| r.sla) {
        if sla.category.is_tracked() {
            let entry = per_category.entry(sla.category).or_default();
            if sla.breached {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }
    }

    let mut rows = Vec::with_capacity(SlaCategory::TRACKED.len() + 1);
    let (mut total_within, mut total_breached) = (0, 0);
    for category in SlaCategory::TRACKED {
        if let Some(&(within, breached)) = per_category.get(&category) {
            total_within += within;
            total_breached += breached;
            rows.push(SlaSummaryRow {
                category: category.as_str().to_string(),
                within,
                breached,
            });
        }
    }
    rows.push(SlaSummaryRow {
        category: TOTAL_LABEL.to_string(),
        within: total_within,
        breached: total_breached,
    });
    rows
}

/// Tickets per individual technician; multi-technician tickets count once
/// for each name. `None` when the column is absent or nobody is mentioned.
pub fn technician_distribution(
    table: &TicketTable,
    filter: &ViewFilter,
) -> Option<Vec<CountRow>> {
    let scoped = filter.apply(table);
    let cleaned: Vec<String> = scoped.values(columns::TECHNICIAN)?.map(clean_text).collect();
    let names = cleaned
        .iter()
        .filter(|field| !is_missing(field))
        .flat_map(|field| split_technicians(field));
    let rows = value_counts(names);
    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}
