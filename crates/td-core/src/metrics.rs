//! Scalar metrics for the headline and SLA sections.

use crate::filter::ViewFilter;
use crate::table::TicketTable;
use serde::Serialize;
use td_common::SlaCategory;
use td_config::rules::{columns, TRACKED_STATUSES};

/// `part / whole` as a percentage; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub label: String,
    pub count: usize,
}

/// Within/breached split with guarded percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaBreakdown {
    pub total: usize,
    pub within: usize,
    pub breached: usize,
    pub within_pct: f64,
    pub breached_pct: f64,
}

impl SlaBreakdown {
    pub fn from_counts(within: usize, breached: usize) -> Self {
        let total = within + breached;
        Self {
            total,
            within,
            breached,
            within_pct: percentage(within, total),
            breached_pct: percentage(breached, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCompliance {
    pub category: SlaCategory,
    #[serde(flatten)]
    pub breakdown: SlaBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub total: usize,
    pub statuses: Vec<StatusCount>,
    /// Every row in view, including uncategorized ones.
    pub sla_overall: SlaBreakdown,
    /// One entry per tracked category, empty ones included.
    pub categories: Vec<CategoryCompliance>,
}

/// Metrics over the derived, state/month-filtered table.
pub fn assemble_metrics(table: &TicketTable, filter: &ViewFilter) -> MetricsReport {
    let scoped = filter.apply_derived(table);
    let status_index = scoped.column_index(columns::STATUS);

    let statuses = TRACKED_STATUSES
        .iter()
        .map(|(status, label)| StatusCount {
            status: status.to_string(),
            label: label.to_string(),
            count: status_index
                .map(|i| scoped.records().iter().filter(|r| r.cell(i) == *status).count())
                .unwrap_or(0),
        })
        .collect();

    let derived: Vec<_> = scoped.records().iter().filter_map(|r| r.sla).collect();
    let breached_all = derived.iter().filter(|s| s.breached).count();

    let categories = SlaCategory::TRACKED
        .iter()
        .map(|&category| {
            let (within, breached) = derived
                .iter()
                .filter(|s| s.category == category)
                .fold((0, 0), |(w, b), s| if s.breached { (w, b + 1) } else { (w + 1, b) });
            CategoryCompliance {
                category,
                breakdown: SlaBreakdown::from_counts(within, breached),
            }
        })
        .collect();

    MetricsReport {
        total: scoped.len(),
        statuses,
        sla_overall: SlaBreakdown::from_counts(derived.len() - breached_all, breached_all),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;
    use crate::table::TicketRecord;

    fn table(rows: &[(&str, &str, &str)]) -> TicketTable {
        let cols = vec![
            columns::STATUS.to_string(),
            columns::CATEGORY.to_string(),
            columns::BREACH_FLAG.to_string(),
        ];
        let records = rows
            .iter()
            .map(|(status, category, breach)| {
                let mut r = TicketRecord::new(vec![
                    status.to_string(),
                    category.to_string(),
                    breach.to_string(),
                ]);
                r.opened_at = parse_timestamp("05-02-2024 14:00");
                r
            })
            .collect();
        TicketTable::new(cols, records)
    }

    #[test]
    fn test_percentage_guard() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_empty_table_reports_zero_percent() {
        let report = assemble_metrics(&table(&[]), &ViewFilter::all());
        assert_eq!(report.total, 0);
        assert_eq!(report.sla_overall.within_pct, 0.0);
        assert_eq!(report.sla_overall.breached_pct, 0.0);
        assert_eq!(report.categories.len(), 3);
        assert!(report.categories.iter().all(|c| c.breakdown.within_pct == 0.0));
    }

    #[test]
    fn test_status_and_sla_counts() {
        let report = assemble_metrics(
            &table(&[
                ("Pendente", "TI - Infra", "Sim"),
                ("Fechado", "TI - Infra", "Não"),
                ("Fechado", "TI - Sistemas > GPM", "Não"),
                ("Novo", "RH", "Sim"),
            ]),
            &ViewFilter::all(),
        );
        assert_eq!(report.total, 4);
        let counts: Vec<usize> = report.statuses.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 2]);
        assert_eq!(report.sla_overall.breached, 2);
        assert_eq!(report.sla_overall.within_pct, 50.0);

        let infra = &report.categories[0];
        assert_eq!(infra.category, SlaCategory::TiInfra);
        assert_eq!(infra.breakdown.total, 2);
        assert_eq!(infra.breakdown.breached_pct, 50.0);
        let telefonia = &report.categories[2];
        assert_eq!(telefonia.breakdown.total, 0);
    }
}
