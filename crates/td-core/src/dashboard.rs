//! Dashboard assembly.
//!
//! Combines a loaded dataset with the current view selections into one
//! serializable document: metrics, chart specifications and the detail
//! table. Every call re-runs the filter pipeline over the immutable table.

use crate::aggregate::{
    department_ranking, location_ranking, monthly_timeline, sla_compliance, sla_summary,
    technician_distribution,
};
use crate::cache::{DataSource, LoadedDataset};
use crate::charts::{self, ChartSpec};
use crate::filter::{month_options, DetailFilter, DetailOptions, ViewFilter};
use crate::loader::LoadReport;
use crate::metrics::{assemble_metrics, MetricsReport};
use crate::table::{TicketRecord, TicketTable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use td_common::{Fingerprint, MonthBucket, StateTag, SCHEMA_VERSION};
use td_config::rules::columns;
use thiserror::Error;
use tracing::debug;

/// Names of the derived columns appended to each detail row.
pub mod derived_columns {
    pub const CATEGORY: &str = "Categoria_SLA";
    pub const BREACHED: &str = "SLA_Excedido";
    pub const MONTH: &str = "Ano_Mes";
    pub const STATE: &str = "Estado";
}

/// Selections for one dashboard render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRequest {
    #[serde(default)]
    pub view: ViewFilter,
    #[serde(default)]
    pub detail: DetailFilter,
    /// Cap on serialized detail rows; the filtered count is unaffected.
    #[serde(default)]
    pub detail_row_limit: Option<usize>,
}

impl DashboardRequest {
    pub fn new(view: ViewFilter) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }
}

/// Keyword selecting every state tag.
pub const ALL_STATES: &str = "all";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown state tag: {0}")]
    UnknownState(String),

    #[error("invalid month: {0}")]
    InvalidMonth(String),
}

/// Raw selections as received from the CLI or a query string.
///
/// No states means the default PE/RN selection; `all` disables the state
/// filter. A detail selection of `Some(vec![])` matches no rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub states: Vec<String>,
    pub months: Vec<String>,
    pub statuses: Option<Vec<String>>,
    pub priorities: Option<Vec<String>>,
    pub departments: Option<Vec<String>>,
}

impl Selections {
    pub fn view_filter(&self) -> Result<ViewFilter, SelectionError> {
        let mut view = if self.states.is_empty() {
            ViewFilter::default_selection()
        } else if self.states.iter().any(|s| s.eq_ignore_ascii_case(ALL_STATES)) {
            ViewFilter::all()
        } else {
            let states = self
                .states
                .iter()
                .map(|s| {
                    s.parse::<StateTag>()
                        .map_err(|_| SelectionError::UnknownState(s.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            ViewFilter::all().with_states(states)
        };
        if !self.months.is_empty() {
            let months = self
                .months
                .iter()
                .map(|m| {
                    m.parse::<MonthBucket>()
                        .map_err(|_| SelectionError::InvalidMonth(m.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            view = view.with_months(months);
        }
        Ok(view)
    }

    pub fn detail_filter(&self) -> DetailFilter {
        let to_set = |values: &Option<Vec<String>>| -> Option<BTreeSet<String>> {
            values.as_ref().map(|v| v.iter().cloned().collect())
        };
        DetailFilter {
            statuses: to_set(&self.statuses),
            priorities: to_set(&self.priorities),
            departments: to_set(&self.departments),
        }
    }

    pub fn into_request(
        self,
        detail_row_limit: Option<usize>,
    ) -> Result<DashboardRequest, SelectionError> {
        Ok(DashboardRequest {
            view: self.view_filter()?,
            detail: self.detail_filter(),
            detail_row_limit,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub label: String,
    pub source: DataSource,
    pub fingerprint: Fingerprint,
    pub load: LoadReport,
    pub loaded_at: String,
    /// Records in the team-scoped table.
    pub team_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterState {
    pub view: ViewFilter,
    pub month_options: Vec<MonthBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub timeline: ChartSpec,
    pub sla_summary: ChartSpec,
    pub sla_compliance: ChartSpec,
    pub departments: Option<ChartSpec>,
    pub locations: Option<ChartSpec>,
    pub technicians: Option<ChartSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailTable {
    pub options: DetailOptions,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub filtered_rows: usize,
    pub truncated: bool,
}

/// Everything the presentation layer renders for one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub schema_version: String,
    pub generated_at: String,
    pub source: SourceInfo,
    pub filters: FilterState,
    pub metrics: MetricsReport,
    pub charts: DashboardCharts,
    pub detail: DetailTable,
}

/// Build the dashboard for `dataset` under `request`.
pub fn assemble(dataset: &LoadedDataset, request: &DashboardRequest) -> Dashboard {
    let table = &dataset.table;
    let view = &request.view;

    let charts = DashboardCharts {
        timeline: charts::timeline_chart(&monthly_timeline(table, view)),
        sla_summary: charts::sla_summary_chart(&sla_summary(table, view)),
        sla_compliance: charts::compliance_chart(&sla_compliance(table, view)),
        departments: department_ranking(table, view).map(|rows| charts::department_chart(&rows)),
        locations: location_ranking(table, view).map(|rows| charts::location_chart(&rows)),
        technicians: technician_distribution(table, view)
            .map(|rows| charts::technician_chart(&rows)),
    };

    let detail = detail_table(table, request);
    debug!(
        fingerprint = dataset.fingerprint.short(),
        team_rows = table.len(),
        detail_rows = detail.filtered_rows,
        "dashboard assembled"
    );

    Dashboard {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        source: SourceInfo {
            label: dataset.source.label(),
            source: dataset.source.clone(),
            fingerprint: dataset.fingerprint.clone(),
            load: dataset.report.clone(),
            loaded_at: dataset.loaded_at.to_rfc3339(),
            team_rows: table.len(),
        },
        filters: FilterState {
            view: view.clone(),
            month_options: month_options(table, view),
        },
        metrics: assemble_metrics(table, view),
        charts,
        detail,
    }
}

fn detail_table(table: &TicketTable, request: &DashboardRequest) -> DetailTable {
    let scoped = request.view.apply_derived(table);
    let filtered = request.detail.apply(&scoped);
    let limit = request.detail_row_limit.unwrap_or(usize::MAX);

    let mut columns: Vec<String> = table.columns().to_vec();
    columns.extend(
        [
            derived_columns::CATEGORY,
            derived_columns::BREACHED,
            derived_columns::MONTH,
            derived_columns::STATE,
        ]
        .map(String::from),
    );

    let rows = filtered
        .records()
        .iter()
        .take(limit)
        .map(|record| detail_row(table.columns(), record))
        .collect();

    DetailTable {
        options: DetailOptions::from_table(table),
        columns,
        rows,
        filtered_rows: filtered.len(),
        truncated: filtered.len() > limit,
    }
}

fn detail_row(header: &[String], record: &TicketRecord) -> Map<String, Value> {
    let mut row = Map::new();
    for (index, name) in header.iter().enumerate() {
        let value = if name == columns::OPENED_AT {
            timestamp_value(record.opened_at)
        } else if name == columns::UPDATED_AT {
            timestamp_value(record.updated_at)
        } else {
            Value::String(record.cell(index).to_string())
        };
        row.insert(name.clone(), value);
    }
    if let Some(sla) = record.sla {
        row.insert(
            derived_columns::CATEGORY.into(),
            Value::String(sla.category.as_str().into()),
        );
        row.insert(derived_columns::BREACHED.into(), Value::Bool(sla.breached));
        row.insert(derived_columns::MONTH.into(), Value::String(sla.month.to_string()));
        row.insert(derived_columns::STATE.into(), Value::String(sla.state.as_str().into()));
    }
    row
}

fn timestamp_value(ts: Option<chrono::NaiveDateTime>) -> Value {
    match ts {
        Some(ts) => Value::String(ts.format(columns::DATE_FORMAT).to_string()),
        None => Value::Null,
    }
}
