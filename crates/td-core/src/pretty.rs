//! Plain-text rendering of a dashboard for `--format pretty`.

use crate::charts::ChartSpec;
use crate::dashboard::Dashboard;
use crate::metrics::SlaBreakdown;
use serde_json::Value;
use td_common::MonthBucket;

// ---------------------------------------------------------------------------
// Rendering to text
// ---------------------------------------------------------------------------

fn render_breakdown(label: &str, b: &SlaBreakdown) -> String {
    format!(
        "  {:22} total={:<5} dentro={:<5} ({:.1}%)  fora={:<5} ({:.1}%)",
        label, b.total, b.within, b.within_pct, b.breached, b.breached_pct,
    )
}

/// Render `label: count` pairs from a chart's data rows.
fn render_counts(spec: &ChartSpec, label_field: &str) -> Vec<String> {
    spec.data
        .iter()
        .map(|row| {
            let label = row.get(label_field).and_then(Value::as_str).unwrap_or("?");
            let count = row.get("count").and_then(Value::as_u64).unwrap_or(0);
            format!("    {:40} {:>6}", label, count)
        })
        .collect()
}

fn render_section(lines: &mut Vec<String>, spec: Option<&ChartSpec>, title: &str, field: &str) {
    lines.push(String::new());
    lines.push(format!("{}:", title));
    match spec {
        Some(spec) if !spec.data.is_empty() => lines.extend(render_counts(spec, field)),
        _ => lines.push("    (sem dados)".to_string()),
    }
}

/// Render the whole dashboard as multi-line text.
pub fn render_dashboard(dash: &Dashboard) -> String {
    let mut lines = Vec::new();
    let m = &dash.metrics;

    lines.push(format!(
        "Fonte: {}  ({} registros da equipe, {} tentativa(s), separador {:?}, {})",
        dash.source.label,
        dash.source.team_rows,
        dash.source.load.attempts,
        dash.source.load.delimiter,
        dash.source.load.encoding,
    ));
    let states: Vec<&str> = dash.filters.view.states.iter().map(|s| s.as_str()).collect();
    lines.push(format!(
        "Estados: {}  Meses: {}",
        if states.is_empty() { "todos".to_string() } else { states.join(", ") },
        render_months(&dash.filters.view.months, &dash.filters.month_options),
    ));

    lines.push(String::new());
    lines.push(format!("Total de tickets: {}", m.total));
    for s in &m.statuses {
        lines.push(format!("  {:16} {:>6}", s.label, s.count));
    }

    lines.push(String::new());
    lines.push("Compliance SLA:".to_string());
    lines.push(render_breakdown("Geral", &m.sla_overall));
    for c in &m.categories {
        lines.push(render_breakdown(c.category.as_str(), &c.breakdown));
    }

    render_section(&mut lines, Some(&dash.charts.timeline), "Tickets por mês", "month");
    render_section(&mut lines, dash.charts.departments.as_ref(), "Top departamentos", "department");
    render_section(&mut lines, dash.charts.locations.as_ref(), "Top localizações", "location");
    render_section(&mut lines, dash.charts.technicians.as_ref(), "Técnicos", "technician");

    lines.push(String::new());
    lines.push(format!(
        "Detalhes: {} registro(s) filtrado(s){}",
        dash.detail.filtered_rows,
        if dash.detail.truncated { " (lista truncada)" } else { "" },
    ));

    lines.join("\n")
}

fn render_months(
    selected: &std::collections::BTreeSet<MonthBucket>,
    options: &[MonthBucket],
) -> String {
    let shown: Vec<String> = if selected.is_empty() {
        options.iter().map(ToString::to_string).collect()
    } else {
        selected.iter().map(ToString::to_string).collect()
    };
    if shown.is_empty() {
        "-".to_string()
    } else {
        shown.join(", ")
    }
}

/// Render month options one per line.
pub fn render_months_list(months: &[MonthBucket]) -> String {
    months
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
