//! Declarative chart specifications.
//!
//! Each builder turns an aggregate into a [`ChartSpec`]: chart type, field
//! bindings, labels, color mapping and the data rows. Rendering belongs to
//! whatever front end consumes the JSON.

use crate::aggregate::{ComplianceRow, CountRow, MonthlyPoint, SlaSummaryRow};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use td_config::rules::legend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Field binding with its axis label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub field: String,
    pub label: String,
}

impl Axis {
    fn new(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
        }
    }
}

/// Series coloring by a categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorBinding {
    pub field: String,
    pub map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_column: Option<String>,
    /// Field printed on each mark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub markers: bool,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_angle: Option<i32>,
    pub data: Vec<Value>,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: &str, x: Axis, y: Axis, height: u32) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x,
            y,
            orientation: Orientation::Vertical,
            color: None,
            facet_column: None,
            text: None,
            markers: false,
            height,
            tick_angle: None,
            data: Vec::new(),
        }
    }
}

/// Legend label for a breach flag.
pub fn sla_status_label(breached: bool) -> &'static str {
    if breached {
        legend::BREACHED
    } else {
        legend::WITHIN_SLA
    }
}

fn sla_color_binding(field: &str) -> ColorBinding {
    ColorBinding {
        field: field.to_string(),
        map: BTreeMap::from([
            (legend::WITHIN_SLA.to_string(), legend::WITHIN_SLA_COLOR.to_string()),
            (legend::BREACHED.to_string(), legend::BREACHED_COLOR.to_string()),
        ]),
    }
}

pub fn timeline_chart(points: &[MonthlyPoint]) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::Line,
        "Evolução Mensal de Tickets Criados",
        Axis::new("month", "Mês/Ano"),
        Axis::new("count", "Número de Tickets"),
        400,
    );
    spec.markers = true;
    spec.text = Some("count".to_string());
    spec.tick_angle = Some(-45);
    spec.data = points
        .iter()
        .map(|p| json!({ "month": p.month.to_string(), "count": p.count }))
        .collect();
    spec
}

pub fn department_chart(rows: &[CountRow]) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::Bar,
        "Top 10 Departamentos com Mais Tickets",
        Axis::new("count", "Quantidade de Tickets"),
        Axis::new("department", "Departamento"),
        500,
    );
    spec.orientation = Orientation::Horizontal;
    spec.data = rows
        .iter()
        .map(|r| json!({ "department": r.label, "count": r.count }))
        .collect();
    spec
}

pub fn location_chart(rows: &[CountRow]) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::Bar,
        "Tickets por Localização (Top 15)",
        Axis::new("location", "Localização"),
        Axis::new("count", "Quantidade de Tickets"),
        400,
    );
    spec.tick_angle = Some(-45);
    spec.data = rows
        .iter()
        .map(|r| json!({ "location": r.label, "count": r.count }))
        .collect();
    spec
}

pub fn compliance_chart(rows: &[ComplianceRow]) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::Bar,
        "Compliance SLA por Mês e Categoria",
        Axis::new("month", "Mês/Ano"),
        Axis::new("count", "Número de Tickets"),
        500,
    );
    spec.color = Some(sla_color_binding("status"));
    spec.facet_column = Some("category".to_string());
    spec.tick_angle = Some(-45);
    spec.data = rows
        .iter()
        .map(|r| {
            json!({
                "month": r.month.to_string(),
                "category": r.category.as_str(),
                "status": sla_status_label(r.breached),
                "count": r.count,
            })
        })
        .collect();
    spec
}

/// Two bars per row: within SLA and breached.
pub fn sla_summary_chart(rows: &[SlaSummaryRow]) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::Bar,
        "Resumo Compliance SLA por Categoria",
        Axis::new("category", "Categoria"),
        Axis::new("count", "Número de Tickets"),
        400,
    );
    spec.color = Some(sla_color_binding("status"));
    spec.text = Some("count".to_string());
    spec.data = rows
        .iter()
        .flat_map(|r| {
            [(false, r.within), (true, r.breached)].map(|(breached, count)| {
                json!({
                    "category": r.category,
                    "status": sla_status_label(breached),
                    "count": count,
                })
            })
        })
        .collect();
    spec
}

pub fn technician_chart(rows: &[CountRow]) -> ChartSpec {
    let mut spec = ChartSpec::new(
        ChartKind::Pie,
        "Distribuição de Tickets por Técnico",
        Axis::new("technician", "Técnico"),
        Axis::new("count", "Tickets"),
        400,
    );
    spec.text = Some("percent+label".to_string());
    spec.data = rows
        .iter()
        .map(|r| json!({ "technician": r.label, "count": r.count }))
        .collect();
    spec
}
