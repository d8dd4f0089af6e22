//! Fixed roster and classification rules.
//!
//! These are compiled in and never change for the lifetime of the process.
//! Rules are plain data so each one can be exercised on its own.

use td_common::{SlaCategory, StateTag};

/// The four technicians whose tickets the dashboard covers.
pub const TEAM_ROSTER: [&str; 4] = [
    "Anthony Valdemar Lopes da Silva",
    "Jéssica Bernardo",
    "Thiago Augusto Silva Martins",
    "Fagner Brito",
];

/// Separator variants for multi-technician assignments, tried in order.
pub const TECHNICIAN_SEPARATORS: [&str; 4] = ["<br>", " <br>", "<br> ", " <br> "];

/// Returns true when `name` is exactly one of the roster entries.
pub fn is_team_member(name: &str) -> bool {
    TEAM_ROSTER.contains(&name)
}

/// Category-path containment rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub pattern: &'static str,
    pub category: SlaCategory,
}

/// Applied in order; a later match overwrites an earlier one.
pub const CATEGORY_RULES: [CategoryRule; 3] = [
    CategoryRule {
        pattern: "TI - Infra",
        category: SlaCategory::TiInfra,
    },
    CategoryRule {
        pattern: "TI - Sistemas > GPM",
        category: SlaCategory::TiSistemaGpm,
    },
    CategoryRule {
        pattern: "TI - Infra > Telefonia",
        category: SlaCategory::TiSistemaTelefonia,
    },
];

/// Entity-path containment rule with an optional exclusion substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRule {
    pub pattern: &'static str,
    pub exclude: Option<&'static str>,
    pub tag: StateTag,
}

impl StateRule {
    pub fn matches(&self, entity: &str) -> bool {
        entity.contains(self.pattern) && !self.exclude.is_some_and(|ex| entity.contains(ex))
    }
}

/// Applied in order; a later match overwrites an earlier one.
pub const STATE_RULES: [StateRule; 2] = [
    StateRule {
        pattern: "Ticket > TI > Cng PE",
        exclude: Some("Cng RN"),
        tag: StateTag::Pe,
    },
    StateRule {
        pattern: "Ticket > TI > Cng PE > Cng RN",
        exclude: None,
        tag: StateTag::Rn,
    },
];

/// State tags selected when the user has not chosen any.
pub const DEFAULT_STATES: [StateTag; 2] = [StateTag::Pe, StateTag::Rn];

/// Breach flag value meaning the resolution deadline was missed.
pub const BREACH_TOKEN: &str = "Sim";

/// Status values counted individually in the headline metrics, with labels.
pub const TRACKED_STATUSES: [(&str, &str); 4] = [
    ("Pendente", "Pendentes"),
    ("Em atendimento (atribuído)", "Em Atendimento"),
    ("Solucionado", "Solucionados"),
    ("Fechado", "Fechados"),
];

pub const DEPARTMENT_TOP_N: usize = 10;
pub const LOCATION_TOP_N: usize = 15;

/// Source column names in the helpdesk export.
pub mod columns {
    pub const OPENED_AT: &str = "Data de abertura";
    pub const UPDATED_AT: &str = "Última atualização";
    pub const STATUS: &str = "Status";
    pub const PRIORITY: &str = "Prioridade";
    pub const LOCATION: &str = "Localização";
    pub const DEPARTMENT: &str = "Plug-ins - Departamento - Departamento";
    pub const ENTITY: &str = "Entidade";
    pub const TECHNICIAN: &str = "Atribuído - Técnico";
    pub const BREACH_FLAG: &str = "Tempo para resolver excedido";
    pub const CATEGORY: &str = "Categoria";

    /// Columns parsed as `%d-%m-%Y %H:%M` timestamps.
    pub const DATE_COLUMNS: [&str; 2] = [OPENED_AT, UPDATED_AT];

    /// Columns whose values are trimmed and unquoted at load time.
    pub const TEXT_COLUMNS: [&str; 4] = [STATUS, PRIORITY, LOCATION, DEPARTMENT];

    pub const DATE_FORMAT: &str = "%d-%m-%Y %H:%M";
}

/// Legend labels and colors for the two-value SLA series.
pub mod legend {
    pub const WITHIN_SLA: &str = "Dentro do Prazo";
    pub const BREACHED: &str = "Fora do Prazo";
    pub const WITHIN_SLA_COLOR: &str = "#28a745";
    pub const BREACHED_COLOR: &str = "#dc3545";
}
