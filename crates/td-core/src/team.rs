//! Team scoping.
//!
//! Only tickets assigned entirely to the roster in [`td_config::TEAM_ROSTER`]
//! are visible anywhere in the dashboard. The filter runs once, inside the
//! loader, so every downstream view inherits it.

use crate::table::{clean_text, is_missing, TicketTable};
use td_config::rules::{columns, is_team_member, TECHNICIAN_SEPARATORS};
use tracing::{debug, warn};

/// Split a cleaned technician field into individual names.
///
/// The first separator variant found in the string decides the split; parts
/// are trimmed and empty parts discarded. Without a separator the whole
/// string is a single name.
pub fn split_technicians(field: &str) -> Vec<&str> {
    match TECHNICIAN_SEPARATORS.iter().find(|sep| field.contains(**sep)) {
        Some(sep) => field
            .split(*sep)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect(),
        None => vec![field.trim()],
    }
}

/// Whether a raw technician field belongs to the team.
///
/// Requires at least one name, and every name must be on the roster.
pub fn is_team_ticket(raw_field: &str) -> bool {
    let field = clean_text(raw_field);
    if is_missing(&field) {
        return false;
    }
    let names = split_technicians(&field);
    !names.is_empty() && names.iter().all(|name| is_team_member(name))
}

/// Keep only team tickets.
///
/// The technician column is cleaned in the returned table. A table without
/// the technician column is returned unchanged.
pub fn filter_team(table: TicketTable) -> TicketTable {
    let Some(index) = table.column_index(columns::TECHNICIAN) else {
        warn!(column = columns::TECHNICIAN, "technician column absent, team filter skipped");
        return table;
    };

    let before = table.len();
    let mut table = table.filtered(|record| is_team_ticket(record.cell(index)));
    for record in table.records_mut() {
        let cleaned = clean_text(record.cell(index));
        record.set_cell(index, cleaned);
    }

    debug!(before, after = table.len(), "team filter applied");
    table
}
