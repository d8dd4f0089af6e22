//! Ticket export loader.
//!
//! Detects the delimiter and text encoding of a helpdesk CSV export by brute
//! force, normalizes headers, timestamps and text columns, and applies the
//! team filter. Detection tries every delimiter (outer) against every
//! encoding (inner) and accepts the first combination that produces more
//! than one column and at least one data row.

use crate::table::{clean_text, TicketRecord, TicketTable};
use crate::team::filter_team;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use td_config::rules::columns;
use tracing::{debug, info, warn};

/// Delimiters tried in order.
pub const DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// Encodings tried in order for each delimiter.
pub const ENCODINGS: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Cp1252,
    TextEncoding::Iso8859_1,
];

/// Upper bound on parse attempts for one input.
pub const MAX_ATTEMPTS: usize = DELIMITERS.len() * ENCODINGS.len();

/// Candidate text encoding for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
    #[serde(rename = "cp1252")]
    Cp1252,
    #[serde(rename = "iso-8859-1")]
    Iso8859_1,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Cp1252 => "cp1252",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }

    /// Decode `bytes`. Only UTF-8 can reject input; the single-byte
    /// encodings map every byte.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
            }
            // ISO-8859-1 maps every byte to the code point of the same value.
            TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
                Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect()))
            }
            TextEncoding::Cp1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors from loading an export.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no columns to parse from file")]
    NoColumns,

    #[error("could not detect the CSV format (tried {attempts} delimiter/encoding combinations)")]
    Undetected { attempts: usize },
}

impl LoadError {
    /// Same numbering as [`td_common::Error::code`].
    pub fn code(&self) -> u32 {
        match self {
            LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => 22,
            LoadError::Io { .. } => 60,
            LoadError::NoColumns => 20,
            LoadError::Undetected { .. } => 21,
        }
    }

    /// Multi-line guidance shown to the user.
    pub fn diagnostic(&self) -> String {
        match self {
            LoadError::NoColumns => [
                "Erro no formato do arquivo CSV:",
                "- Verifique se o arquivo contém dados válidos",
                "- Certifique-se que o arquivo tem cabeçalhos nas colunas",
                "- Experimente salvar o arquivo com encoding UTF-8",
                "- Formatos aceitos: separados por ';', ',' ou tab",
            ]
            .join("\n"),
            other => format!("Erro ao carregar dados: {other}"),
        }
    }
}

impl From<LoadError> for td_common::Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                td_common::Error::DataFileMissing {
                    path: path.display().to_string(),
                }
            }
            LoadError::Io { source, .. } => td_common::Error::Io(source),
            LoadError::NoColumns => td_common::Error::NoColumns,
            LoadError::Undetected { attempts } => td_common::Error::FormatUndetected { attempts },
        }
    }
}

/// How a successful load was detected and what it kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub delimiter: char,
    pub encoding: TextEncoding,
    pub attempts: usize,
    pub source_rows: usize,
    pub team_rows: usize,
    pub columns: usize,
}

/// A parsed, normalized and team-scoped export.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub table: TicketTable,
    pub report: LoadReport,
}

enum Attempt {
    Parsed(TicketTable),
    Empty,
    Rejected,
}

/// Load an export from raw bytes.
pub fn load_bytes(bytes: &[u8]) -> Result<Loaded, LoadError> {
    let mut attempts = 0;
    let mut saw_columns = false;

    for delimiter in DELIMITERS {
        for encoding in ENCODINGS {
            attempts += 1;
            let Some(text) = encoding.decode(bytes) else {
                debug!(delimiter = %(delimiter as char).escape_debug(), %encoding, "decode failed");
                continue;
            };
            match parse_delimited(&text, delimiter) {
                Attempt::Parsed(raw) => {
                    let source_rows = raw.len();
                    let columns = raw.columns().len();
                    let table = filter_team(normalize(raw));
                    let report = LoadReport {
                        delimiter: delimiter as char,
                        encoding,
                        attempts,
                        source_rows,
                        team_rows: table.len(),
                        columns,
                    };
                    info!(
                        delimiter = %report.delimiter.escape_debug(),
                        encoding = %report.encoding,
                        attempts,
                        source_rows,
                        team_rows = report.team_rows,
                        "export loaded"
                    );
                    return Ok(Loaded { table, report });
                }
                Attempt::Empty => {}
                Attempt::Rejected => saw_columns = true,
            }
        }
    }

    if saw_columns {
        warn!(attempts, "no delimiter/encoding combination produced a usable table");
        Err(LoadError::Undetected { attempts })
    } else {
        warn!("export has no columns");
        Err(LoadError::NoColumns)
    }
}

/// Load an export from disk.
pub fn load_path(path: &Path) -> Result<Loaded, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read export");
    load_bytes(&bytes)
}

fn parse_delimited(text: &str, delimiter: u8) -> Attempt {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_string).collect(),
        Err(_) => return Attempt::Rejected,
    };
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Attempt::Empty;
    }
    if headers.len() < 2 {
        return Attempt::Rejected;
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let Ok(row) = row else {
            return Attempt::Rejected;
        };
        // Extra fields mean the delimiter guess is wrong.
        if row.len() > headers.len() {
            return Attempt::Rejected;
        }
        let mut cells: Vec<String> = row.iter().map(str::to_string).collect();
        cells.resize(headers.len(), String::new());
        records.push(TicketRecord::new(cells));
    }
    if records.is_empty() {
        return Attempt::Rejected;
    }

    Attempt::Parsed(TicketTable::new(headers, records))
}

/// Parse a `%d-%m-%Y %H:%M` timestamp; anything else is missing.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), columns::DATE_FORMAT).ok()
}

fn normalize(table: TicketTable) -> TicketTable {
    let (headers, mut records) = table.into_parts();
    let headers: Vec<String> = headers.iter().map(|h| clean_text(h)).collect();
    let index_of = |name: &str| headers.iter().position(|h| h == name);

    let opened = index_of(columns::OPENED_AT);
    let updated = index_of(columns::UPDATED_AT);
    let text_columns: Vec<usize> = columns::TEXT_COLUMNS
        .iter()
        .filter_map(|name| index_of(name))
        .collect();

    let mut unparsed_dates = 0usize;
    for record in &mut records {
        if let Some(i) = opened {
            record.opened_at = parse_timestamp(record.cell(i));
            if record.opened_at.is_none() {
                unparsed_dates += 1;
            }
        }
        if let Some(i) = updated {
            record.updated_at = parse_timestamp(record.cell(i));
        }
        for &i in &text_columns {
            let cleaned = clean_text(record.cell(i));
            record.set_cell(i, cleaned);
        }
    }
    if unparsed_dates > 0 {
        debug!(unparsed_dates, column = columns::OPENED_AT, "timestamps coerced to missing");
    }

    TicketTable::new(headers, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\"Data de abertura\";\"Status\";\"Atribuído - Técnico\";\"Localização\"";

    #[test]
    fn test_semicolon_utf8() {
        let csv = format!("{HEADER}\n01-03-2024 09:00;\" Novo \";Fagner Brito;Recife\n");
        let loaded = load_bytes(csv.as_bytes()).expect("load");
        assert_eq!(loaded.report.delimiter, ';');
        assert_eq!(loaded.report.encoding, TextEncoding::Utf8);
        assert_eq!(loaded.report.attempts, 1);
        assert_eq!(loaded.table.len(), 1);
        let status = loaded.table.column_index("Status").unwrap();
        assert_eq!(loaded.table.records()[0].cell(status), "Novo");
        assert!(loaded.table.records()[0].opened_at.is_some());
    }

    #[test]
    fn test_comma_delimited_detected() {
        let csv = "Status,Atribuído - Técnico\nNovo,Fagner Brito\n";
        let loaded = load_bytes(csv.as_bytes()).expect("load");
        assert_eq!(loaded.report.delimiter, ',');
        // Four encodings tried for ';' first.
        assert_eq!(loaded.report.attempts, 5);
    }

    #[test]
    fn test_tab_delimited_detected() {
        let csv = "Status\tAtribuído - Técnico\nNovo\tFagner Brito\n";
        let loaded = load_bytes(csv.as_bytes()).expect("load");
        assert_eq!(loaded.report.delimiter, '\t');
    }

    #[test]
    fn test_latin1_fallback() {
        // "Localização" and "Jéssica" encoded as ISO-8859-1.
        let mut bytes = b"Status;Atribu\xeddo - T\xe9cnico;Localiza\xe7\xe3o\n".to_vec();
        bytes.extend_from_slice(b"Novo;J\xe9ssica Bernardo;Recife\n");
        let loaded = load_bytes(&bytes).expect("load");
        assert_eq!(loaded.report.encoding, TextEncoding::Latin1);
        assert_eq!(loaded.table.len(), 1);
        assert!(loaded.table.has_column("Localização"));
    }

    #[test]
    fn test_cp1252_decoding() {
        assert_eq!(
            TextEncoding::Cp1252.decode(b"\x93ok\x94").as_deref(),
            Some("\u{201c}ok\u{201d}")
        );
        assert_eq!(TextEncoding::Cp1252.decode(b"\x81").as_deref(), Some("\u{81}"));
        assert!(TextEncoding::Utf8.decode(b"\xe9").is_none());
        assert_eq!(TextEncoding::Latin1.decode(b"\xe9").as_deref(), Some("é"));
    }

    #[test]
    fn test_empty_input_is_no_columns() {
        assert!(matches!(load_bytes(b""), Err(LoadError::NoColumns)));
        assert!(matches!(load_bytes(b"\n\n"), Err(LoadError::NoColumns)));
    }

    #[test]
    fn test_single_column_is_undetected() {
        let err = load_bytes(b"Status\nNovo\nFechado\n").unwrap_err();
        assert!(matches!(err, LoadError::Undetected { attempts: MAX_ATTEMPTS }));
        assert!(err.diagnostic().contains("Erro ao carregar dados"));
    }

    #[test]
    fn test_header_only_is_undetected() {
        let err = load_bytes(b"Status;Prioridade\n").unwrap_err();
        assert!(matches!(err, LoadError::Undetected { .. }));
    }

    #[test]
    fn test_bad_dates_become_missing() {
        let csv = "Data de abertura;Última atualização;Atribuído - Técnico\n\
                   2024-03-01;01-03-2024 10:30;Fagner Brito\n";
        let loaded = load_bytes(csv.as_bytes()).expect("load");
        let record = &loaded.table.records()[0];
        assert!(record.opened_at.is_none());
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn test_team_filter_applied_on_load() {
        let csv = "Status;Atribuído - Técnico\nNovo;Fagner Brito\nNovo;Outsider\nNovo;\n";
        let loaded = load_bytes(csv.as_bytes()).expect("load");
        assert_eq!(loaded.report.source_rows, 3);
        assert_eq!(loaded.report.team_rows, 1);
    }

    #[test]
    fn test_short_rows_padded() {
        let csv = "Status;Prioridade;Atribuído - Técnico\nNovo;Alta;Fagner Brito\nNovo\n";
        let loaded = load_bytes(csv.as_bytes()).expect("load");
        // The short row has no technician and is dropped by the team filter.
        assert_eq!(loaded.report.source_rows, 2);
        assert_eq!(loaded.table.len(), 1);
    }

    #[test]
    fn test_load_path_missing_file() {
        let err = load_path(Path::new("/nonexistent/glpi.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.code(), 22);
        let common: td_common::Error = err.into();
        assert_eq!(common.code(), 22);
    }
}
