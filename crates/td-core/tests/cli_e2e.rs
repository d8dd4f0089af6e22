//! CLI E2E tests for the ticketdash binary.
//!
//! Validates:
//! - `summary` emits the dashboard JSON and a readable pretty rendering
//! - State, month and detail selections reach the pipeline
//! - `months` lists month options
//! - Load failures exit 11 with a diagnostic on stderr
//! - Invalid selections and malformed settings exit 10

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

const EXPORT: &str = "\
Data de abertura;Entidade;Categoria;Tempo para resolver excedido;Atribuído - Técnico;Status;Prioridade;Plug-ins - Departamento - Departamento
01-03-2024 09:00;Ticket > TI > Cng PE;TI - Infra;Não;Jéssica Bernardo;Fechado;Alta;Financeiro
01-03-2024 10:00;Ticket > TI > Cng PE > Cng RN;TI - Sistemas > GPM;Sim;Jéssica Bernardo<br>Fagner Brito;Pendente;Baixa;Compras
15-04-2024 08:00;Ticket > TI > Cng PE;TI - Infra;Não;Outsider;Fechado;Alta;Financeiro
20-05-2024 08:00;Ticket > Financeiro;TI - Infra;Sim;Fagner Brito;Solucionado;Alta;Financeiro
";

/// Get a Command for the ticketdash binary with an isolated environment.
fn ticketdash(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("ticketdash");
    cmd.timeout(Duration::from_secs(60))
        .env_remove("TICKETDASH_DATA")
        .env_remove("TICKETDASH_BIND")
        .env_remove("TICKETDASH_CONFIG")
        .env_remove("TICKETDASH_LOG_JSON")
        .env("TICKETDASH_LOG", "warn")
        .env("XDG_CONFIG_HOME", home)
        .env("HOME", home);
    cmd
}

fn write_export(dir: &TempDir, body: &[u8]) -> PathBuf {
    let path = dir.path().join("glpi.csv");
    fs::write(&path, body).expect("write export");
    path
}

fn summary_json(dir: &TempDir, extra: &[&str]) -> Value {
    let path = write_export(dir, EXPORT.as_bytes());
    let output = ticketdash(dir.path())
        .args(["--format", "json", "summary", "--file"])
        .arg(&path)
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("parse JSON")
}

// ============================================================================
// Summary
// ============================================================================

#[test]
fn test_summary_default_selection() {
    let dir = tempdir().expect("tempdir");
    let json = summary_json(&dir, &[]);

    assert_eq!(json["source"]["team_rows"], 3);
    assert_eq!(json["filters"]["view"]["states"], serde_json::json!(["PE", "RN"]));
    assert_eq!(json["metrics"]["total"], 2);
    assert_eq!(json["metrics"]["sla_overall"]["breached"], 1);
    assert!(json.get("schema_version").is_some());
}

#[test]
fn test_summary_all_states() {
    let dir = tempdir().expect("tempdir");
    let json = summary_json(&dir, &["--state", "all"]);
    assert_eq!(json["metrics"]["total"], 3);
    let months = json["filters"]["month_options"].as_array().expect("months");
    assert_eq!(months.len(), 2);
}

#[test]
fn test_summary_month_and_detail_filters() {
    let dir = tempdir().expect("tempdir");
    let json = summary_json(
        &dir,
        &["--state", "all", "--month", "2024-03", "--status", "Pendente"],
    );
    assert_eq!(json["metrics"]["total"], 2);
    assert_eq!(json["detail"]["filtered_rows"], 1);
    assert_eq!(json["detail"]["rows"][0]["Status"], "Pendente");
    // The timeline ignores the month selection.
    assert_eq!(json["charts"]["timeline"]["data"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_summary_empty_detail_selection() {
    let dir = tempdir().expect("tempdir");
    let json = summary_json(&dir, &["--state", "all", "--priority", ""]);
    assert_eq!(json["detail"]["filtered_rows"], 0);
    assert_eq!(json["metrics"]["total"], 3);
}

#[test]
fn test_summary_pretty() {
    let dir = tempdir().expect("tempdir");
    let path = write_export(&dir, EXPORT.as_bytes());
    ticketdash(dir.path())
        .args(["--format", "pretty", "summary", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total de tickets: 2"))
        .stdout(predicate::str::contains("Compliance SLA:"));
}

#[test]
fn test_data_path_from_env() {
    let dir = tempdir().expect("tempdir");
    let path = write_export(&dir, EXPORT.as_bytes());
    ticketdash(dir.path())
        .env("TICKETDASH_DATA", &path)
        .args(["--format", "json", "months", "--state", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03"))
        .stdout(predicate::str::contains("2024-05"));
}

// ============================================================================
// Months
// ============================================================================

#[test]
fn test_months_pretty_follows_state() {
    let dir = tempdir().expect("tempdir");
    let path = write_export(&dir, EXPORT.as_bytes());
    ticketdash(dir.path())
        .args(["--format", "pretty", "months", "--state", "RN", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout("2024-03\n");
}

// ============================================================================
// Error paths
// ============================================================================

#[test]
fn test_missing_file_exits_load_error() {
    let dir = tempdir().expect("tempdir");
    ticketdash(dir.path())
        .args(["summary", "--file"])
        .arg(dir.path().join("absent.csv"))
        .assert()
        .failure()
        .code(11)
        .stderr(predicate::str::contains("\"code\":22"));
}

#[test]
fn test_empty_file_shows_diagnostic() {
    let dir = tempdir().expect("tempdir");
    let path = write_export(&dir, b"");
    ticketdash(dir.path())
        .args(["--format", "pretty", "summary", "--file"])
        .arg(&path)
        .assert()
        .code(11)
        .stderr(predicate::str::contains("Erro no formato do arquivo CSV"));
}

#[test]
fn test_unknown_state_exits_config_error() {
    let dir = tempdir().expect("tempdir");
    let path = write_export(&dir, EXPORT.as_bytes());
    ticketdash(dir.path())
        .args(["summary", "--state", "SP", "--file"])
        .arg(&path)
        .assert()
        .code(10)
        .stderr(predicate::str::contains("unknown state tag"));
}

#[test]
fn test_malformed_settings_exit_config_error() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("settings.json");
    fs::write(&config, "{ not json").expect("write settings");
    ticketdash(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("months")
        .assert()
        .code(10);
}

#[test]
fn test_settings_file_supplies_data_path() {
    let dir = tempdir().expect("tempdir");
    let path = write_export(&dir, EXPORT.as_bytes());
    let config = dir.path().join("settings.json");
    fs::write(
        &config,
        serde_json::json!({ "data_path": path }).to_string(),
    )
    .expect("write settings");
    ticketdash(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--format", "pretty", "months"])
        .assert()
        .success()
        .stdout("2024-03\n");
}
