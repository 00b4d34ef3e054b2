//! Persisted audit report.
//!
//! One plain-text file per run, never overwritten.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::checks::AuditRun;
use crate::error::ChegaError;

/// Report file name prefix
pub const REPORT_PREFIX: &str = "teste-integracao";

/// Give up on finding a free file name after this many suffixes
const MAX_NAME_ATTEMPTS: usize = 1000;

const RULE_WIDTH: usize = 60;

/// Render the report text for `run`
pub fn render_report(run: &AuditRun) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "RELATÓRIO DE TESTE DE INTEGRAÇÃO");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out);
    let _ = writeln!(out, "Data/Hora: {}", run.timestamp_label());
    let _ = writeln!(out, "Projeto: {}", run.root().display());
    let _ = writeln!(out);
    let _ = writeln!(out, "Testes Passados: {}", run.passed());
    let _ = writeln!(out, "Testes Falhados: {}", run.failed());
    if run.total() > 0 {
        let _ = writeln!(out, "Taxa de Sucesso: {}%", run.success_rate());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "RESULTADOS DETALHADOS:");
    let _ = writeln!(out, "{}", light);
    for result in run.results() {
        let _ = writeln!(out, "{}", result.report_line());
    }

    out
}

/// `teste-integracao-YYYYmmdd-HHMMSS`, without extension
pub fn report_stem(run: &AuditRun) -> String {
    format!(
        "{}-{}",
        REPORT_PREFIX,
        run.timestamp().format("%Y%m%d-%H%M%S")
    )
}

/// Write the report into `dir`, creating it if needed. Returns the new file's path.
pub fn save_report(run: &AuditRun, dir: &Path) -> Result<PathBuf, ChegaError> {
    fs::create_dir_all(dir).map_err(|source| ChegaError::ReportWrite {
        path: dir.to_path_buf(),
        source,
    })?;

    let content = render_report(run);
    let stem = report_stem(run);

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{}.txt", stem)
        } else {
            format!("{}-{}.txt", stem, attempt + 1)
        };
        let path = dir.join(name);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(ChegaError::ReportWrite { path, source }),
        };

        file.write_all(content.as_bytes())
            .map_err(|source| ChegaError::ReportWrite {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "report written");
        return Ok(path);
    }

    Err(ChegaError::ReportWrite {
        path: dir.join(format!("{}.txt", stem)),
        source: io::Error::new(io::ErrorKind::AlreadyExists, "no free report file name"),
    })
}
