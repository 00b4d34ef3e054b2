use serde_json::Value;
use std::fs;
use std::path::Path;

use super::{AuditRun, CheckContext};

/// Result of reading a package.json
#[derive(Debug)]
pub enum ManifestStatus {
    /// package.json exists and is valid
    Valid(Value),
    /// package.json exists but is invalid JSON
    Invalid(String),
    /// package.json does not exist
    Missing,
    /// Cannot read package.json (permissions or other error)
    Unreadable(String),
}

pub fn read_manifest(path: &Path) -> ManifestStatus {
    if !path.is_file() {
        return ManifestStatus::Missing;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Value>(&content) {
            Ok(pkg) => ManifestStatus::Valid(pkg),
            Err(e) => ManifestStatus::Invalid(e.to_string()),
        },
        Err(e) => ManifestStatus::Unreadable(e.to_string()),
    }
}

/// Dependency counts and the declared versions of interesting packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySummary {
    pub dependencies: usize,
    pub dev_dependencies: usize,
    /// `(label, declared version)` for each interesting package present
    pub flagged: Vec<(String, String)>,
}

impl DependencySummary {
    /// Summarize a manifest, flagging `(package, label)` pairs found in `dependencies`
    pub fn from_manifest(pkg: &Value, interesting: &[(&str, &str)]) -> Self {
        let deps = pkg.get("dependencies").and_then(|v| v.as_object());
        let dev_deps = pkg.get("devDependencies").and_then(|v| v.as_object());

        let flagged = interesting
            .iter()
            .filter_map(|(name, label)| {
                let version = deps?.get(*name)?;
                let version = match version.as_str() {
                    Some(s) => s.to_string(),
                    None => version.to_string(),
                };
                Some((label.to_string(), version))
            })
            .collect();

        Self {
            dependencies: deps.map_or(0, |d| d.len()),
            dev_dependencies: dev_deps.map_or(0, |d| d.len()),
            flagged,
        }
    }
}

fn has_dependency(pkg: &Value, name: &str) -> bool {
    pkg.get("dependencies")
        .and_then(|v| v.as_object())
        .map_or(false, |deps| deps.contains_key(name))
}

/// Backend: express, plus sqlite3 when declared, otherwise sequelize
fn backend_interesting(pkg: &Value) -> Vec<(&'static str, &'static str)> {
    let storage = if has_dependency(pkg, "sqlite3") {
        "sqlite3"
    } else {
        "sequelize"
    };
    vec![("express", "express"), (storage, storage)]
}

const FRONTEND_INTERESTING: [(&str, &str); 2] = [("next", "Next.js"), ("react", "React")];

pub fn check_dependencies(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    check_manifest(
        run,
        &ctx.path("backend/package.json"),
        "backend/package.json",
        "Backend",
        backend_interesting,
    );
    check_manifest(
        run,
        &ctx.path("frontend/package.json"),
        "frontend/package.json",
        "Frontend",
        |_| FRONTEND_INTERESTING.to_vec(),
    );
}

fn check_manifest(
    run: &mut AuditRun,
    path: &Path,
    display: &str,
    side: &str,
    interesting: impl Fn(&Value) -> Vec<(&'static str, &'static str)>,
) {
    match read_manifest(path) {
        ManifestStatus::Valid(pkg) => {
            let summary = DependencySummary::from_manifest(&pkg, &interesting(&pkg));
            run.pass(format!(
                "{} dependencies: {} pacotes",
                side, summary.dependencies
            ));
            run.info(format!("  DevDependencies: {} pacotes", summary.dev_dependencies));
            for (label, version) in summary.flagged {
                run.info(format!("  ✓ {}: {}", label, version));
            }
        }
        ManifestStatus::Invalid(err) => {
            run.fail(format!("{} inválido: {}", display, err));
        }
        ManifestStatus::Unreadable(err) => {
            run.fail(format!("{} ilegível: {}", display, err));
        }
        ManifestStatus::Missing => {
            run.info(format!("{} ausente, dependências não verificadas", display));
        }
    }
}
