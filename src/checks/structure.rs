//! Presence checks: directories, Docker artifacts, config files, docs, database

use std::fs;
use std::path::Path;

use super::{AuditRun, CheckContext};

const ESSENTIAL_DIRS: [(&str, &str); 4] = [
    ("backend", "Pasta do Backend"),
    ("frontend", "Pasta do Frontend"),
    ("config", "Pasta de Configuração"),
    ("docs", "Pasta de Documentação"),
];

const DOCKER_FILES: [(&str, &str); 3] = [
    ("docker-compose.yml", "Docker Compose principal"),
    ("Dockerfile.backend", "Dockerfile do Backend"),
    ("Dockerfile.frontend", "Dockerfile do Frontend"),
];

const MANIFESTS: [&str; 2] = ["backend/package.json", "frontend/package.json"];

const REQUIRED_DOCS: [(&str, &str); 2] = [
    ("COMECE_AQUI.md", "Guia inicial"),
    ("README.md", "README principal"),
];

const BUILD_FILES: [(&str, &str); 4] = [
    ("docker-compose.yml", "Docker Compose"),
    ("docker-compose.prod.yml", "Docker Compose Produção"),
    ("Dockerfile.backend", "Dockerfile Backend"),
    ("Dockerfile.frontend", "Dockerfile Frontend"),
];

pub const SQLITE_DB: &str = "backend/backend_data/database.sqlite";
const SQL_SCHEMA: &str = "database/schema.sql";

pub fn check_project_structure(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    for (dir, label) in ESSENTIAL_DIRS {
        run.check(
            ctx.path(dir).is_dir(),
            format!("{} existe ({}/)", label, dir),
            format!("{} não encontrada ({}/)", label, dir),
        );
    }
}

pub fn check_docker_files(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    for (file, label) in DOCKER_FILES {
        let path = ctx.path(file);
        if path.is_file() {
            run.pass(format!("{} existe", label));
            if let Ok(meta) = fs::metadata(&path) {
                run.info(format!("  Tamanho: {} bytes", meta.len()));
            }
        } else {
            run.fail(format!("{} não encontrado", label));
        }
    }

    let compose = ctx.path("docker-compose.yml");
    if compose.is_file() {
        match compose_services(&compose) {
            Ok(services) if !services.is_empty() => {
                run.info(format!("  Serviços declarados: {}", services.join(", ")));
            }
            Ok(_) => run.info("  Nenhum serviço declarado em docker-compose.yml"),
            Err(e) => run.info(format!("  docker-compose.yml não pôde ser interpretado: {}", e)),
        }
    }
}

/// Service names declared under `services:` in a compose file
pub fn compose_services(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&content)?;

    let services = doc
        .get("services")
        .and_then(|s| s.as_mapping())
        .map(|map| {
            map.keys()
                .filter_map(|k| k.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(services)
}

pub fn check_config_files(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let env_file = ctx.path(".env");
    if env_file.is_file() {
        run.pass("Arquivo .env existe");
        if let Ok(content) = fs::read_to_string(&env_file) {
            run.info(format!("  Total de variáveis: {}", content.lines().count()));
        }
    } else {
        run.fail("Arquivo .env não encontrado");
    }

    for manifest in MANIFESTS {
        run.check(
            ctx.path(manifest).is_file(),
            format!("{} existe", manifest),
            format!("{} não encontrado", manifest),
        );
    }
}

pub fn check_documentation(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let md_count = fs::read_dir(ctx.root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.path()
                        .extension()
                        .map_or(false, |ext| ext == "md")
                })
                .count()
        })
        .unwrap_or(0);
    run.pass(format!("Arquivos de documentação encontrados: {}", md_count));

    for (file, label) in REQUIRED_DOCS {
        if ctx.path(file).is_file() {
            run.pass(format!("  {}: {}", label, file));
        } else {
            run.info(format!("  {} não encontrado ao padrão", label));
        }
    }
}

pub fn check_database(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let sqlite = ctx.path(SQLITE_DB);
    if sqlite.is_file() {
        run.pass("Banco SQLite populado encontrado");
        if let Ok(meta) = fs::metadata(&sqlite) {
            let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
            run.info(format!("  Tamanho: {:.2} MB", size_mb));
        }
    } else {
        run.info("Banco SQLite não encontrado (será criado na primeira execução)");
    }

    if ctx.path(SQL_SCHEMA).is_file() {
        run.pass("Schema SQL encontrado");
    } else {
        run.info("Schema SQL não encontrado");
    }
}

pub fn check_build_files(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    for (file, label) in BUILD_FILES {
        if ctx.path(file).is_file() {
            run.pass(format!("{}: {}", label, file));
        } else {
            run.info(format!("{}: {} não encontrado", label, file));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckGroup, CheckStatus, SectionLine};
    use crate::config::ChegaConfig;
    use crate::utils::testing::ScriptedRunner;
    use chrono::Local;
    use tempfile::TempDir;

    fn audit(dir: &TempDir, group: CheckGroup, check: fn(&CheckContext<'_>, &mut AuditRun)) -> AuditRun {
        let config = ChegaConfig::default();
        let runner = ScriptedRunner::new();
        let ctx = CheckContext::new(dir.path(), &config, &runner);
        let mut run = AuditRun::new(dir.path(), Local::now());
        run.begin(group);
        check(&ctx, &mut run);
        run
    }

    fn infos(run: &AuditRun) -> Vec<String> {
        run.sections()[0]
            .lines
            .iter()
            .filter_map(|l| match l {
                SectionLine::Info { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_structure_partial_tree() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("backend")).unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        // A file named like a directory does not count
        fs::write(dir.path().join("frontend"), "").unwrap();

        let run = audit(&dir, CheckGroup::Structure, check_project_structure);
        assert_eq!((run.passed(), run.failed()), (2, 2));
        let first = run.results().next().unwrap();
        assert_eq!(first.message, "Pasta do Backend existe (backend/)");
    }

    #[test]
    fn test_docker_files_report_size_and_services() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("docker-compose.yml"),
            "services:\n  backend:\n    build: .\n  redis:\n    image: redis\n",
        )
        .unwrap();

        let run = audit(&dir, CheckGroup::Docker, check_docker_files);
        assert_eq!((run.passed(), run.failed()), (1, 2));
        let notes = infos(&run);
        assert!(notes[0].starts_with("  Tamanho: "));
        assert_eq!(notes[1], "  Serviços declarados: backend, redis");
    }

    #[test]
    fn test_malformed_compose_is_only_a_note() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("docker-compose.yml"), "services: [unclosed").unwrap();

        let run = audit(&dir, CheckGroup::Docker, check_docker_files);
        assert_eq!(run.passed(), 1);
        assert!(infos(&run)
            .iter()
            .any(|n| n.contains("não pôde ser interpretado")));
    }

    #[test]
    fn test_config_files_counts_env_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "A=1\nB=2\nC=3\n").unwrap();
        fs::create_dir(dir.path().join("backend")).unwrap();
        fs::write(dir.path().join("backend/package.json"), "{}").unwrap();

        let run = audit(&dir, CheckGroup::Config, check_config_files);
        assert_eq!((run.passed(), run.failed()), (2, 1));
        assert_eq!(infos(&run), vec!["  Total de variáveis: 3".to_string()]);
        assert!(run
            .results()
            .any(|r| r.status == CheckStatus::Fail && r.message == "frontend/package.json não encontrado"));
    }

    #[test]
    fn test_missing_docs_are_notes_not_failures() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        fs::write(dir.path().join("NOTES.md"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let run = audit(&dir, CheckGroup::Docs, check_documentation);
        assert_eq!(run.failed(), 0);
        let messages: Vec<_> = run.results().map(|r| r.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "Arquivos de documentação encontrados: 2".to_string(),
                "  README principal: README.md".to_string()
            ]
        );
        assert_eq!(infos(&run), vec!["  Guia inicial não encontrado ao padrão".to_string()]);
    }

    #[test]
    fn test_database_present() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("backend/backend_data")).unwrap();
        fs::write(dir.path().join(SQLITE_DB), vec![0u8; 1024 * 1024]).unwrap();

        let run = audit(&dir, CheckGroup::Database, check_database);
        assert_eq!((run.passed(), run.failed()), (1, 0));
        assert_eq!(
            infos(&run),
            vec!["  Tamanho: 1.00 MB".to_string(), "Schema SQL não encontrado".to_string()]
        );
    }

    #[test]
    fn test_build_files_never_fail() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Dockerfile.backend"), "FROM node").unwrap();

        let run = audit(&dir, CheckGroup::Build, check_build_files);
        assert_eq!((run.passed(), run.failed()), (1, 0));
        assert_eq!(infos(&run).len(), 3);
    }
}
