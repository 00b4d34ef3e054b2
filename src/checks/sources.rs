//! Source tree enumeration. Only names are inspected, never file contents.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{AuditRun, CheckContext};

/// Maximum directory depth for source scans
const MAX_SOURCE_SCAN_DEPTH: usize = 32;

const API_PATTERNS: [(&str, &str); 5] = [
    ("auth", "Autenticação"),
    ("user", "Usuários"),
    ("service", "Serviços"),
    ("booking", "Agendamentos"),
    ("payment", "Pagamentos"),
];

/// Every file and directory below a source root
#[derive(Debug, Default)]
pub struct SourceTree {
    entries: Vec<SourceEntry>,
}

#[derive(Debug, Clone)]
struct SourceEntry {
    path: PathBuf,
    is_file: bool,
}

impl SourceTree {
    /// Walk `dir`, skipping `node_modules` and hidden directories below it
    pub fn scan(dir: &Path) -> Self {
        if !dir.is_dir() {
            return Self::default();
        }

        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(MAX_SOURCE_SCAN_DEPTH)
            .into_iter()
            .filter_entry(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s != "node_modules" && !s.starts_with('.'))
                    .unwrap_or(false)
            })
            .filter_map(|e| e.ok())
            .map(|e| SourceEntry {
                is_file: e.file_type().is_file(),
                path: e.into_path(),
            })
            .collect();

        Self { entries }
    }

    /// Files whose extension is one of `extensions`
    pub fn count_extensions(&self, extensions: &[&str]) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_file)
            .filter(|e| {
                e.path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| extensions.contains(&ext))
            })
            .count()
    }

    /// Entries whose own name contains `fragment`
    pub fn count_named(&self, fragment: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| name_contains(&e.path, fragment))
            .count()
    }

    /// Entries whose name contains `fragment` or that sit directly in a `dir_name` directory
    pub fn count_in_dir_or_named(&self, dir_name: &str, fragment: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                let in_dir = e
                    .path
                    .parent()
                    .and_then(|p| p.file_name())
                    .map_or(false, |p| p == dir_name);
                in_dir || name_contains(&e.path, fragment)
            })
            .count()
    }
}

fn name_contains(path: &Path, fragment: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.contains(fragment))
}

pub fn check_backend_structure(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let src = ctx.path("backend/src");
    if !src.is_dir() {
        run.fail("Pasta backend/src não encontrada");
        return;
    }
    run.pass("Pasta backend/src existe");

    let tree = SourceTree::scan(&src);
    run.info(format!(
        "  Total de arquivos JS/TS: {}",
        tree.count_extensions(&["js", "ts"])
    ));

    let routes = tree.count_in_dir_or_named("routes", "route");
    let models = tree.count_in_dir_or_named("models", "model");
    let controllers = tree.count_in_dir_or_named("controllers", "controller");

    if routes > 0 {
        run.pass(format!("  Arquivos de rotas encontrados: {}", routes));
    }
    if models > 0 {
        run.pass(format!("  Modelos de dados encontrados: {}", models));
    }
    if controllers > 0 {
        run.pass(format!("  Controladores encontrados: {}", controllers));
    }
}

pub fn check_frontend_structure(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let src = ctx.path("frontend/src");
    if !src.is_dir() {
        run.fail("Pasta frontend/src não encontrada");
        return;
    }
    run.pass("Pasta frontend/src existe");

    let tree = SourceTree::scan(&src);
    run.info(format!(
        "  Total de arquivos JS/JSX/TSX: {}",
        tree.count_extensions(&["jsx", "tsx", "js"])
    ));

    if src.join("pages").exists() {
        run.pass("  Pasta pages encontrada");
    } else if src.join("app").exists() {
        run.pass("  App router (Next.js 13+) encontrado");
    }

    let components = src.join("components");
    if components.exists() {
        let count = SourceTree::scan(&components).count_extensions(&["jsx", "tsx", "js"]);
        run.pass(format!("  Componentes React encontrados: {}", count));
    }
}

pub fn check_api_endpoints(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let tree = SourceTree::scan(&ctx.path("backend/src"));

    let mut found = 0;
    for (pattern, label) in API_PATTERNS {
        let count = tree.count_named(pattern);
        if count > 0 {
            run.pass(format!("  {} ({}): {} arquivo(s)", label, pattern, count));
            found += count;
        }
    }

    if found > 0 {
        run.pass(format!("Endpoints API estruturados encontrados: {}", found));
    } else {
        run.info("Estrutura de endpoints não claramente identificada");
    }
}
