pub mod content;
pub mod dependencies;
pub mod sources;
pub mod structure;
pub mod toolchain;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ChegaConfig;
use crate::utils::CommandRunner;

/// Check groups, in the order the audit runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CheckGroup {
    /// Essential directories (backend, frontend, config, docs)
    Structure,
    /// docker-compose.yml and Dockerfiles
    Docker,
    /// .env and package manifests
    Config,
    /// backend/src layout
    Backend,
    /// frontend/src layout
    Frontend,
    /// Markdown documentation
    Docs,
    /// SQLite database and SQL schema
    Database,
    /// Required variables in .env
    Env,
    /// package.json dependencies
    Deps,
    /// Git repository
    Git,
    /// Installed CLI tools
    Tools,
    /// .gitignore security patterns
    Security,
    /// API endpoint files
    Api,
    /// Build/deploy files
    Build,
}

impl CheckGroup {
    pub const ALL: [CheckGroup; 14] = [
        CheckGroup::Structure,
        CheckGroup::Docker,
        CheckGroup::Config,
        CheckGroup::Backend,
        CheckGroup::Frontend,
        CheckGroup::Docs,
        CheckGroup::Database,
        CheckGroup::Env,
        CheckGroup::Deps,
        CheckGroup::Git,
        CheckGroup::Tools,
        CheckGroup::Security,
        CheckGroup::Api,
        CheckGroup::Build,
    ];

    /// Name used in configuration (`audit.disabled`) and on the command line
    pub fn key(self) -> &'static str {
        match self {
            CheckGroup::Structure => "structure",
            CheckGroup::Docker => "docker",
            CheckGroup::Config => "config",
            CheckGroup::Backend => "backend",
            CheckGroup::Frontend => "frontend",
            CheckGroup::Docs => "docs",
            CheckGroup::Database => "database",
            CheckGroup::Env => "env",
            CheckGroup::Deps => "deps",
            CheckGroup::Git => "git",
            CheckGroup::Tools => "tools",
            CheckGroup::Security => "security",
            CheckGroup::Api => "api",
            CheckGroup::Build => "build",
        }
    }

    /// Section header shown on the console
    pub fn title(self) -> &'static str {
        match self {
            CheckGroup::Structure => "TESTE 1: Estrutura do Projeto",
            CheckGroup::Docker => "TESTE 2: Arquivos Docker",
            CheckGroup::Config => "TESTE 3: Arquivos de Configuração",
            CheckGroup::Backend => "TESTE 4: Estrutura do Backend",
            CheckGroup::Frontend => "TESTE 5: Estrutura do Frontend",
            CheckGroup::Docs => "TESTE 6: Documentação",
            CheckGroup::Database => "TESTE 7: Setup do Banco de Dados",
            CheckGroup::Env => "TESTE 8: Variáveis de Ambiente",
            CheckGroup::Deps => "TESTE 9: Dependências do Projeto",
            CheckGroup::Git => "TESTE 10: Repositório Git",
            CheckGroup::Tools => "TESTE 11: Ferramentas de Sistema",
            CheckGroup::Security => "TESTE 12: Configurações de Segurança",
            CheckGroup::Api => "TESTE 13: Estrutura de API",
            CheckGroup::Build => "TESTE 14: Configuração Build/Deploy",
        }
    }

    fn run(self, ctx: &CheckContext<'_>, run: &mut AuditRun) {
        match self {
            CheckGroup::Structure => structure::check_project_structure(ctx, run),
            CheckGroup::Docker => structure::check_docker_files(ctx, run),
            CheckGroup::Config => structure::check_config_files(ctx, run),
            CheckGroup::Backend => sources::check_backend_structure(ctx, run),
            CheckGroup::Frontend => sources::check_frontend_structure(ctx, run),
            CheckGroup::Docs => structure::check_documentation(ctx, run),
            CheckGroup::Database => structure::check_database(ctx, run),
            CheckGroup::Env => content::check_environment_variables(ctx, run),
            CheckGroup::Deps => dependencies::check_dependencies(ctx, run),
            CheckGroup::Git => toolchain::check_git_repo(ctx, run),
            CheckGroup::Tools => toolchain::check_system_tools(ctx, run),
            CheckGroup::Security => content::check_security(ctx, run),
            CheckGroup::Api => sources::check_api_endpoints(ctx, run),
            CheckGroup::Build => structure::check_build_files(ctx, run),
        }
    }
}

impl fmt::Display for CheckGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => f.write_str("PASS"),
            CheckStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// One pass/fail outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: message.into(),
        }
    }

    /// `[STATUS] message`, as written to the report file
    pub fn report_line(&self) -> String {
        format!("[{}] {}", self.status, self.message)
    }
}

/// A line printed under a section: either a counted result or a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SectionLine {
    Check(CheckResult),
    Info { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub group: CheckGroup,
    pub title: String,
    pub lines: Vec<SectionLine>,
}

impl Section {
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.lines.iter().filter_map(|line| match line {
            SectionLine::Check(result) => Some(result),
            SectionLine::Info { .. } => None,
        })
    }
}

/// Everything one audit produced. Results are append-only.
#[derive(Debug, Clone)]
pub struct AuditRun {
    root: PathBuf,
    timestamp: DateTime<Local>,
    passed: usize,
    failed: usize,
    sections: Vec<Section>,
}

impl AuditRun {
    pub fn new(root: &Path, timestamp: DateTime<Local>) -> Self {
        Self {
            root: root.to_path_buf(),
            timestamp,
            passed: 0,
            failed: 0,
            sections: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Timestamp as shown in the banner and report
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn success_rate(&self) -> usize {
        success_rate(self.passed, self.failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All results in the order they were recorded
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.sections.iter().flat_map(|s| s.results())
    }

    /// Open a new section; subsequent records land in it
    pub fn begin(&mut self, group: CheckGroup) {
        self.sections.push(Section {
            group,
            title: group.title().to_string(),
            lines: Vec::new(),
        });
    }

    pub fn record(&mut self, result: CheckResult) {
        match result.status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Fail => self.failed += 1,
        }
        self.push_line(SectionLine::Check(result));
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.record(CheckResult::pass(message));
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.record(CheckResult::fail(message));
    }

    /// Informational note, not counted
    pub fn info(&mut self, message: impl Into<String>) {
        self.push_line(SectionLine::Info {
            message: message.into(),
        });
    }

    /// PASS when `ok`, FAIL otherwise
    pub fn check(&mut self, ok: bool, pass: impl Into<String>, fail: impl Into<String>) {
        if ok {
            self.pass(pass);
        } else {
            self.fail(fail);
        }
    }

    fn push_line(&mut self, line: SectionLine) {
        if self.sections.is_empty() {
            // Records made before any `begin` get an untitled home
            self.sections.push(Section {
                group: CheckGroup::Structure,
                title: String::new(),
                lines: Vec::new(),
            });
        }
        if let Some(section) = self.sections.last_mut() {
            section.lines.push(line);
        }
    }
}

/// Integer percentage of passed checks; 0 when nothing ran
pub fn success_rate(passed: usize, failed: usize) -> usize {
    let total = passed + failed;
    if total == 0 {
        0
    } else {
        passed * 100 / total
    }
}

/// What every check needs: where to look, what to look for, how to run tools
pub struct CheckContext<'a> {
    pub root: &'a Path,
    pub config: &'a ChegaConfig,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> CheckContext<'a> {
    pub fn new(root: &'a Path, config: &'a ChegaConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            root,
            config,
            runner,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Run every enabled check group in order.
///
/// `on_section` is called once per finished group so callers can print
/// progress while the remaining groups run.
pub fn run_audit(
    ctx: &CheckContext<'_>,
    only: Option<CheckGroup>,
    timestamp: DateTime<Local>,
    on_section: &mut dyn FnMut(&Section),
) -> AuditRun {
    let mut run = AuditRun::new(ctx.root, timestamp);

    for group in CheckGroup::ALL {
        if only.map_or(false, |g| g != group) {
            continue;
        }
        if ctx.config.is_group_disabled(group.key()) {
            tracing::debug!(group = group.key(), "group disabled by configuration");
            continue;
        }

        run.begin(group);
        group.run(ctx, &mut run);
        if let Some(section) = run.sections().last() {
            on_section(section);
        }
    }

    run
}
