//! Point-in-time liveness probes.
//!
//! Probes run in a fixed order and never abort the run, except the first
//! one: without a working `docker` nothing else is meaningful.

use serde::Serialize;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::checks::structure::SQLITE_DB;
use crate::checks::CheckContext;
use crate::utils::{count_lines, CommandResult};

const CRITICAL_FILES: [(&str, &str); 5] = [
    ("docker-compose.yml", "docker-compose.yml"),
    ("backend/package.json", "backend/package.json"),
    ("frontend/package.json", "frontend/package.json"),
    (".env", ".env"),
    (SQLITE_DB, "database.sqlite"),
];

/// Longest health-check body echoed back
const MAX_BODY_LEN: usize = 100;

/// Outcome of probing a port or URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum Reachability {
    /// Something answered; carries what it said
    Reachable(String),
    /// Nothing answered; carries why
    Unreachable(String),
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::Reachable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Fail,
    Pending,
    Warn,
}

impl ProbeStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            ProbeStatus::Ok => "✅",
            ProbeStatus::Fail => "❌",
            ProbeStatus::Pending => "⏳",
            ProbeStatus::Warn => "⚠️ ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeLine {
    pub status: ProbeStatus,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeGroup {
    pub number: u8,
    pub title: String,
    pub lines: Vec<ProbeLine>,
}

impl ProbeGroup {
    fn new(number: u8, title: &str) -> Self {
        Self {
            number,
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    fn push(&mut self, status: ProbeStatus, text: impl Into<String>) {
        self.lines.push(ProbeLine {
            status,
            text: text.into(),
        });
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LivenessReport {
    pub docker_available: bool,
    pub containers_running: usize,
    pub groups: Vec<ProbeGroup>,
}

impl LivenessReport {
    pub fn is_running(&self) -> bool {
        self.containers_running > 0
    }

    /// 1 only when docker itself is unusable
    pub fn exit_code(&self) -> u8 {
        if self.docker_available {
            0
        } else {
            1
        }
    }
}

/// Check whether `port` is listening on this host.
///
/// Reads `netstat -tuln` when available and looks for the port in the
/// local-address column; falls back to a TCP connect on localhost.
pub fn probe_port(ctx: &CheckContext<'_>, port: u16) -> Reachability {
    match ctx
        .runner
        .run("netstat", &["-tuln"], None, ctx.config.timeouts.probe())
    {
        CommandResult::Success(output) => match find_listener(&output.stdout, port) {
            Some(line) => Reachability::Reachable(line),
            None => Reachability::Unreachable(format!("port {} not in netstat", port)),
        },
        other => {
            tracing::debug!(port, ?other, "netstat unavailable, trying tcp connect");
            connect_localhost(port, ctx.config.timeouts.http())
        }
    }
}

/// TCP line of `netstat -tuln` output whose local address ends with `:port`
pub fn find_listener(netstat: &str, port: u16) -> Option<String> {
    let suffix = format!(":{}", port);
    netstat
        .lines()
        .find(|line| {
            let mut columns = line.split_whitespace();
            let tcp = columns.next().map_or(false, |proto| proto.starts_with("tcp"));
            tcp && columns
                .nth(2)
                .map_or(false, |local| local.ends_with(&suffix))
        })
        .map(|line| line.trim().to_string())
}

fn connect_localhost(port: u16, timeout: Duration) -> Reachability {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_) => Reachability::Reachable(format!("connected to {}", addr)),
        Err(e) => Reachability::Unreachable(e.to_string()),
    }
}

/// HTTP GET `url` through curl; any completed transfer counts as reachable
pub fn probe_http(ctx: &CheckContext<'_>, url: &str) -> Reachability {
    let timeout = ctx.config.timeouts.http();
    let max_time = timeout.as_secs().to_string();
    match ctx
        .runner
        .run("curl", &["-s", "--max-time", &max_time, url], None, timeout)
    {
        CommandResult::Success(output) => Reachability::Reachable(output.stdout),
        CommandResult::Failed(output) => {
            Reachability::Unreachable(format!("curl exited with {:?}", output.code))
        }
        CommandResult::TimedOut => Reachability::Unreachable("timed out".to_string()),
        CommandResult::SpawnError(e) => Reachability::Unreachable(e),
    }
}

/// Run all probe groups in order, calling `on_group` as each one finishes
pub fn run_liveness(
    ctx: &CheckContext<'_>,
    on_group: &mut dyn FnMut(&ProbeGroup),
) -> LivenessReport {
    let mut report = LivenessReport::default();
    let mut emit = |report: &mut LivenessReport, group: ProbeGroup| {
        on_group(&group);
        report.groups.push(group);
    };

    let docker = probe_docker(ctx);
    report.docker_available = docker
        .lines
        .first()
        .map_or(false, |l| l.status == ProbeStatus::Ok);
    emit(&mut report, docker);
    if !report.docker_available {
        return report;
    }

    emit(&mut report, probe_files(ctx));

    let (containers, running) = probe_containers(ctx);
    report.containers_running = running;
    emit(&mut report, containers);

    emit(&mut report, probe_services(ctx));
    emit(&mut report, probe_ports(ctx));
    emit(&mut report, probe_backend(ctx));
    emit(&mut report, probe_frontend(ctx));
    emit(&mut report, probe_node_modules(ctx));
    emit(&mut report, probe_git(ctx));

    report
}

fn probe_docker(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(1, "Docker & Docker Compose");
    let timeout = ctx.config.timeouts.probe();

    if ctx.runner.run("docker", &["--version"], None, timeout).is_success() {
        group.push(ProbeStatus::Ok, "Docker: OK");
    } else {
        group.push(ProbeStatus::Fail, "Docker: ERRO");
        return group;
    }

    if ctx
        .runner
        .run("docker-compose", &["--version"], None, timeout)
        .is_success()
    {
        group.push(ProbeStatus::Ok, "Docker Compose: OK");
    } else {
        group.push(ProbeStatus::Fail, "Docker Compose: ERRO");
    }
    group
}

fn probe_files(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(2, "Arquivos Críticos");
    for (path, name) in CRITICAL_FILES {
        if ctx.path(path).exists() {
            group.push(ProbeStatus::Ok, name);
        } else {
            group.push(ProbeStatus::Fail, format!("{} - NÃO ENCONTRADO", name));
        }
    }
    group
}

fn probe_containers(ctx: &CheckContext<'_>) -> (ProbeGroup, usize) {
    let mut group = ProbeGroup::new(3, "Status dos Containers");
    let running = ctx
        .runner
        .run("docker", &["ps", "-q"], None, ctx.config.timeouts.probe())
        .success_stdout()
        .map_or(0, count_lines);

    if running > 0 {
        group.push(ProbeStatus::Ok, format!("{} container(s) rodando", running));
    } else {
        group.push(
            ProbeStatus::Warn,
            "Nenhum container rodando (você precisa fazer docker-compose up -d)",
        );
    }
    (group, running)
}

fn probe_services(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(4, "Serviços Definidos no docker-compose.yml");
    let result = ctx.runner.run(
        "docker-compose",
        &["config", "--services"],
        Some(ctx.root),
        ctx.config.timeouts.services(),
    );

    match result.success_stdout() {
        Some(stdout) => {
            for service in stdout.lines().map(str::trim).filter(|s| !s.is_empty()) {
                group.push(ProbeStatus::Ok, service);
            }
        }
        None => group.push(ProbeStatus::Fail, "Erro ao ler docker-compose.yml"),
    }
    group
}

fn probe_ports(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(5, "Portas Esperadas");
    for spec in &ctx.config.liveness.ports {
        if probe_port(ctx, spec.port).is_reachable() {
            group.push(
                ProbeStatus::Ok,
                format!("Porta {} ({}): ABERTA", spec.port, spec.name),
            );
        } else {
            group.push(
                ProbeStatus::Pending,
                format!("Porta {} ({}): fechada", spec.port, spec.name),
            );
        }
    }
    group
}

fn probe_backend(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(6, "Health Check - Backend");
    match probe_http(ctx, &ctx.config.liveness.backend_health_url) {
        Reachability::Reachable(body) => {
            let body: String = body.chars().take(MAX_BODY_LEN).collect();
            group.push(ProbeStatus::Ok, format!("Backend respondendo: {}", body.trim()));
        }
        Reachability::Unreachable(_) => group.push(
            ProbeStatus::Pending,
            "Backend não está respondendo (pode ainda estar iniciando)",
        ),
    }
    group
}

fn probe_frontend(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(7, "Frontend");
    if probe_http(ctx, &ctx.config.liveness.frontend_url).is_reachable() {
        group.push(ProbeStatus::Ok, "Frontend respondendo");
    } else {
        group.push(ProbeStatus::Pending, "Frontend não está respondendo");
    }
    group
}

fn probe_node_modules(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(8, "Dependências NPM");
    for (dir, side) in [
        ("backend/node_modules", "Backend"),
        ("frontend/node_modules", "Frontend"),
    ] {
        if ctx.path(dir).exists() {
            group.push(ProbeStatus::Ok, format!("{} node_modules", side));
        } else {
            group.push(
                ProbeStatus::Warn,
                format!("{} node_modules não encontrado (instalado via Docker)", side),
            );
        }
    }
    group
}

fn probe_git(ctx: &CheckContext<'_>) -> ProbeGroup {
    let mut group = ProbeGroup::new(9, "Repositório Git");
    let result = ctx.runner.run(
        "git",
        &["status", "--short"],
        Some(ctx.root),
        ctx.config.timeouts.git(),
    );

    match result.success_stdout().map(count_lines) {
        Some(0) => group.push(ProbeStatus::Ok, "Git: Limpo (sem modificações)"),
        Some(n) => group.push(ProbeStatus::Ok, format!("Git: {} arquivo(s) modificado(s)", n)),
        None => group.push(ProbeStatus::Fail, "Git: Erro"),
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChegaConfig;
    use crate::utils::testing::ScriptedRunner;
    use crate::utils::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    const NETSTAT: &str = "\
Active Internet connections (only servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State
tcp        0      0 0.0.0.0:3001            0.0.0.0:*               LISTEN
tcp6       0      0 :::30000                :::*                    LISTEN
udp        0      0 127.0.0.1:5432          0.0.0.0:*
";

    fn ok(stdout: &str) -> CommandResult {
        CommandResult::Success(CommandOutput::new(0, stdout))
    }

    fn healthy_runner() -> ScriptedRunner {
        ScriptedRunner::new()
            .respond("docker --version", ok("Docker version 24.0.7\n"))
            .respond("docker-compose --version", ok("docker-compose 1.29\n"))
            .respond("docker ps -q", ok("a1b2c3\nd4e5f6\n"))
            .respond("docker-compose config --services", ok("backend\nfrontend\nredis\n"))
            .respond("netstat -tuln", ok(NETSTAT))
            .respond(
                "curl -s --max-time 3 http://localhost:3001/api/health",
                ok("{\"status\":\"ok\"}"),
            )
            .respond(
                "curl -s --max-time 3 http://localhost:3000",
                CommandResult::Failed(CommandOutput::new(7, "")),
            )
            .respond("git status --short", ok(" M src/main.rs\n?? new.txt\n"))
    }

    fn texts(group: &ProbeGroup) -> Vec<String> {
        group.lines.iter().map(|l| l.text.clone()).collect()
    }

    #[test]
    fn test_docker_missing_aborts_before_other_probes() {
        let dir = TempDir::new().unwrap();
        let config = ChegaConfig::default();
        let runner = ScriptedRunner::new();
        let ctx = CheckContext::new(dir.path(), &config, &runner);

        let mut printed = 0;
        let report = run_liveness(&ctx, &mut |_| printed += 1);

        assert!(!report.docker_available);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(printed, 1);
        assert_eq!(texts(&report.groups[0]), vec!["Docker: ERRO"]);
        assert_eq!(*runner.calls.borrow(), vec!["docker --version".to_string()]);
    }

    #[test]
    fn test_healthy_stack() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "").unwrap();
        fs::create_dir_all(dir.path().join("backend/node_modules")).unwrap();
        let config = ChegaConfig::default();
        let runner = healthy_runner();
        let ctx = CheckContext::new(dir.path(), &config, &runner);

        let report = run_liveness(&ctx, &mut |_| {});

        assert_eq!(report.exit_code(), 0);
        assert!(report.is_running());
        assert_eq!(report.containers_running, 2);
        assert_eq!(report.groups.len(), 9);
        let numbers: Vec<u8> = report.groups.iter().map(|g| g.number).collect();
        assert_eq!(numbers, (1..=9).collect::<Vec<u8>>());

        assert_eq!(texts(&report.groups[0]), vec!["Docker: OK", "Docker Compose: OK"]);
        assert_eq!(report.groups[1].lines[3].status, ProbeStatus::Ok);
        assert_eq!(report.groups[1].lines[0].text, "docker-compose.yml - NÃO ENCONTRADO");
        assert_eq!(texts(&report.groups[3]), vec!["backend", "frontend", "redis"]);
        assert_eq!(
            texts(&report.groups[4]),
            vec![
                "Porta 3001 (Backend): ABERTA",
                "Porta 3000 (Frontend): fechada",
                "Porta 6379 (Redis): fechada",
                "Porta 5432 (PostgreSQL): fechada",
            ]
        );
        assert_eq!(
            texts(&report.groups[5]),
            vec!["Backend respondendo: {\"status\":\"ok\"}"]
        );
        assert_eq!(report.groups[6].lines[0].status, ProbeStatus::Pending);
        assert_eq!(report.groups[7].lines[0].status, ProbeStatus::Ok);
        assert_eq!(report.groups[7].lines[1].status, ProbeStatus::Warn);
        assert_eq!(texts(&report.groups[8]), vec!["Git: 2 arquivo(s) modificado(s)"]);
    }

    #[test]
    fn test_failed_probes_degrade_without_aborting() {
        let dir = TempDir::new().unwrap();
        let config = ChegaConfig::default();
        let runner = ScriptedRunner::new()
            .respond("docker --version", ok("Docker version 24\n"))
            .respond("docker ps -q", CommandResult::TimedOut)
            .respond("netstat -tuln", ok(""))
            .respond("git status --short", CommandResult::TimedOut);
        let ctx = CheckContext::new(dir.path(), &config, &runner);

        let report = run_liveness(&ctx, &mut |_| {});
        assert_eq!(report.exit_code(), 0);
        assert!(!report.is_running());
        assert_eq!(report.groups.len(), 9);
        assert_eq!(texts(&report.groups[0])[1], "Docker Compose: ERRO");
        assert_eq!(report.groups[2].lines[0].status, ProbeStatus::Warn);
        assert_eq!(texts(&report.groups[3]), vec!["Erro ao ler docker-compose.yml"]);
        assert_eq!(texts(&report.groups[8]), vec!["Git: Erro"]);
    }

    #[test]
    fn test_find_listener_matches_whole_port() {
        assert!(find_listener(NETSTAT, 3001).is_some());
        // :30000 must not satisfy 3000
        assert!(find_listener(NETSTAT, 3000).is_none());
        assert!(find_listener(NETSTAT, 30000).is_some());
        // header lines never match
        assert!(find_listener(NETSTAT, 0).is_none());
        // udp sockets are not listeners
        assert!(find_listener(NETSTAT, 5432).is_none());
    }

    #[test]
    fn test_port_falls_back_to_tcp_connect_without_netstat() {
        let dir = TempDir::new().unwrap();
        let config = ChegaConfig::default();
        let runner = ScriptedRunner::new();
        let ctx = CheckContext::new(dir.path(), &config, &runner);

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe_port(&ctx, port).is_reachable());

        drop(listener);
        assert!(!probe_port(&ctx, port).is_reachable());
        assert_eq!(
            *runner.calls.borrow(),
            vec!["netstat -tuln".to_string(), "netstat -tuln".to_string()]
        );
    }

    #[test]
    fn test_http_body_containing_down_is_still_reachable() {
        let dir = TempDir::new().unwrap();
        let config = ChegaConfig::default();
        let runner = ScriptedRunner::new().respond(
            "curl -s --max-time 3 http://localhost:3000",
            ok("<html>countdown</html>"),
        );
        let ctx = CheckContext::new(dir.path(), &config, &runner);

        assert!(probe_http(&ctx, "http://localhost:3000").is_reachable());
        assert!(!probe_http(&ctx, "http://localhost:9").is_reachable());
    }

    #[test]
    fn test_clean_git_tree() {
        let dir = TempDir::new().unwrap();
        let config = ChegaConfig::default();
        let runner = ScriptedRunner::new().respond("git status --short", ok(""));
        let ctx = CheckContext::new(dir.path(), &config, &runner);

        assert_eq!(texts(&probe_git(&ctx)), vec!["Git: Limpo (sem modificações)"]);
    }
}
