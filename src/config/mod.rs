//! Configuration module for chega-check
//! Handles loading and parsing of `.chega-check.toml` configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::checks::CheckGroup;
use crate::error::ChegaError;

/// Default configuration file name, looked up in the project root
pub const CONFIG_FILE: &str = ".chega-check.toml";

/// Upper bound for any single subprocess timeout
const MAX_TIMEOUT_SECS: u64 = 60;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChegaConfig {
    /// Where audit reports are written
    #[serde(default)]
    pub report: ReportConfig,

    /// Structural audit inputs
    #[serde(default)]
    pub audit: AuditSettings,

    /// Subprocess timeouts
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Liveness probe targets
    #[serde(default)]
    pub liveness: LivenessSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report directory, relative to the project root
    #[serde(default = "default_report_dir")]
    pub dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Check groups to skip entirely (e.g. "tools", "git")
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Variable names that must appear in `.env`
    #[serde(default = "default_env_vars")]
    pub required_env_vars: Vec<String>,

    /// Patterns that must appear in `.gitignore`
    #[serde(default = "default_gitignore_patterns")]
    pub gitignore_patterns: Vec<PatternSpec>,

    /// Executables that must be installed
    #[serde(default = "default_tools")]
    pub tools: Vec<ToolSpec>,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            required_env_vars: default_env_vars(),
            gitignore_patterns: default_gitignore_patterns(),
            tools: default_tools(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub pattern: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub command: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// `<tool> --version` probes
    #[serde(default = "default_version_secs")]
    pub version_secs: u64,

    /// `git rev-list` and `git status`
    #[serde(default = "default_git_secs")]
    pub git_secs: u64,

    /// Generic liveness probes (docker, netstat)
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,

    /// HTTP probes
    #[serde(default = "default_http_secs")]
    pub http_secs: u64,

    /// `docker-compose config --services`
    #[serde(default = "default_services_secs")]
    pub services_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            version_secs: default_version_secs(),
            git_secs: default_git_secs(),
            probe_secs: default_probe_secs(),
            http_secs: default_http_secs(),
            services_secs: default_services_secs(),
        }
    }
}

impl Timeouts {
    pub fn version(&self) -> Duration {
        Duration::from_secs(self.version_secs)
    }

    pub fn git(&self) -> Duration {
        Duration::from_secs(self.git_secs)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }

    pub fn services(&self) -> Duration {
        Duration::from_secs(self.services_secs)
    }

    fn all(&self) -> [(&'static str, u64); 5] {
        [
            ("version_secs", self.version_secs),
            ("git_secs", self.git_secs),
            ("probe_secs", self.probe_secs),
            ("http_secs", self.http_secs),
            ("services_secs", self.services_secs),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessSettings {
    #[serde(default = "default_backend_health_url")]
    pub backend_health_url: String,

    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    #[serde(default = "default_ports")]
    pub ports: Vec<PortSpec>,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            backend_health_url: default_backend_health_url(),
            frontend_url: default_frontend_url(),
            ports: default_ports(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: u16,
    pub name: String,
}

fn default_report_dir() -> String {
    "test-results".to_string()
}

fn default_env_vars() -> Vec<String> {
    ["JWT_SECRET", "NODE_ENV", "PORT", "REDIS_URL", "NEXT_PUBLIC_API_URL"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_gitignore_patterns() -> Vec<PatternSpec> {
    [
        (".env", "Variáveis sensíveis"),
        ("node_modules", "Dependências"),
        ("*.key", "Chaves privadas"),
        ("*.pem", "Certificados"),
    ]
    .iter()
    .map(|(pattern, label)| PatternSpec {
        pattern: pattern.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn default_tools() -> Vec<ToolSpec> {
    [
        ("node", "Node.js"),
        ("npm", "npm"),
        ("docker", "Docker"),
        ("curl", "curl"),
    ]
    .iter()
    .map(|(command, label)| ToolSpec {
        command: command.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn default_version_secs() -> u64 {
    2
}

fn default_git_secs() -> u64 {
    5
}

fn default_probe_secs() -> u64 {
    5
}

fn default_http_secs() -> u64 {
    3
}

fn default_services_secs() -> u64 {
    10
}

fn default_backend_health_url() -> String {
    "http://localhost:3001/api/health".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_ports() -> Vec<PortSpec> {
    [
        (3001, "Backend"),
        (3000, "Frontend"),
        (6379, "Redis"),
        (5432, "PostgreSQL"),
    ]
    .iter()
    .map(|(port, name)| PortSpec {
        port: *port,
        name: name.to_string(),
    })
    .collect()
}

impl ChegaConfig {
    /// Load `.chega-check.toml` from the project root, falling back to defaults
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(&root.join(CONFIG_FILE))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ChegaConfig = toml::from_str(&content).map_err(|e| ChegaError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let header = "# chega-check configuration\n# Every key is optional; missing keys use the built-in defaults.\n\n";
        let full_content = format!("{}{}", header, content);

        fs::write(path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Create a default configuration file
    pub fn create_default(path: &Path) -> Result<Self> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Check if a check group is disabled
    pub fn is_group_disabled(&self, group: &str) -> bool {
        self.audit
            .disabled
            .iter()
            .any(|name| name.eq_ignore_ascii_case(group))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ChegaError> {
        let dir = self.report.dir.trim();
        if dir.is_empty() {
            return Err(ChegaError::invalid("report.dir must not be empty"));
        }
        if Path::new(dir).is_absolute() {
            return Err(ChegaError::invalid(format!(
                "report.dir must be relative to the project root, got {}",
                dir
            )));
        }

        for (name, secs) in self.timeouts.all() {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(ChegaError::invalid(format!(
                    "timeouts.{} must be between 1 and {} seconds, got {}",
                    name, MAX_TIMEOUT_SECS, secs
                )));
            }
        }

        let mut seen = HashSet::new();
        for spec in &self.liveness.ports {
            if spec.port == 0 {
                return Err(ChegaError::invalid(format!(
                    "liveness.ports: port for {} must not be 0",
                    spec.name
                )));
            }
            if !seen.insert(spec.port) {
                return Err(ChegaError::invalid(format!(
                    "liveness.ports: port {} is listed twice",
                    spec.port
                )));
            }
        }

        for (name, url) in [
            ("backend_health_url", &self.liveness.backend_health_url),
            ("frontend_url", &self.liveness.frontend_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ChegaError::invalid(format!(
                    "liveness.{} must be an http(s) URL, got {}",
                    name, url
                )));
            }
        }

        if let Some(name) = self.audit.disabled.iter().find(|name| {
            !CheckGroup::ALL
                .iter()
                .any(|group| name.eq_ignore_ascii_case(group.key()))
        }) {
            return Err(ChegaError::invalid(format!(
                "audit.disabled: unknown check group '{}'",
                name
            )));
        }

        if let Some(tool) = self.audit.tools.iter().find(|t| t.command.trim().is_empty()) {
            return Err(ChegaError::invalid(format!(
                "audit.tools: entry '{}' has an empty command",
                tool.label
            )));
        }

        Ok(())
    }
}
