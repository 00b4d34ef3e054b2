use chrono::Utc;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// ANSI styling for console text.
///
/// Handed to renderers explicitly so tests (and `--no-color`) get plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// No escape codes at all
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Colors unless `--no-color` was given or `NO_COLOR` is set
    pub fn detect(no_color: bool) -> Self {
        Self::new(!no_color && std::env::var_os("NO_COLOR").is_none())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.enabled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, |s| s.green())
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, |s| s.red())
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, |s| s.yellow().bold())
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(text, |s| s.blue())
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(text, |s| s.cyan())
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    pub fn dimmed(&self, text: &str) -> String {
        self.paint(text, |s| s.dimmed())
    }
}

/// Standardized JSON document for all commands
#[derive(Debug, Clone, Serialize)]
pub struct ChegaOutput {
    pub command: String,
    pub success: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ChegaOutput {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            success: true,
            timestamp: Utc::now().to_rfc3339(),
            data: None,
        }
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_plain_palette_has_no_escapes() {
        let palette = Palette::plain();
        assert_eq!(palette.green("ok"), "ok");
        assert_eq!(palette.red("bad"), "bad");
        assert!(!palette.is_enabled());
    }

    #[test]
    fn test_output_json_shape() {
        let output = ChegaOutput::new("audit")
            .with_success(false)
            .with_data(serde_json::json!({"failed": 1}));
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["command"], "audit");
        assert_eq!(value["success"], false);
        assert_eq!(value["data"]["failed"], 1);
        assert!(value["timestamp"].is_string());
    }
}
