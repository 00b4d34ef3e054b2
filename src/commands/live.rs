use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use chega_check::checks::CheckContext;
use chega_check::config::{ChegaConfig, LivenessSettings};
use chega_check::live::{run_liveness, LivenessReport, ProbeGroup, ProbeStatus};
use chega_check::output::{ChegaOutput, OutputFormat, Palette};
use chega_check::utils::SystemRunner;

pub fn run(root: &Path, format: OutputFormat, palette: Palette) -> Result<ExitCode> {
    let config = ChegaConfig::load(root)?;
    config.validate()?;

    let runner = SystemRunner;
    let ctx = CheckContext::new(root, &config, &runner);
    let text = format == OutputFormat::Text;

    let stdout = io::stdout();
    if text {
        let mut out = stdout.lock();
        writeln!(out, "{}", palette.bold("🔍 VERIFICAÇÃO RÁPIDA - O SISTEMA RODA NORMALMENTE?"))?;
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(60))?;
    }

    let report = run_liveness(&ctx, &mut |group| {
        if text {
            if let Err(e) = write_group(&mut stdout.lock(), group, palette) {
                tracing::debug!("failed to print probe group: {}", e);
            }
        }
    });

    match format {
        OutputFormat::Text if report.docker_available => {
            write_summary(&mut stdout.lock(), &report, root, &config.liveness, palette)?;
        }
        OutputFormat::Text => {}
        OutputFormat::Json => output_json(&report)?,
    }

    Ok(ExitCode::from(report.exit_code()))
}

/// `1️⃣`..`9️⃣` for single digits, plain number otherwise
fn keycap(number: u8) -> String {
    if (1..=9).contains(&number) {
        format!("{}\u{fe0f}\u{20e3}", number)
    } else {
        format!("{}.", number)
    }
}

pub fn write_group(out: &mut dyn Write, group: &ProbeGroup, palette: Palette) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}  {}", keycap(group.number), palette.bold(&group.title))?;
    for line in &group.lines {
        let text = format!("{} {}", line.status.glyph(), line.text);
        let styled = match line.status {
            ProbeStatus::Ok => palette.green(&text),
            ProbeStatus::Fail => palette.red(&text),
            ProbeStatus::Pending => palette.dimmed(&text),
            ProbeStatus::Warn => palette.yellow(&text),
        };
        writeln!(out, "   {}", styled)?;
    }
    Ok(())
}

pub fn write_summary(
    out: &mut dyn Write,
    report: &LivenessReport,
    root: &Path,
    liveness: &LivenessSettings,
    palette: Palette,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out)?;
    writeln!(out, "📋 RESUMO")?;
    writeln!(out, "{}", "-".repeat(60))?;

    if report.is_running() {
        writeln!(out)?;
        writeln!(out, "{}", palette.green("✅ SISTEMA ESTÁ RODANDO!"))?;
        writeln!(out)?;
        writeln!(out, "  URLs de acesso:")?;
        writeln!(out, "  • Backend:  {}", base_url(&liveness.backend_health_url))?;
        writeln!(out, "  • Frontend: {}", liveness.frontend_url)?;
        writeln!(out)?;
        writeln!(out, "  Credenciais de teste:")?;
        writeln!(out, "  • Email: admin@leidycleaner.com.br")?;
        writeln!(out, "  • Senha: AdminPassword123!@#")?;
    } else {
        writeln!(out)?;
        writeln!(out, "{}", palette.yellow("⏳ SISTEMA NÃO ESTÁ RODANDO"))?;
        writeln!(out)?;
        writeln!(out, "  Para iniciar:")?;
        writeln!(out, "  $ cd {}", root.display())?;
        writeln!(out, "  $ docker-compose up -d")?;
        writeln!(out)?;
        writeln!(out, "  Aguarde 2-3 minutos para o build e startup")?;
        writeln!(out, "  Depois execute este script novamente para verificar")?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(60))
}

/// Scheme, host and port of `url`
fn base_url(url: &str) -> &str {
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    match url[after_scheme..].find('/') {
        Some(i) => &url[..after_scheme + i],
        None => url,
    }
}

fn output_json(report: &LivenessReport) -> Result<()> {
    let output = ChegaOutput::new("live")
        .with_success(report.docker_available)
        .with_data(serde_json::json!({
            "docker_available": report.docker_available,
            "running": report.is_running(),
            "containers_running": report.containers_running,
            "groups": report.groups
        }));

    println!("{}", output.to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chega_check::live::ProbeLine;

    fn render_summary(containers: usize) -> String {
        let report = LivenessReport {
            docker_available: true,
            containers_running: containers,
            groups: Vec::new(),
        };
        let mut buf = Vec::new();
        write_summary(
            &mut buf,
            &report,
            Path::new("/srv/chega"),
            &LivenessSettings::default(),
            Palette::plain(),
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_summary_running_branch() {
        let text = render_summary(3);
        assert!(text.contains("SISTEMA ESTÁ RODANDO!"));
        assert!(text.contains("• Backend:  http://localhost:3001\n"));
        assert!(!text.contains("NÃO ESTÁ RODANDO"));
    }

    #[test]
    fn test_summary_stopped_branch() {
        let text = render_summary(0);
        assert!(text.contains("SISTEMA NÃO ESTÁ RODANDO"));
        assert!(text.contains("$ cd /srv/chega"));
    }

    #[test]
    fn test_docker_error_group_rendering() {
        let group = ProbeGroup {
            number: 1,
            title: "Docker & Docker Compose".to_string(),
            lines: vec![ProbeLine {
                status: ProbeStatus::Fail,
                text: "Docker: ERRO".to_string(),
            }],
        };
        let mut buf = Vec::new();
        write_group(&mut buf, &group, Palette::plain()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("1\u{fe0f}\u{20e3}  Docker & Docker Compose\n"));
        assert!(text.contains("   ❌ Docker: ERRO\n"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("http://localhost:3001/api/health"), "http://localhost:3001");
        assert_eq!(base_url("http://localhost:3000"), "http://localhost:3000");
        assert_eq!(base_url("localhost:3000/x"), "localhost:3000");
    }

    #[test]
    fn test_keycap() {
        assert_eq!(keycap(1), "1\u{fe0f}\u{20e3}");
        assert_eq!(keycap(10), "10.");
    }
}
