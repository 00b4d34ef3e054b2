use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use chega_check::checks::{
    run_audit, AuditRun, CheckContext, CheckGroup, CheckStatus, Section, SectionLine,
};
use chega_check::config::ChegaConfig;
use chega_check::output::{ChegaOutput, OutputFormat, Palette};
use chega_check::report::save_report;
use chega_check::utils::SystemRunner;

pub fn run(
    root: &Path,
    group: Option<CheckGroup>,
    format: OutputFormat,
    palette: Palette,
) -> Result<ExitCode> {
    let config = ChegaConfig::load(root)?;
    config.validate()?;

    let runner = SystemRunner;
    let ctx = CheckContext::new(root, &config, &runner);
    let timestamp = chrono::Local::now();
    let text = format == OutputFormat::Text;

    let stdout = io::stdout();
    if text {
        let label = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        write_banner(&mut stdout.lock(), &label, palette)?;
    }

    let run = run_audit(&ctx, group, timestamp, &mut |section| {
        if text {
            if let Err(e) = write_section(&mut stdout.lock(), section, palette) {
                tracing::debug!("failed to print section: {}", e);
            }
        }
    });

    let report_path = save_report(&run, &root.join(&config.report.dir))?;
    tracing::info!(
        path = %report_path.display(),
        passed = run.passed(),
        failed = run.failed(),
        "audit finished"
    );

    match format {
        OutputFormat::Text => {
            let mut out = stdout.lock();
            writeln!(out)?;
            writeln!(out, "📄 Relatório salvo em: {}", report_path.display())?;
            write_summary(&mut out, &run, palette)?;
        }
        OutputFormat::Json => output_json(&run, &report_path)?,
    }

    Ok(if run.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn header(out: &mut dyn Write, title: &str, palette: Palette) -> io::Result<()> {
    let rule = "=".repeat(50);
    writeln!(out)?;
    writeln!(out, "{}", palette.blue(&rule))?;
    writeln!(out, "{}", palette.cyan(title))?;
    writeln!(out, "{}", palette.blue(&rule))?;
    writeln!(out)
}

pub fn write_banner(out: &mut dyn Write, timestamp: &str, palette: Palette) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", palette.cyan("╔════════════════════════════════════════════╗"))?;
    writeln!(out, "{}", palette.cyan("║ 🧪 TESTE DE INTEGRAÇÃO TOTAL - CHEGA       ║"))?;
    writeln!(out, "{}", palette.cyan("║    Sistema: Leidy Cleaner                  ║"))?;
    writeln!(out, "{}", palette.cyan(&format!("║    Data: {:<34}║", timestamp)))?;
    writeln!(out, "{}", palette.cyan("╚════════════════════════════════════════════╝"))
}

pub fn write_section(out: &mut dyn Write, section: &Section, palette: Palette) -> io::Result<()> {
    header(out, &section.title, palette)?;
    for line in &section.lines {
        match line {
            SectionLine::Check(result) => match result.status {
                CheckStatus::Pass => {
                    writeln!(out, "{}", palette.green(&format!("✅ {}", result.message)))?
                }
                CheckStatus::Fail => {
                    writeln!(out, "{}", palette.red(&format!("❌ {}", result.message)))?
                }
            },
            SectionLine::Info { message } => {
                writeln!(out, "{}", palette.yellow(&format!("ℹ️  {}", message)))?
            }
        }
    }
    Ok(())
}

pub fn write_summary(out: &mut dyn Write, run: &AuditRun, palette: Palette) -> io::Result<()> {
    header(out, "📋 RELATÓRIO FINAL DE TESTES", palette)?;

    writeln!(out, "Data/Hora: {}", run.timestamp_label())?;
    writeln!(out, "Projeto: {}", run.root().display())?;
    writeln!(out)?;
    writeln!(out, "Total de Testes: {}", run.total())?;
    writeln!(out, "{}", palette.green(&format!("✅ Testes Passados: {}", run.passed())))?;
    writeln!(out, "{}", palette.red(&format!("❌ Testes Falhados: {}", run.failed())))?;
    writeln!(out, "Taxa de Sucesso: {}%", run.success_rate())?;
    writeln!(out)?;

    if run.is_success() {
        writeln!(out, "{}", palette.green("🎉 TODOS OS TESTES PASSARAM! 🎉"))?;
        writeln!(out)?;
        writeln!(out, "O sistema está pronto para ser iniciado!")?;
        writeln!(out)?;
        writeln!(out, "Próximos passos:")?;
        writeln!(out, "  1. Iniciar containers:")?;
        writeln!(out, "     $ docker-compose up -d")?;
        writeln!(out)?;
        writeln!(out, "  2. Aguardar serviços ficarem prontos (~2 minutos)")?;
        writeln!(out)?;
        writeln!(out, "  3. Testar backend:")?;
        writeln!(out, "     $ curl http://localhost:3001/api/health")?;
        writeln!(out)?;
        writeln!(out, "  4. Testar frontend:")?;
        writeln!(out, "     Abra http://localhost:3000 no navegador")?;
        writeln!(out)?;
        writeln!(out, "  5. Login (usuário padrão):")?;
        writeln!(out, "     Email: admin@leidycleaner.com.br")?;
        writeln!(out, "     Senha: AdminPassword123!@#")?;
    } else {
        writeln!(out, "{}", palette.yellow("⚠️  Alguns testes falharam!"))?;
        writeln!(out, "Verifique os logs acima para detalhes.")?;
    }
    Ok(())
}

fn output_json(run: &AuditRun, report_path: &Path) -> Result<()> {
    let output = ChegaOutput::new("audit")
        .with_success(run.is_success())
        .with_data(serde_json::json!({
            "root": run.root().display().to_string(),
            "started_at": run.timestamp().to_rfc3339(),
            "report": report_path.display().to_string(),
            "summary": {
                "total": run.total(),
                "passed": run.passed(),
                "failed": run.failed(),
                "success_rate": run.success_rate()
            },
            "sections": run.sections()
        }));

    println!("{}", output.to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chega_check::report::render_report;
    use chrono::Local;

    fn sample_run(fail: bool) -> AuditRun {
        let mut run = AuditRun::new(Path::new("/srv/chega"), Local::now());
        run.begin(CheckGroup::Env);
        run.pass("Variável JWT_SECRET configurada");
        run.info("  nota");
        if fail {
            run.fail("Variável NODE_ENV NÃO configurada");
        }
        run.begin(CheckGroup::Git);
        run.pass("Repositório Git encontrado");
        run
    }

    fn render(run: &AuditRun) -> String {
        let mut buf = Vec::new();
        for section in run.sections() {
            write_section(&mut buf, section, Palette::plain()).unwrap();
        }
        write_summary(&mut buf, run, Palette::plain()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_console_lines_appear_in_report_in_order() {
        let run = sample_run(true);
        let console = render(&run);
        let report = render_report(&run);

        let mut console_pos = 0;
        let mut report_pos = 0;
        for result in run.results() {
            let glyph = match result.status {
                CheckStatus::Pass => "✅",
                CheckStatus::Fail => "❌",
            };
            let shown = format!("{} {}", glyph, result.message);
            let found = console[console_pos..].find(&shown).expect("missing on console");
            console_pos += found + shown.len();

            let line = result.report_line();
            let found = report[report_pos..].find(&line).expect("missing in report");
            report_pos += found + line.len();
        }
    }

    #[test]
    fn test_summary_branches_on_failures() {
        let ok = render(&sample_run(false));
        assert!(ok.contains("TODOS OS TESTES PASSARAM"));
        assert!(ok.contains("Taxa de Sucesso: 100%"));

        let failing = render(&sample_run(true));
        assert!(failing.contains("Alguns testes falharam!"));
        assert!(failing.contains("Taxa de Sucesso: 66%"));
        assert!(failing.contains("Total de Testes: 3"));
    }

    #[test]
    fn test_empty_run_reports_zero_rate() {
        let run = AuditRun::new(Path::new("/srv/chega"), Local::now());
        let text = render(&run);
        assert!(text.contains("Taxa de Sucesso: 0%"));
    }

    #[test]
    fn test_plain_rendering_has_no_escape_codes() {
        let text = render(&sample_run(true));
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("ℹ️    nota"));
    }
}
