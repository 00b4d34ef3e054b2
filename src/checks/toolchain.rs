use super::{AuditRun, CheckContext};
use crate::utils::{first_line, CommandResult};

/// Longest version string kept in a result message
const MAX_VERSION_LEN: usize = 50;

/// Version line for `tool`, or `None` when it cannot be retrieved
fn tool_version(ctx: &CheckContext<'_>, tool: &str) -> Option<String> {
    let result = ctx
        .runner
        .run(tool, &["--version"], None, ctx.config.timeouts.version());
    result
        .output()
        .and_then(|o| first_line(&o.stdout, MAX_VERSION_LEN))
}

pub fn check_system_tools(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    for tool in &ctx.config.audit.tools {
        if ctx.runner.locate(&tool.command).is_none() {
            run.fail(format!("{}: NÃO instalado", tool.label));
            continue;
        }

        // Presence is established; a missing version string is not a failure
        match tool_version(ctx, &tool.command) {
            Some(version) => run.pass(format!("{}: {}", tool.label, version)),
            None => run.pass(format!("{}: instalado", tool.label)),
        }
    }
}

/// Commit count from `git rev-list --count HEAD`, `None` on any error
pub fn commit_count(ctx: &CheckContext<'_>) -> Option<usize> {
    match ctx.runner.run(
        "git",
        &["rev-list", "--count", "HEAD"],
        Some(ctx.root),
        ctx.config.timeouts.git(),
    ) {
        CommandResult::Success(output) => output.stdout.trim().parse().ok(),
        _ => None,
    }
}

pub fn check_git_repo(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    if !ctx.path(".git").is_dir() {
        run.fail("Repositório Git não encontrado");
        return;
    }
    run.pass("Repositório Git encontrado");

    match commit_count(ctx) {
        Some(count) => run.info(format!("  Commits no repositório: {}", count)),
        None => run.info("  Não foi possível contar commits"),
    }
}
