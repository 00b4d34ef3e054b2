//! Content checks on `.env` and `.gitignore`.
//!
//! Matching is raw substring containment over the whole file: `PORT` is
//! satisfied by `PORT=3001` but also by `SUPPORT_EMAIL=...`, and `.env` in
//! `.gitignore` is satisfied by `.env.local`. Tests pin this behavior.

use std::fs;

use super::{AuditRun, CheckContext};

/// Pair each key with whether it occurs anywhere in `content`
pub fn find_keys<'a, I>(content: &str, keys: I) -> Vec<(&'a str, bool)>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .map(|key| (key, content.contains(key)))
        .collect()
}

pub fn check_environment_variables(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let env_file = ctx.path(".env");
    if !env_file.is_file() {
        run.fail("Arquivo .env não encontrado");
        return;
    }

    let content = match fs::read_to_string(&env_file) {
        Ok(c) => c,
        Err(e) => {
            run.fail(format!("Arquivo .env ilegível: {}", e));
            return;
        }
    };

    let required = ctx.config.audit.required_env_vars.iter().map(String::as_str);
    for (var, found) in find_keys(&content, required) {
        run.check(
            found,
            format!("Variável {} configurada", var),
            format!("Variável {} NÃO configurada", var),
        );
    }
}

pub fn check_security(ctx: &CheckContext<'_>, run: &mut AuditRun) {
    let gitignore = ctx.path(".gitignore");
    if !gitignore.is_file() {
        run.fail(".gitignore não encontrado");
        return;
    }
    run.pass(".gitignore encontrado");

    let content = match fs::read_to_string(&gitignore) {
        Ok(c) => c,
        Err(e) => {
            run.fail(format!(".gitignore ilegível: {}", e));
            return;
        }
    };

    for spec in &ctx.config.audit.gitignore_patterns {
        run.check(
            content.contains(spec.pattern.as_str()),
            format!("  {} ({}) em .gitignore", spec.label, spec.pattern),
            format!("  {} ({}) NÃO em .gitignore", spec.label, spec.pattern),
        );
    }
}
