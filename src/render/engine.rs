//! Template environment, helper functions, and undefined-key analysis.

use crate::ctx::{Context, Value};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use minijinja::{Environment, Template, UndefinedBehavior};
use regex::Regex;
use std::{collections::HashSet, sync::LazyLock};

/// Names the environment resolves itself; never looked up in the context.
const ENGINE_NAMES: &[&str] = &["base64encode", "range", "dict", "debug", "namespace", "loop"];

/// `{% set a, b = .. %}`, `{% set x %}..{% endset %}` and `{% for k, v in .. %}` targets.
const ASSIGNMENT_PATTERN: &str =
    r"\{%[-+]?\s*(?:set|for)\s+\(?\s*([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)";

/// `x.y | default(..)`, `x | d(..)`, `x is defined`, `x is not undefined`.
const GUARD_PATTERN: &str = r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)(?:\s*\|\s*(?:default|d)\b|\s+is\s+(?:not\s+)?(?:defined|undefined)\b)";

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ASSIGNMENT_PATTERN).expect("assignment pattern compiles"));
static GUARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GUARD_PATTERN).expect("guard pattern compiles"));

/// Build the environment every template is parsed and executed in.
///
/// Undefined values are errors, and a template's trailing newline is kept.
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.add_function("base64encode", base64encode);
    env.add_filter("base64encode", base64encode);
    env
}

/// Standard, padded base64 encoding of `data`.
pub fn base64encode(data: &str) -> String {
    STANDARD.encode(data)
}

/// Every external variable path `tmpl` requires from `ctx` but `ctx` lacks.
///
/// Paths are dotted (`db.host`). Names the template assigns itself and
/// paths it only reads behind `default`/`is defined` are not required;
/// the engine's strict mode judges those at execution time. A walk that
/// reaches a value which is not a mapping also defers to the engine.
pub fn undefined_keys(tmpl: &Template<'_, '_>, ctx: &Context) -> Vec<String> {
    let source = tmpl.source();
    let assigned = assigned_names(source);
    let guarded = guarded_paths(source);

    let mut missing: Vec<String> = tmpl
        .undeclared_variables(true)
        .into_iter()
        .filter(|path| !resolves(ctx, path))
        .filter(|path| {
            let root = path.split('.').next().unwrap_or(path.as_str());
            !assigned.contains(root) && !guarded.iter().any(|g| covers(g, path))
        })
        .collect();
    missing.sort();
    missing
}

fn assigned_names(source: &str) -> HashSet<&str> {
    ASSIGNMENT
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .flat_map(|m| m.as_str().split(','))
        .map(str::trim)
        .collect()
}

fn guarded_paths(source: &str) -> Vec<&str> {
    GUARD
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// True when `path` is `guard` or lies below it.
fn covers(guard: &str, path: &str) -> bool {
    path.strip_prefix(guard)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

fn resolves(ctx: &Context, path: &str) -> bool {
    let root = path.split('.').next().unwrap_or(path);
    if ENGINE_NAMES.contains(&root) || ctx.lookup(path).is_some() {
        return true;
    }

    // Deepest prefix that does resolve: past a mapping the key is missing,
    // past anything else the engine decides.
    let mut prefix = path;
    while let Some((head, _)) = prefix.rsplit_once('.') {
        if let Some(value) = ctx.lookup(head) {
            if matches!(value, Value::Map(_)) {
                return false;
            }
            tracing::debug!(path, kind = value.kind(), "stopping key walk at non-mapping");
            return true;
        }
        prefix = head;
    }
    false
}
