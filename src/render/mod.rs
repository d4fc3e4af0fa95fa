//! Template rendering facade.

pub mod engine;
pub mod naming;

use crate::{
    ctx::Context,
    error::{Error, Result},
    util,
};
use minijinja::ErrorKind;
use std::{
    ffi::OsStr,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Render `template` against `ctx` into `out_dir/out_name`.
///
/// The output file is created before the template is parsed and is left
/// behind, empty or partial, when a later step fails.
pub fn render(ctx: &Context, template: &Path, out_dir: &Path, out_name: &OsStr) -> Result<()> {
    util::ensure_dir(out_dir)?;

    let out_path = out_dir.join(out_name);
    let mut out = File::create(&out_path).map_err(|source| Error::CreateFile {
        path: out_path.clone(),
        source,
    })?;

    let src = read_template(template)?;
    let name = template_name(template);
    let env = engine::environment();
    let tmpl = env
        .template_from_named_str(&name, &src)
        .map_err(|source| Error::Parse {
            path: template.to_path_buf(),
            source,
        })?;

    if let Some(key) = engine::undefined_keys(&tmpl, ctx).into_iter().next() {
        return Err(Error::MissingKey {
            path: template.to_path_buf(),
            key,
        });
    }

    let rendered = tmpl
        .render(ctx)
        .map_err(|source| execution_error(template, source))?;

    out.write_all(rendered.as_bytes())
        .map_err(|source| Error::Write {
            path: out_path.clone(),
            source,
        })?;

    tracing::info!(template = %template.display(), output = %out_path.display(), "rendered");
    Ok(())
}

/// Render a single template, or every file directly inside a directory.
///
/// Stops at the first failure. Returns the written output paths in order.
pub fn render_all(
    ctx: &Context,
    out_dir: &Path,
    source: &Path,
    is_directory: bool,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for tpl in templates(source, is_directory)? {
        let out_name = naming::output_file_name(&tpl)
            .ok_or_else(|| Error::InvalidTemplatePath { path: tpl.clone() })?;
        render(ctx, &tpl, out_dir, &out_name)?;
        written.push(out_dir.join(out_name));
    }

    tracing::info!(count = written.len(), out_dir = %out_dir.display(), "render complete");
    Ok(written)
}

/// The template files `render_all` would process, in order.
pub fn templates(source: &Path, is_directory: bool) -> Result<Vec<PathBuf>> {
    if is_directory {
        util::list_templates(source)
    } else {
        Ok(vec![source.to_path_buf()])
    }
}

/// Parse `template` and report every key it reads that `ctx` lacks.
/// Nothing is written.
pub fn check(ctx: &Context, template: &Path) -> Result<Vec<String>> {
    let src = read_template(template)?;
    let name = template_name(template);
    let env = engine::environment();
    let tmpl = env
        .template_from_named_str(&name, &src)
        .map_err(|source| Error::Parse {
            path: template.to_path_buf(),
            source,
        })?;
    Ok(engine::undefined_keys(&tmpl, ctx))
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Name the engine reports in its error messages.
fn template_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn execution_error(template: &Path, source: minijinja::Error) -> Error {
    let path = template.to_path_buf();
    match source.kind() {
        ErrorKind::UndefinedError => Error::Undefined { path, source },
        _ => Error::Execute { path, source },
    }
}
