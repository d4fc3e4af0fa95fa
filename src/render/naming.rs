//! Output file naming for rendered templates.

use std::{ffi::OsString, path::Path};

/// Extensions that mark a file as a template and are dropped on output.
const TEMPLATE_EXTENSIONS: &[&str] = &["tpl", "tmpl", "j2", "jinja", "jinja2"];

/// Output file name for `template`: its file name minus a trailing template
/// extension. `None` when the path has no file name (e.g. `..`).
pub fn output_file_name(template: &Path) -> Option<OsString> {
    let name = template.file_name()?;

    let is_template_ext = Path::new(name)
        .extension()
        .and_then(|x| x.to_str())
        .is_some_and(|x| TEMPLATE_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(x)));

    if is_template_ext {
        // file_stem of "a.yaml.tpl" is "a.yaml".
        Path::new(name).file_stem().map(ToOwned::to_owned)
    } else {
        Some(name.to_owned())
    }
}
