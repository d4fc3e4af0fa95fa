use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::Path};
use tempfile::TempDir;

fn tap() -> Command {
    let mut cmd = Command::cargo_bin("tap").unwrap();
    cmd.env_remove("TAP_CONTEXT")
        .env_remove("TAP_OUTPUT")
        .env_remove("TAP_LOG");
    cmd
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp.path().join("values.yaml"),
        "service: billing\nsecret: hello\nports:\n  - 80\n  - 443\n",
    );
    write(
        &tmp.path().join("templates/svc.yaml.tpl"),
        "name: {{ service }}\n{% for p in ports %}port: {{ p }}\n{% endfor %}",
    );
    write(
        &tmp.path().join("templates/secret.tpl"),
        "token: {{ secret | base64encode }}\n",
    );
    fs::create_dir_all(tmp.path().join("templates/partials")).unwrap();
    tmp
}

#[test]
fn render_directory_writes_every_template() {
    let tmp = workspace();
    let out = tmp.path().join("build/out");

    tap()
        .current_dir(tmp.path())
        .args(["render", "-c", "values.yaml", "-t", "templates", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("svc.yaml").and(predicate::str::contains("secret")));

    assert_eq!(
        fs::read_to_string(out.join("svc.yaml")).unwrap(),
        "name: billing\nport: 80\nport: 443\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("secret")).unwrap(),
        "token: aGVsbG8=\n"
    );
    assert!(!out.join("partials").exists());
}

#[test]
fn render_single_file_reads_env_config() {
    let tmp = workspace();
    let out = tmp.path().join("single");

    tap()
        .current_dir(tmp.path())
        .env("TAP_CONTEXT", "values.yaml")
        .env("TAP_OUTPUT", &out)
        .args(["render", "-t", "templates/secret.tpl"])
        .assert()
        .success();

    assert!(out.join("secret").is_file());
    assert!(!out.join("svc.yaml").exists());
}

#[test]
fn render_fails_on_missing_key() {
    let tmp = workspace();
    write(&tmp.path().join("bad/x.tpl"), "{{ region }}");

    tap()
        .current_dir(tmp.path())
        .args(["render", "-c", "values.yaml", "-t", "bad", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("region"));
}

#[test]
fn render_fails_on_missing_context() {
    let tmp = workspace();

    tap()
        .current_dir(tmp.path())
        .args(["render", "-c", "absent.yaml", "-t", "templates", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yaml"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn check_lists_undefined_keys() {
    let tmp = workspace();
    write(&tmp.path().join("templates/z.tpl"), "{{ region }} {{ zone.id }}");

    tap()
        .current_dir(tmp.path())
        .args(["check", "-c", "values.yaml", "-t", "templates"])
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("ok templates/secret.tpl")
                .and(predicate::str::contains(": region"))
                .and(predicate::str::contains(": zone.id")),
        );

    assert!(!tmp.path().join("secret").exists());
}

#[test]
fn check_passes_clean_templates() {
    let tmp = workspace();

    tap()
        .current_dir(tmp.path())
        .args(["check", "-c", "values.yaml", "-t", "templates"])
        .assert()
        .success();
}
