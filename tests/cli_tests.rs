//! Binary-level CLI tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WEBAPP: &str = r#"
schema: platy/stack@0.1
provider: local

resources:
  - id: prod
    kind: namespace

  - id: web
    kind: deployment
    properties:
      namespace: ${prod.name}
      image: gcr.io/kuar-demo/kuard-amd64:blue
      port: 8080

  - id: web-svc
    kind: service
    properties:
      target_port: ${web.port}
    depends_on: [web]

outputs:
  url: ${web-svc.url}
"#;

fn write_stack(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn platy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("platy").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn validate_accepts_good_stack() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(&dir, "webapp.platy.yaml", WEBAPP);

    platy(&dir)
        .args(["validate", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Resources: 3"));
}

#[test]
fn validate_rejects_bad_schema_version() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(
        &dir,
        "bad.platy.yaml",
        "schema: platy/stack@9.9\nresources: []",
    );

    platy(&dir)
        .args(["validate", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLATY-002"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn validate_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    platy(&dir)
        .args(["validate", "nope.platy.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLATY-003"));
}

#[test]
fn preview_prints_plan_in_dependency_order() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(&dir, "webapp.platy.yaml", WEBAPP);

    let assert = platy(&dir).args(["preview", &file]).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let pos = |needle: &str| output.find(needle).unwrap();
    assert!(pos("prod") < pos("web "));
    assert!(pos("web ") < pos("web-svc"));
    assert!(output.contains("url"));
}

#[test]
fn up_deploys_and_prints_outputs() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(&dir, "webapp.platy.yaml", WEBAPP);

    platy(&dir)
        .args(["up", &file, "--no-trace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 succeeded"))
        .stdout(predicate::str::contains("url = \"http://web-svc.local\""));
}

#[test]
fn up_exit_code_nonzero_when_resource_fails() {
    let dir = TempDir::new().unwrap();
    // Missing required 'image' on the local provider
    let file = write_stack(
        &dir,
        "broken.platy.yaml",
        r#"
schema: platy/stack@0.1
provider: local
resources:
  - id: web
    kind: deployment
    properties:
      port: 8080
  - id: web-svc
    kind: service
    depends_on: [web]
outputs:
  url: ${web-svc.url}
"#,
    );

    platy(&dir)
        .args(["up", &file, "--no-trace"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 failed"))
        .stdout(predicate::str::contains("unresolved"));
}

#[test]
fn up_writes_trace_file() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(&dir, "webapp.platy.yaml", WEBAPP);

    platy(&dir)
        .args(["up", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trace written"));

    let traces = std::fs::read_dir(dir.path().join(".platy/traces"))
        .unwrap()
        .count();
    assert_eq!(traces, 1);
}

#[test]
fn trace_list_after_deploy() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(&dir, "webapp.platy.yaml", WEBAPP);

    platy(&dir).args(["up", &file]).assert().success();

    platy(&dir)
        .args(["trace", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 traces"));
}

#[test]
fn up_with_mock_provider_override() {
    let dir = TempDir::new().unwrap();
    // No cross-references: the mock echo resolves the declared output
    let file = write_stack(
        &dir,
        "plain.platy.yaml",
        r#"
schema: platy/stack@0.1
resources:
  - id: a
    kind: namespace
  - id: b
    kind: deployment
    depends_on: [a]
outputs:
  b-kind: ${b.kind}
"#,
    );

    platy(&dir)
        .args(["up", &file, "--provider", "mock", "--no-trace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 succeeded"))
        .stdout(predicate::str::contains("b-kind = \"deployment\""));
}

#[test]
fn unknown_provider_is_rejected() {
    let dir = TempDir::new().unwrap();
    let file = write_stack(&dir, "webapp.platy.yaml", WEBAPP);

    platy(&dir)
        .args(["up", &file, "--provider", "gcp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLATY-030"));
}
