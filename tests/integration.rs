use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_unidoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

// -- merging --

#[test]
fn merges_two_targets_into_one_output() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("demo-jvm.json"))
        .arg(fixture_path("demo-js.json"))
        .assert()
        .success();

    assert!(dir.path().join("index.md").exists());
    assert!(dir.path().join("example").join("index.md").exists());

    // Both targets' members land on the one Foo page, attributed.
    let foo = std::fs::read_to_string(
        dir.path().join("example").join("-foo").join("index.md"),
    )
    .unwrap();
    assert!(foo.contains("bar"), "{foo}");
    assert!(foo.contains("baz"), "{foo}");
    assert!(foo.contains("`jvm`"), "{foo}");
    assert!(foo.contains("`js`"), "{foo}");
}

#[test]
fn input_order_does_not_change_output() {
    let forward = TempDir::new().unwrap();
    let reverse = TempDir::new().unwrap();

    cmd()
        .args(["-o", forward.path().to_str().unwrap()])
        .arg(fixture_path("demo-jvm.json"))
        .arg(fixture_path("demo-js.json"))
        .assert()
        .success();
    cmd()
        .args(["-o", reverse.path().to_str().unwrap()])
        .arg(fixture_path("demo-js.json"))
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();

    for page in ["index.md", "example/index.md", "example/-foo/index.md"] {
        let a = std::fs::read_to_string(forward.path().join(page)).unwrap();
        let b = std::fs::read_to_string(reverse.path().join(page)).unwrap();
        assert_eq!(a, b, "{page} differs between input orders");
    }
}

#[test]
fn empty_module_is_not_an_error() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("demo-empty.json"))
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing to document"));

    assert!(!dir.path().join("index.md").exists());
    assert!(!dir.path().join("package-list").exists());
}

// -- package-list manifest --

#[test]
fn writes_package_list_at_output_root() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();

    let manifest = std::fs::read_to_string(dir.path().join("package-list")).unwrap();
    assert!(manifest.contains("$unidoc.format:html-v1"));
    assert!(manifest.contains("$unidoc.linkExtension:md"));
    assert!(manifest.lines().any(|l| l == "example"));
    assert!(manifest.lines().any(|l| l == "internal"));
}

#[test]
fn accepts_external_package_list() {
    let dir = TempDir::new().unwrap();
    let spec = format!(
        "https://example.org/stdlib/={}",
        fixture_path("stdlib.package-list")
    );

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["--external-docs", &spec])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();
}

#[test]
fn rejects_malformed_external_spec() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["--external-docs", "https://example.org/no-separator"])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL=PATH"));
}

// -- package suppression --

#[test]
fn suppressed_package_is_dropped() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["--suppress-package", "internal"])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();

    assert!(dir.path().join("example").join("index.md").exists());
    assert!(!dir.path().join("internal").exists());

    let manifest = std::fs::read_to_string(dir.path().join("package-list")).unwrap();
    assert!(!manifest.lines().any(|l| l == "internal"));
}

#[test]
fn longer_keep_pattern_overrides_suppress() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["--suppress-package", ".*"])
        .args(["--keep-package", "example"])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();

    assert!(dir.path().join("example").join("index.md").exists());
    assert!(!dir.path().join("internal").exists());
}

// -- formats --

#[test]
fn html_format_writes_html_pages() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "-f", "html"])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();

    let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(index.contains("<!DOCTYPE html>"));

    let manifest = std::fs::read_to_string(dir.path().join("package-list")).unwrap();
    assert!(manifest.contains("$unidoc.linkExtension:html"));
}

#[test]
fn unknown_format_fails() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "-f", "xml"])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

// -- the fail-on-warning gate --

#[test]
fn fail_on_warning_exits_nonzero_after_writing() {
    let dir = TempDir::new().unwrap();

    // Two class names that escape to the same filename: the second page
    // write is reported as an error and skipped.
    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "--fail-on-warning"])
        .arg(fixture_path("demo-clash.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate write"));

    // The gate fires at report time; output exists regardless.
    assert!(dir.path().join("index.md").exists());
    assert!(dir.path().join("clash").join("-a-b").join("index.md").exists());
}

#[test]
fn clashing_filenames_succeed_without_the_gate() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("demo-clash.json"))
        .assert()
        .success();
}

// -- cli surface --

#[test]
fn requires_input_files() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input files"));
}

#[test]
fn module_name_override() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .args(["--module-name", "renamed"])
        .arg(fixture_path("demo-jvm.json"))
        .assert()
        .success();

    let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
    assert!(index.starts_with("# renamed"), "{index}");
}
