//! End-to-end tests for the `apply` command.
//!
//! Dependencies are cloned from local bare repositories, so these tests need
//! `git` but no network access.

mod common;
use common::prelude::*;

use std::fs;

#[test]
fn test_apply_without_config_fails() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("apply")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unable to load"));
}

#[test]
fn test_apply_with_empty_config_succeeds() {
    let fixture = TestFixture::new().with_config(configs::EMPTY);

    fixture
        .command()
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_apply_moves_dependency_to_declared_tag() {
    if !git_available() {
        println!("Skipping test: git is not available");
        return;
    }
    let fixture = TestFixture::new().with_config(configs::DEP_AT_V1);
    let origin = fixture.origin("dep");
    let dep = fixture.clone_dep("example.com/dep", &origin);

    fixture
        .command()
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::eq("Updated example.com/dep to tag v1\n"));

    assert_eq!(
        git(&dep, &["rev-parse", "HEAD"]),
        git(&dep, &["rev-parse", "v1^{commit}"])
    );
}

#[test]
fn test_apply_leaves_matching_dependency_alone() {
    if !git_available() {
        println!("Skipping test: git is not available");
        return;
    }
    let fixture = TestFixture::new().with_config(configs::DEP_ON_MASTER);
    let origin = fixture.origin("dep");
    let dep = fixture.clone_dep("example.com/dep", &origin);
    let before = git(&dep, &["rev-parse", "HEAD"]);

    fixture
        .command()
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(git(&dep, &["rev-parse", "HEAD"]), before);
}

#[test]
fn test_apply_refuses_modified_dependency() {
    if !git_available() {
        println!("Skipping test: git is not available");
        return;
    }
    let fixture = TestFixture::new().with_config(configs::DEP_ON_MASTER);
    let origin = fixture.origin("dep");
    let dep = fixture.clone_dep("example.com/dep", &origin);
    fs::write(dep.join("lib.go"), "package lib // local edit\n").unwrap();

    fixture
        .command()
        .arg("apply")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: example.com/dep is modified"))
        .stderr(predicate::str::contains("hint: Commit or stash"));

    assert_eq!(
        fs::read_to_string(dep.join("lib.go")).unwrap(),
        "package lib // local edit\n"
    );
}

#[test]
fn test_apply_untracked_files_are_not_modifications() {
    if !git_available() {
        println!("Skipping test: git is not available");
        return;
    }
    let fixture = TestFixture::new().with_config(configs::DEP_AT_V1);
    let origin = fixture.origin("dep");
    let dep = fixture.clone_dep("example.com/dep", &origin);
    fs::write(dep.join("notes.txt"), "scratch\n").unwrap();

    fixture
        .command()
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated example.com/dep to tag v1"));
}
