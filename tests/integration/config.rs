//! Tests for `stager config`

use super::common::TestContext;
use predicates::prelude::*;

#[test]
fn test_config_show_defaults() {
    let ctx = TestContext::new();

    ctx.stager()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("python: python3"))
        .stdout(predicate::str::contains("fetch_timeout_secs: 300"));
}

#[test]
fn test_config_set_persists() {
    let ctx = TestContext::new();

    ctx.stager()
        .args(["config", "set", "python", "python2.7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set python = python2.7"));

    ctx.stager()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("python: python2.7"));
}

#[test]
fn test_config_set_rejects_bad_input() {
    let ctx = TestContext::new();

    ctx.stager()
        .args(["config", "set", "colour", "always"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));

    ctx.stager()
        .args(["config", "set", "fetch_timeout_secs", "never"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive integer"));
}
