//! Tests for `stager list` and `stager uninstall`

use super::common::TestContext;
use predicates::prelude::*;

#[test]
fn test_list_with_empty_cellar() {
    let ctx = TestContext::new();
    ctx.use_test_cellar();

    ctx.stager()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No formulae installed."));
}

#[test]
fn test_uninstall_unknown_formula() {
    let ctx = TestContext::new();
    ctx.use_test_cellar();

    ctx.stager()
        .args(["uninstall", "bench"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bench is not installed"));
}
