//! Tests for `stager verify`

use super::common::{bench_formula, TestContext};
use predicates::prelude::*;

#[test]
fn test_verify_before_fetch_reports_missing() {
    let ctx = TestContext::new();
    let main = ctx.write_sdist("bench", "0.92", &[]);
    let click = ctx.write_sdist("click", "6.2", &[]);
    let formula = ctx.write_formula(&bench_formula("python2.7", &main, &[("click", &click)]));

    ctx.stager()
        .arg("verify")
        .arg(&formula)
        .assert()
        .failure()
        .stdout(predicate::str::contains("❌ click: not fetched"))
        .stderr(predicate::str::contains("Verification failed"));
}

#[test]
fn test_verify_after_fetch_succeeds() {
    let ctx = TestContext::new();
    let main = ctx.write_sdist("bench", "0.92", &[]);
    let click = ctx.write_sdist("click", "6.2", &[]);
    let formula = ctx.write_formula(&bench_formula("python2.7", &main, &[("click", &click)]));

    ctx.stager().arg("fetch").arg(&formula).assert().success();

    ctx.stager()
        .arg("verify")
        .arg(&formula)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 archive(s) verified"));
}
