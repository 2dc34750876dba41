//! Tests for `stager fetch`

use super::common::{bench_formula, TestContext};
use predicates::prelude::*;

#[test]
fn test_fetch_downloads_and_verifies_everything() {
    let ctx = TestContext::new();
    let main = ctx.write_sdist("bench", "0.92", &[]);
    let click = ctx.write_sdist("click", "6.2", &[]);
    let smmap = ctx.write_sdist("smmap", "0.9.0", &[]);
    let formula = ctx.write_formula(&bench_formula(
        "python2.7",
        &main,
        &[("click", &click), ("smmap", &smmap)],
    ));

    ctx.stager()
        .arg("fetch")
        .arg(&formula)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetching 3 archive(s) for bench"))
        .stdout(predicate::str::contains("✓ click"))
        .stdout(predicate::str::contains("All archives fetched"));
}

#[test]
fn test_fetch_fails_on_checksum_mismatch() {
    let ctx = TestContext::new();
    let main = ctx.write_sdist("bench", "0.92", &[]);
    let mut click = ctx.write_sdist("click", "6.2", &[]);
    click.sha256 = "ab".repeat(32);
    let formula = ctx.write_formula(&bench_formula("python2.7", &main, &[("click", &click)]));

    ctx.stager()
        .arg("fetch")
        .arg(&formula)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Integrity check failed for 'click'"))
        .stderr(predicate::str::contains(format!("expected sha256:{}", "ab".repeat(32))));
}

#[test]
fn test_fetch_missing_source_is_fetch_error() {
    let ctx = TestContext::new();
    let main = ctx.write_sdist("bench", "0.92", &[]);
    let mut click = ctx.write_sdist("click", "6.2", &[]);
    click.url = format!("file://{}", ctx.temp.path().join("missing.tar.gz").display());
    let formula = ctx.write_formula(&bench_formula("python2.7", &main, &[("click", &click)]));

    ctx.stager()
        .arg("fetch")
        .arg(&formula)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch 'click'"));
}
