//! Tests for `stager install`, `test` and `uninstall`

use super::common::{bench_formula, TestContext};
use predicates::prelude::*;

#[test]
fn test_install_rejects_invalid_formula() {
    let ctx = TestContext::new();
    let formula = ctx.write_formula("name: bench\nversion: \"0.92\"\nurl: \"\"\n");

    ctx.stager()
        .arg("install")
        .arg(&formula)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid formula"))
        .stderr(predicate::str::contains("help:"));
}

#[test]
fn test_install_missing_formula_file() {
    let ctx = TestContext::new();

    ctx.stager()
        .args(["install", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_corrupted_hash_aborts_before_any_install() {
    let ctx = TestContext::new();
    let cellar = ctx.use_test_cellar();
    let main = ctx.write_sdist("bench", "0.92", &[]);
    let mut click = ctx.write_sdist("click", "6.2", &[]);
    click.sha256 = "0".repeat(64);
    let jinja2 = ctx.write_sdist("jinja2", "2.8", &[]);
    // Never run: the interpreter does not exist
    let formula = ctx.write_formula(&bench_formula(
        "/nonexistent/python",
        &main,
        &[("click", &click), ("jinja2", &jinja2)],
    ));

    ctx.stager()
        .arg("install")
        .arg(&formula)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Integrity check failed for 'click'"));

    assert!(!cellar.join("bench").join("0.92").exists());
}

#[cfg(unix)]
mod with_fake_python {
    use super::*;
    use std::fs;
    use std::process::Command;

    #[test]
    fn test_full_install_lifecycle() {
        let ctx = TestContext::new();
        let cellar = ctx.use_test_cellar();
        let python = ctx.fake_python();
        let main = ctx.write_sdist("bench", "0.92", &[("SCRIPT", "bench")]);
        let click = ctx.write_sdist("click", "6.2", &[("SCRIPT", "click-tool")]);
        let jinja2 = ctx.write_sdist("jinja2", "2.8", &[]);
        let formula = ctx.write_formula(&bench_formula(
            &python.display().to_string(),
            &main,
            &[("click", &click), ("jinja2", &jinja2)],
        ));

        ctx.stager()
            .arg("install")
            .arg(&formula)
            .assert()
            .success()
            .stdout(predicate::str::contains("✓ Installed bench 0.92"));

        assert_eq!(
            ctx.installed_packages(),
            vec!["click-6.2", "jinja2-2.8", "bench-0.92"]
        );

        let keg = cellar.join("bench").join("0.92");
        let vendor_site = keg.join("libexec/vendor/lib/python2.7/site-packages");
        let main_site = keg.join("libexec/lib/python2.7/site-packages");
        let log = fs::read_to_string(ctx.install_log()).unwrap();
        assert!(log.contains(&format!("click-6.2 {}\n", vendor_site.display())));
        assert!(log.contains(&format!(
            "bench-0.92 {}:{}\n",
            main_site.display(),
            vendor_site.display()
        )));

        // Only the main package's executables are published
        let wrapper = keg.join("bin/bench");
        assert!(wrapper.is_file());
        assert!(!keg.join("bin/click-tool").exists());

        let output = Command::new(&wrapper)
            .env_remove("PYTHONPATH")
            .output()
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).trim(),
            format!("bench ran with {}:{}", main_site.display(), vendor_site.display())
        );

        ctx.stager()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("bench 0.92"))
            .stdout(predicate::str::contains("→ bench"));

        ctx.stager()
            .arg("test")
            .arg(&formula)
            .assert()
            .success()
            .stdout(predicate::str::contains("1 test(s) passed"));

        // Same formula again is a no-op
        ctx.stager()
            .arg("install")
            .arg(&formula)
            .assert()
            .success()
            .stdout(predicate::str::contains("already installed"));
        assert_eq!(ctx.installed_packages().len(), 3);

        ctx.stager()
            .args(["uninstall", "bench"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Uninstalled bench 0.92"));
        assert!(!keg.exists());

        ctx.stager()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No formulae installed."));
    }

    #[test]
    fn test_install_step_failure_shows_output_and_rolls_back() {
        let ctx = TestContext::new();
        let cellar = ctx.use_test_cellar();
        let python = ctx.fake_python();
        let main = ctx.write_sdist("bench", "0.92", &[("SCRIPT", "bench")]);
        let click = ctx.write_sdist("click", "6.2", &[]);
        let jinja2 = ctx.write_sdist("jinja2", "2.8", &[("FAIL", "")]);
        let smmap = ctx.write_sdist("smmap", "0.9.0", &[]);
        let formula = ctx.write_formula(&bench_formula(
            &python.display().to_string(),
            &main,
            &[("click", &click), ("jinja2", &jinja2), ("smmap", &smmap)],
        ));

        ctx.stager()
            .arg("install")
            .arg(&formula)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Install step for 'jinja2' failed"))
            .stderr(predicate::str::contains("| error: could not build jinja2-2.8"))
            .stderr(predicate::str::contains("Rollback completed"));

        assert_eq!(ctx.installed_packages(), vec!["click-6.2", "jinja2-2.8"]);
        assert!(!cellar.join("bench").join("0.92").exists());
    }

    #[test]
    fn test_keep_failed_leaves_partial_install() {
        let ctx = TestContext::new();
        let cellar = ctx.use_test_cellar();
        let python = ctx.fake_python();
        let main = ctx.write_sdist("bench", "0.92", &[("FAIL", "")]);
        let click = ctx.write_sdist("click", "6.2", &[]);
        let formula = ctx.write_formula(&bench_formula(
            &python.display().to_string(),
            &main,
            &[("click", &click)],
        ));

        ctx.stager()
            .arg("install")
            .arg(&formula)
            .arg("--keep-failed")
            .assert()
            .failure();

        let keg = cellar.join("bench").join("0.92");
        assert!(keg.is_dir());
        assert!(!keg.join("INSTALL_RECEIPT.json").exists());
    }

    #[test]
    fn test_changed_formula_conflicts_until_forced() {
        let ctx = TestContext::new();
        ctx.use_test_cellar();
        let python = ctx.fake_python().display().to_string();
        let main = ctx.write_sdist("bench", "0.92", &[("SCRIPT", "bench")]);
        let click = ctx.write_sdist("click", "6.2", &[]);
        let gitdb = ctx.write_sdist("gitdb", "0.6.4", &[]);

        let formula = ctx.write_formula(&bench_formula(&python, &main, &[("click", &click)]));
        ctx.stager().arg("install").arg(&formula).assert().success();

        let formula = ctx.write_formula(&bench_formula(
            &python,
            &main,
            &[("click", &click), ("gitdb", &gitdb)],
        ));
        ctx.stager()
            .arg("install")
            .arg(&formula)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Prefix conflict"))
            .stderr(predicate::str::contains("--force"));

        ctx.stager()
            .arg("install")
            .arg(&formula)
            .arg("--force")
            .assert()
            .success()
            .stdout(predicate::str::contains("(2 resource(s))"));
    }

    #[test]
    fn test_install_with_prefix_and_bin_dir() {
        let ctx = TestContext::new();
        let python = ctx.fake_python();
        let main = ctx.write_sdist("bench", "0.92", &[("SCRIPT", "bench")]);
        let click = ctx.write_sdist("click", "6.2", &[]);
        let formula = ctx.write_formula(&bench_formula(
            &python.display().to_string(),
            &main,
            &[("click", &click)],
        ));
        let prefix = ctx.temp.path().join("opt/bench");
        let bin_dir = ctx.temp.path().join("usr/bin");

        ctx.stager()
            .arg("install")
            .arg(&formula)
            .arg("--prefix")
            .arg(&prefix)
            .arg("--bin-dir")
            .arg(&bin_dir)
            .assert()
            .success();

        assert!(bin_dir.join("bench").is_file());
        assert!(prefix.join("libexec/bin/bench").is_file());
        assert!(prefix.join("INSTALL_RECEIPT.json").is_file());

        ctx.stager()
            .arg("test")
            .arg(&formula)
            .arg("--prefix")
            .arg(&prefix)
            .assert()
            .success();
    }

    #[test]
    fn test_failing_test_command_propagates_exit_code() {
        let ctx = TestContext::new();
        ctx.use_test_cellar();
        let python = ctx.fake_python().display().to_string();
        let main = ctx.write_sdist("bench", "0.92", &[("SCRIPT", "bench")]);
        let click = ctx.write_sdist("click", "6.2", &[]);
        let yaml = bench_formula(&python, &main, &[("click", &click)])
            .replace("test:\n  - bench\n", "test:\n  - bench\n  - exit 3\n");
        let formula = ctx.write_formula(&yaml);

        ctx.stager().arg("install").arg(&formula).assert().success();
        ctx.stager().arg("test").arg(&formula).assert().code(3);
    }
}
