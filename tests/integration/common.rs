//! Common utilities for integration tests

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// A pinned archive written into the test directory
pub struct Archive {
    pub url: String,
    pub sha256: String,
}

/// Test context that provides isolated environment for each test
pub struct TestContext {
    pub temp: TempDir,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        for dir in ["config", "cache", "data"] {
            std::fs::create_dir_all(temp.child(dir).path()).unwrap();
        }
        Self { temp }
    }

    /// Create a Command for running stager with proper environment
    pub fn stager(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("stager").unwrap();
        cmd.current_dir(&self.temp);
        cmd.env_remove("STAGER_LOG");

        // Point the dirs crate at the test directory
        let config_dir = self.temp.child("config").to_path_buf();
        let cache_dir = self.temp.child("cache").to_path_buf();
        let data_dir = self.temp.child("data").to_path_buf();

        if cfg!(target_os = "windows") {
            cmd.env("APPDATA", &config_dir);
            cmd.env("LOCALAPPDATA", &cache_dir);
            cmd.env("USERPROFILE", self.temp.path());
        } else if cfg!(target_os = "linux") {
            cmd.env("XDG_CONFIG_HOME", &config_dir);
            cmd.env("XDG_CACHE_HOME", &cache_dir);
            cmd.env("XDG_DATA_HOME", &data_dir);
            cmd.env("HOME", self.temp.path());
        } else {
            cmd.env("HOME", self.temp.path());
        }

        cmd
    }

    /// Install kegs under `<temp>/Cellar`
    pub fn use_test_cellar(&self) -> PathBuf {
        let cellar = self.cellar();
        self.stager()
            .args(["config", "set", "cellar"])
            .arg(&cellar)
            .assert()
            .success();
        cellar
    }

    pub fn cellar(&self) -> PathBuf {
        self.temp.child("Cellar").to_path_buf()
    }

    pub fn write_formula(&self, content: &str) -> PathBuf {
        let formula = self.temp.child("formula.yaml");
        formula.write_str(content).unwrap();
        formula.to_path_buf()
    }

    /// Write a source archive `<name>-<version>.tar.gz` holding a
    /// `setup.py` plus the given extra files, and return its file URL and hash
    pub fn write_sdist(&self, name: &str, version: &str, files: &[(&str, &str)]) -> Archive {
        let root = format!("{}-{}", name, version);
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(encoder);

        let mut entries = vec![("setup.py", "from setuptools import setup\nsetup()\n")];
        entries.extend_from_slice(files);
        for (file, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            tar.append_data(&mut header, format!("{}/{}", root, file), content.as_bytes())
                .unwrap();
        }
        let bytes = tar.into_inner().unwrap().finish().unwrap();

        let archives = self.temp.child("archives");
        std::fs::create_dir_all(archives.path()).unwrap();
        let archive = archives.child(format!("{}.tar.gz", root));
        archive.write_binary(&bytes).unwrap();

        Archive {
            url: format!("file://{}", archive.path().display()),
            sha256: hex::encode(Sha256::digest(&bytes)),
        }
    }

    /// A stand-in interpreter that performs a `setup.py install` by hand:
    /// it logs the package and search path, creates the executable named
    /// in the package's `SCRIPT` file, and fails when a `FAIL` file exists.
    #[cfg(unix)]
    pub fn fake_python(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let log = self.install_log();
        let script = format!(
            r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --install-scripts=*) scripts="${{arg#--install-scripts=}}" ;;
  esac
done
echo "$(basename "$PWD") $PYTHONPATH" >> '{log}'
if [ -f FAIL ]; then
  echo "error: could not build $(basename "$PWD")" >&2
  exit 1
fi
if [ -f SCRIPT ]; then
  name=$(cat SCRIPT)
  mkdir -p "$scripts"
  printf '#!/bin/sh\necho "%s ran with $PYTHONPATH"\n' "$name" > "$scripts/$name"
  chmod 755 "$scripts/$name"
fi
"#,
            log = log.display()
        );

        let path = self.temp.child("fake-python");
        path.write_str(&script).unwrap();
        std::fs::set_permissions(path.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_path_buf()
    }

    /// Lines written by the fake interpreter, one per install step
    pub fn install_log(&self) -> PathBuf {
        self.temp.child("install.log").to_path_buf()
    }

    pub fn installed_packages(&self) -> Vec<String> {
        std::fs::read_to_string(self.install_log())
            .unwrap_or_default()
            .lines()
            .filter_map(|l| l.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}

/// Formula YAML for `bench 0.92` with the given main archive and resources
pub fn bench_formula(python: &str, main: &Archive, resources: &[(&str, &Archive)]) -> String {
    let mut yaml = format!(
        "name: bench\nversion: \"0.92\"\nurl: {}\nsha256: {}\npython: {}\npython_version: \"2.7\"\ntest:\n  - bench\n",
        main.url, main.sha256, python
    );
    if resources.is_empty() {
        yaml.push_str("resources: []\n");
        return yaml;
    }
    yaml.push_str("resources:\n");
    for (name, archive) in resources {
        yaml.push_str(&format!(
            "  - name: {}\n    url: {}\n    sha256: {}\n",
            name, archive.url, archive.sha256
        ));
    }
    yaml
}
