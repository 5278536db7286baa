//! Integration tests for pkgstore
//!
//! Drive the binary against throwaway git mirrors.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const SINGLE_FILE_HASH: &str =
        "bbfe0dde7ea3423782875b848a01886d3d22afeb946a471148781e517a2a5363";

    /// A mirror, a work tree pushing into it, and a config pointing at both
    struct Workspace {
        temp: TempDir,
        mirror: PathBuf,
        work: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            Self::with_packages("")
        }

        fn with_packages(packages: &str) -> Self {
            let temp = TempDir::new().unwrap();
            let mirror = temp.path().join("mirror.git");
            let work = temp.path().join("work");
            std::fs::create_dir_all(&work).unwrap();
            git(&["init", "--bare", "--quiet", mirror.to_str().unwrap()], temp.path());
            git(&["init", "--quiet"], &work);

            let config = format!(
                "[repository]\nmirror_path = {:?}\n\n[cache]\nroot = {:?}\n\n{}",
                mirror,
                temp.path().join("cache"),
                packages
            );
            std::fs::write(temp.path().join("config.toml"), config).unwrap();

            Self { temp, mirror, work }
        }

        fn config_path(&self) -> PathBuf {
            self.temp.path().join("config.toml")
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("pkgstore");
            cmd.env("PKGSTORE_CONFIG", self.config_path());
            cmd
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.work.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }

        fn push(&self, branch: &str) {
            git(&["add", "--all"], &self.work);
            git(&["commit", "--quiet", "--allow-empty", "-m", "update"], &self.work);
            git(
                &[
                    "push",
                    "--quiet",
                    "--force",
                    self.mirror.to_str().unwrap(),
                    &format!("HEAD:refs/heads/{}", branch),
                ],
                &self.work,
            );
        }

        fn published(&self) -> Vec<String> {
            match std::fs::read_dir(self.temp.path().join("cache/archives")) {
                Ok(entries) => entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect(),
                Err(_) => Vec::new(),
            }
        }
    }

    fn git(args: &[&str], cwd: &Path) {
        let status = std::process::Command::new("git")
            .args([
                "-c",
                "user.name=pkgstore",
                "-c",
                "user.email=pkgstore@example.invalid",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "init.defaultBranch=work",
            ])
            .args(args)
            .current_dir(cwd)
            .status()
            .expect("git must be installed");
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("pkgstore")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Content-addressed package archive cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("pkgstore")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pkgstore"));
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("mirror.git"));
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        cargo_bin_cmd!("pkgstore")
            .env("PKGSTORE_CONFIG", &path)
            .args(["config", "init"])
            .assert()
            .success();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[cache]"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let ws = Workspace::with_packages("[[packages]]\nid = \"../escape\"\n");
        ws.cmd()
            .args(["locations", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn checkout_golden_hash() {
        let ws = Workspace::new();
        ws.write("test.txt", "test\n");
        ws.push("test");

        ws.cmd()
            .args(["checkout", "test", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(SINGLE_FILE_HASH));

        assert_eq!(ws.published(), vec![SINGLE_FILE_HASH.to_string()]);
        let dir = ws.temp.path().join("cache/archives").join(SINGLE_FILE_HASH);
        assert_eq!(std::fs::read_to_string(dir.join("test.txt")).unwrap(), "test\n");
        assert!(!dir.join(".git").exists());
    }

    #[test]
    fn checkout_is_idempotent() {
        let ws = Workspace::new();
        ws.write("test.txt", "test\n");
        ws.push("test");

        for _ in 0..2 {
            ws.cmd().args(["checkout", "test"]).assert().success();
        }
        assert_eq!(ws.published().len(), 1);
    }

    #[test]
    fn checkout_missing_path_has_no_archive() {
        let ws = Workspace::new();
        ws.write("test.txt", "test\n");
        ws.push("main");

        ws.cmd()
            .args(["checkout", "main", "--path", "non-existent", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"archive\": null"));
        assert!(ws.published().is_empty());
    }

    #[test]
    fn checkout_unknown_branch_fails() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["checkout", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Branch not found"))
            .stderr(predicate::str::contains("pkgstore branches"));
    }

    #[test]
    fn checkout_broken_link_publishes_nothing() {
        let ws = Workspace::new();
        ws.write("pkg/ok.txt", "ok\n");
        symlink("../non-existent", ws.work.join("pkg/bad-link")).unwrap();
        ws.push("broken");

        ws.cmd()
            .args(["checkout", "broken", "--path", "pkg"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("bad-link"));
        assert!(ws.published().is_empty());
    }

    #[test]
    fn checkout_materializes_unsafe_links() {
        let ws = Workspace::new();
        ws.write("dependency/dependency.txt", "dependency\n");
        ws.write("archive/linked.txt", "linked\n");
        symlink("../dependency", ws.work.join("archive/dependency")).unwrap();
        symlink("./linked.txt", ws.work.join("archive/link.txt")).unwrap();
        ws.push("links");

        ws.cmd()
            .args(["checkout", "links", "--path", "archive"])
            .assert()
            .success();

        let published = ws.published();
        assert_eq!(published.len(), 1);
        let dir = ws.temp.path().join("cache/archives").join(&published[0]);
        assert!(std::fs::symlink_metadata(dir.join("link.txt"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert!(std::fs::symlink_metadata(dir.join("dependency")).unwrap().is_dir());
    }

    #[test]
    fn branches_lists_mirror() {
        let ws = Workspace::new();
        ws.write("a.txt", "a");
        ws.push("main");
        ws.push("problems/sum/main");

        ws.cmd()
            .arg("branches")
            .assert()
            .success()
            .stdout(predicate::str::contains("main"))
            .stdout(predicate::str::contains("problems/sum/main"));
    }

    #[test]
    fn locations_include_synthesized_default() {
        let ws = Workspace::with_packages(
            "[[packages]]\nid = \"problems/sum\"\n\n[[packages.locations]]\nname = \"statement\"\npath = \"problems/sum/statement\"\n",
        );

        ws.cmd()
            .args(["locations", "problems/sum", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("location/statement/main"))
            .stdout(predicate::str::contains("\"name\": \"default\""))
            .stdout(predicate::str::contains("\"path\": \"problems/sum\""));
    }

    #[test]
    fn resolve_falls_back_to_package_branch() {
        let ws = Workspace::new();
        ws.write("problems/sum/statement.md", "Add two numbers\n");
        ws.push("problems/sum/main");

        ws.cmd()
            .args(["resolve", "problems/sum", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"branch\": \"problems/sum/main\""))
            .stdout(predicate::str::contains("\"location\": \"default\""));
    }

    #[test]
    fn resolve_without_content_fails() {
        let ws = Workspace::new();
        ws.write("other.txt", "x");
        ws.push("main");

        ws.cmd()
            .args(["resolve", "problems/sum"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No revision"));
    }

    #[test]
    fn resolve_unknown_location_fails() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["resolve", "problems/sum", "--location", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no location named nope"));
    }

    #[test]
    fn cat_prints_file_from_main_revision() {
        let ws = Workspace::with_packages(
            "[[packages]]\nid = \"problems/sum\"\n\n[[packages.locations]]\nname = \"statement\"\npath = \"statements/sum\"\n",
        );
        ws.write("statements/sum/statement.md", "Add two numbers\n");
        ws.push("location/statement/main");

        ws.cmd()
            .args(["cat", "problems/sum", "statement.md", "--location", "statement"])
            .assert()
            .success()
            .stdout(predicate::eq("Add two numbers\n"));

        ws.cmd()
            .args(["cat", "problems/sum", "missing.md"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File not found").or(predicate::str::contains("No revision")));
    }

    #[test]
    fn cat_missing_file_fails() {
        let ws = Workspace::new();
        ws.write("problems/sum/a.txt", "a");
        ws.push("main");

        ws.cmd()
            .args(["cat", "problems/sum", "b.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File not found"));
    }

    #[test]
    fn exec_runs_in_archive() {
        let ws = Workspace::new();
        ws.write("problems/sum/marker.txt", "x");
        ws.push("main");

        ws.cmd()
            .args(["exec", "problems/sum", "--", "ls"])
            .assert()
            .success()
            .stdout(predicate::str::contains("marker.txt"));
    }
}
