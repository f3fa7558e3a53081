//! Integration tests for Shelter

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn shelter() -> Command {
        cargo_bin_cmd!("shelter")
    }

    /// A config file pointing every store at the temp dir
    fn write_config(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("config.toml");
        let stores = temp.path().join("stores");
        std::fs::write(
            &path,
            format!("[cache]\ndir = \"{}\"\n", stores.display()),
        )
        .unwrap();
        path
    }

    fn write_manifest(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{"resources": {"/": "h1", "main.js": "h2"}, "shell": ["main.js", "/"]}"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn help_displays() {
        shelter()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Offline-first application shell cache",
            ));
    }

    #[test]
    fn version_displays() {
        shelter()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shelter"));
    }

    #[test]
    #[serial]
    fn config_path_displays() {
        shelter()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    #[serial]
    fn config_show_displays_sections() {
        shelter()
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]").and(predicate::str::contains("[network]")));
    }

    #[test]
    fn status_without_manifest_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No manifest configured"));
    }

    #[test]
    fn status_displays_stores() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let manifest = write_manifest(&temp);

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .args(["status", "--manifest"])
            .arg(&manifest)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Resources: 2")
                    .and(predicate::str::contains("Snapshot:  none")),
            );
    }

    #[test]
    fn status_json_format() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let manifest = write_manifest(&temp);

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .args(["status", "--format", "json", "--manifest"])
            .arg(&manifest)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"resources\": 2"));
    }

    #[test]
    fn status_rejects_invalid_manifest() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let manifest = temp.path().join("manifest.json");
        std::fs::write(&manifest, "{broken").unwrap();

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .args(["status", "--manifest"])
            .arg(&manifest)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid manifest"));
    }

    #[test]
    fn fetch_outside_origin_passes_through() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let manifest = write_manifest(&temp);

        // Default origin is localhost, so this URL is never intercepted
        // and nothing touches the network
        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .args(["fetch", "https://elsewhere.example.com/main.js", "--manifest"])
            .arg(&manifest)
            .assert()
            .success()
            .stdout(predicate::str::contains("Not intercepted"));
    }

    #[test]
    fn message_unrecognized_is_ignored() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let manifest = write_manifest(&temp);

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .args(["message", "reload-everything", "--manifest"])
            .arg(&manifest)
            .assert()
            .success()
            .stdout(predicate::str::contains("Delivered"));
    }

    #[test]
    fn clear_without_yes_does_nothing() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .arg("clear")
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing cleared"));
    }

    #[test]
    fn clear_with_yes_wipes_stores() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        // Seed a fake store entry so there is something to wipe
        let content_dir = temp.path().join("stores").join("content");
        std::fs::create_dir_all(&content_dir).unwrap();
        std::fs::write(content_dir.join("deadbeef.json"), "{}").unwrap();

        shelter()
            .args(["--no-local", "--config"])
            .arg(&config)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stores cleared"));

        assert!(!content_dir.exists());
    }

    #[test]
    fn init_creates_local_config() {
        let temp = TempDir::new().unwrap();

        shelter()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Created project config"));

        let content = std::fs::read_to_string(temp.path().join(".shelter.toml")).unwrap();
        assert!(content.contains("[network]"));
    }

    #[test]
    fn init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".shelter.toml"), "existing").unwrap();

        shelter()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn local_config_is_discovered() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let manifest = write_manifest(&temp);
        std::fs::write(
            temp.path().join(".shelter.toml"),
            "[network]\norigin = \"https://local.example.com\"\n",
        )
        .unwrap();

        shelter()
            .current_dir(temp.path())
            .arg("--config")
            .arg(&config)
            .args(["status", "--manifest"])
            .arg(&manifest)
            .assert()
            .success()
            .stdout(predicate::str::contains("https://local.example.com"));
    }
}
