//! Integration tests for b64shell

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the user's config and state
    fn b64shell(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("b64shell");
        cmd.arg("--config")
            .arg(temp.path().join("config.toml"))
            .arg("--state-dir")
            .arg(temp.path().join("state"))
            .env_remove("B64SHELL_CONFIG")
            .env_remove("B64SHELL_STATE_DIR");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Base64"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("b64shell"));
    }

    #[test]
    fn encode_text() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["encode", "Hello, 世界"])
            .assert()
            .success()
            .stdout("SGVsbG8sIOS4lueVjA==\n");
    }

    #[test]
    fn encode_stdin_as_data_uri() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["encode", "--mime", "text/plain"])
            .write_stdin("hi\n")
            .assert()
            .success()
            .stdout("data:text/plain;base64,aGk=\n");
    }

    #[test]
    fn decode_text() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["decode", "SGVsbG8sIOS4lueVjA"])
            .assert()
            .success()
            .stdout("Hello, 世界\n");
    }

    #[test]
    fn decode_image_data_uri_prints_label() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["decode", "data:image/png;base64,iVBORw0KGgo="])
            .assert()
            .success()
            .stdout(predicate::str::contains("[Previewable Data URI: image/png]"));
    }

    #[test]
    fn decode_invalid_fails() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["decode", "not*base64"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid Base64 string"));
    }

    #[test]
    fn preview_text_data_uri() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args([
                "preview",
                "data:text/plain;base64,SGVsbG8=",
                "--format",
                "json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"kind\": \"text\""))
            .stdout(predicate::str::contains("\"detail\": \"Hello\""));
    }

    #[test]
    fn preview_rejects_plain_base64() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["preview", "SGVsbG8="])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not a Base64 Data URI"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[app]"))
            .stdout(predicate::str::contains("base64-app"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[app\n").unwrap();
        b64shell(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout("[]\n");
    }

    #[test]
    fn unreadable_store_does_not_block_cache_commands() {
        let temp = TempDir::new().unwrap();
        let caches = temp.path().join("state").join("caches");
        std::fs::create_dir_all(&caches).unwrap();
        let broken = caches.join("base64-app-v1.0.0.json");
        std::fs::write(&broken, "{\"name\": \"base64-app-v1.0.0\"").unwrap();

        b64shell(&temp)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout("[]\n");

        b64shell(&temp)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();
        assert!(!broken.exists());
    }

    #[test]
    fn worker_status_without_registration() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["worker", "status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"active\": null"));
    }

    #[test]
    fn client_open_is_persisted() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["worker", "client", "open"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Opened client"));

        b64shell(&temp)
            .args(["worker", "status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("http://localhost:3000/"));
    }

    #[test]
    fn offline_fetch_without_worker_fails() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["worker", "fetch", "http://localhost:3000/", "--offline"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request"));
    }

    #[test]
    fn activate_without_waiting_worker_fails() {
        let temp = TempDir::new().unwrap();
        b64shell(&temp)
            .args(["worker", "activate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No waiting worker"));
    }
}
