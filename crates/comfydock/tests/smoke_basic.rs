//! Smoke test suite for the CLI flows that work without Docker
//!
//! Scenarios covered:
//! - help and version output
//! - list on an empty data directory (text and JSON)
//! - settings set/show roundtrip against a temporary data directory
//! - folder add/remove through settings set
//! - create validation failures surface field errors and a non-zero exit
//! - duplicate with an unknown id fails before touching Docker
//! - delete and restore move records between the live and deleted lists
//! - a failed image pull surfaces the pull error
//! - a missing runtime executable maps to exit code 2

use assert_cmd::Command;
use predicates::str as pred_str;
use serde_json::Value;
use tempfile::TempDir;

fn comfydock(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("comfydock").unwrap();
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

#[test]
fn smoke_help_and_version() {
    let mut cmd = Command::cargo_bin("comfydock").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(pred_str::contains("ComfyUI environment manager"))
        .stdout(pred_str::contains("create"))
        .stdout(pred_str::contains("duplicate"));

    let mut cmd = Command::cargo_bin("comfydock").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(pred_str::contains("comfydock"));
}

#[test]
fn smoke_no_subcommand_prints_hint() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .assert()
        .success()
        .stdout(pred_str::contains("--help"));
}

#[test]
fn smoke_list_empty() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(pred_str::contains("No environments found."));
}

#[test]
fn smoke_list_empty_json() {
    let tmp = TempDir::new().unwrap();
    let output = comfydock(&tmp).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records, serde_json::json!([]));
}

#[test]
fn smoke_settings_roundtrip() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args([
            "settings",
            "set",
            "--comfyui-path",
            "/opt/comfy/ComfyUI",
            "--port",
            "9001",
        ])
        .assert()
        .success()
        .stdout(pred_str::contains("Settings updated."));

    comfydock(&tmp)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(pred_str::contains("/opt/comfy/ComfyUI"))
        .stdout(pred_str::contains("9001"));

    let output = comfydock(&tmp)
        .args(["settings", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let settings: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["port"], serde_json::json!(9001));
    assert_eq!(
        settings["comfyui_path"],
        serde_json::json!("/opt/comfy/ComfyUI")
    );
}

#[test]
fn smoke_settings_set_requires_a_flag() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["settings", "set"])
        .assert()
        .failure()
        .stderr(pred_str::contains("nothing to update"));
}

#[test]
fn smoke_settings_folder_management() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["settings", "set", "--add-folder", "Experiments"])
        .assert()
        .success()
        .stdout(pred_str::contains("Settings updated."));

    let output = comfydock(&tmp)
        .args(["settings", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let settings: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        settings["folders"][0]["name"],
        serde_json::json!("Experiments")
    );
    let id = settings["folders"][0]["id"].as_str().unwrap().to_string();

    comfydock(&tmp)
        .args(["settings", "set", "--remove-folder", "no-such-folder"])
        .assert()
        .failure()
        .stderr(pred_str::contains("no folder with id"));

    comfydock(&tmp)
        .args(["settings", "set", "--remove-folder", &id])
        .assert()
        .success()
        .stdout(pred_str::contains("Settings updated."));

    let output = comfydock(&tmp)
        .args(["settings", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let settings: Value = serde_json::from_slice(&output.stdout).unwrap();
    // An empty folder list is omitted from the serialized settings
    assert!(settings.get("folders").is_none());
}

#[test]
fn smoke_create_validation_failure() {
    // No name, no image, no path configured: validation rejects the form
    // before any Docker call is attempted.
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["--non-interactive", "create"])
        .assert()
        .failure()
        .stderr(pred_str::contains("validation failed"))
        .stderr(pred_str::contains("name"))
        .stderr(pred_str::contains("image"));
}

#[test]
fn smoke_create_rejects_auto_type() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["--non-interactive", "create", "--environment-type", "Auto"])
        .assert()
        .failure()
        .stderr(pred_str::contains("only available when duplicating"));
}

#[test]
fn smoke_create_rejects_unknown_type() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args([
            "--non-interactive",
            "create",
            "--environment-type",
            "Default+Everything",
        ])
        .assert()
        .failure()
        .stderr(pred_str::contains("Unknown environment type"));
}

#[test]
fn smoke_delete_unknown_id() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["delete", "no-such-env", "--yes"])
        .assert()
        .failure()
        .stderr(pred_str::contains("Environment not found"));
}

#[test]
fn smoke_delete_requires_confirmation_when_non_interactive() {
    let tmp = TempDir::new().unwrap();
    // The id lookup happens first, so use a store with a record. Seed one
    // directly through the store file format.
    std::fs::write(
        tmp.path().join("environments.json"),
        serde_json::json!({
            "environments": [{
                "id": "env-1",
                "name": "main",
                "image": "akatzai/comfyui-env:latest",
                "created_at": "2026-08-01T00:00:00Z"
            }],
            "deleted": []
        })
        .to_string(),
    )
    .unwrap();

    comfydock(&tmp)
        .args(["--non-interactive", "delete", "env-1"])
        .assert()
        .failure()
        .stderr(pred_str::contains("--yes"));

    comfydock(&tmp)
        .args(["delete", "env-1", "--yes"])
        .assert()
        .success()
        .stdout(pred_str::contains("Deleted environment 'main'"));

    comfydock(&tmp)
        .args(["list", "--deleted"])
        .assert()
        .success()
        .stdout(pred_str::contains("main"));
}

#[test]
fn smoke_restore_deleted_environment() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("environments.json"),
        serde_json::json!({
            "environments": [],
            "deleted": [{
                "id": "env-1",
                "name": "main",
                "image": "akatzai/comfyui-env:latest",
                "created_at": "2026-08-01T00:00:00Z",
                "deleted_at": "2026-08-02T00:00:00Z"
            }]
        })
        .to_string(),
    )
    .unwrap();

    comfydock(&tmp)
        .args(["restore", "no-such-env"])
        .assert()
        .failure()
        .stderr(pred_str::contains("Environment not found"));

    comfydock(&tmp)
        .args(["restore", "env-1"])
        .assert()
        .success()
        .stdout(pred_str::contains("Restored environment 'main'"));

    comfydock(&tmp)
        .args(["list"])
        .assert()
        .success()
        .stdout(pred_str::contains("main"));

    comfydock(&tmp)
        .args(["list", "--deleted"])
        .assert()
        .success()
        .stdout(pred_str::contains("No environments found."));
}

#[cfg(unix)]
#[test]
fn smoke_failed_pull_surfaces_pull_error() {
    use predicates::prelude::PredicateBooleanExt;
    use std::os::unix::fs::PermissionsExt;

    // Stub runtime: the image is never present locally and every pull fails.
    let tmp = TempDir::new().unwrap();
    let stub = tmp.path().join("stub-docker");
    std::fs::write(
        &stub,
        "#!/bin/sh\n\
         if [ \"$1\" = \"image\" ]; then\n\
           echo 'Error response from daemon: No such image' >&2\n\
         else\n\
           echo 'Error response from daemon: pull access denied' >&2\n\
         fi\n\
         exit 1\n",
    )
    .unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

    comfydock(&tmp)
        .args([
            "--non-interactive",
            "--runtime-path",
            stub.to_str().unwrap(),
            "create",
            "--name",
            "env",
            "--image",
            "akatzai/comfyui-env:latest",
            "--comfyui-path",
            "/opt/comfy",
        ])
        .assert()
        .failure()
        .stderr(pred_str::contains("Failed to pull image"))
        .stderr(pred_str::contains("Internal error").not());
}

#[test]
fn smoke_duplicate_unknown_id() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["duplicate", "no-such-env"])
        .assert()
        .failure()
        .stderr(pred_str::contains("Environment not found"));
}

#[test]
fn smoke_missing_runtime_is_exit_code_2() {
    let tmp = TempDir::new().unwrap();
    comfydock(&tmp)
        .args(["--runtime-path", "/definitely/not/a/runtime", "releases"])
        .assert()
        .code(2)
        .stderr(pred_str::contains("Docker is not installed"));
}
