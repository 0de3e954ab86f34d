//! Verifies the manifest declares only dependencies the library itself
//! exercises; crates used solely by tests and the example stay in
//! dev-dependencies.

use std::path::PathBuf;
use std::process::Command;

#[test]
fn test_runtime_dependencies_are_exercised() {
    // Find workspace root by walking up from CARGO_MANIFEST_DIR
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .ancestors()
        .find(|p| p.join("Cargo.toml").exists() && p.join("crates").exists())
        .expect("Could not find workspace root");

    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let output = Command::new(&cargo)
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .current_dir(workspace_root)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute cargo at '{}': {}", cargo, e));
    assert!(output.status.success(), "cargo metadata command failed");

    let metadata: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Failed to parse cargo metadata JSON");

    let package = metadata["packages"]
        .as_array()
        .expect("packages should be an array")
        .iter()
        .find(|p| p["name"] == "taskdeck-notify")
        .expect("taskdeck-notify package should be in the workspace");

    let deps = package["dependencies"]
        .as_array()
        .expect("dependencies should be an array");
    let runtime: Vec<&str> = deps
        .iter()
        .filter(|d| d["kind"].is_null())
        .filter_map(|d| d["name"].as_str())
        .collect();
    let dev: Vec<&str> = deps
        .iter()
        .filter(|d| d["kind"] == "dev")
        .filter_map(|d| d["name"].as_str())
        .collect();

    for name in ["taskdeck-core", "uuid", "chrono", "rand", "tokio", "tracing"] {
        assert!(
            runtime.contains(&name),
            "expected runtime dependency {name} is missing"
        );
    }

    // Test-only crates must not ship as runtime dependencies
    for name in ["taskdeck-store", "serde_json", "async-trait"] {
        assert!(
            !runtime.contains(&name),
            "{name} must not be a runtime dependency"
        );
    }
    assert!(dev.contains(&"taskdeck-store"));
    assert!(dev.contains(&"serde_json"));
}
