use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prsize"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "prsize init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".prsize.toml");
    assert!(config_path.exists(), ".prsize.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[exclude.lines]"));
    assert!(content.contains("[[labels]]"));

    // Verify it's valid TOML that prsize-core can parse
    let config: prsize_core::PrsizeConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.labels.len(), 5);
    assert_eq!(config.target, Some(256));
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".prsize.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_prsize"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".prsize.toml")).unwrap();
    assert_eq!(content, "# existing");
}
