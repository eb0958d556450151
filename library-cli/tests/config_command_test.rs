//! Integration tests for `overlay-library config` and command guards

use anyhow::Result;
use std::process::Command;
use tempfile::TempDir;

fn run(args: &[&str]) -> Result<std::process::Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_overlay-library"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()?)
}

#[test]
fn test_config_init_then_show() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.yaml");
    let path_str = path.to_str().unwrap();

    let output = run(&["--config", path_str, "--tenant", "acme", "config", "init"])?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(path.exists());

    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("tenant_id: acme"));
    assert!(written.contains("timeout_seconds: 30"));

    let output = run(&["--config", path_str, "config", "show"])?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tenant_id: acme"));
    assert!(stdout.contains("ledger_dir resolves to"));

    Ok(())
}

#[test]
fn test_config_init_refuses_to_overwrite() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "tenant_id: globex\n")?;
    let path_str = path.to_str().unwrap();

    let output = run(&["--config", path_str, "config", "init"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
    assert_eq!(std::fs::read_to_string(&path)?, "tenant_id: globex\n");

    let output = run(&["--config", path_str, "config", "init", "--force"])?;
    assert!(output.status.success());
    assert!(!std::fs::read_to_string(&path)?.contains("globex"));

    Ok(())
}

#[test]
fn test_uninstall_without_tenant_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &path,
        format!(
            "catalog_url: http://127.0.0.1:9/index.json\nledger_dir: {}\n",
            temp_dir.path().display()
        ),
    )?;

    let output = run(&["--config", path.to_str().unwrap(), "uninstall", "revops", "--yes"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No tenant configured"));

    Ok(())
}

#[test]
fn test_uninstall_unknown_pack_fails_before_prompt() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &path,
        format!(
            "catalog_url: http://127.0.0.1:9/index.json\nledger_dir: {}\n",
            temp_dir.path().display()
        ),
    )?;

    let output = run(&[
        "--config",
        path.to_str().unwrap(),
        "--tenant",
        "acme",
        "uninstall",
        "revops",
    ])?;
    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Remove them?"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Pack 'revops' is not installed"));

    Ok(())
}

#[test]
fn test_author_bundle_requires_some_ids() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "store_url: http://127.0.0.1:9/v1\n")?;

    let output = run(&[
        "--config",
        path.to_str().unwrap(),
        "--tenant",
        "acme",
        "author",
        "bundle",
        "--name",
        "Starter",
    ])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nothing selected"));

    Ok(())
}
