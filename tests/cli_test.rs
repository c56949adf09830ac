//! Binary-level tests for the argument/validation surface. These only cover
//! paths that fail before any external command is attempted, so they are safe
//! to run on hosts without firewalld or SELinux tooling.

use anyhow::Result;
use assert_cmd::Command;

fn portctl() -> Command {
    Command::cargo_bin("portctl").unwrap()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn missing_subcommand_prints_usage() -> Result<()> {
    let output = portctl().output()?;
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Usage"));
    Ok(())
}

#[test]
fn open_requires_ports() -> Result<()> {
    let output = portctl().arg("open").output()?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn open_rejects_out_of_range_port() -> Result<()> {
    let output = portctl().args(["open", "99999/tcp"]).output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("99999/tcp"));
    Ok(())
}

#[test]
fn open_rejects_unknown_protocol() -> Result<()> {
    let output = portctl().args(["open", "8080/http"]).output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("8080/http"));
    Ok(())
}

#[test]
fn close_validates_before_touching_anything() -> Result<()> {
    // A bad token anywhere in the batch aborts the whole invocation.
    let output = portctl().args(["close", "80/tcp", "0/tcp"]).output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("0/tcp"));
    Ok(())
}

#[test]
fn help_mentions_all_subcommands() -> Result<()> {
    let output = portctl().arg("--help").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(stdout.contains("open"));
    assert!(stdout.contains("close"));
    assert!(stdout.contains("list"));
    Ok(())
}

#[test]
fn unknown_flag_is_a_usage_error() -> Result<()> {
    let output = portctl().args(["list", "--frobnicate"]).output()?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
