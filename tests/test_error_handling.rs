//! Error handling tests for malformed and invalid inputs
//!
//! Drives the fqsync binary and checks that failures exit non-zero with a
//! message locating the problem, and never leave output files behind.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;
use test_utils::SyncPaths;

fn fqsync(args: &[&Path]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_fqsync")).args(args).output()?)
}

/// Test that fewer than five paths is a usage error
#[test]
fn test_missing_arguments() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A"], &["A"], &["A"]);

    let output = fqsync(&paths.args()[..3])?;
    assert!(!output.status.success(), "Three arguments should be rejected");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "Should print usage, got: {stderr}");
    Ok(())
}

/// Test successful run prints the summary counts
#[test]
fn test_summary_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A", "B", "C", "D"], &["A", "B", "D"], &["B", "C", "D"]);

    let output = fqsync(&paths.args())?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Filtered 1 reads from first read file."), "{stdout}");
    assert!(stdout.contains("Filtered 1 reads from second read file."), "{stdout}");
    assert!(stdout.contains("Synced read files contain 2 reads."), "{stdout}");
    Ok(())
}

/// Test quiet mode keeps stdout empty
#[test]
fn test_quiet_mode() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A"], &["A"], &["A"]);

    let paths_args = paths.args();
    let mut args: Vec<&OsStr> = paths_args.iter().map(|p| p.as_os_str()).collect();
    args.push(OsStr::new("--quiet"));
    let output = Command::new(env!("CARGO_BIN_EXE_fqsync")).args(&args).output()?;

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}

/// Test handling of missing input file
#[test]
fn test_missing_file_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A"], &["A"], &["A"]);
    fs::remove_file(&paths.reads_2)?;

    let output = fqsync(&paths.args())?;
    assert!(!output.status.success(), "Missing file should cause error");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reads_2.fq"), "Should name the file, got: {stderr}");
    assert!(
        stderr.contains("No such file") || stderr.contains("not found"),
        "Should mention file not found, got: {stderr}"
    );
    assert!(!paths.synced_1.exists());
    Ok(())
}

/// Test duplicate identifiers in a filtered file
#[test]
fn test_duplicate_identifier_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A", "B"], &["A", "B", "A"], &["A", "B"]);

    let output = fqsync(&paths.args())?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate read identifier 'A'"), "got: {stderr}");
    assert!(stderr.contains("record 3"), "got: {stderr}");
    assert!(!paths.synced_1.exists() && !paths.synced_2.exists());
    Ok(())
}

/// Test malformed records name the file and record
#[test]
fn test_malformed_record_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A", "B"], &["A", "B"], &["A"]);
    fs::write(&paths.reads_2, "@A/2\nACGT\n+\nIIII\n@B/2\nACGT\n+\nII\n")?;

    let output = fqsync(&paths.args())?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reads_2.fq"), "got: {stderr}");
    assert!(stderr.contains("malformed FASTQ record 2"), "got: {stderr}");
    Ok(())
}

/// Test bytes outside printable ASCII are reported as a malformed record
#[test]
fn test_non_ascii_quality_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A", "B"], &["A", "B"], &["A", "B"]);
    fs::write(&paths.reads_1, b"@A/1\nACGT\n+\nIIII\n@B/1\nACGT\n+\nI\xffII\n")?;

    let output = fqsync(&paths.args())?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reads_1.fq"), "got: {stderr}");
    assert!(stderr.contains("malformed FASTQ record 2 (line 5)"), "got: {stderr}");
    assert!(!stderr.contains("cannot read"), "got: {stderr}");
    Ok(())
}

/// Test missing identifier policy switch
#[test]
fn test_missing_identifier_policy() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A", "B"], &["A", "Q"], &["A"]);

    let output = fqsync(&paths.args())?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'Q' does not occur"), "got: {stderr}");

    let paths_args = paths.args();
    let mut args: Vec<&OsStr> = paths_args.iter().map(|p| p.as_os_str()).collect();
    args.extend([OsStr::new("--missing"), OsStr::new("ignore")]);
    let output = Command::new(env!("CARGO_BIN_EXE_fqsync")).args(&args).output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    Ok(())
}

/// Test invalid option values are rejected
#[test]
fn test_invalid_options() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths = SyncPaths::new(temp_dir.path(), "fq");
    paths.write_inputs(&["A"], &["A"], &["A"]);

    let paths_args = paths.args();
    for extra in [["--missing", "drop"], ["-z", "12"]] {
        let mut args: Vec<&OsStr> = paths_args.iter().map(|p| p.as_os_str()).collect();
        args.extend(extra.iter().map(|s| OsStr::new(*s)));
        let output = Command::new(env!("CARGO_BIN_EXE_fqsync")).args(&args).output()?;
        assert!(!output.status.success(), "{extra:?} should be rejected");
    }
    Ok(())
}
