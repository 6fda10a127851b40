//! End-to-end tests that exercise the built `repcrec` binary directly,
//! the way a user would invoke it from a shell.

use std::io::Write;
use std::process::{Command, Stdio};

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_repcrec"))
}

#[test]
fn file_mode_splits_into_named_blocks() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "// Test one").unwrap();
    writeln!(file, "begin(T1)").unwrap();
    writeln!(file, "dump()").unwrap();
    writeln!(file, "end(T1)").unwrap();
    writeln!(file, "// Test two").unwrap();
    writeln!(file, "dump()").unwrap();

    let output = binary().arg(file.path()).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("===== Running Test one ====="));
    assert!(stdout.contains("===== Running Test two ====="));
    assert!(stdout.contains("begin(T1) at time"));
}

#[test]
fn stdin_mode_runs_one_unbroken_stream_with_no_headers() {
    let mut child = binary()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"begin(T1)\ndump()\nend(T1)\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("====="));
    assert!(stdout.contains("T1 commits"));
}

#[test]
fn missing_file_reports_an_error_and_exits_nonzero() {
    let output = binary().arg("/nonexistent/path/does-not-exist.txt").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("repcrec:"));
}
