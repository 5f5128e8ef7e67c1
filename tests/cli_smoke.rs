//! Black-box checks against the `happy` binary: version/help surface and a
//! real start-stop cycle under SIGTERM. Everything deeper than this (flag
//! parsing, config loading, the demo addon) is covered by `happy`'s own
//! `#[cfg(test)]` modules; this file only checks the process boundary.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::{BufRead, BufReader};
use std::process::Stdio;
use std::time::{Duration, Instant};

use assert_cmd::Command;

#[test]
fn version_flag_prints_version_and_exits_zero() {
    let output = Command::cargo_bin("happy").unwrap().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("happy"));
}

#[test]
fn help_flag_prints_usage_and_exits_zero() {
    let output = Command::cargo_bin("happy").unwrap().arg("--help").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn bare_invocation_prints_the_banner_and_exits_zero() {
    Command::cargo_bin("happy")
        .unwrap()
        .env("NO_COLOR", "1")
        .assert()
        .success();
}

/// Spawns `happy run`, waits for it to log that the engine is up, sends a
/// real SIGTERM, and checks it shuts down cleanly instead of hanging.
#[test]
fn run_subcommand_shuts_down_cleanly_on_sigterm() {
    let bin = assert_cmd::cargo::cargo_bin("happy");
    let mut child = std::process::Command::new(bin)
        .arg("run")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn `happy run`");

    let stdout = child.stdout.take().expect("piped stdout");
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            let _ = tx.send(line);
        }
    });

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut saw_ready = false;
    while Instant::now() < deadline {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(line) if line.contains("engine started") => {
                saw_ready = true;
                break;
            }
            Ok(_) => {}
            Err(_) => {}
        }
    }
    assert!(saw_ready, "never saw the engine-started log line");

    let status = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .expect("the `kill` utility should be available");
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(status) = child.try_wait().expect("try_wait should not fail") {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("`happy run` did not exit within 10s of SIGTERM");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(exit.success(), "`happy run` exited with {exit:?}");
}
