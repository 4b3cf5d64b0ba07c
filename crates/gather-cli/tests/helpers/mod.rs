#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Runs the `gather` binary against a throwaway database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// A command isolated from any `gather.toml` in the developer's checkout
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("gather").expect("Failed to find gather binary");
        cmd.current_dir(self.temp_dir.path())
            .env("GATHER_DATABASE_PATH", &self.db_path)
            .env("GATHER_DEFAULT_TIMEZONE", "UTC")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Stdout of a successful run with colour codes removed
    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        strip_ansi(&String::from_utf8_lossy(&output))
    }
}

pub fn strip_ansi(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for code in chars.by_ref() {
                if code.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            plain.push(c);
        }
    }
    plain
}

/// The short id printed in parentheses by the add and submit commands
pub fn short_id_in(output: &str) -> String {
    let open = output.find('(').expect("no '(' in output");
    let close = output[open..].find(')').expect("no ')' in output") + open;
    output[open + 1..close].to_string()
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error:")
    }

    pub fn created() -> impl Predicate<str> {
        predicate::str::contains("✓")
    }
}
