//! Common test utilities and helpers
//!
//! This module provides reusable test helpers to reduce code duplication
//! across integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The hello-world description used across tests
pub const HELLO_YAML: &str = r#"
cli:
  name: greeter
  version: 1.0.0
  tagline: Say things
  commands:
    hello:
      desc: Say hello
      args:
        - name: name
          desc: Who to greet
      options:
        - name: style
          desc: Greeting style
          choices: [casual, formal, enthusiastic]
          default: casual
"#;

/// A managed command next to a standard one
pub const SERVER_YAML: &str = r#"
cli:
  name: svc
  commands:
    server:
      desc: Run the server
      lifecycle: managed
    ping:
      desc: Check the server
"#;

/// `a-b` and `a b` join to the same hook name in every target
pub const JOINED_YAML: &str = r#"
cli:
  name: joined
  commands:
    a-b:
      desc: Top level
    a:
      desc: Group
      subcommands:
        b:
          desc: Nested
"#;

/// Test command builder for the cli-forge binary
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    /// Create a new test command with HOME pointed at `home` so no global
    /// configuration leaks in
    pub fn new(home: &Path) -> Self {
        let mut cmd = Command::cargo_bin("cli-forge").expect("Failed to find cli-forge binary");
        cmd.env("HOME", home).env_remove("CLI_FORGE_CONFIG");
        Self { cmd }
    }

    /// Add arguments to the command
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    /// Add a single argument to the command
    pub fn arg<S: AsRef<std::ffi::OsStr>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Execute and expect success
    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    /// Execute and expect failure
    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    /// Assert stdout contains text
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Assert multiple stdout patterns
    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self.assert.stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self { assert: self.assert }
    }

    /// Assert stderr contains text
    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Finish the assertion
    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// Test environment setup helper
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    /// Create a new test environment with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get the project path
    pub fn project_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a description file into the project and return its path
    pub fn write_description(&self, name: &str, content: &str) -> PathBuf {
        let path = self.project_path().join(name);
        std::fs::write(&path, content).expect("Failed to write description");
        path
    }

    /// Location of the project configuration file
    pub fn config_path(&self) -> PathBuf {
        self.project_path().join(".cli-forge/forge.toml")
    }

    /// Create a command configured for this environment
    pub fn command(&self) -> TestCommand {
        TestCommand::new(self.project_path())
            .arg("--project")
            .arg(self.project_path())
    }

    /// Initialize configuration in the test environment
    pub fn init_config(&self) -> TestAssertion {
        self.command().arg("init").expect_success()
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
