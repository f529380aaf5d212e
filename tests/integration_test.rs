mod common;

use common::{TestCommand, TestEnvironment, HELLO_YAML, JOINED_YAML, SERVER_YAML};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    TestCommand::new(home.path())
        .arg("--help")
        .expect_success()
        .stdout_contains_all(["generate", "validate", "hooks", "targets"]);
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    TestCommand::new(home.path())
        .arg("--version")
        .expect_success()
        .stdout_contains("cli-forge");
}

#[test]
fn test_targets_list() {
    let env = TestEnvironment::new();
    env.command()
        .arg("targets")
        .expect_success()
        .stdout_contains("Available targets")
        .stdout_contains_all(["python", "nodejs", "typescript", "rust", "Python (click)"]);
}

#[test]
fn test_validate_summary() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", HELLO_YAML);
    env.command()
        .arg("validate")
        .arg(&input)
        .expect_success()
        .stdout_contains("greeter 1.0.0 is valid")
        .stdout_contains("commands:       1");
}

#[test]
fn test_validate_rejects_broken_description() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", "cli:\n  name: x\n  commands:\n    a: {}\n");
    env.command()
        .arg("validate")
        .arg(&input)
        .expect_failure()
        .stderr_contains("desc");
}

#[test]
fn test_hooks_table() {
    let env = TestEnvironment::new();
    let input = env.write_description("svc.yaml", SERVER_YAML);
    env.command()
        .args(["hooks", "--target", "nodejs"])
        .arg(&input)
        .expect_success()
        .stdout_contains("server [managed] → ServerController")
        .stdout_contains("onServerStart, onCommandExecuted")
        .stdout_contains("ping → onPing");
}

#[test]
fn test_generate_all_requested_targets() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", HELLO_YAML);
    let out = env.project_path().join("out");

    env.command()
        .arg("generate")
        .arg(&input)
        .args(["-t", "python", "-t", "nodejs", "-t", "typescript", "-t", "rust", "-o"])
        .arg(&out)
        .expect_success()
        .stdout_contains_all(["✓ python", "✓ nodejs", "✓ typescript", "✓ rust"]);

    assert!(out.join("python/src/greeter/cli.py").exists());
    assert!(out.join("nodejs/cli.js").exists());
    assert!(out.join("typescript/tsconfig.json").exists());
    assert!(out.join("rust/src/main.rs").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(out.join("python/setup.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
        let mode = fs::metadata(out.join("rust/Cargo.toml")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
    }
}

#[test]
fn test_regenerate_keeps_user_hooks() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", HELLO_YAML);
    let out = env.project_path().join("out");
    let generate = || {
        env.command()
            .arg("generate")
            .arg(&input)
            .args(["-t", "python", "-o"])
            .arg(&out)
            .expect_success()
    };

    generate();
    let hooks = out.join("python/src/greeter/cli_hooks.py");
    fs::write(&hooks, "def on_hello(name, style):\n    print('mine')\n").unwrap();

    generate().stdout_contains("1 kept");
    assert!(fs::read_to_string(&hooks).unwrap().contains("mine"));
}

#[test]
fn test_unknown_target_fails_without_blocking_others() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", HELLO_YAML);
    let out = env.project_path().join("out");

    env.command()
        .arg("generate")
        .arg(&input)
        .args(["-t", "cobol", "-t", "rust", "-o"])
        .arg(&out)
        .expect_failure()
        .stdout_contains("✗ cobol")
        .stdout_contains("✓ rust")
        .stderr_contains("1 of 2 targets failed");

    assert!(out.join("rust/Cargo.toml").exists());
}

#[test]
fn test_joined_hook_names_fail_every_target() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", JOINED_YAML);
    let out = env.project_path().join("out");

    env.command()
        .arg("generate")
        .arg(&input)
        .args(["-t", "python", "-t", "rust", "-o"])
        .arg(&out)
        .expect_failure()
        .stdout_contains("Commands 'a-b' and 'a b' both define hook 'on_a_b'")
        .stdout_contains("failing command: a b")
        .stderr_contains("2 of 2 targets failed");

    assert!(!out.join("python").exists());
    assert!(!out.join("rust").exists());

    env.command()
        .arg("validate")
        .arg(&input)
        .expect_failure()
        .stderr_contains("both define hook");
}

#[test]
fn test_dry_run_writes_nothing() {
    let env = TestEnvironment::new();
    let input = env.write_description("cli.yaml", HELLO_YAML);
    let out = env.project_path().join("out");

    env.command()
        .arg("generate")
        .arg(&input)
        .args(["--dry-run", "-t", "nodejs", "-o"])
        .arg(&out)
        .expect_success()
        .stdout_contains("would write")
        .stdout_contains("package.json");

    assert!(!out.exists());
}

#[test]
fn test_init_and_config_roundtrip() {
    let env = TestEnvironment::new();
    env.init_config().stdout_contains("Configuration initialized successfully");
    assert!(env.config_path().exists());

    env.init_config().stdout_contains("already initialized");

    env.command()
        .args(["config", "set", "generation.targets", "rust,python"])
        .expect_success()
        .stdout_contains("Configuration updated");
    env.command()
        .args(["config", "get", "generation.targets"])
        .expect_success()
        .stdout_contains("rust,python");
    env.command()
        .args(["config", "show"])
        .expect_success()
        .stdout_contains("[generation]");
    env.command()
        .args(["config", "set", "generation.max_depth", "zero"])
        .expect_failure();
}

#[test]
fn test_generate_uses_configured_defaults() {
    let env = TestEnvironment::new();
    env.init_config();
    env.command()
        .args(["config", "set", "generation.targets", "rust"])
        .expect_success();
    let input = env.write_description("cli.yaml", HELLO_YAML);

    env.command()
        .arg("generate")
        .arg(&input)
        .expect_success()
        .stdout_contains("✓ rust");

    assert!(env.project_path().join("generated/rust/Cargo.toml").exists());
    assert!(!env.project_path().join("generated/python").exists());
}
