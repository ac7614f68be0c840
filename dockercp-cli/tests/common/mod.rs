#![allow(dead_code)]

use assert_cmd::Command;
use dockercp_test_utils::{MockEngine, TarFixture};
use std::time::Duration;
use tempfile::TempDir;

pub const NGINX_CONF: &[u8] = b"user nginx;\nworker_processes 1;\n";

pub struct TestContext {
    pub cmd: Command,
    pub engine: MockEngine,
    /// Holds the temporary archive while a copy runs.
    pub tmp: TempDir,
    pub dest: TempDir,
}

impl TestContext {
    /// A fresh command pointed at the same engine
    pub fn new_cmd(&self) -> Command {
        command_for(&self.engine)
    }

    /// A command with no engine selected
    pub fn bare_cmd(&self) -> Command {
        bare_command()
    }

    pub fn leftover_archives(&self) -> usize {
        std::fs::read_dir(self.tmp.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "tar")
            })
            .count()
    }
}

fn bare_command() -> Command {
    let bin_path = env!("CARGO_BIN_EXE_dockercp");
    let mut cmd = Command::new(bin_path);
    cmd.timeout(Duration::from_secs(30));
    for var in ["DOCKER_HOST", "DOCKERCP_HOST", "DOCKERCP_BACKEND", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn command_for(engine: &MockEngine) -> Command {
    let mut cmd = bare_command();
    cmd.arg("--host").arg(engine.uri());
    cmd
}

/// Engine with a running `web1` serving nginx.conf and a stopped `db`.
pub fn nginx_engine() -> MockEngine {
    MockEngine::builder()
        .container("web1", true)
        .container("db", false)
        .archive(
            "web1",
            "/etc/nginx/nginx.conf",
            TarFixture::new().file("nginx.conf", NGINX_CONF).build(),
        )
        .start()
}

pub fn dockercp() -> TestContext {
    with_engine(nginx_engine())
}

pub fn with_engine(engine: MockEngine) -> TestContext {
    TestContext {
        cmd: command_for(&engine),
        engine,
        tmp: TempDir::new().expect("create temp dir"),
        dest: TempDir::new().expect("create destination dir"),
    }
}
