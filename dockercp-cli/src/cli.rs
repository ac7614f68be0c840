use clap::{Args, Parser, Subcommand};
use dockercp::constants::envs;
use dockercp::{BackendKind, DockerCp, DockercpOptions, EngineEndpoint};

use crate::commands::{cp::CpArgs, ps::PsArgs};

/// Copy files and directories out of a container onto the local host
#[derive(Parser, Debug)]
#[command(name = "dockercp", author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a path out of a container
    Cp(CpArgs),
    /// List container names, stopped ones included
    Ps(PsArgs),
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Engine control socket, e.g. unix:///var/run/docker.sock
    #[arg(long, global = true, env = envs::DOCKERCP_HOST)]
    pub host: Option<EngineEndpoint>,

    /// Backend to use instead of probing (engine-client, local-socket)
    #[arg(long, global = true, env = envs::DOCKERCP_BACKEND)]
    pub backend: Option<BackendKind>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalFlags {
    pub fn options(&self) -> DockercpOptions {
        DockercpOptions {
            endpoint: self.host.clone(),
            backend: self.backend,
            temp_dir: None,
        }
    }

    pub fn create_client(&self, options: DockercpOptions) -> anyhow::Result<DockerCp> {
        Ok(DockerCp::new(options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dockercp",
            "ps",
            "--host",
            "unix:///tmp/engine.sock",
            "--backend",
            "local-socket",
        ])
        .unwrap();

        let options = cli.global.options();
        assert_eq!(options.endpoint, Some(EngineEndpoint::unix("/tmp/engine.sock")));
        assert_eq!(options.backend, Some(BackendKind::LocalSocket));
    }

    #[test]
    fn test_rejects_remote_host() {
        let result = Cli::try_parse_from(["dockercp", "--host", "tcp://1.2.3.4:2375", "ps"]);
        assert!(result.is_err());
    }
}
