//! Constants shared across dockercp crates.

/// Engine connection defaults.
pub mod engine {
    /// Well-known control socket of a local Docker-compatible engine.
    pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

    /// URI scheme accepted for engine endpoints.
    pub const UNIX_SCHEME: &str = "unix://";

    /// Host header sent on raw socket requests; the engine ignores its value.
    pub const HTTP_HOST: &str = "docker";
}

/// Environment variables consulted by dockercp.
pub mod envs {
    /// Standard engine location variable, honored when it holds a `unix://` URI.
    pub const DOCKER_HOST: &str = "DOCKER_HOST";

    /// Endpoint override for the CLI.
    pub const DOCKERCP_HOST: &str = "DOCKERCP_HOST";

    /// Backend override for the CLI.
    pub const DOCKERCP_BACKEND: &str = "DOCKERCP_BACKEND";
}

/// Fetch defaults.
pub mod fetch {
    /// Default I/O buffer length in bytes.
    pub const DEFAULT_BUFFER_LEN: usize = 4096;

    /// Prefix of the temporary archive file.
    pub const TEMP_FILE_PREFIX: &str = "dockercp-";

    /// Suffix of the temporary archive file.
    pub const TEMP_FILE_SUFFIX: &str = ".tar";
}
