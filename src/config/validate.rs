// src/config/validate.rs

use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{BuildConfig, DevServerConfig, RawBuildConfig, RunMode};
use crate::errors::{BunnyError, Result};
use crate::watch::path_utils::resolve_relative;

const MIN_PORT: u32 = 1024;
const MAX_PORT: u32 = 65535;

impl TryFrom<RawBuildConfig> for BuildConfig {
    type Error = BunnyError;

    fn try_from(raw: RawBuildConfig) -> std::result::Result<Self, Self::Error> {
        let source = resolve_relative(&raw.cwd, &raw.source);
        if !source.exists() {
            return Err(BunnyError::SourceNotFound(source));
        }
        let target = raw.target.map(|t| resolve_relative(&raw.cwd, &t));
        Ok(BuildConfig::new_unchecked(source, target))
    }
}

impl DevServerConfig {
    /// Validate dev server settings.
    ///
    /// The port must be in `1024..=65535` and a target file is mandatory,
    /// because the server has nothing to serve otherwise.
    pub fn new(port: u32, target: Option<&Path>, open_browser: bool) -> Result<Self> {
        let port = validate_port(port)?;
        let target = target.ok_or(BunnyError::TargetRequired("the dev server"))?;
        Ok(Self {
            port,
            target: target.to_path_buf(),
            open_browser,
        })
    }
}

/// Check that `port` is an unprivileged TCP port.
pub fn validate_port(port: u32) -> Result<u16> {
    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        return Err(BunnyError::InvalidPort(port));
    }
    u16::try_from(port).map_err(|_| BunnyError::InvalidPort(port))
}

/// Pick the run mode from CLI flags. `--dev` wins over `--watch`.
pub fn resolve_run_mode(args: &CliArgs, config: &BuildConfig) -> Result<RunMode> {
    if let Some(port) = args.dev {
        let dev = DevServerConfig::new(port, config.target(), !args.no_open)?;
        return Ok(RunMode::Dev(dev));
    }
    if args.watch {
        return Ok(RunMode::Watch);
    }
    Ok(RunMode::Once)
}
