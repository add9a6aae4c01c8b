//! Locating, probing and running native packaging tools.

use crate::bundler::{
    contract::BundlerContext,
    error::{Error, Result},
    params::ParamStore,
};
use async_trait::async_trait;
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// A native tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    envs: Vec<(String, OsString)>,
}

impl ToolCommand {
    /// A command running `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Runs the tool from `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets an environment variable for the tool.
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.envs.push((key.into(), value.as_ref().to_os_string()));
        self
    }

    /// Program name as looked up on `PATH`.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, in order.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Working directory, if one was set.
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut all = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !all.is_empty() && !all.ends_with('\n') {
                all.push('\n');
            }
            all.push_str(&self.stderr);
        }
        all
    }
}

/// Access to native tools.
///
/// Bundlers never spawn processes directly; they go through this service so
/// hosts without the native tools can still exercise the full pipeline.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Finds a program, `None` if it is not installed.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Runs a version probe such as `rpmbuild --version` and returns its
    /// combined output.
    async fn probe(&self, program: &str, args: &[&str]) -> Result<String>;

    /// Runs a command to completion, capturing its output.
    ///
    /// A non-zero exit is not an error at this level.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs tools found on `PATH` with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolchain;

#[async_trait]
impl Toolchain for SystemToolchain {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        match which::which(program) {
            Ok(path) => {
                log::debug!("Found {} at: {}", program, path.display());
                Some(path)
            }
            Err(e) => {
                log::debug!("{program} not found in PATH: {e}");
                None
            }
        }
    }

    async fn probe(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: program.to_string(),
                error,
            })?;
        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .combined())
    }

    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.envs {
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|error| Error::CommandFailed {
            command: command.program.clone(),
            error,
        })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a packaging tool, logging its output in verbose mode and turning a
/// non-zero exit into [`Error::ToolFailed`].
pub async fn execute(
    ctx: &BundlerContext,
    store: &ParamStore,
    command: &ToolCommand,
) -> Result<ToolOutput> {
    ctx.verbose(store, format!("Running {}", command.display()));
    let output = ctx.toolchain().run(command).await?;

    if ctx.is_verbose(store) {
        let combined = output.combined();
        if !combined.trim().is_empty() {
            log::info!("{} output:\n{}", command.program(), combined.trim_end());
        }
    }

    if !output.success() {
        return Err(Error::ToolFailed {
            tool: command.program().to_string(),
            code: output.code,
            output: output.combined(),
        });
    }
    Ok(output)
}

/// A native tool that must be installed at or above a minimum version.
///
/// Declared as a `static` so the version pattern compiles once.
#[derive(Debug)]
pub struct ToolRequirement {
    /// Program name looked up on `PATH`.
    pub program: &'static str,
    /// Arguments printing the version.
    pub version_args: &'static [&'static str],
    /// Pattern whose first capture group is `major.minor`.
    pub version_pattern: LazyLock<Regex>,
    /// Minimum `(major, minor)`.
    pub minimum: (u64, u64),
    /// How to install the tool.
    pub install_hint: &'static str,
}

impl ToolRequirement {
    fn minimum_label(&self) -> String {
        format!("{}.{}", self.minimum.0, self.minimum.1)
    }

    fn missing(&self) -> Error {
        Error::unsupported(
            format!(
                "Can not find {} {} or newer.",
                self.program,
                self.minimum_label()
            ),
            self.install_hint,
        )
    }

    /// Extracts `major.minor` from probe output.
    pub fn parse_version(&self, output: &str) -> Option<semver::Version> {
        let captured = self.version_pattern.captures(output)?.get(1)?.as_str();
        let mut parts = captured.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        Some(semver::Version::new(major, minor, 0))
    }

    /// Locates and probes the tool, failing with an unsupported-platform
    /// error when it is absent or too old.
    pub async fn check(&self, toolchain: &dyn Toolchain) -> Result<semver::Version> {
        if toolchain.locate(self.program).is_none() {
            return Err(self.missing());
        }

        let output = match toolchain.probe(self.program, self.version_args).await {
            Ok(output) => output,
            Err(e) => {
                log::debug!("{} version probe failed: {}", self.program, e);
                return Err(self.missing());
            }
        };

        let Some(version) = self.parse_version(&output) else {
            log::debug!(
                "Could not read {} version from: {}",
                self.program,
                output.trim()
            );
            return Err(self.missing());
        };

        let minimum = semver::Version::new(self.minimum.0, self.minimum.1, 0);
        if version < minimum {
            log::debug!(
                "{} {} found, {} required",
                self.program,
                version,
                self.minimum_label()
            );
            return Err(self.missing());
        }

        log::debug!("{} {} available", self.program, version);
        Ok(version)
    }
}
