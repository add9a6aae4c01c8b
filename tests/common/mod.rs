//! Shared fixtures for integration tests.
//!
//! `FakeToolchain` stands in for rpmbuild, dpkg-deb, hdiutil and makensis: it
//! answers version probes, records every invocation and writes a small file
//! where the real tool would put its artifact.

#![allow(dead_code)]

use async_trait::async_trait;
use kodegen_bundler_package::bundler::{
    BundlerContext, ParamStore, Result, ToolCommand, ToolOutput, Toolchain,
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;

pub struct FakeToolchain {
    missing: Vec<&'static str>,
    failing: Vec<&'static str>,
    probes: Mutex<Vec<String>>,
    runs: Mutex<Vec<ToolCommand>>,
}

impl FakeToolchain {
    /// Every packaging tool installed at a recent version.
    pub fn installed() -> Self {
        Self {
            missing: Vec::new(),
            failing: Vec::new(),
            probes: Mutex::new(Vec::new()),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// `program` is not on the PATH.
    pub fn without(mut self, program: &'static str) -> Self {
        self.missing.push(program);
        self
    }

    /// `program` runs but exits with status 1.
    pub fn failing(mut self, program: &'static str) -> Self {
        self.failing.push(program);
        self
    }

    pub fn runs(&self) -> Vec<ToolCommand> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_programs(&self) -> Vec<String> {
        self.runs().iter().map(|c| c.program().to_string()).collect()
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

fn version_banner(program: &str) -> &'static str {
    match program {
        "rpmbuild" => "RPM version 4.18.2\n",
        "dpkg-deb" => "Debian 'dpkg-deb' package management program version 1.21.22 (amd64).\n",
        "makensis" => "v3.09\n",
        _ => "1.0\n",
    }
}

/// Where the real tool would write its artifact.
fn artifact_path(command: &ToolCommand) -> Option<PathBuf> {
    let args: Vec<String> = command
        .get_args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    match command.program() {
        "rpmbuild" => {
            let dir = args.iter().find_map(|a| a.strip_prefix("%_rpmdir "))?;
            let spec = PathBuf::from(args.get(1)?);
            let stem = spec.file_stem()?.to_string_lossy().to_lowercase();
            Some(Path::new(dir).join(format!("{stem}-1.0-1.x86_64.rpm")))
        }
        "dpkg-deb" | "hdiutil" => args.last().map(PathBuf::from),
        "makensis" => args
            .iter()
            .find_map(|a| a.strip_prefix("-DOUTPUT_FILE="))
            .map(PathBuf::from),
        _ => None,
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        (!self.missing.contains(&program)).then(|| PathBuf::from("/usr/bin").join(program))
    }

    async fn probe(&self, program: &str, _args: &[&str]) -> Result<String> {
        self.probes.lock().unwrap().push(program.to_string());
        Ok(version_banner(program).to_string())
    }

    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        self.runs.lock().unwrap().push(command.clone());
        if self.failing.contains(&command.program()) {
            return Ok(ToolOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("{}: simulated failure", command.program()),
            });
        }
        if let Some(artifact) = artifact_path(command) {
            std::fs::write(&artifact, b"fake artifact").unwrap();
        }
        Ok(ToolOutput {
            code: Some(0),
            stdout: "done".to_string(),
            stderr: String::new(),
        })
    }
}

/// A context backed by `tools`.
pub fn context(tools: &Arc<FakeToolchain>) -> BundlerContext {
    BundlerContext::new(tools.clone())
}

/// A small application image on disk with a store describing it.
pub struct AppFixture {
    pub root: TempDir,
    pub store: ParamStore,
}

impl AppFixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("src");
        std::fs::create_dir_all(src.join("data")).unwrap();
        std::fs::write(src.join("hello"), "#!/bin/sh\necho hello\n").unwrap();
        std::fs::write(src.join("LICENSE"), "MIT License\n\nPermission is granted.\n").unwrap();
        std::fs::write(src.join("data/config.json"), "{}").unwrap();

        let mut store = ParamStore::new();
        store.insert("appName", "Hello World");
        store.insert("vendor", "Acme");
        store.insert("appVersion", "1.2");
        store.insert("mainBinary", src.join("hello"));
        store.insert("srcdir", src.clone());
        store.insert("licenseFile", vec!["LICENSE"]);
        store.insert("buildRoot", root.path().join("build"));

        Self { root, store }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }

    pub fn build_root(&self) -> PathBuf {
        self.root.path().join("build")
    }

    /// Working directories left in the build root.
    pub fn working_dirs(&self, format: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.build_root()) else {
            return Vec::new();
        };
        let prefix = format!("{format}-");
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix) && !n.to_string_lossy().ends_with("-config"))
            })
            .collect();
        dirs.sort();
        dirs
    }
}
