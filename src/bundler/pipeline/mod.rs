//! The shared bundling lifecycle.
//!
//! Every format moves through the same stages:
//!
//! 1. **Validating** - parameters and toolchain are checked, nothing is written
//! 2. **Staging** - the application image is copied into a [`WorkDir`]
//! 3. **Rendering** - templates are filled from a [`ReplacementData`] map
//! 4. **Invoking** - the native tool runs against the staged tree
//! 5. **Completed** / **Failed** - the artifact is collected, then the working
//!    directory is released in both cases
//!
//! The helpers in this module are free functions shared by the format
//! bundlers rather than a base type they inherit from.

pub mod artifact;
pub mod desktop;
pub mod replacement;
pub mod staging;
pub mod template;
pub mod toolchain;
pub mod workdir;

pub use artifact::newest_artifact;
pub use replacement::ReplacementData;
pub use staging::{ImageLayout, StagedImage, stage_app_image};
pub use template::Template;
pub use toolchain::{SystemToolchain, ToolCommand, ToolOutput, ToolRequirement, Toolchain};
pub use workdir::WorkDir;

use crate::bundler::{
    contract::BundlerContext,
    error::{Context, Error, ErrorExt, Result},
    params::{
        ParamDescriptor, ParamInfo, ParamStore,
        standard::{
            APP_FS_NAME, APP_NAME, APP_RESOURCES_LIST, BUILD_ROOT, DESCRIPTION, LICENSE_FILE,
            MAIN_BINARY, MENU_HINT, SECONDARY_LAUNCHERS, SERVICE_HINT, SHORTCUT_HINT,
            SYSTEM_WIDE, TITLE, launcher_scope,
        },
    },
};
use path_absolutize::Absolutize;
use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
};

/// Lifecycle stages, used to label errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Staging,
    Rendering,
    Invoking,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Staging => "staging",
            Stage::Rendering => "rendering",
            Stage::Invoking => "invoking",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs one stage, labelling its error with the format and stage name.
pub async fn stage<T>(
    format: &str,
    stage: Stage,
    store: &ParamStore,
    ctx: &BundlerContext,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    ctx.verbose(store, format!("[{format}] {stage}"));
    work.await.with_context(|| format!("{format} {stage}"))
}

/// Checks the application image inputs every format needs.
pub fn validate_app_image(store: &ParamStore) -> Result<()> {
    APP_NAME.require(store)?;

    let binary = MAIN_BINARY.require(store)?;
    if !binary.is_file() {
        return Err(Error::config(
            format!("Main binary {} does not exist.", binary.display()),
            "Set the \"mainBinary\" parameter to the application executable.",
        ));
    }
    Ok(())
}

/// Resolves every declared parameter, then requires the text values the
/// templates cannot render without.
///
/// Unknown labels, unparseable text and explicitly nulled required values
/// fail here, before a working directory exists.
pub fn validate_parameters(
    store: &ParamStore,
    declared: &[&'static dyn ParamDescriptor],
    required: &[&ParamInfo<String>],
) -> Result<()> {
    for descriptor in declared {
        descriptor.check(store)?;
    }
    for descriptor in required {
        descriptor.require(store)?;
    }
    BUILD_ROOT.require(store)?;
    Ok(())
}

/// Checks that each secondary launcher names itself, points at an existing
/// binary and installs under a file name nothing else in the package uses.
pub fn validate_secondary_launchers(store: &ParamStore) -> Result<()> {
    let mut taken = vec![APP_FS_NAME.require(store)?];
    let launchers = SECONDARY_LAUNCHERS.value_or(store, Vec::new())?;
    for (index, launcher) in launchers.iter().enumerate() {
        let Some(name) = APP_NAME
            .fetch_from(launcher)?
            .filter(|name| !name.trim().is_empty())
        else {
            return Err(Error::config(
                format!("Secondary launcher #{} has no name.", index + 1),
                "Set \"appName\" in every entry of \"secondaryLaunchers\".",
            ));
        };

        let scoped = launcher_scope(store, launcher);
        let fs_name = APP_FS_NAME.require(&scoped)?;
        if taken.iter().any(|t| t.eq_ignore_ascii_case(&fs_name)) {
            return Err(Error::config(
                format!(
                    "Secondary launcher \"{name}\" installs as \"{fs_name}\", which is already taken."
                ),
                "Give each launcher a distinct \"appName\" or \"linux.appFsName\".",
            ));
        }
        TITLE.require(&scoped)?;
        DESCRIPTION.require(&scoped)?;

        let binary = MAIN_BINARY.require(&scoped)?;
        if !binary.is_file() {
            return Err(Error::config(
                format!("Launcher binary {} does not exist.", binary.display()),
                format!("Set \"mainBinary\" for the \"{name}\" launcher to an executable."),
            ));
        }
        taken.push(fs_name);
    }
    Ok(())
}

/// Checks that every license file is one of the application resources.
pub fn validate_license_files(store: &ParamStore) -> Result<()> {
    let licenses = LICENSE_FILE.value_or(store, Vec::new())?;
    if licenses.is_empty() {
        return Ok(());
    }

    let mut included = Vec::new();
    for set in APP_RESOURCES_LIST.value_or(store, Vec::new())? {
        included.extend(set.included_files()?);
    }

    for license in &licenses {
        let relative = Path::new(license);
        if relative.is_absolute() || !included.iter().any(|f| f == relative) {
            return Err(Error::config(
                "Specified license file is missing.",
                format!(
                    "Make sure that \"{license}\" references a file in the app resources, \
                     and that it is relative file reference."
                ),
            ));
        }
    }
    Ok(())
}

/// The first configured license file that exists in the application
/// resources.
pub fn first_license_file(store: &ParamStore) -> Result<Option<PathBuf>> {
    let sets = APP_RESOURCES_LIST.value_or(store, Vec::new())?;
    for license in LICENSE_FILE.value_or(store, Vec::new())? {
        if let Some(path) = sets
            .iter()
            .map(|set| set.base.join(&license))
            .find(|p| p.is_file())
        {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Rejects service installs for a single user. Unset `systemWide` counts
/// as system wide.
pub fn validate_service_install(store: &ParamStore) -> Result<()> {
    let system_wide = SYSTEM_WIDE.value_or(store, true)?;
    let service_hint = SERVICE_HINT.value_or(store, false)?;
    if service_hint && !system_wide {
        return Err(Error::config(
            "Bundler doesn't support per-user daemons.",
            "Make sure that the system wide hint is set to true.",
        ));
    }
    Ok(())
}

/// Rejects the service hint for formats that cannot install services.
pub fn reject_service_hint(store: &ParamStore, format: &str) -> Result<()> {
    if SERVICE_HINT.value_or(store, false)? {
        return Err(Error::config(
            format!("The {format} bundler cannot install services."),
            "Unset the \"serviceHint\" parameter or choose a Linux package format.",
        ));
    }
    Ok(())
}

/// Makes sure the user can find the application: with neither a menu entry
/// nor a desktop shortcut requested, the menu entry is turned back on.
pub fn ensure_shortcut(store: &mut ParamStore, ctx: &BundlerContext) -> Result<()> {
    let menu = MENU_HINT.value_or(store, true)?;
    let shortcut = SHORTCUT_HINT.value_or(store, false)?;
    if !menu && !shortcut {
        ctx.verbose(
            store,
            "At least one type of shortcut is required. Enabling menu shortcut.",
        );
        store.insert(MENU_HINT.id(), true);
    }
    Ok(())
}

/// Fails unless `dir` is an existing, writable directory, creating it when
/// missing. Returns the absolute path handed to native tools.
pub async fn prepare_output_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        tokio::fs::create_dir_all(dir).await.map_err(|_| {
            Error::config(
                format!("Output directory {} cannot be created.", dir.display()),
                "Choose an output directory you can write to.",
            )
        })?;
    }
    let readonly = tokio::fs::metadata(dir)
        .await
        .map(|m| m.permissions().readonly())
        .unwrap_or(true);
    if readonly {
        return Err(Error::config(
            format!("Output directory {} is not writable.", dir.display()),
            "Choose an output directory you can write to.",
        ));
    }
    Ok(dir
        .absolutize()
        .fs_context("resolving output directory", dir)?
        .into_owned())
}
