//! Materializing the application image inside a working directory.

use crate::bundler::{
    error::{ErrorExt, Result},
    params::{
        ParamStore,
        standard::{
            APP_FS_NAME, APP_RESOURCES_LIST, ICON, MAIN_BINARY, RUNTIME, secondary_launchers,
        },
    },
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Where the pieces of an application image go.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayout {
    /// Root of the installed application.
    pub app_root: PathBuf,
    /// Directory holding launchers.
    pub launcher_dir: PathBuf,
    /// Directory holding application resources.
    pub resources_dir: PathBuf,
    /// Directory receiving the bundled runtime.
    pub runtime_dir: PathBuf,
    /// Directory receiving the application icon.
    pub icon_dir: PathBuf,
    /// Suffix appended to launcher names, e.g. `.exe`.
    pub launcher_suffix: &'static str,
}

impl ImageLayout {
    /// `/opt/<fs>` style tree: launcher at the root, `app/` and `runtime/`
    /// beside it.
    pub fn unix(app_root: impl Into<PathBuf>) -> Self {
        let app_root = app_root.into();
        Self {
            launcher_dir: app_root.clone(),
            resources_dir: app_root.join("app"),
            runtime_dir: app_root.join("runtime"),
            icon_dir: app_root.clone(),
            app_root,
            launcher_suffix: "",
        }
    }

    /// `<Name>.app/Contents` tree.
    pub fn macos(app_bundle: impl Into<PathBuf>) -> Self {
        let app_root = app_bundle.into();
        let contents = app_root.join("Contents");
        Self {
            launcher_dir: contents.join("MacOS"),
            resources_dir: contents.join("Resources").join("app"),
            runtime_dir: contents.join("runtime"),
            icon_dir: contents.join("Resources"),
            app_root,
            launcher_suffix: "",
        }
    }

    /// Program Files style tree with `.exe` launchers.
    pub fn windows(app_root: impl Into<PathBuf>) -> Self {
        Self {
            launcher_suffix: ".exe",
            ..Self::unix(app_root)
        }
    }
}

/// What staging produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedImage {
    /// Launchers, primary first.
    pub launchers: Vec<PathBuf>,
    /// Resource files, relative to the resources directory.
    pub resources: Vec<PathBuf>,
    /// Bundled runtime, if any.
    pub runtime: Option<PathBuf>,
    /// Staged icon, if any.
    pub icon: Option<PathBuf>,
}

/// Copies launchers, resources, runtime and icon into `layout`.
pub async fn stage_app_image(store: &ParamStore, layout: &ImageLayout) -> Result<StagedImage> {
    let fs_name = APP_FS_NAME.require(store)?;
    let mut staged = StagedImage::default();

    tokio::fs::create_dir_all(&layout.app_root)
        .await
        .fs_context("creating application image", &layout.app_root)?;

    let main_binary = MAIN_BINARY.require(store)?;
    staged
        .launchers
        .push(stage_launcher(&main_binary, &fs_name, layout).await?);

    for launcher in secondary_launchers(store)? {
        let binary = MAIN_BINARY.value_or(&launcher, main_binary.clone())?;
        let name = APP_FS_NAME.require(&launcher)?;
        staged
            .launchers
            .push(stage_launcher(&binary, &name, layout).await?);
    }

    for set in APP_RESOURCES_LIST.value_or(store, Vec::new())? {
        for rel in set.included_files()? {
            fs::copy_file(&set.base.join(&rel), &layout.resources_dir.join(&rel)).await?;
            staged.resources.push(rel);
        }
    }
    log::debug!("Staged {} resource files", staged.resources.len());

    match RUNTIME.fetch_from(store)? {
        Some(runtime) if runtime.is_dir() => {
            fs::copy_dir(&runtime, &layout.runtime_dir).await?;
            staged.runtime = Some(layout.runtime_dir.clone());
        }
        Some(runtime) => {
            log::debug!("No runtime at {}, skipping", runtime.display());
        }
        None => log::debug!("Runtime bundling disabled"),
    }

    if let Some(icon) = ICON.fetch_from(store)? {
        let extension = icon
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());
        let target = layout.icon_dir.join(format!("{fs_name}.{extension}"));
        fs::copy_file(&icon, &target).await?;
        staged.icon = Some(target);
    }

    Ok(staged)
}

async fn stage_launcher(binary: &Path, name: &str, layout: &ImageLayout) -> Result<PathBuf> {
    let target = layout
        .launcher_dir
        .join(format!("{name}{}", layout.launcher_suffix));
    fs::copy_file(binary, &target).await?;
    fs::set_executable(&target).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::standard::ResourceSet;

    #[tokio::test]
    async fn stages_launchers_resources_and_runtime() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("hello"), "#!/bin/sh\n").unwrap();
        std::fs::write(src.path().join("LICENSE"), "MIT").unwrap();
        std::fs::create_dir_all(src.path().join("runtime/lib")).unwrap();
        std::fs::write(src.path().join("runtime/lib/libjvm.so"), "").unwrap();

        let mut helper = ParamStore::new();
        helper.insert("appName", "Hello Helper");

        let mut store = ParamStore::new();
        store.insert("appName", "Hello");
        store.insert("srcdir", src.path().to_path_buf());
        store.insert("mainBinary", src.path().join("hello"));
        store.insert(
            "appResourcesList",
            vec![ResourceSet {
                base: src.path().to_path_buf(),
                files: vec!["LICENSE".into()],
            }],
        );
        store.insert("secondaryLaunchers", vec![helper]);

        let image = tempfile::tempdir().unwrap();
        let layout = ImageLayout::unix(image.path().join("Hello"));
        let staged = stage_app_image(&store, &layout).await.unwrap();

        assert_eq!(
            staged.launchers,
            vec![
                image.path().join("Hello/Hello"),
                image.path().join("Hello/HelloHelper")
            ]
        );
        assert_eq!(staged.resources, vec![PathBuf::from("LICENSE")]);
        assert!(image.path().join("Hello/app/LICENSE").is_file());
        assert!(image.path().join("Hello/runtime/lib/libjvm.so").is_file());
    }

    #[tokio::test]
    async fn explicit_null_runtime_is_not_bundled() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("tool"), "bin").unwrap();
        std::fs::create_dir_all(src.path().join("runtime")).unwrap();

        let mut store = ParamStore::new();
        store.insert("appName", "Tool");
        store.insert("srcdir", src.path().to_path_buf());
        store.insert("mainBinary", src.path().join("tool"));
        store.insert("appResourcesList", Vec::<ResourceSet>::new());
        store.insert_null("runtime");

        let image = tempfile::tempdir().unwrap();
        let layout = ImageLayout::windows(image.path().join("Tool"));
        let staged = stage_app_image(&store, &layout).await.unwrap();

        assert_eq!(staged.runtime, None);
        assert_eq!(staged.launchers, vec![image.path().join("Tool/Tool.exe")]);
        assert!(!image.path().join("Tool/runtime").exists());
    }
}
