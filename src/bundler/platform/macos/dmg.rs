//! macOS disk image bundler.
//!
//! Stages `<appName>.app` next to an `Applications` symlink and compresses
//! the folder into a drag-to-install `.dmg` with `hdiutil`.

use crate::bundler::{
    contract::{BundleType, Bundler, BundlerContext},
    error::{Error, ErrorExt, Result},
    params::{
        ParamDescriptor, ParamStore,
        standard::{
            APP_FS_NAME, APP_NAME, COPYRIGHT, ICON, IDENTIFIER, LICENSE_FILE, MAC_CATEGORY,
            MAIN_BINARY, SERVICE_HINT, VERSION,
        },
    },
    pipeline::{
        ImageLayout, ReplacementData, Stage, StagedImage, Template, ToolCommand, WorkDir,
        ensure_shortcut, newest_artifact, prepare_output_dir, reject_service_hint,
        replacement::xml_escape, stage, stage_app_image, toolchain::execute,
        validate_app_image, validate_license_files, validate_parameters,
    },
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const INFO_PLIST: Template = Template {
    description: "Bundle config file",
    builtin: include_str!("../../../../templates/macos/Info.plist"),
    tokens: &[
        "APPLICATION_LAUNCHER_FILENAME",
        "APPLICATION_ICON_FILE",
        "APPLICATION_IDENTIFIER",
        "APPLICATION_NAME",
        "APPLICATION_VERSION",
        "APPLICATION_CATEGORY",
        "APPLICATION_COPYRIGHT",
    ],
};

/// Builds `.dmg` disk images with `hdiutil`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DmgBundler;

impl DmgBundler {
    async fn run_stages(
        &self,
        workdir: &mut WorkDir,
        store: &ParamStore,
        output_dir: &Path,
        ctx: &BundlerContext,
    ) -> Result<PathBuf> {
        let app_name = APP_NAME.require(store)?;
        let fs_name = APP_FS_NAME.require(store)?;
        let version = VERSION.require(store)?;

        let volume_root = workdir.path().join("dmg-root");
        let layout = ImageLayout::macos(volume_root.join(format!("{app_name}.app")));

        let staged = stage("dmg", Stage::Staging, store, ctx, stage_app_image(store, &layout)).await?;
        stage(
            "dmg",
            Stage::Rendering,
            store,
            ctx,
            render(workdir, store, &layout, &staged),
        )
        .await?;
        link_applications(&volume_root)?;

        let dmg = output_dir.join(format!("{fs_name}-{version}.dmg"));
        let command = ToolCommand::new("hdiutil")
            .arg("create")
            .arg("-volname")
            .arg(&app_name)
            .arg("-srcfolder")
            .arg(&volume_root)
            .arg("-ov")
            .arg("-format")
            .arg("UDZO")
            .arg(&dmg);
        stage("dmg", Stage::Invoking, store, ctx, execute(ctx, store, &command)).await?;

        let artifact = newest_artifact(output_dir, self.artifact_extension()).await?;
        log::info!("Disk image (.dmg) saved to: {}", artifact.display());
        Ok(artifact)
    }
}

async fn render(
    workdir: &mut WorkDir,
    store: &ParamStore,
    layout: &ImageLayout,
    staged: &StagedImage,
) -> Result<()> {
    let icon_file = staged
        .icon
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut data = ReplacementData::new();
    data.insert(
        "APPLICATION_LAUNCHER_FILENAME",
        xml_escape(&APP_FS_NAME.require(store)?),
    )
    .insert("APPLICATION_ICON_FILE", xml_escape(&icon_file))
    .insert("APPLICATION_IDENTIFIER", xml_escape(&IDENTIFIER.require(store)?))
    .insert("APPLICATION_NAME", xml_escape(&APP_NAME.require(store)?))
    .insert("APPLICATION_VERSION", xml_escape(&VERSION.require(store)?))
    .insert("APPLICATION_CATEGORY", xml_escape(&MAC_CATEGORY.require(store)?))
    .insert("APPLICATION_COPYRIGHT", xml_escape(&COPYRIGHT.require(store)?));

    let contents = layout.app_root.join("Contents");
    INFO_PLIST
        .render_to(workdir, store, &contents.join("Info.plist"), &data)
        .await?;

    let pkg_info = contents.join("PkgInfo");
    tokio::fs::write(&pkg_info, "APPL????")
        .await
        .fs_context("writing", &pkg_info)?;
    Ok(())
}

/// Adds the `Applications` drop target next to the app bundle.
#[cfg(unix)]
fn link_applications(volume_root: &Path) -> Result<()> {
    let link = volume_root.join("Applications");
    std::os::unix::fs::symlink("/Applications", &link).fs_context("creating Applications symlink", &link)
}

#[cfg(not(unix))]
fn link_applications(_volume_root: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl Bundler for DmgBundler {
    fn id(&self) -> &'static str {
        "dmg"
    }

    fn name(&self) -> &'static str {
        "Mac DMG Installer"
    }

    fn description(&self) -> &'static str {
        "Mac DMG Installer Bundle."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn artifact_extension(&self) -> &'static str {
        "dmg"
    }

    fn parameters(&self) -> Vec<&'static dyn ParamDescriptor> {
        vec![
            &APP_NAME,
            &APP_FS_NAME,
            &MAIN_BINARY,
            &IDENTIFIER,
            &VERSION,
            &COPYRIGHT,
            &*MAC_CATEGORY,
            &LICENSE_FILE,
            &ICON,
            &SERVICE_HINT,
        ]
    }

    fn supported_on_host(&self) -> bool {
        cfg!(target_os = "macos")
    }

    async fn validate(&self, store: &ParamStore, ctx: &BundlerContext) -> Result<()> {
        validate_app_image(store)?;
        validate_license_files(store)?;
        reject_service_hint(store, self.id())?;
        validate_parameters(
            store,
            &self.parameters(),
            &[&APP_FS_NAME, &VERSION, &COPYRIGHT, &IDENTIFIER, MAC_CATEGORY.info()],
        )?;
        if !self.supported_on_host() {
            return Err(Error::unsupported(
                "Disk images can only be built on macOS.",
                "Run the dmg bundler on a macOS host.",
            ));
        }
        if ctx.toolchain().locate("hdiutil").is_none() {
            return Err(Error::unsupported(
                "Can not find hdiutil.",
                "hdiutil ships with macOS; make sure /usr/bin is on the PATH.",
            ));
        }
        Ok(())
    }

    async fn bundle(
        &self,
        store: &mut ParamStore,
        output_dir: &Path,
        ctx: &BundlerContext,
    ) -> Result<PathBuf> {
        let output_dir = prepare_output_dir(output_dir).await?;
        ensure_shortcut(store, ctx)?;

        let mut workdir = WorkDir::create(store, self.id()).await?;
        let result = self.run_stages(&mut workdir, store, &output_dir, ctx).await;
        workdir.release(store, ctx).await;
        result
    }
}
