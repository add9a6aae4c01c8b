//! Red Hat package bundler.
//!
//! Stages the application under `image/<appFsName>`, renders a spec file
//! next to it and lets `rpmbuild -bb` copy the tree to `/opt/<appFsName>`.

use super::{install_root, replacement_data, validate_common, write_desktop_integration, write_init_script};
use crate::bundler::{
    contract::{BundleType, Bundler, BundlerContext},
    error::Result,
    params::{
        ParamDescriptor, ParamStore,
        standard::{
            APP_FS_NAME, APP_NAME, CATEGORY, DESCRIPTION, FILE_ASSOCIATIONS, ICON, LICENSE_FILE,
            LICENSE_TYPE, LINUX_CATEGORY, MAIN_BINARY, MENU_HINT, RPM_BUNDLE_NAME, RUN_AT_STARTUP,
            SECONDARY_LAUNCHERS, SERVICE_HINT, SHORTCUT_HINT, START_ON_INSTALL, STOP_ON_UNINSTALL,
            SYSTEM_WIDE, TITLE, VENDOR, VERSION, XDG_FILE_PREFIX, check_rpm_bundle_name,
        },
    },
    pipeline::{
        ImageLayout, Stage, Template, ToolCommand, ToolRequirement, WorkDir,
        ensure_shortcut, newest_artifact, prepare_output_dir, stage, stage_app_image,
        toolchain::execute,
    },
};
use async_trait::async_trait;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static RPMBUILD: ToolRequirement = ToolRequirement {
    program: "rpmbuild",
    version_args: &["--version"],
    version_pattern: LazyLock::new(|| Regex::new(r" (\d+\.\d+)").expect("valid regex")),
    minimum: (4, 0),
    install_hint: "Install packages needed to build RPM, version 4.0 or newer.",
};

const SPEC_FILE: Template = Template {
    description: "RPM spec file",
    builtin: include_str!("../../../../templates/rpm/template.spec"),
    tokens: &[
        "APPLICATION_SUMMARY",
        "APPLICATION_PACKAGE",
        "APPLICATION_VERSION",
        "APPLICATION_LICENSE_TYPE",
        "APPLICATION_VENDOR",
        "DEPLOY_BUNDLE_CATEGORY",
        "APPLICATION_DESCRIPTION",
        "APPLICATION_FS_NAME",
        "APPLICATION_LICENSE_FILE",
        "INSTALL_ROOT",
        "DESKTOP_INSTALL",
        "DESKTOP_REMOVE",
        "SECONDARY_LAUNCHERS_INSTALL",
        "SECONDARY_LAUNCHERS_REMOVE",
        "FILE_ASSOCIATION_INSTALL",
        "FILE_ASSOCIATION_REMOVE",
        "SERVICE_HINT",
        "START_ON_INSTALL",
        "STOP_ON_UNINSTALL",
        "RUN_AT_STARTUP",
    ],
};

/// Builds `.rpm` packages with `rpmbuild`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpmBundler;

impl RpmBundler {
    async fn run_stages(
        &self,
        workdir: &mut WorkDir,
        store: &ParamStore,
        output_dir: &Path,
        ctx: &BundlerContext,
    ) -> Result<PathBuf> {
        let fs_name = APP_FS_NAME.require(store)?;
        let package = RPM_BUNDLE_NAME.require(store)?;
        let image_dir = workdir.path().join("image");
        let layout = ImageLayout::unix(image_dir.join(&fs_name));

        stage("rpm", Stage::Staging, store, ctx, stage_app_image(store, &layout)).await?;

        let spec = stage(
            "rpm",
            Stage::Rendering,
            store,
            ctx,
            render(workdir, store, &layout, &image_dir, &package),
        )
        .await?;

        let command = ToolCommand::new(RPMBUILD.program)
            .arg("-bb")
            .arg(&spec)
            .arg("--define")
            .arg(format!("%_sourcedir {}", image_dir.display()))
            .arg("--define")
            .arg(format!("%_rpmdir {}", output_dir.display()))
            .arg("--define")
            .arg(format!(
                "%_topdir {}",
                workdir.path().join("rpmbuildroot").display()
            ))
            .arg("--define")
            .arg("_build_name_fmt %%{NAME}-%%{VERSION}-%%{RELEASE}.%%{ARCH}.rpm")
            .current_dir(&image_dir);

        ctx.verbose(
            store,
            format!("Generating RPM for installer to: {}", output_dir.display()),
        );
        stage("rpm", Stage::Invoking, store, ctx, execute(ctx, store, &command)).await?;

        let artifact = newest_artifact(output_dir, self.artifact_extension()).await?;
        log::info!("Package (.rpm) saved to: {}", artifact.display());
        Ok(artifact)
    }
}

async fn render(
    workdir: &mut WorkDir,
    store: &ParamStore,
    layout: &ImageLayout,
    image_dir: &Path,
    package: &str,
) -> Result<PathBuf> {
    let fs_name = APP_FS_NAME.require(store)?;
    let mut data = replacement_data(store, package)?;
    data.insert_joined(
        "APPLICATION_LICENSE_FILE",
        license_docs(store)?,
        "\n",
    );

    write_desktop_integration(workdir, store, &mut data, &layout.app_root).await?;

    if SERVICE_HINT.value_or(store, false)? {
        write_init_script(
            workdir,
            store,
            &data,
            &layout.app_root.join(format!("{package}.init")),
        )
        .await?;
    }

    SPEC_FILE
        .render_to(workdir, store, &image_dir.join(format!("{fs_name}.spec")), &data)
        .await
}

/// `%doc` lines for every license file, as installed.
fn license_docs(store: &ParamStore) -> Result<Vec<String>> {
    let root = install_root(store)?;
    Ok(LICENSE_FILE
        .value_or(store, Vec::new())?
        .iter()
        .map(|file| format!("%doc {root}/app/{file}"))
        .collect())
}

#[async_trait]
impl Bundler for RpmBundler {
    fn id(&self) -> &'static str {
        "rpm"
    }

    fn name(&self) -> &'static str {
        "Linux RPM Bundler"
    }

    fn description(&self) -> &'static str {
        "Redhat Package Manager (RPM) bundler."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn artifact_extension(&self) -> &'static str {
        "rpm"
    }

    fn parameters(&self) -> Vec<&'static dyn ParamDescriptor> {
        vec![
            &APP_NAME,
            &APP_FS_NAME,
            &MAIN_BINARY,
            &RPM_BUNDLE_NAME,
            &VERSION,
            &VENDOR,
            &TITLE,
            &DESCRIPTION,
            &CATEGORY,
            &*LINUX_CATEGORY,
            &LICENSE_TYPE,
            &LICENSE_FILE,
            &ICON,
            &XDG_FILE_PREFIX,
            &MENU_HINT,
            &SHORTCUT_HINT,
            &SYSTEM_WIDE,
            &SERVICE_HINT,
            &START_ON_INSTALL,
            &STOP_ON_UNINSTALL,
            &RUN_AT_STARTUP,
            &FILE_ASSOCIATIONS,
            &SECONDARY_LAUNCHERS,
        ]
    }

    fn supported_on_host(&self) -> bool {
        cfg!(target_os = "linux")
    }

    async fn validate(&self, store: &ParamStore, ctx: &BundlerContext) -> Result<()> {
        validate_common(store, &self.parameters(), &[&RPM_BUNDLE_NAME])?;
        check_rpm_bundle_name(&RPM_BUNDLE_NAME.require(store)?)?;
        RPMBUILD.check(ctx.toolchain()).await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::pipeline::ReplacementData;

    #[test]
    fn license_files_become_doc_entries() {
        let mut store = ParamStore::new();
        store.insert("appName", "Hello");
        store.insert("licenseFile", vec!["LICENSE", "docs/NOTICE"]);
        assert_eq!(
            license_docs(&store).unwrap(),
            vec!["%doc /opt/Hello/app/LICENSE", "%doc /opt/Hello/app/docs/NOTICE"]
        );
    }

    #[test]
    fn spec_template_declares_every_token_it_uses() {
        let mut data = ReplacementData::new();
        data.default_empty(SPEC_FILE.tokens);
        assert!(
            SPEC_FILE
                .render("hello.spec", SPEC_FILE.builtin, &data)
                .is_ok()
        );
    }
}
