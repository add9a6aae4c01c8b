//! Debian package bundler.
//!
//! The package tree is staged directly: `opt/<appFsName>` for the
//! application, `DEBIAN/` for control data and maintainer scripts,
//! `etc/init.d` for the optional service. `dpkg-deb` archives it as is.

use super::{replacement_data, validate_common, write_desktop_integration, write_init_script};
use crate::bundler::{
    contract::{BundleType, Bundler, BundlerContext},
    error::{Error, ErrorExt, Result},
    params::{
        ParamDescriptor, ParamStore,
        standard::{
            APP_FS_NAME, APP_NAME, CATEGORY, COPYRIGHT, DEB_ARCH,
            DEB_BUNDLE_NAME, DESCRIPTION, EMAIL, FILE_ASSOCIATIONS, ICON, LICENSE_FILE,
            LICENSE_TYPE, LINUX_CATEGORY, MAIN_BINARY, MENU_HINT, RUN_AT_STARTUP,
            SECONDARY_LAUNCHERS, SERVICE_HINT, SHORTCUT_HINT, START_ON_INSTALL, STOP_ON_UNINSTALL,
            SYSTEM_WIDE, TITLE, VENDOR, VERSION, XDG_FILE_PREFIX, check_deb_bundle_name,
        },
    },
    pipeline::{
        ImageLayout, Stage, Template, ToolCommand, ToolRequirement, WorkDir, ensure_shortcut,
        first_license_file, newest_artifact, prepare_output_dir, stage, stage_app_image,
        toolchain::execute,
    },
    utils::fs,
};
use async_trait::async_trait;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static DPKG_DEB: ToolRequirement = ToolRequirement {
    program: "dpkg-deb",
    version_args: &["--version"],
    version_pattern: LazyLock::new(|| Regex::new(r"version (\d+\.\d+)").expect("valid regex")),
    minimum: (1, 19),
    install_hint: "Install the dpkg package, version 1.19 or newer.",
};

const SCRIPT_TOKENS: &[&str] = &[
    "APPLICATION_PACKAGE",
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
];

const CONTROL: Template = Template {
    description: "DEB control file",
    builtin: include_str!("../../../../templates/deb/control"),
    tokens: &[
        "APPLICATION_PACKAGE",
        "APPLICATION_VERSION",
        "DEPLOY_BUNDLE_CATEGORY",
        "APPLICATION_MAINTAINER",
        "APPLICATION_ARCH",
        "APPLICATION_INSTALLED_SIZE",
        "APPLICATION_SUMMARY",
        "APPLICATION_DESCRIPTION",
    ],
};

const POSTINST: Template = Template {
    description: "DEB postinstall script",
    builtin: include_str!("../../../../templates/deb/postinst"),
    tokens: SCRIPT_TOKENS,
};

const PRERM: Template = Template {
    description: "DEB prerm script",
    builtin: include_str!("../../../../templates/deb/prerm"),
    tokens: SCRIPT_TOKENS,
};

const POSTRM: Template = Template {
    description: "DEB postrm script",
    builtin: include_str!("../../../../templates/deb/postrm"),
    tokens: SCRIPT_TOKENS,
};

const COPYRIGHT_FILE: Template = Template {
    description: "DEB copyright file",
    builtin: include_str!("../../../../templates/deb/copyright"),
    tokens: &[
        "APPLICATION_NAME",
        "APPLICATION_COPYRIGHT",
        "APPLICATION_LICENSE_TYPE",
        "APPLICATION_LICENSE_TEXT",
    ],
};

/// Builds `.deb` packages with `dpkg-deb`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebBundler;

impl DebBundler {
    async fn run_stages(
        &self,
        workdir: &mut WorkDir,
        store: &ParamStore,
        output_dir: &Path,
        ctx: &BundlerContext,
    ) -> Result<PathBuf> {
        let fs_name = APP_FS_NAME.require(store)?;
        let package = DEB_BUNDLE_NAME.require(store)?;
        let version = VERSION.require(store)?;
        let arch = DEB_ARCH.require(store)?;

        let image_dir = workdir.path().join("image");
        let layout = ImageLayout::unix(image_dir.join("opt").join(&fs_name));

        stage("deb", Stage::Staging, store, ctx, stage_app_image(store, &layout)).await?;
        stage(
            "deb",
            Stage::Rendering,
            store,
            ctx,
            render(workdir, store, &layout, &image_dir, &package),
        )
        .await?;

        let package_file = output_dir.join(format!("{package}_{version}_{arch}.deb"));
        let command = ToolCommand::new(DPKG_DEB.program)
            .arg("--root-owner-group")
            .arg("-b")
            .arg(&image_dir)
            .arg(&package_file);
        stage("deb", Stage::Invoking, store, ctx, execute(ctx, store, &command)).await?;

        let artifact = newest_artifact(output_dir, self.artifact_extension()).await?;
        log::info!("Package (.deb) saved to: {}", artifact.display());
        Ok(artifact)
    }
}

async fn render(
    workdir: &mut WorkDir,
    store: &ParamStore,
    layout: &ImageLayout,
    image_dir: &Path,
    package: &str,
) -> Result<()> {
    let mut data = replacement_data(store, package)?;
    write_desktop_integration(workdir, store, &mut data, &layout.app_root).await?;

    if SERVICE_HINT.value_or(store, false)? {
        write_init_script(
            workdir,
            store,
            &data,
            &image_dir.join("etc/init.d").join(package),
        )
        .await?;
    }

    let license_text = match first_license_file(store)? {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading license file", &path)?,
        None => String::new(),
    };
    data.insert(
        "APPLICATION_MAINTAINER",
        format!("{} <{}>", VENDOR.require(store)?, EMAIL.require(store)?),
    )
    .insert("APPLICATION_ARCH", DEB_ARCH.require(store)?)
    .insert("APPLICATION_INSTALLED_SIZE", installed_size_kib(image_dir).await?)
    .insert("APPLICATION_COPYRIGHT", COPYRIGHT.require(store)?)
    .insert("APPLICATION_LICENSE_TEXT", control_paragraph(&license_text))
    .insert(
        "APPLICATION_DESCRIPTION",
        control_paragraph(&DESCRIPTION.require(store)?),
    );

    COPYRIGHT_FILE
        .render_to(
            workdir,
            store,
            &image_dir.join("usr/share/doc").join(package).join("copyright"),
            &data,
        )
        .await?;

    let debian = image_dir.join("DEBIAN");
    CONTROL
        .render_to(workdir, store, &debian.join("control"), &data)
        .await?;
    for (template, name) in [(POSTINST, "postinst"), (PRERM, "prerm"), (POSTRM, "postrm")] {
        let script = template
            .render_to(workdir, store, &debian.join(name), &data)
            .await?;
        fs::set_executable(&script).await?;
    }
    Ok(())
}

/// Formats text as a control-file continuation: every line indented by one
/// space, blank lines written as ` .`.
fn control_paragraph(text: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                " .".to_string()
            } else {
                format!(" {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Size of the staged tree in KiB, rounded up, as `Installed-Size` expects.
async fn installed_size_kib(image_dir: &Path) -> Result<u64> {
    let root = image_dir.to_path_buf();
    let bytes = tokio::task::spawn_blocking(move || {
        walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum::<u64>()
    })
    .await
    .map_err(|e| Error::GenericError(format!("Size calculation task panicked: {e}")))?;
    Ok(bytes.div_ceil(1024))
}

#[async_trait]
impl Bundler for DebBundler {
    fn id(&self) -> &'static str {
        "deb"
    }

    fn name(&self) -> &'static str {
        "Linux Debian Bundler"
    }

    fn description(&self) -> &'static str {
        "Debian packages (.deb) for Debian and Ubuntu based systems."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn artifact_extension(&self) -> &'static str {
        "deb"
    }

    fn parameters(&self) -> Vec<&'static dyn ParamDescriptor> {
        vec![
            &APP_NAME,
            &APP_FS_NAME,
            &MAIN_BINARY,
            &DEB_BUNDLE_NAME,
            &DEB_ARCH,
            &VERSION,
            &VENDOR,
            &EMAIL,
            &TITLE,
            &DESCRIPTION,
            &CATEGORY,
            &*LINUX_CATEGORY,
            &COPYRIGHT,
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
        validate_common(
            store,
            &self.parameters(),
            &[&DEB_BUNDLE_NAME, &DEB_ARCH, &COPYRIGHT, &EMAIL],
        )?;
        check_deb_bundle_name(&DEB_BUNDLE_NAME.require(store)?)?;
        DPKG_DEB.check(ctx.toolchain()).await?;
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
    fn control_paragraphs_are_indented() {
        assert_eq!(
            control_paragraph("First line\n\nSecond line\n"),
            " First line\n .\n Second line"
        );
        assert_eq!(control_paragraph(""), "");
    }

    #[tokio::test]
    async fn installed_size_rounds_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), vec![0u8; 1500]).unwrap();
        assert_eq!(installed_size_kib(dir.path()).await.unwrap(), 2);
    }

    #[test]
    fn maintainer_scripts_render_with_shared_tokens() {
        let mut data = ReplacementData::new();
        data.default_empty(SCRIPT_TOKENS);
        data.insert("SERVICE_HINT", true)
            .insert("APPLICATION_PACKAGE", "hello");
        for template in [POSTINST, PRERM, POSTRM] {
            let out = template
                .render("script", template.builtin, &data)
                .unwrap();
            assert!(out.starts_with("#!/bin/sh"));
        }
        let out = POSTRM.render("postrm", POSTRM.builtin, &data).unwrap();
        assert!(out.contains("update-rc.d hello remove"));
    }

    #[test]
    fn bundle_name_grammar_is_debian() {
        let mut store = ParamStore::new();
        store.insert("appName", "Hello World");
        let name = DEB_BUNDLE_NAME.require(&store).unwrap();
        assert_eq!(name, "hello-world");
        assert!(check_deb_bundle_name(&name).is_ok());
    }
}
