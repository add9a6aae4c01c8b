//! Windows setup executable bundler.
//!
//! Renders an NSIS script with the Modern UI wizard and compiles it with
//! `makensis`, which is available on Windows as well as Linux and macOS.

use crate::bundler::{
    contract::{BundleType, Bundler, BundlerContext},
    error::{Error, Result},
    params::{
        ParamDescriptor, ParamStore,
        standard::{
            APP_FS_NAME, APP_NAME, COPYRIGHT, DESCRIPTION, FILE_ASSOCIATIONS, ICON, IDENTIFIER,
            LICENSE_FILE, MAIN_BINARY, MENU_HINT, SECONDARY_LAUNCHERS, SERVICE_HINT,
            SHORTCUT_HINT, SYSTEM_WIDE, VENDOR, VERSION, WIN_INSTALL_MODE, file_associations,
            secondary_launchers,
        },
    },
    pipeline::{
        ImageLayout, ReplacementData, Stage, Template, ToolCommand, ToolRequirement, WorkDir,
        ensure_shortcut, first_license_file, newest_artifact, prepare_output_dir,
        reject_service_hint, stage, stage_app_image, toolchain::execute, validate_app_image,
        validate_license_files, validate_parameters, validate_secondary_launchers,
    },
    utils::fs,
};
use async_trait::async_trait;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static MAKENSIS: ToolRequirement = ToolRequirement {
    program: "makensis",
    version_args: &["-VERSION"],
    version_pattern: LazyLock::new(|| Regex::new(r"v?(\d+\.\d+)").expect("valid regex")),
    minimum: (3, 0),
    install_hint: "Install NSIS 3.0 or newer and make sure makensis is on the PATH.",
};

const INSTALLER_SCRIPT: Template = Template {
    description: "NSIS installer script",
    builtin: include_str!("../../../../templates/windows/installer.nsi"),
    tokens: &[
        "PRODUCT_NAME",
        "INSTALL_DIR",
        "EXECUTION_LEVEL",
        "SHELL_CONTEXT",
        "VERSION",
        "VERSION_NSIS",
        "PUBLISHER",
        "DESCRIPTION",
        "COPYRIGHT",
        "UNINSTALL_KEY",
        "LICENSE_PAGE",
        "SOURCE_DIR",
        "SHORTCUT_INSTALL",
        "SHORTCUT_REMOVE",
        "FILE_ASSOCIATION_INSTALL",
        "FILE_ASSOCIATION_REMOVE",
    ],
};

/// Builds `-setup.exe` installers with `makensis`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NsisBundler;

impl NsisBundler {
    async fn run_stages(
        &self,
        workdir: &mut WorkDir,
        store: &ParamStore,
        output_dir: &Path,
        ctx: &BundlerContext,
    ) -> Result<PathBuf> {
        let fs_name = APP_FS_NAME.require(store)?;
        let version = VERSION.require(store)?;
        let arch = map_arch(std::env::consts::ARCH)?;

        let layout = ImageLayout::windows(workdir.path().join("image").join(&fs_name));
        stage("exe", Stage::Staging, store, ctx, stage_app_image(store, &layout)).await?;

        let script = stage(
            "exe",
            Stage::Rendering,
            store,
            ctx,
            render(workdir, store, &layout),
        )
        .await?;

        let installer = output_dir.join(format!("{fs_name}_{version}_{arch}-setup.exe"));
        let command = ToolCommand::new(MAKENSIS.program)
            .args(["-V3", "-INPUTCHARSET", "UTF8", "-OUTPUTCHARSET", "UTF8"])
            .arg(format!("-DOUTPUT_FILE={}", installer.display()))
            .arg(&script);
        stage("exe", Stage::Invoking, store, ctx, execute(ctx, store, &command)).await?;

        let artifact = newest_artifact(output_dir, self.artifact_extension()).await?;
        log::info!("Installer (.exe) saved to: {}", artifact.display());
        Ok(artifact)
    }
}

async fn render(workdir: &mut WorkDir, store: &ParamStore, layout: &ImageLayout) -> Result<PathBuf> {
    let name = APP_NAME.require(store)?;
    let fs_name = APP_FS_NAME.require(store)?;
    let identifier = IDENTIFIER.require(store)?;
    let version = VERSION.require(store)?;

    let (install_dir, execution_level, shell_context) =
        match WIN_INSTALL_MODE.require(store)?.as_str() {
            "currentUser" => (
                format!("$LOCALAPPDATA\\Programs\\{}", nsis_escape(&name)),
                "user",
                "current",
            ),
            "both" => (
                format!("$PROGRAMFILES64\\{}", nsis_escape(&name)),
                "highest",
                "all",
            ),
            _ => (
                format!("$PROGRAMFILES64\\{}", nsis_escape(&name)),
                "admin",
                "all",
            ),
        };

    let license_page = match first_license_file(store)? {
        Some(license) => format!(
            "!insertmacro MUI_PAGE_LICENSE \"{}\"\n",
            nsis_escape(&license.display().to_string())
        ),
        None => String::new(),
    };

    let (shortcut_install, shortcut_remove) = shortcut_scripts(store, &name, &fs_name)?;
    let (association_install, association_remove) =
        association_scripts(store, &identifier, &fs_name)?;

    let mut data = ReplacementData::new();
    data.insert("PRODUCT_NAME", nsis_escape(&name))
        .insert("INSTALL_DIR", install_dir)
        .insert("EXECUTION_LEVEL", execution_level)
        .insert("SHELL_CONTEXT", shell_context)
        .insert("VERSION", nsis_escape(&version))
        .insert("VERSION_NSIS", format_version_for_nsis(&version))
        .insert("PUBLISHER", nsis_escape(&VENDOR.require(store)?))
        .insert("DESCRIPTION", nsis_escape(&DESCRIPTION.require(store)?))
        .insert("COPYRIGHT", nsis_escape(&COPYRIGHT.require(store)?))
        .insert(
            "UNINSTALL_KEY",
            format!("Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\{identifier}"),
        )
        .insert("LICENSE_PAGE", license_page)
        .insert("SOURCE_DIR", layout.app_root.display())
        .insert("SHORTCUT_INSTALL", shortcut_install)
        .insert("SHORTCUT_REMOVE", shortcut_remove)
        .insert("FILE_ASSOCIATION_INSTALL", association_install)
        .insert("FILE_ASSOCIATION_REMOVE", association_remove);

    let file_name = "installer.nsi";
    let text = INSTALLER_SCRIPT.load(store, file_name).await?;
    let rendered = INSTALLER_SCRIPT.render(file_name, &text, &data)?;

    // makensis only detects UTF-8 input with a byte order mark.
    let script = workdir.path().join(file_name);
    fs::write_utf8_bom(&script, &rendered).await?;
    workdir.record_config(&script);
    Ok(script)
}

/// Start menu entries (primary and secondary launchers) and the desktop
/// shortcut, per the menu and shortcut hints.
fn shortcut_scripts(store: &ParamStore, name: &str, fs_name: &str) -> Result<(String, String)> {
    let mut install = String::new();
    let mut remove = String::new();
    let folder = format!("$SMPROGRAMS\\{}", nsis_escape(name));

    if MENU_HINT.value_or(store, true)? {
        install.push_str(&format!("    CreateDirectory \"{folder}\"\n"));
        let mut entries = vec![(name.to_string(), fs_name.to_string())];
        for launcher in secondary_launchers(store)? {
            entries.push((APP_NAME.require(&launcher)?, APP_FS_NAME.require(&launcher)?));
        }
        for (label, exe) in entries {
            let link = format!("{folder}\\{}.lnk", nsis_escape(&label));
            install.push_str(&format!(
                "    CreateShortcut \"{link}\" \"$INSTDIR\\{exe}.exe\"\n"
            ));
            remove.push_str(&format!("    Delete \"{link}\"\n"));
        }
        remove.push_str(&format!("    RMDir \"{folder}\"\n"));
    }

    if SHORTCUT_HINT.value_or(store, false)? {
        let link = format!("$DESKTOP\\{}.lnk", nsis_escape(name));
        install.push_str(&format!(
            "    CreateShortcut \"{link}\" \"$INSTDIR\\{fs_name}.exe\"\n"
        ));
        remove.push_str(&format!("    Delete \"{link}\"\n"));
    }
    Ok((install, remove))
}

/// Registry entries mapping each associated extension to the launcher.
fn association_scripts(
    store: &ParamStore,
    identifier: &str,
    fs_name: &str,
) -> Result<(String, String)> {
    let mut install = String::new();
    let mut remove = String::new();
    for assoc in file_associations(store)? {
        for ext in &assoc.extensions {
            let prog_id = format!("{identifier}.{ext}");
            let ext_key = format!("Software\\Classes\\.{ext}");
            let prog_key = format!("Software\\Classes\\{prog_id}");
            install.push_str(&format!("    WriteRegStr SHCTX \"{ext_key}\" \"\" \"{prog_id}\"\n"));
            if let Some(mime) = assoc.content_types.first() {
                install.push_str(&format!(
                    "    WriteRegStr SHCTX \"{ext_key}\" \"Content Type\" \"{mime}\"\n"
                ));
            }
            install.push_str(&format!(
                "    WriteRegStr SHCTX \"{prog_key}\" \"\" \"{}\"\n",
                nsis_escape(&assoc.description)
            ));
            install.push_str(&format!(
                "    WriteRegStr SHCTX \"{prog_key}\\shell\\open\\command\" \"\" '\"$INSTDIR\\{fs_name}.exe\" \"%1\"'\n"
            ));
            remove.push_str(&format!("    DeleteRegKey SHCTX \"{ext_key}\"\n"));
            remove.push_str(&format!("    DeleteRegKey SHCTX \"{prog_key}\"\n"));
        }
    }
    Ok((install, remove))
}

/// Escapes text for a double-quoted NSIS string.
fn nsis_escape(text: &str) -> String {
    text.replace('$', "$$").replace('"', "$\\\"")
}

/// Maps the host architecture to the NSIS naming.
fn map_arch(arch: &str) -> Result<&'static str> {
    match arch {
        "x86_64" => Ok("x64"),
        "x86" => Ok("x86"),
        "aarch64" => Ok("arm64"),
        other => Err(Error::unsupported(
            format!("Unsupported architecture for NSIS: {other}"),
            "Build the installer on an x86, x86_64 or aarch64 host.",
        )),
    }
}

/// `VIProductVersion` needs exactly four numeric parts.
///
/// - "1" -> "1.0.0.0"
/// - "1.2.3" -> "1.2.3.0"
/// - "1.2.3.4.5" -> "1.2.3.4"
/// - "2.0.0-beta.1" -> "2.0.0.0"
fn format_version_for_nsis(version: &str) -> String {
    let mut parts: Vec<u64> = version
        .split(['.', '-', '+'])
        .map_while(|part| part.parse().ok())
        .take(4)
        .collect();
    parts.resize(4, 0);
    parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[async_trait]
impl Bundler for NsisBundler {
    fn id(&self) -> &'static str {
        "exe"
    }

    fn name(&self) -> &'static str {
        "Windows EXE Installer"
    }

    fn description(&self) -> &'static str {
        "Windows setup executable built with NSIS."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn artifact_extension(&self) -> &'static str {
        "exe"
    }

    fn parameters(&self) -> Vec<&'static dyn ParamDescriptor> {
        vec![
            &APP_NAME,
            &APP_FS_NAME,
            &MAIN_BINARY,
            &IDENTIFIER,
            &VERSION,
            &VENDOR,
            &DESCRIPTION,
            &COPYRIGHT,
            &LICENSE_FILE,
            &ICON,
            &SYSTEM_WIDE,
            &*WIN_INSTALL_MODE,
            &MENU_HINT,
            &SHORTCUT_HINT,
            &SERVICE_HINT,
            &FILE_ASSOCIATIONS,
            &SECONDARY_LAUNCHERS,
        ]
    }

    async fn validate(&self, store: &ParamStore, ctx: &BundlerContext) -> Result<()> {
        validate_app_image(store)?;
        validate_license_files(store)?;
        reject_service_hint(store, self.id())?;
        validate_parameters(
            store,
            &self.parameters(),
            &[
                &APP_FS_NAME,
                &VERSION,
                &VENDOR,
                &DESCRIPTION,
                &COPYRIGHT,
                &IDENTIFIER,
                WIN_INSTALL_MODE.info(),
            ],
        )?;
        validate_secondary_launchers(store)?;
        map_arch(std::env::consts::ARCH)?;
        MAKENSIS.check(ctx.toolchain()).await?;
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
