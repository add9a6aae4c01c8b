//! Linux package formats.
//!
//! RPM and Debian packages install the same `/opt/<appFsName>` tree and share
//! the desktop entry, MIME registration and init script templates.

pub mod deb;
pub mod rpm;

use crate::bundler::{
    error::Result,
    params::{
        ParamDescriptor, ParamInfo, ParamStore,
        standard::{
            APP_FS_NAME, APP_NAME, CATEGORY, DESCRIPTION, ICON, LICENSE_TYPE, LINUX_CATEGORY,
            MENU_HINT, RUN_AT_STARTUP, SERVICE_HINT, SHORTCUT_HINT, START_ON_INSTALL,
            STOP_ON_UNINSTALL, TITLE, VENDOR, VERSION, XDG_FILE_PREFIX, secondary_launchers,
        },
    },
    pipeline::{
        ReplacementData, Template, WorkDir,
        desktop::{self, mime_registration, secondary_launcher_scripts, shortcut_scripts},
    },
    utils::fs,
};
use std::path::Path;

pub(crate) const DESKTOP_ENTRY: Template = Template {
    description: "Menu shortcut descriptor",
    builtin: include_str!("../../../../templates/linux/template.desktop"),
    tokens: &[
        "APPLICATION_NAME",
        "APPLICATION_SUMMARY",
        "INSTALL_ROOT",
        "APPLICATION_LAUNCHER_FILENAME",
        "APPLICATION_ICON",
        "MENU_CATEGORY",
        "DESKTOP_MIMES",
    ],
};

pub(crate) const INIT_SCRIPT: Template = Template {
    description: "Init script",
    builtin: include_str!("../../../../templates/linux/template.init"),
    tokens: &[
        "APPLICATION_PACKAGE",
        "APPLICATION_SUMMARY",
        "APPLICATION_DESCRIPTION",
        "INSTALL_ROOT",
        "APPLICATION_LAUNCHER_FILENAME",
    ],
};

/// Where the application lands on the target system.
pub(crate) fn install_root(store: &ParamStore) -> Result<String> {
    Ok(format!("/opt/{}", APP_FS_NAME.require(store)?))
}

/// Tokens shared by every Linux template.
pub(crate) fn replacement_data(store: &ParamStore, package: &str) -> Result<ReplacementData> {
    let fs_name = APP_FS_NAME.require(store)?;
    let install_root = install_root(store)?;
    let icon = match ICON.fetch_from(store)? {
        Some(icon) => {
            let extension = icon
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "png".to_string());
            format!("{install_root}/{fs_name}.{extension}")
        }
        None => String::new(),
    };

    let mut data = ReplacementData::new();
    data.insert("APPLICATION_NAME", APP_NAME.require(store)?)
        .insert("APPLICATION_FS_NAME", &fs_name)
        .insert("APPLICATION_PACKAGE", package)
        .insert("APPLICATION_VENDOR", VENDOR.require(store)?)
        .insert("APPLICATION_VERSION", VERSION.require(store)?)
        .insert("APPLICATION_LAUNCHER_FILENAME", &fs_name)
        .insert("APPLICATION_ICON", icon)
        .insert("INSTALL_ROOT", &install_root)
        .insert("XDG_PREFIX", XDG_FILE_PREFIX.require(store)?)
        .insert("DEPLOY_BUNDLE_CATEGORY", CATEGORY.require(store)?)
        .insert("MENU_CATEGORY", LINUX_CATEGORY.require(store)?)
        .insert("APPLICATION_DESCRIPTION", DESCRIPTION.require(store)?)
        .insert("APPLICATION_SUMMARY", TITLE.require(store)?)
        .insert("APPLICATION_LICENSE_TYPE", LICENSE_TYPE.require(store)?)
        .insert("SERVICE_HINT", SERVICE_HINT.value_or(store, false)?)
        .insert("START_ON_INSTALL", START_ON_INSTALL.value_or(store, false)?)
        .insert("STOP_ON_UNINSTALL", STOP_ON_UNINSTALL.value_or(store, true)?)
        .insert("RUN_AT_STARTUP", RUN_AT_STARTUP.value_or(store, false)?);
    Ok(data)
}

/// Identity tokens a secondary launcher overrides in the primary data.
fn launcher_overrides(launcher: &ParamStore) -> Result<ReplacementData> {
    let mut overrides = ReplacementData::new();
    overrides
        .insert("APPLICATION_NAME", APP_NAME.require(launcher)?)
        .insert("APPLICATION_LAUNCHER_FILENAME", APP_FS_NAME.require(launcher)?)
        .insert("APPLICATION_SUMMARY", TITLE.require(launcher)?)
        .insert("APPLICATION_DESCRIPTION", DESCRIPTION.require(launcher)?)
        .insert("DESKTOP_MIMES", "");
    Ok(overrides)
}

/// Writes desktop entries and the MIME descriptor into `app_root` and adds
/// the matching install/remove script tokens to `data`.
///
/// Secondary launchers get their own desktop entry; their menu registration
/// is folded into the primary package scripts.
pub(crate) async fn write_desktop_integration(
    workdir: &mut WorkDir,
    store: &ParamStore,
    data: &mut ReplacementData,
    app_root: &Path,
) -> Result<()> {
    let fs_name = APP_FS_NAME.require(store)?;
    let install_root = install_root(store)?;

    let registration = mime_registration(store, &XDG_FILE_PREFIX.require(store)?, &install_root)?;
    if let Some(mime_info) = registration.write_into(app_root).await? {
        workdir.record_config(mime_info);
    }
    registration.apply(data);

    let (install, remove) = shortcut_scripts(
        &install_root,
        &fs_name,
        MENU_HINT.value_or(store, true)?,
        SHORTCUT_HINT.value_or(store, false)?,
    );
    data.insert("DESKTOP_INSTALL", install)
        .insert("DESKTOP_REMOVE", remove);

    let mut launcher_names = Vec::new();
    for launcher in secondary_launchers(store)? {
        let name = APP_FS_NAME.require(&launcher)?;
        let launcher_data = data.scoped(&launcher_overrides(&launcher)?);
        DESKTOP_ENTRY
            .render_to(
                workdir,
                store,
                &app_root.join(format!("{name}.desktop")),
                &launcher_data,
            )
            .await?;
        launcher_names.push(name);
    }
    let (install, remove) = secondary_launcher_scripts(&install_root, &launcher_names);
    data.insert("SECONDARY_LAUNCHERS_INSTALL", install)
        .insert("SECONDARY_LAUNCHERS_REMOVE", remove);

    DESKTOP_ENTRY
        .render_to(
            workdir,
            store,
            &app_root.join(format!("{fs_name}.desktop")),
            data,
        )
        .await?;
    Ok(())
}

/// Renders the service init script to `target` and marks it executable.
pub(crate) async fn write_init_script(
    workdir: &mut WorkDir,
    store: &ParamStore,
    data: &ReplacementData,
    target: &Path,
) -> Result<()> {
    let script = INIT_SCRIPT.render_to(workdir, store, target, data).await?;
    fs::set_executable(&script).await
}

/// Checks shared by both Linux formats, before the format's own name and
/// tool checks.
///
/// Every descriptor in `declared` is resolved and every template token
/// source is required, together with the format's extra `required` ones.
pub(crate) fn validate_common(
    store: &ParamStore,
    declared: &[&'static dyn ParamDescriptor],
    required: &[&ParamInfo<String>],
) -> Result<()> {
    use crate::bundler::pipeline::{
        validate_app_image, validate_license_files, validate_parameters,
        validate_secondary_launchers, validate_service_install,
    };
    validate_app_image(store)?;
    validate_license_files(store)?;
    validate_service_install(store)?;
    desktop::validate_single_mime(store)?;
    validate_parameters(
        store,
        declared,
        &[
            &APP_FS_NAME,
            &VERSION,
            &VENDOR,
            &TITLE,
            &DESCRIPTION,
            &CATEGORY,
            &LICENSE_TYPE,
            &XDG_FILE_PREFIX,
            LINUX_CATEGORY.info(),
        ],
    )?;
    validate_parameters(store, &[], required)?;
    validate_secondary_launchers(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_tokens_render_booleans_and_paths() {
        let mut store = ParamStore::new();
        store.insert("appName", "Hello World");
        store.insert("vendor", "Acme");
        store.insert("icon", std::path::PathBuf::from("/src/hello.png"));
        store.insert("serviceHint", "yes");

        let data = replacement_data(&store, "hello-world").unwrap();
        assert_eq!(data.get("INSTALL_ROOT"), Some("/opt/HelloWorld"));
        assert_eq!(data.get("APPLICATION_ICON"), Some("/opt/HelloWorld/HelloWorld.png"));
        assert_eq!(data.get("SERVICE_HINT"), Some("true"));
        assert_eq!(data.get("STOP_ON_UNINSTALL"), Some("true"));
        assert_eq!(data.get("MENU_CATEGORY"), Some("Utility"));
        assert_eq!(data.get("XDG_PREFIX"), Some("Acme-HelloWorld"));
    }

    #[test]
    fn launchers_override_identity_only() {
        let mut launcher = ParamStore::new();
        launcher.insert("appName", "Hello Admin");

        let mut store = ParamStore::new();
        store.insert("appName", "Hello");
        store.insert("secondaryLaunchers", vec![launcher]);

        let data = replacement_data(&store, "hello").unwrap();
        let scoped = secondary_launchers(&store).unwrap();
        let merged = data.scoped(&launcher_overrides(&scoped[0]).unwrap());

        assert_eq!(merged.get("APPLICATION_LAUNCHER_FILENAME"), Some("HelloAdmin"));
        assert_eq!(merged.get("APPLICATION_FS_NAME"), Some("Hello"));
        assert_eq!(merged.get("INSTALL_ROOT"), Some("/opt/Hello"));
        assert_eq!(merged.get("DESKTOP_MIMES"), Some(""));
    }
}
