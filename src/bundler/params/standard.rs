//! The standard parameter catalogue shared by every bundler.
//!
//! Identifiers are stable strings: configuration files, `--set` overrides and
//! the library API all address parameters through them.

use super::{
    EnumeratedParam, FromValue, ParamInfo, ParamStore, Value,
    info::{boolean, no_default, path, text, text_list},
};
use crate::bundler::error::{Error, Result};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Application name.
pub static APP_NAME: ParamInfo<String> = ParamInfo::new(
    "Name",
    "The name of the application.",
    "appName",
    no_default,
    Some(text),
);

/// File-system safe application name.
pub static APP_FS_NAME: ParamInfo<String> = ParamInfo::new(
    "File System Name",
    "The application name with spaces and path separators removed.",
    "linux.appFsName",
    |store| Ok(APP_NAME.fetch_from(store)?.map(|name| fs_safe(&name))),
    Some(text),
);

/// Reverse-DNS style identifier.
pub static IDENTIFIER: ParamInfo<String> = ParamInfo::new(
    "Identifier",
    "Unique identifier of the application, e.g. com.example.app.",
    "identifier",
    |store| {
        let Some(fs_name) = APP_FS_NAME.fetch_from(store)? else {
            return Ok(None);
        };
        let vendor = VENDOR.value_or(store, "Unknown".into())?;
        Ok(Some(
            format!("{}.{}", fs_safe(&vendor), fs_name).to_lowercase(),
        ))
    },
    Some(text),
);

/// Application version.
pub static VERSION: ParamInfo<String> = ParamInfo::new(
    "Version",
    "The version of the application.",
    "appVersion",
    |_| Ok(Some("1.0".into())),
    Some(text),
);

/// Vendor.
pub static VENDOR: ParamInfo<String> = ParamInfo::new(
    "Vendor",
    "The vendor of the application.",
    "vendor",
    |_| Ok(Some("Unknown".into())),
    Some(text),
);

/// Maintainer email.
pub static EMAIL: ParamInfo<String> = ParamInfo::new(
    "Email",
    "Maintainer email address.",
    "email",
    |_| Ok(Some("Unknown".into())),
    Some(text),
);

/// Description.
pub static DESCRIPTION: ParamInfo<String> = ParamInfo::new(
    "Description",
    "A longer description of the application.",
    "description",
    |store| APP_NAME.fetch_from(store),
    Some(text),
);

/// Title, used as the one-line summary.
pub static TITLE: ParamInfo<String> = ParamInfo::new(
    "Title",
    "A short title for the application.",
    "title",
    |store| APP_NAME.fetch_from(store),
    Some(text),
);

/// Packaging category (RPM group, Debian section).
pub static CATEGORY: ParamInfo<String> = ParamInfo::new(
    "Category",
    "The category of the application, as understood by the package manager.",
    "applicationCategory",
    |_| Ok(Some("Unknown".into())),
    Some(text),
);

/// License type.
pub static LICENSE_TYPE: ParamInfo<String> = ParamInfo::new(
    "License Type",
    "The license type, e.g. \"MIT\" or \"Proprietary\".",
    "licenseType",
    |_| Ok(Some("Unknown".into())),
    Some(text),
);

/// License files, relative to the application resources.
pub static LICENSE_FILE: ParamInfo<Vec<String>> = ParamInfo::new(
    "License File",
    "License files, relative to the application resource roots.",
    "licenseFile",
    |_| Ok(Some(Vec::new())),
    Some(text_list),
);

/// Copyright notice.
pub static COPYRIGHT: ParamInfo<String> = ParamInfo::new(
    "Copyright",
    "Copyright notice for the application.",
    "copyright",
    |store| {
        let vendor = VENDOR.value_or(store, "Unknown".into())?;
        Ok(Some(format!("Copyright (C) {vendor}")))
    },
    Some(text),
);

/// System-wide installation. Unset means system wide.
pub static SYSTEM_WIDE: ParamInfo<bool> = ParamInfo::new(
    "System Wide",
    "Install for all users (true) or only the current user (false).",
    "systemWide",
    no_default,
    Some(boolean),
);

/// Install the application as a service/daemon.
pub static SERVICE_HINT: ParamInfo<bool> = ParamInfo::new(
    "Service Hint",
    "Install the application as a service or daemon.",
    "serviceHint",
    |_| Ok(Some(false)),
    Some(boolean),
);

/// Start the service after installation.
pub static START_ON_INSTALL: ParamInfo<bool> = ParamInfo::new(
    "Start On Install",
    "Start the service once installation completes.",
    "startOnInstall",
    |_| Ok(Some(false)),
    Some(boolean),
);

/// Stop the service before uninstallation.
pub static STOP_ON_UNINSTALL: ParamInfo<bool> = ParamInfo::new(
    "Stop On Uninstall",
    "Stop the service before uninstalling.",
    "stopOnUninstall",
    |_| Ok(Some(true)),
    Some(boolean),
);

/// Run the service at system startup.
pub static RUN_AT_STARTUP: ParamInfo<bool> = ParamInfo::new(
    "Run At Startup",
    "Run the service when the system starts.",
    "runAtStartup",
    |_| Ok(Some(false)),
    Some(boolean),
);

/// Add a menu entry.
pub static MENU_HINT: ParamInfo<bool> = ParamInfo::new(
    "Menu Hint",
    "Add the application to the system menu.",
    "menuHint",
    |_| Ok(Some(true)),
    Some(boolean),
);

/// Add a desktop shortcut.
pub static SHORTCUT_HINT: ParamInfo<bool> = ParamInfo::new(
    "Shortcut Hint",
    "Add a desktop shortcut for the application.",
    "shortcutHint",
    |_| Ok(Some(false)),
    Some(boolean),
);

/// Verbose output.
pub static VERBOSE: ParamInfo<bool> = ParamInfo::new(
    "Verbose",
    "Log native tool output and keep a copy of generated configuration.",
    "verbose",
    |_| Ok(Some(false)),
    Some(boolean),
);

/// Root for per-operation working directories.
pub static BUILD_ROOT: ParamInfo<PathBuf> = ParamInfo::new(
    "Build Root",
    "Directory under which working directories are created.",
    "buildRoot",
    |_| Ok(Some(std::env::temp_dir().join("kodegen-bundler"))),
    Some(path),
);

/// Directory searched for template overrides.
pub static DROP_IN_RESOURCES_ROOT: ParamInfo<PathBuf> = ParamInfo::new(
    "Drop-In Resources Root",
    "Directory searched for same-named template overrides.",
    "dropinResourcesRoot",
    no_default,
    Some(path),
);

/// Application source directory.
pub static SOURCE_DIR: ParamInfo<PathBuf> = ParamInfo::new(
    "Source Directory",
    "Directory holding the application files.",
    "srcdir",
    no_default,
    Some(path),
);

/// Main executable, installed as the launcher.
pub static MAIN_BINARY: ParamInfo<PathBuf> = ParamInfo::new(
    "Main Binary",
    "The executable installed as the application launcher.",
    "mainBinary",
    no_default,
    Some(path),
);

/// Bundled runtime directory. Explicit null means "no runtime".
pub static RUNTIME: ParamInfo<PathBuf> = ParamInfo::new(
    "Runtime",
    "Runtime directory bundled with the application. Set to null to bundle none.",
    "runtime",
    |store| Ok(SOURCE_DIR.fetch_from(store)?.map(|dir| dir.join("runtime"))),
    Some(path),
);

/// Application resources.
pub static APP_RESOURCES_LIST: ParamInfo<Vec<ResourceSet>> = ParamInfo::new(
    "Resources",
    "Resource sets: a base directory plus file names or glob patterns.",
    "appResourcesList",
    |store| {
        Ok(Some(
            SOURCE_DIR
                .fetch_from(store)?
                .map(|base| vec![ResourceSet::all(base)])
                .unwrap_or_default(),
        ))
    },
    None,
);

/// Application icon.
pub static ICON: ParamInfo<PathBuf> = ParamInfo::new(
    "Icon",
    "Icon file for the application.",
    "icon",
    no_default,
    Some(path),
);

/// File associations, one nested store each.
pub static FILE_ASSOCIATIONS: ParamInfo<Vec<ParamStore>> = ParamInfo::new(
    "File Associations",
    "File extensions and MIME types handled by the application.",
    "fileAssociations",
    |_| Ok(Some(Vec::new())),
    None,
);

/// Extensions of one file association.
pub static FA_EXTENSIONS: ParamInfo<Vec<String>> = ParamInfo::new(
    "File Association Extensions",
    "Extensions handled by this association, without the leading dot.",
    "fileAssociation.extension",
    |_| Ok(Some(Vec::new())),
    Some(text_list),
);

/// MIME types of one file association.
pub static FA_CONTENT_TYPE: ParamInfo<Vec<String>> = ParamInfo::new(
    "File Association Content Types",
    "MIME types handled by this association.",
    "fileAssociation.contentType",
    |_| Ok(Some(Vec::new())),
    Some(text_list),
);

/// Description of one file association.
pub static FA_DESCRIPTION: ParamInfo<String> = ParamInfo::new(
    "File Association Description",
    "Description shown for associated files.",
    "fileAssociation.description",
    |store| Ok(APP_NAME.fetch_from(store)?.map(|name| format!("{name} File"))),
    Some(text),
);

/// Icon of one file association.
pub static FA_ICON: ParamInfo<PathBuf> = ParamInfo::new(
    "File Association Icon",
    "Icon shown for associated files.",
    "fileAssociation.icon",
    no_default,
    Some(path),
);

/// Secondary launchers, one nested store each.
pub static SECONDARY_LAUNCHERS: ParamInfo<Vec<ParamStore>> = ParamInfo::new(
    "Secondary Launchers",
    "Additional entry points installed alongside the application.",
    "secondaryLaunchers",
    |_| Ok(Some(Vec::new())),
    None,
);

static RPM_BUNDLE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)[a-z\d+\-._]+$").expect("valid regex"));

static DEB_BUNDLE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z\d][a-z\d+\-.]+$").expect("valid regex"));

/// RPM package name.
pub static RPM_BUNDLE_NAME: ParamInfo<String> = ParamInfo::new(
    "RPM Package Name",
    "Name of the RPM package. Only a-z, A-Z, 0-9, '-', '.', '_' and '+' are allowed.",
    "linux.bundleName",
    |store| Ok(APP_NAME.fetch_from(store)?.map(|name| package_name(&name))),
    Some(|raw, _| check_rpm_bundle_name(raw).map(|()| raw.to_string())),
);

/// Debian package name.
pub static DEB_BUNDLE_NAME: ParamInfo<String> = ParamInfo::new(
    "Debian Package Name",
    "Name of the Debian package. Lower case letters, digits, '+', '-' and '.' only.",
    "linux.deb.bundleName",
    |store| Ok(APP_NAME.fetch_from(store)?.map(|name| package_name(&name))),
    Some(|raw, _| check_deb_bundle_name(raw).map(|()| raw.to_string())),
);

/// Prefix for XDG desktop and MIME files.
pub static XDG_FILE_PREFIX: ParamInfo<String> = ParamInfo::new(
    "Prefix for XDG files (mime, desktop)",
    "Prefix for XDG MimeInfo and desktop files. Defaults to <vendor>-<appFsName>, with spaces dropped.",
    "linux.xdg-prefix",
    |store| {
        let vendor = if store.contains_key(VENDOR.id()) {
            VENDOR.value_or(store, "kodegen".into())?
        } else {
            "kodegen".to_string()
        };
        let Some(fs_name) = APP_FS_NAME.fetch_from(store)? else {
            return Ok(None);
        };
        Ok(Some(
            format!("{vendor}-{fs_name}")
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        ))
    },
    Some(text),
);

/// RPM architecture name.
pub static RPM_ARCH: ParamInfo<String> = ParamInfo::new(
    "RPM Architecture",
    "Target architecture as named by rpm.",
    "linux.rpm.arch",
    |_| {
        Ok(Some(
            match std::env::consts::ARCH {
                "x86" => "i386",
                "arm" => "armv7hl",
                other => other,
            }
            .to_string(),
        ))
    },
    Some(text),
);

/// Debian architecture name.
pub static DEB_ARCH: ParamInfo<String> = ParamInfo::new(
    "Debian Architecture",
    "Target architecture as named by dpkg.",
    "linux.deb.arch",
    |_| {
        Ok(Some(
            match std::env::consts::ARCH {
                "x86_64" => "amd64",
                "aarch64" => "arm64",
                "x86" => "i386",
                "arm" => "armhf",
                other => other,
            }
            .to_string(),
        ))
    },
    Some(text),
);

/// Freedesktop main menu category.
pub static LINUX_CATEGORY: LazyLock<EnumeratedParam<String>> = LazyLock::new(|| {
    EnumeratedParam::new(
        ParamInfo::new(
            "Menu Category",
            "Freedesktop main category of the desktop entry.",
            "linux.category",
            |_| Ok(Some("Utility".into())),
            Some(|raw, _| enumerated_text(&LINUX_CATEGORY, raw)),
        ),
        [
            ("Audio & Video", "AudioVideo"),
            ("Audio", "Audio"),
            ("Video", "Video"),
            ("Development", "Development"),
            ("Education", "Education"),
            ("Game", "Game"),
            ("Graphics", "Graphics"),
            ("Network", "Network"),
            ("Office", "Office"),
            ("Science", "Science"),
            ("Settings", "Settings"),
            ("System", "System"),
            ("Utility", "Utility"),
        ]
        .map(|(label, id)| (label, id.to_string())),
    )
});

/// macOS `LSApplicationCategoryType`.
pub static MAC_CATEGORY: LazyLock<EnumeratedParam<String>> = LazyLock::new(|| {
    EnumeratedParam::new(
        ParamInfo::new(
            "Category",
            "Mac App Store category of the application.",
            "mac.category",
            |_| Ok(Some("public.app-category.utilities".into())),
            Some(|raw, _| enumerated_text(&MAC_CATEGORY, raw)),
        ),
        [
            ("Business", "business"),
            ("Developer Tools", "developer-tools"),
            ("Education", "education"),
            ("Entertainment", "entertainment"),
            ("Finance", "finance"),
            ("Games", "games"),
            ("Graphics & Design", "graphics-design"),
            ("Healthcare & Fitness", "healthcare-fitness"),
            ("Lifestyle", "lifestyle"),
            ("Medical", "medical"),
            ("Music", "music"),
            ("News", "news"),
            ("Photography", "photography"),
            ("Productivity", "productivity"),
            ("Reference", "reference"),
            ("Social Networking", "social-networking"),
            ("Sports", "sports"),
            ("Travel", "travel"),
            ("Utilities", "utilities"),
            ("Video", "video"),
            ("Weather", "weather"),
        ]
        .map(|(label, id)| (label, format!("public.app-category.{id}"))),
    )
});

/// NSIS install mode, derived from `systemWide` unless set.
pub static WIN_INSTALL_MODE: LazyLock<EnumeratedParam<String>> = LazyLock::new(|| {
    EnumeratedParam::new(
        ParamInfo::new(
            "Install Mode",
            "Install for the current user, per machine, or let the user choose.",
            "win.installMode",
            |store| {
                let mode = if SYSTEM_WIDE.value_or(store, true)? {
                    "perMachine"
                } else {
                    "currentUser"
                };
                Ok(Some(mode.to_string()))
            },
            Some(|raw, _| enumerated_text(&WIN_INSTALL_MODE, raw)),
        ),
        [
            ("Current User", "currentUser"),
            ("Per Machine", "perMachine"),
            ("Both", "both"),
        ]
        .map(|(label, id)| (label, id.to_string())),
    )
});

/// Resolves raw text against an enumerated vocabulary, accepting either a
/// label or an identifier.
fn enumerated_text(param: &EnumeratedParam<String>, raw: &str) -> Result<String> {
    if let Some(value) = param.value_for(raw) {
        return Ok(value.clone());
    }
    let raw = raw.to_string();
    if param.is_known_value(&raw) {
        return Ok(raw);
    }
    let labels: Vec<&str> = param.displayable_keys().into_iter().collect();
    Err(Error::config(
        format!("Invalid value \"{raw}\" for \"{}\".", param.id()),
        format!("Use one of: {}.", labels.join(", ")),
    ))
}

/// Validates an RPM package name against the Fedora naming rules.
pub fn check_rpm_bundle_name(name: &str) -> Result<()> {
    if RPM_BUNDLE_NAME_PATTERN.is_match(name) {
        return Ok(());
    }
    Err(Error::config(
        format!("Invalid value \"{name}\" for the package name."),
        "Set the \"linux.bundleName\" parameter to a valid RPM package name. Packages must be \
         named using only the following ASCII characters: \
         abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._+",
    ))
}

/// Validates a Debian package name.
pub fn check_deb_bundle_name(name: &str) -> Result<()> {
    if DEB_BUNDLE_NAME_PATTERN.is_match(name) {
        return Ok(());
    }
    Err(Error::config(
        format!("Invalid value \"{name}\" for the package name."),
        "Set the \"linux.deb.bundleName\" parameter to a valid Debian package name: at least \
         two characters, lower case letters, digits, '+', '-' and '.', starting with a letter \
         or digit.",
    ))
}

fn fs_safe(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '/' | '\\' | ':'))
        .collect()
}

fn package_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// A base directory plus the files under it that belong to the application.
///
/// `files` entries are relative paths or glob patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSet {
    /// Base directory.
    pub base: PathBuf,
    /// Relative files or glob patterns.
    pub files: Vec<String>,
}

impl ResourceSet {
    /// Every file under `base`.
    pub fn all(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            files: vec!["**/*".to_string()],
        }
    }

    /// Expands patterns into the relative paths of existing files, in
    /// pattern order then path order.
    pub fn included_files(&self) -> Result<Vec<PathBuf>> {
        let mut included = Vec::new();
        for pattern in &self.files {
            let full = self.base.join(pattern);
            let full = full.to_string_lossy();
            let mut matches: Vec<PathBuf> = glob::glob(&full)?
                .filter_map(|entry| entry.ok())
                .filter(|p| p.is_file())
                .filter_map(|p| p.strip_prefix(&self.base).ok().map(Path::to_path_buf))
                .collect();
            matches.sort();
            for rel in matches {
                if !included.contains(&rel) {
                    included.push(rel);
                }
            }
        }
        Ok(included)
    }
}

impl FromValue for ResourceSet {
    fn from_value(value: &Value) -> Option<Self> {
        let Value::Map(map) = value else {
            return None;
        };
        let base = match map.get("base")? {
            Value::Path(p) => p.clone(),
            Value::String(s) => PathBuf::from(s),
            _ => return None,
        };
        let files = match map.get("files") {
            None => vec!["**/*".to_string()],
            Some(Value::String(s)) => vec![s.clone()],
            Some(other) => Vec::<String>::from_value(other)?,
        };
        Some(Self { base, files })
    }
}

impl From<ResourceSet> for Value {
    fn from(set: ResourceSet) -> Self {
        let mut map = ParamStore::new();
        map.insert("base", set.base);
        map.insert("files", set.files);
        Value::Map(map)
    }
}

/// A resolved file association.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAssociation {
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
    /// MIME types.
    pub content_types: Vec<String>,
    /// Description.
    pub description: String,
    /// Icon, if any.
    pub icon: Option<PathBuf>,
}

/// Resolves every file association in `store`, in declaration order.
///
/// Each association resolves against the primary store with its own entries
/// on top, so defaults such as the description can see the application name.
pub fn file_associations(store: &ParamStore) -> Result<Vec<FileAssociation>> {
    FILE_ASSOCIATIONS
        .value_or(store, Vec::new())?
        .iter()
        .map(|assoc| {
            let scoped = store.overlay(assoc);
            Ok(FileAssociation {
                extensions: FA_EXTENSIONS.value_or(&scoped, Vec::new())?,
                content_types: FA_CONTENT_TYPE.value_or(&scoped, Vec::new())?,
                description: FA_DESCRIPTION.value_or(&scoped, String::new())?,
                icon: FA_ICON.fetch_from(&scoped)?,
            })
        })
        .collect()
}

/// Builds the store a secondary launcher resolves against.
///
/// The launcher's own entries win. Identity values the primary derived from
/// its own name are dropped so the launcher derives them from its name
/// instead; everything else is inherited.
pub fn launcher_scope(primary: &ParamStore, launcher: &ParamStore) -> ParamStore {
    let mut scoped = primary.clone();
    for derived in [
        APP_FS_NAME.id(),
        TITLE.id(),
        DESCRIPTION.id(),
        FILE_ASSOCIATIONS.id(),
        SECONDARY_LAUNCHERS.id(),
    ] {
        scoped.remove(derived);
    }
    scoped.extend(launcher);
    scoped
}

/// Scoped stores of every secondary launcher, in declaration order.
pub fn secondary_launchers(store: &ParamStore) -> Result<Vec<ParamStore>> {
    Ok(SECONDARY_LAUNCHERS
        .value_or(store, Vec::new())?
        .iter()
        .map(|launcher| launcher_scope(store, launcher))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launchers_inherit_but_rederive_identity() {
        let mut launcher = ParamStore::new();
        launcher.insert("appName", "Helper Tool");

        let mut store = ParamStore::new();
        store.insert("appName", "Main App");
        store.insert("linux.appFsName", "MainApp");
        store.insert("vendor", "Acme");
        store.insert("secondaryLaunchers", vec![launcher]);

        let scoped = secondary_launchers(&store).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(APP_FS_NAME.require(&scoped[0]).unwrap(), "HelperTool");
        assert_eq!(VENDOR.require(&scoped[0]).unwrap(), "Acme");
        assert!(SECONDARY_LAUNCHERS.require(&scoped[0]).unwrap().is_empty());
    }

    #[test]
    fn dependent_defaults_follow_app_name() {
        let mut store = ParamStore::new();
        store.insert("appName", "Hello World");
        store.insert("vendor", "Acme Corp");

        assert_eq!(APP_FS_NAME.require(&store).unwrap(), "HelloWorld");
        assert_eq!(RPM_BUNDLE_NAME.require(&store).unwrap(), "hello-world");
        assert_eq!(XDG_FILE_PREFIX.require(&store).unwrap(), "AcmeCorp-HelloWorld");
        assert_eq!(IDENTIFIER.require(&store).unwrap(), "acmecorp.helloworld");
        assert_eq!(COPYRIGHT.require(&store).unwrap(), "Copyright (C) Acme Corp");
        assert_eq!(DESCRIPTION.require(&store).unwrap(), "Hello World");
    }

    #[test]
    fn xdg_prefix_uses_placeholder_vendor_when_unset() {
        let mut store = ParamStore::new();
        store.insert("appName", "Tool");
        assert_eq!(XDG_FILE_PREFIX.require(&store).unwrap(), "kodegen-Tool");
    }

    #[test]
    fn bundle_name_grammar_is_enforced_on_raw_text() {
        let mut store = ParamStore::new();
        store.insert("linux.bundleName", "my_app+extra");
        assert_eq!(RPM_BUNDLE_NAME.require(&store).unwrap(), "my_app+extra");

        let err = RPM_BUNDLE_NAME.convert("my app", &store).unwrap_err();
        assert!(err.advice().unwrap().contains("linux.bundleName"));

        assert!(check_deb_bundle_name("my-app").is_ok());
        assert!(check_deb_bundle_name("My-App").is_err());
        assert!(check_deb_bundle_name("a").is_err());
    }

    #[test]
    fn runtime_default_and_explicit_null() {
        let mut store = ParamStore::new();
        store.insert("srcdir", PathBuf::from("/src/app"));
        assert_eq!(
            RUNTIME.fetch_from(&store).unwrap(),
            Some(PathBuf::from("/src/app/runtime"))
        );

        store.insert_null("runtime");
        assert_eq!(RUNTIME.fetch_from(&store).unwrap(), None);
    }

    #[test]
    fn enumerated_converters_accept_labels_and_identifiers() {
        let store = ParamStore::new();
        assert_eq!(LINUX_CATEGORY.convert("Audio & Video", &store).unwrap(), "AudioVideo");
        assert_eq!(LINUX_CATEGORY.convert("Game", &store).unwrap(), "Game");
        assert!(LINUX_CATEGORY.convert("Spreadsheets", &store).is_err());
        assert_eq!(
            MAC_CATEGORY.value_for("Developer Tools").map(String::as_str),
            Some("public.app-category.developer-tools")
        );
        assert_eq!(MAC_CATEGORY.value_for("Compilers"), None);
    }

    #[test]
    fn install_mode_follows_system_wide() {
        let mut store = ParamStore::new();
        assert_eq!(WIN_INSTALL_MODE.require(&store).unwrap(), "perMachine");
        store.insert("systemWide", false);
        assert_eq!(WIN_INSTALL_MODE.require(&store).unwrap(), "currentUser");
    }

    #[test]
    fn file_associations_resolve_in_scope() {
        let mut assoc = ParamStore::new();
        assoc.insert("fileAssociation.extension", "awe, awz");
        assoc.insert("fileAssociation.contentType", vec!["application/x-awesome"]);

        let mut store = ParamStore::new();
        store.insert("appName", "Awesome");
        store.insert("fileAssociations", vec![assoc]);

        let resolved = file_associations(&store).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].extensions, vec!["awe", "awz"]);
        assert_eq!(resolved[0].content_types, vec!["application/x-awesome"]);
        assert_eq!(resolved[0].description, "Awesome File");
        assert_eq!(resolved[0].icon, None);
    }

    #[test]
    fn resource_sets_expand_globs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("LICENSE"), "mit").unwrap();
        std::fs::write(dir.path().join("docs/guide.txt"), "guide").unwrap();

        let set = ResourceSet {
            base: dir.path().to_path_buf(),
            files: vec!["LICENSE".into(), "docs/*.txt".into()],
        };
        assert_eq!(
            set.included_files().unwrap(),
            vec![PathBuf::from("LICENSE"), PathBuf::from("docs/guide.txt")]
        );

        let value = Value::from(set.clone());
        assert_eq!(ResourceSet::from_value(&value), Some(set));
    }
}
