//! Freedesktop integration shared by the Linux bundlers.
//!
//! Produces the MIME descriptor, the install/uninstall shell snippets and the
//! `MimeType=` line for desktop entries.

use super::replacement::{ReplacementData, xml_escape};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    params::{
        ParamStore,
        standard::{APP_FS_NAME, FileAssociation, file_associations},
    },
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Install/uninstall snippets produced for file associations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MimeRegistration {
    /// `<xdg-prefix>-MimeInfo.xml` contents, when any association has a MIME type.
    pub mime_info: Option<String>,
    /// File name of the MIME descriptor.
    pub mime_info_file: String,
    /// Post-install commands, newline terminated.
    pub install: String,
    /// Pre-uninstall commands, newline terminated.
    pub remove: String,
    /// `MimeType=a;b` line, or empty.
    pub desktop_mimes: String,
    /// Icons to copy into the image: (source, file name in the install root).
    pub icons: Vec<(PathBuf, String)>,
}

/// Checks that every association declares exactly one MIME type.
pub fn validate_single_mime(store: &ParamStore) -> Result<()> {
    for (i, assoc) in file_associations(store)?.iter().enumerate() {
        let message = match assoc.content_types.len() {
            1 => continue,
            0 => format!("No MIME types were specified for File Association number {i}."),
            _ => format!("More than one MIME types was specified for File Association number {i}."),
        };
        return Err(Error::config(
            message,
            "For Linux Bundling specify one and only one MIME type for each file association.",
        ));
    }
    Ok(())
}

/// Builds the MIME registration for the application installed at
/// `install_root` (e.g. `/opt/hello`).
pub fn mime_registration(
    store: &ParamStore,
    xdg_prefix: &str,
    install_root: &str,
) -> Result<MimeRegistration> {
    let fs_name = APP_FS_NAME.require(store)?;
    let mime_info_file = format!("{xdg_prefix}-MimeInfo.xml");
    let mut registration = MimeRegistration {
        mime_info_file: mime_info_file.clone(),
        ..Default::default()
    };

    let mut mime_info = String::from(
        "<?xml version=\"1.0\"?>\n<mime-info xmlns='http://www.freedesktop.org/standards/shared-mime-info'>\n",
    );
    let mut mimes = Vec::new();

    for (i, assoc) in file_associations(store)?.iter().enumerate() {
        let Some(mime) = assoc.content_types.first() else {
            continue;
        };
        append_mime_type(&mut mime_info, mime, assoc);

        if mimes.is_empty() {
            registration
                .install
                .push_str(&format!("xdg-mime install {install_root}/{mime_info_file}\n"));
            registration
                .remove
                .push_str(&format!("xdg-mime uninstall {install_root}/{mime_info_file}\n"));
        }
        mimes.push(mime.clone());

        if let Some(icon) = assoc.icon.as_deref().filter(|p| p.is_file()) {
            let Some(size) = square_icon_size(icon) else {
                continue;
            };
            let icon_name = format!(
                "{fs_name}_fa_{i}_{}",
                icon.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            );
            let dash_mime = mime.replace('/', "-");
            registration.install.push_str(&format!(
                "xdg-icon-resource install --context mimetypes --size {size} {install_root}/{icon_name} {dash_mime}\n"
            ));
            registration.remove.push_str(&format!(
                "xdg-icon-resource uninstall --context mimetypes --size {size} {install_root}/{icon_name} {dash_mime}\n"
            ));
            registration.icons.push((icon.to_path_buf(), icon_name));
        }
    }
    mime_info.push_str("</mime-info>");

    if !mimes.is_empty() {
        registration.mime_info = Some(mime_info);
        registration.desktop_mimes = format!("MimeType={}", mimes.join(";"));
    }
    Ok(registration)
}

fn append_mime_type(xml: &mut String, mime: &str, assoc: &FileAssociation) {
    xml.push_str(&format!("  <mime-type type='{}'>\n", xml_escape(mime)));
    if !assoc.description.is_empty() {
        xml.push_str(&format!(
            "    <comment>{}</comment>\n",
            xml_escape(&assoc.description)
        ));
    }
    for ext in &assoc.extensions {
        xml.push_str(&format!("    <glob pattern='*.{}'/>\n", xml_escape(ext)));
    }
    xml.push_str("  </mime-type>\n");
}

/// Side length of a square image, `None` for non-square or unreadable files.
fn square_icon_size(icon: &Path) -> Option<u32> {
    match image::image_dimensions(icon) {
        Ok((w, h)) if w == h && w > 0 => Some(w),
        Ok((w, h)) => {
            log::debug!("Icon {} is {w}x{h}, not square; skipping", icon.display());
            None
        }
        Err(e) => {
            log::debug!("Could not read icon {}: {e}", icon.display());
            None
        }
    }
}

impl MimeRegistration {
    /// Writes the MIME descriptor and association icons into `app_root`.
    /// Returns the descriptor path, if one was written.
    pub async fn write_into(&self, app_root: &Path) -> Result<Option<PathBuf>> {
        for (source, name) in &self.icons {
            fs::copy_file(source, &app_root.join(name)).await?;
        }
        let Some(xml) = &self.mime_info else {
            return Ok(None);
        };
        let path = app_root.join(&self.mime_info_file);
        tokio::fs::write(&path, xml)
            .await
            .fs_context("writing", &path)?;
        Ok(Some(path))
    }

    /// Adds `FILE_ASSOCIATION_INSTALL`, `FILE_ASSOCIATION_REMOVE` and
    /// `DESKTOP_MIMES`.
    pub fn apply(&self, data: &mut ReplacementData) {
        data.insert("FILE_ASSOCIATION_INSTALL", &self.install)
            .insert("FILE_ASSOCIATION_REMOVE", &self.remove)
            .insert("DESKTOP_MIMES", &self.desktop_mimes);
    }
}

/// Install/uninstall snippets for the primary launcher's menu entry and
/// desktop shortcut.
pub fn shortcut_scripts(
    install_root: &str,
    launcher_name: &str,
    menu: bool,
    shortcut: bool,
) -> (String, String) {
    let desktop_file = format!("{install_root}/{launcher_name}.desktop");
    let mut install = String::new();
    let mut remove = String::new();
    if menu {
        install.push_str(&format!("xdg-desktop-menu install --novendor {desktop_file}\n"));
        remove.push_str(&format!("xdg-desktop-menu uninstall --novendor {desktop_file}\n"));
    }
    if shortcut {
        install.push_str(&format!("xdg-desktop-icon install --novendor {desktop_file}\n"));
        remove.push_str(&format!("xdg-desktop-icon uninstall --novendor {desktop_file}\n"));
    }
    (install, remove)
}

/// Install/uninstall snippets registering secondary launcher menu entries.
pub fn secondary_launcher_scripts(install_root: &str, launcher_names: &[String]) -> (String, String) {
    let mut install = String::new();
    let mut remove = String::new();
    for name in launcher_names {
        install.push_str(&format!(
            "xdg-desktop-menu install --novendor {install_root}/{name}.desktop\n"
        ));
        remove.push_str(&format!(
            "xdg-desktop-menu uninstall --novendor {install_root}/{name}.desktop\n"
        ));
    }
    (install, remove)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(assocs: Vec<ParamStore>) -> ParamStore {
        let mut store = ParamStore::new();
        store.insert("appName", "Awesome");
        store.insert("fileAssociations", assocs);
        store
    }

    fn assoc(exts: &str, mimes: Vec<&str>) -> ParamStore {
        let mut assoc = ParamStore::new();
        assoc.insert("fileAssociation.extension", exts);
        assoc.insert("fileAssociation.contentType", mimes);
        assoc
    }

    #[test]
    fn exactly_one_mime_type_is_required() {
        assert!(validate_single_mime(&store_with(vec![assoc("awe", vec!["a/b"])])).is_ok());

        let err = validate_single_mime(&store_with(vec![assoc("awe", vec![])])).unwrap_err();
        assert!(err.to_string().starts_with("No MIME types"));

        let err = validate_single_mime(&store_with(vec![
            assoc("awe", vec!["a/b"]),
            assoc("awz", vec!["a/b", "a/c"]),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("number 1"));
        assert_eq!(err.kind(), crate::bundler::ErrorKind::Configuration);
    }

    #[test]
    fn registration_lists_every_mime_once() {
        let store = store_with(vec![
            assoc("awe,awesome", vec!["application/x-awesome"]),
            assoc("awz", vec!["application/x-awz"]),
        ]);
        let reg = mime_registration(&store, "Acme-Awesome", "/opt/Awesome").unwrap();

        assert_eq!(reg.desktop_mimes, "MimeType=application/x-awesome;application/x-awz");
        assert_eq!(
            reg.install,
            "xdg-mime install /opt/Awesome/Acme-Awesome-MimeInfo.xml\n"
        );
        let xml = reg.mime_info.unwrap();
        assert!(xml.contains("<glob pattern='*.awesome'/>"));
        assert!(xml.contains("<comment>Awesome File</comment>"));
    }

    #[test]
    fn no_associations_means_empty_tokens() {
        let reg = mime_registration(&store_with(vec![]), "x", "/opt/Awesome").unwrap();
        let mut data = ReplacementData::new();
        reg.apply(&mut data);
        assert_eq!(reg.mime_info, None);
        assert_eq!(data.get("DESKTOP_MIMES"), Some(""));
        assert_eq!(data.get("FILE_ASSOCIATION_INSTALL"), Some(""));
    }

    #[test]
    fn shortcut_hints_pick_xdg_commands() {
        let (install, remove) = shortcut_scripts("/opt/App", "App", false, true);
        assert_eq!(install, "xdg-desktop-icon install --novendor /opt/App/App.desktop\n");
        assert_eq!(remove, "xdg-desktop-icon uninstall --novendor /opt/App/App.desktop\n");

        let (install, _) = shortcut_scripts("/opt/App", "App", true, true);
        assert_eq!(install.lines().count(), 2);
    }

    #[test]
    fn secondary_launchers_register_menu_entries() {
        let (install, remove) =
            secondary_launcher_scripts("/opt/App", &["Helper".to_string()]);
        assert_eq!(
            install,
            "xdg-desktop-menu install --novendor /opt/App/Helper.desktop\n"
        );
        assert!(remove.starts_with("xdg-desktop-menu uninstall"));
    }
}
