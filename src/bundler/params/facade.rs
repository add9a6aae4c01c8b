//! Typed setters over a [`ParamStore`].

use super::{
    ParamStore, Value,
    standard::{
        APP_NAME, APP_RESOURCES_LIST, CATEGORY, COPYRIGHT, DESCRIPTION, EMAIL, FILE_ASSOCIATIONS,
        IDENTIFIER, LICENSE_FILE, LICENSE_TYPE, MAIN_BINARY, MENU_HINT, RUNTIME,
        SECONDARY_LAUNCHERS, SERVICE_HINT, SHORTCUT_HINT, SOURCE_DIR, SYSTEM_WIDE, TITLE, VENDOR,
        VERBOSE, VERSION, ResourceSet,
    },
};
use std::path::PathBuf;

/// Builds the parameter store for one bundling operation.
///
/// Text setters ignore empty strings and flag setters ignore `None`, so a
/// caller can forward optional inputs without clobbering earlier values or
/// defaults.
///
/// ```no_run
/// use kodegen_bundler_package::bundler::BundleParams;
///
/// let mut params = BundleParams::new();
/// params
///     .set_name("Hello World")
///     .set_version("2.1")
///     .set_vendor("Acme")
///     .set_system_wide(Some(true))
///     .set_runtime(None);
/// let store = params.into_store();
/// ```
#[derive(Debug, Clone, Default)]
pub struct BundleParams {
    store: ParamStore,
}

impl BundleParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing store.
    pub fn from_store(store: ParamStore) -> Self {
        Self { store }
    }

    /// Copies every entry of `other` in, last write wins.
    pub fn add_all(&mut self, other: &ParamStore) -> &mut Self {
        self.store.extend(other);
        self
    }

    /// The backing store.
    pub fn store(&self) -> &ParamStore {
        &self.store
    }

    /// Consumes the facade and returns the store.
    pub fn into_store(self) -> ParamStore {
        self.store
    }

    fn put_text(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.store.put_unless_empty(key, value.into());
        self
    }

    fn put_flag(&mut self, key: &str, value: Option<bool>) -> &mut Self {
        self.store.put_unless_none(key, value);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.put_text(APP_NAME.id(), name)
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.put_text(VERSION.id(), version)
    }

    pub fn set_vendor(&mut self, vendor: impl Into<String>) -> &mut Self {
        self.put_text(VENDOR.id(), vendor)
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> &mut Self {
        self.put_text(IDENTIFIER.id(), identifier)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.put_text(DESCRIPTION.id(), description)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.put_text(TITLE.id(), title)
    }

    pub fn set_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.put_text(CATEGORY.id(), category)
    }

    pub fn set_copyright(&mut self, copyright: impl Into<String>) -> &mut Self {
        self.put_text(COPYRIGHT.id(), copyright)
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> &mut Self {
        self.put_text(EMAIL.id(), email)
    }

    pub fn set_license_type(&mut self, license_type: impl Into<String>) -> &mut Self {
        self.put_text(LICENSE_TYPE.id(), license_type)
    }

    /// Appends a license file, keeping the files added before it.
    pub fn add_license_file(&mut self, file: impl Into<String>) -> &mut Self {
        let mut files = LICENSE_FILE
            .fetch_from(&self.store)
            .ok()
            .flatten()
            .unwrap_or_default();
        files.push(file.into());
        self.store.insert(LICENSE_FILE.id(), files);
        self
    }

    pub fn set_system_wide(&mut self, system_wide: Option<bool>) -> &mut Self {
        self.put_flag(SYSTEM_WIDE.id(), system_wide)
    }

    pub fn set_service_hint(&mut self, service_hint: Option<bool>) -> &mut Self {
        self.put_flag(SERVICE_HINT.id(), service_hint)
    }

    pub fn set_menu_hint(&mut self, menu_hint: Option<bool>) -> &mut Self {
        self.put_flag(MENU_HINT.id(), menu_hint)
    }

    pub fn set_shortcut_hint(&mut self, shortcut_hint: Option<bool>) -> &mut Self {
        self.put_flag(SHORTCUT_HINT.id(), shortcut_hint)
    }

    pub fn set_verbose(&mut self, verbose: Option<bool>) -> &mut Self {
        self.put_flag(VERBOSE.id(), verbose)
    }

    pub fn set_src_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.store.insert(SOURCE_DIR.id(), dir.into());
        self
    }

    pub fn set_main_binary(&mut self, binary: impl Into<PathBuf>) -> &mut Self {
        self.store.insert(MAIN_BINARY.id(), binary.into());
        self
    }

    /// Sets the runtime to bundle. `None` writes an explicit null: no
    /// runtime is bundled, even when a default location exists.
    pub fn set_runtime(&mut self, runtime: Option<PathBuf>) -> &mut Self {
        self.store.insert(RUNTIME.id(), Value::from(runtime));
        self
    }

    pub fn set_app_resources_list(&mut self, sets: Vec<ResourceSet>) -> &mut Self {
        self.store.put_unless_empty(APP_RESOURCES_LIST.id(), sets);
        self
    }

    pub fn set_file_associations(&mut self, associations: Vec<ParamStore>) -> &mut Self {
        self.store.put_unless_empty(FILE_ASSOCIATIONS.id(), associations);
        self
    }

    /// Appends a secondary launcher, described by its own nested store.
    pub fn add_secondary_launcher(&mut self, launcher: ParamStore) -> &mut Self {
        let mut launchers = SECONDARY_LAUNCHERS
            .fetch_from(&self.store)
            .ok()
            .flatten()
            .unwrap_or_default();
        launchers.push(launcher);
        self.store.insert(SECONDARY_LAUNCHERS.id(), launchers);
        self
    }
}

impl From<BundleParams> for ParamStore {
    fn from(params: BundleParams) -> Self {
        params.into_store()
    }
}
