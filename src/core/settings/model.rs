use std::path::PathBuf;

use serde_json::{Map, Value};

pub const DEFAULT_MAX_MEMORY_MB: u32 = 2048;
pub const DEFAULT_WIDTH: u32 = 854;
pub const DEFAULT_HEIGHT: u32 = 480;

// Persisted key names. Kept stable so documents written by older builds load.
pub const KEY_MAX_MEMORY: &str = "max_memory";
pub const KEY_JAVA_PATH: &str = "java_path";
pub const KEY_WIDTH: &str = "width";
pub const KEY_HEIGHT: &str = "height";
pub const KEY_FULLSCREEN: &str = "fullscreen";
pub const KEY_USERNAME: &str = "username";
pub const KEY_VERSION: &str = "version";
pub const KEY_LOADER: &str = "loader";
pub const KEY_ACTIVE_PROFILE: &str = "active_profile";

const KNOWN_KEYS: [&str; 9] = [
    KEY_MAX_MEMORY,
    KEY_JAVA_PATH,
    KEY_WIDTH,
    KEY_HEIGHT,
    KEY_FULLSCREEN,
    KEY_USERNAME,
    KEY_VERSION,
    KEY_LOADER,
    KEY_ACTIVE_PROFILE,
];

/// Launcher-wide options, with defaults applied for anything missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub max_memory_mb: u32,
    pub java_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub username: String,
    pub last_version: String,
    pub last_loader: String,
    pub active_profile_id: Option<String>,
    /// Keys owned by other writers, carried through untouched.
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_memory_mb: DEFAULT_MAX_MEMORY_MB,
            java_path: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fullscreen: false,
            username: String::new(),
            last_version: String::new(),
            last_loader: String::new(),
            active_profile_id: None,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Build settings from a raw document. A field that is missing or has the
    /// wrong type falls back to its default without affecting the others.
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let defaults = Settings::default();

        let extra = doc
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            max_memory_mb: read_u32(doc, KEY_MAX_MEMORY).unwrap_or(defaults.max_memory_mb),
            java_path: read_string(doc, KEY_JAVA_PATH)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            width: read_u32(doc, KEY_WIDTH).unwrap_or(defaults.width),
            height: read_u32(doc, KEY_HEIGHT).unwrap_or(defaults.height),
            fullscreen: doc
                .get(KEY_FULLSCREEN)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.fullscreen),
            username: read_string(doc, KEY_USERNAME).unwrap_or_default(),
            last_version: read_string(doc, KEY_VERSION).unwrap_or_default(),
            last_loader: read_string(doc, KEY_LOADER).unwrap_or_default(),
            active_profile_id: read_string(doc, KEY_ACTIVE_PROFILE).filter(|id| !id.is_empty()),
            extra,
        }
    }
}

fn read_u32(doc: &Map<String, Value>, key: &str) -> Option<u32> {
    doc.get(key)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
}

fn read_string(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// A partial settings write. Only the fields that are `Some` are persisted;
/// everything else already on disk is left as it was.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub max_memory_mb: Option<u32>,
    /// `Some(None)` clears the override.
    pub java_path: Option<Option<PathBuf>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fullscreen: Option<bool>,
    pub username: Option<String>,
    pub last_version: Option<String>,
    pub last_loader: Option<String>,
    pub active_profile_id: Option<String>,
    pub extra: Map<String, Value>,
}

impl SettingsPatch {
    /// Set an arbitrary key, for options this crate does not model.
    pub fn with_raw(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Overlay this patch onto a raw document.
    pub fn apply_to(&self, doc: &mut Map<String, Value>) {
        for (key, value) in self.fields() {
            doc.insert(key, value);
        }
    }

    fn fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();

        if let Some(max_memory) = self.max_memory_mb {
            fields.insert(KEY_MAX_MEMORY.into(), max_memory.into());
        }
        if let Some(java_path) = &self.java_path {
            let value = match java_path {
                Some(path) => Value::String(path.to_string_lossy().into_owned()),
                None => Value::Null,
            };
            fields.insert(KEY_JAVA_PATH.into(), value);
        }
        if let Some(width) = self.width {
            fields.insert(KEY_WIDTH.into(), width.into());
        }
        if let Some(height) = self.height {
            fields.insert(KEY_HEIGHT.into(), height.into());
        }
        if let Some(fullscreen) = self.fullscreen {
            fields.insert(KEY_FULLSCREEN.into(), fullscreen.into());
        }
        if let Some(username) = &self.username {
            fields.insert(KEY_USERNAME.into(), username.clone().into());
        }
        if let Some(version) = &self.last_version {
            fields.insert(KEY_VERSION.into(), version.clone().into());
        }
        if let Some(loader) = &self.last_loader {
            fields.insert(KEY_LOADER.into(), loader.clone().into());
        }
        if let Some(active) = &self.active_profile_id {
            fields.insert(KEY_ACTIVE_PROFILE.into(), active.clone().into());
        }

        fields
    }
}
