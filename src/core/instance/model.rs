use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Subdirectories every instance directory carries.
pub const INSTANCE_DIRS: [&str; 6] = [
    "mods",
    "config",
    "saves",
    "resourcepacks",
    "shaderpacks",
    "logs",
];

/// Supported mod loaders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LoaderType {
    Vanilla,
    Fabric,
    Forge,
    Quilt,
    NeoForge,
}

impl LoaderType {
    /// Lowercase name as it appears inside installed version ids
    /// (e.g. `fabric-loader-0.16.10-1.21.4`).
    pub fn slug(&self) -> &'static str {
        match self {
            LoaderType::Vanilla => "vanilla",
            LoaderType::Fabric => "fabric",
            LoaderType::Forge => "forge",
            LoaderType::Quilt => "quilt",
            LoaderType::NeoForge => "neoforge",
        }
    }

    pub fn is_modded(&self) -> bool {
        !matches!(self, LoaderType::Vanilla)
    }
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "Vanilla"),
            LoaderType::Fabric => write!(f, "Fabric"),
            LoaderType::Forge => write!(f, "Forge"),
            LoaderType::Quilt => write!(f, "Quilt"),
            LoaderType::NeoForge => write!(f, "NeoForge"),
        }
    }
}

impl std::str::FromStr for LoaderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(LoaderType::Vanilla),
            "fabric" => Ok(LoaderType::Fabric),
            "forge" => Ok(LoaderType::Forge),
            "quilt" => Ok(LoaderType::Quilt),
            "neoforge" => Ok(LoaderType::NeoForge),
            other => Err(format!("unknown loader: {other}")),
        }
    }
}

/// A named game setup: version, loader and a private instance directory
/// under `<game root>/versions/<sanitized name>/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub version: String,
    pub loader: LoaderType,
    pub color: String,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: String, version: String, loader: LoaderType, color: String) -> Self {
        Self {
            id: new_profile_id(),
            name,
            version,
            loader,
            color,
            created_at: Utc::now(),
        }
    }

    /// Name of the instance directory derived from the current profile name.
    pub fn dir_name(&self) -> String {
        sanitize_dir_name(&self.name)
    }
}

/// Mutable profile fields. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub version: Option<String>,
    pub loader: Option<LoaderType>,
    pub color: Option<String>,
}

/// On-disk shape of `profiles.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesDocument {
    #[serde(default)]
    pub active_profile_id: Option<String>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// Read a profile timestamp. RFC 3339 is preferred; older files carry a
/// naive local timestamp (`2025-01-05T12:34:56.123456`).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    let utc = match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    };
    Some(utc)
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid created_at: {raw}")))
}

/// 8-character id taken from a random UUID. Collisions are not checked.
pub fn new_profile_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Turn a profile name into a directory name: trim, replace characters that
/// are invalid in file names with `_`, fall back to `Profile` when empty.
pub fn sanitize_dir_name(name: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let safe: String = name
        .trim()
        .chars()
        .map(|c| if INVALID.contains(&c) { '_' } else { c })
        .collect();

    if safe.is_empty() {
        "Profile".to_string()
    } else {
        safe
    }
}
