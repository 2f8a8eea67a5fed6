pub mod model;
pub mod store;

pub use model::{Settings, SettingsPatch};
pub use store::SettingsStore;
