pub mod model;
pub mod store;

pub use model::{LoaderType, Profile, ProfileUpdate, ProfilesDocument, INSTANCE_DIRS};
pub use store::{DirectoryRename, InstanceStore, ProfileUpdated};
