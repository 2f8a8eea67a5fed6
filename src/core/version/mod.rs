pub mod resolver;

pub use resolver::{find_loader_variant, ResolveState, ResolveTrace, VersionResolver};
