pub mod entry;
pub mod error;
pub mod namespace;
pub mod path;
pub mod protocol;
pub mod search;
pub mod server;
pub mod transport;
pub mod tree;

pub use entry::EntryKind;
pub use error::FsError;
pub use namespace::{MetricsResult, Namespace, StatResult};
pub use path::FsLimits;
