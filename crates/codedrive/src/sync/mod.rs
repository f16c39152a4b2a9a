//! Tree-level sync primitives shared by the upload and download sides.

pub mod convert;
pub mod digest;
pub mod file_ops;
pub mod lock;
pub mod matcher;
pub mod router;
pub mod scan;
pub mod watcher;

pub use convert::{convert_path, PathConverter};
pub use digest::{should_copy, FileDigest};
pub use file_ops::{copy_path, delete_path};
pub use lock::MirrorLock;
pub use matcher::PathMatcher;
pub use router::{ChangeEvent, EventRouter, RouteOutcome};
pub use scan::matching_entries;
pub use watcher::WatchHandle;
