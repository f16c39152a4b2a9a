//! Keeps a working directory and a remote git repository in step through a
//! local mirror clone.
//!
//! Upload watches the working directory, replays matching changes into the
//! mirror and pushes it periodically. Download polls the remote, pulls and
//! copies changed files back out.

pub mod config;
pub mod engine;
pub mod error;
pub mod sync;
pub mod vcs;

pub use config::{load_config, SyncConfig, SyncRoots};
pub use engine::{download, mirror, upload, Downloader, Shutdown, Uploader};
pub use error::{ConfigError, FsError, PathScopeError, Result, SyncError};
pub use vcs::{GitRepository, Repository, VcsError};
