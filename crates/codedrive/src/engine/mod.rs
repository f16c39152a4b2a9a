//! Long-running orchestrators and the entry points that wire them up.
//!
//! Each entry point loads a config file, binds the mirror repository and
//! runs until the given [`Shutdown`] fires or a step fails. Failures are
//! returned, never retried.

pub mod downloader;
pub mod mirror;
pub mod shutdown;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testing;

pub use downloader::{sync_consumer, Downloader, DownloaderState, SyncStats};
pub use mirror::{copy_baseline, run_mirror};
pub use shutdown::Shutdown;
pub use uploader::{Uploader, UploaderState};

use std::path::Path;

use log::info;

use crate::config::{load_config, SyncConfig};
use crate::error::{Result, SyncError};
use crate::vcs::GitRepository;

/// Runs blocking filesystem or git work off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::Task(e.to_string()))?
}

fn bind_repository(config: &SyncConfig) -> Result<GitRepository> {
    let repo = GitRepository::from_config(config);
    repo.ensure_repository()?;
    Ok(repo)
}

/// Source tree → mirror → remote.
pub async fn upload(config_path: &Path, shutdown: Shutdown) -> Result<()> {
    let config = load_config(config_path)?;
    let repo = bind_repository(&config)?;
    info!("Starting upload: {}", config.path_in.display());
    Uploader::new(config, repo).run(shutdown).await
}

/// Remote → mirror → consumer tree.
pub async fn download(config_path: &Path, shutdown: Shutdown) -> Result<()> {
    let config = load_config(config_path)?;
    let repo = bind_repository(&config)?;
    info!("Starting download: {}", config.path_in.display());
    Downloader::new(config, repo).run(shutdown).await
}

/// Source tree → target tree, no version control involved.
pub async fn mirror(config_path: &Path, shutdown: Shutdown) -> Result<()> {
    let config = load_config(config_path)?;
    info!(
        "Starting mirror: {} -> {}",
        config.path_in.display(),
        config.path_out.display()
    );
    run_mirror(&config, shutdown).await
}
