// Artifact cache: keeps the viewer JAR on disk and downloads it when missing.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::stats::DownloadStats;
use crate::descriptor::Descriptor;
use crate::error::{LaunchError, Result};

/// Outcome of [`ArtifactCache::ensure_artifact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The file was already present; nothing was fetched.
    Hit,
    /// The file was (re)downloaded.
    Downloaded { bytes: u64 },
}

pub struct ArtifactCache {
    client: Client,
    path: PathBuf,
}

impl ArtifactCache {
    pub fn new(client: Client, path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the viewer JAR exists locally.
    ///
    /// An existing file is reused unless `force_download` is set, in which
    /// case it is removed and fetched again. A failed or cancelled download
    /// never leaves a partial file behind.
    pub async fn ensure_artifact(
        &self,
        descriptor: &Descriptor,
        force_download: bool,
        cancel: &CancellationToken,
    ) -> Result<CacheStatus> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| LaunchError::io("Checking", &self.path, e))?;

        if exists && !force_download {
            info!("Viewer file already exists, we do not need to download it again");
            return Ok(CacheStatus::Hit);
        }

        if exists {
            info!("Removing old viewer file before downloading it again");
            fs::remove_file(&self.path)
                .await
                .map_err(|e| LaunchError::io("Removing", &self.path, e))?;
        }

        let url = descriptor.artifact_url();
        info!("Downloading viewer file...");

        let result = tokio::select! {
            res = self.download(&url) => res,
            _ = cancel.cancelled() => Err(LaunchError::Interrupted),
        };

        match result {
            Ok(bytes) => Ok(CacheStatus::Downloaded { bytes }),
            Err(e) => {
                self.discard_partial().await;
                Err(e)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<u64> {
        let transport = |source| LaunchError::Transport {
            what: "Viewer download",
            url: url.to_string(),
            source,
        };

        let mut resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            warn!("viewer download failed status={}", status.as_u16());
            return Err(LaunchError::HttpStatus {
                what: "Viewer download",
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = File::create(&self.path)
            .await
            .map_err(|e| LaunchError::io("Creating", &self.path, e))?;
        let stats = DownloadStats::new();

        while let Some(chunk) = resp.chunk().await.map_err(transport)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| LaunchError::io("Writing", &self.path, e))?;
            stats.record_written(chunk.len() as u64);
        }
        file.flush()
            .await
            .map_err(|e| LaunchError::io("Writing", &self.path, e))?;
        file.sync_all()
            .await
            .map_err(|e| LaunchError::io("Syncing", &self.path, e))?;

        let snap = stats.snapshot();
        info!(
            "Done! {} bytes in {} ms ({} B/s)",
            snap.bytes,
            snap.elapsed.as_millis(),
            snap.bytes_per_sec
        );
        Ok(snap.bytes)
    }

    /// Best-effort removal of a partially written artifact.
    async fn discard_partial(&self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!("removed partial viewer file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "could not remove partial viewer file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
