// Run orchestration: login, descriptor, artifact, viewer, in that order.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::{ArtifactCache, CacheStatus};
use super::supervisor::{SupervisedProcess, SupervisionOutcome};
use crate::bmc::BmcClient;
use crate::config::LaunchConfig;
use crate::descriptor::Descriptor;
use crate::error::{LaunchError, Result};

/// Pipeline position. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Init,
    Authenticated,
    DescriptorReady,
    ArtifactReady,
    Running,
    Terminated,
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub descriptor: Descriptor,
    pub cache: CacheStatus,
    pub outcome: SupervisionOutcome,
    /// Last text the viewer wrote before supervision ended.
    pub last_output: Option<String>,
}

pub struct Launcher {
    config: LaunchConfig,
    state: RunState,
}

impl Launcher {
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            config,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(next > self.state, "run state moved backwards");
        debug!("run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the whole pipeline, then supervise the viewer until it exits or
    /// `cancel` fires.
    ///
    /// A shutdown before the viewer is spawned yields
    /// [`LaunchError::Interrupted`]. Viewer failures after spawn are only
    /// reported in the returned [`RunReport`].
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunReport> {
        let client = BmcClient::new(&self.config)?;

        let session = until_cancelled(
            cancel,
            client.authenticate(&self.config.username, &self.config.password),
        )
        .await?;
        self.advance(RunState::Authenticated);

        let raw = until_cancelled(cancel, client.fetch_descriptor(&session)).await?;
        let descriptor = Descriptor::parse(&raw)?;
        self.advance(RunState::DescriptorReady);

        let cache = ArtifactCache::new(client.http().clone(), &self.config.viewer_file);
        let cache_status = cache
            .ensure_artifact(&descriptor, self.config.force_download, cancel)
            .await?;
        self.advance(RunState::ArtifactReady);

        if cancel.is_cancelled() {
            return Err(LaunchError::Interrupted);
        }
        let mut process = SupervisedProcess::start(
            &self.config.java,
            cache.path(),
            &descriptor.launch_arguments,
        )?;
        self.advance(RunState::Running);

        let outcome = process.supervise(cancel).await;
        self.advance(RunState::Terminated);

        Ok(RunReport {
            descriptor,
            cache: cache_status,
            outcome,
            last_output: process.last_output(),
        })
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        res = fut => res,
        _ = cancel.cancelled() => Err(LaunchError::Interrupted),
    }
}

/// Resolve once SIGINT or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Cancel `token` when a shutdown signal arrives.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        token.cancel();
    })
}
