//! Session registry and fleet-wide fan-out
//!
//! The registry keeps one session per host in a concurrent map. Each
//! session sits behind its own async mutex, so two calls touching the
//! same host take turns while different hosts proceed in parallel. Map
//! guards are never held across an await point.
//!
//! Every fleet-wide call spawns one task per job on a [`JoinSet`], joins
//! all of them and folds the outcomes into a fresh [`FleetResult`]. A
//! failing host never cancels its siblings.

mod jobs;
mod result;

pub use jobs::{CommandJob, ConnectRequest, PullJob, PushJob};
pub use result::FleetResult;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use fl_core::config::{CaptureMode, FleetConfig, Settings};
use fl_core::error::SessionError;
use fl_core::traits::Transport;
use fl_core::HostId;

use crate::session::Session;

/// Session shared between the registry and the task driving it
pub type SharedSession<C> = Arc<Mutex<Session<C>>>;

/// Live sessions keyed by host
///
/// Cloning is cheap and yields a handle onto the same sessions; the
/// configuration is copied on write, so [`set_settings`] only affects the
/// handle it is called on.
///
/// [`set_settings`]: SessionRegistry::set_settings
pub struct SessionRegistry<T: Transport> {
    transport: Arc<T>,
    config: Arc<FleetConfig>,
    sessions: Arc<DashMap<HostId, SharedSession<T::Conn>>>,
}

impl<T: Transport> Clone for SessionRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<T: Transport> SessionRegistry<T> {
    /// Create an empty registry
    pub fn new(transport: T, config: FleetConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn settings(&self) -> Settings {
        self.config.settings
    }

    /// Replace the behaviour toggles used by later calls
    pub fn set_settings(&mut self, settings: Settings) {
        Arc::make_mut(&mut self.config).settings = settings;
    }

    /// Look up the session for a host
    pub fn get(&self, host: &HostId) -> Result<SharedSession<T::Conn>, SessionError> {
        self.sessions
            .get(host)
            .map(|r| Arc::clone(&r))
            .ok_or_else(|| SessionError::NotFound(host.to_string()))
    }

    /// Registered hosts, in no particular order
    pub fn hosts(&self) -> Vec<HostId> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Connect one host and register its session
    ///
    /// A host that is already registered is rejected before any network
    /// traffic. Nothing is registered when the connection fails.
    pub async fn connect(&self, request: ConnectRequest) -> Result<(), SessionError> {
        let host = request.host;
        if self.sessions.contains_key(&host) {
            warn!("{} is already connected", host);
            return Err(SessionError::AlreadyExists(host.to_string()));
        }

        let mut session = Session::new(host.clone(), request.user, request.password);
        session.connect(self.transport.as_ref(), &self.config).await?;

        let shared = Arc::new(Mutex::new(session));
        let raced = match self.sessions.entry(host.clone()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&shared));
                false
            }
        };
        if raced {
            warn!("{} was connected concurrently, dropping duplicate", host);
            shared.lock().await.disconnect().await;
            return Err(SessionError::AlreadyExists(host.to_string()));
        }
        Ok(())
    }

    /// Remove one host's session and close its connection
    pub async fn disconnect(&self, host: &HostId) -> Result<(), SessionError> {
        let (_, shared) = self
            .sessions
            .remove(host)
            .ok_or_else(|| SessionError::NotFound(host.to_string()))?;
        shared.lock().await.disconnect().await;
        Ok(())
    }

    /// Disconnect and forget every session
    pub async fn shutdown(&self) {
        let hosts = self.hosts();
        info!("Shutting down {} session(s)", hosts.len());
        for host in hosts {
            if let Some((_, shared)) = self.sessions.remove(&host) {
                shared.lock().await.disconnect().await;
            }
        }
    }

    /// Connect every host in parallel
    pub async fn connect_all(&self, requests: &[ConnectRequest]) -> bool {
        self.fan_out("connect", requests, |registry, request: ConnectRequest| async move {
            let host = request.host.clone();
            (host, registry.connect(request).await)
        })
        .await
        .succeeded()
    }

    /// Connect every host with one shared password and the default user
    pub async fn connect_all_with_password(&self, hosts: &[HostId], password: &str) -> bool {
        let requests: Vec<ConnectRequest> = hosts
            .iter()
            .map(|host| ConnectRequest::new(host.clone(), password))
            .collect();
        self.connect_all(&requests).await
    }

    /// Connect every host in parallel, reporting each outcome at the request's index
    pub async fn connect_results(&self, requests: &[ConnectRequest]) -> Vec<bool> {
        let mut results = vec![false; requests.len()];
        let mut tasks = JoinSet::new();

        for (index, request) in requests.iter().enumerate() {
            let registry = self.clone();
            let request = request.clone();
            tasks.spawn(async move { (index, registry.connect(request).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(()))) => results[index] = true,
                Ok((index, Err(e))) => {
                    error!("Failed to connect to {}: {}", requests[index].host, e)
                }
                Err(e) => error!("Connect task did not complete: {}", e),
            }
        }
        results
    }

    /// Run commands in parallel and collect each host's captured output
    ///
    /// Returns `(host, chunks)` in job order when every host succeeded,
    /// and nothing at all otherwise. Chunks are only filled in when
    /// memory capture is enabled.
    pub async fn execute(&self, jobs: &[CommandJob]) -> Vec<(HostId, Vec<Bytes>)> {
        if jobs.is_empty() {
            debug!("No hosts to execute on");
            return Vec::new();
        }

        for job in jobs {
            if let Ok(shared) = self.get(&job.host) {
                shared.lock().await.clear_output();
            }
        }

        let capture = self.config.capture_mode();
        let result = self
            .fan_out("execute", jobs, move |registry, job: CommandJob| {
                let capture = capture.clone();
                async move {
                    let outcome = registry.execute_one(&job, &capture).await;
                    (job.host, outcome)
                }
            })
            .await;

        if !result.succeeded() {
            return Vec::new();
        }

        let mut outputs = Vec::with_capacity(jobs.len());
        for job in jobs {
            let chunks = match self.get(&job.host) {
                Ok(shared) => {
                    let session = shared.lock().await;
                    session.output().to_vec()
                }
                Err(_) => Vec::new(),
            };
            outputs.push((job.host.clone(), chunks));
        }
        outputs
    }

    /// Push files to every host in parallel
    pub async fn push(&self, jobs: &[PushJob]) -> bool {
        self.fan_out("push", jobs, |registry, job: PushJob| async move {
            let outcome = registry.push_one(&job).await;
            (job.host, outcome)
        })
        .await
        .succeeded()
    }

    /// Pull files from every host in parallel
    pub async fn pull(&self, jobs: &[PullJob]) -> bool {
        self.fan_out("pull", jobs, |registry, job: PullJob| async move {
            let outcome = registry.pull_one(&job).await;
            (job.host, outcome)
        })
        .await
        .succeeded()
    }

    async fn execute_one(&self, job: &CommandJob, capture: &CaptureMode) -> Result<(), SessionError> {
        let shared = self.get(&job.host)?;
        let mut session = shared.lock().await;
        session.execute(&job.command, capture).await?;
        Ok(())
    }

    async fn push_one(&self, job: &PushJob) -> Result<(), SessionError> {
        let shared = self.get(&job.host)?;
        let mut session = shared.lock().await;
        session
            .push(&job.sources, &job.destination, job.overwrite)
            .await?;
        Ok(())
    }

    async fn pull_one(&self, job: &PullJob) -> Result<(), SessionError> {
        let shared = self.get(&job.host)?;
        let mut session = shared.lock().await;
        if self.config.settings.exact_pull_filename {
            let dir = job
                .destination
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            session.pull(&job.source, dir, Some(&job.destination)).await?;
        } else {
            session.pull(&job.source, &job.destination, None).await?;
        }
        Ok(())
    }

    /// Spawn one task per job, join them all and fold the outcomes
    ///
    /// An empty job list fails without spawning anything.
    async fn fan_out<J, F, Fut>(&self, operation: &str, jobs: &[J], run: F) -> FleetResult
    where
        J: Clone + Send + 'static,
        F: Fn(Self, J) -> Fut,
        Fut: Future<Output = (HostId, Result<(), SessionError>)> + Send + 'static,
    {
        let mut result = FleetResult::new();
        if jobs.is_empty() {
            debug!("No hosts to {}", operation);
            result.fail();
            return result;
        }

        let mut tasks = JoinSet::new();
        for job in jobs {
            tasks.spawn(run(self.clone(), job.clone()));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((host, Ok(()))) => result.record(&host, true),
                Ok((host, Err(e))) => {
                    error!("Failed to {} on {}: {}", operation, host, e);
                    result.record(&host, false);
                }
                Err(e) => {
                    error!("{} task did not complete: {}", operation, e);
                    result.fail();
                }
            }
        }

        if !result.succeeded() {
            warn!(
                "{} failed on {} of {} host(s)",
                operation,
                result.failed_hosts().len(),
                jobs.len()
            );
        }
        result
    }
}
