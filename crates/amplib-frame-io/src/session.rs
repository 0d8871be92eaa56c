//! Per-handle device session: engine, status cache, and decoder together.
//!
//! A [`Session`] is what a backend's amplifier handle locks for the
//! duration of each public operation. It provides cached status reads,
//! acknowledged commands, and the two flavours of convergence (toggle
//! command, control-line pulse) on top of the transaction engine.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use amplib_core::error::{Error, Result};
use async_trait::async_trait;
use tokio::time::Instant;

use crate::cache::StatusCache;
use crate::codec::Command;
use crate::converge::{converge, ConvergeRequest, ToggleControl};
use crate::engine::{LinePulse, TransactionEngine};
use crate::fields::StatusDecoder;

pub struct Session<D: StatusDecoder> {
    engine: TransactionEngine,
    cache: StatusCache<D::Snapshot>,
    decoder: D,
    status_command: Command,
    status_retries: u32,
}

impl<D: StatusDecoder> Session<D> {
    /// `status_retries` is how many extra attempts a status read gets after
    /// a protocol error; timeouts and transport errors are never retried.
    pub fn new(
        engine: TransactionEngine,
        decoder: D,
        status_command: Command,
        cache_ttl: Duration,
        status_retries: u32,
    ) -> Self {
        Session {
            engine,
            cache: StatusCache::new(cache_ttl),
            decoder,
            status_command,
            status_retries,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    pub fn set_cache_ttl(&mut self, ttl: Duration) {
        tracing::debug!(ttl_ms = ttl.as_millis(), "Status cache TTL changed");
        self.cache.set_ttl(ttl);
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The last stored snapshot, however old.
    pub fn cached(&self) -> Option<Arc<D::Snapshot>> {
        self.cache.entry().map(|entry| Arc::clone(&entry.snapshot))
    }

    pub fn engine(&self) -> &TransactionEngine {
        &self.engine
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.engine.set_command_timeout(timeout);
    }

    /// Current device status.
    ///
    /// With `use_cache` a snapshot younger than the TTL is returned without
    /// touching the transport. A fresh read replaces the cache entry on
    /// success; on failure the previous entry is left as it was.
    pub async fn get_status(&mut self, use_cache: bool) -> Result<Arc<D::Snapshot>> {
        if use_cache {
            if let Some(snapshot) = self.cache.fresh(Instant::now()) {
                tracing::trace!("Status served from cache");
                return Ok(snapshot);
            }
        }

        let snapshot = Arc::new(self.read_status().await?);
        self.cache.store(Arc::clone(&snapshot), Instant::now());
        Ok(snapshot)
    }

    async fn read_status(&mut self) -> Result<D::Snapshot> {
        let mut attempt = 0u32;
        loop {
            let result = match self.engine.transact(&self.status_command, true).await {
                Ok(payload) => self.decoder.decode(&payload),
                Err(e) => Err(e),
            };
            match result {
                Err(e @ Error::Protocol(_)) if attempt < self.status_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "Status read garbled, retrying");
                }
                other => return other,
            }
        }
    }

    /// Send a command that is answered with an acknowledgement.
    ///
    /// The status cache is cleared first, since the command may change
    /// device state even if its acknowledgement is lost.
    pub async fn command(&mut self, command: &Command) -> Result<()> {
        self.cache.clear();
        self.engine.transact(command, false).await.map(|_| ())
    }

    /// Converge a status value by sending toggle commands.
    ///
    /// `project` extracts the controlled value from a snapshot; `toggle`
    /// builds the command for one step given the observed and desired
    /// values.
    pub async fn converge<T, P, F>(
        &mut self,
        request: &ConvergeRequest<T>,
        project: P,
        toggle: F,
    ) -> Result<u32>
    where
        T: PartialEq + fmt::Display + Send + Sync,
        P: Fn(&D::Snapshot) -> T + Send + Sync,
        F: Fn(&T, &T) -> Command + Send + Sync,
    {
        let mut control = CommandToggle {
            session: self,
            project,
            toggle,
        };
        converge(&mut control, request).await
    }

    /// Converge a status value by pulsing a control line, counting a status
    /// timeout as observing `silent`.
    ///
    /// This is how a device that is switched off (and so cannot answer) is
    /// brought up. Fails with [`Error::Unsupported`] before any traffic if
    /// the transport has no control lines.
    pub async fn converge_with_pulse<T, P>(
        &mut self,
        request: &ConvergeRequest<T>,
        project: P,
        silent: T,
        pulse: LinePulse,
    ) -> Result<u32>
    where
        T: PartialEq + Clone + fmt::Display + Send + Sync,
        P: Fn(&D::Snapshot) -> T + Send + Sync,
    {
        if !self.engine.has_control_lines() {
            return Err(Error::Unsupported(format!(
                "{} needs a {} control line, which this transport lacks",
                request.operation, pulse.line
            )));
        }
        let mut control = PulseToggle {
            session: self,
            project,
            silent,
            pulse,
        };
        converge(&mut control, request).await
    }

    /// Close the transport and drop any cached status.
    pub async fn close(&mut self) -> Result<()> {
        self.cache.clear();
        self.engine.close().await
    }
}

struct CommandToggle<'a, D: StatusDecoder, P, F> {
    session: &'a mut Session<D>,
    project: P,
    toggle: F,
}

#[async_trait]
impl<'a, D, T, P, F> ToggleControl<T> for CommandToggle<'a, D, P, F>
where
    D: StatusDecoder,
    T: Send + Sync,
    P: Fn(&D::Snapshot) -> T + Send + Sync,
    F: Fn(&T, &T) -> Command + Send + Sync,
{
    async fn observe(&mut self) -> Result<T> {
        let status = self.session.get_status(false).await?;
        Ok((self.project)(&status))
    }

    async fn advance(&mut self, observed: &T, desired: &T) -> Result<()> {
        let command = (self.toggle)(observed, desired);
        self.session.command(&command).await
    }
}

struct PulseToggle<'a, D: StatusDecoder, P, T> {
    session: &'a mut Session<D>,
    project: P,
    silent: T,
    pulse: LinePulse,
}

#[async_trait]
impl<'a, D, T, P> ToggleControl<T> for PulseToggle<'a, D, P, T>
where
    D: StatusDecoder,
    T: Clone + Send + Sync,
    P: Fn(&D::Snapshot) -> T + Send + Sync,
{
    async fn observe(&mut self) -> Result<T> {
        match self.session.get_status(false).await {
            Ok(status) => Ok((self.project)(&status)),
            Err(Error::Timeout) => Ok(self.silent.clone()),
            Err(e) => Err(e),
        }
    }

    async fn advance(&mut self, _observed: &T, _desired: &T) -> Result<()> {
        self.session.clear_cache();
        self.session.engine.pulse_line(&self.pulse).await
    }
}
