//! The background record producer.
//!
//! A [`Generator`] is the store's only writer. Once per tick it draws whether
//! to attach an image, stamps the local time and appends a record whose text
//! is its own `"<round> + <slot>"` position.
//!
//! [`Generator::spawn`] moves the generator onto a dedicated thread and
//! returns a [`GeneratorHandle`] for cooperative shutdown. The loop checks for
//! the shutdown signal while it waits between ticks, so it stops at most one
//! interval after [`GeneratorHandle::shutdown`] is called.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};
use crate::record::{Entry, Record};
use crate::store::CircularStore;

/// Name given to the generator thread.
const THREAD_NAME: &str = "roundlog-generator";

/// Periodic producer that appends one record per tick.
#[derive(Debug)]
pub struct Generator<R> {
    store: Arc<CircularStore>,
    config: GeneratorConfig,
    rng: R,
}

impl Generator<StdRng> {
    /// Creates a generator seeded from the operating system random source.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Entropy`] if the random source cannot be
    /// read, or [`ConfigError`](crate::error::ConfigError) if `config` is
    /// invalid.
    pub fn from_os_rng(store: Arc<CircularStore>, config: GeneratorConfig) -> Result<Self> {
        let rng = StdRng::try_from_os_rng().map_err(|e| GeneratorError::Entropy {
            reason: e.to_string(),
        })?;
        Self::new(store, config, rng)
    }
}

impl<R: Rng> Generator<R> {
    /// Creates a generator with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if `config` is invalid.
    pub fn new(store: Arc<CircularStore>, config: GeneratorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config, rng })
    }

    /// Returns the generator configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produces and appends a single record.
    pub fn tick(&mut self) -> Record {
        let draw = self.rng.random_range(0..self.config.image_draws);
        let resource_url = self.config.image_url(draw);
        let timestamp = chrono::Local::now()
            .format(&self.config.timestamp_format)
            .to_string();

        let record = self.store.append_with(|round, slot| Entry {
            timestamp,
            payload: format!("{round} + {slot}"),
            resource_url,
        });

        tracing::debug!(
            round = record.round(),
            slot = record.slot(),
            image = record.resource_url().is_some(),
            "appended record"
        );
        record
    }

    /// Ticks until `shutdown` receives a message or its sender is dropped.
    pub fn run(mut self, shutdown: &Receiver<()>) {
        tracing::info!(
            interval_ms = u64::try_from(self.config.interval.as_millis()).unwrap_or(u64::MAX),
            capacity = self.store.capacity(),
            "generator started"
        );

        loop {
            self.tick();
            match shutdown.recv_timeout(self.config.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::info!("generator stopped");
    }
}

impl<R: Rng + Send + 'static> Generator<R> {
    /// Runs the generator on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Spawn`] if the thread cannot be created.
    pub fn spawn(self) -> Result<GeneratorHandle> {
        let (shutdown, signal) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run(&signal))
            .map_err(|source| GeneratorError::Spawn { source })?;

        Ok(GeneratorHandle { shutdown, thread })
    }
}

/// Handle to a running generator thread.
///
/// Dropping the handle disconnects the shutdown channel, which also stops the
/// loop, but without waiting for the thread to exit.
#[derive(Debug)]
pub struct GeneratorHandle {
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

impl GeneratorHandle {
    /// Returns `true` once the generator thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Signals the generator to stop and waits for its thread to exit.
    pub fn shutdown(self) {
        // A send error means the loop already exited.
        let _ = self.shutdown.send(());
        if self.thread.join().is_err() {
            tracing::warn!("generator thread panicked");
        }
    }
}
