//! # roundlog
//!
//! Fixed-capacity circular record store with round-aware range queries.
//!
//! roundlog keeps the most recent `capacity` records of a continuous stream in
//! a preallocated slot array. Every time the write cursor wraps back to slot 0
//! a "round" counter advances. Readers poll with the `(round, slot)` of the
//! last record they saw and get everything written since, as long as it is
//! still in the current round.
//!
//! ## Key Properties
//!
//! - Bounded memory: the slot array is sized once at startup and never grows
//! - Single writer, many concurrent readers, one coarse lock
//! - Stale readers degrade gracefully to a full dump of the current round
//! - Readers ahead of the store, or past the cursor, get a typed error
//! - No persistence: overwritten slots are gone
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use roundlog::{CircularStore, Generator, GeneratorConfig, StoreConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 100 slots per round
//! let store = Arc::new(CircularStore::new(StoreConfig::new(100)?)?);
//!
//! // One record per second on a background thread
//! let config = GeneratorConfig::with_interval(Duration::from_secs(1))?;
//! let generator = Generator::from_os_rng(Arc::clone(&store), config)?.spawn()?;
//!
//! std::thread::sleep(Duration::from_secs(3));
//!
//! // Everything from slot 0 of round 1
//! for record in store.query(1, 0)? {
//!     println!("{} {} {}", record.slot(), record.timestamp(), record.payload());
//! }
//!
//! generator.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`CircularStore`]: Slot array, cursor and round behind one mutex
//! - [`Record`]: Immutable entry stamped with its round and slot
//! - [`Generator`]: The single writer, one record per tick
//! - [`GeneratorHandle`]: Cooperative shutdown for the generator thread
//!
//! ## Modules
//!
//! - [`store`]: Append and query
//! - [`record`]: Record and entry types
//! - [`generator`]: Background producer
//! - [`config`]: Store and generator configuration
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod generator;
pub mod record;
pub mod store;

// Re-export primary API types at crate root for convenience.
pub use config::{GeneratorConfig, StoreConfig};
pub use error::{ConfigError, GeneratorError, QueryError, Result, RoundlogError};
pub use generator::{Generator, GeneratorHandle};
pub use record::{Entry, Record};
pub use store::{CircularStore, Position};
