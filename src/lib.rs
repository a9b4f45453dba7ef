//! Bit-accurate write-flip accounting for a cycle-accurate DRAM/PCRAM memory
//! simulator's top-level memory facade.
//!
//! The core of this crate is the write-flip accounting pipeline run on every
//! write: [`bdi`] compresses the new cacheline with Base-Delta-Immediate
//! search, [`flip`] tallies how many bits and columns actually changed, and
//! [`policy`] decides which of those tallies gets attributed to the
//! `CompressUpdateBit` global counter. [`system::MemorySystem`] wires this
//! together with a decoder, per-channel controllers, a prefetcher, and a
//! pre-translation trace writer into a runnable facade.
//!
//! No actual compressed line is ever stored — the codec exists only to
//! derive a size — and no timing or energy model is modeled here; this crate
//! produces the per-write flip counters an embedding simulator would use to
//! compute energy.

pub mod bdi;
pub mod config;
pub mod controller;
pub mod datasize;
pub mod decoder;
pub mod diag;
pub mod error;
pub mod flip;
pub mod policy;
pub mod prefetcher;
pub mod request;
pub mod stats;
pub mod system;
pub mod tracewriter;

pub use bdi::{BdiCandidate, BdiResult};
pub use config::MemoryConfig;
pub use controller::{MemoryController, OpenRowController};
pub use datasize::data_bytes;
pub use decoder::{Decoder, StripedDecoder};
pub use error::{ConfigError, FailReason};
pub use flip::FlipReport;
pub use prefetcher::{NextLinePrefetcher, PrefetchBuffer, Prefetcher};
pub use request::{Coordinate, MemoryRequest, RequestType};
pub use stats::GlobalCounters;
pub use system::MemorySystem;
pub use tracewriter::{NvtTraceWriter, TraceLine, TraceWriter};
