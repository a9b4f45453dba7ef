//! The top-level memory facade: translates addresses, dispatches requests to
//! per-channel controllers, runs the write-flip accounting pipeline, and
//! drives the prefetcher and pre-translation trace writer.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::Context;

use crate::bdi;
use crate::config::MemoryConfig;
use crate::controller::{MemoryController, OpenRowController};
use crate::decoder::{Decoder, StripedDecoder};
use crate::error::FailReason;
use crate::flip::{analyze, xor_line};
use crate::policy;
use crate::prefetcher::{NextLinePrefetcher, PrefetchBuffer, Prefetcher};
use crate::request::{Coordinate, MemoryRequest, RequestType};
use crate::stats::GlobalCounters;
use crate::tracewriter::{NvtTraceWriter, TraceLine, TraceWriter};

/// Owns every piece of per-process state: channel configuration, collaborator
/// instances, the pending-request queue, and the global counters.
///
/// Single-threaded, event-driven discipline (see the crate's concurrency
/// notes): every method is an ordinary `&mut self` call, non-blocking, with
/// no suspension points and no interior mutability in the counters.
pub struct MemorySystem {
    config: Option<MemoryConfig>,
    decoder: Option<Box<dyn Decoder>>,
    controllers: Vec<Box<dyn MemoryController>>,
    prefetcher: Option<Box<dyn Prefetcher>>,
    prefetch_buffer: PrefetchBuffer,
    trace_writer: Option<Box<dyn TraceWriter>>,
    pending_requests: VecDeque<MemoryRequest>,
    counters: GlobalCounters,
    cycle: u64,
}

impl Default for MemorySystem {
    fn default() -> Self {
        MemorySystem {
            config: None,
            decoder: None,
            controllers: Vec::new(),
            prefetcher: None,
            prefetch_buffer: PrefetchBuffer::new(0),
            trace_writer: None,
            pending_requests: VecDeque::new(),
            counters: GlobalCounters::new(),
            cycle: 0,
        }
    }
}

impl MemorySystem {
    /// An unconfigured facade: every `is_issuable`/`issue_command` call fails
    /// without touching any counter until [`Self::configure`] runs.
    pub fn new() -> Self {
        MemorySystem::default()
    }

    /// Builds the collaborator set (decoder, one controller per channel,
    /// prefetcher, trace writer) from `config` and adopts it.
    pub fn configure(&mut self, config: MemoryConfig) {
        self.decoder = Some(Box::new(StripedDecoder::new(&config)));
        self.controllers = (0..config.channels.max(1))
            .map(|_| Box::new(OpenRowController::new()) as Box<dyn MemoryController>)
            .collect();
        self.prefetcher =
            if config.memory_prefetcher != "none" { Some(Box::new(NextLinePrefetcher)) } else { None };
        self.prefetch_buffer = PrefetchBuffer::new(config.prefetch_buffer_size);
        self.trace_writer = if config.print_pre_trace || config.echo_pre_trace {
            config.pre_trace_file.as_ref().and_then(|path| NvtTraceWriter::create(path).ok()).map(
                |writer| Box::new(writer) as Box<dyn TraceWriter>,
            )
        } else {
            None
        };
        self.config = Some(config);
    }

    /// Loads a [`MemoryConfig`] from `path` and configures a fresh facade.
    /// The only place `anyhow` appears in this crate: outer
    /// facade-construction glue, not the accounting core.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = MemoryConfig::from_path(path.as_ref())
            .with_context(|| format!("loading memory configuration from {}", path.as_ref().display()))?;
        let mut system = MemorySystem::new();
        system.configure(config);
        Ok(system)
    }

    pub fn config(&self) -> Option<&MemoryConfig> {
        self.config.as_ref()
    }

    pub fn counters(&self) -> &GlobalCounters {
        &self.counters
    }

    /// The coordinate as `IsIssuable`'s call order would produce it: bank and
    /// rank swapped relative to [`Self::translate_issue_order`]. Reproduces
    /// the reference simulator's `Translate` argument-order inconsistency
    /// rather than silently unifying it.
    fn translate_is_issuable_order(&self, addr: u64) -> Coordinate {
        let mut coord = self.decoder.as_ref().expect("configured").translate(addr);
        std::mem::swap(&mut coord.bank, &mut coord.rank);
        coord
    }

    /// The coordinate as `IssueCommand`/`IssueAtomic`/`GeneratePrefetches`
    /// read it: bank and rank in the decoder's own order.
    fn translate_issue_order(&self, addr: u64) -> Coordinate {
        self.decoder.as_ref().expect("configured").translate(addr)
    }

    /// May the channel controller accept this request right now?
    pub fn is_issuable(&self, request: &MemoryRequest) -> (bool, Option<FailReason>) {
        if self.config.is_none() {
            crate::displaylevel!(1, "memory system not configured, rejecting request at {:#x}", request.address);
            return (false, Some(FailReason::Unconfigured));
        }
        let coord = self.translate_is_issuable_order(request.address);
        let channel = coord.channel as usize;
        let controller = match self.controllers.get(channel) {
            Some(controller) => controller,
            None => return (false, Some(FailReason::ChannelBusy)),
        };
        let mut probe = request.clone();
        probe.translated = Some(coord);
        controller.is_issuable(&probe)
    }

    /// Enqueues `request`; on acceptance, runs write accounting (for
    /// non-prefetch writes), generates prefetches (for non-prefetch reads),
    /// and emits a trace line.
    pub fn issue_command(&mut self, request: &mut MemoryRequest) -> bool {
        if self.config.is_none() {
            crate::displaylevel!(1, "memory system not configured, rejecting request at {:#x}", request.address);
            return false;
        }
        let coord = self.translate_issue_order(request.address);
        request.translated = Some(coord);
        let channel = coord.channel as usize;
        let accepted = match self.controllers.get_mut(channel) {
            Some(controller) => controller.issue_command(request),
            None => false,
        };
        if !accepted {
            return false;
        }
        self.finish_dispatch(request);
        true
    }

    /// Same acceptance and accounting as [`Self::issue_command`], but bypasses
    /// the controller's (here absent) timing model.
    pub fn issue_atomic(&mut self, request: &mut MemoryRequest) -> bool {
        if self.config.is_none() {
            crate::displaylevel!(1, "memory system not configured, rejecting request at {:#x}", request.address);
            return false;
        }
        let coord = self.translate_issue_order(request.address);
        request.translated = Some(coord);
        let channel = coord.channel as usize;
        let accepted = match self.controllers.get_mut(channel) {
            Some(controller) => controller.issue_atomic(request),
            None => false,
        };
        if !accepted {
            return false;
        }
        self.finish_dispatch(request);
        true
    }

    fn finish_dispatch(&mut self, request: &MemoryRequest) {
        match request.kind {
            RequestType::Read => {
                self.counters.total_read_requests += 1;
                if !request.is_prefetch {
                    if let Some(prefetcher) = self.prefetcher.as_mut() {
                        for addr in prefetcher.do_prefetch(request) {
                            self.pending_requests.push_back(MemoryRequest::prefetch_read(addr));
                        }
                    }
                }
            }
            RequestType::Write => {
                if !request.is_prefetch {
                    self.account_write(request);
                }
            }
        }
        self.emit_trace(request);
    }

    /// XOR -> flip accounting -> BDI compression -> policy attribution, one
    /// write at a time, entirely on the stack: nothing here retains state
    /// past this call.
    fn account_write(&mut self, request: &MemoryRequest) {
        let old = request.old_data.as_deref().unwrap_or(&[]);
        let new = request.new_data.as_deref().unwrap_or(&[]);
        let xor = xor_line(old, new);
        let report = analyze(&xor);
        let bdi_result = bdi::compress_verified(new);
        let bucket = policy::size_bucket(bdi_result.compressed_size);
        let inline_vector = report.inline_vector_update_bit();
        let attribution =
            policy::compressed_flip_attribution(bucket, report.num_columns_updated, &report);

        self.counters.record_write(
            report.naive_flip_count,
            report.num_columns_updated,
            inline_vector,
            bucket,
            attribution,
        );
        for (pos, &count) in report.bit_position_counts.iter().enumerate() {
            self.counters.update_bit[pos] += count as u64;
        }
    }

    fn emit_trace(&mut self, request: &MemoryRequest) {
        if let Some(writer) = self.trace_writer.as_mut() {
            let line = TraceLine::from_request(request, self.cycle);
            let _ = writer.set_next(&line);
        }
        self.cycle += 1;
    }

    /// Called by a child controller on request completion. Owner-matching
    /// always returns `true`; prefetch completions are buffered (bounded
    /// FIFO, oldest evicted on overflow) and, on every completion, one
    /// previously-deferred pending request is retried.
    pub fn request_complete(&mut self, request: &MemoryRequest) -> bool {
        if self.config.is_none() {
            return false;
        }
        if request.is_prefetch {
            match self.prefetch_buffer.push(request.address) {
                Some(_evicted) => self.counters.unsuccessful_prefetches += 1,
                None => self.counters.successful_prefetches += 1,
            }
        }
        self.retry_one_pending();
        true
    }

    /// Defers `request` to be retried on a future [`Self::request_complete`].
    pub fn enqueue_pending(&mut self, request: MemoryRequest) {
        self.pending_requests.push_back(request);
    }

    fn retry_one_pending(&mut self) {
        if let Some(mut request) = self.pending_requests.pop_front() {
            if !self.issue_command(&mut request) {
                self.pending_requests.push_front(request);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(channels: u32, prefetch_buffer_size: usize) -> MemorySystem {
        let mut config = MemoryConfig::default();
        config.channels = channels;
        config.prefetch_buffer_size = prefetch_buffer_size;
        let mut system = MemorySystem::new();
        system.configure(config);
        system
    }

    #[test]
    fn unconfigured_system_rejects_without_touching_counters() {
        let mut system = MemorySystem::new();
        let mut req = MemoryRequest::write(0x1000, 0, vec![0u8; 64], vec![0xFFu8; 64]);
        assert!(!system.issue_command(&mut req));
        assert_eq!(system.counters().total_write_requests, 0);
        assert_eq!(system.is_issuable(&req).0, false);
    }

    #[test]
    fn full_flip_write_accounts_as_incompressible_raw() {
        let mut system = configured(1, 8);
        let mut req = MemoryRequest::write(0, 0, vec![0u8; 64], vec![0xFFu8; 64]);
        assert!(system.issue_command(&mut req));
        let counters = system.counters();
        assert_eq!(counters.read_modified_update_bit, 512);
        assert_eq!(counters.update_columns[8], 1);
        assert_eq!(counters.compress_byte[4], 1);
        assert_eq!(counters.compress_update_bit, policy::RAW_LINE_BITS as u64);
        assert!(counters.update_bit.iter().all(|&c| c == 1));
    }

    #[test]
    fn single_byte_flip_uses_rmw_attribution() {
        let mut system = configured(1, 8);
        let old = vec![0u8; 64];
        let mut new = old.clone();
        new[5] = 0x01;
        let mut req = MemoryRequest::write(0, 0, old, new);
        assert!(system.issue_command(&mut req));
        let counters = system.counters();
        assert_eq!(counters.read_modified_update_bit, 1);
        assert_eq!(counters.update_columns[1], 1);
        assert_eq!(counters.compress_update_bit, 1);
    }

    #[test]
    fn prefetch_buffer_eviction_counts_unsuccessful() {
        let mut system = configured(1, 2);
        for addr in [0x1000u64, 0x2000, 0x3000] {
            let req = MemoryRequest::prefetch_read(addr);
            assert!(system.request_complete(&req));
        }
        assert_eq!(system.counters().unsuccessful_prefetches, 1);
        assert_eq!(system.counters().successful_prefetches, 2);
    }

    #[test]
    fn decoder_order_diverges_only_on_bank_rank_not_channel() {
        let mut config = MemoryConfig::default();
        config.channels = 4;
        config.ranks = 2;
        config.banks = 8;
        let mut system = MemorySystem::new();
        system.configure(config);

        let addr = 0x1234;
        let issue_order = system.translate_issue_order(addr);
        let is_issuable_order = system.translate_is_issuable_order(addr);
        assert_eq!(issue_order.channel, is_issuable_order.channel);
        assert_eq!(issue_order.row, is_issuable_order.row);
        assert_eq!(issue_order.col, is_issuable_order.col);
        assert_eq!(issue_order.bank, is_issuable_order.rank);
        assert_eq!(issue_order.rank, is_issuable_order.bank);
    }

    #[test]
    fn zero_write_still_counts_columns_zero_and_depends_only_on_new() {
        let mut system = configured(1, 8);
        let line = vec![0xABu8; 64];
        let mut req = MemoryRequest::write(0, 0, line.clone(), line);
        assert!(system.issue_command(&mut req));
        let counters = system.counters();
        assert_eq!(counters.update_columns[0], 1);
        assert_eq!(counters.read_modified_update_bit, 0);
    }
}
