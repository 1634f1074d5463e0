//! Side-channel recording of internal values for offline debugging.
//!
//! Dumps are fire-and-forget: a [`DataDumper`] without a sink drops every
//! record, and sinks cannot report failures back into the audio path.
//!
//! The gain controller hands a clone of its dumper to the submodules it
//! creates, so every recording of one instance carries the same id.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use derive_more::Debug;

/// Hands out unique ids to gain controller instances.
///
/// Shared between every instance that tags its recordings, possibly created
/// from different threads.
#[derive(Debug, Default)]
pub struct InstanceCounter {
    count: AtomicUsize,
}

impl InstanceCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    /// Increments the counter and returns the new value (ids start at 1).
    pub fn next_instance_index(&self) -> usize {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of ids handed out so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

/// A dumped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DumpValue {
    Bool(bool),
    I32(i32),
    F32(f32),
}

impl From<bool> for DumpValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for DumpValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<f32> for DumpValue {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

/// One dumped value with its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DumpRecord<'a> {
    pub instance_index: usize,
    pub recording_set_index: usize,
    pub name: &'a str,
    pub value: DumpValue,
}

/// Destination of data dumps.
///
/// Shared by all the dumpers of one gain controller instance.
pub trait DumpSink: Send + Sync {
    fn record(&self, record: &DumpRecord<'_>);
}

/// Forwards dumps as `trace` level events on the `agc2::data_dump` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDumpSink;

impl DumpSink for TracingDumpSink {
    fn record(&self, record: &DumpRecord<'_>) {
        tracing::trace!(
            target: "agc2::data_dump",
            instance = record.instance_index,
            set = record.recording_set_index,
            dump = record.name,
            value = ?record.value,
            "data dump"
        );
    }
}

/// Tags dumps with the owning instance and the current recording set.
///
/// Clones share the sink and keep the instance id.
#[derive(Debug, Clone)]
pub struct DataDumper {
    instance_index: usize,
    recording_set_index: usize,
    #[debug(skip)]
    sink: Option<Arc<dyn DumpSink>>,
}

impl DataDumper {
    pub fn new(instance_index: usize, sink: Option<Arc<dyn DumpSink>>) -> Self {
        Self {
            instance_index,
            recording_set_index: 0,
            sink,
        }
    }

    /// Starts a new set of recordings; later dumps carry the new set index.
    pub fn initiate_new_set_of_recordings(&mut self) {
        self.recording_set_index += 1;
    }

    pub fn dump_raw(&self, name: &str, value: impl Into<DumpValue>) {
        if let Some(sink) = self.sink.as_deref() {
            sink.record(&DumpRecord {
                instance_index: self.instance_index,
                recording_set_index: self.recording_set_index,
                name,
                value: value.into(),
            });
        }
    }

    pub fn instance_index(&self) -> usize {
        self.instance_index
    }

    pub fn recording_set_index(&self) -> usize {
        self.recording_set_index
    }
}
