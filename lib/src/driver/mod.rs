mod host;

pub use host::*;

/// A piece of hardware capable of producing MIDI input, as listed by the
/// driver. Immutable once obtained; streams refer to it by `unique_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub display_name: String,
    pub unique_id: i32,
}

/// What a unique id resolved to. Drivers can hand out ids for objects
/// other than sources, only sources can be connected to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Source,
    Other,
}

/// A resolved reference to a driver-side source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub unique_id: i32,
}

/// Handle to an input port created by the driver.
///
/// Deliberately neither `Clone` nor `Copy`: disposing a port consumes the
/// handle, so a disposed port cannot be referenced again.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PortHandle {
    id: u64,
}

impl PortHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One complete raw MIDI message as the driver delivered it.
#[derive(Debug, Clone, Copy)]
pub struct RawPacket<'a> {
    pub bytes: &'a [u8],
}

/// Callback registered with an input port. The driver invokes it on its
/// own delivery thread with a batch of packets, concurrently with
/// anything the rest of the process is doing, so implementations must
/// not block and must return quickly.
pub type PacketCallback = Box<dyn FnMut(&[RawPacket<'_>]) + Send>;

/// The capability surface of a MIDI input driver.
///
/// Mirrors what platform MIDI hosts offer: enumeration, object lookup by
/// unique id, and a create/connect/disconnect/dispose port lifecycle. All
/// operations may be called from any thread.
pub trait MidiDriving: Send + Sync {
    /// List the currently available sources. Entries without a readable
    /// name or id are excluded. Ordering is not stable across calls.
    fn list_sources(&self) -> Vec<Source>;

    /// Resolve a unique id to a driver object, reporting its kind.
    fn find_by_unique_id(&self, unique_id: i32) -> Option<(SourceRef, ObjectKind)>;

    /// Create an input port delivering packet batches to `callback`.
    fn create_input_port(&self, name: &str, callback: PacketCallback)
        -> anyhow::Result<PortHandle>;

    /// Start delivery from `source` through a previously created port.
    fn connect_port_to_source(&self, port: &PortHandle, source: &SourceRef)
        -> anyhow::Result<()>;

    /// Stop delivery. Must guarantee that no packet callback for this
    /// port runs after it returns.
    fn disconnect_port_from_source(&self, port: &PortHandle, source: &SourceRef);

    /// Release whatever the driver still holds for this port.
    fn dispose_port(&self, port: PortHandle);
}
