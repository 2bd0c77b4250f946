use super::events::EventStream;
use crate::{
    driver::{MidiDriving, ObjectKind, PacketCallback, PortHandle, RawPacket, Source, SourceRef},
    midi::{MidiEvent, MidiNoteData},
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// How many undrained events a subscription queues before the delivery
/// thread starts dropping new ones.
const EVENT_QUEUE_CAPACITY: usize = 1_000;

static PORT_NAME_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputStreamError {
    #[error("no MIDI source found with unique id {0}")]
    UnknownSource(i32),
    #[error("the driver could not create an input port")]
    CouldNotCreatePort,
    #[error("the driver could not connect the input port to source {0}")]
    CouldNotConnectPortToSource(i32),
}

/// Bridges the callback-driven MIDI driver into subscribable event streams.
///
/// The bridge owns the long-lived driver client. Ports are per subscription:
/// every [`InputStream::subscribe`] call opens its own.
pub struct InputBridge {
    driver: Arc<dyn MidiDriving>,
}

impl InputBridge {
    pub fn new(driver: Arc<dyn MidiDriving>) -> Self {
        Self { driver }
    }

    /// Bridge over the platform MIDI host.
    pub fn with_default_driver() -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(crate::driver::HostedMidiDriver::new()?)))
    }

    /// List the currently available sources.
    pub fn sources(&self) -> Vec<Source> {
        self.driver.list_sources()
    }

    /// Describe a stream of note events from the source with this unique id.
    ///
    /// The stream is cold: nothing touches the hardware until a consumer
    /// subscribes, and every subscription connects independently. Without an
    /// explicit `port_name`, each connection gets a fresh process-unique one.
    pub fn open_stream(&self, source_id: i32, port_name: Option<&str>) -> InputStream {
        InputStream {
            driver: self.driver.clone(),
            source_id,
            port_name: port_name.map(str::to_owned),
        }
    }
}

/// A cold description of an input stream, produced by [`InputBridge::open_stream`].
pub struct InputStream {
    driver: Arc<dyn MidiDriving>,
    source_id: i32,
    port_name: Option<String>,
}

impl InputStream {
    /// Connect to the source and start delivering events.
    ///
    /// Any setup failure is terminal for this attempt, and driver resources
    /// acquired before the failing step are released before this returns.
    /// Subscribing again retries from scratch.
    pub fn subscribe(&self) -> Result<EventStream<MidiEvent>, InputStreamError> {
        let source = match self.driver.find_by_unique_id(self.source_id) {
            Some((source, ObjectKind::Source)) => source,
            Some((_, kind)) => {
                log::error!("object {} is a {kind:?}, not a source", self.source_id);
                return Err(InputStreamError::UnknownSource(self.source_id));
            }
            None => return Err(InputStreamError::UnknownSource(self.source_id)),
        };

        let port_name = self.port_name.clone().unwrap_or_else(generated_port_name);

        let (sender, receiver) = crossbeam::channel::bounded(EVENT_QUEUE_CAPACITY);
        let callback = decode_and_forward(sender, port_name.clone(), self.source_id);

        let port = match self.driver.create_input_port(&port_name, callback) {
            Ok(port) => port,
            Err(e) => {
                log::error!("failed to create input port {port_name} : {e}");
                return Err(InputStreamError::CouldNotCreatePort);
            }
        };

        // From here on the connection owns the port: disconnect and dispose
        // run exactly once on every exit path, this error path included.
        let connection = Connection {
            driver: self.driver.clone(),
            source,
            port: Some(port),
        };

        if let Err(e) = self
            .driver
            .connect_port_to_source(connection.port(), &connection.source)
        {
            log::error!(
                "failed to connect port {port_name} to source {} : {e}",
                self.source_id
            );
            return Err(InputStreamError::CouldNotConnectPortToSource(self.source_id));
        }

        log::trace!("subscribed {port_name} to source {}", self.source_id);
        Ok(EventStream::new(connection, receiver))
    }
}

/// Build the port callback: split each delivered batch, decode every packet
/// and forward the survivors. Runs on the driver's delivery thread, so it
/// never blocks; events the consumer is too slow to drain are dropped.
fn decode_and_forward(
    sender: crossbeam::channel::Sender<MidiEvent>,
    port_name: String,
    source_id: i32,
) -> PacketCallback {
    Box::new(move |packets: &[RawPacket<'_>]| {
        for packet in packets {
            // Unsupported messages are filtered here, not faulted.
            let Some(data) = MidiNoteData::try_from_packet(packet.bytes) else {
                continue;
            };

            let event = MidiEvent {
                port_name: port_name.clone(),
                source_id,
                data,
            };

            if let Err(e) = sender.try_send(event) {
                log::warn!("dropping midi event from {port_name} : {e}");
            }
        }
    })
}

/// Process-unique so concurrently open connections never collide.
fn generated_port_name() -> String {
    let seq = PORT_NAME_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("midiflux-in-{}-{seq}", std::process::id())
}

/// The driver-side state of one live subscription: exclusively owned, never
/// shared between subscribers, torn down exactly once.
pub(crate) struct Connection {
    driver: Arc<dyn MidiDriving>,
    source: SourceRef,
    port: Option<PortHandle>,
}

impl Connection {
    // The port is present from construction until drop.
    fn port(&self) -> &PortHandle {
        self.port.as_ref().unwrap()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(port) = self.port.take() {
            self.driver.disconnect_port_from_source(&port, &self.source);
            self.driver.dispose_port(port);
        }
    }
}
