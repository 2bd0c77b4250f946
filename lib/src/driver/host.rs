use super::*;
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

/// `MidiDriving` implementation backed by the platform MIDI host through `midir`.
///
/// The enumeration client is created once with the driver and disposed with
/// it. Connecting consumes a `midir` client, so every input port carries its
/// own client under the same client name.
pub struct HostedMidiDriver {
    client_name: String,
    client: Mutex<MidiInput>,
    created: Mutex<HashMap<u64, CreatedPort>>,
    connected: Mutex<HashMap<u64, MidiInputConnection<()>>>,
    next_port_id: AtomicU64,
}

struct CreatedPort {
    client: MidiInput,
    name: String,
    callback: PacketCallback,
}

impl HostedMidiDriver {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_client_name("midiflux")
    }

    pub fn with_client_name(client_name: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: Mutex::new(MidiInput::new(client_name)?),
            client_name: client_name.to_owned(),
            created: Mutex::new(HashMap::new()),
            connected: Mutex::new(HashMap::new()),
            next_port_id: AtomicU64::new(0),
        })
    }
}

/// Stable 32-bit id for a source, derived from its display name. Ports
/// sharing a name share an id; the first match wins on connect.
fn source_unique_id(display_name: &str) -> i32 {
    crc32fast::hash(display_name.as_bytes()) as i32
}

fn find_port_by_unique_id(client: &MidiInput, unique_id: i32) -> Option<MidiInputPort> {
    client.ports().into_iter().find(|port| {
        client
            .port_name(port)
            .map(|name| source_unique_id(&name) == unique_id)
            .unwrap_or(false)
    })
}

impl MidiDriving for HostedMidiDriver {
    fn list_sources(&self) -> Vec<Source> {
        let client = self.client.lock().unwrap();
        client
            .ports()
            .iter()
            .filter_map(|port| {
                let display_name = client.port_name(port).ok()?;
                let unique_id = source_unique_id(&display_name);
                Some(Source {
                    display_name,
                    unique_id,
                })
            })
            .collect()
    }

    fn find_by_unique_id(&self, unique_id: i32) -> Option<(SourceRef, ObjectKind)> {
        // Input ports are the only objects this backend resolves, so a
        // found id is always a source.
        let client = self.client.lock().unwrap();
        find_port_by_unique_id(&client, unique_id)
            .map(|_| (SourceRef { unique_id }, ObjectKind::Source))
    }

    fn create_input_port(
        &self,
        name: &str,
        callback: PacketCallback,
    ) -> anyhow::Result<PortHandle> {
        let client = MidiInput::new(&self.client_name)?;
        let id = self.next_port_id.fetch_add(1, Ordering::Relaxed);

        self.created.lock().unwrap().insert(
            id,
            CreatedPort {
                client,
                name: name.to_owned(),
                callback,
            },
        );

        Ok(PortHandle::new(id))
    }

    fn connect_port_to_source(&self, port: &PortHandle, source: &SourceRef) -> anyhow::Result<()> {
        let Some(created) = self.created.lock().unwrap().remove(&port.id()) else {
            anyhow::bail!("no created input port for handle {}", port.id());
        };

        let CreatedPort {
            client,
            name,
            mut callback,
        } = created;

        let Some(input_port) = find_port_by_unique_id(&client, source.unique_id) else {
            anyhow::bail!("source {} is no longer present", source.unique_id);
        };

        let connection = client
            .connect(
                &input_port,
                &name,
                move |_timestamp, bytes, _data| callback(&[RawPacket { bytes }]),
                (),
            )
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        self.connected.lock().unwrap().insert(port.id(), connection);
        log::trace!("connected input port {name} to source {}", source.unique_id);
        Ok(())
    }

    fn disconnect_port_from_source(&self, port: &PortHandle, source: &SourceRef) {
        if let Some(connection) = self.connected.lock().unwrap().remove(&port.id()) {
            // midir tears down the backend callback context before close()
            // returns, so no packet callback for this port runs past this
            // point. Teardown needs no further fencing.
            connection.close();
            log::trace!("disconnected input port from source {}", source.unique_id);
        }
    }

    fn dispose_port(&self, port: PortHandle) {
        // A connected port is torn down by disconnect; disposing clears
        // whatever remains for ports that never got connected.
        self.created.lock().unwrap().remove(&port.id());
        if let Some(connection) = self.connected.lock().unwrap().remove(&port.id()) {
            connection.close();
        }
    }
}
