use super::input::Connection;
use crate::midi::{MidiEvent, MidiEventKind};
use crossbeam::channel::Receiver;
use std::time::{Duration, Instant};

type Transform<T> = Box<dyn Fn(MidiEvent) -> Option<T> + Send>;

/// A live subscription to a MIDI source.
///
/// Dropping the stream is the unsubscription: the hardware connection comes
/// down first (disconnect, then dispose, exactly once), then the event queue.
///
/// The combinators below are plain transformations of the delivered
/// sequence. They reuse the subscription they are called on, never touch
/// the hardware connection, and preserve delivery order.
pub struct EventStream<T> {
    // Declared before the receiver: drop order guarantees the driver stops
    // delivering before the queue goes away.
    connection: Connection,
    receiver: Receiver<MidiEvent>,
    transform: Transform<T>,
}

impl EventStream<MidiEvent> {
    pub(crate) fn new(connection: Connection, receiver: Receiver<MidiEvent>) -> Self {
        Self {
            connection,
            receiver,
            transform: Box::new(Some),
        }
    }

    /// Keep only events on this channel.
    pub fn by_channel(self, channel: u8) -> Self {
        self.chain(move |event| (event.data.channel == channel).then_some(event))
    }

    /// Keep only events of this kind.
    pub fn by_type(self, kind: MidiEventKind) -> Self {
        self.chain(move |event| (event.data.kind == kind).then_some(event))
    }

    /// Keep only note-on events, projected to their note names.
    pub fn to_note_names(self) -> EventStream<String> {
        self.chain(|event| {
            (event.data.kind == MidiEventKind::NoteOn).then(|| event.data.note_name())
        })
    }
}

impl<T: 'static> EventStream<T> {
    /// Compose a further filter/map stage onto this stream.
    fn chain<U>(self, next: impl Fn(T) -> Option<U> + Send + 'static) -> EventStream<U> {
        let prev = self.transform;
        EventStream {
            connection: self.connection,
            receiver: self.receiver,
            transform: Box::new(move |event| prev(event).and_then(&next)),
        }
    }

    /// Next queued event surviving the stream's filters, if any. Never blocks.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver
            .try_iter()
            .find_map(|event| (self.transform)(event))
    }

    /// Wait up to `timeout` for the next event surviving the stream's filters.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let event = self.receiver.recv_timeout(remaining).ok()?;
            if let Some(out) = (self.transform)(event) {
                return Some(out);
            }
        }
    }

    /// Drain everything currently queued, without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = T> + '_ {
        self.receiver
            .try_iter()
            .filter_map(|event| (self.transform)(event))
    }

    /// Block on the queue for as long as the subscription lives.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.receiver
            .iter()
            .filter_map(|event| (self.transform)(event))
    }

    /// Tear the subscription down. Equivalent to dropping the stream.
    pub fn unsubscribe(self) {}
}
