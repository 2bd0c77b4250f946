/// Pitch classes for the twelve semitones of an octave.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Channel-voice messages are exactly status byte + two data bytes.
const PACKET_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    NoteOn,
    NoteOff,
}

impl MidiEventKind {
    fn from_status_byte(status: u8) -> Option<Self> {
        match status >> 4 {
            0b1001 => Some(Self::NoteOn),
            0b1000 => Some(Self::NoteOff),
            _ => None,
        }
    }
}

/// One decoded note occurrence, stamped with the port it arrived
/// through and the unique id of the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    pub port_name: String,
    pub source_id: i32,
    pub data: MidiNoteData,
}

/// The note payload of a channel-voice message. `note` and `velocity`
/// are raw 7-bit values, `channel` fits in the low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiNoteData {
    pub kind: MidiEventKind,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

impl MidiNoteData {
    /// Decode one raw channel-voice packet.
    ///
    /// Anything that is not a 3-byte note-on/note-off message is an
    /// unsupported message, not a fault, and decodes to `None`. Does not
    /// allocate, safe to call from the driver's delivery thread.
    pub fn try_from_packet(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PACKET_LEN {
            return None;
        }

        Some(Self {
            kind: MidiEventKind::from_status_byte(bytes[0])?,
            channel: bytes[0] & 0x0f,
            note: bytes[1],
            velocity: bytes[2],
        })
    }

    /// Pitch-class letter plus octave, e.g. note 60 is "C4" and note 0 is "C-1".
    pub fn note_name(&self) -> String {
        let octave = i32::from(self.note / 12) - 1;
        format!("{}{octave}", NOTE_NAMES[usize::from(self.note % 12)])
    }
}
