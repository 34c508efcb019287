use core::fmt::{self, Write};

use embedded_can::{ExtendedId, Id};

use crate::{
    codec::{clean_transcript, payload_to_hex, u32_from_hex, u32_to_hex, u8_from_hex_nibbles},
    decode::{decode_payload, DecodedFrame},
    DISPLAY_STRING_LENGTH, MODULE_TYPE, MONITOR_ADDRESS, MXR_ID, PAYLOAD_DISPLAY_LENGTH,
    PAYLOAD_LENGTH, TRANSCRIPT_LENGTH,
};

/// Packs the identifier of a frame addressed to `destination`.
///
/// Layout, high to low: 3 unused bits, 5-bit manufacturer id, 8-bit module
/// type, 8-bit destination, 8-bit source. The result always fits in 29 bits.
pub const fn build_frame_id(destination: u8, source: u8) -> u32 {
    ((MXR_ID as u32 & 0x1F) << 24)
        | ((MODULE_TYPE as u32) << 16)
        | ((destination as u32) << 8)
        | source as u32
}

/// [`build_frame_id`] with the monitor address as the source.
pub const fn build_monitor_frame_id(destination: u8) -> u32 {
    build_frame_id(destination, MONITOR_ADDRESS)
}

/// The four fields of a frame identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameId {
    pub mxr_id: u8,
    pub module_type: u8,
    pub destination: u8,
    pub source: u8,
}

impl FrameId {
    /// Whether the manufacturer id and module type match this protocol
    pub fn is_charging_module(&self) -> bool {
        self.mxr_id == MXR_ID && self.module_type == MODULE_TYPE
    }
}

/// Splits an identifier into its fields. Nothing is validated.
pub const fn parse_frame_id(id: u32) -> FrameId {
    FrameId {
        mxr_id: ((id >> 24) & 0x1F) as u8,
        module_type: (id >> 16) as u8,
        destination: (id >> 8) as u8,
        source: id as u8,
    }
}

/// Builds the 8 payload bytes writing `value` to `register`.
///
/// `is_float` selects between an IEEE-754 single and a signed 32-bit
/// integer; it must come from the register's [`RegisterKind`](crate::RegisterKind).
/// Integer conversion truncates toward zero and saturates.
pub fn build_data_payload(register: u16, value: f64, is_float: bool) -> [u8; PAYLOAD_LENGTH] {
    let value_bytes = if is_float {
        (value as f32).to_be_bytes()
    } else {
        (value as i32).to_be_bytes()
    };
    let [reg_hi, reg_lo] = register.to_be_bytes();

    [
        0x00,
        0x00,
        reg_hi,
        reg_lo,
        value_bytes[0],
        value_bytes[1],
        value_bytes[2],
        value_bytes[3],
    ]
}

/// An extended data frame with exactly [`PAYLOAD_LENGTH`] bytes, the only
/// shape used by charging modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: ExtendedId,
    data: [u8; PAYLOAD_LENGTH],
}

impl CanFrame {
    pub fn new(id: ExtendedId, data: [u8; PAYLOAD_LENGTH]) -> Self {
        Self { id, data }
    }

    /// Creates a frame from a raw identifier. Returns `None` if `id` does
    /// not fit in 29 bits.
    pub fn from_raw(id: u32, data: [u8; PAYLOAD_LENGTH]) -> Option<Self> {
        Some(Self::new(ExtendedId::new(id)?, data))
    }

    /// Creates a frame for the identifier produced by [`build_frame_id`].
    pub fn addressed(destination: u8, source: u8, data: [u8; PAYLOAD_LENGTH]) -> Self {
        let raw = build_frame_id(destination, source);

        // The manufacturer id is masked to 5 bits so `raw` never exceeds 0x1FFFFFFF
        let id = ExtendedId::new(raw).expect("identifier exceeds 29 bits");

        Self::new(id, data)
    }

    pub fn extended_id(&self) -> ExtendedId {
        self.id
    }

    pub fn raw_id(&self) -> u32 {
        self.id.as_raw()
    }

    pub fn frame_id(&self) -> FrameId {
        parse_frame_id(self.raw_id())
    }

    pub fn payload(&self) -> &[u8; PAYLOAD_LENGTH] {
        &self.data
    }

    pub fn decode(&self) -> DecodedFrame {
        decode_payload(self.raw_id(), &self.data)
    }

    /// Parses a human hex transcript into a frame. Identifiers which do not
    /// fit in 29 bits are rejected, use [`parse_transcript`] to keep them.
    pub fn from_hex(text: &str) -> Result<Self, FrameParseError> {
        let (raw_id, data) = parse_transcript(text)?;

        Self::from_raw(raw_id, data).ok_or(FrameParseError::ExtendedIdOutOfRange(raw_id))
    }

    /// `ID: 0x158101A0  DATA: 00 00 00 21 44 3B 80 00`
    fn display_bytes(&self) -> [u8; DISPLAY_STRING_LENGTH] {
        const ID_PREFIX: &[u8] = b"ID: 0x";
        const DATA_PREFIX: &[u8] = b"  DATA: ";

        let mut buf = [0u8; DISPLAY_STRING_LENGTH];
        let (prefix, rest) = buf.split_at_mut(ID_PREFIX.len());
        prefix.copy_from_slice(ID_PREFIX);
        let (id, rest) = rest.split_at_mut(8);
        id.copy_from_slice(&u32_to_hex(self.raw_id()));
        let (prefix, data) = rest.split_at_mut(DATA_PREFIX.len());
        prefix.copy_from_slice(DATA_PREFIX);
        data.copy_from_slice(&payload_to_hex(&self.data));

        buf
    }
}

impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.display_bytes().iter() {
            f.write_char(b as char)?;
        }

        Ok(())
    }
}

/// Parses a human hex transcript such as `"1581A002 F0000001442F0000"`.
///
/// Whitespace and `0x` prefixes are ignored. The rest must be 8 hex digits of
/// identifier followed by 16 hex digits of payload. The identifier is
/// returned as is, any 32-bit value is accepted.
pub fn parse_transcript(text: &str) -> Result<(u32, [u8; PAYLOAD_LENGTH]), FrameParseError> {
    let (digits, count) = clean_transcript(text.as_bytes());

    if count != TRANSCRIPT_LENGTH {
        return Err(FrameParseError::InvalidTranscriptLength(count));
    }

    let (id_digits, data_digits) = digits.split_at(8);
    let raw_id = u32_from_hex(id_digits)?;

    let mut data = [0u8; PAYLOAD_LENGTH];
    for (byte, nibbles) in data.iter_mut().zip(data_digits.chunks_exact(2)) {
        let nibbles = nibbles
            .try_into()
            .map_err(|_| FrameParseError::InvalidTranscriptLength(count))?;
        *byte = u8_from_hex_nibbles(nibbles)?;
    }

    Ok((raw_id, data))
}

/// Formats a frame as `ID: 0x<id>  DATA: <bytes>`.
pub fn frame_to_display_string(frame: &CanFrame) -> heapless::String<DISPLAY_STRING_LENGTH> {
    frame.display_bytes().iter().map(|&b| b as char).collect()
}

/// Renders a payload the way it appears in a [`DecodedFrame`].
pub fn payload_to_display_string(
    data: &[u8; PAYLOAD_LENGTH],
) -> heapless::String<PAYLOAD_DISPLAY_LENGTH> {
    payload_to_hex(data).iter().map(|&b| b as char).collect()
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Extended(id) => Some(Self::new(id, data.try_into().ok()?)),
            Id::Standard(_) => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        true
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        Id::Extended(self.id)
    }

    fn dlc(&self) -> usize {
        PAYLOAD_LENGTH
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameParseError {
    #[error("Tried to decode a hex digit but it was out of range ({0:?})")]
    IllegalHexDigit(u8),
    #[error("Received a transcript with ({0:?}) hex digits, expected 8 for the ID and 16 for the data")]
    InvalidTranscriptLength(usize),
    #[error("Received a CAN Extended ID ({0:?}) that was out of the valid range (0..=0x1FFFFFFF)")]
    ExtendedIdOutOfRange(u32),
    #[error("Received a payload of ({0:?}) bytes, expected exactly 8")]
    MalformedPayload(usize),
}
