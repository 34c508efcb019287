use core::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    frame::{
        parse_frame_id, parse_transcript, payload_to_display_string, FrameId, FrameParseError,
    },
    register::{alarm_label, lookup, RegisterDefinition},
    PAYLOAD_DISPLAY_LENGTH, PAYLOAD_LENGTH,
};

/// Status byte of a frame sent by a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ResponseCode {
    /// The request was carried out
    Normal = 0xF0,
    /// The value was out of range and the module applied its default instead
    ForcedDefault = 0xF1,
    /// The request failed and the frame should be discarded
    Failure = 0xF2,
}

impl ResponseCode {
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::ForcedDefault => "F1: Forced to default value",
            Self::Failure => "F2: Failure, discard frame",
        }
    }
}

/// Byte 0 of a payload, either a module response or a host command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReturnCode {
    /// Sent by a host, normally with the byte set to 0x00
    Command(u8),
    Response(ResponseCode),
}

impl From<u8> for ReturnCode {
    fn from(byte: u8) -> Self {
        ResponseCode::try_from(byte).map_or(Self::Command(byte), Self::Response)
    }
}

impl From<ReturnCode> for u8 {
    fn from(code: ReturnCode) -> Self {
        match code {
            ReturnCode::Command(byte) => byte,
            ReturnCode::Response(response) => response.into(),
        }
    }
}

impl ReturnCode {
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Response(ResponseCode::Failure))
    }

    /// Annotation for the code, empty unless the module forced a default
    /// or failed.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Command(_) => "",
            Self::Response(response) => response.description(),
        }
    }
}

/// The 32-bit value of the alarm register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmBitmap(pub u32);

impl AlarmBitmap {
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Labels of the set bits, lowest bit first.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        let bits = self.0;

        (0..u32::BITS)
            .filter(move |bit| bits & (1 << bit) != 0)
            .filter_map(alarm_label)
    }
}

impl fmt::Display for AlarmBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("No Alarms");
        }

        for (i, label) in self.labels().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(label)?;
        }

        Ok(())
    }
}

/// Interpretation of payload bytes 4..8
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodedValue {
    /// Float register, rounded to two decimals and shown with two decimal places
    Float(f64),
    /// Integer register with no matching label
    Integer(i32),
    /// Integer matching one of the register's options
    Labeled { value: i32, label: &'static str },
    Alarms(AlarmBitmap),
    /// The register is not in the table; holds the raw value bits
    UnknownRegister(u32),
}

impl DecodedValue {
    /// The numeric value, if the register is known.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(value) => Some(value),
            Self::Integer(value) | Self::Labeled { value, .. } => Some(value as f64),
            Self::Alarms(AlarmBitmap(bits)) => Some(bits as i32 as f64),
            Self::UnknownRegister(_) => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(value) => write!(f, "{value:.2}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Labeled { value, label } => write!(f, "{value} ({label})"),
            Self::Alarms(alarms) => write!(f, "{alarms}"),
            Self::UnknownRegister(raw) => write!(f, "Unknown register: 0x{raw:08X}"),
        }
    }
}

/// A received frame broken down into its fields
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedFrame {
    pub frame_id: FrameId,
    pub return_code: ReturnCode,
    pub register: u16,
    /// `None` when the register address is not in the table
    pub definition: Option<&'static RegisterDefinition>,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub raw_hex: heapless::String<PAYLOAD_DISPLAY_LENGTH>,
    pub value: DecodedValue,
}

impl DecodedFrame {
    /// Set only for [`ResponseCode::Failure`]
    pub fn is_error(&self) -> bool {
        self.return_code.is_error()
    }

    pub fn error_description(&self) -> &'static str {
        self.return_code.description()
    }

    pub fn is_response(&self) -> bool {
        self.return_code.is_response()
    }

    pub fn name(&self) -> Option<&'static str> {
        self.definition.map(|definition| definition.name)
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.definition.and_then(|definition| definition.unit)
    }
}

/// Decodes a received frame.
///
/// `payload` must be exactly [`PAYLOAD_LENGTH`] bytes long, anything else is
/// rejected with [`FrameParseError::MalformedPayload`]. Every 8-byte payload
/// decodes, including ones for unknown registers.
pub fn decode_frame(id: u32, payload: &[u8]) -> Result<DecodedFrame, FrameParseError> {
    let payload: &[u8; PAYLOAD_LENGTH] = payload
        .try_into()
        .map_err(|_| FrameParseError::MalformedPayload(payload.len()))?;

    Ok(decode_payload(id, payload))
}

/// Parses a hex transcript with [`parse_transcript`] and decodes it.
pub fn decode_transcript(text: &str) -> Result<DecodedFrame, FrameParseError> {
    let (id, payload) = parse_transcript(text)?;

    Ok(decode_payload(id, &payload))
}

pub(crate) fn decode_payload(id: u32, payload: &[u8; PAYLOAD_LENGTH]) -> DecodedFrame {
    let register = u16::from_be_bytes([payload[2], payload[3]]);
    let value_bytes = [payload[4], payload[5], payload[6], payload[7]];
    let definition = lookup(register);

    let value = match definition {
        Some(definition) if definition.kind.is_float() => {
            DecodedValue::Float(round_hundredths(f32::from_be_bytes(value_bytes)))
        }
        Some(definition) => decode_integer(definition, i32::from_be_bytes(value_bytes)),
        None => DecodedValue::UnknownRegister(u32::from_be_bytes(value_bytes)),
    };

    DecodedFrame {
        frame_id: parse_frame_id(id),
        return_code: payload[0].into(),
        register,
        definition,
        raw_hex: payload_to_display_string(payload),
        value,
    }
}

/// Options win over the alarm bitmap, which wins over the plain integer.
fn decode_integer(definition: &RegisterDefinition, value: i32) -> DecodedValue {
    if let Some(label) = definition.option_label(value) {
        return DecodedValue::Labeled { value, label };
    }

    if definition.is_alarm_bitmap() {
        return DecodedValue::Alarms(AlarmBitmap(value as u32));
    }

    DecodedValue::Integer(value)
}

/// Rounds to two decimals. Ties round half away from zero, so an exact
/// binary tie such as 0.125 becomes 0.13 rather than the half-even 0.12.
fn round_hundredths(value: f32) -> f64 {
    let value = value as f64;

    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }

    let scaled = value * 100.0;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5) as i64
    } else {
        (scaled - 0.5) as i64
    };

    rounded as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use super::*;
    use crate::{build_data_payload, build_frame_id, registers, ALARM_REGISTER};

    fn text(value: &DecodedValue) -> heapless::String<1024> {
        let mut buf = heapless::String::new();
        write!(buf, "{value}").unwrap();
        buf
    }

    #[test]
    fn decode_output_voltage_response() {
        let decoded =
            decode_frame(0x1581A002, &[0xF0, 0x00, 0x00, 0x01, 0x44, 0x2F, 0x00, 0x00]).unwrap();

        assert_eq!(
            decoded.frame_id,
            FrameId {
                mxr_id: 0x15,
                module_type: 0x81,
                destination: 0xA0,
                source: 0x02,
            }
        );
        assert_eq!(decoded.return_code, ReturnCode::Response(ResponseCode::Normal));
        assert!(decoded.is_response());
        assert!(!decoded.is_error());
        assert_eq!(decoded.error_description(), "");
        assert_eq!(decoded.register, 0x0001);
        assert_eq!(decoded.name(), Some("Output Voltage"));
        assert_eq!(decoded.unit(), Some("V"));
        assert_eq!(decoded.value, DecodedValue::Float(700.0));
        assert_eq!(decoded.raw_hex.as_str(), "F0 00 00 01 44 2F 00 00");
    }

    #[test]
    fn decode_alarms() {
        let id = build_frame_id(0xA0, 0x01);

        let decoded = decode_frame(id, &build_data_payload(ALARM_REGISTER, 0b101 as f64, false));
        let decoded = decoded.unwrap();
        assert_eq!(decoded.value, DecodedValue::Alarms(AlarmBitmap(0b101)));
        assert_eq!(
            text(&decoded.value).as_str(),
            "Input Overvoltage, Output Overvoltage"
        );

        let decoded = decode_frame(id, &build_data_payload(ALARM_REGISTER, 0.0, false)).unwrap();
        assert_eq!(text(&decoded.value).as_str(), "No Alarms");

        // Every bit set, including the sign bit of the i32 on the wire
        let decoded =
            decode_frame(id, &[0xF0, 0x00, 0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        let labels = match decoded.value {
            DecodedValue::Alarms(alarms) => alarms.labels().count(),
            _ => 0,
        };
        assert_eq!(labels, 32);
        assert!(text(&decoded.value).ends_with("Reserved (bit 31)"));
    }

    #[test]
    fn decode_status_label() {
        let decoded =
            decode_frame(0x1581A002, &[0xF0, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x07]).unwrap();

        assert_eq!(
            decoded.value,
            DecodedValue::Labeled {
                value: 7,
                label: "Running"
            }
        );
        assert_eq!(text(&decoded.value).as_str(), "7 (Running)");

        // No label for 42
        let decoded =
            decode_frame(0x1581A002, &[0xF0, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x2A]).unwrap();
        assert_eq!(decoded.value, DecodedValue::Integer(42));
        assert_eq!(text(&decoded.value).as_str(), "42");
    }

    #[test]
    fn return_codes() {
        for register in [0x0001u16, 0x0101, 0x9999] {
            let [hi, lo] = register.to_be_bytes();

            let failure = decode_frame(0x1581A002, &[0xF2, 0x00, hi, lo, 0, 0, 0, 0]).unwrap();
            assert!(failure.is_error());
            assert_eq!(failure.error_description(), "F2: Failure, discard frame");

            let forced = decode_frame(0x1581A002, &[0xF1, 0x00, hi, lo, 0, 0, 0, 0]).unwrap();
            assert!(!forced.is_error());
            assert!(forced.is_response());
            assert_eq!(forced.error_description(), "F1: Forced to default value");

            let command = decode_frame(0x158101A0, &[0x00, 0x00, hi, lo, 0, 0, 0, 0]).unwrap();
            assert!(!command.is_error());
            assert!(!command.is_response());
            assert_eq!(command.return_code, ReturnCode::Command(0x00));
            assert_eq!(command.error_description(), "");
        }

        assert_eq!(ReturnCode::from(0x17), ReturnCode::Command(0x17));
        assert_eq!(u8::from(ReturnCode::from(0xF2)), 0xF2);
    }

    #[test]
    fn error_always_has_a_description() {
        for byte in 0..=u8::MAX {
            let code = ReturnCode::from(byte);
            assert!(!code.is_error() || !code.description().is_empty());
        }
    }

    #[test]
    fn unknown_register() {
        let decoded =
            decode_frame(0x1581A002, &[0xF0, 0x00, 0x99, 0x99, 0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

        assert_eq!(decoded.register, 0x9999);
        assert_eq!(decoded.definition, None);
        assert_eq!(decoded.unit(), None);
        assert_eq!(decoded.value, DecodedValue::UnknownRegister(0xDEADBEEF));
        assert_eq!(decoded.value.as_f64(), None);
        assert_eq!(text(&decoded.value).as_str(), "Unknown register: 0xDEADBEEF");
    }

    #[test]
    fn malformed_payloads() {
        assert_eq!(
            decode_frame(0x1581A002, &[]),
            Err(FrameParseError::MalformedPayload(0))
        );
        assert_eq!(
            decode_frame(0x1581A002, &[0xF0, 0x00, 0x00, 0x01, 0x44, 0x2F, 0x00]),
            Err(FrameParseError::MalformedPayload(7))
        );
        assert_eq!(
            decode_frame(0x1581A002, &[0; 9]),
            Err(FrameParseError::MalformedPayload(9))
        );
    }

    #[test]
    fn register_value_round_trip() {
        let id = build_frame_id(0x01, 0xA0);

        for definition in registers() {
            let is_float = definition.kind.is_float();

            for value in [0.0, 1.0, 7.0, 53.25, -12.5, 750.0, 123456.0] {
                let payload = build_data_payload(definition.address, value, is_float);
                let decoded = decode_frame(id, &payload).unwrap();

                assert_eq!(decoded.register, definition.address);

                let expected = if is_float { value } else { (value as i32) as f64 };
                assert_eq!(decoded.value.as_f64(), Some(expected), "{}", definition.name);
            }
        }
    }

    #[test]
    fn inexact_float_round_trip() {
        let id = build_frame_id(0x01, 0xA0);

        for value in [12.34, 0.1, 99.99, -0.01, 0.07, 1234.56, -987.65] {
            let payload = build_data_payload(0x0021, value, true);
            let decoded = decode_frame(id, &payload).unwrap();
            assert_eq!(decoded.value, DecodedValue::Float(value));
        }

        for cents in -100_000i32..=100_000 {
            let value = cents as f64 / 100.0;
            let payload = build_data_payload(0x0021, value, true);
            let decoded = decode_frame(id, &payload).unwrap();
            assert_eq!(decoded.value.as_f64(), Some(value), "{cents}");
        }
    }

    #[test]
    fn float_display_has_two_decimals() {
        assert_eq!(text(&DecodedValue::Float(700.0)).as_str(), "700.00");
        assert_eq!(text(&DecodedValue::Float(-0.5)).as_str(), "-0.50");
        assert_eq!(text(&DecodedValue::Float(12.34)).as_str(), "12.34");
    }

    #[test]
    fn decode_transcripts() {
        let decoded = decode_transcript("1581A002 F0000001442F0000").unwrap();
        assert_eq!(decoded.register, 0x0001);
        assert_eq!(decoded.value, DecodedValue::Float(700.0));

        // The top 3 bits lie outside the 29-bit space but still decode
        let decoded = decode_transcript("FFFFFFFF F0000001442F0000").unwrap();
        assert_eq!(
            decoded.frame_id,
            FrameId {
                mxr_id: 0x1F,
                module_type: 0xFF,
                destination: 0xFF,
                source: 0xFF,
            }
        );
        assert_eq!(decoded.value, DecodedValue::Float(700.0));

        assert_eq!(
            decode_transcript("1581A002"),
            Err(FrameParseError::InvalidTranscriptLength(8))
        );
    }

    #[test]
    fn integer_extremes_round_trip() {
        let id = build_frame_id(0x01, 0xA0);

        for value in [i32::MIN, -1, i32::MAX] {
            let payload = build_data_payload(0x0103, value as f64, false);
            let decoded = decode_frame(id, &payload).unwrap();
            assert_eq!(decoded.value, DecodedValue::Integer(value));
        }
    }

    #[test]
    fn float_rounding() {
        assert_eq!(round_hundredths(12.344), 12.34);
        assert_eq!(round_hundredths(-0.125), -0.13);
        assert_eq!(round_hundredths(0.125), 0.13);
        assert_eq!(round_hundredths(0.625), 0.63);
        assert_eq!(round_hundredths(0.0), 0.0);
        assert!(round_hundredths(f32::NAN).is_nan());
        assert_eq!(round_hundredths(f32::INFINITY), f64::INFINITY);
        assert_eq!(round_hundredths(f32::MAX), f32::MAX as f64);
    }
}
