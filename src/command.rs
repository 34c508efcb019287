use crate::{
    frame::{build_data_payload, CanFrame},
    register::{lookup, RegisterDefinition},
    MONITOR_ADDRESS, PAYLOAD_LENGTH,
};

/// The value written to a register, in its wire representation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterValue {
    Float(f32),
    Int(i32),
}

impl RegisterValue {
    /// Converts `value` to the representation `definition` expects.
    pub fn for_register(definition: &RegisterDefinition, value: f64) -> Self {
        if definition.kind.is_float() {
            Self::Float(value as f32)
        } else {
            Self::Int(value as i32)
        }
    }
}

/// A host request writing one register of one module
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    destination: u8,
    source: u8,
    register: &'static RegisterDefinition,
    value: RegisterValue,
}

impl Command {
    /// Creates a command setting `register` on the module at `destination`.
    /// The register must be writable; its kind decides whether `value` is
    /// sent as a float or an integer.
    pub fn new(destination: u8, register: u16, value: f64) -> Result<Self, CommandError> {
        let definition = writable(register)?;

        Ok(Self {
            destination,
            source: MONITOR_ADDRESS,
            register: definition,
            value: RegisterValue::for_register(definition, value),
        })
    }

    /// Creates a command selecting one of the register's labelled options,
    /// e.g. "Power Off".
    pub fn from_label(destination: u8, register: u16, label: &str) -> Result<Self, CommandError> {
        let definition = writable(register)?;
        let value = definition
            .option_value(label)
            .ok_or(CommandError::UnknownOption(register))?;

        Ok(Self {
            destination,
            source: MONITOR_ADDRESS,
            register: definition,
            value: RegisterValue::Int(value),
        })
    }

    /// Consumes self and returns a new self sent from `source` instead of the
    /// monitor address
    pub fn with_source(mut self, source: u8) -> Self {
        self.source = source;
        self
    }

    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn register(&self) -> &'static RegisterDefinition {
        self.register
    }

    pub fn value(&self) -> RegisterValue {
        self.value
    }

    pub fn payload(&self) -> [u8; PAYLOAD_LENGTH] {
        let (value, is_float) = match self.value {
            RegisterValue::Float(value) => (value as f64, true),
            RegisterValue::Int(value) => (value as f64, false),
        };

        build_data_payload(self.register.address, value, is_float)
    }

    pub fn to_frame(&self) -> CanFrame {
        CanFrame::addressed(self.destination, self.source, self.payload())
    }
}

fn writable(register: u16) -> Result<&'static RegisterDefinition, CommandError> {
    let definition = lookup(register).ok_or(CommandError::UnknownRegister(register))?;

    if !definition.kind.is_writable() {
        return Err(CommandError::NotWritable(register));
    }

    Ok(definition)
}

/// Errors raised while building a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    #[error("Register ({0:#06X}) is not in the register table")]
    UnknownRegister(u16),
    #[error("Register ({0:#06X}) is read-only")]
    NotWritable(u16),
    #[error("Register ({0:#06X}) has no option with the given label")]
    UnknownOption(u16),
}
