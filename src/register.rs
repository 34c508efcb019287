use crate::ALARM_REGISTER;

/// How a register is accessed and how its 32-bit payload value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterKind {
    /// Telemetry encoded as an IEEE-754 single precision float
    ReadOnlyFloat,
    /// Telemetry encoded as a signed 32-bit integer
    ReadOnlyInt,
    /// Setting encoded as an IEEE-754 single precision float
    WriteOnlyFloat,
    /// Setting or command encoded as a signed 32-bit integer
    WriteOnlyInt,
}

impl RegisterKind {
    pub const fn is_float(&self) -> bool {
        match self {
            Self::ReadOnlyFloat | Self::WriteOnlyFloat => true,
            Self::ReadOnlyInt | Self::WriteOnlyInt => false,
        }
    }

    pub const fn is_readable(&self) -> bool {
        match self {
            Self::ReadOnlyFloat | Self::ReadOnlyInt => true,
            Self::WriteOnlyFloat | Self::WriteOnlyInt => false,
        }
    }

    pub const fn is_writable(&self) -> bool {
        !self.is_readable()
    }
}

/// A labelled value of an enumerated register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterOption {
    pub value: i32,
    pub label: &'static str,
}

const fn option(value: i32, label: &'static str) -> RegisterOption {
    RegisterOption { value, label }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDefinition {
    pub address: u16,
    pub name: &'static str,
    pub kind: RegisterKind,
    pub unit: Option<&'static str>,
    pub description: &'static str,
    /// Labels for enumerated values, empty for plain numeric registers
    pub options: &'static [RegisterOption],
}

impl RegisterDefinition {
    /// Gets the label attached to an exact integer value, if any.
    pub fn option_label(&self, value: i32) -> Option<&'static str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label)
    }

    /// Reverse lookup of [`option_label`](Self::option_label), ignoring
    /// ASCII case.
    pub fn option_value(&self, label: &str) -> Option<i32> {
        self.options
            .iter()
            .find(|option| option.label.eq_ignore_ascii_case(label))
            .map(|option| option.value)
    }

    pub fn is_alarm_bitmap(&self) -> bool {
        self.address == ALARM_REGISTER
    }
}

const fn register(
    address: u16,
    name: &'static str,
    kind: RegisterKind,
    unit: Option<&'static str>,
    description: &'static str,
) -> RegisterDefinition {
    RegisterDefinition {
        address,
        name,
        kind,
        unit,
        description,
        options: &[],
    }
}

const fn enumerated(
    address: u16,
    name: &'static str,
    kind: RegisterKind,
    description: &'static str,
    options: &'static [RegisterOption],
) -> RegisterDefinition {
    RegisterDefinition {
        address,
        name,
        kind,
        unit: None,
        description,
        options,
    }
}

use RegisterKind::{ReadOnlyFloat, ReadOnlyInt, WriteOnlyFloat, WriteOnlyInt};

const POWER_OPTIONS: &[RegisterOption] = &[option(0, "Power On"), option(1, "Power Off")];

const FAN_MODE_OPTIONS: &[RegisterOption] = &[option(0, "Auto"), option(1, "Full Speed")];

const STATUS_OPTIONS: &[RegisterOption] = &[
    option(0, "Off"),
    option(1, "Initializing"),
    option(2, "Standby"),
    option(3, "Soft Start"),
    option(4, "Derating"),
    option(5, "Fault"),
    option(6, "Protection Lock"),
    option(7, "Running"),
];

/// Every register known to the module, sorted by address.
static REGISTERS: [RegisterDefinition; 19] = [
    register(0x0001, "Output Voltage", ReadOnlyFloat, Some("V"), "Measured DC output voltage"),
    register(0x0002, "Output Current", ReadOnlyFloat, Some("A"), "Measured DC output current"),
    register(0x0003, "Output Current Limit", ReadOnlyFloat, Some("A"), "Active output current limit"),
    register(0x0004, "DC Board Temperature", ReadOnlyFloat, Some("°C"), "Temperature of the DC/DC stage"),
    register(0x0005, "Input Voltage", ReadOnlyFloat, Some("V"), "AC line voltage"),
    register(0x0006, "PFC Bus Voltage", ReadOnlyFloat, Some("V"), "Voltage of the PFC bus"),
    register(0x0008, "Ambient Temperature", ReadOnlyFloat, Some("°C"), "Air inlet temperature"),
    register(0x000A, "Input Power", ReadOnlyFloat, Some("W"), "AC input power"),
    register(0x000B, "Output Power", ReadOnlyFloat, Some("W"), "DC output power"),
    register(0x0021, "Set Output Voltage", WriteOnlyFloat, Some("V"), "Output voltage setpoint"),
    register(0x0022, "Set Output Current Limit", WriteOnlyFloat, Some("A"), "Output current limit setpoint"),
    register(0x0023, "Set Output Power Limit", WriteOnlyFloat, Some("W"), "Output power limit setpoint"),
    enumerated(0x0030, "Power On/Off", WriteOnlyInt, "Starts or stops the module output", POWER_OPTIONS),
    enumerated(0x0031, "Fan Mode", WriteOnlyInt, "Fan speed control policy", FAN_MODE_OPTIONS),
    register(0x0032, "Set Group Number", WriteOnlyInt, None, "Group the module belongs to"),
    register(ALARM_REGISTER, "Alarm Status", ReadOnlyInt, None, "Bitmap of active alarms"),
    enumerated(0x0101, "Status", ReadOnlyInt, "Operating state of the module", STATUS_OPTIONS),
    register(0x0102, "Group Number", ReadOnlyInt, None, "Group the module belongs to"),
    register(0x0103, "Running Time", ReadOnlyInt, Some("h"), "Accumulated output-on time"),
];

/// Looks up the definition of a register address.
pub fn lookup(address: u16) -> Option<&'static RegisterDefinition> {
    REGISTERS
        .binary_search_by_key(&address, |definition| definition.address)
        .ok()
        .map(|index| &REGISTERS[index])
}

/// All register definitions in address order
pub fn registers() -> &'static [RegisterDefinition] {
    &REGISTERS
}

/// Registers which a host sets (commands and setpoints)
pub fn writable_registers() -> impl Iterator<Item = &'static RegisterDefinition> {
    REGISTERS.iter().filter(|definition| definition.kind.is_writable())
}

/// Registers which a module reports (telemetry)
pub fn readable_registers() -> impl Iterator<Item = &'static RegisterDefinition> {
    REGISTERS.iter().filter(|definition| definition.kind.is_readable())
}

/// Labels of the [`ALARM_REGISTER`] bitmap, indexed by bit position.
pub static ALARM_LABELS: [&str; 32] = [
    "Input Overvoltage",
    "Input Undervoltage",
    "Output Overvoltage",
    "Output Undervoltage",
    "Output Overcurrent",
    "Output Short Circuit",
    "Over Temperature",
    "Fan Fault",
    "PFC Fault",
    "DC/DC Fault",
    "Input Phase Loss",
    "Input Frequency Abnormal",
    "CAN Communication Fault",
    "Module Address Conflict",
    "EEPROM Fault",
    "Output Derating",
    "Power Limit Active",
    "Ambient Temperature Abnormal",
    "Discharge Fault",
    "Output Relay Fault",
    "Reserved (bit 20)",
    "Reserved (bit 21)",
    "Reserved (bit 22)",
    "Reserved (bit 23)",
    "Reserved (bit 24)",
    "Reserved (bit 25)",
    "Reserved (bit 26)",
    "Reserved (bit 27)",
    "Reserved (bit 28)",
    "Reserved (bit 29)",
    "Reserved (bit 30)",
    "Reserved (bit 31)",
];

pub fn alarm_label(bit: u32) -> Option<&'static str> {
    ALARM_LABELS.get(bit as usize).copied()
}
