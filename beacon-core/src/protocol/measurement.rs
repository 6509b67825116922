use serde::{Deserialize, Serialize};

use super::frame::DecodedFrame;
use crate::codec::{signed_from_be, unsigned_from_be};

/// What a sensor board is reporting, carried in the high byte of `major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementKind {
    /// CO2 / gas concentration.
    Gas,
    /// Temperature in degrees Celsius.
    Temperature,
    /// Any other code, kept as is.
    Unknown(u8),
}

impl MeasurementKind {
    pub const GAS_CODE: u8 = 11;
    pub const TEMPERATURE_CODE: u8 = 12;

    pub fn code(self) -> u8 {
        match self {
            MeasurementKind::Gas => Self::GAS_CODE,
            MeasurementKind::Temperature => Self::TEMPERATURE_CODE,
            MeasurementKind::Unknown(code) => code,
        }
    }

    /// Name used in the reporting endpoint's `tipo` field.
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            MeasurementKind::Gas => Some("gas"),
            MeasurementKind::Temperature => Some("temperatura"),
            MeasurementKind::Unknown(_) => None,
        }
    }

    /// `major` as the boards compose it: kind code high, counter low.
    pub fn major(self, counter: u8) -> u16 {
        (u16::from(self.code()) << 8) | u16::from(counter)
    }
}

impl From<u8> for MeasurementKind {
    fn from(code: u8) -> Self {
        match code {
            Self::GAS_CODE => MeasurementKind::Gas,
            Self::TEMPERATURE_CODE => MeasurementKind::Temperature,
            other => MeasurementKind::Unknown(other),
        }
    }
}

/// A reading extracted from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub kind: MeasurementKind,
    /// Rolling counter, bumped by the broadcaster for every new reading.
    pub counter: u8,
    pub value: i64,
}

impl Measurement {
    pub fn extract(frame: &DecodedFrame) -> Self {
        let [kind, counter] = frame.major;

        Self {
            kind: MeasurementKind::from(unsigned_from_be([kind]) as u8),
            counter: unsigned_from_be([counter]) as u8,
            value: signed_from_be(frame.minor),
        }
    }
}
