pub mod codec;
pub mod protocol;
pub mod sequencer;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use codec::{BeaconUuid, CodecError};
pub use protocol::error::DecodeError;
pub use protocol::frame::{DecodedFrame, IBeaconFrame, decode};
pub use protocol::measurement::{Measurement, MeasurementKind};
pub use sequencer::{Observation, SequencerState};

// Names and payloads are fixed once a scanner hands them over.
type BoxStr = Box<str>;
type BoxList<T> = Box<[T]>;

/// Hardware address of a broadcasting device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress(pub [u8; 6]);

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// A single advertisement event as delivered by a scanner.
///
/// The core only ever looks at `bytes`; the remaining fields identify where
/// the broadcast came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertisement {
    /// Address of the broadcaster.
    pub address: DeviceAddress,
    /// Advertised local name, when the scan response carried one.
    pub name: Option<BoxStr>,
    /// Received signal strength in dBm.
    pub rssi: i16,
    /// Raw advertisement payload.
    pub bytes: BoxList<u8>,
    /// When the scanner saw this advertisement.
    pub received_at: jiff::Timestamp,
}

/// Kind field of a [`MeasurementReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportKind {
    /// A recognised kind, by its wire name.
    Named(BoxStr),
    /// An unrecognised kind, forwarded as the raw code.
    Raw(u8),
}

/// JSON body posted to the measurement endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub tipo: ReportKind,
    pub valor: i64,
}

impl From<&Measurement> for MeasurementReport {
    fn from(measurement: &Measurement) -> Self {
        let tipo = match measurement.kind.wire_name() {
            Some(name) => ReportKind::Named(name.into()),
            None => ReportKind::Raw(measurement.kind.code()),
        };

        Self {
            tipo,
            valor: measurement.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_address_renders_as_colon_hex() {
        let address = DeviceAddress([0xC0, 0x01, 0x02, 0xAB, 0x0F, 0xFF]);
        assert_eq!(address.to_string(), "C0:01:02:AB:0F:FF");
    }

    #[test]
    fn report_uses_wire_names() {
        let gas = Measurement {
            kind: MeasurementKind::Gas,
            counter: 1,
            value: 133,
        };
        let json = serde_json::to_value(MeasurementReport::from(&gas)).unwrap();
        assert_eq!(json, serde_json::json!({ "tipo": "gas", "valor": 133 }));

        let temp = Measurement {
            kind: MeasurementKind::Temperature,
            counter: 2,
            value: -12,
        };
        let json = serde_json::to_value(MeasurementReport::from(&temp)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "tipo": "temperatura", "valor": -12 })
        );
    }

    #[test]
    fn report_forwards_unknown_code() {
        let noise = Measurement {
            kind: MeasurementKind::Unknown(13),
            counter: 9,
            value: 40,
        };
        let json = serde_json::to_value(MeasurementReport::from(&noise)).unwrap();
        assert_eq!(json, serde_json::json!({ "tipo": 13, "valor": 40 }));
    }
}
