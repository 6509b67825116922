use std::collections::HashMap;

use beacon_core::codec::{bytes_to_hex, bytes_to_latin1};
use beacon_core::{
    Advertisement, BeaconUuid, DecodeError, DecodedFrame, DeviceAddress, Measurement,
    Observation, SequencerState, decode,
};
use tracing::{debug, warn};

/// What happened to one advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new reading, to be reported.
    Accepted(Measurement),
    /// The broadcaster is still advertising a reading we already accepted.
    Duplicate(Measurement),
    /// Not from a broadcaster we are looking for.
    Filtered,
    /// The frame could not be decoded and was dropped.
    Rejected(DecodeError),
}

/// Drives the decoder and sequencers for every active scan session.
///
/// Each scan source (a bridge connection, the mock board) runs its own
/// session, and sequencer state is kept per broadcaster address within it.
/// Starting or ending one source's session never touches another's. The
/// whole value is owned by a single task, so none of this needs locking.
#[derive(Debug, Default)]
pub struct ScanSession {
    device_name: Option<String>,
    beacon_uuid: Option<BeaconUuid>,
    sources: HashMap<String, HashMap<DeviceAddress, SequencerState>>,
}

impl ScanSession {
    pub fn new(device_name: Option<String>, beacon_uuid: Option<BeaconUuid>) -> Self {
        Self {
            device_name,
            beacon_uuid,
            sources: HashMap::new(),
        }
    }

    /// Starts a fresh session for `source`, forgetting the counters it saw
    /// before.
    pub fn begin(&mut self, source: &str) {
        self.sources.insert(source.to_owned(), HashMap::new());
    }

    /// Drops everything tracked for `source`.
    pub fn end(&mut self, source: &str) {
        self.sources.remove(source);
    }

    /// Broadcasters tracked across all sessions.
    pub fn tracked_devices(&self) -> usize {
        self.sources.values().map(HashMap::len).sum()
    }

    pub fn active_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn process(&mut self, source: &str, adv: &Advertisement) -> Outcome {
        if let Some(wanted) = &self.device_name {
            if adv.name.as_deref() != Some(wanted.as_str()) {
                return Outcome::Filtered;
            }
        }

        let frame = match decode(&adv.bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    address = %adv.address,
                    error = %e,
                    bytes = %bytes_to_hex(&adv.bytes),
                    "Dropping undecodable frame"
                );
                return Outcome::Rejected(e);
            }
        };

        if self.beacon_uuid.is_some_and(|wanted| frame.uuid != wanted) {
            return Outcome::Filtered;
        }

        log_frame(adv, &frame);

        let measurement = Measurement::extract(&frame);
        let state = self
            .sources
            .entry(source.to_owned())
            .or_default()
            .entry(adv.address)
            .or_default();
        let (next, observation) = state.observe(measurement.counter);
        *state = next;

        match observation {
            Observation::Accepted => Outcome::Accepted(measurement),
            Observation::Duplicate => {
                debug!(
                    %source,
                    address = %adv.address,
                    counter = measurement.counter,
                    "Repeated counter, skipping"
                );
                Outcome::Duplicate(measurement)
            }
        }
    }
}

fn log_frame(adv: &Advertisement, frame: &DecodedFrame) {
    debug!(
        address = %adv.address,
        name = ?adv.name,
        rssi = adv.rssi,
        len = adv.bytes.len(),
        bytes = %bytes_to_hex(&adv.bytes),
        "Advertisement"
    );
    debug!(
        prefix = %bytes_to_hex(&frame.prefix()),
        adv_flags = %bytes_to_hex(&frame.adv_flags),
        adv_header = %bytes_to_hex(&frame.adv_header),
        company_id = %bytes_to_hex(&frame.company_id),
        beacon_type = format_args!("{:#04x}", frame.beacon_type),
        beacon_length = frame.beacon_length,
        "iBeacon prefix"
    );
    debug!(
        uuid = %frame.uuid.to_hex(),
        uuid_text = %bytes_to_latin1(&frame.uuid.0),
        major = %bytes_to_hex(&frame.major),
        major_value = frame.major_value(),
        kind = frame.major[0],
        counter = frame.major[1],
        minor = %bytes_to_hex(&frame.minor),
        value = frame.minor_value(),
        tx_power = frame.tx_power_dbm(),
        "iBeacon payload"
    );
}
