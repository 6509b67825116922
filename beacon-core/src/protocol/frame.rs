use std::borrow::Cow;

use super::error::{DecodeError, DecodeResult};
use super::measurement::Measurement;
use super::*;
use crate::codec::{BeaconUuid, signed_from_be, unsigned_from_be};

// frame structure : flags(3) + ad header(2) + company id(2) + type(1) + length(1)
//                   + uuid(16) + major(2) + minor(2) + tx power(1)

const ADV_FLAGS: usize = 0;
const ADV_HEADER: usize = 3;
const COMPANY_ID: usize = 5;
const BEACON_TYPE: usize = 7;
const BEACON_LENGTH: usize = 8;
const UUID: usize = 9;
const MAJOR: usize = 25;
const MINOR: usize = 27;
const TX_POWER: usize = 29;

/// Makes sure the flags preamble is present.
///
/// Some scan APIs hand over the advertisement data with the flags structure
/// already stripped; those buffers get the preamble put back in front.
pub fn canonicalize(raw: &[u8]) -> Cow<'_, [u8]> {
    if raw.starts_with(&FLAGS_PREAMBLE) {
        Cow::Borrowed(raw)
    } else {
        let mut buf = Vec::with_capacity(FLAGS_PREAMBLE.len() + raw.len());
        buf.extend_from_slice(&FLAGS_PREAMBLE);
        buf.extend_from_slice(raw);
        Cow::Owned(buf)
    }
}

/// Decodes a raw advertisement into its fixed fields.
pub fn decode(raw: &[u8]) -> DecodeResult<DecodedFrame> {
    DecodedFrame::from_bytes(raw)
}

fn take<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

/// An iBeacon advertisement split into its fields.
///
/// Every field is copied out of the input, so a frame never borrows from the
/// buffer it was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub adv_flags: [u8; 3],
    pub adv_header: [u8; 2],
    pub company_id: [u8; 2],
    pub beacon_type: u8,
    pub beacon_length: u8,
    pub uuid: BeaconUuid,
    /// Repurposed: `[measurement kind, rolling counter]`.
    pub major: [u8; 2],
    /// Repurposed: measurement value, big-endian signed.
    pub minor: [u8; 2],
    pub tx_power: u8,
}

impl DecodedFrame {
    pub fn from_bytes(raw: &[u8]) -> DecodeResult<Self> {
        let buf = canonicalize(raw);

        if buf.len() < FRAME_LEN {
            return Err(DecodeError::TooShort {
                needed: FRAME_LEN,
                available: buf.len(),
            });
        }

        Ok(Self {
            adv_flags: take(&buf, ADV_FLAGS),
            adv_header: take(&buf, ADV_HEADER),
            company_id: take(&buf, COMPANY_ID),
            beacon_type: buf[BEACON_TYPE],
            beacon_length: buf[BEACON_LENGTH],
            uuid: BeaconUuid(take(&buf, UUID)),
            major: take(&buf, MAJOR),
            minor: take(&buf, MINOR),
            tx_power: buf[TX_POWER],
        })
    }

    /// The 30-byte canonical buffer, fields concatenated in offset order.
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];

        bytes[..UUID].copy_from_slice(&self.prefix());
        bytes[UUID..MAJOR].copy_from_slice(&self.uuid.0);
        bytes[MAJOR..MINOR].copy_from_slice(&self.major);
        bytes[MINOR..TX_POWER].copy_from_slice(&self.minor);
        bytes[TX_POWER] = self.tx_power;

        bytes
    }

    /// Flags, AD header, company id, type and length: the first 9 bytes.
    pub fn prefix(&self) -> [u8; PREFIX_LEN] {
        let mut prefix = [0u8; PREFIX_LEN];

        prefix[ADV_FLAGS..ADV_HEADER].copy_from_slice(&self.adv_flags);
        prefix[ADV_HEADER..COMPANY_ID].copy_from_slice(&self.adv_header);
        prefix[COMPANY_ID..BEACON_TYPE].copy_from_slice(&self.company_id);
        prefix[BEACON_TYPE] = self.beacon_type;
        prefix[BEACON_LENGTH] = self.beacon_length;

        prefix
    }

    /// Manufacturer id; it is broadcast little-endian (`4C 00` is Apple).
    pub fn company(&self) -> u16 {
        u16::from_le_bytes(self.company_id)
    }

    pub fn major_value(&self) -> u16 {
        unsigned_from_be(self.major) as u16
    }

    pub fn minor_value(&self) -> i16 {
        signed_from_be(self.minor) as i16
    }

    pub fn tx_power_dbm(&self) -> i8 {
        self.tx_power as i8
    }

    pub fn measurement(&self) -> Measurement {
        Measurement::extract(self)
    }
}

/// The frame a sensor board broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IBeaconFrame {
    pub uuid: BeaconUuid,
    pub major: u16,
    pub minor: i16,
    pub tx_power: i8,
    pub company_id: u16,
}

impl IBeaconFrame {
    pub fn new(uuid: BeaconUuid, major: u16, minor: i16, tx_power: i8) -> Self {
        Self {
            uuid,
            major,
            minor,
            tx_power,
            company_id: APPLE_COMPANY_ID,
        }
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];

        bytes[ADV_FLAGS..ADV_HEADER].copy_from_slice(&FLAGS_PREAMBLE);
        bytes[ADV_HEADER..COMPANY_ID].copy_from_slice(&IBEACON_AD_HEADER);
        bytes[COMPANY_ID..BEACON_TYPE].copy_from_slice(&self.company_id.to_le_bytes());
        bytes[BEACON_TYPE] = IBEACON_TYPE;
        bytes[BEACON_LENGTH] = IBEACON_LENGTH;
        bytes[UUID..MAJOR].copy_from_slice(&self.uuid.0);
        bytes[MAJOR..MINOR].copy_from_slice(&self.major.to_be_bytes());
        bytes[MINOR..TX_POWER].copy_from_slice(&self.minor.to_be_bytes());
        bytes[TX_POWER] = self.tx_power as u8;

        bytes
    }

    /// Same frame without the flags structure.
    pub fn to_stripped_bytes(&self) -> Vec<u8> {
        self.to_bytes()[FLAGS_PREAMBLE.len()..].to_vec()
    }
}
