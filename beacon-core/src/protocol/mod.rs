pub mod error;
pub mod frame;
pub mod measurement;

/// Standard BLE flags AD structure: length 2, type 0x01, LE general discoverable.
pub const FLAGS_PREAMBLE: [u8; 3] = [0x02, 0x01, 0x06];
pub const FRAME_LEN: usize = 30;
pub const PREFIX_LEN: usize = 9;

/// Manufacturer id broadcast by the sensor boards (Apple's iBeacon id).
pub const APPLE_COMPANY_ID: u16 = 0x004C;
pub const IBEACON_TYPE: u8 = 0x02;
/// Length of the iBeacon payload that follows the length byte.
pub const IBEACON_LENGTH: u8 = 0x15;
/// Manufacturer specific AD structure: 26 bytes follow, type 0xFF.
pub const IBEACON_AD_HEADER: [u8; 2] = [0x1A, 0xFF];
