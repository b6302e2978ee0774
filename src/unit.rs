//! Transport stream units.
//!
//! Reference: ISO/IEC 13818-1, section 2.4.3.
use std::fmt::Display;

use serde::Serialize;

/// Size in bytes of a single framing unit.
pub const UNIT_LEN: usize = 188;

/// Value of the first byte of every unit.
pub const SYNC_BYTE: u8 = 0x47;

/// 13-bit channel identifier.
pub type Pid = u16;

/// Decoded 4 byte unit header.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitHeader {
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub transport_priority: bool,
    pub pid: Pid,
    pub scrambling_control: u8,
    pub adaptation_field_control: u8,
    pub continuity_counter: u8,
}

impl UnitHeader {
    /// Header length in bytes
    pub const LEN: usize = 4;

    /// Construct from the provided bytes, or `None` if there are not enough bytes.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Self> {
        if dat.len() < Self::LEN {
            return None;
        }
        Some(Self::from_bytes(dat))
    }

    fn from_bytes(dat: &[u8]) -> Self {
        UnitHeader {
            transport_error: dat[1] & 0x80 != 0,
            payload_unit_start: dat[1] & 0x40 != 0,
            transport_priority: dat[1] & 0x20 != 0,
            pid: pid(dat),
            scrambling_control: (dat[3] >> 6) & 0x3,
            adaptation_field_control: (dat[3] >> 4) & 0x3,
            continuity_counter: dat[3] & 0xf,
        }
    }

    #[must_use]
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control & 0x2 != 0
    }

    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control & 0x1 != 0
    }
}

/// Extract the 13-bit PID from the second and third header bytes.
///
/// Callers must provide at least 3 bytes.
#[must_use]
pub fn pid(dat: &[u8]) -> Pid {
    (u16::from(dat[1] & 0x1f) << 8) | u16::from(dat[2])
}

/// A single synchronized framing unit.
///
/// Always exactly [UNIT_LEN] bytes with a first byte of [SYNC_BYTE].
///
/// # Example
/// ```
/// use tsmeta::unit::{Unit, UNIT_LEN, SYNC_BYTE};
///
/// let mut dat = [0xffu8; UNIT_LEN];
/// dat[0] = SYNC_BYTE;
/// dat[1] = 0x40;
/// dat[2] = 0x00;
/// dat[3] = 0x10;
/// let unit = Unit::decode(&dat).unwrap();
/// assert_eq!(unit.pid(), 0);
/// assert!(unit.header().payload_unit_start);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Unit {
    data: [u8; UNIT_LEN],
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("header", &self.header())
            .finish_non_exhaustive()
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hdr = self.header();
        write!(
            f,
            "Unit{{pid: {:#06x}, pusi: {}, cc: {}}}",
            hdr.pid, hdr.payload_unit_start, hdr.continuity_counter
        )
    }
}

impl Unit {
    /// Construct from exactly [UNIT_LEN] bytes. Returns `None` for a short buffer or
    /// a missing sync byte.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Unit> {
        if dat.len() != UNIT_LEN || dat[0] != SYNC_BYTE {
            return None;
        }
        let mut data = [0u8; UNIT_LEN];
        data.copy_from_slice(dat);
        Some(Unit { data })
    }

    pub(crate) fn from_array(data: [u8; UNIT_LEN]) -> Unit {
        debug_assert_eq!(data[0], SYNC_BYTE);
        Unit { data }
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        pid(&self.data)
    }

    #[must_use]
    pub fn header(&self) -> UnitHeader {
        UnitHeader::from_bytes(&self.data)
    }

    /// All unit bytes, header included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload bytes following the header and any adaptation field. Empty if the
    /// unit carries no payload or the adaptation field length is bogus.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        payload(&self.data)
    }
}

/// Payload of raw unit bytes. See [Unit::payload].
#[must_use]
pub fn payload(dat: &[u8]) -> &[u8] {
    let Some(hdr) = UnitHeader::decode(dat) else {
        return &[];
    };
    if !hdr.has_payload() {
        return &[];
    }
    let mut start = UnitHeader::LEN;
    if hdr.has_adaptation_field() {
        match dat.get(UnitHeader::LEN) {
            Some(len) => start += 1 + usize::from(*len),
            None => return &[],
        }
    }
    if start >= dat.len() {
        return &[];
    }
    &dat[start..]
}
