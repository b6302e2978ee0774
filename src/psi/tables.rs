use chrono::Duration;
use serde::Serialize;

use super::section::{take, take_loop, take_u16, Section};
use crate::timecode::{decode_date_bytes, decode_duration, BroadcastTime};
use crate::unit::Pid;
use crate::{Error, Result};

pub mod table_id {
    pub const PAT: u8 = 0x00;
    pub const NIT_ACTUAL: u8 = 0x40;
    pub const NIT_OTHER: u8 = 0x41;
    pub const EIT_PF_ACTUAL: u8 = 0x4e;
    pub const EIT_PF_OTHER: u8 = 0x4f;
    pub const EIT_SCHEDULE_FIRST: u8 = 0x50;
    pub const EIT_SCHEDULE_LAST: u8 = 0x6f;
}

/// A PAT entry. Program number 0 points at the NIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Program {
    pub number: u16,
    pub pid: Pid,
}

/// Program Association Table section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pat {
    pub transport_stream_id: u16,
    pub version: u8,
    pub current_next: bool,
    pub programs: Vec<Program>,
}

impl Pat {
    pub fn decode(section: &Section) -> Result<Pat> {
        if section.table_id != table_id::PAT {
            return Err(Error::Section(format!(
                "table {:#04x} is not a PAT",
                section.table_id
            )));
        }
        if section.data.len() % 4 != 0 {
            return Err(Error::Section(format!(
                "PAT data length {} is not a multiple of 4",
                section.data.len()
            )));
        }
        let programs = section
            .data
            .chunks_exact(4)
            .map(|x| Program {
                number: u16::from_be_bytes([x[0], x[1]]),
                pid: u16::from_be_bytes([x[2], x[3]]) & 0x1fff,
            })
            .collect();

        Ok(Pat {
            transport_stream_id: section.extension,
            version: section.version,
            current_next: section.current_next,
            programs,
        })
    }
}

/// A transport stream entry of the NIT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NitStream<'a> {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    /// Raw descriptor loop
    pub descriptors: &'a [u8],
}

/// Network Information Table section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nit<'a> {
    pub network_id: u16,
    /// True for the actual network, false for other networks.
    pub actual: bool,
    pub version: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    /// Raw network descriptor loop
    pub descriptors: &'a [u8],
    pub streams: Vec<NitStream<'a>>,
}

impl<'a> Nit<'a> {
    pub fn decode(section: &Section<'a>) -> Result<Nit<'a>> {
        let actual = match section.table_id {
            table_id::NIT_ACTUAL => true,
            table_id::NIT_OTHER => false,
            x => return Err(Error::Section(format!("table {x:#04x} is not a NIT"))),
        };
        let mut dat = section.data;
        let descriptors = take_loop(&mut dat, "NIT network descriptors")?;
        let mut ts_loop = take_loop(&mut dat, "NIT transport stream loop")?;

        let mut streams = Vec::new();
        while !ts_loop.is_empty() {
            streams.push(NitStream {
                transport_stream_id: take_u16(&mut ts_loop, "NIT transport_stream_id")?,
                original_network_id: take_u16(&mut ts_loop, "NIT original_network_id")?,
                descriptors: take_loop(&mut ts_loop, "NIT transport descriptors")?,
            });
        }

        Ok(Nit {
            network_id: section.extension,
            actual,
            version: section.version,
            section_number: section.section_number,
            last_section_number: section.last_section_number,
            descriptors,
            streams,
        })
    }
}

/// Event entry of an EIT section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EitEvent<'a> {
    pub event_id: u16,
    pub start: BroadcastTime,
    pub duration: Duration,
    pub running_status: u8,
    pub free_ca: bool,
    /// Raw descriptor loop
    pub descriptors: &'a [u8],
}

/// Event Information Table section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eit<'a> {
    pub table_id: u8,
    pub service_id: u16,
    pub version: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub segment_last_section_number: u8,
    pub last_table_id: u8,
    pub events: Vec<EitEvent<'a>>,
}

impl<'a> Eit<'a> {
    pub fn decode(section: &Section<'a>) -> Result<Eit<'a>> {
        if !(table_id::EIT_PF_ACTUAL..=table_id::EIT_SCHEDULE_LAST).contains(&section.table_id) {
            return Err(Error::Section(format!(
                "table {:#04x} is not an EIT",
                section.table_id
            )));
        }
        let mut dat = section.data;
        let transport_stream_id = take_u16(&mut dat, "EIT transport_stream_id")?;
        let original_network_id = take_u16(&mut dat, "EIT original_network_id")?;
        let x = take(&mut dat, 2, "EIT segment info")?;
        let (segment_last_section_number, last_table_id) = (x[0], x[1]);

        let mut events = Vec::new();
        while !dat.is_empty() {
            let event_id = take_u16(&mut dat, "EIT event_id")?;
            let start = decode_date_bytes(take(&mut dat, 5, "EIT start_time")?);
            let x = take(&mut dat, 3, "EIT duration")?;
            let duration = decode_duration(u32::from_be_bytes([0, x[0], x[1], x[2]]));
            let flags = dat.first().copied().unwrap_or_default();
            events.push(EitEvent {
                event_id,
                start,
                duration,
                running_status: flags >> 5,
                free_ca: flags & 0x10 != 0,
                descriptors: take_loop(&mut dat, "EIT event descriptors")?,
            });
        }

        Ok(Eit {
            table_id: section.table_id,
            service_id: section.extension,
            version: section.version,
            section_number: section.section_number,
            last_section_number: section.last_section_number,
            transport_stream_id,
            original_network_id,
            segment_last_section_number,
            last_table_id,
            events,
        })
    }
}
