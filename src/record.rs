//! Owned, serializable views of completed tables with their descriptors decoded.
use serde::Serialize;
use tracing::warn;

use crate::descriptor::{DecodedDescriptor, Descriptors};
use crate::psi::{Eit, Nit, Pat, Program, Table};
use crate::timecode::BroadcastTime;
use crate::unit::Pid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Programs {
    pub pid: Pid,
    pub transport_stream_id: u16,
    pub version: u8,
    pub current_next: bool,
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStream {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub descriptors: Vec<DecodedDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    pub pid: Pid,
    pub network_id: u16,
    pub actual: bool,
    pub version: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    pub descriptors: Vec<DecodedDescriptor>,
    pub streams: Vec<NetworkStream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub event_id: u16,
    pub start: BroadcastTime,
    /// Duration in seconds
    pub duration: i64,
    pub running_status: u8,
    pub free_ca: bool,
    pub descriptors: Vec<DecodedDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Events {
    pub pid: Pid,
    pub table_id: u8,
    pub service_id: u16,
    pub version: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub events: Vec<Event>,
}

/// A completed table ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "table", rename_all = "lowercase")]
pub enum Record {
    Programs(Programs),
    Network(Network),
    Events(Events),
}

impl Record {
    /// Build a record from `table`, decoding every embedded descriptor.
    ///
    /// Descriptors that fail to decode are logged and skipped, their siblings are
    /// still decoded. The number of failures is added to `errors`.
    pub fn from_table(pid: Pid, table: &Table<'_>, errors: &mut usize) -> Record {
        match table {
            Table::Pat(pat) => Record::Programs(programs(pid, pat)),
            Table::Nit(nit) => Record::Network(network(pid, nit, errors)),
            Table::Eit(eit) => Record::Events(events(pid, eit, errors)),
        }
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        match self {
            Record::Programs(x) => x.pid,
            Record::Network(x) => x.pid,
            Record::Events(x) => x.pid,
        }
    }
}

fn programs(pid: Pid, pat: &Pat) -> Programs {
    Programs {
        pid,
        transport_stream_id: pat.transport_stream_id,
        version: pat.version,
        current_next: pat.current_next,
        programs: pat.programs.clone(),
    }
}

fn network(pid: Pid, nit: &Nit<'_>, errors: &mut usize) -> Network {
    Network {
        pid,
        network_id: nit.network_id,
        actual: nit.actual,
        version: nit.version,
        section_number: nit.section_number,
        last_section_number: nit.last_section_number,
        descriptors: decode_loop(pid, nit.descriptors, errors),
        streams: nit
            .streams
            .iter()
            .map(|ts| NetworkStream {
                transport_stream_id: ts.transport_stream_id,
                original_network_id: ts.original_network_id,
                descriptors: decode_loop(pid, ts.descriptors, errors),
            })
            .collect(),
    }
}

fn events(pid: Pid, eit: &Eit<'_>, errors: &mut usize) -> Events {
    Events {
        pid,
        table_id: eit.table_id,
        service_id: eit.service_id,
        version: eit.version,
        section_number: eit.section_number,
        last_section_number: eit.last_section_number,
        transport_stream_id: eit.transport_stream_id,
        original_network_id: eit.original_network_id,
        events: eit
            .events
            .iter()
            .map(|ev| Event {
                event_id: ev.event_id,
                start: ev.start,
                duration: ev.duration.num_seconds(),
                running_status: ev.running_status,
                free_ca: ev.free_ca,
                descriptors: decode_loop(pid, ev.descriptors, errors),
            })
            .collect(),
    }
}

/// Decode all descriptors of a raw descriptor loop.
pub fn decode_loop(pid: Pid, dat: &[u8], errors: &mut usize) -> Vec<DecodedDescriptor> {
    let mut decoded = Vec::default();
    for desc in Descriptors::new(dat) {
        let zult = desc.and_then(|d| d.decode());
        match zult {
            Ok(d) => decoded.push(d),
            Err(err) => {
                warn!(pid, tag = err.tag(), "skipping descriptor: {err}");
                *errors += 1;
            }
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ShortEvent;
    use crate::psi::{EitEvent, NitStream};
    use chrono::Duration;

    #[test]
    fn failed_descriptor_does_not_stop_siblings() {
        #[rustfmt::skip]
        let dat = [
            0x4d, 0x02, b'e', b'n',                   // short event, too short
            0x40, 0x03, 0x00, b'N', b'1',             // network name
            0x99, 0x01, 0x00,                         // unknown
        ];
        let mut errors = 0;
        let decoded = decode_loop(0x10, &dat, &mut errors);

        assert_eq!(errors, 1);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].tag(), 0x40);
        assert_eq!(
            decoded[1],
            DecodedDescriptor::Unknown {
                tag: 0x99,
                length: 1
            }
        );
    }

    #[test]
    fn loop_overrun_counts_once() {
        let dat = [0x40, 0x01, b'x', 0x41, 0x09, 0x00];
        let mut errors = 0;
        let decoded = decode_loop(0x10, &dat, &mut errors);
        assert_eq!(errors, 1);
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn network_record() {
        let nit = Nit {
            network_id: 0x3001,
            actual: true,
            version: 2,
            section_number: 0,
            last_section_number: 0,
            descriptors: &[0x40, 0x02, 0x00, b'N'],
            streams: vec![NitStream {
                transport_stream_id: 1,
                original_network_id: 2,
                descriptors: &[0x41, 0x03, 0x00, 0x10, 0x01],
            }],
        };
        let mut errors = 0;
        let Record::Network(rec) = Record::from_table(0x10, &Table::Nit(nit), &mut errors) else {
            panic!("expected network record");
        };
        assert_eq!(errors, 0);
        assert_eq!(rec.network_id, 0x3001);
        assert_eq!(rec.descriptors.len(), 1);
        assert_eq!(rec.streams[0].descriptors.len(), 1);
    }

    #[test]
    fn events_record_serializes() {
        let eit = Eit {
            table_id: 0x4e,
            service_id: 0x101,
            version: 1,
            section_number: 0,
            last_section_number: 0,
            transport_stream_id: 1,
            original_network_id: 2,
            segment_last_section_number: 0,
            last_table_id: 0x4e,
            events: vec![EitEvent {
                event_id: 7,
                start: BroadcastTime::At(750_516_300),
                duration: Duration::seconds(90),
                running_status: 4,
                free_ca: false,
                descriptors: b"\x4d\x08eng\x02\x00A\x01\x00",
            }],
        };
        let mut errors = 0;
        let rec = Record::from_table(0x12, &Table::Eit(eit), &mut errors);
        assert_eq!(errors, 0);
        assert_eq!(rec.pid(), 0x12);

        let Record::Events(events) = &rec else {
            panic!("expected events record");
        };
        assert_eq!(
            events.events[0].descriptors[0],
            DecodedDescriptor::ShortEvent(ShortEvent {
                language: "eng".to_string(),
                name: crate::descriptor::CharSetString {
                    charset: Some(0),
                    text: "A".to_string()
                },
                text: crate::descriptor::CharSetString {
                    charset: Some(0),
                    text: String::new()
                },
            })
        );

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["table"], "events");
        assert_eq!(json["events"][0]["duration"], 90);
        assert_eq!(json["events"][0]["descriptors"][0]["kind"], "short_event");
    }
}
