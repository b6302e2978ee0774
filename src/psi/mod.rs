//! PSI/SI table handling.
//!
//! Table handlers receive the raw bytes of every unit routed to them and report
//! completed logical records through a [TableSink]. The built-in [SectionHandler]
//! decodes sections that fit entirely within the unit that starts them; sections
//! spanning several units are reported to the sink as [Error::IncompleteSection]
//! and dropped.
//! CRCs are not checked and repeated versions are not suppressed.
//!
//! References:
//! * ISO/IEC 13818-1, section 2.4.4
//! * ETSI EN 300 468, section 5
mod section;
mod tables;

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use section::{Section, Sections};
pub use tables::{table_id, Eit, EitEvent, Nit, NitStream, Pat, Program};

use crate::unit::{self, Pid, UnitHeader};
use crate::{Error, Result};

/// Well known PIDs.
pub mod pid {
    use crate::unit::Pid;

    pub const PAT: Pid = 0x0000;
    pub const CAT: Pid = 0x0001;
    pub const NIT: Pid = 0x0010;
    pub const SDT: Pid = 0x0011;
    pub const EIT: Pid = 0x0012;
    pub const TDT: Pid = 0x0014;
    pub const NULL: Pid = 0x1fff;
}

/// A completed logical record, borrowed from the unit that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Table<'a> {
    Pat(Pat),
    Nit(Nit<'a>),
    Eit(Eit<'a>),
}

/// Receives completed tables. The table is only valid for the duration of the call.
pub trait TableSink {
    fn on_complete(&mut self, pid: Pid, table: &Table<'_>);

    /// A section in a unit for `pid` could not be decoded. Handlers keep going with
    /// any later sections in the same unit.
    fn on_error(&mut self, _pid: Pid, _err: &Error) {}
}

/// Consumes the raw bytes of units for a single PID.
pub trait TableHandler {
    /// Accept the full bytes of one unit, header included.
    ///
    /// # Errors
    /// Any error decoding the unit. Errors affect only this unit.
    fn push(&mut self, unit: &[u8], sink: &mut dyn TableSink) -> Result<()>;
}

/// Kinds of tables supported by [SectionHandler].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Pat,
    Nit,
    Eit,
}

impl TableKind {
    /// The PID the table is carried on.
    #[must_use]
    pub fn pid(self) -> Pid {
        match self {
            Self::Pat => pid::PAT,
            Self::Nit => pid::NIT,
            Self::Eit => pid::EIT,
        }
    }

    #[must_use]
    pub fn all() -> Vec<TableKind> {
        vec![Self::Pat, Self::Nit, Self::Eit]
    }
}

impl Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pat => "pat",
            Self::Nit => "nit",
            Self::Eit => "eit",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pat" => Ok(Self::Pat),
            "nit" => Ok(Self::Nit),
            "eit" => Ok(Self::Eit),
            other => Err(format!("unsupported table '{other}', expected pat, nit or eit")),
        }
    }
}

/// Decodes single-unit sections of one [TableKind].
#[derive(Debug, Clone)]
pub struct SectionHandler {
    kind: TableKind,
}

impl SectionHandler {
    #[must_use]
    pub fn new(kind: TableKind) -> Self {
        SectionHandler { kind }
    }

    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    fn decode<'a>(&self, section: &Section<'a>) -> Result<Table<'a>> {
        Ok(match self.kind {
            TableKind::Pat => Table::Pat(Pat::decode(section)?),
            TableKind::Nit => Table::Nit(Nit::decode(section)?),
            TableKind::Eit => Table::Eit(Eit::decode(section)?),
        })
    }

    fn wants(&self, table_id: u8) -> bool {
        match self.kind {
            TableKind::Pat => table_id == table_id::PAT,
            TableKind::Nit => matches!(table_id, table_id::NIT_ACTUAL | table_id::NIT_OTHER),
            TableKind::Eit => {
                (table_id::EIT_PF_ACTUAL..=table_id::EIT_SCHEDULE_LAST).contains(&table_id)
            }
        }
    }
}

impl TableHandler for SectionHandler {
    fn push(&mut self, unit: &[u8], sink: &mut dyn TableSink) -> Result<()> {
        let Some(hdr) = UnitHeader::decode(unit) else {
            return Err(Error::Section("unit too short for header".into()));
        };
        if hdr.transport_error {
            debug!(pid = hdr.pid, "dropping unit with transport error indicator");
            return Ok(());
        }
        if !hdr.payload_unit_start {
            trace!(pid = hdr.pid, "ignoring section continuation");
            return Ok(());
        }

        for section in Sections::new(unit::payload(unit)) {
            let section = match section {
                Ok(section) => section,
                Err(err) => {
                    // no later section boundary can be found, iteration ends here
                    sink.on_error(hdr.pid, &err);
                    continue;
                }
            };
            if !self.wants(section.table_id) {
                trace!(pid = hdr.pid, table_id = section.table_id, "skipping table");
                continue;
            }
            if !section.current_next {
                trace!(pid = hdr.pid, table_id = section.table_id, "skipping next version");
                continue;
            }
            let table = match self.decode(&section) {
                Ok(table) => table,
                Err(err) => {
                    debug!(pid = hdr.pid, table_id = section.table_id, "bad section: {err}");
                    sink.on_error(hdr.pid, &err);
                    continue;
                }
            };
            debug!(
                pid = hdr.pid,
                table_id = section.table_id,
                version = section.version,
                kind = %self.kind,
                "table complete"
            );
            sink.on_complete(hdr.pid, &table);
        }
        Ok(())
    }
}
