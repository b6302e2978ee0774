//! Rendering sinks for completed records.
use std::io::Write;

use crate::descriptor::{CharSetString, DecodedDescriptor};
use crate::processor::Stats;
use crate::record::{Events, Network, Programs, Record};
use crate::{Error, Result};

/// Receives records in stream order.
pub trait Render {
    /// # Errors
    /// Any error writing the record. Render errors end a run.
    fn render(&mut self, record: &Record) -> Result<()>;

    /// Called once after the last record of a run.
    ///
    /// # Errors
    /// Any error writing or flushing output.
    fn finish(&mut self, _stats: &Stats) -> Result<()> {
        Ok(())
    }
}

/// Collects records, mostly useful for testing.
impl Render for Vec<Record> {
    fn render(&mut self, record: &Record) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Human readable, multi-line output.
pub struct TextRenderer<W: Write> {
    writer: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(writer: W) -> Self {
        TextRenderer { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn programs(&mut self, rec: &Programs) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w)?;
        writeln!(w, "New PAT (pid {:#06x})", rec.pid)?;
        writeln!(w, "  transport_stream_id : {}", rec.transport_stream_id)?;
        writeln!(w, "  version_number      : {}", rec.version)?;
        writeln!(w, "    | program_number @ [NIT|PMT]_PID")?;
        for p in &rec.programs {
            writeln!(w, "    | {:14} @ {:#x} ({})", p.number, p.pid, p.pid)?;
        }
        writeln!(w, "  active              : {}", rec.current_next)?;
        Ok(())
    }

    fn network(&mut self, rec: &Network) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w)?;
        writeln!(
            w,
            "New NIT {} (pid {:#06x})",
            if rec.actual { "actual" } else { "other" },
            rec.pid
        )?;
        writeln!(w, "  network_id          : {}", rec.network_id)?;
        writeln!(w, "  version_number      : {}", rec.version)?;
        writeln!(
            w,
            "  section             : {}/{}",
            rec.section_number, rec.last_section_number
        )?;
        for d in &rec.descriptors {
            write_descriptor(w, 2, d)?;
        }
        for ts in &rec.streams {
            writeln!(
                w,
                "  transport_stream {} (original_network {})",
                ts.transport_stream_id, ts.original_network_id
            )?;
            for d in &ts.descriptors {
                write_descriptor(w, 4, d)?;
            }
        }
        Ok(())
    }

    fn events(&mut self, rec: &Events) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w)?;
        writeln!(w, "New EIT {:#04x} (pid {:#06x})", rec.table_id, rec.pid)?;
        writeln!(w, "  service_id          : {}", rec.service_id)?;
        writeln!(w, "  transport_stream_id : {}", rec.transport_stream_id)?;
        writeln!(w, "  original_network_id : {}", rec.original_network_id)?;
        writeln!(w, "  version_number      : {}", rec.version)?;
        writeln!(
            w,
            "  section             : {}/{}",
            rec.section_number, rec.last_section_number
        )?;
        for ev in &rec.events {
            writeln!(
                w,
                "  event {} start {} duration {}s running {} free_ca {}",
                ev.event_id, ev.start, ev.duration, ev.running_status, ev.free_ca
            )?;
            for d in &ev.descriptors {
                write_descriptor(w, 4, d)?;
            }
        }
        Ok(())
    }
}

fn quoted(s: &CharSetString) -> String {
    format!("{:?}", s.text)
}

fn write_descriptor<W: Write>(w: &mut W, indent: usize, d: &DecodedDescriptor) -> Result<()> {
    let pad = " ".repeat(indent);
    match d {
        DecodedDescriptor::NetworkName { name } => {
            writeln!(w, "{pad}network_name {}", quoted(name))?;
        }
        DecodedDescriptor::ServiceList { services } => {
            let list: Vec<String> = services
                .iter()
                .map(|s| format!("{:#06x}/{:#04x}", s.service_id, s.service_type))
                .collect();
            writeln!(w, "{pad}service_list {}", list.join(", "))?;
        }
        DecodedDescriptor::ShortEvent(ev) => {
            writeln!(
                w,
                "{pad}short_event [{}] {}: {}",
                ev.language,
                quoted(&ev.name),
                quoted(&ev.text)
            )?;
        }
        DecodedDescriptor::ExtendedEvent(ev) => {
            writeln!(
                w,
                "{pad}extended_event {}/{} [{}] {}",
                ev.descriptor_number,
                ev.last_descriptor_number,
                ev.language,
                quoted(&ev.text)
            )?;
            for item in &ev.items {
                writeln!(
                    w,
                    "{pad}  {} = {}",
                    quoted(&item.description),
                    quoted(&item.value)
                )?;
            }
        }
        DecodedDescriptor::Component(c) => {
            writeln!(
                w,
                "{pad}component {:?} ext {} type {:#04x} tag {} [{}] {}",
                c.stream_content,
                c.stream_content_ext,
                c.component_type,
                c.component_tag,
                c.language,
                quoted(&c.text)
            )?;
        }
        DecodedDescriptor::Unknown { tag, length } => {
            writeln!(w, "{pad}descriptor {tag:#04x} ({length} bytes)")?;
        }
    }
    Ok(())
}

impl<W: Write> Render for TextRenderer<W> {
    fn render(&mut self, record: &Record) -> Result<()> {
        match record {
            Record::Programs(rec) => self.programs(rec),
            Record::Network(rec) => self.network(rec),
            Record::Events(rec) => self.events(rec),
        }
    }

    fn finish(&mut self, stats: &Stats) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w)?;
        writeln!(w, "{stats}")?;
        w.flush()?;
        Ok(())
    }
}

/// One JSON object per line for each record.
pub struct JsonRenderer<W: Write> {
    writer: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(writer: W) -> Self {
        JsonRenderer { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Render for JsonRenderer<W> {
    fn render(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|err| Error::Render(err.to_string()))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, _stats: &Stats) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::Program;

    fn pat_record() -> Record {
        Record::Programs(Programs {
            pid: 0,
            transport_stream_id: 7,
            version: 1,
            current_next: true,
            programs: vec![Program {
                number: 1,
                pid: 0x100,
            }],
        })
    }

    #[test]
    fn text_pat() {
        let mut r = TextRenderer::new(Vec::new());
        r.render(&pat_record()).unwrap();
        let out = String::from_utf8(r.into_inner()).unwrap();

        assert!(out.contains("New PAT (pid 0x0000)"), "{out}");
        assert!(out.contains("transport_stream_id : 7"), "{out}");
        assert!(out.contains("    |              1 @ 0x100 (256)"), "{out}");
        assert!(out.contains("active              : true"), "{out}");
    }

    #[test]
    fn text_descriptors() {
        let mut out = Vec::new();
        write_descriptor(
            &mut out,
            2,
            &DecodedDescriptor::Unknown {
                tag: 0x99,
                length: 3,
            },
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "  descriptor 0x99 (3 bytes)\n");
    }

    #[test]
    fn json_lines() {
        let mut r = JsonRenderer::new(Vec::new());
        r.render(&pat_record()).unwrap();
        r.render(&pat_record()).unwrap();
        r.finish(&Stats::default()).unwrap();
        let out = String::from_utf8(r.into_inner()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v["table"], "programs");
        assert_eq!(v["programs"][0]["pid"], 256);
    }
}
