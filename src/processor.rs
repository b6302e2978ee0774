use std::fmt::Display;
use std::io::Read;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::psi::{Table, TableSink};
use crate::record::Record;
use crate::render::Render;
use crate::router::{ChannelRouter, Routed};
use crate::synchronizer::Synchronizer;
use crate::unit::Pid;
use crate::{Error, Result};

/// Counters for a single run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Complete units read from the source.
    pub units_read: usize,
    /// Units given to a handler.
    pub units_routed: usize,
    /// Units for PIDs without a handler.
    pub units_ignored: usize,
    /// Sync bytes not followed by a full unit.
    pub framing_errors: usize,
    /// Bytes discarded while scanning for sync.
    pub skipped_bytes: usize,
    pub tables_completed: usize,
    pub descriptor_errors: usize,
    /// Sections that did not fit within a single unit.
    pub incomplete_sections: usize,
    /// Units a handler could not decode.
    pub section_errors: usize,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Units:               {}", self.units_read)?;
        writeln!(f, "  routed:            {}", self.units_routed)?;
        writeln!(f, "  ignored:           {}", self.units_ignored)?;
        writeln!(f, "Framing errors:      {}", self.framing_errors)?;
        writeln!(f, "Skipped bytes:       {}", self.skipped_bytes)?;
        writeln!(f, "Tables:              {}", self.tables_completed)?;
        writeln!(f, "Incomplete sections: {}", self.incomplete_sections)?;
        writeln!(f, "Section errors:      {}", self.section_errors)?;
        write!(f, "Descriptor errors:   {}", self.descriptor_errors)
    }
}

/// Turns completed tables into records and hands them to the renderer.
///
/// The first render error is kept and stops further rendering, the run ends once
/// the current unit has been routed.
struct RenderSink<'a, W: Render> {
    renderer: &'a mut W,
    stats: &'a mut Stats,
    error: Option<Error>,
}

/// Count a section that could not be decoded.
fn count_section_error(stats: &mut Stats, pid: Pid, err: &Error) {
    match err {
        Error::IncompleteSection {
            table_id,
            length,
            available,
        } => {
            stats.incomplete_sections += 1;
            debug!(
                pid,
                table_id, length, available, "dropping incomplete section"
            );
        }
        err => {
            stats.section_errors += 1;
            warn!(pid, "failed to decode section: {err}");
        }
    }
}

impl<W: Render> TableSink for RenderSink<'_, W> {
    fn on_error(&mut self, pid: Pid, err: &Error) {
        count_section_error(self.stats, pid, err);
    }

    fn on_complete(&mut self, pid: Pid, table: &Table<'_>) {
        self.stats.tables_completed += 1;
        if self.error.is_some() {
            return;
        }
        let record = Record::from_table(pid, table, &mut self.stats.descriptor_errors);
        if let Err(err) = self.renderer.render(&record) {
            self.error = Some(err);
        }
    }
}

/// Drives a single pass over a stream: synchronize, route, decode and render.
pub struct StreamProcessor<W: Render> {
    config: Config,
    router: ChannelRouter,
    renderer: W,
}

impl<W: Render> StreamProcessor<W> {
    /// Create a processor with handlers attached for the tables in `config`.
    pub fn new(config: Config, renderer: W) -> Self {
        let router = ChannelRouter::with_tables(&config.tables);
        debug!(%router, "created processor");
        StreamProcessor {
            config,
            router,
            renderer,
        }
    }

    /// Access the router, e.g., to attach additional handlers before a run.
    pub fn router_mut(&mut self) -> &mut ChannelRouter {
        &mut self.router
    }

    pub fn renderer(&self) -> &W {
        &self.renderer
    }

    pub fn into_renderer(self) -> W {
        self.renderer
    }

    /// Read `reader` to the end, or until the configured unit limit, rendering every
    /// completed table in stream order.
    ///
    /// Truncated units, undecodable sections and descriptors are counted in the
    /// returned [Stats] and do not end the run.
    ///
    /// # Errors
    /// [Error::Io] if the source fails, or any error produced by the renderer.
    pub fn run<R: Read>(&mut self, reader: R) -> Result<Stats> {
        let mut sync = Synchronizer::new(reader);
        let mut stats = Stats::default();

        loop {
            if let Some(limit) = self.config.unit_limit {
                if sync.stats().units >= limit {
                    debug!(limit, "unit limit reached");
                    break;
                }
            }

            let unit = match sync.read_unit() {
                Ok(Some(unit)) => unit,
                Ok(None) => break,
                // counted by the synchronizer
                Err(Error::Truncated { .. }) => continue,
                Err(err) => return Err(err),
            };

            let (zult, render_error) = {
                let mut sink = RenderSink {
                    renderer: &mut self.renderer,
                    stats: &mut stats,
                    error: None,
                };
                let zult = self.router.route(&unit, &mut sink);
                (zult, sink.error)
            };

            match zult {
                Ok(Routed::Dispatched(_)) => stats.units_routed += 1,
                Ok(Routed::Ignored(_)) => stats.units_ignored += 1,
                Err(err) => {
                    stats.units_routed += 1;
                    count_section_error(&mut stats, unit.pid(), &err);
                }
            }

            if let Some(err) = render_error {
                return Err(err);
            }
        }

        let sync_stats = sync.stats();
        stats.units_read = sync_stats.units;
        stats.framing_errors = sync_stats.truncated;
        stats.skipped_bytes = sync_stats.skipped;
        info!(
            units = stats.units_read,
            tables = stats.tables_completed,
            framing_errors = stats.framing_errors,
            "stream complete"
        );
        self.renderer.finish(&stats)?;
        Ok(stats)
    }
}
