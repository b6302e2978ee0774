#![doc = include_str!("../README.md")]

mod bytes;
mod error;

pub mod config;
pub mod descriptor;
pub mod processor;
pub mod psi;
pub mod record;
pub mod render;
pub mod router;
pub mod synchronizer;
pub mod timecode;
pub mod unit;

pub use config::Config;
pub use error::{Error, Result};
pub use processor::{Stats, StreamProcessor};
pub use router::{ChannelRouter, Routed};
pub use synchronizer::{read_units, Synchronizer};
pub use unit::{Pid, Unit};
