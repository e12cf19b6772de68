//! DVBのEITからEPGを収集するためのクレート。
//!
//! 取得層から渡されるEITのセクションを[`collector::Collector`]で読み取り、
//! 組み立てた番組表を[`schedule::StationStore`]の局に渡す。

#![deny(missing_docs)]

pub mod category;
pub mod collector;
pub mod config;
pub mod crc;
pub mod entry;
pub mod heuristics;
pub mod lang;
pub mod psi;
pub mod rating;
pub mod schedule;
pub mod text;
pub mod time;
mod utils;

#[cfg(test)]
mod testutil;

pub use collector::{Collector, SectionError, SectionReport};
pub use config::Options;
pub use schedule::{ScheduleEntry, Station, StationStore};
pub use text::{DvbStr, DvbString};
