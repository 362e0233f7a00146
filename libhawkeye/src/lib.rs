//! # libhawkeye
//!
//!
//! This library provides datatypes and i/o functionality for the HAWKEYE CSS binary file format,
//! the self-describing point record format written by the AHAB Hawkeye airborne bathymetric and
//! topographic lidar processing software.
//!
//! It aims to provide a minimal, low-level API to build upon: open a file, read (or update)
//! decoded point records by index, and pull the raw per-channel waveforms that belong to a
//! record out of the side files that accompany it.
//!
//! ### The format
//!
//! A HAWKEYE CSS point file (`*_HD.bin` for hydrographic data, `*_TD.bin` for topographic data)
//! starts with a short meta header and a contents header. The contents header describes the
//! records that follow: one description, one tag and one type code per field. The tag is what
//! gives a field its meaning, so the field order and the set of fields vary from file to file.
//! Every record is decoded into a fixed-shape [`PointRecord`]; the [`Availability`] set of a file
//! tells which of its members carry data.
//!
//! Raw waveforms live in two more files:
//! - an index file (`*.sfm`, next to the point file) with one entry per laser shot, i.e. per four
//!   point records,
//! - numbered waveform data files (`HD_000.dat`, `HD_001.dat`, ...) in the flightline directory.
//!
//! ```text
//! <survey>/
//! ├── Output/<timestamp>/Line_007_HD.bin
//! ├── Output/<timestamp>/Line_007_HD.sfm
//! └── Line_007/HD_000.dat
//! ```
//!
//! ### Usage
//!
//! ```rust,no_run
//! use libhawkeye::{HawkeyeFile, Mode, FieldId};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut file = HawkeyeFile::open("survey/Output/20120314_101500/Line_007_HD.bin", Mode::ReadOnly)?;
//!
//!     let record = file.read_record(0)?;
//!     if file.availability().contains(FieldId::Depth) {
//!         println!("depth: {} at {}.{:09}", record.depth, record.tv_sec, record.tv_nsec);
//!     }
//!
//!     let shot = file.read_waveform(0)?;
//!     for (channel, waveform) in shot.channels() {
//!         println!("{channel}: {} pulse / {} reflex bytes", waveform.pulse.len(), waveform.reflex.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Applications that juggle many files at once can go through a [`FileTable`], which caps the
//! number of simultaneously open files and keeps the last error around for display.
//!

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

/// Byte-order helpers used by the record codec
pub mod endian;
mod error;
mod file;
/// Module containing the meta and contents header types
pub mod header;
/// Module containing the decoded point record and its codec
pub mod record;
mod serde;
mod table;
/// Module containing waveform types and side-file handling
pub mod waveform;

pub use error::{Error, Result};
pub use file::{create, HawkeyeFile, IoStats, Mode};
pub use header::{ContentsHeader, FieldDef, MetaHeader};
pub use record::{Availability, DataType, FieldId, PointRecord, Value};
pub use table::{FileTable, Handle, MAX_FILES};
pub use waveform::{paths::SurveyKind, Channel, ShotRecord};
