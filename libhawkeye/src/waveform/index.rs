use crate::{error::Error, serde::read_full, Result};
use nom::{
    number::complete::{le_f64, le_i32, le_u32},
    sequence::tuple,
    IResult,
};
use std::{
    fs::File,
    io::{self, BufReader, Seek, SeekFrom},
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

/// Size of the header of an index file
pub const INDEX_HEADER_LEN: u64 = 20;
/// Size of one index record
pub const INDEX_RECORD_LEN: usize = 20;
/// Number of point records produced by one shot, and so sharing one index record
pub const RECORDS_PER_SHOT: i64 = 4;

/// One entry of a shot index file
///
/// ```text
/// [timestamp: f64][intermediate file offset: u32][original file offset: u32][file index: i32]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexRecord {
    /// GPS seconds of week of the shot
    pub timestamp: f64,
    /// Offset of the shot in the intermediate processing file
    pub intermediate_offset: u32,
    /// Offset of the shot message in its waveform data file
    pub original_offset: u32,
    /// Number of the waveform data file holding the shot
    pub file_index: i32,
}

fn parse_index_record(input: &[u8]) -> IResult<&[u8], IndexRecord> {
    let (input, (timestamp, intermediate_offset, original_offset, file_index)) =
        tuple((le_f64, le_u32, le_u32, le_i32))(input)?;
    Ok((
        input,
        IndexRecord {
            timestamp,
            intermediate_offset,
            original_offset,
            file_index,
        },
    ))
}

/// Returns the byte position of the index record for point record `recnum`
#[must_use]
pub const fn index_position(recnum: i64) -> u64 {
    (recnum / RECORDS_PER_SHOT).unsigned_abs() * INDEX_RECORD_LEN as u64 + INDEX_HEADER_LEN
}

/// An open index file, remembering the last record it read
#[derive(Debug)]
pub(crate) struct IndexFile {
    path: PathBuf,
    reader: BufReader<File>,
    last: Option<(u64, IndexRecord)>,
}

impl IndexFile {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::IndexOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened index file {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            last: None,
        })
    }

    /// Reads the index record of point record `recnum`, returning whether the disk was touched
    pub(crate) fn read(&mut self, recnum: i64) -> Result<(IndexRecord, bool)> {
        let pos = index_position(recnum);
        if let Some((last_pos, record)) = self.last {
            if last_pos == pos {
                trace!("Index record for {recnum} served from cache");
                return Ok((record, false));
            }
        }

        self.reader
            .seek(SeekFrom::Start(pos))
            .map_err(|source| Error::IndexSeek {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        let mut buf = [0; INDEX_RECORD_LEN];
        let read = read_full(&mut self.reader, &mut buf).map_err(|source| Error::IndexRead {
            path: self.path.clone(),
            recnum,
            source,
        })?;
        match read {
            0 => {
                return Err(Error::IndexEof {
                    path: self.path.clone(),
                    recnum,
                })
            }
            n if n < INDEX_RECORD_LEN => {
                return Err(Error::IndexRead {
                    path: self.path.clone(),
                    recnum,
                    source: io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("index record holds {n} of {INDEX_RECORD_LEN} bytes"),
                    ),
                })
            }
            _ => {}
        }
        let (_, record) = parse_index_record(&buf).map_err(|_| Error::IndexRead {
            path: self.path.clone(),
            recnum,
            source: io::Error::from(io::ErrorKind::InvalidData),
        })?;
        trace!("Index record for {recnum}: {record:?}");
        self.last = Some((pos, record));
        Ok((record, true))
    }
}
