use std::{io, path::PathBuf};
use thiserror::Error;

/// Convenience alias for results returned by `libhawkeye`
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libhawkeye` errors
///
/// Every variant carries the path of the file it relates to, and the record number when the
/// failure happened while reading or writing a specific record.
pub enum Error {
    /// The point file could not be opened
    #[error("Error opening HAWKEYE file {} : {source}", .path.display())]
    Open {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// A new point file could not be written
    #[error("Error creating HAWKEYE file {} : {source}", .path.display())]
    Create {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// The file name or signature does not belong to a HAWKEYE CSS point file
    #[error("File {} is not a HAWKEYE CSS point file", .path.display())]
    NotHawkeye {
        /// point file path
        path: PathBuf,
    },
    /// The header declares a version this library cannot read
    #[error("File {} has unsupported HAWKEYE version {major}.{minor}", .path.display())]
    WrongVersion {
        /// point file path
        path: PathBuf,
        /// declared major version
        major: i32,
        /// declared minor version
        minor: i32,
    },
    /// Every slot of a [`crate::FileTable`] is in use
    #[error("Too many HAWKEYE files are already open, cannot open {}", .path.display())]
    TooManyOpenFiles {
        /// path that was being opened
        path: PathBuf,
    },
    /// A [`crate::Handle`] that does not refer to an open file
    #[error("Invalid HAWKEYE file handle {handle}")]
    InvalidHandle {
        /// slot index of the handle
        handle: usize,
    },
    /// Seeking to the meta header failed
    #[error("Error seeking to the meta header in file {} : {source}", .path.display())]
    MetaHeaderSeek {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading the meta header failed
    #[error("Error reading the meta header in file {} : {source}", .path.display())]
    MetaHeaderRead {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// Seeking to the contents header failed
    #[error("Error seeking to the contents header in file {} : {source}", .path.display())]
    ContentsHeaderSeek {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading the contents header failed
    #[error("Error reading the contents header in file {} : {source}", .path.display())]
    ContentsHeaderRead {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// A header value is outside of what the format allows
    #[error("Malformed header in file {} : {reason}", .path.display())]
    Malformed {
        /// point file path
        path: PathBuf,
        /// what was wrong
        reason: String,
    },
    /// Memory for one of the per-field header arrays could not be reserved
    #[error("Error allocating memory for {what} in file {}", .path.display())]
    Allocation {
        /// point file path
        path: PathBuf,
        /// the array being allocated
        what: &'static str,
    },
    /// A field tag that does not map onto any [`crate::FieldId`]
    #[error("Unsupported field tag \"{tag}\" in file {}", .path.display())]
    UnsupportedField {
        /// point file path
        path: PathBuf,
        /// the unrecognized tag
        tag: String,
    },
    /// A field type code that does not map onto any [`crate::DataType`]
    #[error("Unknown data type {code} for field \"{tag}\" in file {}", .path.display())]
    UnknownDataType {
        /// point file path
        path: PathBuf,
        /// tag of the field
        tag: String,
        /// the type code found in the header
        code: i32,
    },
    /// The declared fields do not fit in the declared record size
    #[error("Declared record size {declared} in file {} is smaller than its fields ({computed} bytes)", .path.display())]
    RecordSizeMismatch {
        /// point file path
        path: PathBuf,
        /// record size stated by the header
        declared: usize,
        /// sum of the field widths
        computed: usize,
    },
    /// A record index outside of `0..num_records`
    #[error("Record {recnum} out of bounds in file {} ({count} records)", .path.display())]
    OutOfRange {
        /// point file path
        path: PathBuf,
        /// requested record
        recnum: i64,
        /// number of records in the file
        count: u32,
    },
    /// Seeking to a point record failed
    #[error("Error seeking to record {recnum} in file {} : {source}", .path.display())]
    ReadSeek {
        /// point file path
        path: PathBuf,
        /// requested record
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading a point record failed
    #[error("Error reading record {recnum} in file {} : {source}", .path.display())]
    Read {
        /// point file path
        path: PathBuf,
        /// requested record
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Seeking to a point record for update failed
    #[error("Error seeking to record {recnum} for update in file {} : {source}", .path.display())]
    WriteSeek {
        /// point file path
        path: PathBuf,
        /// record being updated
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Writing a point record failed
    #[error("Error writing record {recnum} in file {} : {source}", .path.display())]
    Write {
        /// point file path
        path: PathBuf,
        /// record being updated
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// An update was attempted on a file opened read-only
    #[error("File {} was opened read-only", .path.display())]
    ReadOnly {
        /// point file path
        path: PathBuf,
    },
    /// The index (`.sfm`) file could not be opened
    #[error("Error opening HAWKEYE index file {} : {source}", .path.display())]
    IndexOpen {
        /// index file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// Seeking to an index record failed
    #[error("Error seeking to the index record for record {recnum} in file {} : {source}", .path.display())]
    IndexSeek {
        /// index file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading an index record failed part way through
    #[error("Error reading the index record for record {recnum} in file {} : {source}", .path.display())]
    IndexRead {
        /// index file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// The index file ends before the index record of the requested point record
    #[error("Index file {} ends before the index record for record {recnum}", .path.display())]
    IndexEof {
        /// index file path
        path: PathBuf,
        /// point record number
        recnum: i64,
    },
    /// The point file is not laid out in a way that lets the waveform files be located
    #[error("Cannot locate the waveform directory for file {}", .path.display())]
    NoWaveformDirectory {
        /// point file path
        path: PathBuf,
    },
    /// A waveform (`.dat`) file could not be opened
    #[error("Error opening HAWKEYE waveform file {} : {source}", .path.display())]
    WaveformOpen {
        /// waveform file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
    /// Seeking to a shot message failed
    #[error("Error seeking to the waveform for record {recnum} in file {} : {source}", .path.display())]
    WaveformSeek {
        /// waveform file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading the common message header failed
    #[error("Error reading the waveform message header for record {recnum} in file {} : {source}", .path.display())]
    WaveformHeaderRead {
        /// waveform file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading the shot structure failed
    #[error("Error reading the shot data for record {recnum} in file {} : {source}", .path.display())]
    WaveformShotRead {
        /// waveform file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// Reading the waveform samples failed
    #[error("Error reading the waveform data for record {recnum} in file {} : {source}", .path.display())]
    WaveformDataRead {
        /// waveform file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// underlying i/o error
        source: io::Error,
    },
    /// The message at the indexed offset is not a shot message
    #[error("Message id {id:#06x} for record {recnum} in file {} is not a shot message", .path.display())]
    MessageIdMismatch {
        /// waveform file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// the message id found
        id: u16,
    },
    /// The channel lengths of a shot do not fit in its message
    #[error("Waveform channels for record {recnum} in file {} need {needed} bytes, message holds {available}", .path.display())]
    WaveformLayout {
        /// waveform file path
        path: PathBuf,
        /// point record number
        recnum: i64,
        /// bytes required by the channel lengths
        needed: usize,
        /// bytes available in the message
        available: usize,
    },
    /// Flushing a file on close failed
    #[error("Error closing HAWKEYE file {} : {source}", .path.display())]
    Close {
        /// point file path
        path: PathBuf,
        /// underlying i/o error
        source: io::Error,
    },
}

impl Error {
    /// Returns the numeric code of this error kind
    ///
    /// Codes are negative and stable between releases; `0` is reserved for success.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Open { .. } => -1,
            Self::Create { .. } => -2,
            Self::NotHawkeye { .. } => -3,
            Self::WrongVersion { .. } => -4,
            Self::TooManyOpenFiles { .. } => -5,
            Self::InvalidHandle { .. } => -6,
            Self::MetaHeaderSeek { .. } => -7,
            Self::MetaHeaderRead { .. } => -8,
            Self::ContentsHeaderSeek { .. } => -9,
            Self::ContentsHeaderRead { .. } => -10,
            Self::Malformed { .. } => -11,
            Self::Allocation { .. } => -12,
            Self::UnsupportedField { .. } => -13,
            Self::UnknownDataType { .. } => -14,
            Self::RecordSizeMismatch { .. } => -15,
            Self::OutOfRange { .. } => -16,
            Self::ReadSeek { .. } => -17,
            Self::Read { .. } => -18,
            Self::WriteSeek { .. } => -19,
            Self::Write { .. } => -20,
            Self::ReadOnly { .. } => -21,
            Self::IndexOpen { .. } => -22,
            Self::IndexSeek { .. } => -23,
            Self::IndexRead { .. } => -24,
            Self::IndexEof { .. } => -25,
            Self::NoWaveformDirectory { .. } => -26,
            Self::WaveformOpen { .. } => -27,
            Self::WaveformSeek { .. } => -28,
            Self::WaveformHeaderRead { .. } => -29,
            Self::WaveformShotRead { .. } => -30,
            Self::WaveformDataRead { .. } => -31,
            Self::MessageIdMismatch { .. } => -32,
            Self::WaveformLayout { .. } => -33,
            Self::Close { .. } => -34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn messages_carry_path_and_record() {
        let err = Error::Read {
            path: Path::new("/data/Line_007_HD.bin").to_path_buf(),
            recnum: 42,
            source: io::Error::from(io::ErrorKind::UnexpectedEof),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/Line_007_HD.bin"));
        assert!(msg.contains("record 42"));
        assert_eq!(err.code(), -18);
    }

    #[test]
    fn message_id_is_rendered_in_hex() {
        let err = Error::MessageIdMismatch {
            path: PathBuf::from("HD_000.dat"),
            recnum: 3,
            id: 0x10,
        };
        assert!(err.to_string().contains("0x0010"));
    }
}
