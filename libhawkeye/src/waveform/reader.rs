use super::{
    parse_message_header, parse_shot, split_channels, ShotRecord, WaveformFileHeader,
    MESSAGE_HEADER_LEN, SHOT_LEN, WAVEFORM_FILE_HEADER_LEN,
};
use crate::{error::Error, serde::text_from_bytes, Result};
use regex::Regex;
use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::{debug, trace};

const HEADER_LINE_PATTERN: &str = r"(?mR)^#(?<key>\S+)[ \t]+(?<value>.*?)[ \t]*$";

static HEADER_LINE: OnceLock<Regex> = OnceLock::new();

/// Parses the `#KEY value` lines of a waveform file header
pub(crate) fn parse_file_header(raw: &[u8]) -> WaveformFileHeader {
    let text = text_from_bytes(raw);
    let re = HEADER_LINE
        .get_or_init(|| Regex::new(HEADER_LINE_PATTERN).expect("header line pattern is valid"));
    let entries = re
        .captures_iter(&text)
        .map(|caps| (caps["key"].to_owned(), caps["value"].to_owned()))
        .collect();
    WaveformFileHeader { entries }
}

/// An open waveform data file, remembering the last shot it decoded
#[derive(Debug)]
pub(crate) struct WaveformFile {
    path: PathBuf,
    number: i32,
    reader: BufReader<File>,
    header: WaveformFileHeader,
    last: Option<(u32, ShotRecord)>,
}

impl WaveformFile {
    pub(crate) fn open(path: &Path, number: i32) -> Result<Self> {
        let open_err = |source| Error::WaveformOpen {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = BufReader::new(File::open(path).map_err(open_err)?);
        let mut raw = [0; WAVEFORM_FILE_HEADER_LEN];
        reader.read_exact(&mut raw).map_err(open_err)?;
        let header = parse_file_header(&raw);
        debug!(
            "Opened waveform file {} with header {:?}",
            path.display(),
            header.entries
        );
        Ok(Self {
            path: path.to_path_buf(),
            number,
            reader,
            header,
            last: None,
        })
    }

    pub(crate) const fn number(&self) -> i32 {
        self.number
    }

    /// Reads the shot message at `offset`, returning whether the disk was touched
    pub(crate) fn read_shot(&mut self, offset: u32, recnum: i64) -> Result<(ShotRecord, bool)> {
        if let Some((last_offset, shot)) = &self.last {
            if *last_offset == offset {
                trace!("Shot for record {recnum} served from cache");
                return Ok((shot.clone(), false));
            }
        }
        self.reader
            .seek(SeekFrom::Start(u64::from(offset)))
            .map_err(|source| Error::WaveformSeek {
                path: self.path.clone(),
                recnum,
                source,
            })?;

        let mut header_buf = [0; MESSAGE_HEADER_LEN];
        self.reader
            .read_exact(&mut header_buf)
            .map_err(|source| Error::WaveformHeaderRead {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        let (_, header) =
            parse_message_header(&header_buf).map_err(|_| Error::WaveformHeaderRead {
                path: self.path.clone(),
                recnum,
                source: io::Error::from(io::ErrorKind::InvalidData),
            })?;
        if !header.is_shot() {
            return Err(Error::MessageIdMismatch {
                path: self.path.clone(),
                recnum,
                id: header.id,
            });
        }

        let mut shot_buf = [0; SHOT_LEN];
        self.reader
            .read_exact(&mut shot_buf)
            .map_err(|source| Error::WaveformShotRead {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        let (_, shot) = parse_shot(&shot_buf).map_err(|_| Error::WaveformShotRead {
            path: self.path.clone(),
            recnum,
            source: io::Error::from(io::ErrorKind::InvalidData),
        })?;

        let payload_len = usize::from(header.size)
            .checked_sub(SHOT_LEN + MESSAGE_HEADER_LEN)
            .ok_or_else(|| Error::WaveformLayout {
                path: self.path.clone(),
                recnum,
                needed: SHOT_LEN + MESSAGE_HEADER_LEN,
                available: usize::from(header.size),
            })?;
        let mut payload = vec![0; payload_len];
        self.reader
            .read_exact(&mut payload)
            .map_err(|source| Error::WaveformDataRead {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        let waveforms =
            split_channels(&shot, &payload).map_err(|needed| Error::WaveformLayout {
                path: self.path.clone(),
                recnum,
                needed,
                available: payload_len,
            })?;
        if shot.waveform_len() < payload_len {
            trace!(
                "{} trailing waveform bytes ignored for record {recnum}",
                payload_len - shot.waveform_len()
            );
        }

        let record = ShotRecord {
            header,
            shot,
            waveforms,
            file_header: self.header.clone(),
        };
        self.last = Some((offset, record.clone()));
        Ok((record, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_pattern_compiles() {
        assert!(Regex::new(HEADER_LINE_PATTERN).is_ok());
    }

    #[test]
    fn parses_key_value_lines() {
        let mut raw = [b' '; WAVEFORM_FILE_HEADER_LEN];
        let text = b"#FILETYPE HAWKEYE_RAW\n#VERSION 3.1  \n#SYSTEM Chiroptera\n#CREATED 2012-03-14 10:15:00\n";
        raw[..text.len()].copy_from_slice(text);
        let header = parse_file_header(&raw);
        assert_eq!(header.entries.len(), 4);
        assert_eq!(header.get("FILETYPE"), Some("HAWKEYE_RAW"));
        assert_eq!(header.get("VERSION"), Some("3.1"));
        assert_eq!(header.get("CREATED"), Some("2012-03-14 10:15:00"));
        assert_eq!(header.get("MISSING"), None);
    }

    #[test]
    fn ignores_lines_without_marker() {
        let header = parse_file_header(b"garbage\n#KEY value\n   \n");
        assert_eq!(header.entries, vec![("KEY".to_owned(), "value".to_owned())]);
    }
}
