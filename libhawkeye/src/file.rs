#![allow(clippy::module_name_repetitions)]

use crate::{
    error::Error,
    header::{
        build_schema, header_len, read_header, write_header, ContentsHeader, FieldDef, MetaHeader,
        SUPPORTED_VERSION_MAJOR, SUPPORTED_VERSION_MINOR,
    },
    record::{Availability, PointRecord, Schema, TimeBase},
    waveform::{
        index::IndexFile,
        paths::{SidePaths, SurveyKind},
        reader::WaveformFile,
        ShotRecord,
    },
    Result,
};
use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, trace};

/// How a point file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Records can only be read
    #[default]
    ReadOnly,
    /// Records can be read and overwritten in place
    Update,
}

/// Disk access counters of an open file
///
/// Cache hits are not counted, so reading the four records of one shot in a row costs a single
/// index read and a single waveform read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    /// Index records read from disk
    pub index_reads: u64,
    /// Shot messages read from disk
    pub waveform_reads: u64,
    /// Waveform data files opened
    pub waveform_opens: u64,
}

/// An open HAWKEYE CSS point file together with its index and waveform side files
///
/// The side files are opened on the first call to [`HawkeyeFile::read_waveform`]; a point file
/// without them reads records just fine.
#[derive(Debug)]
pub struct HawkeyeFile {
    path: PathBuf,
    mode: Mode,
    file: File,
    meta: MetaHeader,
    contents: ContentsHeader,
    schema: Schema,
    data_offset: u64,
    buffer: Vec<u8>,
    time_base: TimeBase,
    side_paths: SidePaths,
    index: Option<IndexFile>,
    waveform: Option<WaveformFile>,
    stats: IoStats,
}

impl HawkeyeFile {
    /// Opens the point file at `path`
    ///
    /// The survey kind is taken from the file name (`*_HD.bin` or `*_TD.bin`), the headers are
    /// read and validated, and the first record is read to anchor timestamps to their GPS week.
    ///
    /// # Errors
    ///
    /// This function errors if:
    /// - the file name or signature is not that of a HAWKEYE CSS point file
    /// - the file cannot be opened or its headers cannot be read
    /// - the version is not 1.0
    /// - a field tag or type code is not known, or the fields do not fit the record size
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        let path = path.as_ref();
        let side_paths = SidePaths::derive(path)?;
        debug!("Side files: {side_paths:?}");

        let file = match mode {
            Mode::ReadOnly => File::open(path),
            Mode::Update => OpenOptions::new().read(true).write(true).open(path),
        }
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = BufReader::new(file);
        let (meta, contents, schema) = read_header(&mut reader, path)?;
        if (meta.version_major, meta.version_minor)
            != (SUPPORTED_VERSION_MAJOR, SUPPORTED_VERSION_MINOR)
        {
            return Err(Error::WrongVersion {
                path: path.to_path_buf(),
                major: meta.version_major,
                minor: meta.version_minor,
            });
        }
        let file = reader.into_inner();

        let mut this = Self {
            path: path.to_path_buf(),
            mode,
            file,
            data_offset: u64::try_from(contents.data_offset).unwrap_or_default(),
            buffer: vec![0; schema.record_size()],
            time_base: TimeBase::default(),
            meta,
            contents,
            schema,
            side_paths,
            index: None,
            waveform: None,
            stats: IoStats::default(),
        };

        let start_gps_time = if this.contents.num_records == 0 {
            debug!("File holds no records");
            0.0
        } else {
            this.read_raw(0)?.timestamp
        };
        this.time_base = TimeBase::from_survey_date(
            this.contents.survey_year,
            this.contents.survey_day,
            start_gps_time,
        );
        info!(
            "Opened {} ({}, {} records, {} fields)",
            path.display(),
            this.side_paths.kind,
            this.contents.num_records,
            this.contents.fields.len()
        );
        Ok(this)
    }

    fn check_bounds(&self, recnum: i64) -> Result<u64> {
        u64::try_from(recnum)
            .ok()
            .filter(|&i| i < u64::from(self.contents.num_records))
            .ok_or_else(|| Error::OutOfRange {
                path: self.path.clone(),
                recnum,
                count: self.contents.num_records,
            })
    }

    fn record_offset(&self, index: u64) -> u64 {
        index * self.schema.record_size() as u64 + self.data_offset
    }

    /// Reads and decodes a record, without deriving its absolute time
    fn read_raw(&mut self, recnum: i64) -> Result<PointRecord> {
        let offset = self.record_offset(self.check_bounds(recnum)?);
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| Error::ReadSeek {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        self.file
            .read_exact(&mut self.buffer)
            .map_err(|source| Error::Read {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        Ok(self.schema.unpack(&self.buffer))
    }

    /// Reads record `recnum`
    ///
    /// Members of the record that the file does not declare are zero. `tv_sec`/`tv_nsec` hold the
    /// absolute time of the record.
    ///
    /// # Errors
    ///
    /// This function errors if `recnum` is out of range or the record cannot be read
    pub fn read_record(&mut self, recnum: i64) -> Result<PointRecord> {
        let mut record = self.read_raw(recnum)?;
        (record.tv_sec, record.tv_nsec) = self.time_base.absolute(record.timestamp);
        trace!("Record {recnum} at {}.{:09}", record.tv_sec, record.tv_nsec);
        Ok(record)
    }

    /// Overwrites record `recnum` with the declared members of `record`
    ///
    /// Fields whose member is unchanged since the record was read keep their bytes on disk, as
    /// does any padding.
    ///
    /// # Errors
    ///
    /// This function errors if the file was opened [`Mode::ReadOnly`], `recnum` is out of range
    /// or the record cannot be read back or written
    pub fn update_record(&mut self, recnum: i64, record: &PointRecord) -> Result<()> {
        if self.mode == Mode::ReadOnly {
            return Err(Error::ReadOnly {
                path: self.path.clone(),
            });
        }
        let offset = self.record_offset(self.check_bounds(recnum)?);
        // fields left unchanged keep their stored bytes
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| Error::ReadSeek {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        self.file
            .read_exact(&mut self.buffer)
            .map_err(|source| Error::Read {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        self.schema.repack(record, &mut self.buffer);
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| Error::WriteSeek {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        self.file
            .write_all(&self.buffer)
            .map_err(|source| Error::Write {
                path: self.path.clone(),
                recnum,
                source,
            })?;
        trace!("Updated record {recnum}");
        Ok(())
    }

    /// Reads the shot, with its per-channel waveforms, that record `recnum` was derived from
    ///
    /// Four consecutive records share one shot. The last index entry and the last shot are kept,
    /// so reading them in order touches the disk once per shot.
    ///
    /// # Errors
    ///
    /// This function errors if `recnum` is out of range, the index or waveform file is missing
    /// or truncated, or the shot message is not a shot
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_waveform(&mut self, recnum: i64) -> Result<ShotRecord> {
        self.check_bounds(recnum)?;

        let mut index = match self.index.take() {
            Some(index) => index,
            None => IndexFile::open(&self.side_paths.index)?,
        };
        let entry = index.read(recnum);
        self.index = Some(index);
        let (entry, touched) = entry?;
        if touched {
            self.stats.index_reads += 1;
        }

        let mut waveform = match self.waveform.take() {
            Some(open) if open.number() == entry.file_index => open,
            previous => {
                let wave_path = self
                    .side_paths
                    .waveform_file(entry.file_index)
                    .ok_or_else(|| Error::NoWaveformDirectory {
                        path: self.path.clone(),
                    })?;
                if let Some(previous) = previous {
                    debug!(
                        "Switching from waveform file {} to {}",
                        previous.number(),
                        entry.file_index
                    );
                }
                let opened = WaveformFile::open(&wave_path, entry.file_index)?;
                self.stats.waveform_opens += 1;
                opened
            }
        };
        let shot = waveform.read_shot(entry.original_offset, recnum);
        self.waveform = Some(waveform);
        let (shot, touched) = shot?;
        if touched {
            self.stats.waveform_reads += 1;
        }
        Ok(shot)
    }

    /// Closes the file, flushing it to disk if it was opened for update
    ///
    /// # Errors
    ///
    /// This function errors if the written data cannot be synced
    pub fn close(self) -> Result<()> {
        if self.mode == Mode::Update {
            self.file.sync_all().map_err(|source| Error::Close {
                path: self.path.clone(),
                source,
            })?;
        }
        debug!("Closed {}", self.path.display());
        Ok(())
    }

    /// Returns the path of the point file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the mode the file was opened in
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns a reference to the [`MetaHeader`]
    #[must_use]
    pub const fn meta(&self) -> &MetaHeader {
        &self.meta
    }

    /// Returns a reference to the [`ContentsHeader`]
    #[must_use]
    pub const fn contents(&self) -> &ContentsHeader {
        &self.contents
    }

    /// Returns the declared fields, in record order
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.contents.fields
    }

    /// Returns the record layout of the file
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the set of record members the file carries
    #[must_use]
    pub fn availability(&self) -> &Availability {
        self.schema.availability()
    }

    /// Returns the number of records
    #[must_use]
    pub const fn num_records(&self) -> u32 {
        self.contents.num_records
    }

    /// Returns whether the file holds hydrographic or topographic data
    #[must_use]
    pub const fn kind(&self) -> SurveyKind {
        self.side_paths.kind
    }

    /// Returns the paths of the index and waveform files
    #[must_use]
    pub const fn side_paths(&self) -> &SidePaths {
        &self.side_paths
    }

    /// Returns the GPS week anchoring of the record timestamps
    #[must_use]
    pub const fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Returns the disk access counters
    #[must_use]
    pub const fn stats(&self) -> IoStats {
        self.stats
    }
}

/// Writes a new point file holding `records`
///
/// The record size, data offset and record count of `contents` are replaced by the values
/// computed from its fields and `records`. Only the declared members of each record are written.
///
/// # Errors
///
/// This function errors if a field tag is not known or the file cannot be written
#[instrument(skip_all, fields(path = %path.as_ref().display(), records = records.len()))]
pub fn create(
    path: impl AsRef<Path>,
    mut contents: ContentsHeader,
    records: &[PointRecord],
) -> Result<()> {
    let path = path.as_ref();
    let too_large = |what: &str| Error::Malformed {
        path: path.to_path_buf(),
        reason: format!("{what} does not fit the header"),
    };

    let record_size = contents.fields.iter().map(|f| f.data_type.width()).sum();
    let schema = build_schema(&contents.fields, record_size, path)?;
    contents.record_size = i32::try_from(record_size).map_err(|_| too_large("record size"))?;
    contents.num_records = u32::try_from(records.len()).map_err(|_| too_large("record count"))?;
    contents.data_offset =
        i32::try_from(header_len(&contents.fields)).map_err(|_| too_large("header"))?;

    let create_err = |source| Error::Create {
        path: path.to_path_buf(),
        source,
    };
    let mut w = BufWriter::new(File::create(path).map_err(create_err)?);
    let meta = write_header(&mut w, &contents, &schema).map_err(create_err)?;
    debug!("Wrote headers: {meta:?}");

    let mut packed = vec![0; record_size];
    for record in records {
        schema.pack(record, &mut packed);
        w.write_all(&packed).map_err(create_err)?;
    }
    w.flush().map_err(create_err)?;
    info!("Created {} with {} records", path.display(), records.len());
    Ok(())
}
