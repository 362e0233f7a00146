#![allow(clippy::module_name_repetitions)]

use crate::{
    error::Error,
    file::{HawkeyeFile, Mode},
    record::PointRecord,
    waveform::{paths::SurveyKind, ShotRecord},
    Result,
};
use std::{fmt, path::Path};
use tracing::{debug, warn};

/// Number of files a [`FileTable`] can hold open at once
pub const MAX_FILES: usize = 32;

/// Refers to a file opened through a [`FileTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Returns the slot the handle refers to
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fixed-capacity set of open point files
///
/// Every operation that fails is remembered as the table's last error, for applications that
/// report errors away from where they happen. Dropping the table closes every file still open.
pub struct FileTable {
    slots: [Option<HawkeyeFile>; MAX_FILES],
    last_error: Option<(i32, String)>,
}

impl fmt::Debug for FileTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTable")
            .field("open", &self.open_count())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTable {
    /// Creates an empty [`FileTable`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            last_error: None,
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error = Some((e.code(), e.to_string()));
        }
        result
    }

    fn slot_mut(&mut self, handle: Handle) -> Result<&mut HawkeyeFile> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::InvalidHandle { handle: handle.0 })
    }

    /// Opens the point file at `path` in the first free slot
    ///
    /// # Errors
    ///
    /// This function errors if every slot is taken or [`HawkeyeFile::open`] fails
    pub fn open(&mut self, path: impl AsRef<Path>, mode: Mode) -> Result<Handle> {
        let path = path.as_ref();
        let result = SurveyKind::from_path(path)
            .and_then(|_| {
                self.slots
                    .iter()
                    .position(Option::is_none)
                    .ok_or_else(|| Error::TooManyOpenFiles {
                        path: path.to_path_buf(),
                    })
            })
            .and_then(|slot| {
                self.slots[slot] = Some(HawkeyeFile::open(path, mode)?);
                debug!("{} opened as handle {slot}", path.display());
                Ok(Handle(slot))
            });
        self.record(result)
    }

    /// Closes the file behind `handle`
    ///
    /// Closing a handle that is not open does nothing. The slot is freed even if closing fails.
    ///
    /// # Errors
    ///
    /// This function errors if the file cannot be flushed
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        let Some(file) = self.slots.get_mut(handle.0).and_then(Option::take) else {
            return Ok(());
        };
        let result = file.close();
        self.record(result)
    }

    /// Reads a record of the file behind `handle`, see [`HawkeyeFile::read_record`]
    ///
    /// # Errors
    ///
    /// This function errors if the handle is not open or the read fails
    pub fn read_record(&mut self, handle: Handle, recnum: i64) -> Result<PointRecord> {
        let result = self.slot_mut(handle).and_then(|f| f.read_record(recnum));
        self.record(result)
    }

    /// Overwrites a record of the file behind `handle`, see [`HawkeyeFile::update_record`]
    ///
    /// # Errors
    ///
    /// This function errors if the handle is not open or the write fails
    pub fn update_record(&mut self, handle: Handle, recnum: i64, record: &PointRecord) -> Result<()> {
        let result = self
            .slot_mut(handle)
            .and_then(|f| f.update_record(recnum, record));
        self.record(result)
    }

    /// Reads the shot of a record of the file behind `handle`, see [`HawkeyeFile::read_waveform`]
    ///
    /// # Errors
    ///
    /// This function errors if the handle is not open or the read fails
    pub fn read_waveform(&mut self, handle: Handle, recnum: i64) -> Result<ShotRecord> {
        let result = self.slot_mut(handle).and_then(|f| f.read_waveform(recnum));
        self.record(result)
    }

    /// Returns the file behind `handle`, if it is open
    #[must_use]
    pub fn file(&self, handle: Handle) -> Option<&HawkeyeFile> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Returns the number of open files
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Returns the code of the last error, or 0 if nothing has failed yet
    #[must_use]
    pub fn last_error_code(&self) -> i32 {
        self.last_error.as_ref().map_or(0, |(code, _)| *code)
    }

    /// Returns the message of the last error
    #[must_use]
    pub fn last_error_string(&self) -> &str {
        self.last_error
            .as_ref()
            .map_or("No HAWKEYE error", |(_, message)| message)
    }

    /// Writes the message of the last error to stderr
    pub fn print_last_error(&self) {
        eprintln!("{}", self.last_error_string());
    }
}

impl Drop for FileTable {
    fn drop(&mut self) {
        for (slot, file) in self.slots.iter_mut().enumerate() {
            if let Some(file) = file.take() {
                if let Err(e) = file.close() {
                    warn!("Closing handle {slot} failed: {e}");
                }
            }
        }
    }
}
