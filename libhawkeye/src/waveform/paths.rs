use crate::{error::Error, Result};
use std::path::{Path, PathBuf};
use strum::{Display, IntoStaticStr};

/// Whether a file holds hydrographic or topographic data
///
/// Decided by the point file name: `*_HD.bin` or `*_TD.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum SurveyKind {
    /// Hydrographic (bathymetric) data
    #[strum(serialize = "HD")]
    Hydro,
    /// Topographic data
    #[strum(serialize = "TD")]
    Topo,
}

const HYDRO_SUFFIX: &str = "_HD.bin";
const TOPO_SUFFIX: &str = "_TD.bin";
const INDEX_EXTENSION: &str = "sfm";
const WAVEFORM_EXTENSION: &str = "dat";

impl SurveyKind {
    /// Determines the kind of a point file from its name
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHawkeye`] if the name carries neither suffix
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.contains(HYDRO_SUFFIX) {
            Ok(Self::Hydro)
        } else if name.contains(TOPO_SUFFIX) {
            Ok(Self::Topo)
        } else {
            Err(Error::NotHawkeye {
                path: path.to_path_buf(),
            })
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Hydro => HYDRO_SUFFIX,
            Self::Topo => TOPO_SUFFIX,
        }
    }

    /// Returns the two letter code used in file names
    #[must_use]
    pub fn code(self) -> &'static str {
        self.into()
    }
}

/// Locations of the files that accompany a point file
///
/// HAWKEYE processing writes point files to `<survey>/Output/<timestamp>/<Line>_HD.bin`,
/// with the shot index next to them as `<Line>_HD.sfm`. The waveform data files stay in the
/// acquisition directory `<survey>/<Line>/` and are numbered `HD_000.dat`, `HD_001.dat`, ...
///
/// Nothing checks these paths until a waveform is requested, so a point file moved out of
/// that layout still reads but has no waveforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidePaths {
    /// Kind of the point file
    pub kind: SurveyKind,
    /// The shot index file
    pub index: PathBuf,
    /// Directory holding the waveform data files, if the point file sits deep enough to have one
    pub waveform_dir: Option<PathBuf>,
}

impl SidePaths {
    /// Derives the side-file paths of the point file at `primary`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHawkeye`] if `primary` is not named like a point file
    pub fn derive(primary: &Path) -> Result<Self> {
        let kind = SurveyKind::from_path(primary)?;
        let name = primary
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let flightline = name
            .find(kind.suffix())
            .map_or(name, |end| &name[..end]);

        // <survey>/Output/<timestamp>/file -> <survey>/<flightline>
        let waveform_dir = primary
            .parent()
            .and_then(Path::parent)
            .and_then(Path::parent)
            .filter(|_| !flightline.is_empty())
            .map(|survey| survey.join(flightline));

        Ok(Self {
            kind,
            index: primary.with_extension(INDEX_EXTENSION),
            waveform_dir,
        })
    }

    /// Returns the path of waveform data file number `file_number`
    #[must_use]
    pub fn waveform_file(&self, file_number: i32) -> Option<PathBuf> {
        self.waveform_dir.as_ref().map(|dir| {
            dir.join(format!(
                "{}_{file_number:03}.{WAVEFORM_EXTENSION}",
                self.kind.code()
            ))
        })
    }
}
