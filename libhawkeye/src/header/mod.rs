#![allow(clippy::module_name_repetitions)]

/// Field tag resolution
pub mod tags;

use crate::{
    error::Error,
    record::{codec::packed_size, DataType, FieldSlot, PointRecord, Schema},
    serde::{fixed_string, nom_reason, put_fixed_string},
    Result,
};
use bon::Builder;
use itertools::Itertools;
use nom::{
    multi::count,
    number::complete::{le_i32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};
use std::{
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};
use tracing::{debug, trace, warn};

/// The signature every HAWKEYE CSS point file starts with
pub const SIGNATURE: &[u8; 6] = b"CSSBIN";
/// The only major version this library reads
pub const SUPPORTED_VERSION_MAJOR: i32 = 1;
/// The only minor version this library reads
pub const SUPPORTED_VERSION_MINOR: i32 = 0;

const NAME_LEN: usize = 32;
const DESCRIPTION_LEN: usize = 128;
const TAG_LEN: usize = 32;
const TEXT_LEN: usize = 16;
const TYPE_CODE_LEN: usize = 4;
const META_HEADER_LEN: usize = SIGNATURE.len() + 4 * 4;
// two names, field count, record count, data offset, record size
const CONTENTS_FIXED_LEN: usize = 2 * NAME_LEN + 4 * 4;
// software version, survey/processing dates, datum, zone, hemisphere, units
const CONTENTS_TRAILER_LEN: usize = TEXT_LEN + 4 * 2 + TEXT_LEN + 2 + 4 + TEXT_LEN;

/// The fixed-size header at the start of a point file
///
/// ```text
/// [signature: 6 bytes "CSSBIN"]
/// [version major: i32][version minor: i32][meta header size: i32][contents header size: i32]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaHeader {
    /// Format major version
    pub version_major: i32,
    /// Format minor version
    pub version_minor: i32,
    /// Size of the meta header, i.e. offset of the contents header
    pub meta_header_size: i32,
    /// Size of the contents header
    pub contents_header_size: i32,
}

/// Description of one field declared in a contents header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Free text description (128 bytes on disk)
    pub description: String,
    /// Tag binding the field to a [`crate::FieldId`] (32 bytes on disk)
    pub tag: String,
    /// On-disk type of the field
    pub data_type: DataType,
}

impl FieldDef {
    /// Creates a new [`FieldDef`]
    #[must_use]
    pub fn new(description: impl Into<String>, tag: impl Into<String>, data_type: DataType) -> Self {
        Self {
            description: description.into(),
            tag: tag.into(),
            data_type,
        }
    }
}

/// The schema and survey metadata of a point file
///
/// When passed to [`crate::create`], `num_records`, `data_offset` and `record_size` are
/// computed from the records and fields being written.
#[derive(Builder, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ContentsHeader {
    /// Project name (32 bytes on disk)
    #[builder(default)]
    pub project_name: String,
    /// Flightline name (32 bytes on disk)
    #[builder(default)]
    pub flightline_name: String,
    /// Number of point records
    #[builder(default)]
    pub num_records: u32,
    /// Offset of the first point record
    #[builder(default)]
    pub data_offset: i32,
    /// Size of one point record, as declared
    #[builder(default)]
    pub record_size: i32,
    /// Declared fields, in record order
    pub fields: Vec<FieldDef>,
    /// Maximum value of every field
    #[builder(default)]
    pub max_values: PointRecord,
    /// Minimum value of every field
    #[builder(default)]
    pub min_values: PointRecord,
    /// Version of the software that wrote the file
    #[builder(default)]
    pub software_version: String,
    /// Year the survey was flown
    #[builder(default)]
    pub survey_year: u16,
    /// Day of year (1 based) the survey was flown
    #[builder(default)]
    pub survey_day: u16,
    /// Year the data was processed
    #[builder(default)]
    pub processing_year: u16,
    /// Day of year the data was processed
    #[builder(default)]
    pub processing_day: u16,
    /// Horizontal datum, e.g. `WGS84`
    #[builder(default)]
    pub datum: String,
    /// UTM zone
    #[builder(default)]
    pub utm_zone: u16,
    /// Whether the UTM zone is in the southern hemisphere
    #[builder(default)]
    pub southern_hemisphere: bool,
    /// Linear units, e.g. `meters`
    #[builder(default)]
    pub units: String,
}

impl ContentsHeader {
    /// Returns the size of this header on disk
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        contents_header_len(self.fields.len(), packed_size_of(&self.fields))
    }
}

fn packed_size_of(fields: &[FieldDef]) -> usize {
    fields.iter().map(|f| f.data_type.width()).sum()
}

const fn contents_header_len(num_fields: usize, record_size: usize) -> usize {
    CONTENTS_FIXED_LEN
        + num_fields * (DESCRIPTION_LEN + TAG_LEN + TYPE_CODE_LEN)
        + 2 * record_size
        + CONTENTS_TRAILER_LEN
}

struct ContentsFixed {
    project_name: String,
    flightline_name: String,
    num_fields: i32,
    num_records: u32,
    data_offset: i32,
    record_size: i32,
}

struct ContentsTrailer {
    software_version: String,
    survey_year: u16,
    survey_day: u16,
    processing_year: u16,
    processing_day: u16,
    datum: String,
    utm_zone: u16,
    southern_hemisphere: bool,
    units: String,
}

fn parse_meta(input: &[u8]) -> IResult<&[u8], MetaHeader> {
    let (input, (version_major, version_minor, meta_header_size, contents_header_size)) =
        tuple((le_i32, le_i32, le_i32, le_i32))(input)?;
    Ok((
        input,
        MetaHeader {
            version_major,
            version_minor,
            meta_header_size,
            contents_header_size,
        },
    ))
}

fn parse_contents_fixed(input: &[u8]) -> IResult<&[u8], ContentsFixed> {
    let (input, project_name) = fixed_string(NAME_LEN)(input)?;
    let (input, flightline_name) = fixed_string(NAME_LEN)(input)?;
    let (input, (num_fields, num_records, data_offset, record_size)) =
        tuple((le_i32, le_u32, le_i32, le_i32))(input)?;
    Ok((
        input,
        ContentsFixed {
            project_name,
            flightline_name,
            num_fields,
            num_records,
            data_offset,
            record_size,
        },
    ))
}

fn parse_contents_trailer(input: &[u8]) -> IResult<&[u8], ContentsTrailer> {
    let (input, software_version) = fixed_string(TEXT_LEN)(input)?;
    let (input, (survey_year, survey_day, processing_year, processing_day)) =
        tuple((le_u16, le_u16, le_u16, le_u16))(input)?;
    let (input, datum) = fixed_string(TEXT_LEN)(input)?;
    let (input, (utm_zone, southern)) = tuple((le_u16, le_i32))(input)?;
    let (input, units) = fixed_string(TEXT_LEN)(input)?;
    Ok((
        input,
        ContentsTrailer {
            software_version,
            survey_year,
            survey_day,
            processing_year,
            processing_day,
            datum,
            utm_zone,
            southern_hemisphere: southern != 0,
            units,
        },
    ))
}

/// Reads `len` bytes, reporting an allocation failure as [`Error::Allocation`]
///
/// `len` comes from the header, so it is checked against what is left of the stream before
/// anything is allocated.
fn read_block(
    r: &mut (impl Read + Seek),
    len: usize,
    path: &Path,
    what: &'static str,
) -> Result<Vec<u8>> {
    let seek_err = |source| Error::ContentsHeaderSeek {
        path: path.to_path_buf(),
        source,
    };
    let pos = r.stream_position().map_err(seek_err)?;
    let end = r.seek(SeekFrom::End(0)).map_err(seek_err)?;
    r.seek(SeekFrom::Start(pos)).map_err(seek_err)?;
    let left = end.saturating_sub(pos);
    if (len as u64) > left {
        return Err(Error::ContentsHeaderRead {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{what} need {len} bytes, {left} left"),
            ),
        });
    }

    let mut block = Vec::new();
    block.try_reserve_exact(len).map_err(|_| Error::Allocation {
        path: path.to_path_buf(),
        what,
    })?;
    r.by_ref()
        .take(len as u64)
        .read_to_end(&mut block)
        .map_err(|source| Error::ContentsHeaderRead {
            path: path.to_path_buf(),
            source,
        })?;
    if block.len() != len {
        return Err(Error::ContentsHeaderRead {
            path: path.to_path_buf(),
            source: io::ErrorKind::UnexpectedEof.into(),
        });
    }
    Ok(block)
}

fn malformed(path: &Path, e: &nom::Err<nom::error::Error<&[u8]>>) -> Error {
    Error::Malformed {
        path: path.to_path_buf(),
        reason: nom_reason(e),
    }
}

fn non_negative(value: i32, name: &str, path: &Path) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::Malformed {
        path: path.to_path_buf(),
        reason: format!("{name} is negative ({value})"),
    })
}

/// Binds every field of `fields` to a record member
pub(crate) fn build_schema(fields: &[FieldDef], record_size: usize, path: &Path) -> Result<Schema> {
    let mut slots = Vec::with_capacity(fields.len());
    for def in fields {
        let field = tags::resolve(&def.tag).ok_or_else(|| Error::UnsupportedField {
            path: path.to_path_buf(),
            tag: def.tag.clone(),
        })?;
        if slots.iter().any(|s: &FieldSlot| s.field == field) {
            warn!("Tag \"{}\" binds {field:?} a second time", def.tag);
        }
        trace!("Bound tag \"{}\" to {field:?} ({})", def.tag, def.data_type);
        slots.push(FieldSlot {
            field,
            data_type: def.data_type,
        });
    }
    let computed = packed_size(&slots);
    if computed < record_size {
        warn!(
            "Fields of {} fill {computed} of {record_size} bytes per record, the rest is ignored",
            path.display()
        );
    }
    Schema::new(slots, record_size).ok_or_else(|| Error::RecordSizeMismatch {
        path: path.to_path_buf(),
        declared: record_size,
        computed,
    })
}

/// Reads and validates the meta and contents headers of a point file
///
/// The reader may be positioned anywhere; it is left at the end of the contents header.
pub(crate) fn read_header(
    r: &mut (impl Read + Seek),
    path: &Path,
) -> Result<(MetaHeader, ContentsHeader, Schema)> {
    r.seek(SeekFrom::Start(0))
        .map_err(|source| Error::MetaHeaderSeek {
            path: path.to_path_buf(),
            source,
        })?;
    let mut meta_buf = [0; META_HEADER_LEN];
    r.read_exact(&mut meta_buf)
        .map_err(|source| Error::MetaHeaderRead {
            path: path.to_path_buf(),
            source,
        })?;
    if &meta_buf[..SIGNATURE.len()] != SIGNATURE {
        return Err(Error::NotHawkeye {
            path: path.to_path_buf(),
        });
    }
    let (_, meta) = parse_meta(&meta_buf[SIGNATURE.len()..]).map_err(|e| malformed(path, &e))?;
    debug!("Meta header: {meta:?}");

    let contents_start = non_negative(meta.meta_header_size, "meta header size", path)?;
    r.seek(SeekFrom::Start(contents_start as u64))
        .map_err(|source| Error::ContentsHeaderSeek {
            path: path.to_path_buf(),
            source,
        })?;

    let mut fixed_buf = [0; CONTENTS_FIXED_LEN];
    r.read_exact(&mut fixed_buf)
        .map_err(|source| Error::ContentsHeaderRead {
            path: path.to_path_buf(),
            source,
        })?;
    let (_, fixed) = parse_contents_fixed(&fixed_buf).map_err(|e| malformed(path, &e))?;
    let num_fields = non_negative(fixed.num_fields, "field count", path)?;
    let record_size = non_negative(fixed.record_size, "record size", path)?;
    non_negative(fixed.data_offset, "data offset", path)?;
    debug!(
        "{num_fields} fields, {} records of {record_size} bytes at offset {}",
        fixed.num_records, fixed.data_offset
    );

    let descriptions = read_block(r, num_fields * DESCRIPTION_LEN, path, "field descriptions")?;
    let tags = read_block(r, num_fields * TAG_LEN, path, "field tags")?;
    let max_buf = read_block(r, record_size, path, "maximum values")?;
    let min_buf = read_block(r, record_size, path, "minimum values")?;
    let type_codes = read_block(r, num_fields * TYPE_CODE_LEN, path, "field types")?;

    let (_, descriptions) =
        count(fixed_string(DESCRIPTION_LEN), num_fields)(&descriptions[..]).map_err(|e| malformed(path, &e))?;
    let (_, tags) = count(fixed_string(TAG_LEN), num_fields)(&tags[..]).map_err(|e| malformed(path, &e))?;
    let (_, type_codes) = count(le_i32, num_fields)(&type_codes[..]).map_err(|e| malformed(path, &e))?;

    let fields = descriptions
        .into_iter()
        .zip_eq(tags)
        .zip_eq(type_codes)
        .map(|((description, tag), code)| {
            let data_type = DataType::try_from(code).map_err(|code| Error::UnknownDataType {
                path: path.to_path_buf(),
                tag: tag.clone(),
                code,
            })?;
            Ok(FieldDef {
                description,
                tag,
                data_type,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // min/max can only be decoded once every tag is bound
    let schema = build_schema(&fields, record_size, path)?;
    let max_values = schema.unpack(&max_buf);
    let min_values = schema.unpack(&min_buf);

    let mut trailer_buf = [0; CONTENTS_TRAILER_LEN];
    r.read_exact(&mut trailer_buf)
        .map_err(|source| Error::ContentsHeaderRead {
            path: path.to_path_buf(),
            source,
        })?;
    let (_, trailer) = parse_contents_trailer(&trailer_buf).map_err(|e| malformed(path, &e))?;

    let declared = usize::try_from(meta.contents_header_size).unwrap_or_default();
    let actual = contents_header_len(num_fields, record_size);
    if declared != actual {
        warn!("Contents header size declared as {declared}, read {actual} bytes");
    }

    let contents = ContentsHeader {
        project_name: fixed.project_name,
        flightline_name: fixed.flightline_name,
        num_records: fixed.num_records,
        data_offset: fixed.data_offset,
        record_size: fixed.record_size,
        fields,
        max_values,
        min_values,
        software_version: trailer.software_version,
        survey_year: trailer.survey_year,
        survey_day: trailer.survey_day,
        processing_year: trailer.processing_year,
        processing_day: trailer.processing_day,
        datum: trailer.datum,
        utm_zone: trailer.utm_zone,
        southern_hemisphere: trailer.southern_hemisphere,
        units: trailer.units,
    };
    Ok((meta, contents, schema))
}

/// Serializes the meta and contents headers
///
/// `contents.record_size` and `contents.data_offset` are written as they are; `schema` packs the
/// min/max records.
pub(crate) fn encode_header(contents: &ContentsHeader, schema: &Schema) -> (MetaHeader, Vec<u8>) {
    let record_size = schema.record_size();
    let contents_len = contents_header_len(contents.fields.len(), record_size);
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let meta = MetaHeader {
        version_major: SUPPORTED_VERSION_MAJOR,
        version_minor: SUPPORTED_VERSION_MINOR,
        meta_header_size: META_HEADER_LEN as i32,
        contents_header_size: contents_len as i32,
    };

    let mut out = Vec::with_capacity(META_HEADER_LEN + contents_len);
    out.extend_from_slice(SIGNATURE);
    for v in [
        meta.version_major,
        meta.version_minor,
        meta.meta_header_size,
        meta.contents_header_size,
    ] {
        out.extend_from_slice(&v.to_le_bytes());
    }

    put_fixed_string(&mut out, &contents.project_name, NAME_LEN);
    put_fixed_string(&mut out, &contents.flightline_name, NAME_LEN);
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    out.extend_from_slice(&(contents.fields.len() as i32).to_le_bytes());
    out.extend_from_slice(&contents.num_records.to_le_bytes());
    out.extend_from_slice(&contents.data_offset.to_le_bytes());
    out.extend_from_slice(&contents.record_size.to_le_bytes());
    for def in &contents.fields {
        put_fixed_string(&mut out, &def.description, DESCRIPTION_LEN);
    }
    for def in &contents.fields {
        put_fixed_string(&mut out, &def.tag, TAG_LEN);
    }
    let mut packed = vec![0; record_size];
    schema.pack(&contents.max_values, &mut packed);
    out.extend_from_slice(&packed);
    schema.pack(&contents.min_values, &mut packed);
    out.extend_from_slice(&packed);
    for def in &contents.fields {
        out.extend_from_slice(&def.data_type.code().to_le_bytes());
    }

    put_fixed_string(&mut out, &contents.software_version, TEXT_LEN);
    for v in [
        contents.survey_year,
        contents.survey_day,
        contents.processing_year,
        contents.processing_day,
    ] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    put_fixed_string(&mut out, &contents.datum, TEXT_LEN);
    out.extend_from_slice(&contents.utm_zone.to_le_bytes());
    out.extend_from_slice(&i32::from(contents.southern_hemisphere).to_le_bytes());
    put_fixed_string(&mut out, &contents.units, TEXT_LEN);

    debug_assert_eq!(out.len(), META_HEADER_LEN + contents_len);
    (meta, out)
}

/// Writes the encoded headers of `contents`
pub(crate) fn write_header(
    w: &mut impl Write,
    contents: &ContentsHeader,
    schema: &Schema,
) -> std::io::Result<MetaHeader> {
    let (meta, bytes) = encode_header(contents, schema);
    w.write_all(&bytes)?;
    Ok(meta)
}

/// Returns the total header size for `fields`, i.e. the data offset of a new file
pub(crate) fn header_len(fields: &[FieldDef]) -> usize {
    META_HEADER_LEN + contents_header_len(fields.len(), packed_size_of(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldId;
    use std::io::Cursor;

    // Hand-assembled file header with two fields
    fn sample_header_bytes(tag_two: &str, type_two: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"CSSBIN");
        for v in [1i32, 0, 22, 80 + 2 * 164 + 2 * 12 + 62] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        put_fixed_string(&mut out, "Project X", 32);
        put_fixed_string(&mut out, "Line_007", 32);
        out.extend_from_slice(&2i32.to_le_bytes());
        out.extend_from_slice(&10u32.to_le_bytes());
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&12i32.to_le_bytes());
        put_fixed_string(&mut out, "GPS seconds of week", 128);
        put_fixed_string(&mut out, "Depth below surface", 128);
        put_fixed_string(&mut out, "Timestamp", 32);
        put_fixed_string(&mut out, tag_two, 32);
        // max then min
        out.extend_from_slice(&604_799.5f64.to_le_bytes());
        out.extend_from_slice(&40.0f32.to_le_bytes());
        out.extend_from_slice(&1.5f64.to_le_bytes());
        out.extend_from_slice(&(-2.0f32).to_le_bytes());
        out.extend_from_slice(&8i32.to_le_bytes());
        out.extend_from_slice(&type_two.to_le_bytes());
        put_fixed_string(&mut out, "CSS 2.1", 16);
        for v in [2012u16, 74, 2012, 80] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        put_fixed_string(&mut out, "WGS84", 16);
        out.extend_from_slice(&33u16.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        put_fixed_string(&mut out, "meters", 16);
        out
    }

    #[test]
    fn parses_hand_built_header() {
        let bytes = sample_header_bytes("Depth", 7);
        let (meta, contents, schema) =
            read_header(&mut Cursor::new(bytes), Path::new("Line_007_HD.bin")).unwrap();
        assert_eq!(meta.version_major, 1);
        assert_eq!(meta.meta_header_size, 22);
        assert_eq!(contents.project_name, "Project X");
        assert_eq!(contents.num_records, 10);
        assert_eq!(contents.data_offset, 1000);
        assert_eq!(contents.fields[1].description, "Depth below surface");
        assert_eq!(contents.fields[1].data_type, DataType::Float);
        assert_eq!(contents.max_values.timestamp, 604_799.5);
        assert_eq!(contents.max_values.depth, 40.0);
        assert_eq!(contents.min_values.depth, -2.0);
        assert_eq!(contents.survey_day, 74);
        assert_eq!(contents.datum, "WGS84");
        assert_eq!(contents.utm_zone, 33);
        assert!(!contents.southern_hemisphere);
        assert_eq!(contents.units, "meters");
        assert!(schema.availability().contains(FieldId::Depth));
        assert!(!schema.availability().contains(FieldId::Elevation));
    }

    #[test]
    fn encoding_matches_hand_built_header() {
        let bytes = sample_header_bytes("Depth", 7);
        let path = Path::new("Line_007_HD.bin");
        let (_, contents, schema) = read_header(&mut Cursor::new(bytes.clone()), path).unwrap();
        let (_, encoded) = encode_header(&contents, &schema);
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = sample_header_bytes("Depth", 7);
        bytes[0] = b'X';
        let err = read_header(&mut Cursor::new(bytes), Path::new("a_HD.bin")).unwrap_err();
        assert!(matches!(err, Error::NotHawkeye { .. }));
    }

    #[test]
    fn rejects_unknown_tag() {
        let bytes = sample_header_bytes("Sea Surface Temperature", 7);
        let err = read_header(&mut Cursor::new(bytes), Path::new("a_HD.bin")).unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedField { ref tag, .. } if tag == "Sea Surface Temperature")
        );
    }

    #[test]
    fn rejects_unknown_type_code() {
        let bytes = sample_header_bytes("Depth", 42);
        let err = read_header(&mut Cursor::new(bytes), Path::new("a_HD.bin")).unwrap_err();
        assert!(matches!(err, Error::UnknownDataType { code: 42, .. }));
    }

    #[test]
    fn rejects_fields_wider_than_record() {
        // a double where the record only has room for a float
        let bytes = sample_header_bytes("Depth", 8);
        let err = read_header(&mut Cursor::new(bytes), Path::new("a_HD.bin")).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordSizeMismatch {
                declared: 12,
                computed: 16,
                ..
            }
        ));
    }

    #[test]
    fn truncated_header_is_a_read_error() {
        let mut bytes = sample_header_bytes("Depth", 7);
        bytes.truncate(200);
        let err = read_header(&mut Cursor::new(bytes), Path::new("a_HD.bin")).unwrap_err();
        assert!(matches!(err, Error::ContentsHeaderRead { .. }));
    }

    #[test]
    fn forged_field_count_fails_before_allocating() {
        let mut bytes = sample_header_bytes("Depth", 7);
        // field count, 2^24 fields of 164 bytes each
        bytes[22 + 64..22 + 68].copy_from_slice(&0x0100_0000i32.to_le_bytes());
        let err = read_header(&mut Cursor::new(bytes), Path::new("a_HD.bin")).unwrap_err();
        assert!(
            matches!(err, Error::ContentsHeaderRead { ref source, .. } if source.kind() == io::ErrorKind::UnexpectedEof),
            "{err}"
        );
    }
}
