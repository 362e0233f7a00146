#![allow(dead_code)]

use libhawkeye::{create, ContentsHeader, DataType, FieldDef, PointRecord};
use mktemp::Temp;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Unix time of the Sunday starting the week of 2012-03-14 (day 74)
pub const SURVEY_WEEK_START: i64 = 1_331_424_000;
/// Timestamp of the first record of every fixture file
pub const START_GPS_TIME: f64 = 604_000.0;
pub const NUM_RECORDS: usize = 12;
pub const CHANNELS: usize = 12;
pub const FLIGHTLINE: &str = "Line_007";

pub fn sample_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("GPS seconds of week", "Timestamp", DataType::Double),
        FieldDef::new("Point altitude", "Point Altitude", DataType::Float),
        FieldDef::new("Point altitude standard deviation", "Point Altitude StdDev", DataType::Float),
        FieldDef::new("Depth below the water surface", "Depth", DataType::Float),
        FieldDef::new("Receiver pixel", "Pixel Index", DataType::UnsignedChar),
        FieldDef::new("Depth classification", "Depth Class", DataType::UnsignedChar),
    ]
}

/// Record `i` of the fixture files
///
/// Record 2 is timestamped just before the first record, i.e. in the following GPS week.
pub fn sample_record(i: usize) -> PointRecord {
    let timestamp = match i {
        2 => START_GPS_TIME - 1.0,
        _ => START_GPS_TIME + i as f64 * 0.25,
    };
    PointRecord {
        timestamp,
        point_altitude: 12.5 - i as f32,
        point_altitude_stddev: 0.01 * i as f32,
        depth: 3.0 + 0.5 * i as f32,
        pixel_index: (i % 4) as u8,
        depth_class: 1,
        ..PointRecord::default()
    }
}

pub fn sample_records() -> Vec<PointRecord> {
    (0..NUM_RECORDS).map(sample_record).collect()
}

pub fn sample_contents(fields: Vec<FieldDef>) -> ContentsHeader {
    ContentsHeader::builder()
        .project_name("Baltic 2012".to_owned())
        .flightline_name(FLIGHTLINE.to_owned())
        .fields(fields)
        .max_values(PointRecord {
            timestamp: START_GPS_TIME + 3.0,
            depth: 8.5,
            ..PointRecord::default()
        })
        .min_values(PointRecord {
            timestamp: START_GPS_TIME - 1.0,
            depth: 3.0,
            ..PointRecord::default()
        })
        .software_version("CSS 2.1".to_owned())
        .survey_year(2012)
        .survey_day(74)
        .processing_year(2012)
        .processing_day(80)
        .datum("WGS84".to_owned())
        .utm_zone(33)
        .units("meters".to_owned())
        .build()
}

/// Writes a point file with the sample fields and records at `path`
pub fn write_point_file(path: &Path) -> anyhow::Result<()> {
    create(path, sample_contents(sample_fields()), &sample_records())?;
    Ok(())
}

/// One shot written to a waveform file
#[derive(Debug, Clone)]
pub struct ShotFixture {
    pub file_index: i32,
    pub offset: u32,
    pub lengths: [(u16, u16); CHANNELS],
    pub payload: Vec<u8>,
}

impl ShotFixture {
    fn new(shot: usize, file_index: i32) -> Self {
        let mut lengths = [(0, 0); CHANNELS];
        for (c, l) in lengths.iter_mut().enumerate() {
            *l = ((c + shot + 1) as u16, (2 * c + 3) as u16);
        }
        let len: usize = lengths
            .iter()
            .map(|(p, r)| usize::from(*p) + usize::from(*r))
            .sum();
        let payload = (0..len).map(|i| (shot * 31 + i) as u8).collect();
        Self {
            file_index,
            offset: 0,
            lengths,
            payload,
        }
    }

    /// Samples of channel `c`, as laid out in the payload
    pub fn segments(&self, c: usize) -> (&[u8], &[u8]) {
        let start: usize = self.lengths[..c]
            .iter()
            .map(|(p, r)| usize::from(*p) + usize::from(*r))
            .sum();
        let (p, r) = (usize::from(self.lengths[c].0), usize::from(self.lengths[c].1));
        (
            &self.payload[start..start + p],
            &self.payload[start + p..start + p + r],
        )
    }
}

/// Encodes a shot message: common header, shot structure, waveform payload
pub fn shot_message(id: u16, sequence: u32, shot: &ShotFixture) -> Vec<u8> {
    let size = 8 + 36 + CHANNELS * 16 + shot.payload.len();
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(size as u16).to_le_bytes());
    out.extend_from_slice(&sequence.to_le_bytes());
    out.extend_from_slice(&(START_GPS_TIME + f64::from(sequence)).to_le_bytes());
    out.extend_from_slice(&u64::from(sequence).to_le_bytes());
    out.extend_from_slice(&1.5f32.to_le_bytes());
    out.extend_from_slice(&(-0.5f32).to_le_bytes());
    out.extend_from_slice(&sequence.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&2.25f32.to_le_bytes());
    for (pulse, reflex) in shot.lengths {
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&pulse.to_le_bytes());
        out.extend_from_slice(&40u16.to_le_bytes());
        out.extend_from_slice(&reflex.to_le_bytes());
        out.extend_from_slice(&350u32.to_le_bytes());
        out.extend_from_slice(&(-4i16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out.extend_from_slice(&shot.payload);
    assert_eq!(out.len(), size);
    out
}

pub fn waveform_file_header() -> Vec<u8> {
    let mut header = b"#FILETYPE HAWKEYE_RAW\n#VERSION 3.1\n#SYSTEM Chiroptera\n#CREATED 2012-03-14 10:15:00\n".to_vec();
    header.resize(256, b' ');
    header
}

/// A complete survey layout in a temporary directory
///
/// ```text
/// <root>/Output/20120314_101500/Line_007_HD.bin
/// <root>/Output/20120314_101500/Line_007_HD.sfm
/// <root>/Line_007/HD_000.dat   shots 0 and 1
/// <root>/Line_007/HD_001.dat   shot 2
/// ```
pub struct Survey {
    pub root: Temp,
    pub primary: PathBuf,
    pub index: PathBuf,
    pub records: Vec<PointRecord>,
    pub shots: Vec<ShotFixture>,
}

impl Survey {
    pub fn waveform_path(&self, file_index: i32) -> PathBuf {
        let root: &Path = self.root.as_ref();
        root.join(FLIGHTLINE).join(format!("HD_{file_index:03}.dat"))
    }
}

pub fn survey() -> anyhow::Result<Survey> {
    let tmp = Temp::new_dir()?;
    let root: &Path = tmp.as_ref();
    let output = root.join("Output").join("20120314_101500");
    let waveform_dir = root.join(FLIGHTLINE);
    fs::create_dir_all(&output)?;
    fs::create_dir_all(&waveform_dir)?;

    let primary = output.join(format!("{FLIGHTLINE}_HD.bin"));
    write_point_file(&primary)?;

    let mut shots: Vec<ShotFixture> = (0..NUM_RECORDS / 4)
        .map(|s| ShotFixture::new(s, if s < 2 { 0 } else { 1 }))
        .collect();

    for file_index in [0, 1] {
        let mut bytes = waveform_file_header();
        for (sequence, shot) in shots.iter_mut().enumerate() {
            if shot.file_index != file_index {
                continue;
            }
            shot.offset = bytes.len() as u32;
            bytes.extend(shot_message(0x3001, sequence as u32, shot));
        }
        fs::write(waveform_dir.join(format!("HD_{file_index:03}.dat")), bytes)?;
    }

    let index = primary.with_extension("sfm");
    let mut sfm = File::create(&index)?;
    sfm.write_all(&[0; 20])?;
    for (s, shot) in shots.iter().enumerate() {
        sfm.write_all(&(START_GPS_TIME + s as f64).to_le_bytes())?;
        sfm.write_all(&(s as u32 * 1000).to_le_bytes())?;
        sfm.write_all(&shot.offset.to_le_bytes())?;
        sfm.write_all(&shot.file_index.to_le_bytes())?;
    }

    Ok(Survey {
        root: tmp,
        primary,
        index,
        records: sample_records(),
        shots,
    })
}
