use std::{
    fs::{self, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::Path,
};

mod common;
use common::{survey, CHANNELS, START_GPS_TIME};
use libhawkeye::{Channel, Error, HawkeyeFile, IoStats, Mode};

fn patch(path: &Path, offset: u64, bytes: &[u8]) -> anyhow::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)?;
    Ok(())
}

fn truncate(path: &Path, len: u64) -> anyhow::Result<()> {
    OpenOptions::new().write(true).open(path)?.set_len(len)?;
    Ok(())
}

#[test]
fn splits_channels_at_declared_lengths() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    for (s, expected) in survey.shots.iter().enumerate() {
        let shot = file.read_waveform(4 * s as i64)?;
        assert_eq!(shot.waveforms.len(), CHANNELS);
        for (c, (channel, waveform)) in shot.channels().enumerate() {
            let (pulse, reflex) = expected.segments(c);
            assert_eq!(waveform.pulse, pulse, "shot {s} {channel} pulse");
            assert_eq!(waveform.reflex, reflex, "shot {s} {channel} reflex");
        }
        assert_eq!(shot.header.id, 0x3001);
        assert_eq!(shot.header.sequence as usize, s);
        assert_eq!(shot.shot.timestamp, START_GPS_TIME + s as f64);
        assert_eq!(shot.shot.channels[3].reflex_time, 350);
    }
    Ok(())
}

#[test]
fn channels_follow_declaration_order() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    let shot = file.read_waveform(0)?;
    let first = &survey.shots[0];
    assert_eq!(shot.channel(Channel::Shallow1).pulse, first.segments(0).0);
    assert_eq!(shot.channel(Channel::Deep1).reflex, first.segments(4).1);
    assert_eq!(shot.channel(Channel::IrOrthogonal).pulse, first.segments(11).0);
    Ok(())
}

#[test]
fn exposes_waveform_file_header() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    let shot = file.read_waveform(1)?;
    assert_eq!(shot.file_header.get("FILETYPE"), Some("HAWKEYE_RAW"));
    assert_eq!(shot.file_header.get("SYSTEM"), Some("Chiroptera"));
    assert_eq!(shot.file_header.entries.len(), 4);
    Ok(())
}

#[test]
fn four_records_cost_one_index_read() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;

    let first = file.read_waveform(4)?;
    for recnum in 5..8 {
        assert_eq!(file.read_waveform(recnum)?, first);
    }
    assert_eq!(
        file.stats(),
        IoStats {
            index_reads: 1,
            waveform_reads: 1,
            waveform_opens: 1,
        }
    );

    // shot 0 lives in the same waveform file
    for recnum in 0..4 {
        file.read_waveform(recnum)?;
    }
    assert_eq!(file.stats().index_reads, 2);
    assert_eq!(file.stats().waveform_reads, 2);
    assert_eq!(file.stats().waveform_opens, 1);
    Ok(())
}

#[test]
fn switches_waveform_files() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    file.read_waveform(0)?;
    let last = file.read_waveform(8)?;
    assert_eq!(last.channel(Channel::Shallow1).pulse, survey.shots[2].segments(0).0);
    assert_eq!(file.stats().waveform_opens, 2);

    // going back reopens the first file
    file.read_waveform(4)?;
    assert_eq!(file.stats().waveform_opens, 3);
    Ok(())
}

#[test]
fn rejects_non_shot_messages() -> anyhow::Result<()> {
    let survey = survey()?;
    let shot = &survey.shots[1];
    patch(
        &survey.waveform_path(shot.file_index),
        u64::from(shot.offset),
        &0x2001u16.to_le_bytes(),
    )?;

    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    file.read_waveform(0)?;
    let err = file.read_waveform(5).unwrap_err();
    assert!(
        matches!(err, Error::MessageIdMismatch { id: 0x2001, recnum: 5, .. }),
        "{err}"
    );
    Ok(())
}

#[test]
fn short_payload_is_a_layout_error() -> anyhow::Result<()> {
    let survey = survey()?;
    let shot = &survey.shots[0];
    let size = 8 + 36 + CHANNELS as u16 * 16 + 10;
    patch(
        &survey.waveform_path(shot.file_index),
        u64::from(shot.offset) + 2,
        &size.to_le_bytes(),
    )?;

    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    let err = file.read_waveform(0).unwrap_err();
    assert!(
        matches!(err, Error::WaveformLayout { available: 10, ref needed, .. } if *needed == shot.payload.len()),
        "{err}"
    );
    Ok(())
}

#[test]
fn truncated_index_is_eof() -> anyhow::Result<()> {
    let survey = survey()?;
    truncate(&survey.index, 20 + 20)?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    file.read_waveform(3)?;
    let err = file.read_waveform(4).unwrap_err();
    assert!(matches!(err, Error::IndexEof { recnum: 4, .. }), "{err}");
    Ok(())
}

#[test]
fn partial_index_record_is_a_read_error() -> anyhow::Result<()> {
    let survey = survey()?;
    truncate(&survey.index, 20 + 20 + 7)?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    let err = file.read_waveform(4).unwrap_err();
    assert!(matches!(err, Error::IndexRead { recnum: 4, .. }), "{err}");
    Ok(())
}

#[test]
fn missing_side_files_are_reported() -> anyhow::Result<()> {
    let survey = survey()?;
    fs::remove_file(survey.waveform_path(1))?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    file.read_waveform(0)?;
    let err = file.read_waveform(8).unwrap_err();
    assert!(matches!(err, Error::WaveformOpen { .. }), "{err}");

    fs::remove_file(&survey.index)?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    // records do not need the side files
    file.read_record(0)?;
    let err = file.read_waveform(0).unwrap_err();
    assert!(matches!(err, Error::IndexOpen { ref path, .. } if *path == survey.index));
    Ok(())
}

#[test]
fn waveform_reads_are_bounds_checked() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut file = HawkeyeFile::open(&survey.primary, Mode::ReadOnly)?;
    assert!(matches!(
        file.read_waveform(-4),
        Err(Error::OutOfRange { recnum: -4, .. })
    ));
    assert_eq!(file.stats(), IoStats::default());
    Ok(())
}
