use std::path::{Path, PathBuf};

mod common;
use common::{sample_record, survey, write_point_file, NUM_RECORDS};
use libhawkeye::{Error, FileTable, Mode, MAX_FILES};
use mktemp::Temp;

fn point_files(dir: &Path, count: usize) -> anyhow::Result<Vec<PathBuf>> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("Line_{i:03}_HD.bin"));
            write_point_file(&path)?;
            Ok(path)
        })
        .collect()
}

#[test]
fn capacity_is_fixed() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let paths = point_files(dir.as_ref(), MAX_FILES + 1)?;
    let mut table = FileTable::new();

    let handles = paths[..MAX_FILES]
        .iter()
        .map(|p| table.open(p, Mode::ReadOnly))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(table.open_count(), MAX_FILES);

    let err = table.open(&paths[MAX_FILES], Mode::ReadOnly).unwrap_err();
    assert!(matches!(err, Error::TooManyOpenFiles { .. }));
    assert_eq!(table.last_error_code(), err.code());

    // the open files are untouched
    for (i, handle) in handles.iter().enumerate() {
        let recnum = (i % NUM_RECORDS) as i64;
        let mut record = table.read_record(*handle, recnum)?;
        record.tv_sec = 0;
        record.tv_nsec = 0;
        assert_eq!(record, sample_record(recnum as usize));
        assert_eq!(table.file(*handle).map(|f| f.path()), Some(paths[i].as_path()));
    }

    // a freed slot is reused
    table.close(handles[7])?;
    assert_eq!(table.open(&paths[MAX_FILES], Mode::ReadOnly)?, handles[7]);
    Ok(())
}

#[test]
fn closing_twice_is_harmless() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut table = FileTable::new();
    let handle = table.open(&survey.primary, Mode::Update)?;
    table.close(handle)?;
    table.close(handle)?;
    assert!(table.file(handle).is_none());
    assert_eq!(table.last_error_code(), 0);

    let err = table.read_record(handle, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidHandle { handle: 0 }));
    Ok(())
}

#[test]
fn remembers_the_last_error() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut table = FileTable::new();
    assert_eq!(table.last_error_code(), 0);
    assert_eq!(table.last_error_string(), "No HAWKEYE error");

    let handle = table.open(&survey.primary, Mode::ReadOnly)?;
    let err = table.read_record(handle, NUM_RECORDS as i64).unwrap_err();
    assert_eq!(table.last_error_code(), -16);
    assert_eq!(table.last_error_string(), err.to_string());
    assert!(table.last_error_string().contains(&NUM_RECORDS.to_string()));

    // successes leave it alone
    table.read_record(handle, 0)?;
    assert_eq!(table.last_error_code(), -16);

    table.update_record(handle, 0, &sample_record(0)).unwrap_err();
    assert_eq!(table.last_error_code(), -21);

    let missing = survey.primary.with_file_name("Line_404_HD.bin");
    table.open(&missing, Mode::ReadOnly).unwrap_err();
    assert_eq!(table.last_error_code(), -1);
    assert!(table.last_error_string().contains("Line_404_HD.bin"));

    table.open(Path::new("notes.txt"), Mode::ReadOnly).unwrap_err();
    assert_eq!(table.last_error_code(), -3);
    Ok(())
}

#[test]
fn reads_waveforms_through_handles() -> anyhow::Result<()> {
    let survey = survey()?;
    let mut table = FileTable::new();
    let handle = table.open(&survey.primary, Mode::ReadOnly)?;
    let shot = table.read_waveform(handle, 9)?;
    assert_eq!(shot.waveforms[0].pulse, survey.shots[2].segments(0).0);
    assert_eq!(table.file(handle).map(|f| f.stats().waveform_opens), Some(1));

    table.close(handle)?;
    assert!(table.read_waveform(handle, 0).is_err());
    assert_eq!(table.last_error_code(), -6);
    Ok(())
}
