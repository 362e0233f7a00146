use std::{
    io::Write,
    ops::Range,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use libhawkeye::{FileTable, HawkeyeFile, Mode};
use tracing::{debug, info, instrument, warn};

/// Writes the headers of a point file
#[instrument(skip(out))]
pub fn print_info(path: &Path, out: &mut impl Write) -> Result<()> {
    let file = HawkeyeFile::open(path, Mode::ReadOnly)?;
    let meta = file.meta();
    let contents = file.contents();

    writeln!(out, "File:          {}", path.display())?;
    writeln!(out, "Kind:          {}", file.kind())?;
    writeln!(
        out,
        "Version:       {}.{}",
        meta.version_major, meta.version_minor
    )?;
    writeln!(out, "Project:       {}", contents.project_name)?;
    writeln!(out, "Flightline:    {}", contents.flightline_name)?;
    writeln!(out, "Software:      {}", contents.software_version)?;
    writeln!(
        out,
        "Surveyed:      {} day {}",
        contents.survey_year, contents.survey_day
    )?;
    writeln!(
        out,
        "Processed:     {} day {}",
        contents.processing_year, contents.processing_day
    )?;
    writeln!(
        out,
        "Projection:    {} UTM {}{} ({})",
        contents.datum,
        contents.utm_zone,
        if contents.southern_hemisphere { 'S' } else { 'N' },
        contents.units
    )?;
    writeln!(
        out,
        "Records:       {} x {} bytes at offset {}",
        contents.num_records, contents.record_size, contents.data_offset
    )?;
    writeln!(out, "Index:         {}", file.side_paths().index.display())?;
    match &file.side_paths().waveform_dir {
        Some(dir) => writeln!(out, "Waveforms:     {}", dir.display())?,
        None => writeln!(out, "Waveforms:     none")?,
    }

    writeln!(out, "Fields:")?;
    for def in file.fields() {
        writeln!(
            out,
            "  {:<40} {:<20} {}",
            def.tag, def.data_type, def.description
        )?;
    }

    writeln!(out, "Ranges:")?;
    for ((field, min), (_, max)) in contents
        .min_values
        .available_fields(file.availability())
        .zip(contents.max_values.available_fields(file.availability()))
    {
        writeln!(out, "  {:<40} {min} .. {max}", field.as_str())?;
    }
    Ok(())
}

/// Records `start..start + count`, clamped to the records of the file
fn record_range(start: i64, count: Option<i64>, num_records: i64) -> Range<i64> {
    let end = count.map_or(num_records, |c| start.saturating_add(c).min(num_records));
    start..end
}

/// Writes records `start..start + count` of every file in `paths`
///
/// Files that cannot be opened are reported and skipped.
#[instrument(skip(out))]
pub fn dump(paths: &[PathBuf], start: i64, count: Option<i64>, out: &mut impl Write) -> Result<()> {
    let mut table = FileTable::new();
    for path in paths {
        let Ok(handle) = table.open(path, Mode::ReadOnly) else {
            table.print_last_error();
            continue;
        };
        let (num_records, availability) = match table.file(handle) {
            Some(file) => (i64::from(file.num_records()), file.availability().clone()),
            None => continue,
        };
        let records = record_range(start, count, num_records);
        debug!("Dumping records {records:?} of {}", path.display());

        writeln!(out, "# {}", path.display())?;
        for recnum in records {
            let record = table
                .read_record(handle, recnum)
                .with_context(|| format!("reading record {recnum}"))?;
            let fields = record
                .available_fields(&availability)
                .map(|(field, value)| format!("{}={value}", field.as_str()))
                .join(" ");
            writeln!(
                out,
                "{recnum} {}.{:09} {fields}",
                record.tv_sec, record.tv_nsec
            )?;
        }
        table.close(handle)?;
    }
    if table.last_error_code() != 0 {
        warn!("Last error: {}", table.last_error_string());
    }
    Ok(())
}

/// Writes the shot and the per-channel samples record `recnum` was derived from
#[instrument(skip(out))]
pub fn print_waveform(path: &Path, recnum: i64, out: &mut impl Write) -> Result<()> {
    let mut file = HawkeyeFile::open(path, Mode::ReadOnly)?;
    let shot = file.read_waveform(recnum)?;
    info!("Read shot {} for record {recnum}", shot.shot.shot_counter);

    writeln!(
        out,
        "Message:       {:#06x} ({} bytes, sequence {})",
        shot.header.id, shot.header.size, shot.header.sequence
    )?;
    writeln!(out, "Timestamp:     {:.6}", shot.shot.timestamp)?;
    writeln!(out, "Shot counter:  {}", shot.shot.shot_counter)?;
    writeln!(
        out,
        "Scanner angle: {:.4} {:.4}",
        shot.shot.scanner_angle_x, shot.shot.scanner_angle_y
    )?;
    writeln!(out, "Pulse energy:  {:.4}", shot.shot.pulse_energy)?;
    for (key, value) in &shot.file_header.entries {
        writeln!(out, "#{key} {value}")?;
    }
    for ((channel, waveform), info) in shot.channels().zip(shot.shot.channels.iter()) {
        writeln!(
            out,
            "{channel} bias {} reflex at {} ns",
            info.bias, info.reflex_time
        )?;
        writeln!(out, "  pulse  {}", waveform.pulse.iter().join(","))?;
        writeln!(out, "  reflex {}", waveform.reflex.iter().join(","))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_range_is_clamped() {
        assert_eq!(record_range(0, None, 12), 0..12);
        assert_eq!(record_range(2, Some(3), 12), 2..5);
        assert_eq!(record_range(5, Some(i64::MAX), 12), 5..12);
        assert!(record_range(i64::MAX, Some(i64::MAX), 12).is_empty());
    }
}
