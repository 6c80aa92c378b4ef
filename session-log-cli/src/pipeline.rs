//! Per-file processing pipeline
//!
//! For every file of an input directory: convert to tab-delimited text,
//! decode, write the aligned table, expand tags, select the final columns.
//! A file that fails at any step is skipped and reported; the batch goes on.

use crate::config::AppConfig;
use crate::layout::OutputLayout;
use crate::report::BatchReport;
use anyhow::{Context, Result};
use session_log_decoder::formats::{self, convert_file};
use session_log_decoder::{Decoder, ProcessingMode};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sorted regular files of a directory; sub-directories are logged and left out
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {:?}", dir))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list input directory: {:?}", dir))?
            .path();
        if path.is_file() {
            files.push(path);
        } else {
            log::info!("Skipping directory: {:?}", path);
        }
    }
    files.sort();
    Ok(files)
}

/// Write a file through a buffered writer
pub fn write_output<F>(path: &Path, render: F) -> session_log_decoder::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> session_log_decoder::Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    render(&mut writer)?;
    writer.flush()?;
    log::debug!("Wrote {:?}", path);
    Ok(())
}

/// Processes the files of one channel group
pub struct GroupProcessor<'a> {
    config: &'a AppConfig,
    layout: &'a OutputLayout,
    decoder: Decoder,
    /// Appended to every output file name of this group (`_9-16` for the high range)
    suffix: String,
}

impl<'a> GroupProcessor<'a> {
    pub fn new(config: &'a AppConfig, layout: &'a OutputLayout, suffix: impl Into<String>) -> Self {
        Self {
            config,
            layout,
            decoder: Decoder::new(config.decoder_config()),
            suffix: suffix.into(),
        }
    }

    /// Process every file of `input_dir`
    ///
    /// Only failing to read the directory itself is an error.
    pub fn process_dir(&self, input_dir: &Path, report: &mut BatchReport) -> Result<()> {
        log::info!("Processing directory {:?} (suffix {:?})", input_dir, self.suffix);
        for path in list_files(input_dir)? {
            self.process_file(&path, report);
        }
        Ok(())
    }

    /// Process one file, recording a skip on failure
    pub fn process_file(&self, path: &Path, report: &mut BatchReport) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let text = match convert_file(path) {
            Ok(text) => text,
            Err(e) => {
                report.skip(file_name, format!("conversion failed: {}", e));
                return;
            }
        };

        match self.decode_and_write(path, &file_name, &text, report) {
            Ok(()) => report.processed.push(file_name),
            Err(e) => report.skip(file_name, format!("processing failed: {}", e)),
        }
    }

    fn output_name(&self, path: &Path, extension: &str) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}{}.{}", stem, self.suffix, extension)
    }

    fn decode_and_write(
        &self,
        path: &Path,
        file_name: &str,
        text: &str,
        report: &mut BatchReport,
    ) -> session_log_decoder::Result<()> {
        let txt_name = self.output_name(path, "txt");
        let csv_name = self.output_name(path, "csv");

        write_output(&self.layout.converted.join(&txt_name), |out| {
            out.write_all(text.as_bytes())?;
            Ok(())
        })?;

        let record = self.decoder.decode_text(text);
        for warning in &record.scan.warnings {
            report.warn(file_name, warning);
        }
        log::info!(
            "{}: {} channel section(s), {} aligned row(s)",
            file_name,
            record.channel_sections(),
            record.aligned.len()
        );

        let indicators = self.decoder.indicators(&record);
        match record.mode {
            ProcessingMode::MultiTag => {
                write_output(&self.layout.aligned.join(&csv_name), |out| {
                    formats::write_aligned(&record.aligned, out)
                })?;
                write_output(&self.layout.raster.join(&csv_name), |out| {
                    formats::write_indicator(&indicators, out)
                })?;

                let selected = indicators.select_tags(&self.config.processing.final_tags);
                write_output(&self.layout.final_dir.join(&csv_name), |out| {
                    formats::write_indicator(&selected, out)
                })?;
            }
            ProcessingMode::SingleTag => {
                write_output(&self.layout.aligned.join(&csv_name), |out| {
                    formats::write_indicator(&indicators, out)
                })?;
                write_output(&self.layout.final_dir.join(&csv_name), |out| {
                    formats::write_indicator(&indicators, out)
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const RECORD: &str = "C:\n 0: 6000.0100 6000.0200\nC:\n 0: 3000.0600\n";

    fn setup(mode: ProcessingMode) -> (tempfile::TempDir, AppConfig, OutputLayout) {
        let root = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.processing.mode = mode;
        let layout = OutputLayout::new(&root.path().join("out"));
        layout.create().unwrap();
        (root, config, layout)
    }

    #[test]
    fn test_multi_tag_outputs() {
        let (root, config, layout) = setup(ProcessingMode::MultiTag);
        let input = root.path().join("rat1.txt");
        fs::write(&input, RECORD).unwrap();

        let mut report = BatchReport::new();
        GroupProcessor::new(&config, &layout, "_9-16").process_file(&input, &mut report);

        assert_eq!(report.processed, vec!["rat1.txt"]);
        assert!(layout.converted.join("rat1_9-16.txt").is_file());

        let aligned = fs::read_to_string(layout.aligned.join("rat1_9-16.csv")).unwrap();
        assert!(aligned.starts_with("Absolute Time (minutes),Box 1 Raw Data,Box 1 Fraction"));
        assert_eq!(aligned.lines().count(), 4);

        let final_csv = fs::read_to_string(layout.final_dir.join("rat1_9-16.csv")).unwrap();
        let lines: Vec<&str> = final_csv.lines().collect();
        assert_eq!(
            lines[0],
            "Absolute Time (minutes),\
             Box 1-1,Box 2-1,Box 3-1,Box 4-1,Box 5-1,Box 6-1,Box 7-1,Box 8-1"
        );
        // 0.5: box 2 tag 6 only; 1.0: box 1 tag 1; 2.0: box 1 tag 2 (implies tag 1)
        assert_eq!(lines[1], "0.5,,,,,,,,");
        assert_eq!(lines[2], "1.0,1,,,,,,,");
        assert_eq!(lines[3], "2.0,1,,,,,,,");
    }

    #[test]
    fn test_single_tag_outputs() {
        let (root, config, layout) = setup(ProcessingMode::SingleTag);
        let input = root.path().join("rat2.txt");
        fs::write(&input, RECORD).unwrap();

        let mut report = BatchReport::new();
        GroupProcessor::new(&config, &layout, "").process_file(&input, &mut report);

        let final_csv = fs::read_to_string(layout.final_dir.join("rat2.csv")).unwrap();
        let lines: Vec<&str> = final_csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Box 15,Box 16"));
        assert_eq!(lines[1], format!("1.0,1{}", ",".repeat(15)));
    }

    #[test]
    fn test_unsupported_file_is_skipped() {
        let (root, config, layout) = setup(ProcessingMode::MultiTag);
        let input = root.path().join("sheet.xlsx");
        fs::write(&input, b"PK").unwrap();

        let mut report = BatchReport::new();
        GroupProcessor::new(&config, &layout, "").process_file(&input, &mut report);

        assert!(report.processed.is_empty());
        assert_eq!(report.skips_for("sheet.xlsx").len(), 1);
        assert!(!layout.final_dir.join("sheet.csv").exists());
    }

    #[test]
    fn test_truncation_is_reported_not_skipped() {
        let (root, config, layout) = setup(ProcessingMode::MultiTag);
        let input = root.path().join("wide.txt");
        fs::write(&input, "C:\n 0: 6000.0100\n".repeat(9)).unwrap();

        let mut report = BatchReport::new();
        GroupProcessor::new(&config, &layout, "").process_file(&input, &mut report);

        assert_eq!(report.processed, vec!["wide.txt"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_list_files_is_sorted() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("b.txt"), "").unwrap();
        fs::write(root.path().join("a.txt"), "").unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();

        let files = list_files(root.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        assert!(list_files(&root.path().join("missing")).is_err());
    }
}
