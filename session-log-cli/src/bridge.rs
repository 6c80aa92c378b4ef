//! Batch bridging of channel-group files
//!
//! Pairs the final per-group files by base name, bridges each pair with the
//! configured policy and, for the count policy, writes one summary row per
//! session.

use crate::config::AppConfig;
use crate::layout::OutputLayout;
use crate::pipeline::{list_files, write_output};
use crate::report::BatchReport;
use anyhow::Result;
use session_log_decoder::formats;
use session_log_decoder::{
    pair_group_files, BridgeConfig, BridgePolicy, Bridger, EventTag, GroupPair, IndicatorTable,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Subject used when the count summary itself cannot be written
const COUNTS_SUBJECT: &str = "count summary";

/// Read a group file and check every channel of the group has a column
fn load_group(
    path: &Path,
    width: usize,
    tag: EventTag,
) -> std::result::Result<IndicatorTable, String> {
    let name = path.file_name().unwrap_or_default();
    let file = File::open(path).map_err(|e| format!("cannot open {:?}: {}", path, e))?;
    let table = formats::read_indicator(BufReader::new(file))
        .map_err(|e| format!("{:?}: {}", name, e))?;

    table
        .channel_columns(width, tag)
        .map_err(|e| format!("{:?} cannot be bridged: {}", name, e))?;
    Ok(table)
}

/// Bridge every low/high pair found in the final output directory
pub fn bridge_groups(
    config: &AppConfig,
    layout: &OutputLayout,
    report: &mut BatchReport,
) -> Result<()> {
    let bridge_config = config.bridge_config();
    let bridger = Bridger::new(&bridge_config);

    let names: Vec<String> = list_files(&layout.final_dir)?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    let pairing = pair_group_files(&names, &bridge_config.suffix_marker);

    for skip in pairing.skipped {
        report.skip(skip.base, skip.reason);
    }

    let mut summary: Vec<(String, Vec<usize>)> = Vec::new();
    for pair in &pairing.pairs {
        if let Some(counts) = bridge_pair(&bridger, &bridge_config, pair, layout, report) {
            summary.push((pair.base.clone(), counts));
        }
    }

    if bridge_config.policy == BridgePolicy::Count {
        let path = layout.counts_file();
        let channel_count = bridge_config.group_width * 2;
        let written = write_output(&path, |out| {
            formats::write_counts(&summary, channel_count, out)
        });
        if let Err(e) = written {
            report.skip(COUNTS_SUBJECT, format!("cannot write {:?}: {}", path, e));
        } else {
            log::info!("Final counts saved to {:?}", path);
        }
    }

    Ok(())
}

/// Bridge one pair; returns the window counts for the count policy
fn bridge_pair(
    bridger: &Bridger<'_>,
    config: &BridgeConfig,
    pair: &GroupPair,
    layout: &OutputLayout,
    report: &mut BatchReport,
) -> Option<Vec<usize>> {
    let load = |name: &str| {
        load_group(
            &layout.final_dir.join(name),
            config.group_width,
            config.bridged_tag,
        )
    };
    let tables = load(&pair.low).and_then(|low| Ok((low, load(&pair.high)?)));
    let (low, high) = match tables {
        Ok(tables) => tables,
        Err(reason) => {
            report.skip(&pair.base, reason);
            return None;
        }
    };

    let (bridged, counts) = match config.policy {
        BridgePolicy::Count => match bridger.bridge_counted(&low, &high) {
            Ok(counted) => (counted.table, Some(counted.counts)),
            Err(e) => {
                report.skip(&pair.base, e.to_string());
                return None;
            }
        },
        BridgePolicy::Stacked => match bridger.bridge_stacked(&low, &high) {
            Ok(table) => (table, None),
            Err(e) => {
                report.skip(&pair.base, e.to_string());
                return None;
            }
        },
        BridgePolicy::None => return None,
    };

    let path = layout.bridged.join(format!("{}.csv", pair.base));
    if let Err(e) = write_output(&path, |out| formats::write_indicator(&bridged, out)) {
        report.skip(&pair.base, format!("cannot write {:?}: {}", path, e));
        return None;
    }

    log::info!("Bridged file saved to {:?}", path);
    report.bridged.push(pair.base.clone());
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "Absolute Time (minutes),\
        Box 1-1,Box 2-1,Box 3-1,Box 4-1,Box 5-1,Box 6-1,Box 7-1,Box 8-1\n";

    fn setup(policy: BridgePolicy) -> (tempfile::TempDir, AppConfig, OutputLayout) {
        let root = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.input.high_range_dir = Some(root.path().join("high"));
        config.bridge.policy = policy;
        config.bridge.window_end = Some(3.0);
        let layout = OutputLayout::new(root.path());
        layout.create().unwrap();
        (root, config, layout)
    }

    fn write_group(layout: &OutputLayout, name: &str, rows: &str) {
        fs::write(layout.final_dir.join(name), format!("{}{}", HEADER, rows)).unwrap();
    }

    #[test]
    fn test_count_policy() {
        let (_root, config, layout) = setup(BridgePolicy::Count);
        write_group(&layout, "s1.csv", "1.0,1,,,,,,,\n2.5,1,,,,,,,\n4.0,1,,,,,,,\n");
        write_group(&layout, "s1_9-16.csv", "1.0,1,,,,,,,\n");

        let mut report = BatchReport::new();
        bridge_groups(&config, &layout, &mut report).unwrap();

        assert_eq!(report.bridged, vec!["s1"]);
        let bridged = fs::read_to_string(layout.bridged.join("s1.csv")).unwrap();
        let lines: Vec<&str> = bridged.lines().collect();
        assert!(lines[0].ends_with("Box 9,Box 10,Box 11,Box 12,Box 13,Box 14,Box 15,Box 16"));
        assert_eq!(lines[1], "1.0,1,,,,,,,,1,,,,,,,");
        assert_eq!(lines.len(), 4);

        let counts = fs::read_to_string(layout.counts_file()).unwrap();
        let rows: Vec<&str> = counts.lines().collect();
        assert!(rows[0].starts_with("File Name,Box 1,"));
        assert_eq!(rows[1], "s1,2,0,0,0,0,0,0,0,1,0,0,0,0,0,0,0");
    }

    #[test]
    fn test_stacked_policy() {
        let (_root, config, layout) = setup(BridgePolicy::Stacked);
        write_group(&layout, "s1.csv", "1.0,1,,,,,,,\n");
        write_group(&layout, "s1_9-16.csv", "1.0,1,,,,,,,\n");

        let mut report = BatchReport::new();
        bridge_groups(&config, &layout, &mut report).unwrap();

        let bridged = fs::read_to_string(layout.bridged.join("s1.csv")).unwrap();
        let lines: Vec<&str> = bridged.lines().collect();
        assert_eq!(lines[1], "1.0,1,,,,,,,,,,,,,,,");
        assert_eq!(lines[2], "1.0,,,,,,,,,1,,,,,,,");
        assert!(!layout.counts_file().exists());
    }

    #[test]
    fn test_two_tag_columns_count_under_their_own_box() {
        let (_root, mut config, layout) = setup(BridgePolicy::Count);
        config.processing.final_tags = vec![1, 2];

        let header: Vec<String> = (1..=8)
            .flat_map(|b| [format!("Box {}-1", b), format!("Box {}-2", b)])
            .collect();
        // Box 2 tag 1 sits in the third channel column
        let row = format!("1.0,,,1{}", ",".repeat(13));
        fs::write(
            layout.final_dir.join("s1.csv"),
            format!("Absolute Time (minutes),{}\n{}\n", header.join(","), row),
        )
        .unwrap();
        write_group(&layout, "s1_9-16.csv", "1.0,1,,,,,,,\n");

        let mut report = BatchReport::new();
        bridge_groups(&config, &layout, &mut report).unwrap();

        assert!(report.skipped.is_empty());
        let counts = fs::read_to_string(layout.counts_file()).unwrap();
        assert_eq!(counts.lines().nth(1), Some("s1,0,1,0,0,0,0,0,0,1,0,0,0,0,0,0,0"));
    }

    #[test]
    fn test_narrow_file_is_skipped() {
        let (_root, config, layout) = setup(BridgePolicy::Count);
        write_group(&layout, "s1.csv", "1.0,1,,,,,,,\n");
        fs::write(
            layout.final_dir.join("s1_9-16.csv"),
            "Absolute Time (minutes),Box 1-1\n1.0,1\n",
        )
        .unwrap();

        let mut report = BatchReport::new();
        bridge_groups(&config, &layout, &mut report).unwrap();

        assert!(report.bridged.is_empty());
        assert_eq!(report.skips_for("s1").len(), 1);
        assert!(report.skips_for("s1")[0].reason.contains("enough columns"));
        assert!(!layout.bridged.join("s1.csv").exists());
    }

    #[test]
    fn test_ambiguous_base_is_reported_once() {
        let (_root, config, layout) = setup(BridgePolicy::Count);
        write_group(&layout, "s1.csv", "1.0,1,,,,,,,\n");
        write_group(&layout, "s1_9-16.csv", "1.0,1,,,,,,,\n");
        write_group(&layout, "s1_9-16_9-16.csv", "1.0,1,,,,,,,\n");

        let mut report = BatchReport::new();
        bridge_groups(&config, &layout, &mut report).unwrap();

        assert_eq!(report.skips_for("s1").len(), 1);
        assert!(!layout.bridged.join("s1.csv").exists());
        let counts = fs::read_to_string(layout.counts_file()).unwrap();
        assert_eq!(counts.lines().count(), 1);
    }
}
