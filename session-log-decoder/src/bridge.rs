//! Cross-group bridging
//!
//! A session recorded on 16 boxes arrives as two group files: one for the
//! low channel range and one, carrying a suffix marker in its name, for the
//! high range. Files are paired by base name, the high range is renumbered
//! after the low one, and the two tables are combined by one of two
//! policies.

use crate::config::BridgeConfig;
use crate::table::{IndicatorColumn, IndicatorRow, IndicatorTable};
use crate::types::{AbsoluteTime, Result};
use std::collections::BTreeMap;

/// Extension of group files considered for pairing
const GROUP_FILE_EXTENSION: &str = ".csv";

/// Low- and high-range file of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPair {
    pub base: String,
    pub low: String,
    pub high: String,
}

/// A base name that could not be paired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSkip {
    pub base: String,
    pub reason: String,
}

/// Result of grouping file names by base name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub pairs: Vec<GroupPair>,
    pub skipped: Vec<PairingSkip>,
}

/// Base name of a group file: the file stem with the suffix marker removed
///
/// Returns `None` for files that are not group files.
pub fn base_name(file_name: &str, suffix_marker: &str) -> Option<String> {
    if !file_name.to_lowercase().ends_with(GROUP_FILE_EXTENSION) {
        return None;
    }

    let stripped = if !suffix_marker.is_empty() && file_name.contains(suffix_marker) {
        file_name.replace(suffix_marker, "")
    } else {
        file_name.to_string()
    };

    Some(match stripped.rfind('.') {
        Some(dot) if dot > 0 => stripped[..dot].to_string(),
        _ => stripped,
    })
}

/// Group file names by base name; each base needs one low and one high file
///
/// Bases are processed in sorted order. Every base name that does not have
/// exactly one file of each range is reported once in `skipped`.
pub fn pair_group_files<I, S>(file_names: I, suffix_marker: &str) -> Pairing
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut by_base: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in file_names {
        let name = name.as_ref();
        if let Some(base) = base_name(name, suffix_marker) {
            by_base.entry(base).or_default().push(name.to_string());
        }
    }

    let mut pairing = Pairing::default();
    for (base, mut files) in by_base {
        files.sort();
        let is_high = |f: &String| !suffix_marker.is_empty() && f.contains(suffix_marker);
        let (high, low): (Vec<String>, Vec<String>) = files.iter().cloned().partition(is_high);

        if files.len() != 2 {
            pairing.skipped.push(PairingSkip {
                reason: format!(
                    "expected exactly 2 matching files, found {}: {}",
                    files.len(),
                    files.join(", ")
                ),
                base,
            });
        } else if low.len() != 1 || high.len() != 1 {
            pairing.skipped.push(PairingSkip {
                reason: format!(
                    "files don't match the expected pattern (one without and one with '{}'): {}",
                    suffix_marker,
                    files.join(", ")
                ),
                base,
            });
        } else {
            pairing.pairs.push(GroupPair {
                base,
                low: low[0].clone(),
                high: high[0].clone(),
            });
        }
    }

    pairing
}

/// Outcome of count-policy bridging
#[derive(Debug, Clone, PartialEq)]
pub struct CountedBridge {
    /// Joined, deduplicated, time-sorted table (`Box 1` .. `Box 2*width`)
    pub table: IndicatorTable,
    /// Hits per channel column inside the counting window
    pub counts: Vec<usize>,
}

/// Combines the two group tables of one session
pub struct Bridger<'a> {
    config: &'a BridgeConfig,
}

impl<'a> Bridger<'a> {
    pub fn new(config: &'a BridgeConfig) -> Self {
        Self { config }
    }

    /// Rename both groups' columns to one continuous `Box N` numbering
    ///
    /// Each group's channels are located by column identity, so files with
    /// several tag columns per channel bridge their `bridged_tag` columns.
    fn renumber(
        &self,
        low: &IndicatorTable,
        high: &IndicatorTable,
    ) -> Result<(IndicatorTable, IndicatorTable)> {
        let width = self.config.group_width;
        let tag = self.config.bridged_tag;
        let low = low.renumbered(1, width, tag)?;
        let high = high.renumbered(width + 1, width, tag)?;
        Ok((low, high))
    }

    /// Outer-join on time, drop duplicate rows, sort, count hits in the window
    pub fn bridge_counted(
        &self,
        low: &IndicatorTable,
        high: &IndicatorTable,
    ) -> Result<CountedBridge> {
        let (mut low, mut high) = self.renumber(low, high)?;
        low.dedup_rows();
        high.dedup_rows();

        let mut table = outer_join(&low, &high);
        table.sort_by_time();
        table.dedup_rows();

        let counts = table.count_hits(Some(&self.config.window));
        Ok(CountedBridge { table, counts })
    }

    /// Concatenate the groups' rows, each padded with the other's empty columns
    pub fn bridge_stacked(
        &self,
        low: &IndicatorTable,
        high: &IndicatorTable,
    ) -> Result<IndicatorTable> {
        let (low, high) = self.renumber(low, high)?;
        let low_width = low.columns.len();
        let high_width = high.columns.len();

        let mut table = IndicatorTable::new(concat_columns(&low, &high));
        table.rows.extend(low.rows.into_iter().map(|row| {
            let mut cells = row.cells;
            cells.resize(low_width + high_width, None);
            IndicatorRow { time: row.time, cells }
        }));
        table.rows.extend(high.rows.into_iter().map(|row| {
            let mut cells = vec![None; low_width];
            cells.extend(row.cells);
            IndicatorRow { time: row.time, cells }
        }));

        table.sort_by_time();
        Ok(table)
    }
}

fn concat_columns(low: &IndicatorTable, high: &IndicatorTable) -> Vec<IndicatorColumn> {
    low.columns.iter().chain(&high.columns).copied().collect()
}

/// Low-group and high-group rows sharing one time
type JoinSides<'t> = (Vec<&'t IndicatorRow>, Vec<&'t IndicatorRow>);

/// Full outer join on the time column
///
/// Rows sharing a time are combined pairwise; a time present on one side
/// only gets empty cells for the other side's columns.
fn outer_join(low: &IndicatorTable, high: &IndicatorTable) -> IndicatorTable {
    let low_width = low.columns.len();
    let high_width = high.columns.len();

    let mut keyed: BTreeMap<Option<AbsoluteTime>, JoinSides<'_>> = BTreeMap::new();
    for row in &low.rows {
        keyed.entry(row.time).or_default().0.push(row);
    }
    for row in &high.rows {
        keyed.entry(row.time).or_default().1.push(row);
    }

    let empty_low = vec![None; low_width];
    let empty_high = vec![None; high_width];

    let mut table = IndicatorTable::new(concat_columns(low, high));
    for (time, (lows, highs)) in keyed {
        let lows: Vec<&[Option<f64>]> = if lows.is_empty() {
            vec![empty_low.as_slice()]
        } else {
            lows.iter().map(|r| r.cells.as_slice()).collect()
        };
        let highs: Vec<&[Option<f64>]> = if highs.is_empty() {
            vec![empty_high.as_slice()]
        } else {
            highs.iter().map(|r| r.cells.as_slice()).collect()
        };

        for l in &lows {
            for h in &highs {
                let mut cells = Vec::with_capacity(low_width + high_width);
                cells.extend_from_slice(l);
                cells.extend_from_slice(h);
                table.rows.push(IndicatorRow { time, cells });
            }
        }
    }

    table
}
