//! Indicator tables
//!
//! An indicator table has a time column and any number of channel columns
//! whose cells are either empty or a number (`1` marks an event). Every
//! stage after tag expansion works on this shape: column selection, the
//! final per-group files and the bridged tables.

use crate::config::CountWindow;
use crate::types::{AbsoluteTime, DecoderError, EventTag, Result};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Cell value marking an event
pub const INDICATOR_HIT: f64 = 1.0;

/// Identity of a channel column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorColumn {
    /// 1-based channel ("Box") number
    pub channel: usize,
    /// Event tag for per-tag indicator columns
    pub tag: Option<EventTag>,
}

impl IndicatorColumn {
    /// Plain channel column (`Box N`)
    pub fn channel(channel: usize) -> Self {
        Self { channel, tag: None }
    }

    /// Per-tag column (`Box N-T`)
    pub fn tagged(channel: usize, tag: EventTag) -> Self {
        Self {
            channel,
            tag: Some(tag),
        }
    }

    /// Header label
    pub fn name(&self) -> String {
        match self.tag {
            Some(tag) => format!("Box {}-{}", self.channel, tag),
            None => format!("Box {}", self.channel),
        }
    }
}

/// One row of an indicator table
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    /// `None` when the time cell was missing or not numeric
    pub time: Option<AbsoluteTime>,
    pub cells: Vec<Option<f64>>,
}

impl IndicatorRow {
    /// Bit-exact identity of the row, used for duplicate detection
    fn identity(&self) -> (Option<AbsoluteTime>, Vec<Option<u64>>) {
        (
            self.time,
            self.cells.iter().map(|c| c.map(f64::to_bits)).collect(),
        )
    }
}

/// Time column plus channel indicator columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorTable {
    pub columns: Vec<IndicatorColumn>,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    pub fn new(columns: Vec<IndicatorColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header labels of the channel columns
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(IndicatorColumn::name).collect()
    }

    /// Keep only the per-tag columns whose tag is listed
    ///
    /// Plain channel columns (no tag) are always kept. Column order is
    /// preserved.
    pub fn select_tags(&self, tags: &[EventTag]) -> IndicatorTable {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.tag.map_or(true, |tag| tags.contains(&tag)))
            .map(|(index, _)| index)
            .collect();

        IndicatorTable {
            columns: keep.iter().map(|&i| self.columns[i]).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| IndicatorRow {
                    time: row.time,
                    cells: keep.iter().map(|&i| row.cells.get(i).copied().flatten()).collect(),
                })
                .collect(),
        }
    }

    /// Column index of each of the channels `1..=width`
    ///
    /// A channel's column is its plain `Box N` column if it has one, else its
    /// `Box N-<tag>` column, else its only column. Fails when a channel has
    /// no column or several tag columns none of which carries `tag`.
    pub fn channel_columns(&self, width: usize, tag: EventTag) -> Result<Vec<usize>> {
        (1..=width)
            .map(|channel| {
                let candidates: Vec<usize> = self
                    .columns
                    .iter()
                    .enumerate()
                    .filter(|(_, column)| column.channel == channel)
                    .map(|(index, _)| index)
                    .collect();

                let plain = candidates.iter().copied().find(|&i| self.columns[i].tag.is_none());
                let tagged = candidates.iter().copied().find(|&i| self.columns[i].tag == Some(tag));
                let only = match candidates.as_slice() {
                    [index] => Some(*index),
                    _ => None,
                };

                plain.or(tagged).or(only).ok_or_else(|| {
                    DecoderError::TableError(if candidates.is_empty() {
                        format!("not enough columns: no column for Box {} of {}", channel, width)
                    } else {
                        format!(
                            "Box {} has {} tag columns and none for tag {}",
                            channel,
                            candidates.len(),
                            tag
                        )
                    })
                })
            })
            .collect()
    }

    /// Channels `1..=width` as plain columns numbered from `first_channel`
    ///
    /// Each channel is located by its column identity, see
    /// [`IndicatorTable::channel_columns`].
    pub fn renumbered(
        &self,
        first_channel: usize,
        width: usize,
        tag: EventTag,
    ) -> Result<IndicatorTable> {
        let sources = self.channel_columns(width, tag)?;

        Ok(IndicatorTable {
            columns: (first_channel..first_channel + width)
                .map(IndicatorColumn::channel)
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|row| IndicatorRow {
                    time: row.time,
                    cells: sources
                        .iter()
                        .map(|&i| row.cells.get(i).copied().flatten())
                        .collect(),
                })
                .collect(),
        })
    }

    /// Stable sort by time ascending; rows without a time go last
    pub fn sort_by_time(&mut self) {
        self.rows.sort_by(|a, b| match (a.time, b.time) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    /// Remove exact duplicate rows, keeping the first occurrence
    pub fn dedup_rows(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.identity()));
    }

    /// Count cells equal to the hit value per column, over rows inside `window`
    ///
    /// With no window every row with a time is counted.
    pub fn count_hits(&self, window: Option<&CountWindow>) -> Vec<usize> {
        let mut counts = vec![0; self.columns.len()];

        for row in &self.rows {
            let Some(time) = row.time else {
                continue;
            };
            if let Some(window) = window {
                if !window.contains(time.minutes()) {
                    continue;
                }
            }
            for (count, cell) in counts.iter_mut().zip(&row.cells) {
                if *cell == Some(INDICATOR_HIT) {
                    *count += 1;
                }
            }
        }

        counts
    }
}
