//! Time-axis merging
//!
//! Unions the absolute times of every channel of one record into a single
//! sorted axis and lays each channel out as a sparse column over it.

use crate::table::{IndicatorColumn, IndicatorRow, IndicatorTable, INDICATOR_HIT};
use crate::types::{AbsoluteTime, ChannelEvent, EventRecord};
use std::collections::BTreeSet;

/// One row of the aligned table
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub time: AbsoluteTime,
    /// One cell per channel; `None` when the channel has no event at `time`
    pub events: Vec<Option<ChannelEvent>>,
}

/// All channels of one record over a common time axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedTable {
    /// Number of channel columns
    pub channel_count: usize,
    /// Rows sorted by time, one per distinct time
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// Merge per-channel event records onto one axis
    ///
    /// `channel_count` fixes the table width; channels the record did not
    /// contain are empty columns. Records beyond `channel_count` are ignored.
    pub fn merge(channels: &[EventRecord], channel_count: usize) -> Self {
        let channels = &channels[..channels.len().min(channel_count)];

        let axis: BTreeSet<AbsoluteTime> = channels
            .iter()
            .flat_map(|record| record.keys().copied())
            .collect();

        let rows = axis
            .into_iter()
            .map(|time| {
                let mut events: Vec<Option<ChannelEvent>> = channels
                    .iter()
                    .map(|record| record.get(&time).cloned())
                    .collect();
                events.resize(channel_count, None);
                AlignedRow { time, events }
            })
            .collect();

        Self {
            channel_count,
            rows,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Single indicator column per channel (`Box N`), `1` for any event
    ///
    /// This is the single-tag output shape: the raw token is not retained.
    pub fn to_hit_table(&self) -> IndicatorTable {
        let columns = (1..=self.channel_count).map(IndicatorColumn::channel).collect();

        let rows = self
            .rows
            .iter()
            .map(|row| IndicatorRow {
                time: Some(row.time),
                cells: row
                    .events
                    .iter()
                    .map(|event| event.as_ref().map(|_| INDICATOR_HIT))
                    .collect(),
            })
            .collect();

        IndicatorTable { columns, rows }
    }
}
