//! Event-tag expansion
//!
//! Turns the single tag column of each channel into one indicator column per
//! recognized tag. The aligned table is never modified; indicator rows are
//! built from it in one pass.

use crate::merger::AlignedTable;
use crate::table::{IndicatorColumn, IndicatorRow, IndicatorTable, INDICATOR_HIT};
use crate::types::EventTag;

/// Tag whose events also count as a tag-1 event
pub const IMPLYING_TAG: EventTag = 2;

/// Tag implied by [`IMPLYING_TAG`]
pub const IMPLIED_TAG: EventTag = 1;

/// Domain rule: a tag-2 event is also a tag-1 event for the same channel.
///
/// `indicators` holds one channel's cells in the order of `tags`.
pub fn apply_tag2_implies_tag1(tags: &[EventTag], indicators: &mut [Option<f64>]) {
    let position = |wanted: EventTag| tags.iter().position(|&t| t == wanted);

    if let (Some(implying), Some(implied)) = (position(IMPLYING_TAG), position(IMPLIED_TAG)) {
        if indicators[implying] == Some(INDICATOR_HIT) {
            indicators[implied] = Some(INDICATOR_HIT);
        }
    }
}

/// Expand an aligned table into per-(channel, tag) indicator columns
///
/// Columns are channel-major: `Box 1-<tag>` for every tag in `tags`, then
/// `Box 2-<tag>`, and so on. Raw token values are dropped.
pub fn expand(table: &AlignedTable, tags: &[EventTag]) -> IndicatorTable {
    let columns = (1..=table.channel_count)
        .flat_map(|channel| tags.iter().map(move |&tag| IndicatorColumn::tagged(channel, tag)))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(table.channel_count * tags.len());
            for event in &row.events {
                let mut indicators: Vec<Option<f64>> = tags
                    .iter()
                    .map(|&tag| match event {
                        Some(event) if event.tag == tag => Some(INDICATOR_HIT),
                        _ => None,
                    })
                    .collect();
                apply_tag2_implies_tag1(tags, &mut indicators);
                cells.extend(indicators);
            }
            IndicatorRow {
                time: Some(row.time),
                cells,
            }
        })
        .collect();

    IndicatorTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MULTI_TAG_SET;
    use crate::types::{AbsoluteTime, ChannelEvent, EventRecord};

    fn record(events: &[(f64, u8)]) -> EventRecord {
        events
            .iter()
            .map(|(t, tag)| (AbsoluteTime::from_minutes(*t), ChannelEvent::new("x", *tag)))
            .collect()
    }

    #[test]
    fn test_expand_columns() {
        let aligned = AlignedTable::merge(&[record(&[(1.0, 1)])], 2);
        let expanded = expand(&aligned, &MULTI_TAG_SET);

        assert_eq!(
            expanded.column_names(),
            vec!["Box 1-1", "Box 1-2", "Box 1-6", "Box 2-1", "Box 2-2", "Box 2-6"]
        );
        assert_eq!(
            expanded.rows[0].cells,
            vec![Some(1.0), None, None, None, None, None]
        );
    }

    #[test]
    fn test_tag_six_sets_only_its_column() {
        let aligned = AlignedTable::merge(&[record(&[(1.0, 6)])], 1);
        let expanded = expand(&aligned, &MULTI_TAG_SET);

        assert_eq!(expanded.rows[0].cells, vec![None, None, Some(1.0)]);
    }

    #[test]
    fn test_tag_two_implies_tag_one() {
        let aligned = AlignedTable::merge(
            &[record(&[(1.0, 2), (2.0, 1), (3.0, 6)]), record(&[(1.0, 2)])],
            8,
        );
        let expanded = expand(&aligned, &MULTI_TAG_SET);

        for row in &expanded.rows {
            for channel in row.cells.chunks(MULTI_TAG_SET.len()) {
                if channel[1] == Some(INDICATOR_HIT) {
                    assert_eq!(channel[0], Some(INDICATOR_HIT));
                }
            }
        }
        assert_eq!(
            expanded.rows[0].cells[..6],
            [Some(1.0), Some(1.0), None, Some(1.0), Some(1.0), None]
        );
    }

    #[test]
    fn test_rule_is_noop_without_both_tags() {
        let mut cells = vec![Some(INDICATOR_HIT)];
        apply_tag2_implies_tag1(&[2], &mut cells);
        assert_eq!(cells, vec![Some(INDICATOR_HIT)]);
    }
}
