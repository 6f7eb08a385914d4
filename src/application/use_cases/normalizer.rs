// ============================================================
// EVENT NORMALIZER
// ============================================================
// Decide whether an extraction yields a publishable event list.

use crate::domain::record::{Extraction, RecordSet};

/// Fewer events than this (after dropping the description row, where
/// applicable) are treated as not worth publishing.
const MIN_EVENTS: usize = 4;

/// Outcome of normalizing an extraction into a publishable list.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The source held no event data at all.
    NoEvents,
    /// Events were found, but too few to publish.
    NotEnoughEvents,
    /// A publishable list.
    Events(RecordSet),
}

/// Normalize an extraction result.
///
/// Worksheet uploads carry a column-description row directly under the
/// header; `drop_description_row` removes it before counting. The
/// minimum-count check runs on what remains.
pub fn normalize(extraction: Extraction, drop_description_row: bool) -> Normalized {
    let mut set = match extraction {
        Extraction::NotFound => return Normalized::NoEvents,
        Extraction::Found(set) => set,
    };

    if drop_description_row {
        set.remove_first();
    }

    if set.len() < MIN_EVENTS {
        return Normalized::NotEnoughEvents;
    }

    Normalized::Events(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;

    fn set_of(n: usize) -> RecordSet {
        let mut set = RecordSet::new(vec!["Titel".into()]);
        for i in 0..n {
            let mut rec = Record::new();
            rec.insert("Titel", format!("event-{i}"));
            set.push(rec);
        }
        set
    }

    #[test]
    fn not_found_means_no_events() {
        assert_eq!(normalize(Extraction::NotFound, false), Normalized::NoEvents);
        assert_eq!(normalize(Extraction::NotFound, true), Normalized::NoEvents);
    }

    #[test]
    fn three_events_are_not_enough() {
        assert_eq!(
            normalize(Extraction::Found(set_of(3)), false),
            Normalized::NotEnoughEvents
        );
    }

    #[test]
    fn four_events_are_published() {
        match normalize(Extraction::Found(set_of(4)), false) {
            Normalized::Events(set) => assert_eq!(set.len(), 4),
            other => panic!("expected Events, got {other:?}"),
        }
    }

    #[test]
    fn empty_set_is_not_enough() {
        assert_eq!(
            normalize(Extraction::Found(set_of(0)), false),
            Normalized::NotEnoughEvents
        );
    }

    #[test]
    fn description_row_is_dropped_before_counting() {
        // Five rows minus the description row leaves four publishable.
        match normalize(Extraction::Found(set_of(5)), true) {
            Normalized::Events(set) => {
                assert_eq!(set.len(), 4);
                assert_eq!(set.rows()[0].get("Titel"), Some("event-1"));
            }
            other => panic!("expected Events, got {other:?}"),
        }

        // Four minus one drops below the threshold.
        assert_eq!(
            normalize(Extraction::Found(set_of(4)), true),
            Normalized::NotEnoughEvents
        );
    }
}
