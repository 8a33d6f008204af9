//! Property tests for the typewriter sequencer.
//!
//! Run with: cargo test --test typewriter_props

use proptest::prelude::*;
use spark_folio::{Phase, Sequencer, TypewriterTiming};
use unicode_segmentation::UnicodeSegmentation;

fn graphemes(s: &str) -> usize {
    s.graphemes(true).count()
}

fn strings(min_len: usize) -> impl Strategy<Value = Vec<String>> {
    let pattern = format!("[a-zA-Z é]{{{min_len},6}}");
    let entry = proptest::string::string_regex(&pattern).expect("valid regex");
    prop::collection::vec(entry, 1..5)
}

/// Ticks needed to type and delete every string once, plus slack.
fn cycle_bound(strings: &[String]) -> usize {
    strings.iter().map(|s| 2 * graphemes(s) + 2).sum::<usize>() + 2
}

proptest! {
    #[test]
    fn count_stays_within_current_string(strings in strings(0), looping in any::<bool>(), steps in 0usize..200) {
        let mut seq = Sequencer::new(strings.clone(), TypewriterTiming::default(), looping).unwrap();
        for _ in 0..steps {
            let tick = seq.advance();
            prop_assert!(seq.count() <= seq.current_len());
            prop_assert!(strings[seq.index()].starts_with(&tick.text));
            prop_assert_eq!(graphemes(&tick.text), seq.count());
        }
    }

    #[test]
    fn looping_walks_up_then_down_then_on(strings in strings(1), steps in 1usize..300) {
        let n = strings.len();
        let mut seq = Sequencer::new(strings, TypewriterTiming::default(), true).unwrap();
        let (mut index, mut count) = (seq.index(), seq.count());

        for _ in 0..steps {
            let tick = seq.advance();
            prop_assert!(tick.next_delay_ms.is_some());

            match seq.phase() {
                Phase::Transitioning => {
                    prop_assert_eq!(seq.index(), (index + 1) % n);
                    prop_assert_eq!(count, 1);
                    prop_assert_eq!(seq.count(), 0);
                }
                Phase::Deleting => {
                    prop_assert_eq!(seq.index(), index);
                    prop_assert_eq!(seq.count() + 1, count);
                }
                Phase::Typing | Phase::Pausing => {
                    prop_assert_eq!(seq.index(), index);
                    prop_assert_eq!(seq.count(), count + 1);
                }
                Phase::Done => prop_assert!(false, "looping sequence finished"),
            }
            index = seq.index();
            count = seq.count();
        }
    }

    #[test]
    fn non_looping_halts_on_last_string(strings in strings(0)) {
        let last = strings.last().cloned().unwrap_or_default();
        let bound = cycle_bound(&strings);
        let mut seq = Sequencer::new(strings, TypewriterTiming::default(), false).unwrap();

        let mut ticks = 0;
        while !seq.is_done() {
            prop_assert!(ticks < bound, "sequence never finished");
            seq.advance();
            ticks += 1;
        }
        prop_assert_eq!(seq.text(), last.as_str());

        for _ in 0..5 {
            let tick = seq.advance();
            prop_assert_eq!(tick.next_delay_ms, None);
            prop_assert_eq!(tick.text.as_str(), last.as_str());
        }
    }
}
