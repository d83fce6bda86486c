//! Property-based tests for sequence templates and counters.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use super::error::SequenceFormatError;
use super::sequence::{
    ClosedPeriod, Counters, NumberingService, PeriodPosition, ResetPolicy, SequenceConfig,
    SequenceState,
};
use super::template::{DEFAULT_FORMAT, RenderContext, SequenceTemplate};

/// Strategy for dates between 2000 and 2099.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn prefix() -> impl Strategy<Value = String> {
    "[A-Z]{0,6}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Rendering
    // ========================================================================

    #[test]
    fn prop_default_template_layout(
        prefix in prefix(),
        date in any_date(),
        seq in 1i64..1_000_000,
    ) {
        let rendered = SequenceTemplate::default_template().render(&RenderContext {
            prefix: &prefix,
            date,
            seq,
            padding: 0,
        });
        let expected = format!(
            "{prefix}-{:02}{:02}-{seq:04}",
            date.month(),
            date.year() % 100
        );
        prop_assert_eq!(rendered, expected);
    }

    #[test]
    fn prop_seq_width_pads_but_never_truncates(
        width in 0usize..10,
        seq in 1i64..100_000_000,
    ) {
        let template = SequenceTemplate::parse(&format!("N{{seq:0{width}d}}")).unwrap();
        let rendered = template.render(&RenderContext {
            prefix: "",
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            seq,
            padding: 12,
        });
        let digits = &rendered[1..];
        prop_assert_eq!(digits.len(), width.max(seq.to_string().len()));
        prop_assert_eq!(digits.parse::<i64>().unwrap(), seq);
    }

    #[test]
    fn prop_unknown_tokens_rejected(name in "[a-z]{1,10}") {
        prop_assume!(!["prefix", "year", "yy", "month", "day", "seq"].contains(&name.as_str()));
        let format = format!("{{{name}}}-{{seq}}");
        prop_assert_eq!(
            SequenceTemplate::parse(&format).unwrap_err(),
            SequenceFormatError::UnknownToken(name)
        );
    }

    // ========================================================================
    // Counters
    // ========================================================================

    #[test]
    fn prop_counter_strictly_increases_within_period(
        date in any_date(),
        count in 1usize..40,
        policy in prop_oneof![
            Just(ResetPolicy::None),
            Just(ResetPolicy::Monthly),
            Just(ResetPolicy::Yearly),
        ],
    ) {
        let config = SequenceConfig::new("JV", DEFAULT_FORMAT, policy);
        let mut state = SequenceState::starting(date);
        let mut seen = Vec::with_capacity(count);

        for _ in 0..count {
            let allocation = NumberingService::advance(&config, &state.into(), date);
            state = allocation.counters.current;
            seen.push(allocation.seq);
        }

        let expected: Vec<i64> = (1..=i64::try_from(count).unwrap()).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_monthly_resets_on_month_change(
        date in any_date(),
        last in 1i64..10_000,
    ) {
        let config = SequenceConfig::new("JV", DEFAULT_FORMAT, ResetPolicy::Monthly);
        let state = SequenceState { last_number: last, ..SequenceState::starting(date) };
        let next_month = date.checked_add_months(chrono::Months::new(1)).unwrap();

        let same = NumberingService::advance(&config, &state.into(), date);
        let moved = NumberingService::advance(&config, &state.into(), next_month);

        prop_assert_eq!(same.seq, last + 1);
        prop_assert_eq!(moved.seq, 1);
    }

    #[test]
    fn prop_numbers_unique_in_any_date_order(
        dates in prop::collection::vec((2025i32..=2027, 1u32..=12, 1u32..=28), 1..60),
        policy in prop_oneof![Just(ResetPolicy::Monthly), Just(ResetPolicy::Yearly)],
    ) {
        let config = SequenceConfig::new("JV", "{prefix}-{year}{month:02d}-{seq:04d}", policy);
        let mut state = SequenceState::default();
        let mut closed: HashMap<_, i64> = HashMap::new();
        let mut issued = HashSet::new();

        for (y, m, d) in dates {
            let as_of = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            let stored = match (policy.position(&state, as_of), policy.period_key(as_of)) {
                (PeriodPosition::Earlier, Some(key)) => closed
                    .get(&key)
                    .map(|&last_number| ClosedPeriod { key, last_number }),
                _ => None,
            };

            let allocation =
                NumberingService::advance(&config, &Counters { current: state, closed: stored }, as_of);
            state = allocation.counters.current;
            if let Some(period) = allocation.counters.closed {
                closed.insert(period.key, period.last_number);
            }

            prop_assert!(issued.insert(allocation.number.clone()), "reissued {}", allocation.number);
        }
    }
}
