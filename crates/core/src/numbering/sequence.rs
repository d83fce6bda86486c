//! Sequence counters and reset policies.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::SequenceFormatError;
use super::template::{DEFAULT_FORMAT, RenderContext, SequenceTemplate};

/// Maximum stored prefix length.
pub const PREFIX_MAX_LEN: usize = 20;

/// Largest accepted padding for a bare `{seq}`.
pub const MAX_PADDING: i32 = 18;

/// Padding used when a sequence is created without one.
pub const DEFAULT_PADDING: i32 = 4;

/// When the counter starts over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Never reset.
    None,
    /// Reset when the calendar month changes.
    #[default]
    Monthly,
    /// Reset when the calendar year changes.
    Yearly,
}

impl ResetPolicy {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Period a document dated `as_of` is counted in, or `None` if the
    /// counter never resets.
    #[must_use]
    pub fn period_key(&self, as_of: NaiveDate) -> Option<PeriodKey> {
        match self {
            Self::None => None,
            Self::Yearly => Some(PeriodKey::year(as_of.year())),
            Self::Monthly => Some(PeriodKey::month(as_of.year(), as_of.month())),
        }
    }

    /// Period the stored counter belongs to, or `None` if it is unknown.
    #[must_use]
    pub fn current_key(&self, state: &SequenceState) -> Option<PeriodKey> {
        match self {
            Self::None => None,
            Self::Yearly => state.period_year.map(PeriodKey::year),
            Self::Monthly => Some(PeriodKey::month(state.period_year?, state.period_month?)),
        }
    }

    /// Where `as_of` falls relative to the stored counter's period.
    ///
    /// An unknown stored period counts as [`PeriodPosition::Later`].
    #[must_use]
    pub fn position(&self, state: &SequenceState, as_of: NaiveDate) -> PeriodPosition {
        let Some(target) = self.period_key(as_of) else {
            return PeriodPosition::Current;
        };
        match self.current_key(state).map(|stored| target.cmp(&stored)) {
            None | Some(Ordering::Greater) => PeriodPosition::Later,
            Some(Ordering::Equal) => PeriodPosition::Current,
            Some(Ordering::Less) => PeriodPosition::Earlier,
        }
    }

    /// Returns true if allocating on `as_of` starts a new period.
    ///
    /// Only a later period resets; a back-dated document continues the
    /// counter of its own period instead.
    #[must_use]
    pub fn needs_reset(&self, state: &SequenceState, as_of: NaiveDate) -> bool {
        self.position(state, as_of) == PeriodPosition::Later
    }
}

/// A counting period: a year, or a month of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, `None` for yearly counters.
    pub month: Option<u32>,
}

impl PeriodKey {
    /// Key of a yearly period.
    #[must_use]
    pub const fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    /// Key of a monthly period.
    #[must_use]
    pub const fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }
}

/// Position of a document date relative to a sequence's current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPosition {
    /// Same period as the stored counter.
    Current,
    /// A later period; the counter resets.
    Later,
    /// An earlier, already closed period.
    Earlier,
}

/// Final counter of a period the sequence has moved past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedPeriod {
    /// The period.
    pub key: PeriodKey,
    /// Last number handed out in it.
    pub last_number: i64,
}

/// Counters one allocation reads and writes under the sequence lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Counter of the current period.
    pub current: SequenceState,
    /// Counter of a closed period: the one a back-dated document falls in,
    /// or the one a reset just closed.
    pub closed: Option<ClosedPeriod>,
}

impl From<SequenceState> for Counters {
    fn from(current: SequenceState) -> Self {
        Self {
            current,
            closed: None,
        }
    }
}

impl std::fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(format!("Unknown reset policy: {other}")),
        }
    }
}

/// Administrative settings of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Text substituted for `{prefix}`.
    pub prefix: String,
    /// Template text.
    pub format: String,
    /// Reset policy.
    pub reset: ResetPolicy,
    /// Zero-padding for a bare `{seq}`.
    pub padding: i32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            format: DEFAULT_FORMAT.to_string(),
            reset: ResetPolicy::Monthly,
            padding: DEFAULT_PADDING,
        }
    }
}

impl SequenceConfig {
    /// Creates a config with the default padding.
    #[must_use]
    pub fn new(prefix: impl Into<String>, format: impl Into<String>, reset: ResetPolicy) -> Self {
        Self {
            prefix: prefix.into(),
            format: format.into(),
            reset,
            padding: DEFAULT_PADDING,
        }
    }

    /// Validates the prefix, padding and template.
    ///
    /// # Errors
    ///
    /// Returns the first `SequenceFormatError` found.
    pub fn validate(&self) -> Result<SequenceTemplate, SequenceFormatError> {
        if self.prefix.chars().count() > PREFIX_MAX_LEN {
            return Err(SequenceFormatError::PrefixTooLong(PREFIX_MAX_LEN));
        }
        if !(0..=MAX_PADDING).contains(&self.padding) {
            return Err(SequenceFormatError::InvalidPadding {
                value: self.padding,
                max: MAX_PADDING,
            });
        }
        SequenceTemplate::parse(&self.format)
    }

    fn padding_width(&self) -> usize {
        usize::try_from(self.padding).unwrap_or_default()
    }
}

/// Counter position of a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    /// Last number handed out.
    pub last_number: i64,
    /// Year of the current period.
    pub period_year: Option<i32>,
    /// Month of the current period.
    pub period_month: Option<u32>,
}

impl SequenceState {
    /// State of a sequence created on `as_of`.
    #[must_use]
    pub fn starting(as_of: NaiveDate) -> Self {
        Self {
            last_number: 0,
            period_year: Some(as_of.year()),
            period_month: Some(as_of.month()),
        }
    }
}

/// Result of advancing a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Counters to persist.
    pub counters: Counters,
    /// Counter value handed out.
    pub seq: i64,
    /// Rendered document number.
    pub number: String,
    /// Set when the stored template was invalid and the default was used.
    pub fallback: Option<SequenceFormatError>,
}

/// Numbering service.
pub struct NumberingService;

impl NumberingService {
    /// Advances a sequence for a document dated `as_of`.
    ///
    /// * Same period: the current counter is incremented.
    /// * Later period: the current counter is closed into
    ///   [`Counters::closed`] and restarts at one.
    /// * Earlier period: the current counter is left alone and the closed
    ///   counter of that period is continued. `counters.closed` must hold
    ///   the stored counter of `as_of`'s period, if there is one.
    ///
    /// A stored template that fails to parse is replaced by
    /// [`DEFAULT_FORMAT`] and reported in [`Allocation::fallback`]; allocation
    /// itself never fails.
    #[must_use]
    pub fn advance(config: &SequenceConfig, counters: &Counters, as_of: NaiveDate) -> Allocation {
        let current = counters.current;
        let mut next = *counters;

        let seq = match (config.reset.position(&current, as_of), config.reset.period_key(as_of)) {
            (PeriodPosition::Earlier, Some(key)) => {
                let last = counters
                    .closed
                    .filter(|closed| closed.key == key)
                    .map_or(0, |closed| closed.last_number);
                next.closed = Some(ClosedPeriod {
                    key,
                    last_number: last + 1,
                });
                last + 1
            }
            (PeriodPosition::Later, _) => {
                next.closed = config
                    .reset
                    .current_key(&current)
                    .filter(|_| current.last_number > 0)
                    .map(|key| ClosedPeriod {
                        key,
                        last_number: current.last_number,
                    });
                next.current = SequenceState {
                    last_number: 1,
                    ..SequenceState::starting(as_of)
                };
                1
            }
            _ => {
                next.current.last_number += 1;
                next.current.last_number
            }
        };

        let (template, fallback) = match SequenceTemplate::parse(&config.format) {
            Ok(template) => (template, None),
            Err(err) => (SequenceTemplate::default_template(), Some(err)),
        };

        let number = template.render(&RenderContext {
            prefix: &config.prefix,
            date: as_of,
            seq,
            padding: config.padding_width(),
        });

        Allocation {
            counters: next,
            seq,
            number,
            fallback,
        }
    }

    /// Renders a sample number without touching any counter.
    ///
    /// # Errors
    ///
    /// Returns `SequenceFormatError` if the config does not validate.
    pub fn preview(
        config: &SequenceConfig,
        as_of: NaiveDate,
        seq: i64,
    ) -> Result<String, SequenceFormatError> {
        let template = config.validate()?;
        Ok(template.render(&RenderContext {
            prefix: &config.prefix,
            date: as_of,
            seq,
            padding: config.padding_width(),
        }))
    }
}
