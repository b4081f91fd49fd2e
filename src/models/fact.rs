use rust_decimal::Decimal;
use std::fmt;

/// A calendar month, always within 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Month(u8);

const SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FULL_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl Month {
    pub(crate) const COUNT: usize = 12;

    pub(crate) fn new(number: u32) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self(number as u8))
    }

    pub(crate) fn number(self) -> u32 {
        u32::from(self.0)
    }

    /// Zero-based position, for indexing per-month arrays.
    pub(crate) fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index + 1).ok().and_then(Self::new)
    }

    pub(crate) fn all() -> impl Iterator<Item = Month> {
        (1..=12u8).map(Self)
    }

    pub(crate) fn short_name(self) -> &'static str {
        SHORT_NAMES[self.index()]
    }

    pub(crate) fn full_name(self) -> &'static str {
        FULL_NAMES[self.index()]
    }

    /// Accept `3`, `03`, `mar` or `March`. Names must match exactly, ignoring case.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u32>() {
            return Self::new(n);
        }
        Self::all().find(|m| {
            s.eq_ignore_ascii_case(m.short_name()) || s.eq_ignore_ascii_case(m.full_name())
        })
    }
}

impl Default for Month {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.short_name())
    }
}

/// Which value space a fact lives in: the live budget or one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub(crate) enum ValueSpace {
    #[default]
    Live,
    Scenario(i64),
}

impl ValueSpace {
    pub(crate) fn scenario_id(&self) -> Option<i64> {
        match self {
            Self::Live => None,
            Self::Scenario(id) => Some(*id),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for ValueSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Scenario(id) => write!(f, "scenario #{id}"),
        }
    }
}

/// Natural key of a stored fact. At most one fact exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FactKey {
    pub(crate) space: ValueSpace,
    pub(crate) category_id: i64,
    pub(crate) year: i32,
    pub(crate) month: Month,
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} category {} {}-{:02}",
            self.space,
            self.category_id,
            self.year,
            self.month.number()
        )
    }
}

/// One stored amount for a category in a given month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValueFact {
    pub(crate) category_id: i64,
    pub(crate) year: i32,
    pub(crate) month: Month,
    pub(crate) amount: Decimal,
    pub(crate) space: ValueSpace,
}

impl ValueFact {
    pub(crate) fn new(
        space: ValueSpace,
        category_id: i64,
        year: i32,
        month: Month,
        amount: Decimal,
    ) -> Self {
        Self {
            category_id,
            year,
            month,
            amount,
            space,
        }
    }

    pub(crate) fn key(&self) -> FactKey {
        FactKey {
            space: self.space,
            category_id: self.category_id,
            year: self.year,
            month: self.month,
        }
    }
}
