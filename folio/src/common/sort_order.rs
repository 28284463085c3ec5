use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Specifies the direction for sorting documents or ordering index keys.
///
/// Written as `1` (ascending) or `-1` (descending) in sort and index
/// specification documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// Smallest to largest, `Null` first
    Ascending,
    /// Largest to smallest, `Null` last
    Descending,
}

impl SortOrder {
    /// The opposite direction.
    #[inline]
    pub fn reverse(self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    /// Applies this direction to an ascending comparison result.
    #[inline]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    /// Numeric form used in specification documents and index names.
    #[inline]
    pub fn as_i64(self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}
