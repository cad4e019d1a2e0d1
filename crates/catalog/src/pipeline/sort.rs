//! Named sort keys and the comparators behind them.
//!
//! Each listing has its own key enum, so a product view can never be asked
//! to sort by creation date and a user view can never sort by price. Every
//! key carries its own [`SortDirection`].
//!
//! Keys round-trip through a `field-direction` string form (`title-asc`,
//! `created-desc`, ...) used by URLs and the CLI.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use icu_collator::{Collator, CollatorOptions, Strength};

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Orient an ascending comparison.
    ///
    /// Reverses the comparator rather than the output, so `Equal` stays
    /// `Equal` and a stable sort keeps ties in input order either way.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

thread_local! {
    /// Root-locale UCA collator at secondary strength: accents count, case
    /// does not.
    static COLLATOR: Option<Collator> = {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);
        Collator::try_new(&Default::default(), options).ok()
    };
}

/// Locale-aware, case-insensitive collation of display strings.
///
/// Uses the Unicode Collation Algorithm with the CLDR root order, so
/// accented letters sort next to their base letter (`apple, Éclair,
/// Ștefan, Tudor, Zebra`) and `"same"`, `"SAME"` and `"Same"` compare
/// equal, leaving their order to the stable sort.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    })
}

/// Returned when a string names no sort key for the listing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key '{input}' (expected one of: {expected})")]
pub struct ParseSortError {
    pub input: String,
    pub expected: &'static str,
}

/// Split `title-asc` into (`title`, Ascending).
fn split_key(s: &str) -> Option<(String, SortDirection)> {
    let lower = s.trim().to_ascii_lowercase();
    let (field, direction) = lower.rsplit_once(['-', '_'])?;
    Some((field.to_owned(), SortDirection::parse(direction)?))
}

macro_rules! sort_key {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $field:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant(SortDirection),)+
        }

        impl $name {
            const EXPECTED: &'static str =
                concat!($($field, "-asc, ", $field, "-desc, ",)+);

            /// The direction component.
            #[must_use]
            pub const fn direction(self) -> SortDirection {
                match self {
                    $(Self::$variant(direction))|+ => direction,
                }
            }

            /// The field component as used in `field-direction` strings.
            #[must_use]
            pub const fn field(self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $field,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", self.field(), self.direction().as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseSortError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let err = || ParseSortError {
                    input: s.to_owned(),
                    expected: Self::EXPECTED.trim_end_matches([',', ' ']),
                };
                let (field, direction) = split_key(s).ok_or_else(err)?;
                match field.as_str() {
                    $($field => Ok(Self::$variant(direction)),)+
                    _ => Err(err()),
                }
            }
        }
    };
}

sort_key! {
    /// Product listing order.
    ProductSort {
        Title => "title",
        Price => "price",
    }
}

sort_key! {
    /// Admin user list order.
    UserSort {
        Name => "name",
        CreatedAt => "created",
    }
}

sort_key! {
    /// Category list order.
    CategorySort {
        Name => "name",
    }
}
