//! Typed result for geocoding lookups.

use super::AddressError;

/// Result of a single geocoding lookup.
///
/// Adapters never return `Err`: a query that matched nothing is [`Empty`],
/// a backend that could not be reached or answered garbage is
/// [`Unavailable`]. UI callers usually collapse both into "no result" via
/// [`into_option`](Self::into_option) or [`into_vec`](LookupOutcome::into_vec).
///
/// [`Empty`]: LookupOutcome::Empty
/// [`Unavailable`]: LookupOutcome::Unavailable
#[derive(Debug)]
pub enum LookupOutcome<T> {
    /// The backend returned usable content.
    Found(T),
    /// The backend answered successfully but had no match.
    Empty,
    /// The backend failed; the cause is kept for logging and failover.
    Unavailable(AddressError),
}

impl<T> LookupOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Collapse to an `Option`, treating empty and unavailable alike.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Empty | Self::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AddressError> {
        match self {
            Self::Unavailable(error) => Some(error),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LookupOutcome<U> {
        match self {
            Self::Found(value) => LookupOutcome::Found(f(value)),
            Self::Empty => LookupOutcome::Empty,
            Self::Unavailable(error) => LookupOutcome::Unavailable(error),
        }
    }
}

impl<T> LookupOutcome<Vec<T>> {
    /// Wrap a list, mapping an empty list to [`LookupOutcome::Empty`].
    pub fn from_vec(values: Vec<T>) -> Self {
        if values.is_empty() {
            Self::Empty
        } else {
            Self::Found(values)
        }
    }

    /// Collapse to a list, treating empty and unavailable alike.
    pub fn into_vec(self) -> Vec<T> {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for LookupOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::Empty,
        }
    }
}
