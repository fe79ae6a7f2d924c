//! Success-or-failure container for schema construction.
//!
//! Build pipelines compose several fallible steps (validation, storage
//! materialization, engine registration). `Outcome` lets those steps chain
//! without raising midway, and gives callers one place to observe the
//! failure of a whole chain.

use crate::error::Error;

/// Carries exactly one of a value or an error.
///
/// Unlike `std::result::Result` this type is fixed to the crate's [`Error`]
/// and exposes an [`Outcome::on_error`] hook for centralized failure
/// logging at the end of a build chain.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The computation produced a value.
    Ok(T),
    /// The computation failed.
    Err(Error),
}

impl<T> Outcome<T> {
    /// Create a successful outcome.
    pub fn ok(value: T) -> Self {
        Outcome::Ok(value)
    }

    /// Create a failed outcome.
    pub fn err(error: Error) -> Self {
        Outcome::Err(error)
    }

    /// Create an outcome from an optional value.
    ///
    /// `None` coerces to a failure carrying [`Error::AbsentValue`], so an
    /// outcome always holds a diagnosable condition.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Ok(value),
            None => Outcome::Err(Error::AbsentValue),
        }
    }

    /// Whether this outcome holds a value.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// Whether this outcome holds an error.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Transform the value of a successful outcome.
    ///
    /// A failed outcome propagates its error untouched without invoking
    /// the transform.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Err(error) => Outcome::Err(error),
        }
    }

    /// Chain another fallible step onto a successful outcome.
    ///
    /// A failed outcome propagates its error untouched without invoking
    /// the step.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => f(value),
            Outcome::Err(error) => Outcome::Err(error),
        }
    }

    /// Invoke `f` with the error if this outcome is a failure.
    ///
    /// The hook fires immediately and at most once; the outcome is
    /// returned unchanged either way. Place it at the end of a build chain
    /// to log the chain's failure in one spot.
    pub fn on_error(self, f: impl FnOnce(&Error)) -> Self {
        if let Outcome::Err(ref error) = self {
            f(error);
        }
        self
    }

    /// Consume the outcome, returning the value if present.
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Err(_) => None,
        }
    }

    /// Consume the outcome, returning the error if present.
    pub fn error(self) -> Option<Error> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Err(error) => Some(error),
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn double(n: i32) -> Outcome<i32> {
        Outcome::ok(n * 2)
    }

    fn add_eleven(n: i32) -> Outcome<i32> {
        Outcome::ok(n + 11)
    }

    #[test]
    fn test_left_identity() {
        let via_chain = Outcome::ok(1).and_then(double);
        let direct = double(1);
        assert_eq!(via_chain.value(), direct.value());
    }

    #[test]
    fn test_right_identity() {
        let chained = Outcome::ok(1).and_then(Outcome::ok);
        assert_eq!(chained.value(), Some(1));
    }

    #[test]
    fn test_associativity() {
        let left = Outcome::ok(1).and_then(add_eleven).and_then(double);
        let right = Outcome::ok(1).and_then(|n| add_eleven(n).and_then(double));
        assert_eq!(left.value(), right.value());
    }

    #[test]
    fn test_from_option_none_is_error() {
        let outcome: Outcome<i32> = Outcome::from_option(None);
        assert!(outcome.is_err());
        assert!(matches!(outcome.error(), Some(Error::AbsentValue)));
    }

    #[test]
    fn test_from_option_some_is_ok() {
        let outcome = Outcome::from_option(Some(7));
        assert_eq!(outcome.value(), Some(7));
    }

    #[test]
    fn test_map_skips_transform_on_error() {
        let called = Cell::new(false);
        let outcome: Outcome<i32> = Outcome::err(Error::MissingStorage("employee".into()));
        let mapped = outcome.map(|n| {
            called.set(true);
            n + 1
        });
        assert!(!called.get());
        assert!(matches!(mapped.error(), Some(Error::MissingStorage(name)) if name == "employee"));
    }

    #[test]
    fn test_on_error_fires_once_on_failure() {
        let fired = Cell::new(0);
        let outcome: Outcome<i32> = Outcome::err(Error::AbsentValue);
        let outcome = outcome.on_error(|_| fired.set(fired.get() + 1));
        assert_eq!(fired.get(), 1);
        assert!(outcome.is_err());
    }

    #[test]
    fn test_on_error_never_fires_on_success() {
        let fired = Cell::new(false);
        let outcome = Outcome::ok(1)
            .and_then(double)
            .on_error(|_| fired.set(true));
        assert!(!fired.get());
        assert_eq!(outcome.value(), Some(2));
    }

    #[test]
    fn test_failure_propagates_through_chain() {
        let outcome = Outcome::ok(1)
            .and_then(|_| Outcome::<i32>::err(Error::DuplicateTable("department".into())))
            .and_then(double)
            .map(|n| n + 1);
        assert!(
            matches!(outcome.error(), Some(Error::DuplicateTable(name)) if name == "department")
        );
    }
}
