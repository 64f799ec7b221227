//! Ordered "first success wins" resolution.
//!
//! Several figures have a preferred source and one or more fallbacks (rent
//! roll from billed charges, else lease terms; acquisition date from the
//! purchase record, else the first payment). Each source is a named strategy;
//! strategies run in order and the first `Some` is returned together with the
//! name of the strategy that produced it.

/// A named strategy producing an optional value.
pub struct Strategy<'a, T> {
    pub name: &'static str,
    run: Box<dyn Fn() -> Option<T> + 'a>,
}

impl<'a, T> Strategy<'a, T> {
    pub fn new(name: &'static str, run: impl Fn() -> Option<T> + 'a) -> Self {
        Strategy {
            name,
            run: Box::new(run),
        }
    }
}

/// The value produced by the first successful strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: &'static str,
}

/// Run `strategies` in order, returning the first value produced.
/// Later strategies are never evaluated once one succeeds.
pub fn first_success<T>(strategies: Vec<Strategy<'_, T>>) -> Option<Resolved<T>> {
    strategies.into_iter().find_map(|s| {
        (s.run)().map(|value| Resolved {
            value,
            source: s.name,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_success_returns_first_some() {
        let out = first_success(vec![
            Strategy::new("none", || None),
            Strategy::new("two", || Some(2)),
            Strategy::new("three", || Some(3)),
        ])
        .unwrap();
        assert_eq!(out.value, 2);
        assert_eq!(out.source, "two");
    }

    #[test]
    fn test_first_success_short_circuits() {
        let calls = Cell::new(0);
        let _ = first_success(vec![
            Strategy::new("a", || Some(1)),
            Strategy::new("b", || {
                calls.set(calls.get() + 1);
                Some(2)
            }),
        ]);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_first_success_all_empty() {
        let out: Option<Resolved<i32>> =
            first_success(vec![Strategy::new("a", || None), Strategy::new("b", || None)]);
        assert!(out.is_none());
    }
}
