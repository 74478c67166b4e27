//! Combining fallible outcomes without stopping at the first failure.
//!
//! Any failure dominates the combined outcome, and messages keep their
//! left-to-right order. A success carrying no data is the identity element.

use crate::error::{Errors, Outcome, ScreenError};

/// Combine two outcomes into one.
///
/// Two successes yield the left value. A failure on either side wins; two
/// failures concatenate, left messages first.
pub fn combine<T>(left: Outcome<T>, right: Outcome<T>) -> Outcome<T> {
    match (left, right) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(errors)) | (Err(errors), Ok(_)) => Err(errors),
        (Err(mut left), Err(right)) => {
            left.extend(right);
            Err(left)
        }
    }
}

/// Fold a sequence of unit outcomes, starting from the identity `Ok(())`.
pub fn flatten<I>(outcomes: I) -> Outcome<()>
where
    I: IntoIterator<Item = Outcome<()>>,
{
    outcomes.into_iter().fold(Ok(()), combine)
}

/// Collect every success value in order, or every error in order.
pub fn collect_all<T, I>(outcomes: I) -> Outcome<Vec<T>>
where
    I: IntoIterator<Item = Outcome<T>>,
{
    let mut acc = Accumulator::new();
    let values: Vec<T> = outcomes
        .into_iter()
        .filter_map(|outcome| acc.absorb(outcome))
        .collect();
    acc.finish(values)
}

/// Pair two outcomes, keeping the errors of both sides.
pub fn both<A, B>(left: Outcome<A>, right: Outcome<B>) -> Outcome<(A, B)> {
    match (left, right) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Ok(_), Err(errors)) | (Err(errors), Ok(_)) => Err(errors),
        (Err(mut left), Err(right)) => {
            left.extend(right);
            Err(left)
        }
    }
}

/// Incremental collector used inside a stage.
///
/// Checks push their failures here; the stage calls [`Accumulator::finish`]
/// once every check has run.
#[derive(Debug, Default)]
pub struct Accumulator {
    errors: Vec<ScreenError>,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one error.
    pub fn push(&mut self, error: ScreenError) {
        self.errors.push(error);
    }

    /// Record an error only when `ok` is false.
    pub fn ensure(&mut self, ok: bool, error: impl FnOnce() -> ScreenError) {
        if !ok {
            self.errors.push(error());
        }
    }

    /// Take the value of a successful outcome, or record its errors.
    pub fn absorb<T>(&mut self, outcome: Outcome<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(errors) => {
                self.errors.extend(errors);
                None
            }
        }
    }

    /// Whether nothing has been recorded so far.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish the stage: `value` if nothing failed, otherwise all errors.
    pub fn finish<T>(self, value: T) -> Outcome<T> {
        match Errors::from_vec(self.errors) {
            None => Ok(value),
            Some(errors) => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(reviewer: &str) -> Outcome<()> {
        Err(Errors::one(ScreenError::MissingReviewerSubmission {
            reviewer: reviewer.to_string(),
        }))
    }

    fn reviewers_of(errors: &Errors) -> Vec<String> {
        errors
            .iter()
            .map(|e| match e {
                ScreenError::MissingReviewerSubmission { reviewer } => reviewer.clone(),
                other => panic!("unexpected error {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_identity_element() {
        assert_eq!(combine(Ok(()), missing("a")), missing("a"));
        assert_eq!(combine(missing("a"), Ok(())), missing("a"));
        assert_eq!(combine::<()>(Ok(()), Ok(())), Ok(()));
    }

    #[test]
    fn test_success_does_not_erase_failure() {
        let result = flatten(vec![missing("a"), Ok(()), Ok(())]);
        assert!(result.is_err());
    }

    #[test]
    fn test_order_preserved_left_to_right() {
        let result = flatten(vec![missing("a"), Ok(()), missing("b"), missing("c")]);
        let errors = result.unwrap_err();
        assert_eq!(reviewers_of(&errors), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_collect_all_values() {
        let outcomes: Vec<Outcome<u32>> = vec![Ok(1), Ok(2), Ok(3)];
        assert_eq!(collect_all(outcomes).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_collect_all_keeps_every_error() {
        let outcomes: Vec<Outcome<u32>> = vec![
            Ok(1),
            missing("x").map(|_| 0),
            Ok(3),
            missing("y").map(|_| 0),
        ];
        let errors = collect_all(outcomes).unwrap_err();
        assert_eq!(reviewers_of(&errors), vec!["x", "y"]);
    }

    #[test]
    fn test_both_merges_sides() {
        let errors = both(missing("left"), missing("right")).unwrap_err();
        assert_eq!(reviewers_of(&errors), vec!["left", "right"]);
        assert_eq!(both::<u8, u8>(Ok(1), Ok(2)).unwrap(), (1, 2));
    }

    #[test]
    fn test_accumulator_ensure() {
        let mut acc = Accumulator::new();
        acc.ensure(true, || unreachable!());
        assert!(acc.is_clean());
        acc.ensure(false, || ScreenError::MissingReviewerSubmission {
            reviewer: "z".to_string(),
        });
        assert!(!acc.is_clean());
        assert_eq!(acc.finish(()).unwrap_err().len(), 1);
    }
}
