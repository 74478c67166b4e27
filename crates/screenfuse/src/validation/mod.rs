//! Structural consistency of review tables against the source.
//!
//! For every review, three checks run against the source: row count,
//! header (order-sensitive) and reviewer identity. All of them run for all
//! reviews, whatever fails, so a single pass reports every problem.

mod checks;

pub use checks::{
    check_header, check_known_reviewers, check_required_columns, check_row_count,
    check_submissions,
};

use tracing::{debug, info};

use crate::config::Configuration;
use crate::error::{Errors, Outcome};
use crate::loader::Dataset;

/// Result of validating a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Every check passed.
    Valid,
    /// At least one check failed; all failures in report order.
    Invalid(Errors),
}

impl ValidationOutcome {
    /// Whether every check passed.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Convert into a stage outcome.
    pub fn into_outcome(self) -> Outcome<()> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(errors) => Err(errors),
        }
    }
}

/// Validates review tables against the source table.
pub struct ConsistencyValidator<'a> {
    config: &'a Configuration,
}

impl<'a> ConsistencyValidator<'a> {
    /// Create a validator for a configuration.
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Run every check over the dataset.
    ///
    /// Order of reported errors: source columns, then each review in turn
    /// (row count, header, reviewer identity), then missing submissions.
    pub fn validate(&self, dataset: &Dataset) -> ValidationOutcome {
        let mut errors = check_required_columns(&dataset.source, self.config);

        for review in &dataset.reviews {
            let before = errors.len();
            errors.extend(check_row_count(&dataset.source, review));
            errors.extend(check_header(&dataset.source, review));
            errors.extend(check_known_reviewers(review, self.config));
            debug!(
                reviewer = %review.reviewer,
                problems = errors.len() - before,
                "Checked review"
            );
        }

        if !self.config.allow_missing_reviewers {
            errors.extend(check_submissions(&dataset.reviews, self.config));
        }

        match Errors::from_vec(errors) {
            None => {
                info!(reviews = dataset.reviews.len(), "Reviews are consistent with source");
                ValidationOutcome::Valid
            }
            Some(errors) => {
                info!(problems = errors.len(), "Validation failed");
                ValidationOutcome::Invalid(errors)
            }
        }
    }
}
