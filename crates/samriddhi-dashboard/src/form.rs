//! # Relief Verification Form
//!
//! Local, controlled state for the case relief form. Every input writes
//! straight into the record by field name; the only checks are the
//! required markers and option membership for selects. The form never
//! persists anything. A caller-supplied [`ReliefSink`] receives the record
//! on submit.
//!
//! Submission is split in two so a caller holding the form behind a lock
//! can release it while the sink runs:
//!
//! 1. [`VerificationForm::begin_submit`] checks the record, raises the
//!    `submitting` flag and hands back a [`SubmitGuard`] plus a snapshot.
//! 2. The sink is awaited with no borrow of the form.
//! 3. [`VerificationForm::finish_submit`] discards the record on success.
//!
//! The flag is lowered when the guard drops, so it clears on success, on
//! failure, and when the submitting task is cancelled.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use samriddhi_core::{CaseReliefRecord, ReliefField};

use crate::error::FormError;

/// Receives a submitted relief record.
pub trait ReliefSink: Send + Sync {
    /// Accept the record. Errors are surfaced to the user and the record
    /// is kept for another attempt.
    fn submit(
        &self,
        record: &CaseReliefRecord,
    ) -> impl Future<Output = Result<(), FormError>> + Send;
}

/// Lowers the form's `submitting` flag on drop.
#[derive(Debug)]
#[must_use = "dropping the guard ends the submission"]
pub struct SubmitGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The relief verification form.
#[derive(Debug, Default)]
pub struct VerificationForm {
    record: CaseReliefRecord,
    submitting: Arc<AtomicBool>,
}

impl VerificationForm {
    /// A blank form.
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled with `record`.
    pub fn prefilled(record: CaseReliefRecord) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    /// The current record.
    pub fn record(&self) -> &CaseReliefRecord {
        &self.record
    }

    /// Whether a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Write one input by name. Last write wins.
    ///
    /// # Errors
    ///
    /// [`FormError::Invalid`] for unknown field names and for select values
    /// outside the option list. The record is unchanged on error.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        let field = ReliefField::from_name(name)?;
        self.record.set(field, value)?;
        Ok(())
    }

    /// Write several inputs at once. Either every input is written or,
    /// on the first refused one, none is.
    ///
    /// # Errors
    ///
    /// As [`set_field`](Self::set_field), for the first refused input.
    pub fn set_fields<'a, I>(&mut self, inputs: I) -> Result<(), FormError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut staged = self.record.clone();
        for (name, value) in inputs {
            let field = ReliefField::from_name(name)?;
            staged.set(field, value)?;
        }
        self.record = staged;
        Ok(())
    }

    /// Start a submission.
    ///
    /// # Errors
    ///
    /// [`FormError::AlreadySubmitting`] while another submission holds its
    /// guard; [`FormError::MissingFields`] when a required input is blank.
    /// Neither raises the flag.
    pub fn begin_submit(&self) -> Result<(SubmitGuard, CaseReliefRecord), FormError> {
        let missing = self.record.missing_required();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        if self.submitting.swap(true, Ordering::AcqRel) {
            return Err(FormError::AlreadySubmitting);
        }
        let guard = SubmitGuard {
            flag: Arc::clone(&self.submitting),
        };
        Ok((guard, self.record.clone()))
    }

    /// Discard the record after the sink accepted it.
    pub fn finish_submit(&mut self, guard: SubmitGuard) {
        self.record = CaseReliefRecord::new();
        drop(guard);
    }

    /// Submit in one step when the caller owns the form.
    ///
    /// # Errors
    ///
    /// Anything [`begin_submit`](Self::begin_submit) or the sink returns.
    pub async fn submit<S: ReliefSink>(&mut self, sink: &S) -> Result<(), FormError> {
        let (guard, record) = self.begin_submit()?;
        sink.submit(&record).await?;
        self.finish_submit(guard);
        Ok(())
    }
}
