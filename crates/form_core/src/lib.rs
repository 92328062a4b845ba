//! Case-report form controller.
//!
//! [`FormController`] owns the answer record for one form session, applies
//! field edits, renders the report and drives delivery through an
//! [`EmailDelivery`] implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use email_delivery::{DeliveryError, EmailDelivery};
use shared::{
    domain::{AnswerRecord, FieldKey, SetField, TextField},
    error::{ApiError, ErrorCode},
    protocol::TemplateParams,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod clock;
pub mod report;

pub use clock::{Clock, FixedClock, SystemClock};
pub use report::format_report;

pub const DEFAULT_SUBJECT: &str = "Case Report Submission";
pub const DEFAULT_FROM_NAME: &str = "Case Report System";
const EVENT_CAPACITY: usize = 64;

/// Where reports go and which email-service credentials carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub recipient: String,
    pub subject: String,
    pub from_name: String,
}

impl DeliveryTarget {
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            recipient: recipient.into(),
            subject: DEFAULT_SUBJECT.into(),
            from_name: DEFAULT_FROM_NAME.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted,
    Failed(DeliveryError),
    /// Another submission from this form was still in flight; nothing happened.
    AlreadySubmitting,
}

/// Change notifications for front ends that redraw from [`FormController::snapshot`].
/// The `intake` binary reads results from [`FormController::submit`] instead.
#[derive(Debug, Clone)]
pub enum FormEvent {
    Changed(FieldKey),
    Reset,
    StateChanged(SubmissionState),
    Submitted,
    SubmissionFailed(ApiError),
}

pub struct FormController {
    record: Mutex<AnswerRecord>,
    state: Mutex<SubmissionState>,
    delivery: Arc<dyn EmailDelivery>,
    target: DeliveryTarget,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<FormEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dedupe_in_order(values: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|value| {
        if seen.contains(value) {
            false
        } else {
            seen.push(value.clone());
            true
        }
    });
}

impl FormController {
    pub fn new(delivery: Arc<dyn EmailDelivery>, target: DeliveryTarget) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            record: Mutex::new(AnswerRecord::default()),
            state: Mutex::new(SubmissionState::Idle),
            delivery,
            target,
            clock: Arc::new(SystemClock),
            events,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn target(&self) -> &DeliveryTarget {
        &self.target
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> AnswerRecord {
        lock(&self.record).clone()
    }

    pub fn state(&self) -> SubmissionState {
        *lock(&self.state)
    }

    pub fn set_field(&self, field: TextField, value: impl Into<String>) {
        *lock(&self.record).text_mut(field) = value.into();
        self.emit(FormEvent::Changed(FieldKey::Text(field)));
    }

    /// Checks or unchecks one option of a multi-select question. Checking an
    /// option that is already selected leaves the selection as it is.
    pub fn toggle_set_member(&self, field: SetField, value: &str, included: bool) {
        {
            let mut record = lock(&self.record);
            let selection = record.selection_mut(field);
            if included {
                if !selection.iter().any(|item| item == value) {
                    selection.push(value.to_string());
                }
            } else {
                selection.retain(|item| item != value);
            }
        }
        self.emit(FormEvent::Changed(FieldKey::Set(field)));
    }

    /// Replaces the whole record, e.g. with answers read from a file.
    pub fn load(&self, mut record: AnswerRecord) {
        for field in SetField::ALL {
            dedupe_in_order(record.selection_mut(*field));
        }
        *lock(&self.record) = record;
        for field in TextField::ALL {
            self.emit(FormEvent::Changed(FieldKey::Text(*field)));
        }
        for field in SetField::ALL {
            self.emit(FormEvent::Changed(FieldKey::Set(*field)));
        }
    }

    pub fn reset(&self) {
        *lock(&self.record) = AnswerRecord::default();
        self.emit(FormEvent::Reset);
    }

    /// Report text for the current answers, stamped with the controller clock.
    pub fn preview(&self) -> String {
        let record = self.snapshot();
        format_report(&record, &self.clock.now())
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let Some(_in_flight) = InFlight::begin(self) else {
            debug!("submission already in flight; ignoring submit");
            return SubmitOutcome::AlreadySubmitting;
        };

        let params = TemplateParams {
            to_email: self.target.recipient.clone(),
            subject: self.target.subject.clone(),
            message: self.preview(),
            from_name: self.target.from_name.clone(),
        };
        info!(
            recipient = %params.to_email,
            report_bytes = params.message.len(),
            "submitting case report"
        );

        let result = self
            .delivery
            .send(
                &self.target.service_id,
                &self.target.template_id,
                &params,
                &self.target.public_key,
            )
            .await;

        match result {
            Ok(()) => {
                info!(recipient = %params.to_email, "case report submitted");
                self.emit(FormEvent::Submitted);
                self.reset();
                SubmitOutcome::Submitted
            }
            Err(error) => {
                warn!(%error, "case report delivery failed; answers kept for retry");
                self.emit(FormEvent::SubmissionFailed(ApiError::new(
                    ErrorCode::Delivery,
                    error.to_string(),
                )));
                SubmitOutcome::Failed(error)
            }
        }
    }

    fn emit(&self, event: FormEvent) {
        let _ = self.events.send(event);
    }
}

/// Holds the form in `Submitting` and puts it back to `Idle` when dropped,
/// including when the submit future itself is dropped mid-flight.
struct InFlight<'a> {
    controller: &'a FormController,
}

impl<'a> InFlight<'a> {
    fn begin(controller: &'a FormController) -> Option<Self> {
        {
            let mut state = lock(&controller.state);
            if *state == SubmissionState::Submitting {
                return None;
            }
            *state = SubmissionState::Submitting;
        }
        controller.emit(FormEvent::StateChanged(SubmissionState::Submitting));
        Some(Self { controller })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *lock(&self.controller.state) = SubmissionState::Idle;
        self.controller
            .emit(FormEvent::StateChanged(SubmissionState::Idle));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
