use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use tokio::sync::{oneshot, Notify};

fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 10, 19, 14, 30, 0)
        .single()
        .expect("valid local time")
}

fn target() -> DeliveryTarget {
    DeliveryTarget::new("service_1", "template_1", "public-key", "reports@example.org")
}

#[derive(Default)]
struct ScriptedDelivery {
    failures_left: AtomicUsize,
    sent: Mutex<Vec<(String, String, TemplateParams, String)>>,
}

impl ScriptedDelivery {
    fn failing_times(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(String, String, TemplateParams, String)> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl EmailDelivery for ScriptedDelivery {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        params: &TemplateParams,
        public_key: &str,
    ) -> Result<(), DeliveryError> {
        lock(&self.sent).push((
            service_id.to_string(),
            template_id.to_string(),
            params.clone(),
            public_key.to_string(),
        ));

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DeliveryError::Rejected {
                status: 503,
                body: "quota exceeded".into(),
            });
        }
        Ok(())
    }
}

struct GatedDelivery {
    entered: Arc<Notify>,
    release: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl GatedDelivery {
    fn new() -> (Arc<Self>, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let delivery = Arc::new(Self {
            entered: Arc::new(Notify::new()),
            release: tokio::sync::Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
        });
        (delivery, tx)
    }
}

#[async_trait]
impl EmailDelivery for GatedDelivery {
    async fn send(
        &self,
        _service_id: &str,
        _template_id: &str,
        _params: &TemplateParams,
        _public_key: &str,
    ) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let release = self.release.lock().await.take();
        if let Some(release) = release {
            let _ = release.await;
        }
        Ok(())
    }
}

fn controller_with(delivery: Arc<dyn EmailDelivery>) -> FormController {
    FormController::new(delivery, target()).with_clock(Arc::new(FixedClock(fixed_time())))
}

#[test]
fn set_field_is_last_write_wins() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    controller.set_field(TextField::Age, "37");
    controller.set_field(TextField::Age, "");
    controller.set_field(TextField::Age, "38");
    controller.set_field(TextField::Gender, "female");

    let record = controller.snapshot();
    assert_eq!(record.age, "38");
    assert_eq!(record.gender, "female");
    assert_eq!(record.lot_number, "");
}

#[test]
fn repeated_toggles_settle_on_last_call() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    let field = SetField::AnatomicalRegion;

    controller.toggle_set_member(field, "extremities", true);
    controller.toggle_set_member(field, "extremities", true);
    controller.toggle_set_member(field, "extremities", true);
    assert_eq!(controller.snapshot().anatomical_region, vec!["extremities"]);

    controller.toggle_set_member(field, "extremities", false);
    controller.toggle_set_member(field, "extremities", false);
    assert!(controller.snapshot().anatomical_region.is_empty());

    controller.toggle_set_member(field, "extremities", false);
    controller.toggle_set_member(field, "extremities", true);
    assert_eq!(controller.snapshot().anatomical_region, vec!["extremities"]);
}

#[test]
fn unchecking_removes_every_copy_loaded_from_a_file() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    controller.load(AnswerRecord {
        difficult_conditions: vec!["darkness".into(), "no".into(), "darkness".into()],
        ..AnswerRecord::default()
    });
    assert_eq!(
        controller.snapshot().difficult_conditions,
        vec!["darkness", "no"]
    );

    controller.toggle_set_member(SetField::DifficultConditions, "darkness", false);
    assert_eq!(controller.snapshot().difficult_conditions, vec!["no"]);
}

#[test]
fn preview_is_stable_for_unchanged_answers() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    controller.set_field(TextField::RemovalHours, "6");
    assert_eq!(controller.preview(), controller.preview());
}

#[test]
fn report_contains_set_values_and_blank_lines() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    controller.set_field(TextField::LotNumber, "L-42");
    controller.set_field(TextField::Age, "37");
    controller.set_field(TextField::Gender, "female");

    let report = controller.preview();
    assert!(report.contains("\n1. XXX® LOT number: L-42\n"));
    assert!(report.contains("\n4. Age: 37\n"));
    assert!(report.contains("\n5. Gender: female\n"));
    assert!(report.contains("\n2. Anonymized patient identification: \n"));
    assert!(report.contains("\n18. Removal evaluation: \n"));
    assert!(report.ends_with("\n\nSubmitted at: 10/19/2026, 2:30:00 PM\n"));
}

#[test]
fn anticoagulant_type_only_reported_after_yes() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    controller.set_field(TextField::AnticoagulantUse, "yes");
    controller.set_field(TextField::AnticoagulantType, "Warfarin");
    assert!(controller
        .preview()
        .contains("\n7. Anticoagulant use: yes - Type: Warfarin\n"));

    controller.set_field(TextField::AnticoagulantUse, "no");
    let report = controller.preview();
    assert!(report.contains("\n7. Anticoagulant use: no\n"));
    assert!(!report.contains("Warfarin"));
}

#[test]
fn multi_select_joins_in_insertion_order() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    controller.toggle_set_member(SetField::AnatomicalRegion, "extremities", true);
    controller.toggle_set_member(SetField::AnatomicalRegion, "head/neck", true);
    assert!(controller
        .preview()
        .contains("\n8. Anatomical region of injury: extremities, head/neck\n"));
}

#[tokio::test]
async fn failed_submit_keeps_answers_and_retry_resets() {
    let delivery = Arc::new(ScriptedDelivery::failing_times(1));
    let controller = controller_with(delivery.clone());
    let mut events = controller.subscribe_events();
    controller.set_field(TextField::LotNumber, "L-42");
    controller.toggle_set_member(SetField::InjuryType, "aaa", true);
    let filled = controller.snapshot();

    let first = controller.submit().await;
    assert!(matches!(
        first,
        SubmitOutcome::Failed(DeliveryError::Rejected { status: 503, .. })
    ));
    assert_eq!(controller.snapshot(), filled);
    assert_eq!(controller.state(), SubmissionState::Idle);

    let second = controller.submit().await;
    assert!(matches!(second, SubmitOutcome::Submitted));
    assert!(controller.snapshot().is_blank());
    assert_eq!(controller.state(), SubmissionState::Idle);

    let sent = delivery.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    let (service_id, template_id, params, public_key) = &sent[1];
    assert_eq!(service_id, "service_1");
    assert_eq!(template_id, "template_1");
    assert_eq!(public_key, "public-key");
    assert_eq!(params.to_email, "reports@example.org");
    assert_eq!(params.subject, DEFAULT_SUBJECT);
    assert_eq!(params.from_name, DEFAULT_FROM_NAME);
    assert_eq!(params.message, format_report(&filled, &fixed_time()));

    let mut saw_failure = false;
    let mut saw_success = false;
    while let Ok(event) = events.try_recv() {
        match event {
            FormEvent::SubmissionFailed(err) => {
                assert_eq!(err.code, ErrorCode::Delivery);
                assert!(err.message.contains("quota exceeded"));
                saw_failure = true;
            }
            FormEvent::Submitted => saw_success = true,
            _ => {}
        }
    }
    assert!(saw_failure && saw_success);
}

#[tokio::test]
async fn submit_while_in_flight_is_ignored() {
    let (delivery, release) = GatedDelivery::new();
    let controller = Arc::new(controller_with(delivery.clone()));
    controller.set_field(TextField::PatientId, "P-7");

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    delivery.entered.notified().await;
    assert_eq!(controller.state(), SubmissionState::Submitting);

    let before = controller.snapshot();
    let second = controller.submit().await;
    assert!(matches!(second, SubmitOutcome::AlreadySubmitting));
    assert_eq!(controller.snapshot(), before);
    assert_eq!(controller.state(), SubmissionState::Submitting);

    release.send(()).expect("release delivery");
    let outcome = first.await.expect("join submit");
    assert!(matches!(outcome, SubmitOutcome::Submitted));
    assert_eq!(delivery.calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state(), SubmissionState::Idle);
    assert!(controller.snapshot().is_blank());
}

#[tokio::test]
async fn dropped_submission_returns_to_idle() {
    let (delivery, _release) = GatedDelivery::new();
    let controller = Arc::new(controller_with(delivery.clone()));
    controller.set_field(TextField::Age, "51");

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    delivery.entered.notified().await;
    task.abort();
    assert!(task.await.expect_err("aborted").is_cancelled());

    assert_eq!(controller.state(), SubmissionState::Idle);
    assert_eq!(controller.snapshot().age, "51");
}

#[tokio::test]
async fn missing_delivery_surfaces_failure() {
    let controller = controller_with(Arc::new(email_delivery::MissingEmailDelivery));
    controller.set_field(TextField::Age, "40");

    let outcome = controller.submit().await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(DeliveryError::Unavailable(_))
    ));
    assert_eq!(controller.snapshot().age, "40");
}

#[tokio::test]
async fn subscribers_see_edits_state_changes_and_reset() {
    let controller = controller_with(Arc::new(ScriptedDelivery::default()));
    let mut events = controller.subscribe_events();
    controller.set_field(TextField::Age, "40");
    controller.toggle_set_member(SetField::InjuryType, "bbb", true);
    assert!(matches!(controller.submit().await, SubmitOutcome::Submitted));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(
        seen[0],
        FormEvent::Changed(FieldKey::Text(TextField::Age))
    ));
    assert!(matches!(
        seen[1],
        FormEvent::Changed(FieldKey::Set(SetField::InjuryType))
    ));
    assert!(matches!(
        seen[2],
        FormEvent::StateChanged(SubmissionState::Submitting)
    ));
    assert!(matches!(seen[3], FormEvent::Submitted));
    assert!(matches!(seen[4], FormEvent::Reset));
    assert!(matches!(
        seen[5],
        FormEvent::StateChanged(SubmissionState::Idle)
    ));
    assert_eq!(seen.len(), 6);
}
