use super::*;
use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    reply: &'static str,
    tx: Arc<Mutex<Option<oneshot::Sender<EmailSendRequest>>>>,
}

async fn handle_send(
    State(state): State<ServerState>,
    Json(payload): Json<EmailSendRequest>,
) -> (StatusCode, &'static str) {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(payload);
    }
    (state.status, state.reply)
}

async fn spawn_email_server(
    status: StatusCode,
    reply: &'static str,
) -> Result<(String, oneshot::Receiver<EmailSendRequest>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        status,
        reply,
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/api/v1.0/email/send", post(handle_send))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api/v1.0/email/send"), rx))
}

fn params() -> TemplateParams {
    TemplateParams {
        to_email: "reports@example.org".into(),
        subject: "Case Report Submission".into(),
        message: "1. XXX® LOT number: L-42".into(),
        from_name: "Case Report System".into(),
    }
}

#[tokio::test]
async fn send_posts_emailjs_payload() {
    let (endpoint, payload_rx) = spawn_email_server(StatusCode::OK, "OK")
        .await
        .expect("spawn server");
    let client = EmailJsClient::new(EmailJsOptions {
        endpoint,
        access_token: Some("private-key".into()),
        timeout: Some(Duration::from_secs(5)),
    })
    .expect("client");

    client
        .send("service_1", "template_1", &params(), "public-key")
        .await
        .expect("send");

    let request = payload_rx.await.expect("payload");
    assert_eq!(request.service_id, "service_1");
    assert_eq!(request.template_id, "template_1");
    assert_eq!(request.user_id, "public-key");
    assert_eq!(request.access_token.as_deref(), Some("private-key"));
    assert_eq!(request.template_params, params());
}

#[tokio::test]
async fn rejected_request_reports_status_and_body() {
    let (endpoint, _payload_rx) =
        spawn_email_server(StatusCode::BAD_REQUEST, "The Public Key is invalid")
            .await
            .expect("spawn server");
    let client = EmailJsClient::new(EmailJsOptions {
        endpoint,
        ..EmailJsOptions::default()
    })
    .expect("client");

    let err = client
        .send("service_1", "template_1", &params(), "wrong")
        .await
        .expect_err("should be rejected");

    match err {
        DeliveryError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "The Public Key is invalid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = EmailJsClient::new(EmailJsOptions {
        endpoint: format!("http://{addr}/api/v1.0/email/send"),
        ..EmailJsOptions::default()
    })
    .expect("client");

    let err = client
        .send("service_1", "template_1", &params(), "public-key")
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, DeliveryError::Transport(_)));
}

#[tokio::test]
async fn missing_delivery_always_fails() {
    let err = MissingEmailDelivery
        .send("service_1", "template_1", &params(), "public-key")
        .await
        .expect_err("unavailable");
    assert!(matches!(err, DeliveryError::Unavailable(_)));
}

#[test]
fn default_options_target_emailjs() {
    let client = EmailJsClient::new(EmailJsOptions::default()).expect("client");
    assert_eq!(client.endpoint(), EMAILJS_SEND_URL);
}
