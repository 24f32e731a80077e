use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use slackhook_core::{
    CredentialStore, Dispatcher, DispatcherConfig, Emission, SlackAppConfig, listener_fn,
};
use slackhook_gateway::{GatewayConfig, GatewayState, build_router, dispatcher_builder, signature};
use tokio::sync::mpsc;
use tower::ServiceExt;

fn config() -> GatewayConfig {
    GatewayConfig {
        addr: "127.0.0.1:0".parse().unwrap(),
        path: "/slack".into(),
        signing_secret: None,
        dispatcher: DispatcherConfig::default()
            .with_install_redirect("https://app.test/installed")
            .with_verification_token("vtoken"),
        slack: SlackAppConfig::new("CID", "SECRET").with_api_base("mock://slack"),
    }
}

fn router(config: &GatewayConfig, dispatcher: Dispatcher) -> Router {
    build_router(
        GatewayState {
            dispatcher,
            signing_secret: config.signing_secret.clone(),
        },
        &config.path,
    )
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/slack")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn get_without_code_redirects_to_slack_authorize() {
    let cfg = config();
    let app = router(&cfg, dispatcher_builder(&cfg).build());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/slack?state=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://slack.com/oauth/v2/authorize?client_id=CID"));
    assert!(location.ends_with("&state=abc"));
}

#[tokio::test]
async fn get_with_code_installs_and_redirects() {
    let cfg = config();
    let dispatcher = dispatcher_builder(&cfg).build();
    let app = router(&cfg, dispatcher.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/slack?code=c0de&state=xyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://app.test/installed?state=xyz"
    );
    let stored = dispatcher.store().get("T123").await.unwrap().unwrap();
    assert_eq!(stored.access_token, "xoxb-mock");
}

#[tokio::test]
async fn url_verification_challenge_is_echoed() {
    let cfg = config();
    let app = router(&cfg, dispatcher_builder(&cfg).build());

    let response = app
        .oneshot(post_json(
            r#"{"token":"vtoken","type":"url_verification","challenge":"c-42"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "c-42");
}

#[tokio::test]
async fn token_mismatch_is_unauthorized() {
    let cfg = config();
    let app = router(&cfg, dispatcher_builder(&cfg).build());

    let response = app
        .oneshot(post_json(r#"{"token":"nope","team_id":"T1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "[401] Unauthorized");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let cfg = config();
    let app = router(&cfg, dispatcher_builder(&cfg).build());

    let response = app.oneshot(post_json("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn form_slash_command_is_acked_and_delivered() {
    let cfg = config();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = dispatcher_builder(&cfg)
        .on(
            "/deploy",
            listener_fn(move |event, emission| {
                if let Emission::Message { payload, bot, .. } = emission {
                    tx.send((
                        event.to_string(),
                        payload.workspace_id().map(str::to_string),
                        bot.channel().map(str::to_string),
                    ))?;
                }
                Ok(())
            }),
        )
        .build();
    let app = router(&cfg, dispatcher);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/slack")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "token=vtoken&team_id=T1&channel_id=C9&command=%2Fdeploy&text=prod",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "");

    let (event, workspace, channel) = rx.recv().await.unwrap();
    assert_eq!(event, "/deploy");
    assert_eq!(workspace.as_deref(), Some("T1"));
    assert_eq!(channel.as_deref(), Some("C9"));
}

#[tokio::test]
async fn signed_requests_are_verified() {
    let mut cfg = config();
    cfg.signing_secret = Some("signing".into());
    let dispatcher = dispatcher_builder(&cfg).build();
    let body = r#"{"token":"vtoken","challenge":"signed"}"#;

    let unsigned = router(&cfg, dispatcher.clone())
        .oneshot(post_json(body))
        .await
        .unwrap();
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp().to_string();
    let mut request = post_json(body);
    let headers = request.headers_mut();
    headers.insert(signature::TIMESTAMP_HEADER, timestamp.parse().unwrap());
    headers.insert(
        signature::SIGNATURE_HEADER,
        signature::sign("signing", &timestamp, body.as_bytes())
            .parse()
            .unwrap(),
    );

    let signed = router(&cfg, dispatcher).oneshot(request).await.unwrap();
    assert_eq!(signed.status(), StatusCode::OK);
    assert_eq!(body_text(signed).await, "signed");
}

#[tokio::test]
async fn other_methods_get_no_content() {
    let cfg = config();
    let app = router(&cfg, dispatcher_builder(&cfg).build());

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/slack")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn shared_store_is_used_for_delivery() {
    let cfg = config();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = dispatcher_builder(&cfg)
        .on(
            "event",
            listener_fn(move |_, emission| {
                if let Some(bot) = emission.bot() {
                    tx.send(bot.token().map(str::to_string))?;
                }
                Ok(())
            }),
        )
        .build();
    let store: Arc<dyn CredentialStore> = dispatcher.store().clone();
    store
        .save(slackhook_core::AuthRecord::new("T7", "xoxb-7"))
        .await
        .unwrap();

    let response = router(&cfg, dispatcher)
        .oneshot(post_json(
            r#"{"token":"vtoken","team_id":"T7","event":{"type":"app_mention","channel":"C1"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(rx.recv().await.unwrap().as_deref(), Some("xoxb-7"));
}

#[tokio::test]
async fn install_redirect_encodes_state() {
    let cfg = config();
    let app = router(&cfg, dispatcher_builder(&cfg).build());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/slack?code=c0de&state=x%26error%3Dspoofed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://app.test/installed?state=x%26error%3Dspoofed"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/slack?code=c0de&state=a%0Ab")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://app.test/installed?state=a%0Ab"
    );
}
