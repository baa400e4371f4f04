use wiremock::{
    Mock, ResponseTemplate,
    matchers::{any, header, method, path},
};

use crate::helpers::{API_KEY, CAMPAIGN_ID, GROUP_ID, data, spawn_app};

fn users(entries: &[(&str, &str)]) -> serde_json::Value {
    let users: Vec<serde_json::Value> = entries
        .iter()
        .map(|(email, name)| serde_json::json!({"email": email, "name": name}))
        .collect();
    serde_json::json!({ "users": users })
}

#[tokio::test]
async fn publish_campaign_returns_200_when_every_user_is_enrolled() {
    let app = spawn_app().await;
    app.mount_new_group().await;
    app.mount_new_subscriber("ursula@example.com", "1").await;
    app.mount_existing_subscriber("le.guin@example.com", "2").await;
    app.mount_assignments(2).await;
    app.mount_campaign_creation().await;
    app.mount_campaign_delivery().await;

    let response = app
        .post_campaign(&users(&[
            ("ursula@example.com", "Ursula"),
            ("le.guin@example.com", "Le Guin"),
        ]))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "status": "success",
            "group_id": GROUP_ID,
            "campaign_id": CAMPAIGN_ID,
            "users": [
                {"email": "ursula@example.com", "status": "created", "error": null},
                {"email": "le.guin@example.com", "status": "already-existed", "error": null},
            ],
            "error": null
        })
    );
}

#[tokio::test]
async fn every_mailer_request_carries_the_api_key() {
    let app = spawn_app().await;
    app.mount_new_group().await;
    app.mount_new_subscriber("ursula@example.com", "1").await;
    app.mount_assignments(1).await;
    app.mount_campaign_creation().await;
    app.mount_campaign_delivery().await;

    app.post_campaign(&users(&[("ursula@example.com", "Ursula")]))
        .await;

    let expected = format!("Bearer {API_KEY}");
    let received = app.mailer_server.received_requests().await.unwrap();
    assert!(!received.is_empty());
    for request in received {
        let authorization = request
            .headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok());
        assert_eq!(authorization, Some(expected.as_str()));
    }
}

#[tokio::test]
async fn a_failing_user_yields_a_partial_result_and_the_campaign_is_still_sent() {
    let app = spawn_app().await;
    app.mount_new_group().await;
    app.mount_new_subscriber("ursula@example.com", "1").await;
    app.mount_new_subscriber("le.guin@example.com", "2").await;
    Mock::given(method("GET"))
        .and(path("/api/subscribers/broken@example.com"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.mailer_server)
        .await;
    app.mount_assignments(2).await;
    app.mount_campaign_creation().await;
    app.mount_campaign_delivery().await;

    let response = app
        .post_campaign(&users(&[
            ("ursula@example.com", "Ursula"),
            ("broken@example.com", "Broken"),
            ("le.guin@example.com", "Le Guin"),
        ]))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "partial");
    assert_eq!(body["campaign_id"], CAMPAIGN_ID);
    assert_eq!(body["users"][0]["status"], "created");
    assert_eq!(body["users"][1]["status"], "failed");
    assert!(body["users"][1]["error"].is_string());
    assert_eq!(body["users"][2]["status"], "created");
}

#[tokio::test]
async fn publish_campaign_returns_400_when_data_is_missing() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailer_server)
        .await;

    let test_cases = vec![
        ("{}", "missing the users"),
        (r#"{"users": [{"name": "Ursula"}]}"#, "missing the email"),
        (r#"{"users": [{"email": "ursula@example.com"}]}"#, "missing the name"),
        ("{not json", "not valid JSON"),
    ];

    for (body, description) in test_cases {
        let response = app.post_campaign_raw(body.to_string()).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"]["kind"], "validation_error");
        assert_eq!(body["users"], serde_json::json!([]));
    }
}

#[tokio::test]
async fn a_large_batch_is_accepted_past_the_default_body_limit() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailer_server)
        .await;

    // Over actix's 32 KiB default; the bad last entry keeps the mailer untouched.
    let mut entries: Vec<(String, String)> = (0..1000)
        .map(|i| (format!("user{i}@example.com"), format!("User number {i}")))
        .collect();
    entries.push(("definitely-not-an-email".into(), "Broken".into()));
    let entries: Vec<(&str, &str)> = entries
        .iter()
        .map(|(email, name)| (email.as_str(), name.as_str()))
        .collect();
    let body = users(&entries);
    assert!(body.to_string().len() > 32 * 1024);

    let response = app.post_campaign(&body).await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("index 1000"), "{message}");
}

#[tokio::test]
async fn publish_campaign_returns_400_when_fields_are_present_but_invalid() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailer_server)
        .await;

    let test_cases = vec![
        (serde_json::json!({"users": []}), "an empty user list"),
        (users(&[("ursula@example.com", "")]), "an empty name"),
        (users(&[("", "Ursula")]), "an empty email"),
        (
            users(&[
                ("ursula@example.com", "Ursula"),
                ("definitely-not-an-email", "Le Guin"),
            ]),
            "an invalid email",
        ),
    ];

    for (body, description) in test_cases {
        let response = app.post_campaign(&body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload had {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"]["kind"], "validation_error");
    }
}

#[tokio::test]
async fn rejected_api_key_fails_the_invocation_with_an_auth_error() {
    let app = spawn_app().await;

    Mock::given(path("/api/groups"))
        .and(header("Authorization", format!("Bearer {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let response = app
        .post_campaign(&users(&[("ursula@example.com", "Ursula")]))
        .await;

    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"]["kind"], "auth_error");
    assert_eq!(body["users"], serde_json::json!([]));
}

#[tokio::test]
async fn campaign_creation_failure_returns_502() {
    let app = spawn_app().await;
    app.mount_new_group().await;
    app.mount_new_subscriber("ursula@example.com", "1").await;
    app.mount_assignments(1).await;
    Mock::given(method("POST"))
        .and(path("/api/campaigns"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let response = app
        .post_campaign(&users(&[("ursula@example.com", "Ursula")]))
        .await;

    assert_eq!(502, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["group_id"], GROUP_ID);
    assert_eq!(body["campaign_id"], serde_json::Value::Null);
    assert_eq!(body["error"]["kind"], "upstream_error");
    assert_eq!(body["users"][0]["status"], "created");
}

#[tokio::test]
async fn already_sent_campaign_returns_409() {
    let app = spawn_app().await;
    app.mount_new_group().await;
    app.mount_new_subscriber("ursula@example.com", "1").await;
    app.mount_assignments(1).await;
    app.mount_campaign_creation().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/campaigns/{CAMPAIGN_ID}/schedule")))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"message": "Campaign can not be scheduled."})),
        )
        .expect(1)
        .mount(&app.mailer_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/campaigns/{CAMPAIGN_ID}")))
        .respond_with(data(serde_json::json!({"id": CAMPAIGN_ID, "status": "sent"})))
        .expect(1)
        .mount(&app.mailer_server)
        .await;

    let response = app
        .post_campaign(&users(&[("ursula@example.com", "Ursula")]))
        .await;

    assert_eq!(409, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "already_sent_error");
    assert_eq!(body["campaign_id"], CAMPAIGN_ID);
}

#[tokio::test]
async fn repeated_addresses_are_enrolled_once_but_reported_per_entry() {
    let app = spawn_app().await;
    app.mount_new_group().await;
    app.mount_new_subscriber("ursula@example.com", "1").await;
    app.mount_assignments(1).await;
    app.mount_campaign_creation().await;
    app.mount_campaign_delivery().await;

    let response = app
        .post_campaign(&users(&[
            ("ursula@example.com", "Ursula"),
            ("Ursula@Example.com", "Ursula"),
        ]))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["users"],
        serde_json::json!([
            {"email": "ursula@example.com", "status": "created", "error": null},
            {"email": "Ursula@Example.com", "status": "created", "error": null},
        ])
    );
}
