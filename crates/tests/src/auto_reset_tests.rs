use std::time::Duration;

use crate::fixtures::test_app::TestApp;
use bson::DateTime;
use doorsign_services::background::AutoResetService;
use serde_json::Value;

async fn status_of(app: &TestApp, token: &str) -> String {
    let resp = app.auth_get("/api/presence/me", token).send().await.unwrap();
    let json: Value = resp.json().await.unwrap();
    json["status"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn sweep_reverts_stale_statuses_and_is_idempotent() {
    let app = TestApp::spawn().await;
    let u = app.register_user("sweep@example.com", "Sweep").await;
    app.create_org(&u.access_token, "Swept", "personal").await;

    app.auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "busy" }))
        .send()
        .await
        .unwrap();

    // Open the window strictly after the user's last update
    tokio::time::sleep(Duration::from_millis(20)).await;
    let window_start = DateTime::now();

    let service = AutoResetService::new(&app.db);
    let reset = service.run_for_hour(0, window_start).await.unwrap();
    assert_eq!(reset, 1);
    assert_eq!(status_of(&app, &u.access_token).await, "available");

    // Running again in the same window matches nothing new
    let reset = service.run_for_hour(0, window_start).await.unwrap();
    assert_eq!(reset, 0);
}

#[tokio::test]
async fn sweep_does_not_clobber_updates_made_after_it_fired() {
    let app = TestApp::spawn().await;
    let u = app.register_user("late@example.com", "Late").await;
    app.create_org(&u.access_token, "Late Org", "personal").await;

    app.auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "busy" }))
        .send()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let window_start = DateTime::now();

    let service = AutoResetService::new(&app.db);
    service.run_for_hour(0, window_start).await.unwrap();

    // The user reacts to the reset within the same window
    app.auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "meeting" }))
        .send()
        .await
        .unwrap();

    let reset = service.run_for_hour(0, window_start).await.unwrap();
    assert_eq!(reset, 0);
    assert_eq!(status_of(&app, &u.access_token).await, "meeting");
}

#[tokio::test]
async fn sweep_skips_orgs_configured_for_another_hour() {
    let app = TestApp::spawn().await;
    let u = app.register_user("offhour@example.com", "Offhour").await;
    app.create_org(&u.access_token, "Off Hour", "personal").await;

    app.auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "away" }))
        .send()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let service = AutoResetService::new(&app.db);
    // Org is configured for hour 0 (default); a sweep for hour 5 skips it
    let reset = service.run_for_hour(5, DateTime::now()).await.unwrap();
    assert_eq!(reset, 0);
    assert_eq!(status_of(&app, &u.access_token).await, "away");
}
