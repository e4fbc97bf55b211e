use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn new_user_defaults_to_available() {
    let app = TestApp::spawn().await;
    let u = app.register_user("fresh@example.com", "Fresh").await;

    let resp = app
        .auth_get("/api/presence/me", &u.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "available");
}

#[tokio::test]
async fn set_status_roundtrip() {
    let app = TestApp::spawn().await;
    let u = app.register_user("deep@example.com", "Deep").await;

    let resp = app
        .auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "focus" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get("/api/presence/me", &u.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "focus");
}

#[tokio::test]
async fn unknown_status_tag_is_rejected() {
    let app = TestApp::spawn().await;
    let u = app.register_user("typo@example.com", "Typo").await;

    let resp = app
        .auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "heads_down" }))
        .send()
        .await
        .unwrap();
    // Serde rejects the unknown enum tag at deserialization
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn custom_slot_roundtrip_preserves_label_and_icon() {
    let app = TestApp::spawn().await;
    let u = app.register_user("custom@example.com", "Custom").await;

    let resp = app
        .auth_put("/api/presence/me/custom/1", &u.access_token)
        .json(&serde_json::json!({ "label": "Gym", "icon": "dumbbell" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get("/api/presence/me", &u.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["custom1"]["label"], "Gym");
    assert_eq!(json["custom1"]["icon"], "dumbbell");
    // Writing a slot does not change the current status
    assert_eq!(json["status"], "available");

    // The slot becomes usable as a status
    let resp = app
        .auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "custom1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn custom_slot_out_of_range_is_bad_request() {
    let app = TestApp::spawn().await;
    let u = app.register_user("oob@example.com", "Oob").await;

    let resp = app
        .auth_put("/api/presence/me/custom/3", &u.access_token)
        .json(&serde_json::json!({ "label": "Nope", "icon": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn team_shows_statuses_of_active_org_members() {
    let app = TestApp::spawn().await;
    let ana = app.register_user("ana@example.com", "Ana").await;
    let bo = app.register_user("bo@example.com", "Bo").await;

    let (_org_id, code) = app.create_org(&ana.access_token, "Team", "personal").await;
    app.redeem_code(&bo.access_token, &code.unwrap()).await;

    app.auth_put("/api/presence/me", &bo.access_token)
        .json(&serde_json::json!({ "status": "lunch" }))
        .send()
        .await
        .unwrap();

    let resp = app
        .auth_get("/api/presence/team", &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let team: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(team.len(), 2);
    let bo_row = team.iter().find(|m| m["display_name"] == "Bo").unwrap();
    assert_eq!(bo_row["status"], "lunch");
}

#[tokio::test]
async fn team_without_active_org_is_forbidden() {
    let app = TestApp::spawn().await;
    let loner = app.register_user("loner@example.com", "Loner").await;

    let resp = app
        .auth_get("/api/presence/team", &loner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn status_is_shared_across_organizations() {
    let app = TestApp::spawn().await;
    let u = app.register_user("multi@example.com", "Multi").await;

    let (first_id, _) = app.create_org(&u.access_token, "First", "personal").await;
    app.create_org(&u.access_token, "Second", "personal").await;

    app.auth_put("/api/presence/me", &u.access_token)
        .json(&serde_json::json!({ "status": "busy" }))
        .send()
        .await
        .unwrap();

    // Switching the active org does not touch the user-scoped status
    app.auth_post(&format!("/api/org/{}/switch", first_id), &u.access_token)
        .send()
        .await
        .unwrap();

    let resp = app
        .auth_get("/api/presence/me", &u.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "busy");
}
