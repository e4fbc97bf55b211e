use crate::fixtures::test_app::TestApp;
use bson::doc;
use serde_json::Value;

/// Count of active memberships for a user, straight from the store.
async fn active_count(app: &TestApp, user_id: &str) -> u64 {
    let oid = bson::oid::ObjectId::parse_str(user_id).unwrap();
    app.db
        .collection::<bson::Document>("memberships")
        .count_documents(doc! { "user_id": oid, "is_active": true })
        .await
        .unwrap()
}

#[tokio::test]
async fn creating_a_second_org_moves_the_active_flag() {
    let app = TestApp::spawn().await;
    let user = app.register_user("ana@example.com", "Ana").await;

    let (first_id, _) = app.create_org(&user.access_token, "First", "personal").await;
    let (second_id, _) = app
        .create_org(&user.access_token, "Second", "personal")
        .await;

    let memberships = app.list_memberships(&user.access_token).await;
    assert_eq!(memberships.len(), 2);

    let by_id = |id: &str| {
        memberships
            .iter()
            .find(|m| m["org"]["id"] == *id)
            .unwrap()
            .clone()
    };
    assert_eq!(by_id(&first_id)["is_active"], false);
    assert_eq!(by_id(&second_id)["is_active"], true);
    assert_eq!(by_id(&second_id)["role"], "admin");

    assert_eq!(active_count(&app, &user.id).await, 1);
}

#[tokio::test]
async fn switch_active_is_exclusive() {
    let app = TestApp::spawn().await;
    let user = app.register_user("bo@example.com", "Bo").await;

    let (first_id, _) = app.create_org(&user.access_token, "First", "personal").await;
    let (_second_id, _) = app
        .create_org(&user.access_token, "Second", "personal")
        .await;

    let resp = app
        .auth_post(&format!("/api/org/{}/switch", first_id), &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let memberships = app.list_memberships(&user.access_token).await;
    let active: Vec<&Value> = memberships
        .iter()
        .filter(|m| m["is_active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["org"]["id"], first_id);

    assert_eq!(active_count(&app, &user.id).await, 1);
}

#[tokio::test]
async fn switch_to_foreign_org_is_forbidden() {
    let app = TestApp::spawn().await;
    let ana = app.register_user("ana2@example.com", "Ana").await;
    let bo = app.register_user("bo2@example.com", "Bo").await;

    let (org_id, _) = app.create_org(&ana.access_token, "Ana Org", "personal").await;

    let resp = app
        .auth_post(&format!("/api/org/{}/switch", org_id), &bo.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn transfer_admin_flips_roles_and_old_admin_loses_rights() {
    let app = TestApp::spawn().await;
    let admin = app.register_user("admin@example.com", "Admin").await;
    let member = app.register_user("member@example.com", "Member").await;

    let (org_id, code) = app.create_org(&admin.access_token, "Team X", "personal").await;
    let resp = app.redeem_code(&member.access_token, &code.unwrap()).await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_post(&format!("/api/org/{}/transfer", org_id), &admin.access_token)
        .json(&serde_json::json!({ "new_admin_id": member.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // Roles flipped
    let resp = app
        .auth_get(&format!("/api/org/{}/members", org_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    let members: Vec<Value> = resp.json().await.unwrap();
    let role_of = |id: &str| {
        members
            .iter()
            .find(|m| m["user_id"] == *id)
            .unwrap()["role"]
            .clone()
    };
    assert_eq!(role_of(&admin.id), "member");
    assert_eq!(role_of(&member.id), "admin");

    // A second transfer by the demoted caller is rejected
    let resp = app
        .auth_post(&format!("/api/org/{}/transfer", org_id), &admin.access_token)
        .json(&serde_json::json!({ "new_admin_id": admin.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn transfer_to_non_member_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.register_user("admin2@example.com", "Admin").await;
    let outsider = app.register_user("outsider@example.com", "Outsider").await;

    let (org_id, _) = app.create_org(&admin.access_token, "Team Y", "personal").await;

    let resp = app
        .auth_post(&format!("/api/org/{}/transfer", org_id), &admin.access_token)
        .json(&serde_json::json!({ "new_admin_id": outsider.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // The failed transfer must not have demoted the caller
    let resp = app
        .auth_get(&format!("/api/org/{}/members", org_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    let members: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(members[0]["role"], "admin");
}

#[tokio::test]
async fn sole_admin_cannot_leave() {
    let app = TestApp::spawn().await;
    let admin = app.register_user("solo@example.com", "Solo").await;
    let member = app.register_user("member2@example.com", "Member").await;

    let (org_id, code) = app.create_org(&admin.access_token, "Solo Org", "personal").await;
    let resp = app.redeem_code(&member.access_token, &code.unwrap()).await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_post(&format!("/api/org/{}/leave", org_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // The plain member can leave freely
    let resp = app
        .auth_post(&format!("/api/org/{}/leave", org_id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let memberships = app.list_memberships(&member.access_token).await;
    assert!(memberships.is_empty());
}

#[tokio::test]
async fn leave_after_transfer_is_allowed() {
    let app = TestApp::spawn().await;
    let admin = app.register_user("mover@example.com", "Mover").await;
    let member = app.register_user("stayer@example.com", "Stayer").await;

    let (org_id, code) = app.create_org(&admin.access_token, "Handover", "personal").await;
    app.redeem_code(&member.access_token, &code.unwrap()).await;

    app.auth_post(&format!("/api/org/{}/transfer", org_id), &admin.access_token)
        .json(&serde_json::json!({ "new_admin_id": member.id }))
        .send()
        .await
        .unwrap();

    let resp = app
        .auth_post(&format!("/api/org/{}/leave", org_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn dissolve_requires_admin_and_cascades() {
    let app = TestApp::spawn().await;
    let admin = app.register_user("owner@example.com", "Owner").await;
    let member = app.register_user("joiner@example.com", "Joiner").await;

    let (org_id, code) = app.create_org(&admin.access_token, "Doomed", "personal").await;
    app.redeem_code(&member.access_token, &code.unwrap()).await;

    // Member cannot dissolve
    let resp = app
        .auth_delete(&format!("/api/org/{}", org_id), &member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Admin can
    let resp = app
        .auth_delete(&format!("/api/org/{}", org_id), &admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // Memberships are gone for everyone
    assert!(app.list_memberships(&admin.access_token).await.is_empty());
    assert!(app.list_memberships(&member.access_token).await.is_empty());

    let oid = bson::oid::ObjectId::parse_str(&org_id).unwrap();
    let remaining = app
        .db
        .collection::<bson::Document>("memberships")
        .count_documents(doc! { "org_id": oid })
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn update_reset_hour_validates_range_and_role() {
    let app = TestApp::spawn().await;
    let admin = app.register_user("sched@example.com", "Sched").await;
    let member = app.register_user("plain@example.com", "Plain").await;

    let (org_id, code) = app.create_org(&admin.access_token, "Clocked", "personal").await;
    app.redeem_code(&member.access_token, &code.unwrap()).await;

    let resp = app
        .auth_put(&format!("/api/org/{}/settings", org_id), &admin.access_token)
        .json(&serde_json::json!({ "reset_hour": 24 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app
        .auth_put(&format!("/api/org/{}/settings", org_id), &member.access_token)
        .json(&serde_json::json!({ "reset_hour": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(&format!("/api/org/{}/settings", org_id), &admin.access_token)
        .json(&serde_json::json!({ "reset_hour": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let memberships = app.list_memberships(&admin.access_token).await;
    assert_eq!(memberships[0]["org"]["reset_hour"], 7);
}
