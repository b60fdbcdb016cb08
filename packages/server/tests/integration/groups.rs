use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn creator_owns_and_belongs_to_new_group() {
    let app = TestApp::spawn().await;
    let token = app.token("teacher", "expert");

    let res = app
        .post_with_token(routes::GROUPS, &json!({"name": " Cello studio "}), &token)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["name"], "Cello studio");
    assert_eq!(res.body["owner_id"], "teacher");
    let id = res.body["id"].clone();

    let res = app.get_with_token(routes::GROUPS, &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["data"][0]["id"], id);
}

#[tokio::test]
async fn students_cannot_create_groups() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({"name": "Mine"}),
            &app.token("student", "student"),
        )
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({"name": "   "}),
            &app.token("teacher", "expert"),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn added_member_can_upload_to_the_group() {
    let app = TestApp::spawn().await;
    let owner = app.token("teacher", "expert");
    let student = app.token("student", "student");
    let res = app
        .post_with_token(routes::GROUPS, &json!({"name": "Studio"}), &owner)
        .await;
    let group_id = res.body["id"].as_str().unwrap().to_string();

    let res = app
        .post_with_token(
            &routes::group_members(&group_id),
            &json!({"user_id": "student"}),
            &owner,
        )
        .await;
    assert_eq!(res.status, 204, "{}", res.text);

    // Adding twice is a no-op.
    let res = app
        .post_with_token(
            &routes::group_members(&group_id),
            &json!({"user_id": "student"}),
            &owner,
        )
        .await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(routes::GROUPS, &student).await;
    assert_eq!(res.body["data"][0]["id"], group_id.as_str());

    app.create_asset(&student, &group_id, &["a.mp4"]).await;
}

#[tokio::test]
async fn only_the_owner_can_add_members() {
    let app = TestApp::spawn().await;
    let group_id = app.create_group("teacher", &["student"]).await;

    let res = app
        .post_with_token(
            &routes::group_members(&group_id),
            &json!({"user_id": "friend"}),
            &app.token("other", "admin"),
        )
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn adding_to_unknown_group_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            &routes::group_members("0192f0c4-6a1e-7c3b-9d2a-5b8e1f4c7a90"),
            &json!({"user_id": "friend"}),
            &app.token("teacher", "expert"),
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn avatar_is_stored_and_returned() {
    let app = TestApp::spawn().await;
    let token = app.token("teacher", "expert");
    let avatar = STANDARD.encode(b"\x89PNG avatar bytes");

    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({"name": "Cello studio", "avatar": avatar}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["avatar"], avatar);

    let res = app.get_with_token(routes::GROUPS, &token).await;
    assert_eq!(res.body["data"][0]["avatar"], avatar);
}

#[tokio::test]
async fn group_without_avatar_has_null_avatar() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({"name": "Plain"}),
            &app.token("teacher", "expert"),
        )
        .await;

    assert_eq!(res.status, 201);
    assert!(res.body["avatar"].is_null());
}

#[tokio::test]
async fn invalid_avatar_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({"name": "Studio", "avatar": "%%% not base64 %%%"}),
            &app.token("teacher", "expert"),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn avatar_size_limit_is_300_kib() {
    let app = TestApp::spawn().await;
    let token = app.token("teacher", "expert");

    let exact = STANDARD.encode(vec![1u8; 300 * 1024]);
    let res = app
        .post_with_token(
            routes::GROUPS,
            &json!({"name": "Exact", "avatar": exact}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let over = STANDARD.encode(vec![1u8; 300 * 1024 + 1]);
    let res = app
        .post_with_token(routes::GROUPS, &json!({"name": "Over", "avatar": over}), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app.get_with_token(routes::GROUPS, &token).await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
}
