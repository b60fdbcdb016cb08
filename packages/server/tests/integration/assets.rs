use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

use crate::common::{IMAGE_BASE, TestApp, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn group_member_gets_one_upload_session_per_file() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");

        let body = app
            .create_asset(&token, &group_id, &["a.mp4", "b.mp4"])
            .await;

        assert_eq!(body["asset"]["status"], "waiting_upload");
        assert_eq!(body["asset"]["owner_id"], "student");
        assert_eq!(body["asset"]["group_id"], group_id.as_str());
        assert!(body["asset"]["playback_id"].is_null());

        let uploads = body["uploads"].as_array().unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0]["filename"], "a.mp4");
        assert_eq!(uploads[1]["filename"], "b.mp4");
        assert_ne!(uploads[0]["upload_id"], uploads[1]["upload_id"]);
        assert_ne!(uploads[0]["upload_url"], uploads[1]["upload_url"]);

        let id = body["asset"]["id"].as_str().unwrap();
        let res = app.get_with_token(&routes::asset(id), &token).await;
        assert_eq!(res.status, 200);
        let videos = res.body["videos"].as_array().unwrap();
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|v| v["status"] == "waiting_upload"));
    }

    #[tokio::test]
    async fn non_member_is_rejected_and_nothing_is_created() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &[]).await;
        let token = app.token("outsider", "student");

        let res = app
            .post_with_token(
                routes::ASSETS,
                &json!({"title": "Title", "group_id": group_id, "filenames": ["a.mp4"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "NOT_GROUP_MEMBER");

        let list = app.get_with_token(routes::ASSETS, &token).await;
        assert_eq!(list.body["data"], json!([]));
    }

    #[tokio::test]
    async fn role_without_create_permission_is_rejected() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("expert", &[]).await;
        let token = app.token("expert", "expert");

        let res = app
            .post_with_token(
                routes::ASSETS,
                &json!({"title": "Title", "group_id": group_id, "filenames": ["a.mp4"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn malformed_group_id_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.token("student", "student");

        let res = app
            .post_with_token(
                routes::ASSETS,
                &json!({"title": "Title", "group_id": "not-a-uuid", "filenames": ["a.mp4"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_group_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.token("student", "student");

        let res = app
            .post_with_token(
                routes::ASSETS,
                &json!({
                    "title": "Title",
                    "group_id": "0192f0c4-6a1e-7c3b-9d2a-5b8e1f4c7a90",
                    "filenames": ["a.mp4"],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_title_or_files_is_rejected() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");

        for body in [
            json!({"title": "  ", "group_id": group_id, "filenames": ["a.mp4"]}),
            json!({"title": "Title", "group_id": group_id, "filenames": []}),
            json!({"title": "Title", "group_id": group_id, "filenames": ["a.mp4", ""]}),
            json!({"title": "Title", "group_id": group_id}),
        ] {
            let res = app.post_with_token(routes::ASSETS, &body, &token).await;
            assert_eq!(res.status, 400, "body {body} gave {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn provider_failure_fails_the_request_without_leaving_an_asset() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        app.provider.fail_uploads.store(true, Ordering::SeqCst);

        let res = app
            .post_with_token(
                routes::ASSETS,
                &json!({"title": "Title", "group_id": group_id, "filenames": ["a.mp4"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "PROVIDER_UNAVAILABLE");

        let list = app.get_with_token(routes::ASSETS, &token).await;
        assert_eq!(list.body["data"], json!([]));
    }

    #[tokio::test]
    async fn group_owner_is_emailed_about_a_new_upload() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");

        app.create_asset(&token, &group_id, &["a.mp4"]).await;

        let sent = app.wait_for_mail(1).await;
        assert_eq!(sent[0].to, vec!["teacher@example.com".to_string()]);
        assert_eq!(sent[0].subject, "New Asset Uploaded");
        assert!(sent[0].body.contains("Prelude"));
    }

    #[tokio::test]
    async fn owner_uploading_to_own_group_is_not_emailed() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("admin", &[]).await;
        let token = app.token("admin", "admin");

        app.create_asset(&token, &group_id, &["a.mp4"]).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(app.sent_mail().is_empty());
    }
}

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn unprocessed_video_has_no_playback_id_and_no_error() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let id = body["asset"]["id"].as_str().unwrap();

        let res = app.get_with_token(&routes::asset(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["playback_id"].is_null());
        assert!(res.body["thumbnail_url"].is_null());
        assert!(res.body["videos"][0]["playback_id"].is_null());
    }

    #[tokio::test]
    async fn provider_errors_during_reads_are_swallowed() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let id = body["asset"]["id"].as_str().unwrap();
        app.provider.fail_lookups.store(true, Ordering::SeqCst);

        let res = app.get_with_token(&routes::asset(id), &token).await;
        assert_eq!(res.status, 200);
        assert!(res.body["playback_id"].is_null());

        let res = app.get_with_token(routes::ASSETS, &token).await;
        assert_eq!(res.status, 200);
        assert!(res.body["data"][0]["playback_id"].is_null());
    }

    #[tokio::test]
    async fn playback_id_is_cached_once_and_never_overwritten() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let id = body["asset"]["id"].as_str().unwrap();
        let upload_id = body["uploads"][0]["upload_id"].as_str().unwrap();

        app.provider.set_playback(upload_id, "pb-first");
        let res = app.get_with_token(&routes::asset(id), &token).await;
        assert_eq!(res.body["playback_id"], "pb-first");
        assert_eq!(res.body["videos"][0]["status"], "ready");
        assert_eq!(
            res.body["thumbnail_url"],
            format!("{IMAGE_BASE}/pb-first/thumbnail.png")
        );

        app.provider.set_playback(upload_id, "pb-second");
        let lookups = app.provider.lookups.load(Ordering::SeqCst);

        let res = app.get_with_token(&routes::asset(id), &token).await;
        assert_eq!(res.body["playback_id"], "pb-first");
        let res = app.get_with_token(routes::ASSETS, &token).await;
        assert_eq!(res.body["data"][0]["playback_id"], "pb-first");
        assert_eq!(app.provider.lookups.load(Ordering::SeqCst), lookups);
    }

    #[tokio::test]
    async fn failed_upload_is_reported_once_and_not_polled_again() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let id = body["asset"]["id"].as_str().unwrap();
        let upload_id = body["uploads"][0]["upload_id"].as_str().unwrap();
        app.provider.set_failed(upload_id);

        let res = app.get_with_token(&routes::asset(id), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["videos"][0]["status"], "errored");
        assert!(res.body["videos"][0]["playback_id"].is_null());

        let lookups = app.provider.lookups.load(Ordering::SeqCst);
        app.provider.set_playback(upload_id, "pb-late");
        let res = app.get_with_token(&routes::asset(id), &token).await;
        assert_eq!(res.body["videos"][0]["status"], "errored");
        app.get_with_token(routes::ASSETS, &token).await;
        assert_eq!(app.provider.lookups.load(Ordering::SeqCst), lookups);
    }

    #[tokio::test]
    async fn list_reconciles_the_cover_video() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let upload_id = body["uploads"][0]["upload_id"].as_str().unwrap();
        app.provider.set_playback(upload_id, "pb-cover");

        let res = app.get_with_token(routes::ASSETS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"][0]["playback_id"], "pb-cover");
        assert_eq!(
            res.body["data"][0]["thumbnail_url"],
            format!("{IMAGE_BASE}/pb-cover/thumbnail.png")
        );
        assert!(res.body["data"][0].get("videos").is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let first = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let second = app.create_asset(&token, &group_id, &["b.mp4"]).await;

        let res = app.get_with_token(routes::ASSETS, &token).await;

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], second["asset"]["id"]);
        assert_eq!(data[1]["id"], first["asset"]["id"]);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let app = TestApp::spawn().await;
        let token = app.token("student", "student");

        let res = app
            .get_with_token(
                &routes::asset("0192f0c4-6a1e-7c3b-9d2a-5b8e1f4c7a90"),
                &token,
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app.get_with_token(&routes::asset("42"), &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod lifecycle {
    use super::*;

    async fn pending_asset(app: &TestApp) -> String {
        let group_id = app.create_group("teacher", &["student"]).await;
        let token = app.token("student", "student");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let id = body["asset"]["id"].as_str().unwrap().to_string();

        let res = app
            .post_with_token(&routes::asset_complete(&id), &json!({}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "pending");
        id
    }

    #[tokio::test]
    async fn complete_upload_is_idempotent_while_pending() {
        let app = TestApp::spawn().await;
        let id = pending_asset(&app).await;
        let token = app.token("student", "student");

        let res = app
            .post_with_token(&routes::asset_complete(&id), &json!({}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "pending");
    }

    #[tokio::test]
    async fn only_the_owner_can_complete_the_upload() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let body = app
            .create_asset(&app.token("student", "student"), &group_id, &["a.mp4"])
            .await;
        let id = body["asset"]["id"].as_str().unwrap();

        let res = app
            .post_with_token(
                &routes::asset_complete(id),
                &json!({}),
                &app.token("teacher", "expert"),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        let res = app
            .get_with_token(&routes::asset(id), &app.token("student", "student"))
            .await;
        assert_eq!(res.body["status"], "waiting_upload");
    }

    #[tokio::test]
    async fn students_cannot_finalize() {
        let app = TestApp::spawn().await;
        let id = pending_asset(&app).await;

        let res = app
            .post_with_token(
                &routes::asset_finalize(&id),
                &json!({}),
                &app.token("student", "student"),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn completed_asset_never_moves_back() {
        let app = TestApp::spawn().await;
        let id = pending_asset(&app).await;
        let expert = app.token("teacher", "expert");
        let student = app.token("student", "student");

        let res = app
            .post_with_token(&routes::asset_finalize(&id), &json!({}), &expert)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "completed");

        let res = app
            .post_with_token(&routes::asset_finalize(&id), &json!({}), &expert)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let res = app
            .post_with_token(&routes::asset_complete(&id), &json!({}), &student)
            .await;
        assert_eq!(res.status, 409);

        let res = app.get_with_token(&routes::asset(&id), &student).await;
        assert_eq!(res.body["status"], "completed");
    }

    #[tokio::test]
    async fn finalize_can_skip_the_pending_state() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("teacher", &["student"]).await;
        let body = app
            .create_asset(&app.token("student", "student"), &group_id, &["a.mp4"])
            .await;
        let id = body["asset"]["id"].as_str().unwrap();

        let res = app
            .post_with_token(
                &routes::asset_finalize(id),
                &json!({}),
                &app.token("teacher", "expert"),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "completed");
    }

    #[tokio::test]
    async fn finalize_responds_before_the_owner_is_emailed() {
        let app = TestApp::spawn().await;
        let id = pending_asset(&app).await;
        // Drain the upload notification to the group owner.
        app.wait_for_mail(1).await;
        app.hold_mail();

        let res = app
            .post_with_token(
                &routes::asset_finalize(&id),
                &json!({}),
                &app.token("reviewer", "expert"),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "completed");
        assert_eq!(app.sent_mail().len(), 1);

        app.release_mail();
        let sent = app.wait_for_mail(2).await;
        assert_eq!(sent[1].to, vec!["student@example.com".to_string()]);
        assert_eq!(sent[1].subject, "Your video has been reviewed");
        assert!(sent[1].body.contains("reviewer"));
    }

    #[tokio::test]
    async fn owner_finalizing_own_asset_is_not_emailed() {
        let app = TestApp::spawn().await;
        let group_id = app.create_group("admin", &[]).await;
        let token = app.token("admin", "admin");
        let body = app.create_asset(&token, &group_id, &["a.mp4"]).await;
        let id = body["asset"]["id"].as_str().unwrap();

        let res = app
            .post_with_token(&routes::asset_finalize(id), &json!({}), &token)
            .await;
        assert_eq!(res.status, 200);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(app.sent_mail().is_empty());
    }
}
