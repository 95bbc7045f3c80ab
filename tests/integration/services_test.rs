//! Domain service integration tests
//!
//! End-to-end through `ReqwestTransport` against wiremock servers.

use crate::common::mock_client;
use pressroom::client::ApiClient;
use pressroom::client::services::{
    AuthService, CommentService, FollowCommand, LikeCommand, LikeService, PostService, UserService,
};
use pressroom::client::transport::MultipartPart;
use pressroom::shared::models::{
    CommentUpdate, LoginRequest, NewComment, PostDraft, PostFilters, PostQuery, PostStatus,
};
use pressroom::shared::ClientConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn no_auth_header(request: &Request) -> bool {
    !request.headers.contains_key("authorization")
}

#[tokio::test]
async fn test_login_establishes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
        .and(no_auth_header)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "user": { "_id": "u1", "username": "ada" },
                "accessToken": "a1",
                "refreshToken": "r1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "user": { "id": "u1", "username": "ada" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let auth = AuthService::new(client.clone());

    let payload = crate::assert_envelope_ok!(
        auth.login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "pw".into(),
        })
        .await
    );
    assert_eq!(payload.user.id, "u1");
    assert_eq!(client.session().refresh_token.as_deref(), Some("r1"));

    let me = crate::assert_envelope_ok!(auth.current_user().await);
    assert_eq!(me.username, "ada");
}

#[tokio::test]
async fn test_wrong_password_is_failure_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "success": false, "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let auth = AuthService::new(mock_client(&server));
    let message = crate::assert_envelope_failed!(
        auth.login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "wrong".into(),
        })
        .await
    );
    assert_eq!(message, "Invalid credentials");
    assert!(!auth.client().is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    client.establish_session(crate::common::tokens("a1", Some("r1")));
    let auth = AuthService::new(client.clone());

    assert!(auth.logout().await.success);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_list_posts_sends_query_and_decodes_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(query_param("tag", "rust"))
        .and(query_param("status", "published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "posts": [{ "_id": "p6", "title": "Sixth", "likesCount": 3 }],
                "pagination": { "page": 2, "limit": 5, "total": 6, "totalPages": 2 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = PostService::new(mock_client(&server));
    let query = PostQuery {
        page: Some(2),
        limit: Some(5),
        filters: PostFilters {
            tag: Some("rust".into()),
            status: Some(PostStatus::Published),
            ..PostFilters::default()
        },
    };

    let page = crate::assert_envelope_ok!(posts.list(&query).await);
    assert_eq!(page.posts[0].id, "p6");
    assert_eq!(page.posts[0].likes_count, 3);
    assert_eq!(page.pagination.total, 6);
    assert!(!page.pagination.has_next());
}

#[tokio::test]
async fn test_create_post_validates_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let posts = PostService::new(mock_client(&server));
    let message = crate::assert_envelope_failed!(
        posts
            .create(&PostDraft {
                title: "  ".into(),
                content: "body".into(),
                ..PostDraft::default()
            })
            .await
    );
    crate::assert_contains!(message, "title");
}

#[tokio::test]
async fn test_missing_post_is_failure_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/slug/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "success": false, "message": "Post not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let posts = PostService::new(mock_client(&server));
    let message = crate::assert_envelope_failed!(posts.get_by_slug("missing").await);
    assert_eq!(message, "Post not found");
}

#[tokio::test]
async fn test_transient_503_is_retried_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/categories"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["news", "tech"])))
        .with_priority(2)
        .mount(&server)
        .await;

    let posts = PostService::new(mock_client(&server));
    let categories = crate::assert_envelope_ok!(posts.categories().await);
    assert_eq!(categories, vec!["news".to_string(), "tech".to_string()]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_expired_token_refreshed_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": "u1", "username": "ada", "bio": "Hello" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2", "refreshToken": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    client.establish_session(crate::common::tokens("a1", Some("r1")));
    let users = UserService::new(client.clone());

    let update = pressroom::shared::models::ProfileUpdate {
        bio: Some("Hello".into()),
        ..Default::default()
    };
    let user = crate::assert_envelope_ok!(users.update_profile(&update).await);
    assert_eq!(user.bio.as_deref(), Some("Hello"));
    assert_eq!(client.session().refresh_token.as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_like_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/likes/posts"))
        .and(body_json(json!({ "postId": "p1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "likesCount": 4, "isLiked": true }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/likes/posts/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/likes/comments/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/likes/comments/c1/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 9, "isLiked": false })))
        .expect(1)
        .mount(&server)
        .await;

    let likes = LikeService::new(mock_client(&server));

    let liked = crate::assert_envelope_ok!(likes.post("p1", LikeCommand::Like).await);
    assert_eq!(liked.count, 4);

    let unliked = likes.unlike_post("p1").await;
    assert!(unliked.success);
    assert_eq!(unliked.data, None);

    let comment = likes.like_comment("c1").await;
    assert!(comment.success);

    let status = crate::assert_envelope_ok!(likes.comment_status("c1").await);
    assert_eq!(status.count, 9);
}

#[tokio::test]
async fn test_comment_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/comments"))
        .and(body_json(json!({ "postId": "p1", "content": "Nice", "parentId": "c0" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "_id": "c1", "post": "p1", "content": "Nice", "parentId": "c0" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/comments/c1"))
        .and(body_json(json!({ "content": "Nicer" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "_id": "c1", "post": "p1", "content": "Nicer", "isEdited": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let comments = CommentService::new(mock_client(&server));
    let created = crate::assert_envelope_ok!(
        comments
            .create(&NewComment {
                post_id: "p1".into(),
                content: "Nice".into(),
                parent_id: Some("c0".into()),
            })
            .await
    );
    assert_eq!(created.post_id, "p1");
    assert_eq!(created.parent_id.as_deref(), Some("c0"));

    let updated = crate::assert_envelope_ok!(
        comments
            .update("c1", &CommentUpdate {
                content: "Nicer".into(),
            })
            .await
    );
    assert!(updated.is_edited);
}

#[tokio::test]
async fn test_follow_and_avatar_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/u2/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "isFollowing": true, "followersCount": 12 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/avatar"))
        .and(|request: &Request| {
            request
                .headers
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.starts_with("multipart/form-data"))
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": "u1", "username": "ada", "avatar": "/uploads/ada.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let users = UserService::new(mock_client(&server));

    let status = crate::assert_envelope_ok!(users.follow("u2", FollowCommand::Follow).await);
    assert!(status.is_following);
    assert_eq!(status.followers_count, 12);

    let user = crate::assert_envelope_ok!(
        users
            .upload_avatar("ada.png", "image/png", vec![0x89u8, 0x50, 0x4e, 0x47])
            .await
    );
    assert_eq!(user.avatar.as_deref(), Some("/uploads/ada.png"));
}

#[tokio::test]
async fn test_post_media_upload_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/p1/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": "p1", "title": "One", "media": ["/uploads/a.jpg"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let posts = PostService::new(mock_client(&server));
    let files = vec![
        MultipartPart::file("media", "a.jpg", "image/jpeg", vec![0xffu8, 0xd8]),
        MultipartPart::text("caption", "sunrise"),
    ];
    let post = crate::assert_envelope_ok!(posts.upload_media("p1", files).await);
    assert_eq!(post.media, vec!["/uploads/a.jpg".to_string()]);

    let received = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body);
    crate::assert_contains!(body, "sunrise");
}

#[tokio::test]
async fn test_media_with_bad_mime_is_rejected_without_sending() {
    let server = MockServer::start().await;
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .retry_delay(Duration::from_secs(1))
        .build()
        .unwrap();
    let posts = PostService::new(Arc::new(ApiClient::builder(config).build().unwrap()));
    let files = vec![MultipartPart::file("media", "a.png", "not a mime", vec![1u8, 2])];

    let started = Instant::now();
    let envelope = posts.upload_media("p1", files).await;

    let message = crate::assert_envelope_failed!(envelope);
    crate::assert_contains!(message, "invalid mime type 'not a mime'");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(server.received_requests().await.unwrap().is_empty());
}
