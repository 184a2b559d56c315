//! End-to-end HTTP tests over the in-memory application

mod helpers;

use axum::http::{header, Method, StatusCode};
use eventpass::models::Role;
use eventpass::services::AuthService;
use helpers::*;
use serde_json::json;

#[tokio::test]
async fn test_health_reports_ok() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_public_event_lookup() {
    let app = TestApp::new();
    let event = app.create_event().await;

    let (status, body) = app.request(Method::GET, "/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);

    let uri = format!("/events/slug/{}", event.slug);
    let (status, body) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["name"], "Annual Tech Summit");
    assert_eq!(body["event"]["isActive"], true);

    let (status, body) = app.request(Method::GET, "/events/slug/no-such-event", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn test_self_registration_and_duplicates() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let uri = format!("/register/{}", event.slug);
    let form = json!({
        "name": "Alice Doe",
        "organization": "NiMet",
        "contact": "Alice@Example.com",
        "phone": "08011112222",
    });

    let (status, body) = app.request(Method::POST, &uri, None, Some(form.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["participantId"].is_string());

    // Same email in another case is still a duplicate
    let mut again = form.clone();
    again["contact"] = json!("alice@example.com");
    again["phone"] = json!("08099998888");
    let (status, body) = app.request(Method::POST, &uri, None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");

    let mut same_phone = form.clone();
    same_phone["contact"] = json!("bob@example.com");
    let (status, body) = app.request(Method::POST, &uri, None, Some(same_phone)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_PHONE");

    let emails = wait_for_emails(&app.mailer, "alice@example.com", 1).await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "Registration Confirmed: Annual Tech Summit");
}

#[tokio::test]
async fn test_registration_validation_message() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let uri = format!("/register/{}", event.slug);

    let (status, body) = app
        .request(
            Method::POST,
            &uri,
            None,
            Some(json!({ "name": "Al", "contact": "not-an-email", "phone": "08011112222" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a valid email address.");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/mobile/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.request(Method::GET, "/mobile/events", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::GET, "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_staff() {
    let app = TestApp::new();
    let (_, token) = app.login_as(Role::User).await;

    let (status, body) = app.request(Method::GET, "/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (_, admin_token) = app.login_as(Role::Admin).await;
    let (status, body) = app.request(Method::GET, "/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_login_verify_and_refresh() {
    let app = TestApp::new();
    let hash = AuthService::hash_password("s3cret-pass").unwrap();
    app.db
        .users
        .insert(&eventpass::models::NewUser {
            full_name: "Sam Staff".to_string(),
            email: "sam@example.com".to_string(),
            password_hash: hash,
            role: Role::User,
        })
        .await
        .unwrap();

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "SAM@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "SAM@example.com", "password": "s3cret-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["fullName"], "Sam Staff");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.request(Method::GET, "/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "sam@example.com");
    assert_eq!(body["user"]["role"], "user");

    let (status, body) = app.request(Method::POST, "/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let mut settings = test_settings();
    settings.auth.login_attempts_per_minute = 2;
    let app = TestApp::with_settings(settings);
    let body = json!({ "email": "nobody@example.com", "password": "whatever" });

    for _ in 0..2 {
        let (status, _) = app.request(Method::POST, "/auth/login", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = app.request(Method::POST, "/auth/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_scan_requires_assignment() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let participant = app.register_participant(event.id).await;
    let (staff, staff_token) = app.login_as(Role::User).await;
    let (_, admin_token) = app.login_as(Role::Admin).await;
    let scan = json!({
        "qrData": app.state.services.codec.encode(participant.id),
        "eventId": event.id.to_string(),
    });

    let (status, body) = app.request(Method::POST, "/mobile/scan", Some(&staff_token), Some(scan.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not assigned to this event");

    let (status, _) = app.request(Method::GET, "/mobile/events", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/admin/events/{}/staff", event.id);
    let (status, _) = app
        .request(
            Method::POST,
            &uri,
            Some(&admin_token),
            Some(json!({ "userId": staff.id.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::GET, "/mobile/events", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);

    let (status, body) = app.request(Method::POST, "/mobile/scan", Some(&staff_token), Some(scan.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendance"]["participantId"], participant.id.to_string());
    assert_eq!(body["attendance"]["signedBy"], "Self");

    let (status, body) = app.request(Method::POST, "/mobile/scan", Some(&staff_token), Some(scan)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_MARKED");
    assert_eq!(body["attendance"]["participantId"], participant.id.to_string());
}

#[tokio::test]
async fn test_scan_rejects_bad_payloads() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let (_, token) = app.login_as(Role::Admin).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/attendance",
            Some(&token),
            Some(json!({ "qrData": "eventpass://attendance/%%%", "eventId": event.id.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QR");

    let (status, _) = app
        .request(Method::POST, "/attendance", Some(&token), Some(json!({ "eventId": event.id.to_string() })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            Method::POST,
            "/attendance",
            Some(&token),
            Some(json!({ "participantId": uuid::Uuid::new_v4().to_string(), "eventId": event.id.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PARTICIPANT_NOT_FOUND");

    let (status, body) = app
        .request(
            Method::POST,
            "/attendance",
            Some(&token),
            Some(json!({ "participantId": uuid::Uuid::new_v4().to_string(), "eventId": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid event id");
}

#[tokio::test]
async fn test_attendance_listing_with_stats() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let first = app.register_participant(event.id).await;
    app.register_participant(event.id).await;
    let (_, token) = app.login_as(Role::Admin).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/attendance",
            Some(&token),
            Some(json!({ "participantId": first.id.to_string(), "eventId": event.id.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/attendance?eventId={}", event.id);
    let (status, body) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendance"].as_array().unwrap().len(), 1);
    assert_eq!(body["stats"]["totalParticipants"], 2);
    assert_eq!(body["stats"]["checkedIn"], 1);
    assert_eq!(body["stats"]["notCheckedIn"], 1);

    let uri = format!("/admin/events/{}/attendance/daily", event.id);
    let (status, body) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[1]["checkedIn"], 1);
}

#[tokio::test]
async fn test_walk_in_onboarding() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let (staff, token) = app.login_as(Role::User).await;
    app.state.services.events.assign_staff(event.id, staff.id).await.unwrap();

    let (status, body) = app
        .request(
            Method::POST,
            "/mobile/onboard",
            Some(&token),
            Some(json!({ "eventId": event.id, "firstName": "Bob", "lastName": "Walker" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = app
        .request(
            Method::POST,
            "/mobile/onboard",
            Some(&token),
            Some(json!({
                "eventId": event.id,
                "firstName": "Bob",
                "lastName": "Walker",
                "email": "bob@example.com",
                "phone": "08033334444",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["participant"]["name"], "Bob Walker");
    assert_eq!(body["attendance"]["signedBy"], staff.full_name);

    let uri = format!("/mobile/participants/{}", event.id);
    let (status, body) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["participants"][0]["eventName"], "Annual Tech Summit");
}

#[tokio::test]
async fn test_qr_and_flyer_images() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let participant = app.register_participant(event.id).await;
    let (_, token) = app.login_as(Role::Admin).await;

    let uri = format!("/participants/{}/qr", participant.id);
    let (status, headers, bytes) = app.request_raw(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

    let uri = format!("/participants/{}/flyer", participant.id);
    let (status, headers, bytes) = app.request_raw(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains(&participant.id.to_string()));
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

    let (status, _, _) = app.request_raw(Method::GET, "/participants/bogus/qr", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_event_lifecycle() {
    let app = TestApp::new();
    let (_, token) = app.login_as(Role::Admin).await;
    let draft = serde_json::to_value(event_draft("tech-2030")).unwrap();

    let (status, body) = app.request(Method::POST, "/admin/events", Some(&token), Some(draft.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = body["event"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.request(Method::POST, "/admin/events", Some(&token), Some(draft.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_SLUG");

    let mut renamed = draft;
    renamed["name"] = json!("Renamed Tech Summit");
    let uri = format!("/admin/events/{}", event_id);
    let (status, body) = app.request(Method::PUT, &uri, Some(&token), Some(renamed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["name"], "Renamed Tech Summit");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request(Method::GET, "/events/slug/tech-2030", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_event_keeps_participants() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let participant = app.register_participant(event.id).await;
    let (_, token) = app.login_as(Role::Admin).await;

    let uri = format!("/admin/events/{}", event.id);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let kept = app.state.services.participants.get_by_id(participant.id).await.unwrap();
    assert_eq!(kept.event_id, event.id);

    let (status, body) = app.request(Method::GET, "/admin/participants", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["participants"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], participant.id.to_string());
    assert!(listed[0]["eventName"].is_null());
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let (_, token) = app.login_as(Role::Admin).await;

    let uri = format!("/register/{}", event.slug);
    let (status, body) = app.request_text(Method::POST, &uri, None, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .request(Method::POST, "/attendance", Some(&token), Some(json!({ "qrData": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("eventId"));

    let (status, body) = app
        .request(Method::GET, "/attendance?eventId=x&attendanceDate=not-a-date", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = TestApp::new();
    let (admin, token) = app.login_as(Role::Admin).await;

    let uri = format!("/admin/users/{}", admin.id);
    let (status, body) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot delete your own account.");
}

#[tokio::test]
async fn test_follow_up_rejects_bad_survey_link() {
    let app = TestApp::new();
    let event = app.create_event().await;
    let (_, token) = app.login_as(Role::Admin).await;

    let uri = format!("/admin/events/{}/notifications/follow-up", event.id);
    let (status, body) = app
        .request(Method::POST, &uri, Some(&token), Some(json!({ "surveyLink": "not a url" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Survey link must be a valid absolute URL.");

    let (status, body) = app
        .request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "image": { "filename": "a.pdf", "contentType": "application/pdf", "dataBase64": "AAAA" } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Attachment must be an image.");
}
