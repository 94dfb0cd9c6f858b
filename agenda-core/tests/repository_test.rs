mod common;

use std::time::Duration;

use agenda_core::AgendaError;
use agenda_core::calendar::{CalendarView, Navigation, ViewMode};
use agenda_core::filter::LocationFilter;
use agenda_core::location::Location;
use agenda_core::meeting::{MeetingDraft, parse_clock, parse_day};
use agenda_core::repository::{MeetingRepository, RefreshOutcome};
use agenda_core::session::AuthState;
use agenda_core::user::Role;
use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use chrono_tz::Tz;
use common::{FakeBackend, TOKEN, meeting_json, session_with};
use serde_json::json;

fn today() -> NaiveDate {
    // A Wednesday; the window runs Mon 2025-01-13 .. Sun 2025-01-26.
    parse_day("2025-01-15").unwrap()
}

async fn seeded() -> FakeBackend {
    let backend = FakeBackend::start().await;
    backend.with(|s| {
        s.meetings = vec![
            meeting_json(1, "Kickoff", 1, "sala-wit", "2025-01-13T09:00:00.000Z", "2025-01-13T10:00:00.000Z"),
            meeting_json(2, "Demo", 7, "virtual", "2025-01-14T10:00:00.000Z", "2025-01-14T11:00:00.000Z"),
            meeting_json(3, "Review", 2, "presencial", "2025-01-13T08:00:00.000Z", "2025-01-13T08:30:00.000Z"),
            meeting_json(4, "Later", 1, "virtual", "2025-01-27T09:00:00.000Z", "2025-01-27T10:00:00.000Z"),
        ];
    });
    backend
}

fn repository(backend: &FakeBackend, role: Role) -> MeetingRepository {
    let gateway = backend.gateway(session_with(TOKEN, role));
    MeetingRepository::new(gateway, Tz::UTC, CalendarView::starting(today(), ViewMode::MultiDay))
}

fn draft(executive: &str) -> MeetingDraft {
    MeetingDraft {
        title: "  Planning ".into(),
        client: "Globex".into(),
        executive: executive.into(),
        collaborator: None,
        location: Location::Presencial,
        date: parse_day("2025-01-16").unwrap(),
        start_time: parse_clock("11:00").unwrap(),
        end_time: parse_clock("12:00").unwrap(),
        attendees: None,
    }
}

#[tokio::test]
async fn refresh_loads_users_then_window() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);

    assert_eq!(repo.refresh().await.unwrap(), RefreshOutcome::Applied);

    assert_eq!(
        backend.request_paths(),
        vec!["GET /users".to_string(), "GET /meetings".to_string()]
    );
    let query = &backend.requests_to(Method::GET, "/meetings")[0].query;
    assert_eq!(query["startDate"], "2025-01-13T00:00:00.000Z");
    assert_eq!(query["endDate"], "2025-01-26T23:59:59.999Z");
    assert!(!query.contains_key("location"));

    let ids: Vec<String> = repo.all_meetings().into_iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&"4".to_string()));
}

#[tokio::test]
async fn unknown_executive_gets_placeholder_name() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();

    let demo = repo.find("2").unwrap();
    assert_eq!(demo.executive.name, "Ejecutivo 7");
    assert_eq!(demo.executive.id, Some(7));

    let kickoff = repo.find("1").unwrap();
    assert_eq!(kickoff.executive.name, "Ana Rojas");
    assert_eq!(kickoff.start_time(), "09:00");
}

#[tokio::test]
async fn results_envelope_is_accepted() {
    let backend = seeded().await;
    backend.with(|s| s.wrap_results = true);
    let repo = repository(&backend, Role::User);

    repo.refresh().await.unwrap();
    assert_eq!(repo.all_meetings().len(), 3);
    assert_eq!(repo.users().users().len(), 3);
}

#[tokio::test]
async fn day_buckets_follow_filters() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();

    let buckets = repo.day_buckets();
    assert_eq!(buckets.len(), 10);
    assert_eq!(buckets[0].0, parse_day("2025-01-13").unwrap());
    let monday: Vec<&str> = buckets[0].1.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(monday, vec!["Review", "Kickoff"]);

    repo.set_executive(Some("Ana Rojas".into()));
    let visible: Vec<String> = repo.visible_meetings().into_iter().map(|m| m.id).collect();
    assert_eq!(visible, vec!["1".to_string()]);

    repo.set_mode(ViewMode::SingleDay);
    let single = repo.day_buckets();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].0, parse_day("2025-01-13").unwrap());
    assert_eq!(single[0].1.len(), 1);
}

#[tokio::test]
async fn location_choice_is_sent_to_server() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);

    repo.set_location(LocationFilter::Only(Location::Virtual)).await.unwrap();

    let query = &backend.requests_to(Method::GET, "/meetings")[0].query;
    assert_eq!(query["location"], "virtual");
    let titles: Vec<String> = repo.all_meetings().into_iter().map(|m| m.title).collect();
    assert_eq!(titles, vec!["Demo".to_string()]);
}

#[tokio::test]
async fn room_account_is_pinned_to_room() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::SalaWit);

    repo.set_location(LocationFilter::Only(Location::Virtual)).await.unwrap();

    assert_eq!(repo.effective_location(), LocationFilter::Only(Location::SalaWit));
    let query = &backend.requests_to(Method::GET, "/meetings")[0].query;
    assert_eq!(query["location"], "sala-wit");
    assert!(repo.visible_meetings().iter().all(|m| m.location == Location::SalaWit));
}

#[tokio::test]
async fn room_account_cannot_create() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::SalaWit);

    let err = repo.create(&draft("Ana Rojas")).await.unwrap_err();

    assert!(matches!(err, AgendaError::Validation(_)));
    assert!(backend.requests_to(Method::POST, "/meetings").is_empty());
}

#[tokio::test]
async fn create_sends_ids_and_refetches() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();

    let outcome = repo.create(&draft("Bruno Díaz")).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Applied);

    let sent = backend.requests_to(Method::POST, "/meetings");
    let body = sent[0].body.as_ref().unwrap();
    assert_eq!(body["title"], "Planning");
    assert_eq!(body["executive_id"], 2);
    assert_eq!(body["location"], "presencial");
    assert_eq!(body["start_at"], "2025-01-16T11:00:00Z");
    assert!(body.get("collaborator_id").is_none());

    let paths = backend.request_paths();
    assert_eq!(&paths[paths.len() - 3..], &["POST /meetings", "GET /users", "GET /meetings"]);

    let created = repo
        .all_meetings()
        .into_iter()
        .find(|m| m.title == "Planning")
        .unwrap();
    assert_eq!(created.executive.name, "Bruno Díaz");
}

#[tokio::test]
async fn conflict_leaves_cached_list_untouched() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();
    let before = repo.all_meetings();
    backend.with(|s| s.conflict = true);

    let err = repo.create(&draft("Ana Rojas")).await.unwrap_err();

    match err {
        AgendaError::TimeConflict { message, conflicts } => {
            assert_eq!(message, "La sala ya está reservada");
            assert_eq!(conflicts, vec![json!({"id": 1})]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(repo.all_meetings(), before);
    assert_eq!(backend.request_paths().last().unwrap(), "POST /meetings");
}

#[tokio::test]
async fn server_validation_message_is_surfaced() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();

    let err = repo.create(&draft("Nadie Conocido")).await.unwrap_err();

    match err {
        AgendaError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "executive_id es obligatorio");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_title_is_rejected_locally() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);

    let mut untitled = draft("Ana Rojas");
    untitled.title = "   ".into();
    let err = repo.create(&untitled).await.unwrap_err();

    assert!(matches!(err, AgendaError::Validation(_)));
    assert!(backend.request_paths().is_empty());
}

#[tokio::test]
async fn update_and_delete_refetch() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();

    let mut edit = MeetingDraft::from_meeting(&repo.find("1").unwrap());
    edit.title = "Kickoff v2".into();
    repo.update("1", &edit).await.unwrap();

    let sent = backend.requests_to(Method::PUT, "/meetings/1");
    assert_eq!(sent[0].body.as_ref().unwrap()["executive_id"], 1);
    assert_eq!(repo.find("1").unwrap().title, "Kickoff v2");

    repo.delete("1").await.unwrap();
    assert!(repo.find("1").is_none());
    assert_eq!(backend.request_paths().last().unwrap(), "GET /meetings");
}

#[tokio::test]
async fn deleting_missing_meeting_keeps_list() {
    let backend = seeded().await;
    let repo = repository(&backend, Role::User);
    repo.refresh().await.unwrap();

    let err = repo.delete("999").await.unwrap_err();

    assert!(matches!(err, AgendaError::Api { status: 404, .. }));
    assert_eq!(repo.all_meetings().len(), 3);
}

#[tokio::test]
async fn slow_response_for_old_window_is_dropped() {
    let backend = seeded().await;
    backend.with(|s| s.slow_window = Some(("2025-01-13".into(), Duration::from_millis(400))));
    let repo = repository(&backend, Role::User);

    let (first, second) = tokio::join!(repo.refresh(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        repo.navigate(Navigation::Next, today()).await
    });

    assert_eq!(first.unwrap(), RefreshOutcome::Superseded);
    assert_eq!(second.unwrap(), RefreshOutcome::Applied);
    assert_eq!(repo.view().anchor(), parse_day("2025-01-20").unwrap());

    let titles: Vec<String> = repo.all_meetings().into_iter().map(|m| m.title).collect();
    assert_eq!(titles, vec!["Later".to_string()]);
}

#[tokio::test]
async fn navigating_off_the_calendar_fetches_nothing() {
    let backend = seeded().await;
    let gateway = backend.gateway(session_with(TOKEN, Role::User));
    let repo = MeetingRepository::new(gateway, Tz::UTC, CalendarView::at(NaiveDate::MAX, ViewMode::MultiDay));

    let err = repo.navigate(Navigation::Next, today()).await.unwrap_err();

    assert!(matches!(err, AgendaError::Validation(_)));
    assert_eq!(repo.view().anchor(), NaiveDate::MAX);
    assert!(backend.request_paths().is_empty());
}

#[tokio::test]
async fn rejected_token_logs_out_during_refresh() {
    let backend = seeded().await;
    let gateway = backend.gateway(session_with("revoked", Role::User));
    let session = gateway.session().clone();
    let repo = MeetingRepository::new(gateway, Tz::UTC, CalendarView::starting(today(), ViewMode::MultiDay));

    let err = repo.refresh().await.unwrap_err();

    assert!(matches!(err, AgendaError::SessionExpired));
    assert_eq!(session.auth_state(), AuthState::Unauthenticated);
    assert!(repo.all_meetings().is_empty());
}

#[tokio::test]
async fn executive_names_fall_back_to_meetings() {
    let backend = seeded().await;
    backend.with(|s| {
        s.users_status = Some(StatusCode::INTERNAL_SERVER_ERROR);
        s.meetings[2]["executive"] = json!({"id": 9, "name": "Carla Soto"});
    });
    let repo = repository(&backend, Role::User);

    assert_eq!(repo.refresh().await.unwrap(), RefreshOutcome::Applied);

    assert!(repo.users().is_empty());
    assert_eq!(
        repo.executive_names(),
        vec!["Carla Soto".to_string(), "Ejecutivo 1".to_string(), "Ejecutivo 7".to_string()]
    );
}

#[tokio::test]
async fn santiago_window_is_sent_in_utc() {
    let backend = seeded().await;
    let gateway = backend.gateway(session_with(TOKEN, Role::User));
    let repo = MeetingRepository::new(
        gateway,
        Tz::America__Santiago,
        CalendarView::starting(today(), ViewMode::MultiDay),
    );

    repo.refresh().await.unwrap();

    let query = &backend.requests_to(Method::GET, "/meetings")[0].query;
    assert_eq!(query["startDate"], "2025-01-13T03:00:00.000Z");
    assert_eq!(query["endDate"], "2025-01-27T02:59:59.999Z");

    let kickoff = repo.find("1").unwrap();
    assert_eq!(kickoff.start_time(), "06:00");
}
