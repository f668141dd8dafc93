use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{BookingError, BookingStatus, CreateBookingRequest};
use booking_cell::services::BookingService;
use identity_cell::IdentityError;
use shared_config::AppConfig;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn config_for(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_store_url(&mock_server.uri()).to_app_config()
}

fn slot_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn known_patient_request(patient_id: Uuid, doctor_id: Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        date: slot_date(),
        time: "10:00".to_string(),
        doctor: doctor_id,
        patient: Some(patient_id),
        email: None,
        phone: None,
        full_name: None,
        age: None,
        address: None,
        issue: Some("Persistent cough".to_string()),
    }
}

async fn mount_free_slot(mock_server: &MockServer, doctor_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2025-06-01"))
        .and(query_param("time", "eq.10:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn create_booking_with_known_patient_books_free_slot() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let booking_id = Uuid::new_v4();

    mount_free_slot(&mock_server, doctor_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(body_partial_json(json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": "2025-06-01",
            "time": "10:00",
            "status": "pending",
            "issue": "Persistent cough"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::booking_row(booking_id, patient_id, doctor_id, "2025-06-01", "10:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let result = service
        .create_booking(known_patient_request(patient_id, doctor_id))
        .await;

    let booking = result.expect("booking should be created");
    assert_eq!(booking.id, booking_id);
    assert_eq!(booking.patient_id, patient_id);
    assert_eq!(booking.doctor_id, doctor_id);
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn create_booking_rejects_same_patient_duplicate() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::booking_row(Uuid::new_v4(), patient_id, doctor_id, "2025-06-01", "10:00")
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let result = service
        .create_booking(known_patient_request(patient_id, doctor_id))
        .await;

    assert_matches!(result, Err(BookingError::DuplicateBooking));
}

#[tokio::test]
async fn create_booking_rejects_slot_held_by_other_patient() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let other_patient = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::booking_row(Uuid::new_v4(), other_patient, doctor_id, "2025-06-01", "10:00")
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let result = service
        .create_booking(known_patient_request(patient_id, doctor_id))
        .await;

    assert_matches!(result, Err(BookingError::SlotTaken));
}

#[tokio::test]
async fn create_booking_resolves_walk_in_contact_to_new_identity() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let new_patient = Uuid::new_v4();
    let booking_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.walkin@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/identities"))
        .and(body_partial_json(json!({
            "email": "walkin@example.com",
            "full_name": "Walk In",
            "role": "patient"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::patient_row(new_patient, "walkin@example.com")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_free_slot(&mock_server, doctor_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(body_partial_json(json!({ "patient_id": new_patient })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::booking_row(booking_id, new_patient, doctor_id, "2025-06-01", "10:00")
        ])))
        .mount(&mock_server)
        .await;

    let request = CreateBookingRequest {
        date: slot_date(),
        time: "10:00".to_string(),
        doctor: doctor_id,
        patient: None,
        email: Some("Walkin@Example.com ".to_string()),
        phone: None,
        full_name: Some("Walk In".to_string()),
        age: Some(42),
        address: None,
        issue: None,
    };

    let service = BookingService::new(&config_for(&mock_server));
    let booking = service
        .create_booking(request)
        .await
        .expect("walk-in booking should be created");

    assert_eq!(booking.patient_id, new_patient);
}

#[tokio::test]
async fn create_booking_without_contact_fails_validation() {
    let mock_server = MockServer::start().await;

    let request = CreateBookingRequest {
        date: slot_date(),
        time: "10:00".to_string(),
        doctor: Uuid::new_v4(),
        patient: None,
        email: None,
        phone: None,
        full_name: Some("No Contact".to_string()),
        age: None,
        address: None,
        issue: None,
    };

    let service = BookingService::new(&config_for(&mock_server));
    let result = service.create_booking(request).await;

    assert_matches!(
        result,
        Err(BookingError::Identity(IdentityError::MissingContact))
    );
}

#[tokio::test]
async fn slot_checker_reports_taken_and_free_slots() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("time", "eq.4:30 PM"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::booking_row(Uuid::new_v4(), Uuid::new_v4(), doctor_id, "2025-06-01", "4:30 PM")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("time", "eq.10:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));

    let taken = service
        .slots()
        .is_available(doctor_id, slot_date(), "4:30 PM")
        .await
        .unwrap();
    let free = service
        .slots()
        .is_available(doctor_id, slot_date(), "10:00")
        .await
        .unwrap();

    assert!(!taken);
    assert!(free);
}

#[tokio::test]
async fn user_bookings_listing_allows_empty_result() {
    let mock_server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("patient_id", format!("eq.{}", user_id)))
        .and(query_param("order", "date.desc,time.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let bookings = service.list_user_bookings(user_id).await.unwrap();

    assert!(bookings.is_empty());
}

#[tokio::test]
async fn doctor_bookings_listing_rejects_empty_schedule() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let result = service.list_doctor_bookings(doctor_id).await;

    assert_matches!(result, Err(BookingError::NoBookings));
}

#[tokio::test]
async fn update_booking_patches_fields_and_keeps_id() {
    let mock_server = MockServer::start().await;
    let booking_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    let mut updated = MockStoreResponses::booking_row(
        booking_id, patient_id, doctor_id, "2025-06-01", "10:00",
    );
    updated["status"] = json!("confirmed");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .and(body_partial_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .mount(&mock_server)
        .await;

    let mut fields = serde_json::Map::new();
    fields.insert("status".to_string(), json!("confirmed"));
    // Callers cannot re-point a booking at another record.
    fields.insert("id".to_string(), json!(Uuid::new_v4()));

    let service = BookingService::new(&config_for(&mock_server));
    let booking = service.update_booking(booking_id, fields).await.unwrap();

    assert_eq!(booking.id, booking_id);
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn update_missing_booking_reports_not_found() {
    let mock_server = MockServer::start().await;
    let booking_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let mut fields = serde_json::Map::new();
    fields.insert("status".to_string(), json!("cancelled"));

    let service = BookingService::new(&config_for(&mock_server));
    let result = service.update_booking(booking_id, fields).await;

    assert_matches!(result, Err(BookingError::NotFound));
}

#[tokio::test]
async fn delete_missing_booking_reports_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let result = service.delete_booking(Uuid::new_v4()).await;

    assert_matches!(result, Err(BookingError::NotFound));
}

#[tokio::test]
async fn booking_id_lookup_finds_pair_match() {
    let mock_server = MockServer::start().await;
    let booking_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::booking_row(booking_id, patient_id, doctor_id, "2025-06-01", "10:00")
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config_for(&mock_server));
    let found = service.find_booking_id(patient_id, doctor_id).await.unwrap();

    assert_eq!(found, booking_id);
}
