use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ecodeli_core::features::admin::courier_detail::fetch_admin_courier_detail;
use ecodeli_core::features::admin::couriers::fetch_admin_couriers;
use ecodeli_core::features::admin::dashboard::fetch_admin_dashboard;
use ecodeli_core::features::admin::invoices::fetch_admin_invoices;
use ecodeli_core::features::client::dashboard::fetch_client_dashboard;
use ecodeli_core::features::client::deliveries::{
    fetch_client_deliveries, fetch_client_delivery_detail,
};
use ecodeli_core::features::client::payments::{
    fetch_client_payment_detail, fetch_client_payments, ClientPaymentStatus,
};
use ecodeli_core::features::client::fetch_client_announcement_detail;
use ecodeli_core::features::courier::announcements::{
    fetch_courier_available_announcements, take_over_announcement,
};
use ecodeli_core::features::courier::{
    advance_courier_delivery, fetch_courier_deliveries, DeliveryStatus,
};
use ecodeli_core::features::merchant::announcements::{
    create_home_delivery_announcement, fetch_merchant_announcements, FormField,
    HomeDeliveryError, MerchantAnnouncementStatus, MerchantHomeDeliveryFormValues,
};
use ecodeli_core::features::merchant::fetch_merchant_contract;
use ecodeli_core::features::provider::{
    confirm_assignment, create_unavailability, AssignmentConfirmation, Recurrence,
    UnavailabilityError, UnavailabilityRequest,
};
use ecodeli_core::{
    fetch_notification_activity, fetch_notification_feed, ApiClient, ApiError, ApiResult,
    ApiTransport, NotificationRole, Severity,
};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct Call {
    method: &'static str,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

struct Route {
    method: &'static str,
    path: String,
    status_filter: Option<&'static str>,
    response: ApiResult<Value>,
}

/// In-memory transport answering canned responses; unknown routes answer 404.
#[derive(Default)]
struct FakeTransport {
    routes: Vec<Route>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    fn on(mut self, method: &'static str, path: &str, response: ApiResult<Value>) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            status_filter: None,
            response,
        });
        self
    }

    fn on_status(mut self, path: &str, status: &'static str, response: ApiResult<Value>) -> Self {
        self.routes.push(Route {
            method: "GET",
            path: path.to_string(),
            status_filter: Some(status),
            response,
        });
        self
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body: body.cloned(),
        });
        let status = query
            .iter()
            .find(|(key, _)| key == "status")
            .map(|(_, value)| value.as_str());
        self.routes
            .iter()
            .find(|route| {
                route.method == method && route.path == path && route.status_filter == status
            })
            .map(|route| route.response.clone())
            .unwrap_or_else(|| Err(ApiError::status(404, "")))
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        self.respond("GET", path, query, None)
    }

    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.respond("POST", path, &[], Some(body))
    }

    async fn patch(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.respond("PATCH", path, &[], Some(body))
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 9, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn courier_feed_maps_severity_and_relative_time() {
    let transport = FakeTransport::default().on(
        "GET",
        "/courier/notifications",
        Ok(json!({
            "content": [
                {
                    "id": 1,
                    "title": "Retard",
                    "severity": "warn",
                    "createdAt": "2025-12-09T11:30:00Z"
                },
                { "id": 2, "message": "Paiement reçu", "level": "unknown" }
            ],
            "totalElements": 2
        })),
    );
    let client = ApiClient::new(transport);

    let items = fetch_notification_feed(&client, NotificationRole::Courier, now())
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].severity, Some(Severity::Warning));
    assert_eq!(items[0].timestamp, "Il y a 30 min");
    assert!(items[1].severity.is_none());
    assert_eq!(items[1].title, "Notification EcoDeli");

    let calls = client.transport().calls();
    assert!(calls[0]
        .query
        .contains(&("sort".to_string(), "createdAt,desc".to_string())));
}

#[tokio::test]
async fn feed_failure_is_localized() {
    let transport =
        FakeTransport::default().on("GET", "/merchant/notifications", Err(ApiError::Timeout));
    let client = ApiClient::new(transport);

    let err = fetch_notification_feed(&client, NotificationRole::Merchant, now())
        .await
        .unwrap_err();
    assert_eq!(err.message, NotificationRole::Merchant.feed_failure_message());
    assert_eq!(err.source, ApiError::Timeout);
}

#[tokio::test]
async fn missing_activity_endpoint_is_empty_except_for_admin() {
    let client = ApiClient::new(FakeTransport::default());

    let activity = fetch_notification_activity(&client, NotificationRole::Courier, now())
        .await
        .unwrap();
    assert!(activity.is_empty());

    let err = fetch_notification_activity(&client, NotificationRole::Admin, now())
        .await
        .unwrap_err();
    assert!(err.source.is_not_found());
}

#[tokio::test]
async fn admin_invoices_degrade_failed_slices_to_empty() {
    let transport = FakeTransport::default()
        .on(
            "GET",
            "/admin/invoices",
            Ok(json!([
                { "id": 1, "amount": 100.0, "status": "PAID" },
                { "id": 2, "amount": 40.0, "status": "LATE", "overdueDays": 3 }
            ])),
        )
        .on("GET", "/admin/payments", Err(ApiError::Transport("reset".to_string())));
    let client = ApiClient::new(transport);

    let data = fetch_admin_invoices(&client, now()).await;
    assert_eq!(data.invoices.len(), 2);
    assert!(data.payment_activity.is_empty());
    assert_eq!(data.stats[2].value, "1");
    assert_eq!(client.transport().calls().len(), 2);
}

#[tokio::test]
async fn admin_couriers_counts_use_status_filters() {
    let transport = FakeTransport::default()
        .on(
            "GET",
            "/admin/couriers",
            Ok(json!({ "content": [{ "id": 5, "fullName": "Lina Roche", "status": "PENDING" }] })),
        )
        .on_status("/admin/couriers", "PENDING", Ok(json!({ "content": [{}], "totalElements": 7 })))
        .on_status("/admin/couriers", "APPROVED", Err(ApiError::Timeout))
        .on_status("/admin/couriers", "REJECTED", Ok(json!({ "content": [], "totalElements": 2 })))
        .on_status(
            "/admin/courier-documents",
            "PENDING",
            Ok(json!({ "content": [{ "id": "D-1" }] })),
        );
    let client = ApiClient::new(transport);

    let data = fetch_admin_couriers(&client, now()).await;
    assert_eq!(data.couriers.len(), 1);
    assert_eq!(data.metrics[0].value, "7");
    assert_eq!(data.metrics[1].value, "0");
    assert_eq!(data.metrics[2].value, "2");
    assert_eq!(data.validation_activity.len(), 1);
    assert_eq!(client.transport().calls().len(), 5);
}

#[tokio::test]
async fn courier_list_sends_status_filter() {
    let transport = FakeTransport::default().on_status(
        "/deliveries",
        "IN_TRANSIT",
        Ok(json!([{ "id": 9, "status": "IN_TRANSIT", "priceCents": 1250 }])),
    );
    let client = ApiClient::new(transport);

    let deliveries = fetch_courier_deliveries(&client, DeliveryStatus::InTransit)
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].earnings, 12.5);
}

#[tokio::test]
async fn advancing_a_delivery_patches_the_next_status() {
    let transport = FakeTransport::default()
        .on("GET", "/deliveries/7", Ok(json!({ "id": 7, "status": "ACCEPTED" })))
        .on(
            "PATCH",
            "/deliveries/7/status",
            Ok(json!({ "id": 7, "status": "PICKED_UP" })),
        );
    let client = ApiClient::new(transport);

    let detail = advance_courier_delivery(&client, "7").await.unwrap();
    assert_eq!(detail.delivery.status, DeliveryStatus::PickedUp);

    let patch = client
        .transport()
        .calls()
        .into_iter()
        .find(|call| call.method == "PATCH")
        .unwrap();
    assert_eq!(patch.body, Some(json!("PICKED_UP")));
}

#[tokio::test]
async fn delivered_missions_are_not_patched() {
    let transport = FakeTransport::default().on(
        "GET",
        "/deliveries/8",
        Ok(json!({ "id": 8, "status": "DELIVERED" })),
    );
    let client = ApiClient::new(transport);

    let detail = advance_courier_delivery(&client, "8").await.unwrap();
    assert_eq!(detail.delivery.status, DeliveryStatus::Delivered);
    assert!(client
        .transport()
        .calls()
        .iter()
        .all(|call| call.method == "GET"));
}

#[tokio::test]
async fn unknown_delivery_cannot_advance() {
    let client = ApiClient::new(FakeTransport::default());
    let err = advance_courier_delivery(&client, "404").await.unwrap_err();
    assert!(err.source.is_not_found());
}

#[tokio::test]
async fn missing_announcement_is_none() {
    let client = ApiClient::new(FakeTransport::default());
    let detail = fetch_client_announcement_detail(&client, "12").await.unwrap();
    assert!(detail.is_none());
}

#[tokio::test]
async fn empty_detail_body_is_none() {
    let transport = FakeTransport::default().on("GET", "/announcements/13", Ok(Value::Null));
    let client = ApiClient::new(transport);
    let detail = fetch_client_announcement_detail(&client, "13").await.unwrap();
    assert!(detail.is_none());
}

#[tokio::test]
async fn confirmation_body_skips_absent_fields() {
    let transport =
        FakeTransport::default().on("POST", "/assignments/3/confirm", Ok(Value::Null));
    let client = ApiClient::new(transport);

    let confirmation = AssignmentConfirmation::new("Je serai là", None);
    confirm_assignment(&client, "3", &confirmation).await.unwrap();

    let calls = client.transport().calls();
    assert_eq!(calls[0].body, Some(json!({ "message": "Je serai là" })));
}

#[tokio::test]
async fn unavailability_rejects_inverted_window_before_any_request() {
    let client = ApiClient::new(FakeTransport::default());
    let request = UnavailabilityRequest {
        start_at: now(),
        end_at: now(),
        reason: String::new(),
        recurrence: Recurrence::None,
    };

    let err = create_unavailability(&client, "P-1", &request)
        .await
        .unwrap_err();
    assert!(matches!(err, UnavailabilityError::EndNotAfterStart));
    assert!(client.transport().calls().is_empty());
}

#[tokio::test]
async fn merchant_without_contracts_has_none() {
    let transport =
        FakeTransport::default().on("GET", "/merchants/me/contracts", Ok(json!([])));
    let client = ApiClient::new(transport);
    assert!(fetch_merchant_contract(&client).await.unwrap().is_none());
}

fn has_query(call: &Call, key: &str, value: &str) -> bool {
    call.query.contains(&(key.to_string(), value.to_string()))
}

#[tokio::test]
async fn admin_dashboard_renders_with_a_failed_slice() {
    let transport = FakeTransport::default()
        .on_status(
            "/admin/couriers",
            "PENDING",
            Ok(json!({ "content": [{ "id": 5, "fullName": "Lina Roche" }], "totalElements": 7 })),
        )
        .on_status("/admin/couriers", "APPROVED", Err(ApiError::Timeout))
        .on_status(
            "/admin/deliveries",
            "IN_PROGRESS",
            Ok(json!({
                "content": [
                    { "id": 1, "status": "DELAYED", "reference": "LIV-1" },
                    { "id": 2, "status": "IN_PROGRESS" }
                ],
                "totalElements": 12
            })),
        )
        .on_status("/admin/invoices", "DUE", Ok(json!([{ "id": 1, "amount": 120.0 }])))
        .on(
            "GET",
            "/admin/announcements",
            Ok(json!([{ "id": 3, "title": "Campagne Noël" }])),
        );
    let client = ApiClient::new(transport);

    let data = fetch_admin_dashboard(&client).await;
    assert_eq!(data.stats[0].value, "7");
    assert_eq!(data.stats[1].value, "0");
    assert_eq!(data.stats[2].value, "12");
    assert_eq!(data.pending_couriers[0].name, "Lina Roche");
    assert_eq!(data.global_alerts.len(), 1);
    assert_eq!(data.global_alerts[0].label, "LIV-1");
    assert_eq!(data.activity_items[0].title, "Campagne Noël");

    let calls = client.transport().calls();
    assert_eq!(calls.len(), 5);
    let pending = calls
        .iter()
        .find(|call| has_query(call, "status", "PENDING"))
        .unwrap();
    assert!(has_query(pending, "sort", "submittedAt,desc"));
}

#[tokio::test]
async fn courier_detail_with_placeholder_id_sends_nothing() {
    let client = ApiClient::new(FakeTransport::default());

    let detail = fetch_admin_courier_detail(&client, "unknown").await;
    assert!(detail.profile.is_none());
    assert!(detail.documents.is_empty());
    assert!(detail.activity.is_empty());
    assert!(client.transport().calls().is_empty());
}

#[tokio::test]
async fn courier_detail_joins_profile_documents_and_activity() {
    let transport = FakeTransport::default()
        .on("GET", "/admin/couriers/5", Ok(json!({ "id": 5, "fullName": "Lina Roche" })))
        .on(
            "GET",
            "/admin/courier-documents",
            Ok(json!([{ "id": "D-1", "documentType": "ID_CARD", "status": "PENDING" }])),
        )
        .on("GET", "/notifications", Err(ApiError::Timeout));
    let client = ApiClient::new(transport);

    let detail = fetch_admin_courier_detail(&client, " 5 ").await;
    assert_eq!(detail.profile.unwrap().name, "Lina Roche");
    assert_eq!(detail.documents.len(), 1);
    assert!(detail.activity.is_empty());

    let calls = client.transport().calls();
    assert_eq!(calls.len(), 3);
    let documents = calls
        .iter()
        .find(|call| call.path == "/admin/courier-documents")
        .unwrap();
    assert!(has_query(documents, "courierUserId", "5"));
}

#[tokio::test]
async fn client_dashboard_fails_only_when_every_slice_fails() {
    let client = ApiClient::new(FakeTransport::default());

    let err = fetch_client_dashboard(&client).await.unwrap_err();
    assert_eq!(err.message, "Impossible de charger votre tableau de bord");
    assert!(err.source.is_not_found());
    assert_eq!(client.transport().calls().len(), 3);
}

#[tokio::test]
async fn client_dashboard_keeps_the_slices_that_loaded() {
    let transport = FakeTransport::default()
        .on(
            "GET",
            "/deliveries",
            Ok(json!([
                { "id": 1, "status": "IN_TRANSIT", "title": "Colis Lyon" },
                { "id": 2, "status": "DELIVERED" }
            ])),
        )
        .on(
            "GET",
            "/invoices",
            Ok(json!({ "content": [{ "id": 1, "status": "due", "amountCents": 2500 }] })),
        );
    let client = ApiClient::new(transport);

    let data = fetch_client_dashboard(&client).await.unwrap();
    let values: Vec<&str> = data.stats.iter().map(|card| card.value.as_str()).collect();
    assert_eq!(values, vec!["0", "1", "1"]);
    assert!(data.announcements.is_empty());
    assert_eq!(data.deliveries[0].title, "Colis Lyon");
    assert_eq!(data.payments.len(), 1);

    let calls = client.transport().calls();
    let announcements = calls
        .iter()
        .find(|call| call.path == "/announcements")
        .unwrap();
    assert!(has_query(announcements, "mine", "true"));
    assert!(has_query(announcements, "sort", "createdAt,desc"));
}

#[tokio::test]
async fn client_deliveries_list_own_deliveries() {
    let transport = FakeTransport::default().on(
        "GET",
        "/deliveries",
        Ok(json!([{
            "id": 31,
            "status": "DELIVERED",
            "fromAddress": { "city": "Paris", "postalCode": "75011" },
            "priceCents": 2450
        }])),
    );
    let client = ApiClient::new(transport);

    let deliveries = fetch_client_deliveries(&client).await.unwrap();
    assert_eq!(deliveries[0].origin, "Paris 75011");
    assert_eq!(deliveries[0].estimated_time, "Livré");
    assert_eq!(deliveries[0].price, 24.5);

    let calls = client.transport().calls();
    assert!(has_query(&calls[0], "mine", "true"));
    assert!(has_query(&calls[0], "sort", "deliveryDate,desc"));
}

#[tokio::test]
async fn client_delivery_detail_is_none_when_missing() {
    let client = ApiClient::new(FakeTransport::default());
    assert!(fetch_client_delivery_detail(&client, "77").await.unwrap().is_none());

    let transport = FakeTransport::default().on(
        "GET",
        "/deliveries/78",
        Ok(json!({ "id": 78, "status": "PICKED_UP" })),
    );
    let client = ApiClient::new(transport);
    let detail = fetch_client_delivery_detail(&client, "78").await.unwrap().unwrap();
    assert_eq!(detail.status, DeliveryStatus::PickedUp);
    assert_eq!(detail.timeline.len(), 4);
}

#[tokio::test]
async fn client_payments_and_detail() {
    let transport = FakeTransport::default()
        .on(
            "GET",
            "/invoices",
            Ok(json!([
                { "id": 4, "status": "paid", "amountCents": 1800 },
                { "id": 5, "status": "pending" }
            ])),
        )
        .on(
            "GET",
            "/invoices/4",
            Ok(json!({ "id": 4, "amountCents": 1800, "serviceFeeCents": 180 })),
        );
    let client = ApiClient::new(transport);

    let payments = fetch_client_payments(&client).await.unwrap();
    assert_eq!(payments[0].status, ClientPaymentStatus::Paid);
    assert_eq!(payments[1].status, ClientPaymentStatus::Processing);

    let detail = fetch_client_payment_detail(&client, "4").await.unwrap().unwrap();
    assert_eq!(detail.total, 19.8);
    assert!(fetch_client_payment_detail(&client, "9").await.unwrap().is_none());
}

#[tokio::test]
async fn client_payments_failure_is_localized() {
    let transport = FakeTransport::default().on("GET", "/invoices", Err(ApiError::Timeout));
    let client = ApiClient::new(transport);

    let err = fetch_client_payments(&client).await.unwrap_err();
    assert_eq!(err.message, "Impossible de récupérer vos paiements");
    assert_eq!(err.source, ApiError::Timeout);
}

fn home_delivery_form() -> MerchantHomeDeliveryFormValues {
    MerchantHomeDeliveryFormValues {
        campaign_name: "Opération Noël".to_string(),
        reference: "XMAS-P15".to_string(),
        pickup_address: "12 rue du Commerce".to_string(),
        pickup_city: "Paris".to_string(),
        pickup_postal_code: "75015".to_string(),
        pickup_date: "2025-12-12".to_string(),
        pickup_time_start: "07:00".to_string(),
        pickup_time_end: "08:00".to_string(),
        delivery_date: "2025-12-12".to_string(),
        delivery_time_start: "09:00".to_string(),
        delivery_time_end: "14:00".to_string(),
        delivery_city: "Paris".to_string(),
        delivery_radius_km: "8".to_string(),
        packages_count: "120".to_string(),
        budget: "1450".to_string(),
        contact_name: "Claire Roux".to_string(),
        contact_phone: "+33 6 33 22 11 00".to_string(),
        contact_email: "claire.roux@maison-verte.fr".to_string(),
        ..MerchantHomeDeliveryFormValues::default()
    }
}

#[tokio::test]
async fn invalid_home_delivery_form_sends_nothing() {
    let client = ApiClient::new(FakeTransport::default());
    let values = MerchantHomeDeliveryFormValues {
        contact_email: "claire".to_string(),
        ..home_delivery_form()
    };

    let err = create_home_delivery_announcement(
        &client,
        MerchantAnnouncementStatus::Published,
        &values,
    )
    .await
    .unwrap_err();
    match err {
        HomeDeliveryError::Invalid(errors) => {
            assert_eq!(errors.get(&FormField::ContactEmail), Some(&"Email invalide"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.transport().calls().is_empty());
}

#[tokio::test]
async fn publishing_a_home_delivery_posts_the_form() {
    let transport = FakeTransport::default().on(
        "POST",
        "/merchants/me/announcements",
        Ok(json!({ "id": "MHD-9", "status": "PUBLISHED", "publishedAt": "2025-12-09T08:15:00Z" })),
    );
    let client = ApiClient::new(transport);

    let receipt = create_home_delivery_announcement(
        &client,
        MerchantAnnouncementStatus::Published,
        &home_delivery_form(),
    )
    .await
    .unwrap();
    assert_eq!(receipt.id, "MHD-9");
    assert_eq!(receipt.message, "Annonce publiée sous la référence XMAS-P15.");

    let body = client.transport().calls()[0].body.clone().unwrap();
    assert_eq!(body["serviceType"], "MERCHANT_HOME_DELIVERY");
    assert_eq!(body["status"], "PUBLISHED");
    assert_eq!(body["campaignName"], "Opération Noël");
    assert_eq!(body["requiresSignature"], true);
}

#[tokio::test]
async fn home_delivery_request_failure_keeps_the_cause() {
    let transport = FakeTransport::default().on(
        "POST",
        "/merchants/me/announcements",
        Err(ApiError::status(500, "boom")),
    );
    let client = ApiClient::new(transport);

    let err = create_home_delivery_announcement(
        &client,
        MerchantAnnouncementStatus::Draft,
        &home_delivery_form(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HomeDeliveryError::Request(_)));
    assert_eq!(
        err.user_message(),
        "Impossible d'enregistrer votre annonce pour le moment."
    );
}

#[tokio::test]
async fn merchant_announcements_are_listed_newest_first() {
    let transport = FakeTransport::default().on(
        "GET",
        "/merchants/me/announcements",
        Ok(json!([{ "id": "MHD-1", "campaignName": "Soldes", "status": "DRAFT" }])),
    );
    let client = ApiClient::new(transport);

    let announcements = fetch_merchant_announcements(&client).await.unwrap();
    assert_eq!(announcements[0].campaign_name, "Soldes");
    assert_eq!(announcements[0].status, MerchantAnnouncementStatus::Draft);
    assert!(has_query(&client.transport().calls()[0], "sort", "updatedAt,desc"));
}

#[tokio::test]
async fn couriers_only_see_published_announcements() {
    let transport = FakeTransport::default().on_status(
        "/announcements",
        "PUBLISHED",
        Ok(json!([
            { "id": "ANN-010", "status": "PUBLISHED", "budget": 65.0 },
            { "id": "ANN-013", "status": "ASSIGNED" }
        ])),
    );
    let client = ApiClient::new(transport);

    let announcements = fetch_courier_available_announcements(&client).await.unwrap();
    assert_eq!(announcements.len(), 1);
    assert_eq!(announcements[0].id, "ANN-010");
    assert_eq!(announcements[0].budget, 65.0);
}

#[tokio::test]
async fn taking_over_a_missing_announcement_fails() {
    let client = ApiClient::new(FakeTransport::default());

    let err = take_over_announcement(&client, "ANN-404", None).await.unwrap_err();
    assert_eq!(err.message, "Annonce introuvable");
    assert!(err.source.is_not_found());
    assert!(client.transport().calls().iter().all(|call| call.method == "GET"));
}

#[tokio::test]
async fn taking_over_an_assigned_announcement_fails() {
    let transport = FakeTransport::default().on(
        "GET",
        "/announcements/ANN-013",
        Ok(json!({ "id": "ANN-013", "status": "ASSIGNED" })),
    );
    let client = ApiClient::new(transport);

    let err = take_over_announcement(&client, "ANN-013", None).await.unwrap_err();
    assert_eq!(err.message, "Cette annonce n'est plus disponible");
    assert_eq!(client.transport().calls().len(), 1);
}

#[tokio::test]
async fn taking_over_posts_the_assignment() {
    let transport = FakeTransport::default()
        .on(
            "GET",
            "/announcements/ANN-010",
            Ok(json!({
                "id": "ANN-010",
                "status": "PUBLISHED",
                "pickupStart": "2025-12-09T13:00:00Z",
                "pickupEnd": "2025-12-09T14:00:00Z"
            })),
        )
        .on(
            "POST",
            "/announcements/ANN-010/assign",
            Ok(json!({ "assignmentId": "ASSIGN-7", "assignedAt": "2025-12-09T12:00:00Z" })),
        );
    let client = ApiClient::new(transport);

    let result = take_over_announcement(&client, "ANN-010", Some(" Arrivée 13h "))
        .await
        .unwrap();
    assert_eq!(result.assignment_id, "ASSIGN-7");
    assert_eq!(result.assigned_at, "09 déc., 12:00");
    assert_eq!(result.pickup_eta, "09 déc. • 13:00 - 14:00");
    assert_eq!(
        result.message,
        "Vous avez pris en charge cette annonce. Le client a été notifié."
    );

    let post = client
        .transport()
        .calls()
        .into_iter()
        .find(|call| call.method == "POST")
        .unwrap();
    assert_eq!(post.body, Some(json!({ "note": "Arrivée 13h" })));
}
