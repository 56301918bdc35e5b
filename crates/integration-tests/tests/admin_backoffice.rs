//! Admin back-office. Tests that need an admin session skip themselves when
//! `VOLTIO_TEST_ADMIN_EMAIL` is unset.

use reqwest::StatusCode;
use serde_json::{Value, json};
use voltio_integration_tests::{admin_client, api, register_customer, session_client};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_customers_are_forbidden() {
    let client = session_client();
    register_customer(&client).await;

    for path in ["/admin/dashboard", "/admin/users", "/admin/orders", "/admin/config"] {
        let response = client
            .get(api(path))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_dashboard() {
    let Some(admin) = admin_client().await else {
        return;
    };

    let dashboard: Value = admin
        .get(api("/admin/dashboard"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert!(dashboard["users"]["total"].as_i64().unwrap_or(0) >= 1);
    assert!(dashboard["recent_orders"].is_array());
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_ticket_response_flow() {
    let Some(admin) = admin_client().await else {
        return;
    };

    let ticket: Value = session_client()
        .post(api("/support"))
        .json(&json!({
            "name": "Invitado",
            "email": "invitado@example.com",
            "subject": "Cotización",
            "message": "¿Tienen el Sedán E1 en azul?",
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    let ticket_id = ticket["id"].as_i64().expect("ticket id");

    let answered: Value = admin
        .post(api(&format!("/admin/support/{ticket_id}/respond")))
        .json(&json!({ "response": "Sí, llega en dos semanas." }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(answered["status"], "resuelto");
    assert!(answered["responded_at"].is_string());

    let closed: Value = admin
        .put(api(&format!("/admin/support/{ticket_id}/status")))
        .json(&json!({ "status": "cerrado" }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(closed["status"], "cerrado");
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_faq_lifecycle() {
    let Some(admin) = admin_client().await else {
        return;
    };

    let created = admin
        .post(api("/admin/faqs"))
        .json(&json!({
            "question": "¿Puedo rodar bajo la lluvia?",
            "answer": "Sí, todos los modelos son IP65.",
            "category": "uso",
            "published": false,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), StatusCode::CREATED);
    let faq: Value = created.json().await.expect("Invalid JSON");
    let faq_id = faq["id"].as_i64().expect("faq id");

    let public: Value = session_client()
        .get(api("/faq?category=uso"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    let listed = public
        .as_array()
        .is_some_and(|faqs| faqs.iter().any(|f| f["id"] == faq["id"]));
    assert!(!listed, "unpublished FAQ is visible");

    let deleted = admin
        .delete(api(&format!("/admin/faqs/{faq_id}")))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_admin_cannot_remove_self() {
    let Some(admin) = admin_client().await else {
        return;
    };

    let me: Value = admin
        .get(api("/auth/me"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    let my_id = me["id"].as_i64().expect("user id");

    let demote = admin
        .put(api(&format!("/admin/users/{my_id}")))
        .json(&json!({ "role": "cliente" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(demote.status(), StatusCode::BAD_REQUEST);

    let delete = admin
        .delete(api(&format!("/admin/users/{my_id}")))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(delete.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_account_changes_apply_to_open_sessions() {
    let Some(admin) = admin_client().await else {
        return;
    };
    let customer = session_client();
    let user = register_customer(&customer).await;
    let user_id = user["id"].as_i64().expect("user id");

    // Promotion takes effect without signing in again.
    let promoted = admin
        .put(api(&format!("/admin/users/{user_id}")))
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(promoted.status(), StatusCode::OK);
    let dashboard = customer
        .get(api("/admin/dashboard"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(dashboard.status(), StatusCode::OK);

    let deactivated = admin
        .put(api(&format!("/admin/users/{user_id}")))
        .json(&json!({ "role": "cliente", "active": false }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deactivated.status(), StatusCode::OK);

    let profile = customer
        .get(api("/profile"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(profile.status(), StatusCode::UNAUTHORIZED);

    // Signed out, so a ticket needs guest contact details again.
    let ticket = customer
        .post(api("/support"))
        .json(&json!({ "subject": "Acceso", "message": "No puedo entrar." }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(ticket.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_deleted_account_files_tickets_as_guest() {
    let Some(admin) = admin_client().await else {
        return;
    };
    let customer = session_client();
    let user = register_customer(&customer).await;
    let user_id = user["id"].as_i64().expect("user id");

    let removed: Value = admin
        .delete(api(&format!("/admin/users/{user_id}")))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(removed["outcome"], "deleted");

    let ticket = customer
        .post(api("/support"))
        .json(&json!({
            "name": "Ex cliente",
            "email": "ex@example.com",
            "subject": "Cuenta",
            "message": "¿Por qué se borró mi cuenta?",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(ticket.status(), StatusCode::CREATED);
    let ticket: Value = ticket.json().await.expect("Invalid JSON");
    assert!(ticket["user_id"].is_null());
}
