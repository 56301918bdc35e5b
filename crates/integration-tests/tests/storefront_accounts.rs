//! Registration, sign-in and profile management.

use reqwest::StatusCode;
use serde_json::{Value, json};
use voltio_integration_tests::{api, register_customer, session_client, unique_email};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_register_login_logout() {
    let client = session_client();
    let user = register_customer(&client).await;
    assert_eq!(user["role"], "cliente");
    assert!(user.get("password_hash").is_none());

    let me: Value = client
        .get(api("/auth/me"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(me["id"], user["id"]);

    let logout = client
        .post(api("/auth/logout"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = client
        .get(api("/auth/me"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    let login = client
        .post(api("/auth/login"))
        .json(&json!({ "email": user["email"], "password": "bateria-llena-2024" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_duplicate_email_is_rejected() {
    let email = unique_email("duplicado");
    let form = json!({ "email": email, "password": "bateria-llena-2024", "name": "Uno" });

    let first = session_client()
        .post(api("/auth/register"))
        .json(&form)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::CREATED);

    // Case differences don't make a new address.
    let upper = json!({
        "email": email.to_uppercase(),
        "password": "bateria-llena-2024",
        "name": "Dos",
    });
    let second = session_client()
        .post(api("/auth/register"))
        .json(&upper)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_profile_update_and_password_change() {
    let client = session_client();
    let user = register_customer(&client).await;

    let updated: Value = client
        .put(api("/profile"))
        .json(&json!({
            "name": "  Nombre Nuevo ",
            "phone": "55 1234 5678",
            "street": "Av. Reforma 100",
            "city": "CDMX",
            "postal_code": "06600",
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(updated["name"], "Nombre Nuevo");
    assert_eq!(updated["city"], "CDMX");

    let wrong = client
        .put(api("/profile/password"))
        .json(&json!({ "current_password": "incorrecta", "new_password": "otra-clave-2025" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = wrong.json().await.expect("Invalid JSON");
    assert!(body["fields"].get("current_password").is_some());

    let changed = client
        .put(api("/profile/password"))
        .json(&json!({
            "current_password": "bateria-llena-2024",
            "new_password": "otra-clave-2025",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(changed.status(), StatusCode::NO_CONTENT);

    let login = session_client()
        .post(api("/auth/login"))
        .json(&json!({ "email": user["email"], "password": "otra-clave-2025" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_signed_in_ticket_uses_account_details() {
    let client = session_client();
    let user = register_customer(&client).await;

    let ticket: Value = client
        .post(api("/support"))
        .json(&json!({ "subject": "Garantía", "message": "¿Cubre la batería?" }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(ticket["email"], user["email"]);
    assert_eq!(ticket["status"], "abierto");

    let mine: Value = client
        .get(api("/support/mine"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}
