//! Integration tests for the API server.

use std::sync::OnceLock;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{AccountId, AddressId, DistrictId, Money};
use domain::{InMemoryAddressService, InMemoryShippingService, ShopCourier};
use ledger::WalletService;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use store::{InMemoryStore, NewProduct, NewVariant, Shop};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

const BUYER: AccountId = AccountId::new(1);
const SELLER: AccountId = AccountId::new(2);
const STRANGER: AccountId = AccountId::new(3);

struct Harness {
    app: Router,
    shop: Shop,
    courier: ShopCourier,
    address: AddressId,
}

fn setup_empty() -> Router {
    let state = api::create_state(
        InMemoryStore::new(),
        InMemoryAddressService::new(),
        InMemoryShippingService::new(),
        Money::from_major(1000),
    );
    api::create_app(state, get_metrics_handle(), Duration::from_secs(5))
}

/// Buyer with `balance` and one checked 35,000 kettle (1 kg) in the cart,
/// shipped for 5,000 per kg.
async fn setup_market(balance: i64) -> Harness {
    let store = InMemoryStore::new();
    let addresses = InMemoryAddressService::new();
    let shipping = InMemoryShippingService::new();
    let wallets = WalletService::new(store.clone());

    for account in [BUYER, SELLER] {
        wallets.open_wallets(account).await.unwrap();
        wallets.activate_personal(account).await.unwrap();
    }
    wallets.activate_shop(SELLER).await.unwrap();
    wallets
        .top_up(BUYER, Money::from_major(balance))
        .await
        .unwrap();

    let shop = store.add_shop(SELLER, "Kitchen Goods").await;
    let product = store
        .add_product(NewProduct {
            shop_id: shop.id,
            code: "KTL-01".to_string(),
            name: "Kettle".to_string(),
            thumbnail_url: String::new(),
            weight: 1000,
        })
        .await;
    let variant = store
        .add_variant(NewVariant {
            product_id: product.id,
            first_type: "red".to_string(),
            second_type: "default".to_string(),
            price: Money::from_major(35_000),
            discount_percent: Decimal::ZERO,
            stock: 10,
        })
        .await;
    store.add_cart_item(BUYER, variant.id, 1, true).await;

    let address = addresses.add_address(BUYER, DistrictId::new(1)).await;
    addresses.set_shop_district(shop.id, DistrictId::new(2)).await;
    let courier = shipping.add_courier(shop.id, "jne", "REG", true).await;
    shipping
        .set_rate("jne", "REG", Money::from_major(5_000))
        .await;

    let state = api::create_state(store, addresses, shipping, Money::from_major(1000));
    Harness {
        app: api::create_app(state, get_metrics_handle(), Duration::from_secs(5)),
        shop,
        courier,
        address,
    }
}

impl Harness {
    fn checkout_body(&self) -> Value {
        json!({
            "order_deliveries": [{
                "shop_id": self.shop.id,
                "shop_courier_id": self.courier.id,
                "promotion_id": null
            }],
            "buyer_address_id": self.address
        })
    }

    async fn place_order(&self) -> i64 {
        let (status, body) = send(
            &self.app,
            "POST",
            "/orders",
            Some(BUYER),
            Some(self.checkout_body()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body[0]["id"].as_i64().unwrap()
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<AccountId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-account-id", actor.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn money(value: &Value) -> Money {
    serde_json::from_value(value.clone()).unwrap()
}

mod system {
    use super::*;

    #[tokio::test]
    async fn health_check() {
        let app = setup_empty();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn metrics_endpoint() {
        let app = setup_empty();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn missing_account_header_is_unauthorized() {
        let app = setup_empty();
        let (status, body) = send(&app, "GET", "/wallets/personal", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("x-account-id"));
    }
}

mod wallets {
    use super::*;

    #[tokio::test]
    async fn open_activate_top_up_and_read() {
        let app = setup_empty();

        let (status, body) = send(&app, "POST", "/wallets", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let purposes: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["purpose"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(purposes, ["PERSONAL", "ESCROW", "SHOP"]);

        let (status, _) = send(
            &app,
            "POST",
            "/wallets/topup",
            Some(BUYER),
            Some(json!({ "amount": 50000 })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, _) = send(&app, "POST", "/wallets/personal/activate", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &app,
            "POST",
            "/wallets/topup",
            Some(BUYER),
            Some(json!({ "amount": 50000 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["transaction_id"].is_i64());

        let (status, body) = send(&app, "GET", "/wallets/personal", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(money(&body["balance"]), Money::from_major(50_000));
        assert_eq!(body["purpose"], "PERSONAL");
    }

    #[tokio::test]
    async fn rejects_non_positive_top_up() {
        let app = setup_empty();
        send(&app, "POST", "/wallets", Some(BUYER), None).await;
        send(&app, "POST", "/wallets/personal/activate", Some(BUYER), None).await;

        let (status, _) = send(
            &app,
            "POST",
            "/wallets/topup",
            Some(BUYER),
            Some(json!({ "amount": -10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_sub_cent_top_up() {
        let app = setup_empty();
        send(&app, "POST", "/wallets", Some(BUYER), None).await;
        send(&app, "POST", "/wallets/personal/activate", Some(BUYER), None).await;

        for amount in [json!("0.005"), json!("100.001"), json!(10_000_000_000_000i64)] {
            let (status, body) = send(
                &app,
                "POST",
                "/wallets/topup",
                Some(BUYER),
                Some(json!({ "amount": amount })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].as_str().unwrap().contains("decimals"));
        }

        let (_, body) = send(&app, "GET", "/wallets/personal", Some(BUYER), None).await;
        assert_eq!(money(&body["balance"]), Money::ZERO);
    }

    #[tokio::test]
    async fn withdraw_requires_shop_wallet() {
        let app = setup_empty();
        send(&app, "POST", "/wallets", Some(SELLER), None).await;
        send(&app, "POST", "/wallets/personal/activate", Some(SELLER), None).await;

        let (status, _) = send(
            &app,
            "POST",
            "/wallets/withdraw",
            Some(SELLER),
            Some(json!({ "amount": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn history_filters_by_kind() {
        let h = setup_market(100_000).await;
        h.place_order().await;

        let (status, body) = send(
            &h.app,
            "GET",
            "/wallets/history?kind=topup",
            Some(BUYER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["page"], 1);

        let (status, body) = send(&h.app, "GET", "/wallets/history", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            &h.app,
            "GET",
            "/wallets/history?kind=bonus",
            Some(BUYER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn checkout_summary_prices_without_placing() {
        let h = setup_market(100_000).await;

        let (status, body) = send(
            &h.app,
            "POST",
            "/checkout/summary",
            Some(BUYER),
            Some(h.checkout_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(money(&body["summary_price"]), Money::from_major(41_000));

        let (_, page) = send(&h.app, "GET", "/orders", Some(BUYER), None).await;
        assert!(page["orders"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_lifecycle_pays_the_shop() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;

        let (status, body) = send(&h.app, "GET", "/wallets/personal", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(money(&body["balance"]), Money::from_major(60_000));

        let (status, body) = send(&h.app, "GET", &format!("/orders/{id}"), Some(SELLER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "NEW");
        assert_eq!(body["details"].as_array().unwrap().len(), 1);

        let status_uri = format!("/seller/orders/{id}/status");
        for (payload, expected) in [
            (json!({ "status": "PROCESS" }), "PROCESS"),
            (json!({ "status": "DELIVER", "est_days": 2 }), "DELIVER"),
            (json!({ "status": "ARRIVE" }), "ARRIVE"),
        ] {
            let (status, body) =
                send(&h.app, "PATCH", &status_uri, Some(SELLER), Some(payload)).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(body["status"], expected);
        }

        let (status, body) = send(
            &h.app,
            "POST",
            &format!("/orders/{id}/receive"),
            Some(BUYER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "RECEIVE");

        let (status, body) = send(&h.app, "GET", "/wallets/shop", Some(SELLER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(money(&body["balance"]), Money::from_major(40_000));
    }

    #[tokio::test]
    async fn cancel_refunds_and_cannot_repeat() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;
        let uri = format!("/orders/{id}/cancel");

        let (status, body) = send(&h.app, "POST", &uri, Some(BUYER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CANCEL");

        let (_, wallet) = send(&h.app, "GET", "/wallets/personal", Some(BUYER), None).await;
        assert_eq!(money(&wallet["balance"]), Money::from_major(100_000));

        let (status, _) = send(&h.app, "POST", &uri, Some(BUYER), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn seller_reject_refunds_the_buyer() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;

        let (status, body) = send(
            &h.app,
            "POST",
            &format!("/seller/orders/{id}/reject"),
            Some(SELLER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CANCEL");

        let (_, wallet) = send(&h.app, "GET", "/wallets/personal", Some(BUYER), None).await;
        assert_eq!(money(&wallet["balance"]), Money::from_major(100_000));
    }

    #[tokio::test]
    async fn seller_listing_filters_by_status() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;

        let (status, body) = send(
            &h.app,
            "GET",
            "/seller/orders?status=NEW",
            Some(SELLER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["orders"][0]["id"], id);
        assert_eq!(body["total_pages"], 1);

        let (_, body) = send(
            &h.app,
            "GET",
            "/seller/orders?status=PROCESS",
            Some(SELLER),
            None,
        )
        .await;
        assert!(body["orders"].as_array().unwrap().is_empty());
    }
}

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn insufficient_balance_is_unprocessable() {
        let h = setup_market(10_000).await;
        let (status, body) = send(
            &h.app,
            "POST",
            "/orders",
            Some(BUYER),
            Some(h.checkout_body()),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("Insufficient balance"));
    }

    #[tokio::test]
    async fn wrong_party_is_forbidden() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;

        let (status, _) = send(&h.app, "GET", &format!("/orders/{id}"), Some(STRANGER), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &h.app,
            "PATCH",
            &format!("/seller/orders/{id}/status"),
            Some(BUYER),
            Some(json!({ "status": "PROCESS" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn out_of_order_transition_conflicts() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;

        let (status, body) = send(
            &h.app,
            "POST",
            &format!("/orders/{id}/receive"),
            Some(BUYER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Wrong initial status"));
    }

    #[tokio::test]
    async fn deliver_requires_est_days() {
        let h = setup_market(100_000).await;
        let id = h.place_order().await;
        let uri = format!("/seller/orders/{id}/status");

        send(
            &h.app,
            "PATCH",
            &uri,
            Some(SELLER),
            Some(json!({ "status": "PROCESS" })),
        )
        .await;
        let (status, _) = send(
            &h.app,
            "PATCH",
            &uri,
            Some(SELLER),
            Some(json!({ "status": "DELIVER" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &h.app,
            "PATCH",
            &uri,
            Some(SELLER),
            Some(json!({ "status": "DELIVER", "est_days": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let h = setup_market(100_000).await;
        let (status, _) = send(&h.app, "GET", "/orders/999", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&h.app, "POST", "/orders/999/cancel", Some(BUYER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_courier_is_bad_request() {
        let h = setup_market(100_000).await;
        let mut body = h.checkout_body();
        body["order_deliveries"][0]["shop_courier_id"] = json!(9999);

        let (status, _) = send(&h.app, "POST", "/orders", Some(BUYER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
