//! Concurrency tests against a live PostgreSQL database.
//!
//! These tests require a disposable database; migrations and seed data are
//! applied on the fly. Run with:
//!
//! ECOMMERCE_TEST_DATABASE_URL=postgres://localhost/ecommerce_test \
//!     cargo test --test concurrent_writes -- --ignored

use std::str::FromStr;

use bigdecimal::BigDecimal;
use jiff::{SignedDuration, Timestamp};
use jiff_diesel::ToDiesel;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use uuid::Uuid;

use ecommerce_rs::AppState;
use ecommerce_rs::config::Settings;
use ecommerce_rs::db::seed::seed_reference_data;
use ecommerce_rs::db::{establish_async_connection_pool, run_pending_migrations};
use ecommerce_rs::error::AppError;
use ecommerce_rs::models::{CartKind, NewOrder, NewPasswordResetToken, OrderStatus};
use ecommerce_rs::repositories::{OrderLineDraft, Repositories};
use ecommerce_rs::services::{AuthSession, CartLine, Registration};

const PASSWORD: &str = "Pa$$w0rd!";

/// Migrations and seed data are applied once per test binary.
static PREPARED: OnceCell<()> = OnceCell::const_new();

struct TestDb {
    state: AppState,
    repos: Repositories,
}

async fn test_db() -> TestDb {
    let url = std::env::var("ECOMMERCE_TEST_DATABASE_URL")
        .expect("ECOMMERCE_TEST_DATABASE_URL must point at a disposable database");

    let mut settings = Settings::default();
    settings.database.url = url;
    settings.database.max_connections = 20;
    settings.jwt.secret = "a-test-signing-secret-of-at-least-32-chars".to_string();

    let pool = establish_async_connection_pool(&settings.database).await.unwrap();
    let repos = Repositories::new(pool.clone());
    PREPARED
        .get_or_init(|| async {
            run_pending_migrations(&settings.database.url).await.unwrap();
            seed_reference_data(&repos, &settings.seed).await.unwrap();
        })
        .await;

    TestDb {
        state: AppState::new(pool, settings).unwrap(),
        repos,
    }
}

async fn register(db: &TestDb) -> AuthSession {
    let tag = Uuid::new_v4().simple().to_string();
    db.state
        .services
        .auth
        .register(
            Registration {
                email: format!("{tag}@test.com"),
                user_name: format!("user{}", &tag[..12]),
                password: PASSWORD.to_string(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL database"]
async fn test_refresh_token_rotates_once_under_contention() {
    let db = test_db().await;
    let session = register(&db).await;
    let token = session.refresh_token.token.clone();

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let auth = db.state.services.auth.clone();
        let token = token.clone();
        tasks.spawn(async move { auth.refresh(&token).await });
    }

    let mut rotated = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => rotated += 1,
            Err(AppError::Unauthorized { .. }) => {}
            Err(other) => panic!("Unexpected refresh error: {other:?}"),
        }
    }
    assert_eq!(rotated, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL database"]
async fn test_reset_token_is_single_use_under_contention() {
    let db = test_db().await;
    let session = register(&db).await;
    let reset = db
        .repos
        .tokens
        .create_reset_token(NewPasswordResetToken {
            user_id: session.user.id,
            token: Uuid::new_v4().simple().to_string(),
            expires_at: (Timestamp::now() + SignedDuration::from_mins(30)).to_diesel(),
        })
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for attempt in 0..5 {
        let auth = db.state.services.auth.clone();
        let email = session.user.email.clone();
        let token = reset.token.clone();
        tasks.spawn(async move {
            auth.reset_password(&email, &token, &format!("NewPa$$w0rd{attempt}"))
                .await
        });
    }

    let mut completed = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(()) => completed += 1,
            Err(AppError::BadRequest { .. }) => {}
            Err(other) => panic!("Unexpected reset error: {other:?}"),
        }
    }
    assert_eq!(completed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL database"]
async fn test_parallel_wrong_passwords_still_lock_account() {
    let db = test_db().await;
    let session = register(&db).await;
    let email = session.user.email.clone();

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let auth = db.state.services.auth.clone();
        let email = email.clone();
        tasks.spawn(async move { auth.login(&email, "wrong-password").await });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().is_err());
    }

    let user = db.repos.users.find_by_email(&email).await.unwrap().unwrap();
    assert!(user.is_locked_out(Timestamp::now()));
    assert!(matches!(
        db.state.services.auth.login(&email, PASSWORD).await,
        Err(AppError::Unauthorized { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL database"]
async fn test_registration_assigns_customer_role() {
    let db = test_db().await;
    let session = register(&db).await;
    assert_eq!(session.roles, vec!["Customer"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL database"]
async fn test_parallel_basket_adds_keep_every_line() {
    let db = test_db().await;
    let basket_id = format!("basket-{}", Uuid::new_v4().simple());

    let mut tasks = JoinSet::new();
    for product_id in 1..=12 {
        let carts = db.state.services.carts.clone();
        let basket_id = basket_id.clone();
        tasks.spawn(async move {
            let line = CartLine {
                product_id,
                product_name: format!("Product {product_id}"),
                price: BigDecimal::from(10),
                quantity: 1,
                picture_url: None,
                brand: None,
                product_type: None,
            };
            carts.add_item(CartKind::Basket, &basket_id, line).await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let carts = db.state.services.carts.clone();
        let basket_id = basket_id.clone();
        tasks.spawn(async move { carts.increment_item(CartKind::Basket, &basket_id, 1).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let basket = db.state.services.carts.get(CartKind::Basket, &basket_id).await.unwrap();
    assert_eq!(basket.items.len(), 12);
    let first = basket.items.iter().find(|l| l.product_id == 1).unwrap();
    assert_eq!(first.quantity, 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL database"]
async fn test_cancel_leaves_shipped_order_alone() {
    let db = test_db().await;
    let session = register(&db).await;
    let (order, _) = db
        .repos
        .orders
        .create(
            NewOrder {
                buyer_email: session.user.email.clone(),
                order_date: Timestamp::now().to_diesel(),
                ship_first_name: "Bob".into(),
                ship_last_name: "Bobbity".into(),
                ship_street: "10 The Street".into(),
                ship_city: "New York".into(),
                ship_state: "NY".into(),
                ship_postal_code: "90250".into(),
                ship_country: "US".into(),
                delivery_method_id: None,
                delivery_short_name: "Standard".into(),
                delivery_time: "3-5 days".into(),
                delivery_price: BigDecimal::from(0),
                sub_total: BigDecimal::from_str("19.99").unwrap(),
                status: OrderStatus::Pending,
                payment_intent_id: None,
            },
            vec![OrderLineDraft {
                product_id: 1,
                product_name: "Core Blue Hat".into(),
                picture_url: None,
                price: BigDecimal::from_str("19.99").unwrap(),
                quantity: 1,
            }],
        )
        .await
        .unwrap();

    db.state
        .services
        .orders
        .update_status(order.id, "Shipped")
        .await
        .unwrap();

    let pending_only = db
        .repos
        .orders
        .update_status(order.id, OrderStatus::Cancelled, Some(OrderStatus::Pending))
        .await
        .unwrap();
    assert!(pending_only.is_none());

    match db
        .state
        .services
        .orders
        .cancel_order(order.id, &session.user.email)
        .await
    {
        Err(AppError::BadRequest { message }) => assert!(message.ends_with("it is Shipped")),
        other => panic!("Expected BadRequest, got {other:?}"),
    }
    let stored = db.repos.orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Shipped);
}
