use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tower::ServiceExt;
use uuid::Uuid;

use api_types::{
    expense::{ExpenseNew, ExpenseRecorded, ParticipantNew, SourceKind},
    friend::FriendsResponse,
    settlement::{SettleResponse, SettlementsResponse},
    stats::CategoryTotalsResponse,
};
use migration::MigratorTrait;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub username: String,
        pub password: String,
        pub telegram_id: Option<String>,
        pub pair_code: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

async fn setup() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = engine::Engine::builder().database(db.clone()).build();
    (server::router(engine, db.clone()), db)
}

async fn create_user(db: &DatabaseConnection, username: &str, telegram_id: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        password: Set("password".to_string()),
        telegram_id: Set(telegram_id.map(str::to_string)),
        pair_code: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

fn basic_auth(username: &str) -> String {
    let secret = base64::prelude::BASE64_STANDARD.encode(format!("{username}:password"));
    format!("Basic {secret}")
}

fn get(uri: &str, username: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(username))
        .body(Body::empty())
        .unwrap()
}

fn post_json<T: serde::Serialize>(uri: &str, username: &str, payload: &T) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(username))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn expense_payload(payer: Uuid, payee: Uuid, amount_minor: i64) -> ExpenseNew {
    ExpenseNew {
        description: Some("Cena".to_string()),
        source_kind: SourceKind::Text,
        source_path: None,
        total_minor: amount_minor,
        currency: None,
        participants: vec![ParticipantNew {
            payer_id: payer,
            payee_id: payee,
            amount_minor,
            label: Some("Pizza".to_string()),
            category: Some("Food".to_string()),
        }],
    }
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let (app, _db) = setup().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let (app, _db) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/settlements")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // The typed Authorization extractor rejects the request before auth runs.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, db) = setup().await;
    create_user(&db, "alice", None).await;

    let secret = base64::prelude::BASE64_STANDARD.encode("alice:wrong");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/settlements")
                .header(header::AUTHORIZATION, format!("Basic {secret}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn record_settle_roundtrip() {
    let (app, db) = setup().await;
    let alice = create_user(&db, "alice", None).await;
    let bob = create_user(&db, "bob", Some("555")).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/expenses",
            "alice",
            &expense_payload(alice, bob, 2550),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let _recorded: ExpenseRecorded = json_body(response).await;

    // Bob owes Alice 25.50.
    let response = app
        .clone()
        .oneshot(get("/settlements", "bob"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let settlements: SettlementsResponse = json_body(response).await;
    assert!(settlements.owed_to_user.is_empty());
    assert_eq!(settlements.user_owes.len(), 1);
    let balance = &settlements.user_owes[0];
    assert_eq!(balance.counterparty_id, alice);
    assert_eq!(balance.net_minor, -2550);
    let obligation_id = balance.lines[0].obligation_id;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/obligations/{obligation_id}/settle"),
            "bob",
            &(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let settled: SettleResponse = json_body(response).await;
    assert_eq!(
        settled.obligation.status,
        api_types::obligation::ObligationStatus::Paid
    );
    assert!(settled.obligation.paid_at.is_some());

    // Settling again conflicts instead of rewriting history.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/obligations/{obligation_id}/settle"),
            "bob",
            &(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(get("/settlements", "bob"))
        .await
        .unwrap();
    let settlements: SettlementsResponse = json_body(response).await;
    assert!(settlements.user_owes.is_empty());

    let response = app.oneshot(get("/stats/categories", "bob")).await.unwrap();
    let stats: CategoryTotalsResponse = json_body(response).await;
    assert_eq!(stats.totals.get("Food"), Some(&2550));
}

#[tokio::test]
async fn settle_notifies_counterparty_telegram_id() {
    let (app, db) = setup().await;
    let alice = create_user(&db, "alice", Some("919")).await;
    let bob = create_user(&db, "bob", None).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/expenses",
            "alice",
            &expense_payload(alice, bob, 1000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/settlements", "bob"))
        .await
        .unwrap();
    let settlements: SettlementsResponse = json_body(response).await;
    let obligation_id = settlements.user_owes[0].lines[0].obligation_id;

    let response = app
        .oneshot(post_json(
            &format!("/obligations/{obligation_id}/settle"),
            "bob",
            &(),
        ))
        .await
        .unwrap();
    let settled: SettleResponse = json_body(response).await;
    assert_eq!(settled.counterparty_telegram_id.as_deref(), Some("919"));
}

#[tokio::test]
async fn telegram_header_switches_acting_user() {
    let (app, db) = setup().await;
    let alice = create_user(&db, "alice", None).await;
    let bob = create_user(&db, "bob", Some("555")).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/expenses",
            "alice",
            &expense_payload(alice, bob, 700),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Service credentials are Alice's, but the request acts as Bob.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/settlements")
                .header(header::AUTHORIZATION, basic_auth("alice"))
                .header("telegram-user-id", "555")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let settlements: SettlementsResponse = json_body(response).await;
    assert_eq!(settlements.user_owes.len(), 1);
    assert_eq!(settlements.user_owes[0].counterparty_id, alice);
}

#[tokio::test]
async fn friends_resolve_settlement_names() {
    let (app, db) = setup().await;
    let alice = create_user(&db, "alice", None).await;
    let bob = create_user(&db, "bob", None).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/friends",
            "bob",
            &api_types::friend::FriendNew {
                username: "alice".to_string(),
                nickname: "Ali".to_string(),
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // A second link to the same person conflicts.
    let response = app
        .clone()
        .oneshot(post_json(
            "/friends",
            "bob",
            &api_types::friend::FriendNew {
                username: "alice".to_string(),
                nickname: "Alice2".to_string(),
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(get("/friends", "bob"))
        .await
        .unwrap();
    let friends: FriendsResponse = json_body(response).await;
    assert_eq!(friends.friends.len(), 1);
    assert_eq!(friends.friends[0].nickname, "Ali");

    let response = app
        .clone()
        .oneshot(post_json(
            "/expenses",
            "alice",
            &expense_payload(alice, bob, 900),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get("/settlements", "bob")).await.unwrap();
    let settlements: SettlementsResponse = json_body(response).await;
    assert_eq!(
        settlements.user_owes[0].counterparty_name.as_deref(),
        Some("Ali")
    );
}

#[tokio::test]
async fn unknown_obligation_is_not_found() {
    let (app, db) = setup().await;
    create_user(&db, "alice", None).await;

    let response = app
        .oneshot(post_json(
            &format!("/obligations/{}/settle", Uuid::new_v4()),
            "alice",
            &(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
