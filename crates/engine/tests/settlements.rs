use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use engine::{
    AddFriendCmd, Currency, Engine, EngineError, ObligationDraft, ObligationStatus,
    RecordExpenseCmd, SourceKind,
};
use migration::MigratorTrait;

// Engine ops reference users by id only; the full row (credentials, pairing)
// is owned by the server. Tests bootstrap accounts directly on the table.
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

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn create_user(db: &DatabaseConnection, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    let user = users::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        password: Set("password".to_string()),
        telegram_id: Set(None),
        pair_code: Set(None),
    };
    user.insert(db).await.unwrap();
    id
}

fn expense_cmd(
    creator: Uuid,
    participants: Vec<ObligationDraft>,
    total_minor: i64,
) -> RecordExpenseCmd {
    RecordExpenseCmd {
        creator_id: creator,
        description: Some("Cena".to_string()),
        source_kind: SourceKind::Text,
        source_path: None,
        total_minor,
        currency: Currency::Usd,
        participants,
        created_at: Utc::now(),
    }
}

fn draft(payer: Uuid, payee: Uuid, amount_minor: i64) -> ObligationDraft {
    ObligationDraft {
        payer_id: payer,
        payee_id: payee,
        amount_minor,
        label: None,
        category: None,
    }
}

#[tokio::test]
async fn record_expense_creates_pending_obligations() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    engine
        .record_expense(expense_cmd(alice, vec![draft(alice, bob, 2550)], 2550))
        .await
        .unwrap();

    let pending = engine
        .list_obligations(bob, Some(ObligationStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payer_id, alice);
    assert_eq!(pending[0].amount_minor, 2550);
    assert!(pending[0].paid_at.is_none());
}

#[tokio::test]
async fn record_expense_rejects_bad_participants() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    let err = engine
        .record_expense(expense_cmd(alice, vec![], 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidObligation(_)));

    let err = engine
        .record_expense(expense_cmd(alice, vec![draft(alice, alice, 1000)], 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidObligation(_)));

    let err = engine
        .record_expense(expense_cmd(alice, vec![draft(alice, bob, 0)], 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let ghost = Uuid::new_v4();
    let err = engine
        .record_expense(expense_cmd(alice, vec![draft(alice, ghost, 500)], 500))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn settlements_net_opposite_directions() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    // Alice fronted 25.50 for Bob, Bob fronted 10.00 for Alice.
    engine
        .record_expense(expense_cmd(alice, vec![draft(alice, bob, 2550)], 2550))
        .await
        .unwrap();
    engine
        .record_expense(expense_cmd(bob, vec![draft(bob, alice, 1000)], 1000))
        .await
        .unwrap();

    let summary = engine.settlements(alice).await.unwrap();
    assert_eq!(summary.owed_to_user.len(), 1);
    assert!(summary.user_owes.is_empty());
    let balance = &summary.owed_to_user[0];
    assert_eq!(balance.counterparty_id, bob);
    assert_eq!(balance.net_minor, 1550);
    assert_eq!(balance.lines.len(), 2);

    // From Bob's perspective the same pair is a debt.
    let summary = engine.settlements(bob).await.unwrap();
    assert!(summary.owed_to_user.is_empty());
    assert_eq!(summary.user_owes[0].net_minor, -1550);
}

#[tokio::test]
async fn settlements_are_empty_without_obligations() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;

    let summary = engine.settlements(alice).await.unwrap();
    assert!(summary.owed_to_user.is_empty());
    assert!(summary.user_owes.is_empty());
}

#[tokio::test]
async fn settle_marks_paid_exactly_once() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    engine
        .record_expense(expense_cmd(alice, vec![draft(alice, bob, 2000)], 2000))
        .await
        .unwrap();
    let obligation_id = engine
        .list_obligations(bob, Some(ObligationStatus::Pending))
        .await
        .unwrap()[0]
        .id;

    let paid_at = Utc::now();
    let settled = engine
        .settle_obligation(obligation_id, bob, paid_at)
        .await
        .unwrap();
    assert_eq!(settled.status, ObligationStatus::Paid);
    assert_eq!(settled.paid_at, Some(paid_at));

    // A later retry must not refresh the timestamp.
    let err = engine
        .settle_obligation(obligation_id, bob, paid_at + Duration::minutes(5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadySettled(_)));

    let paid = engine
        .list_obligations(bob, Some(ObligationStatus::Paid))
        .await
        .unwrap();
    assert_eq!(paid[0].paid_at, Some(paid_at));

    // Settled debt no longer shows up in the outstanding balances.
    let summary = engine.settlements(bob).await.unwrap();
    assert!(summary.user_owes.is_empty());
}

#[tokio::test]
async fn settle_hides_foreign_obligations() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    let mallory = create_user(&db, "mallory").await;

    engine
        .record_expense(expense_cmd(alice, vec![draft(alice, bob, 800)], 800))
        .await
        .unwrap();
    let obligation_id = engine
        .list_obligations(bob, Some(ObligationStatus::Pending))
        .await
        .unwrap()[0]
        .id;

    let err = engine
        .settle_obligation(obligation_id, mallory, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .settle_obligation(Uuid::new_v4(), bob, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn category_totals_cover_both_directions_and_statuses() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    let mut cmd = expense_cmd(alice, vec![], 2500);
    cmd.participants = vec![
        ObligationDraft {
            payer_id: alice,
            payee_id: bob,
            amount_minor: 2000,
            label: Some("Pizza".to_string()),
            category: Some("Food".to_string()),
        },
        ObligationDraft {
            payer_id: alice,
            payee_id: bob,
            amount_minor: 500,
            label: None,
            category: None,
        },
    ];
    engine.record_expense(cmd).await.unwrap();

    let mut cmd = expense_cmd(bob, vec![], 700);
    cmd.participants = vec![ObligationDraft {
        payer_id: bob,
        payee_id: alice,
        amount_minor: 700,
        label: Some("Taxi".to_string()),
        category: Some("Travel".to_string()),
    }];
    engine.record_expense(cmd).await.unwrap();

    // Settling one obligation must not change the spend report.
    let obligation_id = engine
        .list_obligations(alice, Some(ObligationStatus::Pending))
        .await
        .unwrap()
        .iter()
        .find(|o| o.payer_id == bob)
        .unwrap()
        .id;
    engine
        .settle_obligation(obligation_id, alice, Utc::now())
        .await
        .unwrap();

    let totals = engine.category_totals_for_user(alice).await.unwrap();
    assert_eq!(totals.get("Food"), Some(&2000));
    assert_eq!(totals.get("Travel"), Some(&700));
    assert_eq!(totals.get(engine::FALLBACK_CATEGORY), Some(&500));
}

#[tokio::test]
async fn friends_roundtrip_and_duplicates() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    create_user(&db, "carol").await;

    let friend = engine
        .add_friend(AddFriendCmd {
            user_id: alice,
            friend_username: "bob".to_string(),
            nickname: "Bobby".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(friend.friend_user_id, bob);

    // Same counterparty again, different nickname.
    let err = engine
        .add_friend(AddFriendCmd {
            user_id: alice,
            friend_username: "bob".to_string(),
            nickname: "Robert".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Nickname collision is case-insensitive.
    let err = engine
        .add_friend(AddFriendCmd {
            user_id: alice,
            friend_username: "carol".to_string(),
            nickname: "bobby".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .add_friend(AddFriendCmd {
            user_id: alice,
            friend_username: "alice".to_string(),
            nickname: "me".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidFriend(_)));

    let names = engine.display_names(alice, &[bob]).await.unwrap();
    assert_eq!(names.get(&bob).map(String::as_str), Some("Bobby"));

    engine.remove_friend(alice, friend.id).await.unwrap();
    assert!(engine.list_friends(alice).await.unwrap().is_empty());

    // Nickname gone: falls back to the username.
    let names = engine.display_names(alice, &[bob]).await.unwrap();
    assert_eq!(names.get(&bob).map(String::as_str), Some("bob"));
}

#[tokio::test]
async fn settled_history_dedupes_and_paginates() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    let base = Utc::now();
    for offset in 0..3 {
        let mut cmd = expense_cmd(
            alice,
            vec![draft(alice, bob, 1000), draft(alice, bob, 500)],
            1500,
        );
        cmd.description = Some(format!("Spesa {offset}"));
        cmd.created_at = base + Duration::minutes(offset);
        engine.record_expense(cmd).await.unwrap();
    }

    // Nothing settled yet: empty history.
    let page = engine
        .list_settled_expenses_page(alice, 10, None)
        .await
        .unwrap();
    assert!(page.expenses.is_empty());
    assert!(page.next_cursor.is_none());

    for obligation in engine
        .list_obligations(bob, Some(ObligationStatus::Pending))
        .await
        .unwrap()
    {
        engine
            .settle_obligation(obligation.id, bob, Utc::now())
            .await
            .unwrap();
    }

    // Both obligations of each expense are paid, but each expense shows once.
    let first = engine
        .list_settled_expenses_page(alice, 2, None)
        .await
        .unwrap();
    assert_eq!(first.expenses.len(), 2);
    assert_eq!(first.expenses[0].description.as_deref(), Some("Spesa 2"));
    let cursor = first.next_cursor.expect("second page expected");

    let second = engine
        .list_settled_expenses_page(alice, 2, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(second.expenses.len(), 1);
    assert_eq!(second.expenses[0].description.as_deref(), Some("Spesa 0"));
    assert!(second.next_cursor.is_none());

    let err = engine
        .list_settled_expenses_page(alice, 2, Some("not-a-cursor"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn expense_source_is_visible_to_participants_only() {
    let (engine, db) = engine_with_db().await;
    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    let mallory = create_user(&db, "mallory").await;

    let mut cmd = expense_cmd(alice, vec![draft(alice, bob, 1200)], 1200);
    cmd.source_kind = SourceKind::Image;
    cmd.source_path = Some("receipts/alice/scontrino.jpg".to_string());
    let expense_id = engine.record_expense(cmd).await.unwrap();

    let (kind, path) = engine.expense_source(expense_id, bob).await.unwrap();
    assert_eq!(kind, SourceKind::Image);
    assert_eq!(path.as_deref(), Some("receipts/alice/scontrino.jpg"));

    let err = engine
        .expense_source(expense_id, mallory)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
