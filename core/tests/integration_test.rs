//! Integration tests for New-Life
//!
//! These tests verify end-to-end functionality including:
//! - Service workflows through AppState
//! - Persistence round-trips through the file store
//! - Startup restore of sessions and legacy data

use newlife::app::AppState;
use newlife::clock::FixedClock;
use newlife::config::DEFAULT_AVATAR_URL;
use newlife::database::{CardContent, NoteFormatting, Priority};
use newlife::services::EntryKind;
use newlife::storage::{FileStore, KeyValueStore, MemoryStore, SharedStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a file-backed store in a temp directory
async fn create_test_store() -> (Arc<FileStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("store"));
    store.initialize().await.unwrap();

    (Arc::new(store), temp_dir)
}

async fn load_state(store: SharedStore) -> AppState {
    let clock = Arc::new(FixedClock::at("2024-05-01T09:00:00-03:00"));
    AppState::load(store, clock).await
}

#[tokio::test]
async fn test_grocery_project_workflow() {
    let (store, _temp) = create_test_store().await;
    let state = load_state(store.clone()).await;

    let project = state
        .projects
        .create_project("Groceries", None)
        .await
        .unwrap();
    let card = state
        .projects
        .add_card(&project.id, CardContent::todo())
        .await
        .unwrap();
    let milk = state
        .projects
        .add_todo_item(&project.id, &card.id, "Milk")
        .await
        .unwrap();
    state
        .projects
        .toggle_todo_item(&project.id, &card.id, &milk.id)
        .await
        .unwrap();
    state.shutdown().await;

    // Fresh state from disk
    let reloaded = load_state(store).await;
    let cards = reloaded.projects.cards(&project.id).await.unwrap();
    assert_eq!(cards.len(), 1);
    match &cards[0].content {
        CardContent::Todo(todo) => {
            assert_eq!(todo.tasks.len(), 1);
            assert_eq!(todo.tasks[0].text, "Milk");
            assert!(todo.tasks[0].completed);
        }
        other => panic!("expected todo card, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_then_restore_session() {
    let (store, _temp) = create_test_store().await;
    let state = load_state(store.clone()).await;

    let session = state
        .session
        .register("ana", "pw1234", "pw1234", None)
        .await
        .unwrap();
    assert_eq!(session.avatar, DEFAULT_AVATAR_URL);
    state.shutdown().await;

    let reloaded = load_state(store.clone()).await;
    let restored = reloaded.session.restore().await.unwrap();
    assert_eq!(restored.username, "ana");

    // Logging out keeps the user list
    reloaded.session.logout().await;
    reloaded.shutdown().await;
    let again = load_state(store).await;
    assert!(again.session.restore().await.is_none());
    again.session.login("ana", "pw1234").await.unwrap();
}

#[tokio::test]
async fn test_habit_toggle_twice() {
    let state = load_state(Arc::new(MemoryStore::new())).await;

    let habit = state.habits.add_habit("Read", Priority::High).await.unwrap();
    state.habits.toggle_habit(&habit.id).await.unwrap();
    let habit = state.habits.toggle_habit(&habit.id).await.unwrap();

    assert_eq!(habit.streak, 0);
    assert_eq!(habit.best_streak, 1);
    assert!(!habit.completed);
}

#[tokio::test]
async fn test_financial_card_balance() {
    let state = load_state(Arc::new(MemoryStore::new())).await;
    let project = state.projects.create_project("Budget", None).await.unwrap();
    let card = state
        .projects
        .add_card(&project.id, CardContent::financial())
        .await
        .unwrap();

    state
        .projects
        .add_entry(&project.id, &card.id, "Salary", "1000", EntryKind::Income)
        .await
        .unwrap();
    state
        .projects
        .add_transaction(&project.id, &card.id, "Rent", "-400")
        .await
        .unwrap();

    let cards = state.projects.cards(&project.id).await.unwrap();
    match &cards[0].content {
        CardContent::Financial(financial) => {
            assert_eq!(financial.data.display_balance().amount, "600.00");
            let sum: f64 = financial.data.transactions.iter().map(|t| t.amount).sum();
            assert_eq!(financial.data.balance, sum);
        }
        other => panic!("expected financial card, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_middle_card() {
    let state = load_state(Arc::new(MemoryStore::new())).await;
    let project = state.projects.create_project("Board", None).await.unwrap();

    let mut ids = Vec::new();
    for text in ["one", "two", "three"] {
        let card = state
            .projects
            .add_card(&project.id, CardContent::note(text, NoteFormatting::default()))
            .await
            .unwrap();
        ids.push(card.id);
    }

    state.projects.delete_card(&project.id, &ids[1]).await.unwrap();

    let cards = state.projects.cards(&project.id).await.unwrap();
    let orders: Vec<usize> = cards.iter().map(|c| c.order).collect();
    assert_eq!(orders, vec![0, 1]);
    assert_eq!(cards[0].id, ids[0]);
    assert_eq!(cards[1].id, ids[2]);
}

#[tokio::test]
async fn test_all_collections_round_trip() {
    let (store, _temp) = create_test_store().await;
    let state = load_state(store.clone()).await;

    state.tasks.add_task("Buy bread").await.unwrap();
    let task = state.tasks.add_task("Pay bills").await.unwrap();
    state.tasks.toggle_task(&task.id).await.unwrap();

    let project = state.projects.create_project("Trip", Some("#E3F2FD")).await.unwrap();
    state
        .projects
        .add_card(&project.id, CardContent::image("file:///beach.jpg", "Beach"))
        .await
        .unwrap();
    let note = state
        .projects
        .add_card(&project.id, CardContent::note("Pack sunscreen", NoteFormatting::default()))
        .await
        .unwrap();
    state.projects.move_card_up(&project.id, 1).await.unwrap();
    state
        .projects
        .update_card(
            &project.id,
            &note.id,
            CardContent::note("Pack sunscreen and hats", NoteFormatting { bold: true, italic: false, list: true }),
        )
        .await
        .unwrap();

    let date = state.reminders.parse_date("2024-05-03 14:00").unwrap();
    state.reminders.add_reminder("Dentist", date).await.unwrap();

    let habit = state.habits.add_habit("Run", Priority::Low).await.unwrap();
    state.habits.toggle_habit(&habit.id).await.unwrap();

    state.shutdown().await;

    let reloaded = load_state(store).await;
    assert_eq!(reloaded.tasks.list_tasks().await, state.tasks.list_tasks().await);
    assert_eq!(
        reloaded.projects.list_projects().await,
        state.projects.list_projects().await
    );
    assert_eq!(
        reloaded.reminders.list_reminders().await,
        state.reminders.list_reminders().await
    );
    assert_eq!(reloaded.habits.list_habits().await, state.habits.list_habits().await);

    let dashboard = reloaded.dashboard().await;
    assert_eq!(dashboard.tasks.total, 2);
    assert_eq!(dashboard.tasks.percentage, 50);
    assert_eq!(dashboard.habits_done_today, 1);
}

#[tokio::test]
async fn test_corrupt_collection_loads_empty() {
    let (store, _temp) = create_test_store().await;
    store.set("@habits", "not json".to_string()).await.unwrap();
    store.set("@todoList", "[]".to_string()).await.unwrap();

    let state = load_state(store).await;
    assert!(state.habits.list_habits().await.is_empty());

    // The app keeps working on top of it
    state.habits.add_habit("Read", Priority::High).await.unwrap();
    assert_eq!(state.habits.list_habits().await.len(), 1);
}

#[tokio::test]
async fn test_legacy_cards_migrated_at_startup() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_raw(
            "@projects",
            r##"[{"id": "1714550400000", "name": "Casa", "color": "#E8F5E9", "cards": [
                {"id": "a", "type": "note", "content": "Existing", "formatting": {"bold": false, "italic": false, "list": false}, "order": 0}
            ]}]"##,
        )
        .await;
    store
        .insert_raw(
            "cards_Casa",
            r#"[{"type": "finance", "depositedValues": [{"name": "Salário", "value": 1000}]}]"#,
        )
        .await;

    let state = load_state(store.clone()).await;
    state.shutdown().await;

    let cards = state.projects.cards("1714550400000").await.unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[1].order, 1);
    assert_eq!(cards[1].content.kind(), "financial");
    assert!(store.get("cards_Casa").await.unwrap().is_none());
}
