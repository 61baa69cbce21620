//! Push reconciliation and ordering replay against a recording gateway double

use async_trait::async_trait;
use prio_board::gateway::{CardGateway, CreateCard, GatewayError, UpdateCard};
use prio_board::store::RecordStore;
use prio_board::sync::{OrderSynchronizer, RemoteSyncReconciler};
use prio_common::events::EventBus;
use prio_common::model::{Board, BoardList, RemoteCard, RemoteRef, ScoringScheme, UseCaseRecord};
use prio_common::Error;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Create {
        list_id: String,
        name: String,
        source: Option<String>,
    },
    Update {
        card_id: String,
        desc: Option<String>,
        list_id: Option<String>,
    },
    Move(String),
}

/// Recording gateway: answers from canned behavior, logs every call
#[derive(Default)]
struct FakeGateway {
    calls: Mutex<Vec<Call>>,
    /// Card ids whose update_card calls fail
    broken_updates: Mutex<HashSet<String>>,
    /// Card ids whose move_card_to_top calls fail
    broken_moves: Mutex<HashSet<String>>,
    /// When set, every create_card call fails
    refuse_creates: Mutex<bool>,
    next_id: AtomicUsize,
}

impl FakeGateway {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn break_update(&self, card_id: &str) {
        self.broken_updates.lock().unwrap().insert(card_id.into());
    }

    fn break_move(&self, card_id: &str) {
        self.broken_moves.lock().unwrap().insert(card_id.into());
    }

    fn card(&self, id: String, list_id: &str) -> RemoteCard {
        RemoteCard {
            short_id: Some(1),
            short_link: Some(format!("link-{id}")),
            name: String::new(),
            desc: String::new(),
            list_id: list_id.to_string(),
            pos: None,
            id,
        }
    }

    fn not_found() -> GatewayError {
        GatewayError::Api {
            status: 404,
            body: "card not found".to_string(),
        }
    }
}

#[async_trait]
impl CardGateway for FakeGateway {
    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_lists(&self, _board_id: &str) -> Result<Vec<BoardList>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_cards(&self, _list_id: &str) -> Result<Vec<RemoteCard>, GatewayError> {
        Ok(Vec::new())
    }

    async fn create_card(&self, req: CreateCard) -> Result<RemoteCard, GatewayError> {
        self.calls.lock().unwrap().push(Call::Create {
            list_id: req.list_id.clone(),
            name: req.name.clone(),
            source: req.source_card_id.clone(),
        });
        if *self.refuse_creates.lock().unwrap() {
            return Err(Self::not_found());
        }
        let id = format!("card-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(self.card(id, &req.list_id))
    }

    async fn update_card(
        &self,
        card_id: &str,
        req: UpdateCard,
    ) -> Result<RemoteCard, GatewayError> {
        self.calls.lock().unwrap().push(Call::Update {
            card_id: card_id.to_string(),
            desc: req.desc.clone(),
            list_id: req.list_id.clone(),
        });
        if self.broken_updates.lock().unwrap().contains(card_id) {
            return Err(Self::not_found());
        }
        Ok(self.card(card_id.to_string(), req.list_id.as_deref().unwrap_or("l")))
    }

    async fn move_card_to_top(&self, card_id: &str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(Call::Move(card_id.to_string()));
        if self.broken_moves.lock().unwrap().contains(card_id) {
            return Err(Self::not_found());
        }
        Ok(())
    }
}

fn store() -> Arc<RwLock<RecordStore>> {
    Arc::new(RwLock::new(RecordStore::new(
        ScoringScheme::weighted(),
        EventBus::new(64),
    )))
}

async fn add_selected(
    store: &Arc<RwLock<RecordStore>>,
    name: &str,
    remote: Option<&str>,
) -> prio_common::model::RecordId {
    let mut s = store.write().await;
    let record = UseCaseRecord::new(name, "", s.scheme());
    let id = s.add(record);
    if let Some(card_id) = remote {
        s.attach_remote(id, RemoteRef::new(card_id)).unwrap();
    }
    s.set_selected(id, true).unwrap();
    id
}

#[tokio::test]
async fn test_push_mixed_batch_counts() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();

    add_selected(&store, "new one", None).await;
    add_selected(&store, "new two", None).await;
    add_selected(&store, "linked ok", Some("c-ok")).await;
    let broken = add_selected(&store, "linked broken", Some("c-broken")).await;
    gateway.break_update("c-broken");

    let reconciler = RemoteSyncReconciler::new(gateway.clone(), store.clone());
    let report = reconciler.push_selected(Some("dest")).await.unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.copied, 1);
    assert_eq!(report.failed, 0);
    assert!(report.first_error.is_none());

    // The copy fallback duplicated the unreachable card into the target list.
    let calls = gateway.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::Create { list_id, source: Some(src), .. }
            if list_id == "dest" && src == "c-broken"
    )));

    // The broken record now points at its copy, not the old card.
    let s = store.read().await;
    let card_id = &s.get(broken).unwrap().remote.as_ref().unwrap().card_id;
    assert_ne!(card_id, "c-broken");
}

#[tokio::test]
async fn test_push_created_cards_get_linked_and_token_rewritten() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();
    let id = add_selected(&store, "fresh", None).await;

    let reconciler = RemoteSyncReconciler::new(gateway.clone(), store.clone());
    let report = reconciler.push_selected(Some("dest")).await.unwrap();
    assert_eq!(report.created, 1);

    let s = store.read().await;
    let remote = s.get(id).unwrap().remote.clone().unwrap();
    assert!(remote.short_link.is_some());

    // Creation carried the temporary token; the follow-up rewrite carries the
    // remote-assigned short link.
    let calls = gateway.calls();
    let rewrite = calls
        .iter()
        .find_map(|c| match c {
            Call::Update { card_id, desc: Some(desc), .. } if *card_id == remote.card_id => {
                Some(desc.clone())
            }
            _ => None,
        })
        .expect("token rewrite call");
    assert!(rewrite.contains(&format!("ref={}", remote.ref_token())));
}

#[tokio::test]
async fn test_push_empty_selection_is_validation_error() {
    let gateway = Arc::new(FakeGateway::default());
    let reconciler = RemoteSyncReconciler::new(gateway.clone(), store());
    let err = reconciler.push_selected(Some("dest")).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_push_create_without_dest_list_makes_no_remote_calls() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();
    add_selected(&store, "linked", Some("c1")).await;
    add_selected(&store, "unlinked", None).await;

    let reconciler = RemoteSyncReconciler::new(gateway.clone(), store);
    let err = reconciler.push_selected(None).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    // Validation rejects the whole batch before the linked record is touched.
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_push_update_failure_without_dest_counts_failed() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();
    add_selected(&store, "ok", Some("c-ok")).await;
    add_selected(&store, "broken", Some("c-broken")).await;
    gateway.break_update("c-broken");

    let reconciler = RemoteSyncReconciler::new(gateway.clone(), store);
    let report = reconciler.push_selected(None).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 1);
    assert!(report.first_error.unwrap().contains("404"));
}

#[tokio::test]
async fn test_push_failures_are_independent() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();
    add_selected(&store, "first new", None).await;
    add_selected(&store, "second new", None).await;
    *gateway.refuse_creates.lock().unwrap() = true;

    let reconciler = RemoteSyncReconciler::new(gateway.clone(), store);
    let report = reconciler.push_selected(Some("dest")).await.unwrap();
    // Both failures were attempted; the first did not short-circuit the rest.
    assert_eq!(report.failed, 2);
    assert_eq!(
        gateway
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_order_replay_moves_bottom_up() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();
    // Desired top-down order: a, b, c.
    let mut ordered = Vec::new();
    for (name, card) in [("a", "card-a"), ("b", "card-b"), ("c", "card-c")] {
        let id = add_selected(&store, name, Some(card)).await;
        ordered.push(store.read().await.get(id).unwrap().clone());
    }

    let report = OrderSynchronizer::new(gateway.clone()).replay(&ordered).await;
    assert_eq!(report.moved, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.error, None);

    // Bottom-up replay: c first, a last, so a ends on top.
    let moves: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Move(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(moves, vec!["card-c", "card-b", "card-a"]);
}

#[tokio::test]
async fn test_order_replay_skips_unlinked_and_stops_on_failure() {
    let gateway = Arc::new(FakeGateway::default());
    let store = store();
    let mut ordered = Vec::new();
    for (name, card) in [("a", Some("card-a")), ("local", None), ("c", Some("card-c"))] {
        let id = add_selected(&store, name, card).await;
        ordered.push(store.read().await.get(id).unwrap().clone());
    }
    gateway.break_move("card-c");

    let report = OrderSynchronizer::new(gateway.clone()).replay(&ordered).await;
    // card-c is replayed first (bottom-up) and fails, stopping the run.
    assert_eq!(report.moved, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.total, 3);
    assert!(report.error.is_some());
    assert_eq!(gateway.calls(), vec![Call::Move("card-c".to_string())]);
}
