mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FaultyCounterStore, Harness};
use wishwall_domain::consistency::ConsistencyCoordinator;
use wishwall_domain::counters::{AggregateCounter, CounterDelta, CounterKind};
use wishwall_domain::error::DomainError;
use wishwall_domain::identity::ActorIdentity;
use wishwall_domain::likes::LikeService;
use wishwall_domain::memory::InMemoryInteractionStore;
use wishwall_domain::ports::interactions::{InteractionStore, WishRepository};
use wishwall_domain::wishes::Wish;

#[tokio::test]
async fn like_then_unlike_flips_state_and_count() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", true).await;
    let user = ActorIdentity::with_user_id("u1");

    let first = harness.likes.toggle(&user, "w1").await.expect("like");
    assert_eq!(first.like_count, 1);
    assert!(first.liked);
    assert_eq!(first.wish_id, "w1");

    let second = harness.likes.toggle(&user, "w1").await.expect("unlike");
    assert_eq!(second.like_count, 0);
    assert!(!second.liked);

    harness.assert_counters_consistent("w1").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_by_one_actor_converge_on_parity() {
    for rounds in [7usize, 8] {
        let harness = Arc::new(Harness::new());
        harness.seed_wish("w1", "owner", true).await;

        let mut handles = Vec::new();
        for _ in 0..rounds {
            let harness = harness.clone();
            handles.push(tokio::spawn(async move {
                let user = ActorIdentity::with_user_id("u1");
                harness.likes.toggle(&user, "w1").await
            }));
        }
        for handle in handles {
            let outcome = handle.await.expect("join").expect("toggle");
            assert!(outcome.like_count <= 1);
        }

        let wish = harness.wish("w1").await;
        let liked = harness
            .store
            .find_like("w1", "u1")
            .await
            .expect("find")
            .is_some();
        assert_eq!(liked, rounds % 2 == 1, "rounds={rounds}");
        assert_eq!(wish.like_count, u64::from(liked));
        harness.assert_counters_consistent("w1").await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_by_many_actors_all_count() {
    let harness = Arc::new(Harness::new());
    harness.seed_wish("w1", "owner", true).await;

    let mut handles = Vec::new();
    for index in 0..25 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            let user = ActorIdentity::with_user_id(format!("u{index}"));
            harness.likes.toggle(&user, "w1").await
        }));
    }
    for handle in handles {
        assert!(handle.await.expect("join").expect("toggle").liked);
    }

    assert_eq!(harness.wish("w1").await.like_count, 25);
    harness.assert_counters_consistent("w1").await;
    assert_eq!(harness.store.locks().tracked(), 0);
}

#[tokio::test]
async fn toggling_a_missing_wish_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .likes
        .toggle(&ActorIdentity::with_user_id("u1"), "missing")
        .await
        .expect_err("missing wish");
    assert!(matches!(err, DomainError::WishNotFound));
    assert_eq!(harness.store.locks().tracked(), 0);
}

#[tokio::test]
async fn private_wish_cannot_be_liked_by_strangers() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", false).await;

    let err = harness
        .likes
        .toggle(&ActorIdentity::with_user_id("stranger"), "w1")
        .await
        .expect_err("hidden");
    assert!(matches!(err, DomainError::WishNotFound));

    let own = harness
        .likes
        .toggle(&ActorIdentity::with_user_id("owner"), "w1")
        .await
        .expect("owner like");
    assert!(own.liked);
}

#[tokio::test]
async fn failed_counter_write_leaves_no_like_behind() {
    let inner = InMemoryInteractionStore::new(Duration::from_secs(1));
    let wish = Wish {
        wish_id: "w1".to_string(),
        owner_id: "owner".to_string(),
        content: "平安喜乐".to_string(),
        is_public: true,
        like_count: 0,
        comment_count: 0,
        revision: 0,
        created_at_ms: 1,
        updated_at_ms: 1,
    };
    WishRepository::create(&inner, &wish).await.expect("seed");

    let faulty = FaultyCounterStore {
        inner: inner.clone(),
    };
    let likes = LikeService::new(ConsistencyCoordinator::new(Arc::new(faulty)));
    let err = likes
        .toggle(&ActorIdentity::with_user_id("u1"), "w1")
        .await
        .expect_err("injected fault");
    assert!(err.is_retryable());

    assert!(inner.find_like("w1", "u1").await.expect("find").is_none());
    let stored = WishRepository::get(&inner, "w1")
        .await
        .expect("get")
        .expect("wish");
    assert_eq!(stored.like_count, 0);
    assert_eq!(stored.revision, 0);
    assert_eq!(inner.locks().tracked(), 0);
}

#[tokio::test]
async fn decrement_on_zero_counter_stays_at_zero() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", true).await;

    let coordinator = ConsistencyCoordinator::new(Arc::new(harness.store.clone()));
    let values = coordinator
        .run("w1", |tx| {
            Box::pin(async move {
                let first =
                    AggregateCounter::adjust(tx, CounterKind::Likes, CounterDelta::Decrement)
                        .await?;
                let second =
                    AggregateCounter::adjust(tx, CounterKind::Comments, CounterDelta::Decrement)
                        .await?;
                Ok::<_, DomainError>((first, second))
            })
        })
        .await
        .expect("adjust");

    assert_eq!(values, (0, 0));
    let wish = harness.wish("w1").await;
    assert_eq!(wish.like_count, 0);
    assert_eq!(wish.comment_count, 0);
}

#[tokio::test]
async fn toggles_on_other_wishes_do_not_wait_for_a_held_lock() {
    let harness = Harness::new();
    harness.seed_wish("busy", "owner", true).await;
    harness.seed_wish("free", "owner", true).await;

    let _held = harness
        .store
        .begin("busy")
        .await
        .expect("begin")
        .expect("wish");

    let outcome = tokio::time::timeout(
        Duration::from_millis(500),
        harness
            .likes
            .toggle(&ActorIdentity::with_user_id("u1"), "free"),
    )
    .await
    .expect("not blocked")
    .expect("toggle");
    assert!(outcome.liked);
}
