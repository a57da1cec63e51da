mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CountingClassifier, FaultyCounterStore, Harness};
use wishwall_domain::comments::{CommentCreate, CommentService};
use wishwall_domain::consistency::ConsistencyCoordinator;
use wishwall_domain::error::{DomainError, RejectionReason};
use wishwall_domain::identity::ActorIdentity;
use wishwall_domain::memory::{InMemoryInteractionStore, InMemoryProfileDirectory};
use wishwall_domain::moderation::ModerationGate;
use wishwall_domain::ports::interactions::{InteractionStore, WishRepository};
use wishwall_domain::ports::profiles::PublicProfile;

fn comment_on(wish_id: &str, content: &str) -> CommentCreate {
    CommentCreate {
        wish_id: wish_id.to_string(),
        content: content.to_string(),
        parent_id: None,
    }
}

fn reply_to(wish_id: &str, parent_id: &str, content: &str) -> CommentCreate {
    CommentCreate {
        parent_id: Some(parent_id.to_string()),
        ..comment_on(wish_id, content)
    }
}

#[tokio::test]
async fn safe_comment_on_public_wish_is_created_and_counted() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", true).await;
    harness
        .profiles
        .upsert(PublicProfile {
            user_id: "u1".to_string(),
            nickname: "小雪".to_string(),
            avatar_id: Some("3".to_string()),
        })
        .await;
    assert_eq!(harness.wish("w1").await.comment_count, 0);

    let view = harness
        .comments
        .create(
            &ActorIdentity::with_user_id("u1"),
            comment_on("w1", "我爱这个世界"),
        )
        .await
        .expect("comment");

    assert_eq!(view.wish_id, "w1");
    assert_eq!(view.author_id, "u1");
    assert_eq!(view.author_nickname, "小雪");
    assert_eq!(view.author_avatar_id.as_deref(), Some("3"));
    assert_eq!(view.content, "我爱这个世界");
    assert_eq!(harness.classifier.calls(), 1);
    assert_eq!(harness.wish("w1").await.comment_count, 1);
    harness.assert_counters_consistent("w1").await;
}

#[tokio::test]
async fn private_wish_rejects_strangers_before_moderation() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", false).await;

    let err = harness
        .comments
        .create(
            &ActorIdentity::with_user_id("stranger"),
            comment_on("w1", "我爱这个世界"),
        )
        .await
        .expect_err("forbidden");

    assert!(matches!(err, DomainError::CommentForbidden));
    assert_eq!(harness.classifier.calls(), 0);
    assert_eq!(harness.wish("w1").await.comment_count, 0);
    assert!(harness.store.list_comments("w1").await.unwrap().is_empty());
}

#[tokio::test]
async fn owner_may_comment_on_own_private_wish() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", false).await;

    harness
        .comments
        .create(&ActorIdentity::with_user_id("owner"), comment_on("w1", "给自己打气"))
        .await
        .expect("owner comment");
    assert_eq!(harness.wish("w1").await.comment_count, 1);
}

#[tokio::test]
async fn oracle_without_choices_fails_closed_and_writes_nothing() {
    let harness = Harness::with_classifier(CountingClassifier::answering(None));
    harness.seed_wish("w1", "owner", true).await;

    let err = harness
        .comments
        .create(&ActorIdentity::with_user_id("u1"), comment_on("w1", "hello"))
        .await
        .expect_err("fail closed");

    assert!(matches!(
        err,
        DomainError::ContentRejected(RejectionReason::Indeterminate)
    ));
    assert_eq!(harness.classifier.calls(), 1);
    assert!(harness.store.list_comments("w1").await.unwrap().is_empty());
    assert_eq!(harness.wish("w1").await.comment_count, 0);
}

#[tokio::test]
async fn unsafe_and_empty_content_carry_their_reason() {
    let harness = Harness::with_classifier(CountingClassifier::answering(Some("false")));
    harness.seed_wish("w1", "owner", true).await;
    let user = ActorIdentity::with_user_id("u1");

    let unsafe_err = harness
        .comments
        .create(&user, comment_on("w1", "something nasty"))
        .await
        .expect_err("unsafe");
    assert!(matches!(
        unsafe_err,
        DomainError::ContentRejected(RejectionReason::Unsafe)
    ));

    let empty_err = harness
        .comments
        .create(&user, comment_on("w1", "   "))
        .await
        .expect_err("empty");
    assert!(matches!(
        empty_err,
        DomainError::ContentRejected(RejectionReason::Empty)
    ));
    assert_eq!(harness.classifier.calls(), 1);
    harness.assert_counters_consistent("w1").await;
}

#[tokio::test]
async fn missing_wish_is_reported_before_moderation() {
    let harness = Harness::new();
    let err = harness
        .comments
        .create(&ActorIdentity::with_user_id("u1"), comment_on("nope", "hi"))
        .await
        .expect_err("missing");
    assert!(matches!(err, DomainError::WishNotFound));
    assert_eq!(harness.classifier.calls(), 0);
}

#[tokio::test]
async fn replies_must_target_a_top_level_comment_on_the_same_wish() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", true).await;
    harness.seed_wish("w2", "owner", true).await;
    let user = ActorIdentity::with_user_id("u1");

    let root = harness
        .comments
        .create(&user, comment_on("w1", "第一条"))
        .await
        .expect("root");
    let reply = harness
        .comments
        .create(&user, reply_to("w1", &root.comment_id, "回复"))
        .await
        .expect("reply");
    assert_eq!(reply.parent_id.as_deref(), Some(root.comment_id.as_str()));

    let cross = harness
        .comments
        .create(&user, reply_to("w2", &root.comment_id, "串门"))
        .await
        .expect_err("other wish");
    assert!(matches!(cross, DomainError::InvalidParent(_)));

    let nested = harness
        .comments
        .create(&user, reply_to("w1", &reply.comment_id, "套娃"))
        .await
        .expect_err("nested");
    assert!(matches!(nested, DomainError::InvalidParent(_)));

    let dangling = harness
        .comments
        .create(&user, reply_to("w1", "ghost", "悬空"))
        .await
        .expect_err("dangling");
    assert!(matches!(dangling, DomainError::InvalidParent(_)));

    assert_eq!(harness.wish("w1").await.comment_count, 2);
    assert_eq!(harness.wish("w2").await.comment_count, 0);
    harness.assert_counters_consistent("w1").await;
    harness.assert_counters_consistent("w2").await;
}

#[tokio::test]
async fn delete_is_limited_to_author_wish_owner_and_admin() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", true).await;
    let author = ActorIdentity::with_user_id("author");

    let mut ids = Vec::new();
    for text in ["一", "二", "三"] {
        let view = harness
            .comments
            .create(&author, comment_on("w1", text))
            .await
            .expect("comment");
        ids.push(view.comment_id);
    }

    let err = harness
        .comments
        .delete(&ActorIdentity::with_user_id("stranger"), &ids[0])
        .await
        .expect_err("stranger");
    assert!(matches!(err, DomainError::Forbidden(_)));
    assert_eq!(harness.wish("w1").await.comment_count, 3);

    harness
        .comments
        .delete(&author, &ids[0])
        .await
        .expect("author delete");
    harness
        .comments
        .delete(&ActorIdentity::with_user_id("owner"), &ids[1])
        .await
        .expect("owner delete");
    harness
        .comments
        .delete(&ActorIdentity::admin("root"), &ids[2])
        .await
        .expect("admin delete");

    assert_eq!(harness.wish("w1").await.comment_count, 0);
    harness.assert_counters_consistent("w1").await;

    let again = harness
        .comments
        .delete(&author, &ids[0])
        .await
        .expect_err("already gone");
    assert!(matches!(again, DomainError::CommentNotFound));
}

#[tokio::test]
async fn deleting_a_top_level_comment_removes_its_replies() {
    let harness = Harness::new();
    harness.seed_wish("w1", "owner", true).await;
    let user = ActorIdentity::with_user_id("u1");

    let root = harness
        .comments
        .create(&user, comment_on("w1", "楼主"))
        .await
        .expect("root");
    for text in ["沙发", "板凳"] {
        harness
            .comments
            .create(&user, reply_to("w1", &root.comment_id, text))
            .await
            .expect("reply");
    }
    harness
        .comments
        .create(&user, comment_on("w1", "路过"))
        .await
        .expect("other");
    assert_eq!(harness.wish("w1").await.comment_count, 4);

    harness
        .comments
        .delete(&user, &root.comment_id)
        .await
        .expect("delete root");

    assert_eq!(harness.wish("w1").await.comment_count, 1);
    harness.assert_counters_consistent("w1").await;
}

#[tokio::test]
async fn failed_counter_write_leaves_no_comment_behind() {
    let inner = InMemoryInteractionStore::new(Duration::from_secs(1));
    let seed = Harness::new();
    let wish = seed.seed_wish("w1", "owner", true).await;
    WishRepository::create(&inner, &wish).await.expect("seed");

    let repository: Arc<dyn WishRepository> = Arc::new(inner.clone());
    let coordinator = ConsistencyCoordinator::new(Arc::new(FaultyCounterStore {
        inner: inner.clone(),
    }));
    let comments = CommentService::new(
        repository,
        coordinator,
        ModerationGate::new(CountingClassifier::safe(), Duration::from_secs(1)),
        Arc::new(InMemoryProfileDirectory::new()),
    );

    let err = comments
        .create(&ActorIdentity::with_user_id("u1"), comment_on("w1", "加油"))
        .await
        .expect_err("injected fault");
    assert!(matches!(err, DomainError::Transient(_)));

    assert!(inner.list_comments("w1").await.unwrap().is_empty());
    let stored = WishRepository::get(&inner, "w1")
        .await
        .unwrap()
        .expect("wish");
    assert_eq!(stored.comment_count, 0);
}

#[tokio::test]
async fn profile_outage_does_not_undo_a_committed_comment() {
    let harness = Harness::with_broken_profiles();
    harness.seed_wish("w1", "owner", true).await;
    let actor = ActorIdentity {
        username: "fallback-name".to_string(),
        ..ActorIdentity::with_user_id("u1")
    };

    let view = harness
        .comments
        .create(&actor, comment_on("w1", "一切顺利"))
        .await
        .expect("comment survives enrichment failure");

    assert_eq!(view.author_nickname, "fallback-name");
    assert_eq!(harness.wish("w1").await.comment_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counters_track_rows_under_mixed_concurrent_traffic() {
    let harness = Arc::new(Harness::new());
    harness.seed_wish("w1", "owner", true).await;

    let mut handles = Vec::new();
    for index in 0..12 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            let user = ActorIdentity::with_user_id(format!("u{}", index % 4));
            harness.likes.toggle(&user, "w1").await.expect("toggle");
            let view = harness
                .comments
                .create(&user, comment_on("w1", "热闹"))
                .await
                .expect("comment");
            if index % 3 == 0 {
                harness
                    .comments
                    .delete(&user, &view.comment_id)
                    .await
                    .expect("delete");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("join");
    }

    let wish = harness.wish("w1").await;
    assert_eq!(wish.comment_count, 8);
    harness.assert_counters_consistent("w1").await;
}
