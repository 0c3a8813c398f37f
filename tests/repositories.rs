//! Repository facade integration tests.
//!
//! Run with: cargo test --test repositories
//!
//! Exercises the facades end to end over the in-memory store: uniqueness,
//! referential integrity, shared numbering, status ordering, pagination and
//! error attribution.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use forgestore::model::{
    AccountKind, CommentParent, IssueStatus, NewAccount, NewComment, NewFork, NewIssue, NewPullRequest,
    NewReaction, NewRepository, NewStar, PullRequestStatus, ReactionTarget,
};
use forgestore::sequence::SequenceGenerator;
use forgestore::storage::{ItemStore, MemoryItemStore};
use forgestore::{EntityKind, Error, PageRequest, Repositories};

async fn seed_repo(repos: &Repositories, owner: &str, repo: &str) {
    if repos.accounts.get(owner).await.unwrap().is_none() {
        repos.accounts.create(NewAccount::user(owner)).await.unwrap();
    }
    repos
        .repos
        .create(NewRepository::new(owner, repo))
        .await
        .unwrap();
}

fn assert_not_found(err: Error, expected: EntityKind, field: &str, value: &str) {
    match err {
        Error::EntityNotFound { entity, key } => {
            assert_eq!(entity, expected);
            assert_eq!(key.get(field), Some(value), "unexpected key {key}");
        }
        other => panic!("expected EntityNotFound({expected}), got {other:?}"),
    }
}

fn assert_validation(err: Error, expected_field: &str) {
    match err {
        Error::Validation { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected Validation({expected_field}), got {other:?}"),
    }
}

// =============================================================================
// Sequence
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_distinct() {
    let store: Arc<dyn ItemStore> = Arc::new(MemoryItemStore::new());
    let sequence = SequenceGenerator::new(store);

    let calls = (0..50).map(|_| {
        let sequence = sequence.clone();
        async move { sequence.increment_and_get("acme", "widgets").await }
    });
    let results = futures::future::join_all(calls).await;

    let numbers: BTreeSet<u64> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(numbers, (1..=50).collect::<BTreeSet<u64>>());
    assert_eq!(
        sequence.current("acme", "widgets").await.unwrap(),
        Some(50)
    );
}

#[tokio::test]
async fn test_issues_and_pull_requests_share_numbering() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    seed_repo(&repos, "acme", "gadgets").await;

    let first = repos
        .issues
        .create(NewIssue::new("acme", "widgets", "Crash on start", "acme"))
        .await
        .unwrap();
    let pr = repos
        .pull_requests
        .create(NewPullRequest::new(
            "acme", "widgets", "Fix crash", "acme", "fix", "main",
        ))
        .await
        .unwrap();
    let second = repos
        .issues
        .create(NewIssue::new("acme", "widgets", "Docs", "acme"))
        .await
        .unwrap();
    let other_repo = repos
        .issues
        .create(NewIssue::new("acme", "gadgets", "Other", "acme"))
        .await
        .unwrap();

    assert_eq!(first.issue_number, 1);
    assert_eq!(pr.pr_number, 2);
    assert_eq!(second.issue_number, 3);
    assert_eq!(other_repo.issue_number, 1, "counters are per repository");
}

// =============================================================================
// Uniqueness and referential integrity
// =============================================================================

#[tokio::test]
async fn test_account_names_are_unique_across_kinds() {
    let (repos, _) = common::repositories();
    let original = repos
        .accounts
        .create(NewAccount {
            email: Some("first@example.com".to_string()),
            ..NewAccount::user("acme")
        })
        .await
        .unwrap();

    let err = repos
        .accounts
        .create(NewAccount {
            email: Some("second@example.com".to_string()),
            ..NewAccount::organization("acme")
        })
        .await
        .unwrap_err();

    match err {
        Error::DuplicateEntity { entity, key } => {
            assert_eq!(entity, EntityKind::Account);
            assert_eq!(key.get("name"), Some("acme"));
        }
        other => panic!("expected DuplicateEntity, got {other:?}"),
    }
    let stored = repos.accounts.get("acme").await.unwrap().unwrap();
    assert_eq!(stored, original, "a rejected create must not touch the first account");
    assert_eq!(stored.kind, AccountKind::User);
    assert_eq!(stored.email.as_deref(), Some("first@example.com"));
}

#[tokio::test]
async fn test_account_kind_survives_update() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    let bob = repos.accounts.create(NewAccount::user("bob")).await.unwrap();
    repos
        .stars
        .create(NewStar::new("bob", "acme", "widgets"))
        .await
        .unwrap();

    let mut edited = bob.clone();
    edited.kind = AccountKind::Organization;
    edited.display_name = Some("Bob".to_string());
    let updated = repos.accounts.update(&edited).await.unwrap();

    assert_eq!(updated.kind, AccountKind::User);
    assert_eq!(updated.display_name.as_deref(), Some("Bob"));
    let stored = repos.accounts.get("bob").await.unwrap().unwrap();
    assert_eq!(stored.kind, AccountKind::User);
    assert!(repos.stars.is_starred("bob", "acme", "widgets").await.unwrap());
}

#[tokio::test]
async fn test_repository_requires_owner() {
    let (repos, _) = common::repositories();

    let err = repos
        .repos
        .create(NewRepository::new("ghost", "widgets"))
        .await
        .unwrap_err();

    assert_not_found(err, EntityKind::Account, "name", "ghost");
    assert!(repos.repos.get("ghost", "widgets").await.unwrap().is_none());
}

#[tokio::test]
async fn test_issue_in_missing_repository_leaves_no_trace() {
    let (repos, _) = common::repositories();
    repos.accounts.create(NewAccount::user("acme")).await.unwrap();

    let err = repos
        .issues
        .create(NewIssue::new("acme", "missing", "Lost", "acme"))
        .await
        .unwrap_err();

    assert_not_found(err, EntityKind::Repository, "repo_name", "missing");
    assert!(repos.issues.get("acme", "missing", 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_comment_requires_parent() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;

    let err = repos
        .comments
        .create(NewComment::new(
            CommentParent::Issue,
            "acme",
            "widgets",
            7,
            "+1",
            "acme",
        ))
        .await
        .unwrap_err();

    assert_not_found(err, EntityKind::Issue, "issue_number", "7");
}

#[tokio::test]
async fn test_fork_failures_name_the_failing_position() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    repos.accounts.create(NewAccount::user("bob")).await.unwrap();

    // source missing
    let err = repos
        .forks
        .create(NewFork::new("acme", "nothing", "bob", "widgets"))
        .await
        .unwrap_err();
    assert_not_found(err, EntityKind::Repository, "repo_name", "nothing");

    // fork target missing
    let err = repos
        .forks
        .create(NewFork::new("acme", "widgets", "bob", "widgets"))
        .await
        .unwrap_err();
    assert_not_found(err, EntityKind::Repository, "owner", "bob");

    // success, then duplicate
    repos
        .repos
        .create(NewRepository::new("bob", "widgets"))
        .await
        .unwrap();
    let original = repos
        .forks
        .create(NewFork::new("acme", "widgets", "bob", "widgets"))
        .await
        .unwrap();
    let err = repos
        .forks
        .create(NewFork::new("acme", "widgets", "bob", "widgets"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateEntity {
            entity: EntityKind::Fork,
            ..
        }
    ));
    let stored = repos.forks.get("acme", "widgets", "bob").await.unwrap().unwrap();
    assert_eq!(stored, original);
}

#[tokio::test]
async fn test_fork_into_same_owner_is_invalid() {
    let (repos, store) = common::repositories();

    let err = repos
        .forks
        .create(NewFork::new("acme", "widgets", "acme", "widgets-2"))
        .await
        .unwrap_err();

    assert_validation(err, "fork_owner");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_organization_cannot_star() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    repos
        .accounts
        .create(NewAccount::organization("megacorp"))
        .await
        .unwrap();

    let err = repos
        .stars
        .create(NewStar::new("megacorp", "acme", "widgets"))
        .await
        .unwrap_err();

    assert_not_found(err, EntityKind::User, "name", "megacorp");
}

#[tokio::test]
async fn test_star_attribution_and_listings() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    repos.accounts.create(NewAccount::user("alice")).await.unwrap();

    let err = repos
        .stars
        .create(NewStar::new("nobody", "acme", "widgets"))
        .await
        .unwrap_err();
    assert_not_found(err, EntityKind::User, "name", "nobody");

    let err = repos
        .stars
        .create(NewStar::new("alice", "acme", "missing"))
        .await
        .unwrap_err();
    assert_not_found(err, EntityKind::Repository, "repo_name", "missing");

    let original = repos
        .stars
        .create(NewStar::new("alice", "acme", "widgets"))
        .await
        .unwrap();
    let err = repos
        .stars
        .create(NewStar::new("alice", "acme", "widgets"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateEntity {
            entity: EntityKind::Star,
            ..
        }
    ));
    let stored = repos.stars.get("alice", "acme", "widgets").await.unwrap().unwrap();
    assert_eq!(stored, original);

    assert!(repos.stars.is_starred("alice", "acme", "widgets").await.unwrap());
    let by_user = repos
        .stars
        .list_by_user("alice", &PageRequest::default())
        .await
        .unwrap();
    let gazers = repos
        .stars
        .list_stargazers("acme", "widgets", &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(by_user.items.len(), 1);
    assert_eq!(gazers.items[0].username, "alice");
}

// =============================================================================
// Reactions
// =============================================================================

#[tokio::test]
async fn test_malformed_reaction_target_makes_no_store_call() {
    let (repos, store) = common::repositories();

    for (target_type, target_id) in [
        ("ISSUE", "012"),
        ("ISSUE", "abc"),
        ("ISSUECOMMENT", "12"),
        ("ISSUECOMMENT", "x-abc"),
        ("PRCOMMENT", "3-"),
    ] {
        let mut new = NewReaction::new(
            "acme",
            "widgets",
            &ReactionTarget::issue(1),
            "alice",
            "+1",
        );
        new.target_type = target_type.to_string();
        new.target_id = target_id.to_string();

        let err = repos.reactions.create(new).await.unwrap_err();
        assert_validation(err, "target_id");
    }

    let mut unknown =
        NewReaction::new("acme", "widgets", &ReactionTarget::issue(1), "alice", "+1");
    unknown.target_type = "COMMIT".to_string();
    let err = repos.reactions.create(unknown).await.unwrap_err();
    assert_validation(err, "target_type");

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_reaction_on_comment() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    repos
        .issues
        .create(NewIssue::new("acme", "widgets", "Crash", "acme"))
        .await
        .unwrap();
    let comment = repos
        .comments
        .create(NewComment::new(
            CommentParent::Issue,
            "acme",
            "widgets",
            1,
            "Same here",
            "acme",
        ))
        .await
        .unwrap();
    let target = ReactionTarget::comment(CommentParent::Issue, 1, comment.comment_id.clone());

    repos
        .reactions
        .create(NewReaction::new("acme", "widgets", &target, "acme", "heart"))
        .await
        .unwrap();
    let listed = repos
        .reactions
        .list_for_target(
            "acme",
            "widgets",
            target.target_type(),
            &target.target_id(),
            &PageRequest::default(),
        )
        .await
        .unwrap();

    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].target, target);
    assert_eq!(listed.items[0].emoji, "heart");
}

// =============================================================================
// Status listings and updates
// =============================================================================

#[tokio::test]
async fn test_status_listing_order_follows_updates() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    for title in ["one", "two", "three"] {
        repos
            .issues
            .create(NewIssue::new("acme", "widgets", title, "acme"))
            .await
            .unwrap();
    }
    let numbers = |page: forgestore::Page<forgestore::model::Issue>| {
        page.items.iter().map(|i| i.issue_number).collect::<Vec<_>>()
    };

    let open = repos
        .issues
        .list_by_status("acme", "widgets", IssueStatus::Open, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(numbers(open), vec![3, 2, 1]);

    let mut second = repos.issues.get("acme", "widgets", 2).await.unwrap().unwrap();
    second.status = IssueStatus::Closed;
    repos.issues.update(&second).await.unwrap();

    let open = repos
        .issues
        .list_by_status("acme", "widgets", IssueStatus::Open, &PageRequest::default())
        .await
        .unwrap();
    let closed = repos
        .issues
        .list_by_status("acme", "widgets", IssueStatus::Closed, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(numbers(open), vec![3, 1]);
    assert_eq!(numbers(closed), vec![2]);
}

#[tokio::test]
async fn test_merged_pull_requests_listed_separately() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    let mut pr = repos
        .pull_requests
        .create(NewPullRequest::new(
            "acme", "widgets", "Feature", "acme", "feature", "main",
        ))
        .await
        .unwrap();

    pr.status = PullRequestStatus::Merged;
    repos.pull_requests.update(&pr).await.unwrap();

    let merged = repos
        .pull_requests
        .list_by_status(
            "acme",
            "widgets",
            PullRequestStatus::Merged,
            &PageRequest::default(),
        )
        .await
        .unwrap();
    let open = repos
        .pull_requests
        .list_by_status(
            "acme",
            "widgets",
            PullRequestStatus::Open,
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(merged.items.len(), 1);
    assert!(open.items.is_empty());
}

#[tokio::test]
async fn test_issue_round_trip_and_update() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    let mut new = NewIssue::new("acme", "widgets", "Crash", "acme");
    new.body = Some("Stack trace attached".to_string());
    new.labels = BTreeSet::from(["bug".to_string(), "p1".to_string()]);
    new.assignees = BTreeSet::from(["acme".to_string()]);

    let created = repos.issues.create(new).await.unwrap();
    let fetched = repos.issues.get("acme", "widgets", 1).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let mut edited = fetched.clone();
    edited.body = None;
    edited.labels.clear();
    let updated = repos.issues.update(&edited).await.unwrap();

    assert_eq!(updated.body, None);
    assert!(updated.labels.is_empty());
    assert_eq!(updated.assignees, created.assignees);
    assert_eq!(updated.created, created.created);
    assert!(updated.modified >= created.modified);
}

#[tokio::test]
async fn test_update_of_missing_entity_is_not_found() {
    let (repos, _) = common::repositories();
    seed_repo(&repos, "acme", "widgets").await;
    let issue = repos
        .issues
        .create(NewIssue::new("acme", "widgets", "Crash", "acme"))
        .await
        .unwrap();
    repos.issues.delete("acme", "widgets", 1).await.unwrap();

    let err = repos.issues.update(&issue).await.unwrap_err();

    assert_not_found(err, EntityKind::Issue, "issue_number", "1");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (repos, _) = common::repositories();
    repos.accounts.create(NewAccount::user("acme")).await.unwrap();

    repos.accounts.delete("acme").await.unwrap();
    repos.accounts.delete("acme").await.unwrap();

    assert!(repos.accounts.get("acme").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_rejects_out_of_range_numbers() {
    let (repos, store) = common::repositories();

    let err = repos.issues.delete("acme", "widgets", 0).await.unwrap_err();
    assert_validation(err, "issue_number");

    let err = repos
        .pull_requests
        .delete("acme", "widgets", 1_000_000)
        .await
        .unwrap_err();
    assert_validation(err, "pr_number");

    assert_eq!(store.calls(), 0);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_pagination_visits_every_item_once() {
    let (repos, _) = common::repositories();
    repos.accounts.create(NewAccount::user("acme")).await.unwrap();
    for n in 0..7 {
        repos
            .repos
            .create(NewRepository::new("acme", format!("repo-{n}")))
            .await
            .unwrap();
    }

    let mut request = PageRequest::first(3);
    let mut sizes = Vec::new();
    let mut seen = BTreeSet::new();
    loop {
        let page = repos.repos.list_by_owner("acme", &request).await.unwrap();
        sizes.push(page.items.len());
        seen.extend(page.items.iter().map(|r| r.repo_name.clone()));
        match request.after(&page) {
            Some(next) => request = next,
            None => break,
        }
    }

    assert_eq!(sizes, vec![3, 3, 1]);
    assert_eq!(seen.len(), 7);
}

#[tokio::test]
async fn test_exact_final_page_has_no_token() {
    let (repos, _) = common::repositories();
    repos.accounts.create(NewAccount::user("acme")).await.unwrap();
    for n in 0..4 {
        repos
            .repos
            .create(NewRepository::new("acme", format!("repo-{n}")))
            .await
            .unwrap();
    }

    let first = repos
        .repos
        .list_by_owner("acme", &PageRequest::first(2))
        .await
        .unwrap();
    let second = repos
        .repos
        .list_by_owner("acme", &PageRequest::first(2).after(&first).unwrap())
        .await
        .unwrap();

    assert!(first.has_more());
    assert_eq!(second.items.len(), 2);
    assert!(second.next_token.is_none());
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let (repos, _) = common::repositories();
    for owner in ["acme", "other"] {
        repos.accounts.create(NewAccount::user(owner)).await.unwrap();
        for n in 0..3 {
            repos
                .repos
                .create(NewRepository::new(owner, format!("repo-{n}")))
                .await
                .unwrap();
        }
    }

    let garbage = PageRequest {
        limit: Some(2),
        next_token: Some("not a token".to_string()),
    };
    let err = repos.repos.list_by_owner("acme", &garbage).await.unwrap_err();
    assert_validation(err, "next_token");

    let acme_page = repos
        .repos
        .list_by_owner("acme", &PageRequest::first(2))
        .await
        .unwrap();
    let foreign = PageRequest::first(2).after(&acme_page).unwrap();
    let err = repos.repos.list_by_owner("other", &foreign).await.unwrap_err();
    assert_validation(err, "next_token");

    let err = repos
        .repos
        .list_by_owner("acme", &PageRequest::first(101))
        .await
        .unwrap_err();
    assert_validation(err, "limit");
}
