//! End-to-end poll lifecycle tests through the polling service

use livepoll::{
    Error, ErrorKind, PollingService, Result,
    config::PollConfig,
    polling::{ChangeEntity, Snapshot},
    types::{Identity, PollStatus, UserId},
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn creator() -> Identity {
    Identity::new("uid-alice", "Alice")
}

#[tokio::test]
async fn test_full_poll_lifecycle() -> Result<()> {
    println!("🗳️ Testing full poll lifecycle...");

    let service = PollingService::for_testing();
    let alice = creator();

    let poll = service.create_poll("Team lunch?", &["A", "B", "C"], &alice)?;
    println!("✅ Poll created: {}", poll.id);

    // Option ids handed back at creation are the vote targets
    let ids: Vec<String> = poll.options.iter().map(|o| o.id.clone()).collect();
    service.cast_vote(&poll.id, &UserId::new("u1"), &ids[0])?;
    service.cast_vote(&poll.id, &UserId::new("u2"), &ids[0])?;
    service.cast_vote(&poll.id, &UserId::new("u3"), &ids[1])?;
    println!("✅ Three votes recorded");

    let results = service.compute_results(&poll.id)?;
    let lines: Vec<(&str, &str, u64, f64)> = results
        .options
        .iter()
        .map(|l| (l.option_id.as_str(), l.text.as_str(), l.votes, l.percentage))
        .collect();
    assert_eq!(
        lines,
        vec![("0", "A", 2, 66.7), ("1", "B", 1, 33.3), ("2", "C", 0, 0.0)]
    );
    println!("✅ Results in option order: {lines:?}");

    service.close_poll(&poll.id, &alice.user_id)?;

    let err = assert_err!(service.cast_vote(&poll.id, &UserId::new("u4"), "2"));
    assert_eq!(err.kind(), ErrorKind::PollInactive);

    let err = assert_err!(service.close_poll(&poll.id, &alice.user_id));
    assert_eq!(err.kind(), ErrorKind::AlreadyClosed);
    assert_eq!(service.get_poll(&poll.id)?.status, PollStatus::Closed);
    println!("✅ Closed poll rejects votes and second close");

    // Closing does not alter results
    let final_results = service.compute_results(&poll.id)?;
    assert_eq!(final_results.total_votes, 3);
    assert_eq!(final_results.status, PollStatus::Closed);

    Ok(())
}

#[tokio::test]
async fn test_non_creator_cannot_close() -> Result<()> {
    let service = PollingService::for_testing();
    let poll = service.create_poll("Q", &["x", "y"], &creator())?;

    for intruder in ["uid-bob", "uid-carol", "UID-ALICE"] {
        let err = assert_err!(service.close_poll(&poll.id, &UserId::new(intruder)));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    assert_eq!(service.get_poll(&poll.id)?.status, PollStatus::Active);

    let err = assert_err!(service.close_poll(&poll.id, &UserId::new("")));
    assert_eq!(err.kind(), ErrorKind::AuthError);

    let err = assert_err!(service.close_poll(&Uuid::new_v4(), &creator().user_id));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_invalid_option_appends_nothing() -> Result<()> {
    let service = PollingService::for_testing();
    let poll = service.create_poll("Q", &["x", "y"], &creator())?;
    let voter = UserId::new("uid-dan");

    for bad in ["2", "-1", "x", "", " 0"] {
        let err = assert_err!(service.cast_vote(&poll.id, &voter, bad));
        assert!(matches!(err, Error::InvalidOption { .. }), "option {bad:?}");
    }

    assert!(!service.has_voted(&poll.id, &voter)?);
    assert!(service.list_votes(&poll.id)?.is_empty());

    // Still free to cast a valid vote afterwards
    assert_ok!(service.cast_vote(&poll.id, &voter, "0"));

    Ok(())
}

#[tokio::test]
async fn test_creation_validation_matrix() -> Result<()> {
    let service = PollingService::for_testing();
    let alice = creator();

    let rejected: Vec<(&str, Vec<&str>)> = vec![
        ("", vec!["a", "b"]),
        ("Q", vec!["only one"]),
        ("Q", vec![]),
        ("Q", vec!["a", ""]),
        ("Q", vec!["Same", "same"]),
        ("Q", vec!["x", " X  ", "y"]),
        ("Q", vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"]),
    ];

    for (question, options) in rejected {
        let err = assert_err!(service.create_poll(question, &options, &alice));
        assert_eq!(err.kind(), ErrorKind::ValidationError, "{question:?} {options:?}");
    }

    let accepted = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];
    let poll = assert_ok!(service.create_poll("Ten options", &accepted, &alice));
    assert_eq!(poll.options.last().map(|o| o.id.as_str()), Some("9"));

    let err = assert_err!(service.create_poll("Q", &["a", "b"], &Identity::new(" ", "Ghost")));
    assert_eq!(err.kind(), ErrorKind::AuthError);

    assert_eq!(service.list_polls(None)?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_display_name_is_a_creation_snapshot() -> Result<()> {
    let service = PollingService::for_testing();

    let poll = service.create_poll("Q", &["a", "b"], &Identity::new("uid-eve", "Eve"))?;

    // A later call with a new display name does not touch existing polls
    let renamed = Identity::new("uid-eve", "Evelyn");
    let newer = service.create_poll("Q2", &["a", "b"], &renamed)?;

    assert_eq!(service.get_poll(&poll.id)?.creator_display_name, "Eve");
    assert_eq!(service.get_poll(&newer.id)?.creator_display_name, "Evelyn");

    Ok(())
}

#[tokio::test]
async fn test_live_tally_follows_votes() -> Result<()> {
    println!("📡 Testing live tally republication...");

    let service = PollingService::for_testing();
    let poll = service.create_poll("Live?", &["yes", "no"], &creator())?;

    let mut watch = service.watch(&poll.id)?;
    let initial = watch.next().await.expect("feed open")?;
    assert_eq!(initial.total_votes, 0);

    service.cast_vote(&poll.id, &UserId::new("u1"), "0")?;
    let update = tokio::time::timeout(Duration::from_secs(1), watch.next())
        .await
        .expect("tally republished")
        .expect("feed open")?;
    assert_eq!(update.total_votes, 1);
    assert_eq!(update.options[0].percentage, 100.0);
    println!("✅ Watcher saw the vote");

    // Rejected vote publishes nothing; the next update is the close
    let _ = service.cast_vote(&poll.id, &UserId::new("u1"), "1");
    service.close_poll(&poll.id, &creator().user_id)?;
    let update = tokio::time::timeout(Duration::from_secs(1), watch.next())
        .await
        .expect("tally republished")
        .expect("feed open")?;
    assert_eq!(update.status, PollStatus::Closed);
    assert_eq!(update.total_votes, 1);
    println!("✅ Watcher saw the close");

    Ok(())
}

#[tokio::test]
async fn test_raw_feed_events() -> Result<()> {
    let service = PollingService::for_testing();
    let mut events = service.subscribe();

    let poll = service.create_poll("Q", &["a", "b"], &creator())?;
    service.cast_vote(&poll.id, &UserId::new("u1"), "1")?;

    let first = events.recv().await.expect("poll event");
    assert_eq!((first.entity, first.poll_id), (ChangeEntity::Poll, poll.id));

    let second = events.recv().await.expect("vote event");
    assert_eq!((second.entity, second.poll_id), (ChangeEntity::Vote, poll.id));

    Ok(())
}

#[tokio::test]
async fn test_snapshot_round_trip_through_file() -> Result<()> {
    println!("💾 Testing snapshot persistence...");

    let path = std::env::temp_dir().join(format!("livepoll-{}.json", Uuid::new_v4()));
    let config = PollConfig {
        snapshot_path: Some(path.clone()),
        ..PollConfig::for_testing()
    };

    let service = PollingService::new(config.clone())?;
    let alice = creator();
    let open_poll = service.create_poll("Open", &["a", "b", "c"], &alice)?;
    let closed_poll = service.create_poll("Closed", &["a", "b"], &alice)?;
    service.cast_vote(&open_poll.id, &UserId::new("u1"), "2")?;
    service.cast_vote(&open_poll.id, &UserId::new("u2"), "0")?;
    service.cast_vote(&closed_poll.id, &UserId::new("u1"), "1")?;
    service.close_poll(&closed_poll.id, &alice.user_id)?;

    assert!(service.persist()?);

    let restored = PollingService::open(config)?;
    assert_eq!(restored.get_poll(&open_poll.id)?, open_poll);
    assert_eq!(
        restored.get_poll(&closed_poll.id)?.status,
        PollStatus::Closed
    );
    assert_eq!(
        restored.compute_results(&open_poll.id)?,
        service.compute_results(&open_poll.id)?
    );

    // The uniqueness guarantee survives a restart
    let err = assert_err!(restored.cast_vote(&open_poll.id, &UserId::new("u1"), "1"));
    assert_eq!(err.kind(), ErrorKind::AlreadyVoted);
    assert_ok!(restored.cast_vote(&open_poll.id, &UserId::new("u3"), "1"));

    let reloaded = Snapshot::load(&path)?;
    assert_eq!(reloaded.polls.len(), 2);
    assert_eq!(reloaded.votes.len(), 3);

    std::fs::remove_file(&path)?;
    println!("✅ Snapshot restored with tallies and uniqueness intact");

    Ok(())
}
