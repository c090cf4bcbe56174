use windfall_common::{CampaignConfig, DiscoveryMode, FixedClock};
use windfall_platform::{CommentOutcome, FetchedPost, FollowOutcome};

use crate::campaign::Campaign;
use crate::ledger::EntryLedger;
use crate::state::statuses;
use crate::testing::{MockPlatform, RecordingNotifier};

fn post(id: &str, author: u64, official: bool) -> FetchedPost {
    FetchedPost {
        post_id: id.into(),
        author_id: author,
        author_name: "up主".into(),
        description: "关注并转发这条动态抽奖".into(),
        kind_code: 4,
        official_lottery: official,
        ..FetchedPost::default()
    }
}

fn quick_config(ids: &[&str]) -> CampaignConfig {
    CampaignConfig {
        discovery: vec![DiscoveryMode::Direct(
            ids.iter().map(|s| s.to_string()).collect(),
        )],
        entry_wait_ms: 0,
        filter_wait_ms: 0,
        reservation_wait_ms: 0,
        ..CampaignConfig::default()
    }
}

fn campaign<'a>(
    api: &'a MockPlatform,
    ledger: &'a EntryLedger,
    config: &'a CampaignConfig,
    clock: &'a FixedClock,
    notifier: Option<&'a RecordingNotifier>,
) -> Campaign<'a> {
    Campaign {
        api,
        ledger,
        config,
        clock,
        generator: None,
        solver: None,
        notifier: notifier.map(|n| n as &dyn crate::traits::Notifier),
        account_note: "account 1".into(),
    }
}

#[tokio::test]
async fn empty_discovery_list_is_an_idle_success() {
    let api = MockPlatform::new();
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at_hour(14);
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = CampaignConfig {
        discovery: Vec::new(),
        ..CampaignConfig::default()
    };

    let (status, stats) = campaign(&api, &ledger, &config, &clock, None).run().await;
    assert_eq!(status, statuses::OK);
    assert_eq!(stats.entered, 0);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn past_drawing_official_post_is_recorded_and_never_entered() {
    let clock = FixedClock::at_hour(14);
    let api = MockPlatform::new()
        .with_post(post("800000000000000001", 300, true))
        .with_notice("800000000000000001", clock.now.timestamp() - 3_600);
    let dir = tempfile::tempdir().unwrap();
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = quick_config(&["800000000000000001"]);

    let (status, stats) = campaign(&api, &ledger, &config, &clock, None).run().await;

    assert_eq!(status, statuses::OK);
    assert_eq!(stats.entered, 0);
    assert_eq!(stats.filtered_out, 1);
    assert!(ledger.exists("800000000000000001").await.unwrap());
    assert_eq!(api.call_count("comment:"), 0);
    assert_eq!(api.call_count("follow:"), 0);
    assert_eq!(api.call_count("repost:"), 0);
}

#[tokio::test]
async fn unknown_drawing_time_defers_without_a_record() {
    let clock = FixedClock::at_hour(14);
    // no notice scripted, the lookup reports unknown
    let api = MockPlatform::new().with_post(post("800000000000000002", 300, true));
    let dir = tempfile::tempdir().unwrap();
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = quick_config(&["800000000000000002"]);

    let (status, _) = campaign(&api, &ledger, &config, &clock, None).run().await;
    assert_eq!(status, statuses::OK);
    assert!(!ledger.exists("800000000000000002").await.unwrap());
    assert_eq!(api.call_count("repost:"), 0);
}

#[tokio::test]
async fn shared_author_is_followed_once_then_already_following_passes() {
    let clock = FixedClock::at_hour(14);
    let api = MockPlatform::new()
        .with_post(post("800000000000000003", 300, false))
        .with_post(post("800000000000000004", 300, false))
        .script_follow(vec![FollowOutcome::Followed, FollowOutcome::AlreadyFollowing]);
    let dir = tempfile::tempdir().unwrap();
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = quick_config(&["800000000000000003", "800000000000000004"]);

    let (status, stats) = campaign(&api, &ledger, &config, &clock, None).run().await;

    assert_eq!(status, statuses::OK);
    assert_eq!(stats.entered, 2);
    // the follow state was snapshotted once, not re-read per entry
    assert_eq!(api.call_count("following"), 1);
    assert_eq!(api.call_count("follow:300"), 2);
    assert!(ledger.exists("800000000000000003").await.unwrap());
    assert!(ledger.exists("800000000000000004").await.unwrap());
}

#[tokio::test]
async fn follow_cap_latches_and_skips_entries_needing_a_follow() {
    let clock = FixedClock::at_hour(14);
    let api = MockPlatform::new()
        .with_post(post("800000000000000005", 301, false))
        .with_post(post("800000000000000006", 302, false))
        .script_follow(vec![FollowOutcome::CapReached]);
    let dir = tempfile::tempdir().unwrap();
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = quick_config(&["800000000000000005", "800000000000000006"]);
    let notifier = RecordingNotifier::default();

    let (status, stats) = campaign(&api, &ledger, &config, &clock, Some(&notifier))
        .run()
        .await;

    assert_eq!(status, statuses::FOLLOW_CAPPED);
    assert!(stats.follow_capped);
    assert_eq!(stats.entered, 0);
    // one follow attempt; the second entry was short-circuited
    assert_eq!(api.call_count("follow:"), 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn hard_stop_breaks_the_run_without_a_ledger_write() {
    let clock = FixedClock::at_hour(14);
    let api = MockPlatform::new()
        .with_post(post("800000000000000007", 301, false))
        .with_post(post("800000000000000008", 302, false))
        .script_comment(vec![CommentOutcome::Unknown, CommentOutcome::Unknown]);
    let dir = tempfile::tempdir().unwrap();
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = quick_config(&["800000000000000007", "800000000000000008"]);
    let notifier = RecordingNotifier::default();

    let (status, stats) = campaign(&api, &ledger, &config, &clock, Some(&notifier))
        .run()
        .await;

    assert_eq!(status, 1001);
    assert!(stats.hard_stop);
    assert_eq!(api.call_count("comment:"), 1);
    assert!(!ledger.exists("800000000000000007").await.unwrap());
    assert!(!ledger.exists("800000000000000008").await.unwrap());
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn follower_floor_records_small_authors_and_defers_failed_lookups() {
    let clock = FixedClock::at_hour(14);
    let api = MockPlatform::new()
        .with_post(post("800000000000000009", 303, false))
        .with_post(post("800000000000000010", 304, false))
        .with_follower_count(303, 50);
    let dir = tempfile::tempdir().unwrap();
    let ledger = EntryLedger::open(dir.path(), 1, &clock, 12);
    let config = CampaignConfig {
        min_followers: 100,
        ..quick_config(&["800000000000000009", "800000000000000010"])
    };

    let (_, stats) = campaign(&api, &ledger, &config, &clock, None).run().await;

    assert_eq!(stats.entered, 0);
    assert_eq!(stats.filtered_out, 2);
    // below the floor: final for this post
    assert!(ledger.exists("800000000000000009").await.unwrap());
    // lookup failed: retry next run
    assert!(!ledger.exists("800000000000000010").await.unwrap());
    assert_eq!(api.call_count("repost:"), 0);
}
