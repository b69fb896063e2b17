//! End-to-end poll cycle tests against mocked PaperMC and Discord APIs.

use paperwatch::discord::{ChannelNotifier, DiscordRest};
use paperwatch::embeds::POLL_FAILURE_WARNING;
use paperwatch::http::{UpstreamClient, build_client};
use paperwatch::{
    BuildId, BuildPoller, BuildSource, CycleOutcome, PersistedState, StateStore, UpdateDetector,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Fixtures ──────────────────────────────────────────────────────

async fn mount_paper(server: &MockServer, builds: serde_json::Value, changes: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v2/projects/paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "project_id": "paper",
            "versions": ["1.20.2", "1.20.4"]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/projects/paper/versions/1.20.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "1.20.4",
            "builds": builds
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/projects/paper/versions/1.20.4/builds/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "build": 11,
            "time": "2024-01-05T15:04:05.000Z",
            "changes": changes
        })))
        .mount(server)
        .await;
}

fn rest(discord: &MockServer) -> Arc<DiscordRest> {
    Arc::new(DiscordRest::new(
        build_client().expect("client"),
        format!("{}/api/v10", discord.uri()),
        "test-token",
        "app-1",
        "guild-1",
    ))
}

fn detector(paper: &MockServer, discord: &MockServer, store: Arc<StateStore>) -> UpdateDetector {
    let poller = BuildPoller::new(
        UpstreamClient::new().expect("client"),
        format!("{}/v2", paper.uri()),
    );
    UpdateDetector::new(
        Arc::new(poller),
        store,
        Arc::new(ChannelNotifier::new(rest(discord), "chan-1")),
    )
}

// ── Poller ────────────────────────────────────────────────────────

#[tokio::test]
async fn poller_resolves_last_version_and_build() {
    let paper = MockServer::start().await;
    mount_paper(
        &paper,
        json!([10, 11]),
        json!([{"summary": "fix A"}, {"summary": "fix B"}]),
    )
    .await;

    let poller = BuildPoller::new(UpstreamClient::new().unwrap(), format!("{}/v2", paper.uri()));
    let record = poller.fetch_latest_build().await.unwrap();

    assert_eq!(record.version, "1.20.4");
    assert_eq!(record.build, BuildId::Number(11));
    assert_eq!(record.changelog, vec!["- fix A", "- fix B"]);
    assert_eq!(record.time, "1/5/2024, 3:04:05 PM");
    assert_eq!(
        record.download_url,
        "https://api.papermc.io/v2/projects/paper/versions/1.20.4/builds/11/downloads/paper-1.20.4-11.jar"
    );
}

#[tokio::test]
async fn poller_without_changes_uses_placeholder() {
    let paper = MockServer::start().await;
    mount_paper(&paper, json!([11]), json!([])).await;

    let poller = BuildPoller::new(UpstreamClient::new().unwrap(), format!("{}/v2", paper.uri()));
    let record = poller.fetch_latest_build().await.unwrap();
    assert_eq!(record.changelog, vec![paperwatch::poller::NO_CHANGES_PLACEHOLDER]);
}

#[tokio::test]
async fn poller_treats_null_changes_as_absent() {
    let paper = MockServer::start().await;
    mount_paper(&paper, json!([11]), serde_json::Value::Null).await;

    let poller = BuildPoller::new(UpstreamClient::new().unwrap(), format!("{}/v2", paper.uri()));
    let record = poller.fetch_latest_build().await.unwrap();
    assert_eq!(record.changelog, vec![paperwatch::poller::NO_CHANGES_PLACEHOLDER]);
    assert_eq!(record.build, BuildId::Number(11));
}

#[tokio::test]
async fn poller_skips_null_summaries() {
    let paper = MockServer::start().await;
    mount_paper(
        &paper,
        json!([11]),
        json!([{"summary": null}, {"summary": "fix B"}]),
    )
    .await;

    let poller = BuildPoller::new(UpstreamClient::new().unwrap(), format!("{}/v2", paper.uri()));
    let record = poller.fetch_latest_build().await.unwrap();
    assert_eq!(record.changelog, vec!["- fix B"]);
}

#[tokio::test]
async fn poller_accepts_string_build_ids() {
    let paper = MockServer::start().await;
    mount_paper(&paper, json!(["10", "11"]), json!([{"summary": "fix A"}])).await;

    let poller = BuildPoller::new(UpstreamClient::new().unwrap(), format!("{}/v2", paper.uri()));
    let record = poller.fetch_latest_build().await.unwrap();
    assert_eq!(record.build, BuildId::Text("11".into()));
    // Equal to the numeric id a previous run may have stored.
    assert_eq!(record.build, BuildId::Number(11));
    assert_eq!(
        record.download_url,
        "https://api.papermc.io/v2/projects/paper/versions/1.20.4/builds/11/downloads/paper-1.20.4-11.jar"
    );
}

#[tokio::test]
async fn poller_rejects_empty_build_list() {
    let paper = MockServer::start().await;
    mount_paper(&paper, json!([]), json!([])).await;

    let poller = BuildPoller::new(UpstreamClient::new().unwrap(), format!("{}/v2", paper.uri()));
    let err = poller.fetch_latest_build().await.unwrap_err();
    assert!(err.to_string().contains("no builds"), "error was: {err}");
}

// ── Detector ──────────────────────────────────────────────────────

#[tokio::test]
async fn new_build_is_persisted_and_announced_once() {
    let paper = MockServer::start().await;
    let discord = MockServer::start().await;
    mount_paper(
        &paper,
        json!([10, 11]),
        json!([{"summary": "fix A"}, {"summary": "fix B"}]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/v10/channels/chan-1/messages"))
        .and(header("authorization", "Bot test-token"))
        .and(body_partial_json(json!({
            "embeds": [{"title": "🚀 New Paper Build Available!"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m1"})))
        .expect(1)
        .mount(&discord)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("data.json");
    let store = Arc::new(StateStore::open(&state_path));
    let detector = detector(&paper, &discord, Arc::clone(&store));

    let first = detector.run_cycle().await;
    assert!(matches!(first, CycleOutcome::Updated(_)), "got {first:?}");

    let state = store.snapshot();
    assert_eq!(state.last_version, "1.20.4");
    assert_eq!(state.last_build, BuildId::Number(11));
    assert_eq!(state.last_builds_data.len(), 1);
    assert_eq!(state.last_builds_data[0].changelog.len(), 2);

    // Second cycle with identical upstream data changes nothing.
    assert_eq!(detector.run_cycle().await, CycleOutcome::Unchanged);
    assert_eq!(store.snapshot(), state);

    // The state file holds the same value.
    let on_disk = StateStore::open(&state_path).snapshot();
    assert_eq!(on_disk, state);
}

#[tokio::test]
async fn upstream_failure_posts_one_warning() {
    let paper = MockServer::start().await;
    let discord = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/projects/paper"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&paper)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v10/channels/chan-1/messages"))
        .and(body_partial_json(json!({"content": POLL_FAILURE_WARNING})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m2"})))
        .expect(1)
        .mount(&discord)
        .await;

    let store = Arc::new(StateStore::in_memory(Default::default()));
    let detector = detector(&paper, &discord, Arc::clone(&store));

    assert_eq!(detector.run_cycle().await, CycleOutcome::Failed);
    assert_eq!(store.snapshot(), PersistedState::default());
}

#[tokio::test]
async fn upstream_timeout_posts_one_warning() {
    let paper = MockServer::start().await;
    let discord = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/projects/paper"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"versions": ["1.20.4"]}))
                .set_delay(Duration::from_secs(15)),
        )
        .mount(&paper)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v10/channels/chan-1/messages"))
        .and(body_partial_json(json!({"content": POLL_FAILURE_WARNING})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m3"})))
        .expect(1)
        .mount(&discord)
        .await;

    let store = Arc::new(StateStore::in_memory(Default::default()));
    let detector = detector(&paper, &discord, Arc::clone(&store));

    assert_eq!(detector.run_cycle().await, CycleOutcome::Failed);
    assert_eq!(store.snapshot(), PersistedState::default());
}

#[tokio::test]
async fn discord_outage_does_not_undo_the_update() {
    let paper = MockServer::start().await;
    let discord = MockServer::start().await;
    mount_paper(&paper, json!([11]), json!([{"summary": "fix A"}])).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&discord)
        .await;

    let store = Arc::new(StateStore::in_memory(Default::default()));
    let detector = detector(&paper, &discord, Arc::clone(&store));

    assert!(matches!(detector.run_cycle().await, CycleOutcome::Updated(_)));
    assert_eq!(store.snapshot().last_build, BuildId::Number(11));
}
