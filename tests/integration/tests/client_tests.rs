//! Gateway client integration tests
//!
//! Every test runs on a paused clock; the runtime advances virtual time
//! whenever all tasks are idle, so protocol delays cost nothing.
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use cord_gateway::protocol::{GatewayInfo, OpCode};
use cord_gateway::transport::OutboundFrame;
use cord_gateway::{names, ClientEvent, ShardCommand};
use integration_tests::*;
use serde_json::json;
use tokio::sync::oneshot;
use tokio::time::{self, Instant};

async fn timed<T>(future: impl Future<Output = T>) -> (T, Instant) {
    let value = future.await;
    (value, Instant::now())
}

/// Whether `elapsed` is `expected_ms` give or take timer resolution
fn within_ms(elapsed: Duration, expected_ms: u64) -> bool {
    let expected = Duration::from_millis(expected_ms);
    elapsed >= expected && elapsed < expected + Duration::from_millis(50)
}

/// Connect a single-shard client and return its socket
async fn connected(config: cord_common::ClientConfig) -> Result<(TestClient, MockSocket)> {
    let mut harness = TestClient::new(config, MockRest::new(bot_user(), Some(gateway(1))));
    harness.client.connect()?;
    let socket = harness.next_socket().await?;
    Ok((harness, socket))
}

/// Connect, say hello, and consume the identify
async fn identified(config: cord_common::ClientConfig) -> Result<(TestClient, MockSocket)> {
    let (harness, mut socket) = connected(config).await?;
    socket.send(hello(41_250)).await?;
    socket.next_op(2).await?;
    Ok((harness, socket))
}

// ============================================================================
// Startup and Identify
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shards_identify_throttled_and_become_ready() -> Result<()> {
    let mut harness = TestClient::new(test_config(), MockRest::new(bot_user(), Some(gateway(2))));
    harness.record(&names::event("READY"));
    harness.client.connect()?;

    let mut first = harness.next_socket().await?;
    let mut second = harness.next_socket().await?;
    assert!(first.url.starts_with(GATEWAY_URL));
    assert!(first.url.ends_with("/?v=6&encoding=json"));

    first.send(hello(41_250)).await?;
    second.send(hello(41_250)).await?;

    let ((a, at), (b, bt)) = tokio::join!(timed(first.next_op(2)), timed(second.next_op(2)));
    let (a, b) = (a?, b?);
    let gap = if at > bt { at - bt } else { bt - at };
    assert!(gap >= Duration::from_secs(6), "identifies only {gap:?} apart");

    let shards: BTreeSet<_> = [&a, &b]
        .iter()
        .map(|frame| (frame["d"]["shard"][0].as_u64(), frame["d"]["shard"][1].as_u64()))
        .collect();
    assert_eq!(
        shards,
        BTreeSet::from([(Some(0), Some(2)), (Some(1), Some(2))])
    );
    assert_eq!(a["d"]["token"], TEST_TOKEN);
    assert_eq!(a["d"]["compress"], false);
    assert!(a["d"]["properties"]["$browser"].is_string());

    assert!(!harness.client.is_ready().await);

    first.send(ready(1)).await?;
    harness
        .wait_for("first READY", |e| matches!(e, ClientEvent::Dispatch { event, .. } if event == "READY"))
        .await?;
    assert!(!harness.client.is_ready().await);

    second.send(ready(1)).await?;
    harness
        .wait_for("second READY", |e| matches!(e, ClientEvent::Dispatch { event, .. } if event == "READY"))
        .await?;
    assert!(harness.client.is_ready().await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_user_account_identifies_without_shard_field() -> Result<()> {
    let config = cord_common::ClientConfig::new(TEST_TOKEN, false);
    let rest = MockRest::new(
        bot_user(),
        Some(GatewayInfo {
            url: GATEWAY_URL.to_string(),
            recommended_shard_count: None,
        }),
    );
    let mut harness = TestClient::new(config, rest);
    harness.client.connect()?;

    let mut socket = harness.next_socket().await?;
    socket.send(hello(41_250)).await?;
    let identify = socket.next_op(2).await?;

    assert!(identify["d"].get("shard").is_none());
    assert!(harness.try_socket().is_none());
    assert_eq!(harness.connector.attempts(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_identify_message_redacts_token() -> Result<()> {
    let (mut harness, _socket) = identified(test_config()).await?;

    let event = harness.wait_for_message("Scheduling identify for shard 0").await?;
    let ClientEvent::Message { detail, .. } = event else {
        unreachable!()
    };
    let detail = detail.expect("identify detail");
    assert_ne!(detail["token"], TEST_TOKEN);
    assert!(!detail.to_string().contains(TEST_TOKEN));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_current_user_is_fetched() -> Result<()> {
    let (harness, _socket) = connected(test_config()).await?;
    let user = harness.client.current_user().await.expect("user fetched");
    assert_eq!(user.tag(), "cordbot#0001");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unknown_gateway_response() -> Result<()> {
    let mut harness = TestClient::new(test_config(), MockRest::new(bot_user(), None));
    harness.client.connect()?;

    harness.wait_for_message("Unknown response from API").await?;
    assert_eq!(harness.connector.attempts(), 0);
    assert!(!harness.client.is_ready().await);
    Ok(())
}

// ============================================================================
// Heartbeats
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_heartbeat_carries_last_sequence() -> Result<()> {
    let (_harness, mut socket) = identified(test_config()).await?;
    let started = Instant::now();
    socket.send(ready(7)).await?;

    let (beat, at) = timed(socket.next_op(1)).await;
    let beat = beat?;
    assert_eq!(beat["d"], 7);
    assert!(beat.get("s").is_none());
    assert!(at - started <= Duration::from_millis(41_250));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_acknowledged_heartbeats_continue() -> Result<()> {
    let (_harness, mut socket) = identified(test_config()).await?;

    let (first, first_at) = timed(socket.next_op(1)).await;
    assert_eq!(first?["d"], json!(null));
    socket.send(heartbeat_ack()).await?;

    let (_, second_at) = timed(socket.next_op(1)).await;
    assert!(within_ms(second_at - first_at, 41_250));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_heartbeat_closes_once_and_reconnects() -> Result<()> {
    let (mut harness, mut socket) = identified(test_config()).await?;

    let (_, beat_at) = timed(socket.next_op(1)).await;

    let (frame, closed_at) = timed(socket.next_frame()).await;
    assert!(matches!(frame?, OutboundFrame::Close { code: 1000, .. }));
    assert!(within_ms(closed_at - beat_at, 41_250));
    harness
        .wait_for_message_or_debug("Shard connection appears to be dead: 0")
        .await?;

    time::sleep(Duration::from_secs(200)).await;
    assert!(socket.try_frame().is_none(), "only one close is sent");

    socket.close(1000, "").await?;
    let reported = Instant::now();
    let replacement = harness.next_socket().await?;
    assert!(replacement.opened_at - reported >= Duration::from_secs(5));
    assert_eq!(harness.connector.attempts(), 2);
    Ok(())
}

// ============================================================================
// Close Handling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_closed_shard_reconnects_after_delay() -> Result<()> {
    let (mut harness, socket) = identified(test_config()).await?;

    socket.close(4000, "Unknown error").await?;
    let closed_at = Instant::now();

    let event = harness
        .wait_for("shard.closed", |e| matches!(e, ClientEvent::ShardClosed { .. }))
        .await?;
    assert_eq!(
        event,
        ClientEvent::ShardClosed {
            shard: 0,
            code: Some(4000),
            reason: "Unknown error".to_string(),
        }
    );

    let mut replacement = harness.next_socket().await?;
    let delay = replacement.opened_at - closed_at;
    assert!(delay >= Duration::from_secs(5) && delay < Duration::from_secs(6));

    // The new connection runs the full handshake again
    replacement.send(hello(41_250)).await?;
    replacement.next_op(2).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_authentication_failure_does_not_reconnect() -> Result<()> {
    let (mut harness, socket) = identified(test_config()).await?;

    socket.close(4004, "Authentication failed").await?;
    harness
        .wait_for_message("authentication error - not attempting to reconnect")
        .await?;

    time::sleep(Duration::from_secs(120)).await;
    assert!(harness.try_socket().is_none());
    assert_eq!(harness.connector.attempts(), 1);
    assert!(!harness.client.is_ready().await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_connect_is_retried() -> Result<()> {
    let mut harness = TestClient::new(test_config(), MockRest::new(bot_user(), Some(gateway(1))));
    harness.connector.fail_next(1);
    harness.client.connect()?;

    let event = harness
        .wait_for("shard.connect.error", |e| matches!(e, ClientEvent::ShardConnectError { .. }))
        .await?;
    assert_eq!(event.shard(), Some(0));
    let failed_at = Instant::now();

    let socket = harness.next_socket().await?;
    assert!(socket.opened_at - failed_at >= Duration::from_secs(30));
    harness
        .wait_for("shard.connected", |e| *e == ClientEvent::ShardConnected { shard: 0 })
        .await?;
    assert_eq!(harness.connector.attempts(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_not_ready_while_a_shard_waits_to_retry_connect() -> Result<()> {
    let mut harness = TestClient::new(test_config(), MockRest::new(bot_user(), Some(gateway(2))));
    harness.record(&names::event("READY"));
    harness.connector.fail_next(1);
    harness.client.connect()?;

    let failed = harness
        .wait_for("shard.connect.error", |e| matches!(e, ClientEvent::ShardConnectError { .. }))
        .await?;
    let mut live = harness.next_socket().await?;
    live.send(hello(41_250)).await?;
    live.next_op(2).await?;
    live.send(ready(1)).await?;
    harness
        .wait_for("READY", |e| matches!(e, ClientEvent::Dispatch { event, .. } if event == "READY"))
        .await?;
    assert!(!harness.client.is_ready().await);

    let mut retried = harness.next_socket().await?;
    harness
        .wait_for("retried shard", |e| {
            matches!(e, ClientEvent::ShardConnected { shard } if Some(*shard) == failed.shard())
        })
        .await?;
    retried.send(hello(41_250)).await?;
    retried.next_op(2).await?;
    assert!(!harness.client.is_ready().await);

    retried.send(ready(1)).await?;
    harness
        .wait_for("second READY", |e| matches!(e, ClientEvent::Dispatch { event, .. } if event == "READY"))
        .await?;
    assert!(harness.client.is_ready().await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_shards_and_allows_reconnect() -> Result<()> {
    let (mut harness, mut socket) = identified(test_config()).await?;
    assert!(harness.client.is_connected());

    harness.client.disconnect();
    assert!(matches!(socket.next_frame().await?, OutboundFrame::Close { code: 1000, .. }));
    within("disconnect", harness.client.disconnected()).await?;
    assert!(!harness.client.is_connected());

    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.connector.attempts(), 1);

    harness.client.connect()?;
    harness.next_socket().await?;
    assert_eq!(harness.connector.attempts(), 2);
    Ok(())
}

// ============================================================================
// Frames and Dispatch
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_invalid_session_identifies_again() -> Result<()> {
    let (_harness, mut socket) = identified(test_config()).await?;

    socket.send(json!({ "op": 9, "d": false })).await?;
    let identify = socket.next_op(2).await?;
    assert_eq!(identify["d"]["shard"], json!([0, 1]));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unknown_frames_are_reported_and_published() -> Result<()> {
    let (mut harness, socket) = identified(test_config()).await?;
    harness.record(&names::event("SOMETHING_NEW"));
    harness.record(&names::opcode(42));

    socket.send_text("not json").await?;
    socket.send(json!({ "op": 42, "d": null })).await?;
    socket.send(dispatch("SOMETHING_NEW", 2, json!({ "x": 1 }))).await?;

    harness.wait_for_message_or_debug("Undecodable frame on shard 0").await?;
    harness.wait_for_message_or_debug("Got Unknown Message on shard 0").await?;
    harness
        .wait_for("op 42", |e| matches!(e, ClientEvent::Opcode { op: 42, .. }))
        .await?;
    harness.wait_for_message_or_debug("Got Unknown Event on shard 0").await?;
    let event = harness
        .wait_for("SOMETHING_NEW", |e| matches!(e, ClientEvent::Dispatch { .. }))
        .await?;
    let ClientEvent::Dispatch { data, .. } = event else {
        unreachable!()
    };
    assert_eq!(data, json!({ "x": 1 }));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_mirror_tracks_guilds_and_channels() -> Result<()> {
    let (mut harness, socket) = identified(test_config()).await?;

    socket.send(guild_create(1, "g1", "Guild One", "c1")).await?;
    harness
        .wait_for_message("Found new server on shard 0: Guild One (g1)")
        .await?;
    harness.wait_for_message("\tChannel: general (c1)").await?;
    assert!(harness.client.valid_server("g1").await);
    assert!(harness.client.valid_channel("g1", "c1").await);
    assert!(!harness.client.valid_channel("g1", "voice-1").await);

    socket.send(text_channel("CHANNEL_CREATE", 2, "g1", "c2", "news")).await?;
    harness
        .wait_for_message("Found new channel for server Guild One (g1) on shard 0: news (c2)")
        .await?;
    assert!(harness.client.valid_channel("g1", "c2").await);

    socket.send(text_channel("CHANNEL_DELETE", 3, "g1", "c2", "news")).await?;
    harness.wait_for_message("Removed channel for server Guild One").await?;
    assert!(!harness.client.valid_channel("g1", "c2").await);

    socket.send(dm_channel("CHANNEL_CREATE", 4, "dm-9", "p9")).await?;
    harness
        .wait_for_message("Found new channel for person alice#4242 (p9) on shard 0: dm-9")
        .await?;
    assert_eq!(harness.client.dm_channel("p9").await.as_deref(), Some("dm-9"));

    socket.send(guild_delete(5, "g1")).await?;
    harness.wait_for_message("Removed server on shard 0").await?;
    assert!(!harness.client.valid_server("g1").await);
    assert!(!harness.client.valid_channel("g1", "c1").await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_debug_events_require_debug_mode() -> Result<()> {
    let (mut harness, socket) = identified(cord_common::ClientConfig::new(TEST_TOKEN, true)).await?;

    socket.send(json!({ "op": 42, "d": null })).await?;
    socket.send(guild_create(1, "g1", "Guild One", "c1")).await?;
    harness.wait_for_message("Found new server").await?;

    let events = harness.drain_events();
    assert!(!events.iter().any(|e| matches!(e, ClientEvent::Debug { .. })));
    Ok(())
}

// ============================================================================
// Outbound Commands
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shard_command_bypasses_throttle() -> Result<()> {
    let (harness, mut socket) = connected(test_config()).await?;
    let sent_at = Instant::now();

    harness.client.send_shard_command(ShardCommand::new(
        0,
        OpCode::PresenceUpdate,
        json!({ "status": "online" }),
    ))?;

    let (frame, at) = timed(socket.next_op(3)).await;
    let frame = frame?;
    assert!(at - sent_at < Duration::from_secs(1));
    assert_eq!(frame["d"]["status"], "online");
    assert!(frame.get("s").is_none() && frame.get("t").is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_throttled_action_runs_after_queued_identify() -> Result<()> {
    let (mut harness, mut socket) = connected(test_config()).await?;
    socket.send(hello(41_250)).await?;
    harness.wait_for_identify_queued().await?;

    let (tx, rx) = oneshot::channel();
    harness.client.queue_throttled(move || {
        let _ = tx.send(Instant::now());
    })?;

    let (_, identified_at) = timed(socket.next_op(2)).await;
    let ran_at = within("throttled action", rx).await??;
    assert!(within_ms(ran_at - identified_at, 6_000));
    Ok(())
}

// ============================================================================
// REST Helpers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_channel_message_requires_known_channel() -> Result<()> {
    let (mut harness, socket) = identified(test_config()).await?;

    harness.client.send_channel_message("g1", "c1", "hi").await?;
    assert!(harness.rest.calls().is_empty());
    assert!(harness.client.channel_messages("g1", "c1").await?.is_none());

    socket.send(guild_create(1, "g1", "Guild One", "c1")).await?;
    harness.wait_for_message("Found new server").await?;

    harness.client.send_channel_message("g1", "c1", "hi").await?;
    harness.rest.push_messages(vec![json!({ "id": "m1", "content": "hi" })]);
    let history = harness.client.channel_messages("g1", "c1").await?;

    assert_eq!(history, Some(vec![json!({ "id": "m1", "content": "hi" })]));
    assert_eq!(
        harness.rest.calls(),
        vec![
            RestCall::CreateMessage {
                channel_id: "c1".to_string(),
                content: "hi".to_string(),
            },
            RestCall::ChannelMessages("c1".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_person_messages_reuse_and_expire_dm_channels() -> Result<()> {
    let mut config = test_config();
    config.reuse_dm_channels = true;
    let (harness, _socket) = connected(config).await?;

    harness.client.send_person_message("p1", "hello").await?;
    harness.client.send_person_message("p1", "again").await?;
    assert_eq!(harness.client.dm_channel("p1").await.as_deref(), Some("dm-1"));
    assert_eq!(
        harness.rest.calls(),
        vec![
            RestCall::CreateDmChannel("p1".to_string()),
            RestCall::CreateMessage {
                channel_id: "dm-1".to_string(),
                content: "hello".to_string(),
            },
            RestCall::CreateMessage {
                channel_id: "dm-1".to_string(),
                content: "again".to_string(),
            },
        ]
    );

    // Kept while idle for less than the TTL, deleted by the first sweep after
    time::sleep(Duration::from_secs(250)).await;
    assert!(!harness.rest.calls().contains(&RestCall::DeleteChannel("dm-1".to_string())));

    time::sleep(Duration::from_secs(150)).await;
    assert!(harness.rest.calls().contains(&RestCall::DeleteChannel("dm-1".to_string())));
    assert!(harness.client.dm_channel("p1").await.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_person_messages_open_new_channel_without_reuse() -> Result<()> {
    let (harness, _socket) = connected(test_config()).await?;

    harness.client.send_person_message("p1", "one").await?;
    harness.client.send_person_message("p1", "two").await?;

    let opened = harness
        .rest
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RestCall::CreateDmChannel(_)))
        .count();
    assert_eq!(opened, 2);
    Ok(())
}

// ============================================================================
// Listener Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_listener_failures_reach_client_error() -> Result<()> {
    let mut harness = TestClient::new(test_config(), MockRest::new(bot_user(), Some(gateway(1))));
    harness.client.on(names::SHARD_CONNECTED, |_, _| Err("nope".into()));
    harness.client.on(names::SHARD_CONNECTED, |_, _| panic!("listener blew up"));
    harness.client.connect()?;
    let mut socket = harness.next_socket().await?;

    let failure = harness
        .wait_for("client.error", |e| matches!(e, ClientEvent::Error { .. }))
        .await?;
    assert_eq!(
        failure,
        ClientEvent::Error {
            origin: names::SHARD_CONNECTED.to_string(),
            message: "nope".to_string(),
        }
    );
    let panicked = harness
        .wait_for("client.error", |e| matches!(e, ClientEvent::Error { .. }))
        .await?;
    let ClientEvent::Error { message, .. } = panicked else {
        unreachable!()
    };
    assert!(message.contains("listener blew up"));

    // The session keeps working
    socket.send(hello(41_250)).await?;
    socket.next_op(2).await?;
    Ok(())
}
