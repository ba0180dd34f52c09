//! Integration tests for the RPC client against a fake orchestrating
//! server: envelope shape, reply handling, and transport failures.

use serde_json::json;
use tokio::net::TcpListener;

use skill_relay::rpc::client::RpcClient;
use skill_relay::SkillError;

use super::test_helpers::spawn_parent;

#[tokio::test]
async fn execute_round_trips_one_call() {
    let (port, mut seen) = spawn_parent(vec![r#"{"payload": {"ok": true}}"#.to_owned()]).await;

    let mut client = RpcClient::connect(port).await.expect("connect");
    let result = client
        .execute("say", json!({"text": "hello", "lang": "en_GB", "siteId": null}))
        .await
        .expect("transport must hold");

    assert_eq!(result, Some(json!({"ok": true})));

    // The envelope on the wire carries both mandatory properties.
    let envelope = seen.recv().await.expect("parent must see the envelope");
    assert_eq!(envelope["command"], "say");
    assert_eq!(envelope["payload"]["text"], "hello");
}

#[tokio::test]
async fn reply_without_payload_yields_none() {
    let (port, _seen) = spawn_parent(vec![r#"{"status": "ok"}"#.to_owned()]).await;

    let mut client = RpcClient::connect(port).await.expect("connect");
    let result = client.execute("say", json!({})).await.expect("transport must hold");

    assert_eq!(result, None);
}

#[tokio::test]
async fn malformed_reply_yields_none() {
    let (port, _seen) = spawn_parent(vec!["garbage{{{".to_owned()]).await;

    let mut client = RpcClient::connect(port).await.expect("connect");
    let result = client.execute("say", json!({})).await.expect("transport must hold");

    assert_eq!(result, None);
}

/// The peer closing before replying is a transport failure, fatal to the
/// skill process.
#[tokio::test]
async fn peer_close_before_reply_is_transport_error() {
    // No replies: the parent reads the request, then its reply iterator is
    // exhausted and the loop continues; closing is forced by dropping below.
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        // Close immediately without reading or replying.
        drop(stream);
    });

    let mut client = RpcClient::connect(port).await.expect("connect");
    let result = client.execute("say", json!({})).await;

    assert!(matches!(result, Err(SkillError::Transport(_))));
}

#[tokio::test]
async fn connect_to_unreachable_parent_fails() {
    // Bind then drop to obtain a loopback port with no listener.
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let result = RpcClient::connect(port).await;
    assert!(matches!(result, Err(SkillError::Transport(_))));
}

#[tokio::test]
async fn say_sends_the_documented_payload_shape() {
    let (port, mut seen) = spawn_parent(vec![r#"{"payload": null}"#.to_owned()]).await;

    let mut client = RpcClient::connect(port).await.expect("connect");
    client
        .say("Sunny in Paris", "fr_FR", Some("site1"))
        .await
        .expect("transport must hold");

    let envelope = seen.recv().await.expect("parent must see the envelope");
    assert_eq!(envelope["command"], "say");
    assert_eq!(
        envelope["payload"],
        json!({"text": "Sunny in Paris", "lang": "fr_FR", "siteId": "site1"})
    );
}

#[tokio::test]
async fn ask_sends_the_documented_payload_shape() {
    let (port, mut seen) = spawn_parent(vec![r#"{"payload": null}"#.to_owned()]).await;

    let mut client = RpcClient::connect(port).await.expect("connect");
    client
        .ask(
            "Which city?",
            "en_GB",
            None,
            &["GetWeather".to_owned()],
        )
        .await
        .expect("transport must hold");

    let envelope = seen.recv().await.expect("parent must see the envelope");
    assert_eq!(envelope["command"], "ask");
    assert_eq!(
        envelope["payload"],
        json!({"text": "Which city?", "lang": "en_GB", "siteId": null, "intentFilter": ["GetWeather"]})
    );
}

/// Two sequential calls reuse the single connection, one exchange at a time.
#[tokio::test]
async fn sequential_calls_share_the_connection() {
    let (port, mut seen) = spawn_parent(vec![
        r#"{"payload": 1}"#.to_owned(),
        r#"{"payload": 2}"#.to_owned(),
    ])
    .await;

    let mut client = RpcClient::connect(port).await.expect("connect");

    let first = client.execute("say", json!({"n": 1})).await.expect("first call");
    let second = client.execute("say", json!({"n": 2})).await.expect("second call");

    assert_eq!(first, Some(json!(1)));
    assert_eq!(second, Some(json!(2)));
    assert_eq!(seen.recv().await.map(|e| e["payload"]["n"].clone()), Some(json!(1)));
    assert_eq!(seen.recv().await.map(|e| e["payload"]["n"].clone()), Some(json!(2)));
}

#[tokio::test]
async fn disconnect_closes_the_write_side() {
    let (port, mut seen) = spawn_parent(vec![r#"{"payload": null}"#.to_owned()]).await;

    let mut client = RpcClient::connect(port).await.expect("connect");
    client.execute("say", json!({})).await.expect("one call");
    assert!(seen.recv().await.is_some());

    client.disconnect().await.expect("disconnect must succeed");

    // The parent's read loop ends on EOF, closing the channel.
    assert!(seen.recv().await.is_none());
}
