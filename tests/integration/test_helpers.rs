//! Shared fixtures for the RPC integration tests: a recording skill, a
//! spawned skill server on an ephemeral port, and a fake orchestrating
//! server for client tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use skill_relay::intent::IntentInvocation;
use skill_relay::rpc::server::{bind, RpcServer};
use skill_relay::skill::{BoxFuture, Skill};
use skill_relay::slots::SlotDictionary;
use skill_relay::Result;

/// Test skill that records every invocation and echoes it in its reply.
///
/// Invocations of the intent named `Silent` return no result, exercising
/// the "nothing to report" path.
pub struct RecordingSkill {
    intents: Vec<String>,
    seen: Mutex<Vec<String>>,
}

impl RecordingSkill {
    pub fn new(intents: &[&str]) -> Self {
        Self {
            intents: intents.iter().map(|&i| i.to_owned()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Intent names handled so far, in arrival order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Skill for RecordingSkill {
    fn intent_list(&self) -> Vec<String> {
        self.intents.clone()
    }

    fn on_intent(&self, invocation: IntentInvocation) -> BoxFuture<'_, Result<Option<Value>>> {
        Box::pin(async move {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(invocation.intent_name.clone());
            }

            if invocation.intent_name == "Silent" {
                return Ok(None);
            }

            Ok(Some(json!({
                "intentName": invocation.intent_name,
                "sessionId": invocation.session_id,
                "siteId": invocation.site_id,
                "slots": invocation.slots,
                "mappedSlots": invocation.mapped_slots,
            })))
        })
    }
}

/// Spawn a skill RPC server on an ephemeral loopback port.
pub async fn spawn_server<S: Skill + 'static>(
    skill: Arc<S>,
    dictionary: Arc<SlotDictionary>,
) -> (SocketAddr, CancellationToken, JoinHandle<Result<()>>) {
    let listener = bind(0).await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let cancel = CancellationToken::new();
    let server = RpcServer::new(skill, dictionary, cancel.clone());
    let handle = tokio::spawn(async move { server.serve(listener).await });

    (addr, cancel, handle)
}

/// Connect to a spawned skill server, split into line reader + writer.
pub async fn connect_peer(addr: SocketAddr) -> (BufReader<OwnedReadHalf>, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect to server");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half), write_half)
}

/// Write one envelope line.
pub async fn send_value(writer: &mut OwnedWriteHalf, value: &Value) {
    let mut line = value.to_string();
    line.push('\n');
    writer.write_all(line.as_bytes()).await.expect("write line");
}

/// Read one reply line and parse it; `None` on EOF.
pub async fn read_value(reader: &mut BufReader<OwnedReadHalf>) -> Option<Value> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).await.expect("read line");
    if read == 0 {
        return None;
    }
    Some(serde_json::from_str(line.trim_end()).expect("reply must be JSON"))
}

/// Fake orchestrating server for client tests.
///
/// Accepts one connection; for every line received it forwards the decoded
/// envelope through the returned channel and answers with the next entry of
/// `raw_replies` (sent verbatim, newline appended).
pub async fn spawn_parent(raw_replies: Vec<String>) -> (u16, mpsc::Receiver<Value>) {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind parent port");
    let port = listener.local_addr().expect("local addr").port();
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut replies = raw_replies.into_iter();

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if let Ok(envelope) = serde_json::from_str::<Value>(line.trim_end()) {
                        let _ = tx.send(envelope).await;
                    }
                    if let Some(reply) = replies.next() {
                        let framed = format!("{reply}\n");
                        if write_half.write_all(framed.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    (port, rx)
}
