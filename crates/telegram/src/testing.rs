//! In-process stand-in for the Telegram Bot API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{Method, StatusCode, Uri},
        response::{IntoResponse, Response},
        routing::any,
    },
    serde::Deserialize,
    serde_json::json,
    tokio::{sync::oneshot, task::JoinHandle},
};

pub(crate) const TEST_TOKEN: &str = "123:test-token";

/// A private-chat message from user 1001 (`@alice`) with `extra` merged in.
pub(crate) fn message(extra: serde_json::Value) -> teloxide::types::Message {
    let mut value = json!({
        "message_id": 1,
        "date": 1,
        "chat": { "id": 42, "type": "private", "first_name": "Alice" },
        "from": {
            "id": 1001,
            "is_bot": false,
            "first_name": "Alice",
            "username": "alice"
        }
    });
    let obj = value.as_object_mut().unwrap();
    for (k, v) in extra.as_object().unwrap() {
        obj.insert(k.clone(), v.clone());
    }
    serde_json::from_value(value).expect("deserialize message")
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default, deserialize_with = "reply_message_id")]
    #[serde(rename = "reply_parameters")]
    pub reply_to: Option<i32>,
}

fn reply_message_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Params {
        message_id: i32,
    }
    Ok(Option::<Params>::deserialize(deserializer)?.map(|p| p.message_id))
}

#[derive(Debug, Deserialize)]
struct GetFileRequest {
    file_id: String,
}

#[derive(Default)]
struct Recorded {
    messages: Vec<SentMessage>,
    methods: Vec<String>,
}

#[derive(Clone, Default)]
struct MockState {
    recorded: Arc<Mutex<Recorded>>,
    /// file_id -> content served from the file endpoint.
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

pub(crate) struct MockTelegramApi {
    addr: SocketAddr,
    state: MockState,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/{*path}", any(telegram_api_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        }
    }

    pub fn bot(&self) -> teloxide::Bot {
        let api_url =
            reqwest::Url::parse(&format!("http://{}/", self.addr)).expect("parse api url");
        teloxide::Bot::new(TEST_TOKEN).set_api_url(api_url)
    }

    pub fn add_file(&self, file_id: &str, content: &[u8]) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), content.to_vec());
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.recorded.lock().unwrap().messages.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.state.recorded.lock().unwrap().methods.clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.await.expect("server join");
        }
    }
}

async fn telegram_api_handler(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path();

    if method == Method::GET {
        let Some(file_id) = path
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_suffix(".bin"))
        else {
            return StatusCode::NOT_FOUND.into_response();
        };
        return match state.files.lock().unwrap().get(file_id) {
            Some(content) => content.clone().into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }

    let api_method = path.rsplit('/').next().unwrap_or_default().to_string();
    state
        .recorded
        .lock()
        .unwrap()
        .methods
        .push(api_method.clone());

    match api_method.as_str() {
        "SendMessage" => {
            let sent: SentMessage = serde_json::from_slice(&body).expect("send message body");
            let chat_id = sent.chat_id;
            let text = sent.text.clone();
            state.recorded.lock().unwrap().messages.push(sent);
            Json(json!({
                "ok": true,
                "result": {
                    "message_id": 100,
                    "date": 0,
                    "chat": { "id": chat_id, "type": "private", "first_name": "Test" },
                    "text": text,
                }
            }))
            .into_response()
        },
        "GetFile" => {
            let req: GetFileRequest = serde_json::from_slice(&body).expect("get file body");
            let size = state
                .files
                .lock()
                .unwrap()
                .get(&req.file_id)
                .map(Vec::len);
            match size {
                Some(size) => Json(json!({
                    "ok": true,
                    "result": {
                        "file_id": req.file_id,
                        "file_unique_id": format!("u-{}", req.file_id),
                        "file_size": size,
                        "file_path": format!("documents/{}.bin", req.file_id),
                    }
                }))
                .into_response(),
                None => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "ok": false,
                        "error_code": 400,
                        "description": "Bad Request: invalid file_id",
                    })),
                )
                    .into_response(),
            }
        },
        _ => Json(json!({ "ok": true, "result": true })).into_response(),
    }
}
