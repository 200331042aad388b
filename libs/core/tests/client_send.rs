use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::anyhow;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode, header};
use teams_notify::{
    CardError, CardFormat, ClientConfig, HttpClient, Message, RawResponse, SendError, Table,
    TeamsClient, TextBlock, ToggleVisibility, adaptivecard::table_cells_with_text_block,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

const DEFAULT_URL: &str = "https://outlook.office.com/webhook/xxx";
const OTHER_TEAMS_URL: &str = "https://example.webhook.office.com/webhook/xxx";

#[derive(Clone, Copy)]
enum Reply {
    Respond(u16, &'static str),
    Fail(&'static str),
    Hang,
}

struct RecordingHttp {
    reply: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<Request<Bytes>>>,
}

impl RecordingHttp {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Request<Bytes> {
        self.requests
            .lock()
            .unwrap()
            .pop()
            .expect("a request was recorded")
    }
}

#[async_trait::async_trait]
impl HttpClient for RecordingHttp {
    async fn execute(&self, request: Request<Bytes>) -> anyhow::Result<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match self.reply {
            Reply::Respond(status, body) => Ok(RawResponse {
                status: StatusCode::from_u16(status).unwrap(),
                headers: HeaderMap::new(),
                body: Bytes::from_static(body.as_bytes()),
            }),
            Reply::Fail(reason) => Err(anyhow!(reason)),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(anyhow!("transport gave up"))
            }
        }
    }
}

fn client(http: &Arc<RecordingHttp>) -> TeamsClient {
    TeamsClient::with_http_client(http.clone())
}

fn message() -> Message {
    Message::simple("Deploy finished", "CI", true).unwrap()
}

/// Accepts one connection, reads the request and acknowledges it after `delay`.
/// The handle yields the request head.
async fn slow_webhook(delay: Duration) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let head = read_request(&mut stream).await;
        tokio::time::sleep(delay).await;
        let _ = stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1\r\nconnection: close\r\n\r\n1")
            .await;
        head
    });
    (addr, task)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).into_owned();
            if buf.len() >= end + 4 + content_length(&head) {
                return head;
            }
        }
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

#[tokio::test]
async fn default_pattern_and_ack_body_succeeds() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut msg = message();

    client(&http).send(DEFAULT_URL, &mut msg).await.unwrap();

    assert_eq!(http.call_count(), 1);
    assert!(msg.is_prepared());
    let request = http.last_request();
    assert_eq!(request.method(), http::Method::POST);
    assert_eq!(request.uri(), DEFAULT_URL);
    assert_eq!(
        request.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(
        request
            .headers()
            .get(header::USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("teams-notify/")
    );
    assert_eq!(request.body(), msg.payload().unwrap());
}

#[tokio::test]
async fn unmatched_url_fails_without_network_io() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut msg = message();

    let err = client(&http).send(OTHER_TEAMS_URL, &mut msg).await.unwrap_err();

    assert!(matches!(
        err,
        SendError::WebhookUrlUnexpected { ref host } if host == "example.webhook.office.com"
    ));
    assert_eq!(http.call_count(), 0);
    assert!(!msg.is_prepared());
}

#[tokio::test]
async fn skipping_validation_forwards_any_url() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut teams = client(&http);
    teams.skip_webhook_url_validation_on_send(true);

    teams.send(OTHER_TEAMS_URL, &mut message()).await.unwrap();
    assert_eq!(http.call_count(), 1);
}

#[tokio::test]
async fn custom_pattern_extends_default_set() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut teams = client(&http);
    teams
        .add_webhook_url_validation_patterns([r"^https://.*\.domain\.com/.*$"])
        .unwrap();

    teams
        .send("https://foo.domain.com/webhook/xxx", &mut message())
        .await
        .unwrap();
    teams.send(DEFAULT_URL, &mut message()).await.unwrap();
    let err = teams
        .send("https://foo.other.com/webhook/xxx", &mut message())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::WebhookUrlUnexpected { .. }));
    assert_eq!(http.call_count(), 2);
}

#[tokio::test]
async fn cleared_patterns_reject_defaults() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut teams = client(&http);
    teams
        .clear_webhook_url_validation_patterns()
        .add_webhook_url_validation_patterns([r"^https://hooks\.internal\.test/.*$"])
        .unwrap();

    let err = teams.send(DEFAULT_URL, &mut message()).await.unwrap_err();
    assert!(matches!(err, SendError::WebhookUrlUnexpected { .. }));
    teams
        .send("https://hooks.internal.test/a/b", &mut message())
        .await
        .unwrap();
    assert_eq!(http.call_count(), 1);
}

#[tokio::test]
async fn unexpected_responses_carry_status_and_body() {
    let cases = [
        (400, "Bad payload", StatusCode::BAD_REQUEST),
        (200, "Webhook message delivery failed with error: 429", StatusCode::OK),
        (500, "1", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (status, body, expected) in cases {
        let http = RecordingHttp::new(Reply::Respond(status, body));
        let err = client(&http)
            .send(DEFAULT_URL, &mut message())
            .await
            .unwrap_err();
        match err {
            SendError::WebhookResponseUnexpected {
                status,
                body: got,
            } => {
                assert_eq!(status, expected);
                assert_eq!(got, body);
            }
            other => panic!("expected response error for {status}, got {other}"),
        }
        assert_eq!(http.call_count(), 1, "no retry for {status}");
    }
}

#[tokio::test]
async fn transport_error_is_wrapped() {
    let http = RecordingHttp::new(Reply::Fail("connection refused"));
    let err = client(&http)
        .send(DEFAULT_URL, &mut message())
        .await
        .unwrap_err();

    match err {
        SendError::Transport(source) => assert!(source.to_string().contains("connection refused")),
        other => panic!("expected transport error, got {other}"),
    }
    assert_eq!(http.call_count(), 1);
}

#[tokio::test]
async fn malformed_url_with_validation_skipped_is_a_transport_error() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut teams = client(&http);
    teams.skip_webhook_url_validation_on_send(true);

    let err = teams
        .send("not a url at all", &mut message())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Transport(_)));
    assert_eq!(http.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_transport_times_out() {
    let http = RecordingHttp::new(Reply::Hang);
    let mut teams = client(&http);
    teams.set_timeout(Duration::from_secs(2));

    let err = teams
        .send(DEFAULT_URL, &mut message())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Timeout(d) if d == Duration::from_secs(2)));
    assert_eq!(http.call_count(), 1);
}

#[tokio::test]
async fn invalid_message_fails_before_network_io() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let mut msg = message();
    let mut toggle = ToggleVisibility::new("Details");
    toggle.add_target_ids(None, ["missing"]).unwrap();
    msg.add_action(false, toggle).unwrap();

    let err = client(&http).send(DEFAULT_URL, &mut msg).await.unwrap_err();

    assert!(matches!(
        err,
        SendError::InvalidMessage(CardError::UnresolvedTargetId { .. })
    ));
    assert_eq!(http.call_count(), 0);
    assert!(!msg.is_prepared());
}

#[tokio::test]
async fn prepared_payload_is_reused_across_sends() {
    let http = RecordingHttp::new(Reply::Respond(200, "1"));
    let teams = client(&http);
    let mut msg = Message::new(CardFormat::Adaptive);
    let rows = vec![
        table_cells_with_text_block(["Name", "Status", "Owner"]),
        table_cells_with_text_block(["api", "ok", "ops"]),
        table_cells_with_text_block(["worker", "degraded", "ops"]),
    ];
    msg.add_element(false, [Table::from_cells(rows, 3, true, true).unwrap()])
        .unwrap();

    teams.send(DEFAULT_URL, &mut msg).await.unwrap();
    let first = http.last_request().into_body();
    teams.send(DEFAULT_URL, &mut msg).await.unwrap();
    let second = http.last_request().into_body();
    assert_eq!(first, second);

    msg.add_element(false, [TextBlock::new("footer", true)])
        .unwrap();
    assert!(!msg.is_prepared());
    teams.send(DEFAULT_URL, &mut msg).await.unwrap();
    assert_ne!(http.last_request().into_body(), first);
}

#[tokio::test]
async fn from_config_applies_patterns_and_timeout() {
    let config = ClientConfig::default()
        .with_timeout(Duration::from_secs(9))
        .with_user_agent("ops-bot/1");
    let config = ClientConfig {
        url_patterns: vec![r"^https://.*\.domain\.com/.*$".into()],
        replace_default_patterns: true,
        ..config
    };
    let mut teams = client(&RecordingHttp::new(Reply::Respond(200, "1")));
    teams.apply_config(&config).unwrap();

    assert_eq!(teams.timeout(), Duration::from_secs(9));
    assert_eq!(teams.user_agent(), "ops-bot/1");
    assert!(teams.validate_webhook("https://a.domain.com/x").is_ok());
    assert!(teams.validate_webhook(DEFAULT_URL).is_err());
}

#[tokio::test]
#[tracing_test::traced_test]
async fn logs_name_the_host_but_never_the_token() {
    let http = RecordingHttp::new(Reply::Respond(502, "upstream down"));
    let url = "https://outlook.office.com/webhook/SECRET_TOKEN_123";

    let err = client(&http).send(url, &mut message()).await.unwrap_err();
    assert!(matches!(err, SendError::WebhookResponseUnexpected { .. }));
    assert!(!err.to_string().contains("SECRET_TOKEN_123"));

    logs_assert(|lines: &[&str]| {
        let rejected = lines.iter().any(|line| {
            line.contains("webhook rejected message") && line.contains("outlook.office.com")
        });
        let leaked = lines.iter().any(|line| line.contains("SECRET_TOKEN_123"));
        if !rejected {
            return Err(format!("expected rejection log, lines: {:?}", lines));
        }
        if leaked {
            return Err("webhook token leaked into logs".into());
        }
        Ok(())
    });
}

#[tokio::test]
async fn raised_timeout_applies_to_reqwest_transport() {
    let (addr, server) = slow_webhook(Duration::from_millis(1500)).await;
    let config = ClientConfig::default().with_timeout(Duration::from_millis(500));
    let mut teams = TeamsClient::from_config(&config).unwrap();
    teams
        .skip_webhook_url_validation_on_send(true)
        .set_timeout(Duration::from_secs(10));

    teams
        .send(&format!("http://{addr}/webhook/xxx"), &mut message())
        .await
        .unwrap();

    let head = server.await.unwrap();
    assert!(head.starts_with("POST /webhook/xxx HTTP/1.1"));
}

#[tokio::test]
async fn short_timeout_against_slow_server_is_reported() {
    let (addr, server) = slow_webhook(Duration::from_secs(5)).await;
    let mut teams = TeamsClient::from_config(&ClientConfig::default()).unwrap();
    teams
        .skip_webhook_url_validation_on_send(true)
        .set_timeout(Duration::from_millis(300));

    let err = teams
        .send(&format!("http://{addr}/webhook/xxx"), &mut message())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Timeout(d) if d == Duration::from_millis(300)));
    server.abort();
}

#[tokio::test]
async fn applied_proxy_routes_reqwest_transport() {
    let (addr, proxy) = slow_webhook(Duration::ZERO).await;
    let mut teams = TeamsClient::from_config(&ClientConfig::default()).unwrap();
    let config = ClientConfig {
        skip_url_validation: true,
        ..ClientConfig::default()
            .with_proxy(format!("http://{addr}"))
            .with_user_agent("ops-bot/1")
    };
    teams.apply_config(&config).unwrap();

    teams
        .send("http://teams.invalid/webhook/xxx", &mut message())
        .await
        .unwrap();

    let head = proxy.await.unwrap().to_ascii_lowercase();
    assert!(head.starts_with("post http://teams.invalid/webhook/xxx http/1.1"));
    assert!(head.contains("user-agent: ops-bot/1"));
}
