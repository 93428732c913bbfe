use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use clever_reply::{CleverbotApiError, ConversationService, ConversationTransport};
use cleverbot_api::{CancellationSignal, CleverbotRequest, RawResponse};
use pretty_assertions::assert_eq;

type Scripted = Result<RawResponse, CleverbotApiError>;

#[derive(Default)]
struct TransportTrace {
    requests: Vec<CleverbotRequest>,
    responses: VecDeque<Scripted>,
}

/// Replays scripted responses in order and records every request it sees.
struct ScriptedTransport {
    trace: Arc<Mutex<TransportTrace>>,
    delay: Duration,
}

impl ScriptedTransport {
    fn new(responses: Vec<Scripted>) -> (Arc<Self>, Arc<Mutex<TransportTrace>>) {
        Self::with_delay(responses, Duration::ZERO)
    }

    fn with_delay(
        responses: Vec<Scripted>,
        delay: Duration,
    ) -> (Arc<Self>, Arc<Mutex<TransportTrace>>) {
        let trace = Arc::new(Mutex::new(TransportTrace {
            requests: Vec::new(),
            responses: responses.into(),
        }));
        (
            Arc::new(Self {
                trace: Arc::clone(&trace),
                delay,
            }),
            trace,
        )
    }
}

#[async_trait]
impl ConversationTransport for ScriptedTransport {
    async fn post(
        &self,
        request: &CleverbotRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<RawResponse, CleverbotApiError> {
        let scripted = {
            let mut trace = lock_unpoisoned(&self.trace);
            trace.requests.push(request.clone());
            trace
                .responses
                .pop_front()
                .expect("transport called more often than scripted")
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if cancellation.is_some_and(|signal| signal.load(Ordering::Acquire)) {
            return Err(CleverbotApiError::Cancelled);
        }
        scripted
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn ok(text: &str) -> Scripted {
    Ok(RawResponse {
        status: 200,
        text: text.to_owned(),
    })
}

fn status(code: u16) -> Scripted {
    Ok(RawResponse {
        status: code,
        text: String::new(),
    })
}

fn requests(trace: &Arc<Mutex<TransportTrace>>) -> Vec<CleverbotRequest> {
    lock_unpoisoned(trace).requests.clone()
}

#[tokio::test]
async fn first_turn_sends_fresh_request_and_establishes_state() {
    let (transport, trace) = ScriptedTransport::new(vec![ok("Hello.\rABCDEF123\r55")]);
    let service = ConversationService::with_transport(transport);

    let reply = service.query("channel-1", "hi").await.expect("reply");

    assert_eq!(reply, "Hello.");
    let sent = requests(&trace);
    assert_eq!(sent.len(), 1);
    assert!(sent[0]
        .body
        .starts_with("stimulus=hi&cb_settings_language=en"));
    assert_eq!(sent[0].query, "uc=UseOfficialCleverbotAPI");

    let state = service.conversation("channel-1").await.expect("state");
    assert_eq!(state.session_id, "ABCDEF123");
    assert_eq!(state.session_aux, "ABC,55");
    assert_eq!(state.last_reply, "Hello.");
    assert_eq!(state.history, vec!["hi", "Hello."]);
}

#[tokio::test]
async fn follow_up_turn_replays_session_and_context() {
    let (transport, trace) = ScriptedTransport::new(vec![
        ok("hello\rSESSIONX\r7"),
        ok("I am fine.\rSESSIONY\r8"),
    ]);
    let service = ConversationService::with_transport(transport);

    service.query("channel-1", "hi").await.expect("first");
    service
        .query("channel-1", "how are you")
        .await
        .expect("second");

    let sent = requests(&trace);
    assert!(sent[1]
        .body
        .starts_with("stimulus=how%20are%20you&vText2=hello&vText3=hi&cb_settings_language=en"));
    assert_eq!(
        sent[1].query,
        "uc=UseOfficialCleverbotAPI&out=hello&in=how%20are%20you&bot=c&cbsid=SESSIONX&xai=SES%2C7&ns=2&al=&dl=&flag=&user=&mode=1&alt=0&reac=&emo=&sou=website&xed=&"
    );

    let state = service.conversation("channel-1").await.expect("state");
    assert_eq!(state.session_id, "SESSIONY");
    assert_eq!(state.session_aux, "SES,8");
}

#[tokio::test]
async fn history_grows_two_entries_per_turn_in_order() {
    let (transport, _trace) = ScriptedTransport::new(vec![
        ok("r1\rS1\r1"),
        ok("r2\rS2\r2"),
        ok("r3\rS3\r3"),
    ]);
    let service = ConversationService::with_transport(transport);

    for message in ["m1", "m2", "m3"] {
        service.query("channel-1", message).await.expect("turn");
    }

    let state = service.conversation("channel-1").await.expect("state");
    assert_eq!(state.history, vec!["m1", "r1", "m2", "r2", "m3", "r3"]);
}

#[tokio::test]
async fn denied_response_is_rate_limited_and_keeps_state() {
    let (transport, _trace) =
        ScriptedTransport::new(vec![ok("hello\rSESSIONX\r7"), ok("nope\rDENIED\r")]);
    let service = ConversationService::with_transport(transport);
    service.query("channel-1", "hi").await.expect("first");
    let before = service.conversation("channel-1").await;

    let error = service
        .query("channel-1", "again")
        .await
        .expect_err("denied turn fails");

    assert!(matches!(error, CleverbotApiError::RateLimited));
    assert_eq!(service.conversation("channel-1").await, before);
}

#[tokio::test]
async fn denied_first_turn_leaves_key_fresh() {
    let (transport, _trace) = ScriptedTransport::new(vec![ok("nope\rDENIED\r")]);
    let service = ConversationService::with_transport(transport);

    let error = service.query("channel-1", "hi").await.expect_err("denied");

    assert!(matches!(error, CleverbotApiError::RateLimited));
    assert_eq!(service.conversation("channel-1").await, None);
}

#[tokio::test]
async fn unexpected_status_fails_without_touching_state() {
    let (transport, trace) = ScriptedTransport::new(vec![
        ok("hello\rSESSIONX\r7"),
        status(500),
        ok("back\rSESSIONZ\r9"),
    ]);
    let service = ConversationService::with_transport(transport);
    service.query("channel-1", "hi").await.expect("first");

    let error = service
        .query("channel-1", "broken")
        .await
        .expect_err("500 fails");
    assert!(matches!(error, CleverbotApiError::UnexpectedStatus(500)));

    service.query("channel-1", "retry").await.expect("third");
    let sent = requests(&trace);
    assert_eq!(sent[1].query.replace("broken", "retry"), sent[2].query);

    let state = service.conversation("channel-1").await.expect("state");
    assert_eq!(state.history, vec!["hi", "hello", "retry", "back"]);
}

#[tokio::test]
async fn empty_reply_is_rejected() {
    let (transport, _trace) = ScriptedTransport::new(vec![ok("\rSESSION\r1")]);
    let service = ConversationService::with_transport(transport);

    let error = service.query("channel-1", "hi").await.expect_err("empty");

    assert!(matches!(error, CleverbotApiError::EmptyReply));
    assert_eq!(service.conversation("channel-1").await, None);
}

#[tokio::test]
async fn transport_errors_bubble_with_kind_preserved() {
    let (transport, _trace) = ScriptedTransport::new(vec![
        Err(CleverbotApiError::ServiceUnavailable {
            attempts: 15,
            last_error: "503 Service Unavailable".to_owned(),
        }),
        Err(CleverbotApiError::MissingCookie),
    ]);
    let service = ConversationService::with_transport(transport);

    let first = service.query("channel-1", "hi").await.expect_err("503");
    let second = service.query("channel-1", "hi").await.expect_err("cookie");

    assert!(matches!(
        first,
        CleverbotApiError::ServiceUnavailable { attempts: 15, .. }
    ));
    assert!(matches!(second, CleverbotApiError::MissingCookie));
    assert_eq!(service.conversation("channel-1").await, None);
}

#[tokio::test]
async fn reset_makes_next_request_identical_to_first_contact() {
    let (transport, trace) = ScriptedTransport::new(vec![
        ok("hello\rSESSIONX\r7"),
        ok("hello again\rSESSIONY\r8"),
    ]);
    let service = ConversationService::with_transport(transport);

    service.query("channel-1", "hi").await.expect("first");
    service.reset("channel-1").await;
    assert_eq!(service.conversation("channel-1").await, None);
    service.query("channel-1", "hi").await.expect("after reset");

    let sent = requests(&trace);
    assert_eq!(sent[0], sent[1]);
}

#[tokio::test]
async fn reset_unknown_key_is_noop() {
    let (transport, trace) = ScriptedTransport::new(Vec::new());
    let service = ConversationService::with_transport(transport);

    service.reset("never-used").await;

    assert!(requests(&trace).is_empty());
    assert_eq!(service.conversation("never-used").await, None);
}

#[tokio::test]
async fn keys_keep_separate_conversations() {
    let (transport, trace) = ScriptedTransport::new(vec![
        ok("for one\rONE111\r1"),
        ok("for two\rTWO222\r2"),
    ]);
    let service = ConversationService::with_transport(transport);

    service.query("channel-1", "hi").await.expect("one");
    service.query("channel-2", "hi").await.expect("two");

    let sent = requests(&trace);
    assert_eq!(sent[1].query, "uc=UseOfficialCleverbotAPI");
    assert_eq!(
        service.conversation("channel-1").await.map(|s| s.session_id),
        Some("ONE111".to_owned())
    );
    assert_eq!(
        service.conversation("channel-2").await.map(|s| s.session_id),
        Some("TWO222".to_owned())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_turns_on_same_key_do_not_lose_updates() {
    let (transport, trace) = ScriptedTransport::with_delay(
        vec![ok("first\rSESSIONA\r1"), ok("second\rSESSIONB\r2")],
        Duration::from_millis(50),
    );
    let service = Arc::new(ConversationService::with_transport(transport));

    let tasks = ["alpha", "beta"].map(|message| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.query("channel-1", message).await })
    });
    for task in tasks {
        task.await.expect("join").expect("turn");
    }

    let sent = requests(&trace);
    assert_eq!(sent[0].query, "uc=UseOfficialCleverbotAPI");
    assert!(sent[1].query.contains("&out=first&"));

    let state = service.conversation("channel-1").await.expect("state");
    assert_eq!(state.history.len(), 4);
    assert_eq!(state.history[1], "first");
    assert_eq!(state.history[3], "second");
}

#[tokio::test]
async fn cancelled_turn_surfaces_error_and_keeps_state() {
    let (transport, _trace) = ScriptedTransport::with_delay(
        vec![ok("too late\rSESSION\r1")],
        Duration::from_millis(20),
    );
    let service = ConversationService::with_transport(transport);
    let cancellation = Arc::new(AtomicBool::new(true));

    let error = service
        .query_with_cancel("channel-1", "hi", Some(&cancellation))
        .await
        .expect_err("cancelled");

    assert!(matches!(error, CleverbotApiError::Cancelled));
    assert_eq!(service.conversation("channel-1").await, None);
}
