use std::sync::{Arc, Mutex};

use chat_wire::stream_error_marker;
use futures::StreamExt;

use super::*;
use crate::net::api::FragmentStream;

// =============================================================
// Test doubles
// =============================================================

type Events = Arc<Mutex<Vec<String>>>;
type Reply = Result<Vec<Result<String, ClientError>>, ClientError>;

struct ScriptedSource {
    reply: Mutex<Option<Reply>>,
    events: Events,
}

impl ScriptedSource {
    fn new(reply: Reply, events: &Events) -> Self {
        Self { reply: Mutex::new(Some(reply)), events: events.clone() }
    }

    fn fragments(fragments: &[&str], events: &Events) -> Self {
        Self::new(Ok(fragments.iter().map(|f| Ok((*f).to_string())).collect()), events)
    }
}

#[async_trait::async_trait]
impl FragmentSource for ScriptedSource {
    async fn open(&self, message: &str) -> Result<FragmentStream, ClientError> {
        self.events.lock().unwrap().push(format!("open:{message}"));
        let reply = self.reply.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()));
        reply.map(|items| futures::stream::iter(items).boxed())
    }
}

struct RecordingView {
    events: Events,
}

impl TranscriptView for RecordingView {
    fn message_appended(&mut self, message: &ChatMessage) {
        self.events
            .lock()
            .unwrap()
            .push(format!("appended:{:?}:{}", message.role, message.content));
    }

    fn message_extended(&mut self, message: &ChatMessage, fragment: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("extended:{}:{fragment}", message.id));
    }

    fn loading_changed(&mut self, loading: bool) {
        self.events.lock().unwrap().push(format!("loading:{loading}"));
    }

    fn scroll_to_latest(&mut self) {
        self.events.lock().unwrap().push("scroll".into());
    }
}

fn harness() -> (Events, RecordingView) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let view = RecordingView { events: events.clone() };
    (events, view)
}

fn events_of(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}

// =============================================================
// ChatState defaults
// =============================================================

#[test]
fn chat_state_default_empty_messages() {
    let state = ChatState::default();
    assert!(state.messages().is_empty());
    assert!(!state.is_loading());
    assert!(state.input_enabled());
}

// =============================================================
// submit
// =============================================================

#[tokio::test]
async fn user_message_appended_before_network() {
    let (events, mut view) = harness();
    let source = ScriptedSource::fragments(&["ok"], &events);
    let mut state = ChatState::new();

    state.submit("hello", &source, &mut view).await.unwrap();

    let log = events_of(&events);
    assert_eq!(&log[..3], ["appended:User:hello", "loading:true", "open:hello"]);
}

#[test]
fn begin_appends_user_message_synchronously() {
    let mut state = ChatState::new();
    let sent = state.begin("  hi there ", &mut ()).unwrap();
    assert_eq!(sent, "hi there");
    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].role, Role::User);
    assert_eq!(state.messages()[0].content, "hi there");
    assert!(state.is_loading());
    assert!(!state.input_enabled());
}

#[tokio::test]
async fn fragments_grow_one_model_message() {
    let (events, mut view) = harness();
    let source = ScriptedSource::fragments(&["Hel", "lo", " world"], &events);
    let mut state = ChatState::new();

    state.submit("greet", &source, &mut view).await.unwrap();

    let messages = state.messages();
    assert_eq!(messages.len(), 2);
    let model: Vec<&ChatMessage> = messages.iter().filter(|m| m.role == Role::Model).collect();
    assert_eq!(model.len(), 1);
    assert_eq!(model[0].content, "Hello world");
    assert!(model[0].id > messages[0].id);

    let log = events_of(&events);
    let id = model[0].id;
    assert!(log.contains(&"appended:Model:Hel".to_string()));
    assert!(log.contains(&format!("extended:{id}:lo")));
    assert!(log.contains(&format!("extended:{id}: world")));
}

#[tokio::test]
async fn zero_fragments_appends_no_model_message() {
    let (events, mut view) = harness();
    let source = ScriptedSource::fragments(&[], &events);
    let mut state = ChatState::new();

    state.submit("anyone?", &source, &mut view).await.unwrap();

    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].role, Role::User);
    assert!(!state.is_loading());
}

#[tokio::test]
async fn open_failure_becomes_model_message() {
    let (events, mut view) = harness();
    let err = ClientError::Server { status: 500, message: "quota exceeded".into() };
    let source = ScriptedSource::new(Err(err), &events);
    let mut state = ChatState::new();

    state.submit("hi", &source, &mut view).await.unwrap();

    let messages = state.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Model);
    assert_eq!(
        messages[1].content,
        "An error occurred while communicating with the AI. quota exceeded. Please try again."
    );
    assert!(!state.is_loading());
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_reply_and_adds_error() {
    let (events, mut view) = harness();
    let reply = Ok(vec![Ok("Part".to_string()), Err(ClientError::Transport("reset".into())), Ok("lost".to_string())]);
    let source = ScriptedSource::new(reply, &events);
    let mut state = ChatState::new();

    state.submit("hi", &source, &mut view).await.unwrap();

    let messages = state.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "Part");
    assert!(messages[2].content.contains("failed to communicate with chat server: reset"));
}

#[tokio::test]
async fn loading_cleared_and_scrolled_after_any_exchange() {
    for reply in [Ok(vec![Ok("fine".to_string())]), Err(ClientError::MissingBody)] {
        let (events, mut view) = harness();
        let source = ScriptedSource::new(reply, &events);
        let mut state = ChatState::new();

        state.submit("hi", &source, &mut view).await.unwrap();

        assert!(!state.is_loading());
        assert!(state.input_enabled());
        let log = events_of(&events);
        assert_eq!(&log[log.len() - 2..], ["loading:false", "scroll"]);
    }
}

#[tokio::test]
async fn blank_text_is_rejected_without_side_effects() {
    let (events, mut view) = harness();
    let source = ScriptedSource::fragments(&["unused"], &events);
    let mut state = ChatState::new();

    assert_eq!(state.submit(" \n\t", &source, &mut view).await, Err(SubmitError::Blank));
    assert!(state.messages().is_empty());
    assert!(events_of(&events).is_empty());
}

#[tokio::test]
async fn submit_while_loading_is_busy() {
    let (events, mut view) = harness();
    let source = ScriptedSource::fragments(&["unused"], &events);
    let mut state = ChatState::new();
    state.begin("first", &mut ()).unwrap();

    assert_eq!(state.submit("second", &source, &mut view).await, Err(SubmitError::Busy));
    assert_eq!(state.messages().len(), 1);
    assert!(events_of(&events).is_empty());
}

#[tokio::test]
async fn consecutive_exchanges_keep_separate_replies() {
    let (events, mut view) = harness();
    let mut state = ChatState::new();

    state.submit("one", &ScriptedSource::fragments(&["A", "a"], &events), &mut view).await.unwrap();
    state.submit("two", &ScriptedSource::fragments(&["B"], &events), &mut view).await.unwrap();

    let contents: Vec<&str> = state.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "Aa", "two", "B"]);

    let ids: Vec<MessageId> = state.messages().iter().map(|m| m.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

// =============================================================
// transitions
// =============================================================

#[test]
fn apply_fragment_ignores_empty_text() {
    let mut state = ChatState::new();
    state.begin("q", &mut ()).unwrap();
    state.apply_fragment("", &mut ());
    assert_eq!(state.messages().len(), 1);
}

#[test]
fn degraded_reply_is_detected() {
    let mut state = ChatState::new();
    state.begin("q", &mut ()).unwrap();
    state.apply_fragment("partial", &mut ());
    state.apply_fragment(&stream_error_marker("upstream error: boom"), &mut ());
    state.finish(&mut ());

    let reply = &state.messages()[1];
    assert!(reply.is_degraded());
    assert!(!state.messages()[0].is_degraded());
}

#[test]
fn answer_with_error_line_is_not_degraded() {
    let mut state = ChatState::new();
    state.begin("show me a log", &mut ()).unwrap();
    state.apply_fragment("Here is a sample log:\nERROR: disk full\nINFO: retrying", &mut ());
    state.finish(&mut ());

    assert!(!state.messages()[1].is_degraded());
}

#[test]
fn message_id_display() {
    let mut state = ChatState::new();
    state.begin("q", &mut ()).unwrap();
    assert_eq!(state.messages()[0].id.to_string(), "msg-0");
}
