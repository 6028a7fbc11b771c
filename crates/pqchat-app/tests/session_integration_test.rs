//! Integration tests for the session driven by raw backend output.
//!
//! Each test feeds protocol lines the way the backend writes them and ends
//! with oracle checks on:
//! - store contents after reconciliation
//! - notifications published on the bus
//! - commands written to the backend's stdin

use std::{cell::RefCell, rc::Rc};

use pqchat_app::{
    EventBus, KeyPress, Outbound, Payload, Renderer, Screen, Session, SessionStep, Topic,
    view::{Line, StyledText, Widget},
};
use pqchat_proto::RoomId;
use serde_json::json;
use tokio::sync::mpsc;

/// Session wired to a bus, with every notification recorded.
struct Harness {
    bus: Rc<EventBus>,
    session: Session,
    stdin: mpsc::UnboundedReceiver<String>,
    seen: Rc<RefCell<Vec<Topic>>>,
}

impl Harness {
    fn new() -> Self {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        for topic in [Topic::Identity, Topic::Roster, Topic::Rooms, Topic::MessageLog, Topic::InputBar]
        {
            let seen = Rc::clone(&seen);
            bus.subscribe(topic, "recorder", move |_| seen.borrow_mut().push(topic));
        }

        let (outbound, stdin) = Outbound::channel();
        let session = Session::new(Rc::clone(&bus), outbound);
        Self { bus, session, stdin, seen }
    }

    fn feed(&mut self, frame: &serde_json::Value) {
        self.session.handle_output(format!("{frame}\n").as_bytes());
    }

    fn type_line(&mut self, text: &str) -> SessionStep {
        for c in text.chars() {
            self.session.handle_key(&KeyPress::char(c));
        }
        self.session.handle_key(&KeyPress::new("\r", "return"))
    }

    fn take_seen(&self) -> Vec<Topic> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }

    fn stdin_lines(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.stdin.try_recv().ok()).collect()
    }

    fn usernames(&self) -> Vec<&str> {
        self.session.store().users().iter().map(|u| u.username()).collect()
    }
}

fn me() -> serde_json::Value {
    json!({"userId": "u-me", "username": "alice", "color": "#abcdef", "currentRoomId": "r1"})
}

fn user(id: &str, name: &str) -> serde_json::Value {
    json!({"userId": id, "username": name, "color": "#123456"})
}

#[test]
fn connect_handshake_and_identity() {
    let mut h = Harness::new();
    h.session.connect();
    assert_eq!(h.stdin_lines(), vec!["{\"type\":\"connect\",\"value\":\"\"}\n"]);

    h.feed(&json!({"type": "connected", "value": "alice", "metadata": me()}));

    let store = h.session.store();
    assert!(store.connection().is_connected);
    assert_eq!(store.connection().current_user.as_ref().map(|u| u.username()), Some("alice"));
    assert_eq!(store.current_room_id(), Some(&RoomId::new("r1")));
    assert_eq!(store.messages().back().map(|m| m.text.as_str()), Some("Connected to server."));

    let seen = h.take_seen();
    for topic in [Topic::Identity, Topic::Roster, Topic::MessageLog] {
        assert!(seen.contains(&topic), "missing {topic:?}");
    }
}

#[test]
fn roster_tracks_enter_and_leave_but_never_self() {
    let mut h = Harness::new();
    h.feed(&json!({"type": "connected", "value": "", "metadata": me()}));

    h.feed(&json!({"type": "user_entered_chat", "value": "bob", "metadata": user("u-bob", "bob")}));
    h.feed(&json!({"type": "user_entered_chat", "value": "alice", "metadata": me()}));
    h.feed(&json!({"type": "user_entered_chat", "value": "carol", "metadata": user("u-carol", "carol")}));
    assert_eq!(h.usernames(), vec!["bob", "carol"]);

    h.feed(&json!({"type": "user_left_chat", "value": "bob", "metadata": user("u-bob", "bob")}));
    h.feed(&json!({"type": "user_left_chat", "value": "alice", "metadata": me()}));
    assert_eq!(h.usernames(), vec!["carol"]);
    assert!(h.take_seen().contains(&Topic::Roster));
}

#[test]
fn self_reported_in_legacy_shape_stays_out_of_roster() {
    // The server lists users without ids, while `connected` carries ours.
    let mut h = Harness::new();
    h.feed(&json!({"type": "connected", "value": "", "metadata":
        {"userId": "c1", "username": "alice", "color": "#abc"}}));

    let users = json!([
        {"username": "alice", "color": "#abc"},
        {"username": "bob", "color": "#def"},
    ])
    .to_string();
    h.feed(&json!({"type": "current_users", "value": users}));
    h.feed(&json!({"type": "user_entered_chat", "value": "alice", "metadata":
        {"username": "alice", "color": "#abc"}}));
    assert_eq!(h.usernames(), vec!["bob"]);

    h.feed(&json!({"type": "user_left_chat", "value": "alice", "metadata":
        {"username": "alice", "color": "#abc"}}));
    assert_eq!(h.usernames(), vec!["bob"]);
}

#[test]
fn current_users_is_authoritative() {
    let mut h = Harness::new();
    h.feed(&json!({"type": "connected", "value": "", "metadata": me()}));
    h.feed(&json!({"type": "user_entered_chat", "value": "zed", "metadata": user("u-zed", "zed")}));

    let users = json!([user("u-bob", "bob"), me(), user("u-dan", "dan")]).to_string();
    h.feed(&json!({"type": "current_users", "value": users}));

    assert_eq!(h.usernames(), vec!["bob", "dan"]);
}

#[test]
fn current_rooms_leaves_exactly_listed_rooms() {
    let mut h = Harness::new();
    h.feed(&json!({"type": "created_room", "value": json!({"ID": "old", "Name": "Old"}).to_string()}));

    let rooms = json!([{"ID": "r1", "Name": "Lobby"}, {"ID": "r2", "Name": "Dev"}]).to_string();
    h.feed(&json!({"type": "current_rooms", "value": rooms}));

    let ids: Vec<_> = h.session.store().rooms().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
    assert_eq!(h.take_seen(), vec![Topic::Rooms, Topic::Rooms]);
}

#[test]
fn room_lifecycle() {
    let mut h = Harness::new();
    let lobby = json!({"ID": "r1", "Name": "Lobby", "CreatedBy": "u-me"}).to_string();

    h.feed(&json!({"type": "created_room", "value": lobby}));
    assert_eq!(h.session.store().current_room_id(), None);

    h.feed(&json!({"type": "joined_room", "value": lobby}));
    assert_eq!(h.session.store().current_room().map(|r| r.name.as_str()), Some("Lobby"));

    h.feed(&json!({"type": "left_room", "value": lobby}));
    assert_eq!(h.session.store().current_room_id(), None);
    assert_eq!(h.session.store().rooms().len(), 1);

    h.feed(&json!({"type": "deleted_room", "value": lobby}));
    assert!(h.session.store().rooms().is_empty());
}

#[test]
fn malformed_line_between_valid_lines_is_skipped() {
    let mut h = Harness::new();
    let chunk = concat!(
        "{\"type\":\"message\",\"value\":\"first\"}\n",
        "{\"type\":\"message\",\"value\":\n",
        "{\"type\":\"message\",\"value\":\"second\"}\n",
    );
    h.session.handle_output(chunk.as_bytes());

    let texts: Vec<_> = h.session.store().messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(h.session.stats().parse_failures, 1);
}

#[test]
fn status_lines_are_colored() {
    let mut h = Harness::new();
    h.feed(&json!({"type": "error", "value": "room not found"}));
    h.feed(&json!({"type": "success", "value": "room created"}));
    h.feed(&json!({"type": "message", "value": "hi", "metadata": user("u-bob", "bob")}));
    h.feed(&json!({"type": "keys_exchanged", "value": ""}));

    let lines: Vec<_> = h
        .session
        .store()
        .messages()
        .iter()
        .map(|m| (m.text.as_str(), m.color.as_str()))
        .collect();
    assert_eq!(lines, vec![
        ("room not found", "#F00"),
        ("room created", "#0F0"),
        ("hi", "#123456"),
        ("Keys exchanged.", "#7ee787"),
    ]);
}

#[test]
fn submit_hello_sends_exactly_one_frame() {
    let mut h = Harness::new();

    assert_eq!(h.type_line("hello"), SessionStep::Continue);

    assert_eq!(h.stdin_lines(), vec!["{\"type\":\"send\",\"value\":\"hello\"}\n"]);
    let sent: Vec<_> = h.session.store().messages().iter().filter(|m| m.is_sent).collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].color.as_str(), "#58a6ff");
    assert!(h.session.store().input().is_empty());

    assert_eq!(h.type_line("   "), SessionStep::Continue);
    assert!(h.stdin_lines().is_empty());
    assert_eq!(h.session.store().messages().len(), 1);
}

#[test]
fn message_appended_carries_the_message() {
    let mut h = Harness::new();
    let appended = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&appended);
    h.bus.subscribe(Topic::MessageAppended, "test", move |payload| {
        if let Some(Payload::Message(message)) = payload {
            sink.borrow_mut().push(message.text.clone());
        }
    });

    h.feed(&json!({"type": "message", "value": "incoming"}));
    h.type_line("outgoing");

    assert_eq!(*appended.borrow(), vec!["incoming", "outgoing"]);
}

#[test]
fn disconnected_clears_everything_but_its_status_line() {
    let mut h = Harness::new();
    h.feed(&json!({"type": "connected", "value": "", "metadata": me()}));
    h.feed(&json!({"type": "user_entered_chat", "value": "", "metadata": user("u-bob", "bob")}));
    h.feed(&json!({"type": "joined_room", "value": json!({"ID": "r1", "Name": "Lobby"}).to_string()}));
    for c in "draft".chars() {
        h.session.handle_key(&KeyPress::char(c));
    }

    h.feed(&json!({"type": "disconnected", "value": "", "metadata": me()}));

    let store = h.session.store();
    assert!(!store.connection().is_connected);
    assert!(store.users().is_empty());
    assert!(store.rooms().is_empty());
    assert!(store.input().is_empty());
    let texts: Vec<_> = store.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["Disconnected from server."]);
}

#[test]
fn backend_exit_propagates_code() {
    let mut h = Harness::new();
    let mut shell = h.bus.subscribe_mailbox(&[Topic::ExitRequested], "shell");

    assert_eq!(h.session.handle_backend_exit(2), SessionStep::Quit { code: 2 });
    assert_eq!(shell.try_recv().and_then(|n| n.payload), Some(Payload::Exit { code: 2 }));
}

#[derive(Default)]
struct TextScreen {
    widgets: Vec<(Widget, Vec<String>)>,
}

impl Screen for TextScreen {
    fn display_text(&mut self, widget: Widget, text: StyledText) {
        self.widgets.push((widget, text.iter().map(Line::text).collect()));
    }

    fn clear(&mut self, widget: Widget) {
        self.widgets.push((widget, Vec::new()));
    }
}

#[test]
fn renderer_follows_session_updates() {
    let mut h = Harness::new();
    let mut renderer = Renderer::new(&h.bus);
    let mut screen = TextScreen::default();

    h.feed(&json!({"type": "connected", "value": "", "metadata": me()}));
    h.feed(&json!({"type": "user_entered_chat", "value": "", "metadata": user("u-bob", "bob")}));
    h.session.handle_key(&KeyPress::char('x'));

    assert!(renderer.refresh(h.session.store(), &mut screen));

    let find = |widget| screen.widgets.iter().find(|(w, _)| *w == widget).map(|(_, t)| t.clone());
    assert_eq!(find(Widget::Users), Some(vec![
        "Connected Users".to_string(),
        String::new(),
        "● bob".to_string()
    ]));
    assert_eq!(find(Widget::CurrentUser), Some(vec!["● alice".to_string()]));
    assert_eq!(find(Widget::InputBar), Some(vec!["> x ".to_string()]));
    assert_eq!(find(Widget::Status), Some(vec![
        "Type: 1 chars | Press Enter to send, ESC to exit".to_string()
    ]));
    assert!(!renderer.refresh(h.session.store(), &mut screen));
}
