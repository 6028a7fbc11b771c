//! Fuzz target for the session state machine
//!
//! # Strategy
//!
//! - Interleave raw backend output chunks with key presses
//! - Output chunks are arbitrary bytes, so malformed JSON, unknown types and
//!   broken nested lists all reach the store
//! - Key presses carry arbitrary sequences and names, with or without ctrl
//!
//! # Invariants
//!
//! - The session never panics
//! - The message log never exceeds `MESSAGE_LOG_CAPACITY`
//! - The input cursor stays within the text
//! - The local user is never listed in the roster

#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pqchat_app::{EventBus, KeyPress, MESSAGE_LOG_CAPACITY, Outbound, Session, SessionStep};

#[derive(Debug, Arbitrary)]
enum Step {
    Output(Vec<u8>),
    Key { sequence: String, name: String, ctrl: bool },
    Exit(i32),
}

fuzz_target!(|steps: Vec<Step>| {
    let (outbound, mut sent) = Outbound::channel();
    let mut session = Session::new(Rc::new(EventBus::new()), outbound);
    session.connect();

    for step in steps {
        let result = match step {
            Step::Output(chunk) => {
                session.handle_output(&chunk);
                SessionStep::Continue
            },
            Step::Key { sequence, name, ctrl } => {
                let mut press = KeyPress::new(sequence, name);
                if ctrl {
                    press = press.with_ctrl();
                }
                session.handle_key(&press)
            },
            Step::Exit(code) => {
                assert_eq!(session.handle_backend_exit(code), SessionStep::Quit { code });
                return;
            },
        };

        let store = session.store();
        assert!(store.messages().len() <= MESSAGE_LOG_CAPACITY);
        assert!(store.input().cursor() <= store.input().len());
        assert!(!store.users().iter().any(|u| store.connection().is_self(u)));

        while let Ok(line) = sent.try_recv() {
            assert!(line.ends_with('\n'));
        }

        if matches!(result, SessionStep::Quit { .. }) {
            return;
        }
    }
});
