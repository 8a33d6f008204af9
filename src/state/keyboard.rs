//! Keyboard Module - Page-level key handlers
//!
//! The host forwards key presses through `MountHandle::dispatch` (or
//! [`dispatch`] directly). Components subscribe per key name and get a
//! cleanup closure back; the navigation menu uses this to close on Escape.
//!
//! Handlers live in a thread-local registry, like every other piece of
//! page state: the page is single-threaded.
//!
//! # Example
//!
//! ```ignore
//! use spark_folio::state::keyboard::{self, KeyboardEvent};
//!
//! let cleanup = keyboard::on_key("Escape", || {
//!     close_menu();
//!     false // let the page see it too
//! });
//! keyboard::dispatch(KeyboardEvent::new("Escape"));
//! cleanup();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// A key press as the host reports it (`KeyboardEvent.key` naming).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: String,
    /// Auto-repeat from a held key. Never dispatched.
    pub repeat: bool,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repeat: false,
        }
    }

    pub fn repeated(key: impl Into<String>) -> Self {
        Self {
            repeat: true,
            ..Self::new(key)
        }
    }
}

/// Return true to consume the event.
pub type KeyHandler = Rc<dyn Fn() -> bool>;

// =============================================================================
// REGISTRY
// =============================================================================

struct Subscription {
    id: u64,
    key: String,
    handler: KeyHandler,
}

#[derive(Default)]
struct KeyRegistry {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

thread_local! {
    static KEYS: RefCell<KeyRegistry> = RefCell::new(KeyRegistry::default());
}

/// Call `handler` whenever `key` is pressed. Returns the unsubscribe closure.
pub fn on_key<F>(key: &str, handler: F) -> impl FnOnce() + 'static
where
    F: Fn() -> bool + 'static,
{
    let id = KEYS.with(|keys| {
        let mut keys = keys.borrow_mut();
        let id = keys.next_id;
        keys.next_id += 1;
        keys.subscriptions.push(Subscription {
            id,
            key: key.to_string(),
            handler: Rc::new(handler),
        });
        id
    });

    move || {
        KEYS.with(|keys| keys.borrow_mut().subscriptions.retain(|s| s.id != id));
    }
}

/// Run the handlers for `event.key` in subscription order until one
/// consumes it. Returns whether one did.
pub fn dispatch(event: KeyboardEvent) -> bool {
    if event.repeat {
        return false;
    }

    // Handlers may unsubscribe while running
    let handlers: Vec<KeyHandler> = KEYS.with(|keys| {
        keys.borrow()
            .subscriptions
            .iter()
            .filter(|s| s.key == event.key)
            .map(|s| s.handler.clone())
            .collect()
    });

    handlers.iter().any(|handler| handler())
}

/// Number of handlers subscribed to `key`.
pub fn handler_count(key: &str) -> usize {
    KEYS.with(|keys| keys.borrow().subscriptions.iter().filter(|s| s.key == key).count())
}

/// Drop every subscription (for testing)
pub fn reset_keyboard_state() {
    KEYS.with(|keys| *keys.borrow_mut() = KeyRegistry::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() {
        reset_keyboard_state();
    }

    fn counter(consume: bool) -> (Rc<Cell<u32>>, impl Fn() -> bool + 'static) {
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        (count, move || {
            seen.set(seen.get() + 1);
            consume
        })
    }

    #[test]
    fn test_on_key_and_cleanup() {
        setup();
        let (count, handler) = counter(true);
        let cleanup = on_key("Escape", handler);

        assert!(dispatch(KeyboardEvent::new("Escape")));
        assert!(!dispatch(KeyboardEvent::new("Enter")));
        assert_eq!(count.get(), 1);

        cleanup();
        assert!(!dispatch(KeyboardEvent::new("Escape")));
        assert_eq!(count.get(), 1);
        assert_eq!(handler_count("Escape"), 0);
    }

    #[test]
    fn test_repeat_not_dispatched() {
        setup();
        let (count, handler) = counter(false);
        let _cleanup = on_key("Escape", handler);

        assert!(!dispatch(KeyboardEvent::repeated("Escape")));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_consuming_handler_stops_the_rest() {
        setup();
        let (first, first_handler) = counter(false);
        let (second, second_handler) = counter(true);
        let (third, third_handler) = counter(true);
        let _a = on_key("Escape", first_handler);
        let _b = on_key("Escape", second_handler);
        let _c = on_key("Escape", third_handler);

        assert!(dispatch(KeyboardEvent::new("Escape")));
        assert_eq!((first.get(), second.get(), third.get()), (1, 1, 0));
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        setup();

        let cleanup: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));
        let slot = cleanup.clone();
        let stop = on_key("Escape", move || {
            if let Some(stop) = slot.borrow_mut().take() {
                stop();
            }
            true
        });
        *cleanup.borrow_mut() = Some(Box::new(stop));

        assert!(dispatch(KeyboardEvent::new("Escape")));
        assert!(!dispatch(KeyboardEvent::new("Escape")));
    }
}
