//! Per-UI-thread registry of the windows that thread owns.
//!
//! Every runtime funnels its messages through here, so marshaling, input
//! translation and teardown behave the same whichever runtime hosts a window.

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, trace, warn};

use crate::bootstrap::WindowConfig;
use crate::error::{Result, WindowError};
use crate::events::{is_copy_chord, InputTracker, RawInput, WindowEvent};
use crate::lifecycle::Lifecycle;
use crate::runtime::{OpenRequest, Screen, UiMessage, WindowKey, WindowPhase, WindowShared};

struct UiWindow {
    screen: Box<dyn Screen>,
    shared: Arc<WindowShared>,
    lifecycle: Arc<Lifecycle>,
    input: InputTracker,
}

thread_local! {
    static WINDOWS: RefCell<HashMap<WindowKey, Rc<RefCell<UiWindow>>>> = RefCell::new(HashMap::new());
}

fn get(key: WindowKey) -> Option<Rc<RefCell<UiWindow>>> {
    WINDOWS.with(|w| w.borrow().get(&key).cloned())
}

pub(crate) fn contains(key: WindowKey) -> bool {
    WINDOWS.with(|w| w.borrow().contains_key(&key))
}

/// Create the screen for `request`, register it, and answer the rendezvous.
pub(crate) fn open(
    request: OpenRequest,
    create: impl FnOnce(&WindowConfig) -> Result<Box<dyn Screen>>,
) -> bool {
    let OpenRequest {
        key,
        config,
        shared,
        lifecycle,
        reply,
    } = request;

    match create(&config) {
        Ok(screen) => {
            lifecycle.register_window();
            shared.mark_handle_created();
            let window = UiWindow {
                screen,
                shared,
                lifecycle,
                input: InputTracker::default(),
            };
            WINDOWS.with(|w| w.borrow_mut().insert(key, Rc::new(RefCell::new(window))));
            debug!(?key, title = %config.title, "window created");
            reply.send(Ok(std::thread::current().id())).ok();
            true
        }
        Err(e) => {
            warn!(?key, error = %e, "window creation failed");
            reply.send(Err(e)).ok();
            false
        }
    }
}

/// Run `f` against the window's screen. Fails with `Cancelled` when the
/// window is gone and with `Reentrant` when called from inside another action
/// on the same window.
pub(crate) fn with_screen<R>(key: WindowKey, f: impl FnOnce(&mut dyn Screen) -> R) -> Result<R> {
    let cell = get(key).ok_or(WindowError::Cancelled)?;
    let Ok(mut window) = cell.try_borrow_mut() else {
        return Err(WindowError::Reentrant);
    };
    Ok(f(window.screen.as_mut()))
}

/// Whether an action on this window is running further up the stack.
pub(crate) fn is_busy(key: WindowKey) -> bool {
    let Some(cell) = get(key) else {
        return false;
    };
    let busy = cell.try_borrow_mut().is_err();
    busy
}

/// Present the backing canvas again, e.g. after the platform invalidated the window.
pub(crate) fn redraw(key: WindowKey) {
    let Some(cell) = get(key) else {
        return;
    };
    let Ok(mut window) = cell.try_borrow_mut() else {
        return;
    };
    let shared = Arc::clone(&window.shared);
    let canvas = shared.canvas.lock();
    window.screen.present(&canvas);
}

/// Remove the window: drop its screen and handlers, then unregister it.
/// Unregistering the last window may end the process.
pub(crate) fn detach(key: WindowKey) -> bool {
    let Some(window) = WINDOWS.with(|w| w.borrow_mut().remove(&key)) else {
        return false;
    };
    let (shared, lifecycle) = {
        let window = window.borrow();
        (Arc::clone(&window.shared), Arc::clone(&window.lifecycle))
    };
    shared.handlers.lock().clear();
    shared.advance(WindowPhase::Closed);
    drop(window);
    debug!(?key, "window closed");
    lifecycle.unregister_window();
    true
}

/// Translate raw input and notify subscribers. Handlers run with no registry
/// borrow held, so they may draw and present on this same thread.
pub(crate) fn deliver(key: WindowKey, input: RawInput) {
    if input == RawInput::CloseRequested {
        detach(key);
        return;
    }
    let Some(window) = get(key) else {
        return;
    };
    let (events, shared) = {
        let Ok(mut window) = window.try_borrow_mut() else {
            warn!(?key, "input during a marshaled action dropped");
            return;
        };
        let events = window.input.translate(input, Instant::now());
        (events, Arc::clone(&window.shared))
    };
    drop(window);

    for event in events {
        if let WindowEvent::KeyDown(k) = &event {
            if is_copy_chord(&k.key, k.modifiers) {
                let frame = shared.canvas.lock().clone();
                match with_screen(key, |screen| screen.copy_image(&frame)).and_then(|copied| copied) {
                    Ok(()) => debug!(?key, "canvas copied to clipboard"),
                    Err(e) => warn!(?key, error = %e, "copying canvas to clipboard failed"),
                }
            }
        }
        let handlers = shared.handlers.lock().matching(event.kind());
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                error!(?key, kind = ?event.kind(), "event handler panicked");
            }
        }
    }
}

/// Handle a non-`Open` message.
pub(crate) fn dispatch(message: UiMessage) {
    match message {
        UiMessage::Run { key, task } => {
            if let Err(e) = with_screen(key, task) {
                trace!(?key, error = %e, "task dropped");
            }
        }
        UiMessage::Input { key, input } => deliver(key, input),
        UiMessage::Close { key, done } => {
            detach(key);
            if let Some(done) = done {
                done.send(()).ok();
            }
        }
        UiMessage::Open(request) => {
            error!(key = ?request.key, "open request reached a window thread");
            request
                .reply
                .send(Err(WindowError::CreationFailed(
                    "runtime cannot open windows from here".into(),
                )))
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use tiny_skia::Pixmap;

    struct Recorder(Arc<Mutex<Vec<Pixmap>>>);

    impl Screen for Recorder {
        fn present(&mut self, frame: &Pixmap) {
            self.0.lock().push(frame.clone());
        }

        fn set_title(&mut self, _title: &str) {}

        fn position(&self) -> (i32, i32) {
            (0, 0)
        }
    }

    fn register(shown: &Arc<Mutex<Vec<Pixmap>>>) -> (WindowKey, Arc<WindowShared>) {
        let key = WindowKey::next();
        let shared = Arc::new(WindowShared::new(3, 2).unwrap());
        let (reply, answer) = mpsc::sync_channel(1);
        let request = OpenRequest {
            key,
            config: WindowConfig::default(),
            shared: Arc::clone(&shared),
            lifecycle: Arc::new(Lifecycle::with_last_closed(|| {})),
            reply,
        };
        let screen = Recorder(Arc::clone(shown));
        assert!(open(request, move |_| Ok(Box::new(screen) as Box<dyn Screen>)));
        assert!(answer.recv().unwrap().is_ok());
        (key, shared)
    }

    #[test]
    fn test_redraw_presents_backing_canvas() {
        let shown = Arc::new(Mutex::new(Vec::new()));
        let (key, shared) = register(&shown);
        shared.canvas.lock().fill(tiny_skia::Color::from_rgba8(1, 2, 3, 255));

        redraw(key);
        assert_eq!(shown.lock().len(), 1);
        assert_eq!(shown.lock()[0], *shared.canvas.lock());

        // Skipped while an action holds the screen.
        with_screen(key, |_| redraw(key)).unwrap();
        assert_eq!(shown.lock().len(), 1);

        assert!(detach(key));
        redraw(key);
        assert_eq!(shown.lock().len(), 1);
    }

    #[test]
    fn test_with_screen_gone_and_busy() {
        let shown = Arc::new(Mutex::new(Vec::new()));
        let (key, _) = register(&shown);

        assert!(!is_busy(key));
        let nested = with_screen(key, |_| (is_busy(key), with_screen(key, |_| ()))).unwrap();
        assert!(nested.0);
        assert!(matches!(nested.1, Err(WindowError::Reentrant)));

        detach(key);
        assert!(with_screen(key, |_| ()).unwrap_err().is_cancelled());
        assert!(!is_busy(key));
    }
}
