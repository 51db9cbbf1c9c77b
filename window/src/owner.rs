use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tiny_skia::Pixmap;
use tracing::{error, trace};

use crate::error::{Result, WindowError};
use crate::events::{EventKind, RawInput, WindowEvent};
use crate::handlers::HandlerId;
use crate::runtime::{Runtime, Screen, UiMessage, WindowKey, WindowPhase, WindowShared};
use crate::ui;

/// How often `wait_until_ready` checks for the native handle.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a window living on a UI thread.
///
/// Every native call goes through [`run_async`](Self::run_async) or
/// [`run_sync`](Self::run_sync), which execute immediately when already on the
/// window's UI thread and queue the work otherwise. Queued work runs in FIFO
/// order. When the window has gone away in the meantime the work is dropped
/// and the call reports [`WindowError::Cancelled`]. Nested blocking calls from
/// inside an action report [`WindowError::Reentrant`].
pub struct WindowOwner {
    key: WindowKey,
    runtime: Arc<dyn Runtime>,
    shared: Arc<WindowShared>,
    ui_thread: ThreadId,
    size: (u32, u32),
    title: Mutex<String>,
    ready_timeout: Option<Duration>,
}

impl std::fmt::Debug for WindowOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowOwner")
            .field("key", &self.key)
            .field("size", &self.size)
            .field("phase", &self.phase())
            .finish()
    }
}

impl WindowOwner {
    pub(crate) fn new(
        key: WindowKey,
        runtime: Arc<dyn Runtime>,
        shared: Arc<WindowShared>,
        ui_thread: ThreadId,
        size: (u32, u32),
        title: String,
        ready_timeout: Option<Duration>,
    ) -> Self {
        WindowOwner {
            key,
            runtime,
            shared,
            ui_thread,
            size,
            title: Mutex::new(title),
            ready_timeout,
        }
    }

    pub fn key(&self) -> WindowKey {
        self.key
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn phase(&self) -> WindowPhase {
        self.shared.phase()
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// Run `action` on the UI thread without waiting for it. Called from
    /// inside another action on the same window, it queues behind that action.
    pub fn run_async<F>(&self, action: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Screen) + Send + 'static,
    {
        if self.is_ui_thread() && !ui::is_busy(self.key) {
            return ui::with_screen(self.key, action);
        }
        let key = self.key;
        let task = Box::new(move |screen: &mut dyn Screen| {
            if catch_unwind(AssertUnwindSafe(|| action(screen))).is_err() {
                error!(?key, "marshaled action panicked");
            }
        });
        trace!(?key, "queue async action");
        self.runtime.post(UiMessage::Run { key, task })
    }

    /// Run `action` on the UI thread and wait for its result. A panic inside
    /// `action` resumes on the calling thread. Called from inside another
    /// action on the same window, it fails with [`WindowError::Reentrant`].
    pub fn run_sync<R, F>(&self, action: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn Screen) -> R + Send + 'static,
    {
        if self.is_ui_thread() {
            return ui::with_screen(self.key, action);
        }
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let task = Box::new(move |screen: &mut dyn Screen| {
            let out = catch_unwind(AssertUnwindSafe(|| action(screen)));
            done_tx.send(out).ok();
        });
        trace!(key = ?self.key, "queue sync action");
        self.runtime.post(UiMessage::Run { key: self.key, task })?;
        match done_rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(panic)) => resume_unwind(panic),
            // The task was dropped unrun: the window closed first.
            Err(_) => Err(WindowError::Cancelled),
        }
    }

    /// Copy `frame` into the backing canvas on the calling thread.
    pub fn stage(&self, frame: &Pixmap) {
        let mut canvas = self.shared.canvas.lock();
        if canvas.width() == frame.width() && canvas.height() == frame.height() {
            canvas.data_mut().copy_from_slice(frame.data());
        } else {
            canvas.fill(tiny_skia::Color::TRANSPARENT);
            canvas.draw_pixmap(
                0,
                0,
                frame.as_ref(),
                &tiny_skia::PixmapPaint::default(),
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }

    fn present_task(&self) -> impl FnOnce(&mut dyn Screen) + Send + 'static {
        let shared = Arc::clone(&self.shared);
        move |screen: &mut dyn Screen| {
            let canvas = shared.canvas.lock();
            screen.present(&canvas);
            drop(canvas);
            shared.advance(WindowPhase::Running);
        }
    }

    /// Copy the backing canvas onto the screen and wait until it is there.
    pub fn present(&self) -> Result<()> {
        self.run_sync(self.present_task())
    }

    /// Stage `frame` and present it synchronously.
    pub fn render(&self, frame: &Pixmap) -> Result<()> {
        self.stage(frame);
        self.present()
    }

    /// Stage `frame`, queue the present, sleep `wait`, then wait for the
    /// present to finish. Consecutive calls are spaced at least `wait` apart;
    /// a slow present stretches the interval.
    pub fn render_paced(&self, frame: &Pixmap, wait: Duration) -> Result<()> {
        self.stage(frame);
        self.present_paced(wait)
    }

    /// [`render_paced`](Self::render_paced) for an already staged canvas.
    pub fn present_paced(&self, wait: Duration) -> Result<()> {
        if self.is_ui_thread() && ui::is_busy(self.key) {
            return Err(WindowError::Reentrant);
        }
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let present = self.present_task();
        self.run_async(move |screen| {
            present(screen);
            done_tx.send(()).ok();
        })?;
        thread::sleep(wait);
        done_rx.recv().map_err(|_| WindowError::Cancelled)
    }

    /// Block until the UI thread created the native handle and processes
    /// marshaled calls.
    pub fn wait_until_ready(&self) -> Result<()> {
        let started = Instant::now();
        while !self.shared.handle_created() {
            if let Some(limit) = self.ready_timeout {
                if started.elapsed() > limit {
                    return Err(WindowError::CreationFailed(format!(
                        "window handle not created within {limit:?}"
                    )));
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
        self.run_sync(|_| ())?;
        self.shared.advance(WindowPhase::Ready);
        Ok(())
    }

    /// Close the window on its UI thread and release it. Closing an already
    /// closed window is fine. From inside an action the close is queued.
    pub fn close_and_release(&self) -> Result<()> {
        if self.is_ui_thread() {
            if !ui::is_busy(self.key) {
                ui::detach(self.key);
                return Ok(());
            }
            let message = UiMessage::Close {
                key: self.key,
                done: None,
            };
            return match self.runtime.post(message) {
                Err(WindowError::Cancelled) => Ok(()),
                other => other,
            };
        }
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let message = UiMessage::Close {
            key: self.key,
            done: Some(done_tx),
        };
        match self.runtime.post(message) {
            Ok(()) => {
                done_rx.recv().ok();
            }
            Err(WindowError::Cancelled) => {}
            Err(e) => return Err(e),
        }
        self.shared.advance(WindowPhase::Closed);
        Ok(())
    }

    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        *self.title.lock() = title.to_owned();
        let title = title.to_owned();
        self.run_async(move |screen| screen.set_title(&title))
    }

    /// Outer position of the window on the desktop.
    pub fn position(&self) -> Result<(i32, i32)> {
        self.run_sync(|screen| screen.position())
    }

    /// Copy of the backing canvas, i.e. what Ctrl+C would put on the clipboard.
    pub fn canvas_snapshot(&self) -> Pixmap {
        self.shared.canvas.lock().clone()
    }

    /// What the screen shows, when the runtime can read it back.
    pub fn read_back(&self) -> Result<Option<Pixmap>> {
        self.run_sync(|screen| screen.read_back())
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&WindowEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.shared.handlers.lock().add(kind, Arc::new(handler))
    }

    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.shared.handlers.lock().remove(id)
    }

    /// Feed `input` through the UI thread as if the platform had delivered it.
    pub fn post_input(&self, input: RawInput) -> Result<()> {
        if self.is_ui_thread() {
            ui::deliver(self.key, input);
            return Ok(());
        }
        self.runtime.post(UiMessage::Input {
            key: self.key,
            input,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{open_window, HeadlessRuntime, Key, Lifecycle, Modifiers, MouseButton, WindowConfig};
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording_lifecycle() -> (Arc<Lifecycle>, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let lc = Lifecycle::with_last_closed(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        (Arc::new(lc), fired)
    }

    fn open(lifecycle: &Arc<Lifecycle>, width: u32, height: u32) -> WindowOwner {
        let config = WindowConfig {
            width,
            height,
            ..WindowConfig::default()
        };
        open_window(Arc::new(HeadlessRuntime::new()), Arc::clone(lifecycle), config).unwrap()
    }

    fn solid(width: u32, height: u32, color: tiny_skia::Color) -> Pixmap {
        let mut pm = Pixmap::new(width, height).unwrap();
        pm.fill(color);
        pm
    }

    #[test]
    fn test_snapshot_equals_presented_frame() {
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 32, 24);
        assert_eq!(owner.phase(), WindowPhase::Ready);

        let frame = solid(32, 24, tiny_skia::Color::from_rgba8(200, 10, 10, 255));
        owner.render(&frame).unwrap();
        assert_eq!(owner.phase(), WindowPhase::Running);

        let shown = owner.read_back().unwrap().unwrap();
        assert_eq!(owner.canvas_snapshot(), shown);
        assert_eq!(shown, frame);
    }

    #[test]
    fn test_stage_without_present_keeps_screen() {
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 8, 8);
        owner.stage(&solid(8, 8, tiny_skia::Color::WHITE));
        assert!(owner.read_back().unwrap().is_none());
        owner.present().unwrap();
        assert!(owner.read_back().unwrap().is_some());
    }

    #[test]
    fn test_render_paced_minimum_spacing() {
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 16, 16);
        let frame = solid(16, 16, tiny_skia::Color::BLACK);
        let wait = Duration::from_millis(20);

        let started = Instant::now();
        for _ in 0..3 {
            owner.render_paced(&frame, wait).unwrap();
        }
        assert!(started.elapsed() >= wait * 3);
    }

    #[test]
    fn test_lifecycle_one_window() {
        let (lc, fired) = recording_lifecycle();
        let owner = open(&lc, 10, 10);
        assert_eq!(lc.open_windows(), 1);
        owner.close_and_release().unwrap();
        assert_eq!(owner.phase(), WindowPhase::Closed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(lc.is_empty());
    }

    #[test]
    fn test_lifecycle_two_windows() {
        let (lc, fired) = recording_lifecycle();
        let first = open(&lc, 10, 10);
        let second = open(&lc, 10, 10);
        assert_eq!(lc.open_windows(), 2);

        first.close_and_release().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        second.present().unwrap();

        second.close_and_release().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_after_close() {
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 10, 10);
        owner.close_and_release().unwrap();

        let err = owner.run_sync(|_| 1).unwrap_err();
        assert!(err.is_cancelled());
        assert!(owner.present().unwrap_err().is_cancelled());
        // Closing again is fine.
        owner.close_and_release().unwrap();
    }

    #[test]
    fn test_invalid_size_fails_without_registering() {
        let (lc, fired) = recording_lifecycle();
        let config = WindowConfig {
            width: 0,
            height: 10,
            ..WindowConfig::default()
        };
        let err = open_window(Arc::new(HeadlessRuntime::new()), Arc::clone(&lc), config).unwrap_err();
        assert!(matches!(err, WindowError::CreationFailed(_)));
        assert!(lc.is_empty());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_run_sync_is_serialized() {
        thread_local! {
            static COUNTER: Cell<u32> = const { Cell::new(0) };
        }
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 4, 4);

        let mut seen: Vec<u32> = thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        (0..50)
                            .map(|_| {
                                owner
                                    .run_sync(|_| {
                                        COUNTER.with(|c| {
                                            c.set(c.get() + 1);
                                            c.get()
                                        })
                                    })
                                    .unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
        });

        seen.sort_unstable();
        assert_eq!(seen, (1..=400).collect::<Vec<_>>());
    }

    #[test]
    fn test_panic_in_run_sync_reaches_caller() {
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 4, 4);
        let out = catch_unwind(AssertUnwindSafe(|| owner.run_sync(|_| -> u32 { panic!("boom") })));
        assert!(out.is_err());
        // The UI thread survives.
        assert_eq!(owner.run_sync(|_| 7).unwrap(), 7);
    }

    #[test]
    fn test_handler_can_present_from_ui_thread() {
        let (lc, _) = recording_lifecycle();
        let owner = Arc::new(open(&lc, 6, 6));
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);

        let o = Arc::clone(&owner);
        owner.subscribe(EventKind::MouseClick, move |event| {
            let frame = solid(6, 6, tiny_skia::Color::from_rgba8(0, 0, 255, 255));
            let result = o.render(&frame).map(|()| o.is_ui_thread());
            tx.lock().send((event.clone(), result.is_ok(), result.unwrap_or(false))).ok();
        });

        owner.post_input(RawInput::CursorMoved { x: 2.0, y: 3.0 }).unwrap();
        for pressed in [true, false] {
            owner
                .post_input(RawInput::Button {
                    button: MouseButton::Left,
                    pressed,
                })
                .unwrap();
        }

        let (event, ok, on_ui) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, WindowEvent::MouseClick(m) if (m.x, m.y) == (2, 3)));
        assert!(ok && on_ui);
        let shown = owner.read_back().unwrap().unwrap();
        assert_eq!(shown.pixel(0, 0).unwrap().blue(), 255);
        owner.close_and_release().unwrap();
    }

    #[test]
    fn test_close_request_input_closes() {
        let (lc, fired) = recording_lifecycle();
        let owner = open(&lc, 4, 4);

        owner.post_input(RawInput::CloseRequested).unwrap();
        lc.wait_until_empty();
        assert_eq!(owner.phase(), WindowPhase::Closed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_title_and_position() {
        let (lc, _) = recording_lifecycle();
        let owner = open(&lc, 4, 4);
        assert_eq!(owner.title(), "LiteDraw");
        owner.set_title("sketch").unwrap();
        assert_eq!(owner.title(), "sketch");
        assert_eq!(owner.position().unwrap(), (0, 0));
    }

    #[test]
    fn test_nested_run_sync_is_reentrant_not_cancelled() {
        let (lc, _) = recording_lifecycle();
        let owner = Arc::new(open(&lc, 4, 4));

        let o = Arc::clone(&owner);
        let nested = owner.run_sync(move |_| o.run_sync(|_| 5)).unwrap();
        assert!(matches!(nested, Err(WindowError::Reentrant)));
        assert!(!nested.unwrap_err().is_cancelled());
        assert_eq!(owner.phase(), WindowPhase::Ready);
        assert_eq!(owner.run_sync(|_| 5).unwrap(), 5);
    }

    #[test]
    fn test_nested_run_async_queues_behind_action() {
        let (lc, _) = recording_lifecycle();
        let owner = Arc::new(open(&lc, 4, 4));
        let (tx, rx) = mpsc::channel();

        let o = Arc::clone(&owner);
        let outer_tx = tx.clone();
        let queued = owner
            .run_sync(move |_| {
                let queued = o.run_async(move |_| {
                    tx.send("inner").ok();
                });
                outer_tx.send("outer").ok();
                queued
            })
            .unwrap();
        assert!(queued.is_ok());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "outer");
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "inner");
    }

    #[test]
    fn test_close_from_inside_action_is_queued() {
        let (lc, fired) = recording_lifecycle();
        let owner = Arc::new(open(&lc, 4, 4));

        let o = Arc::clone(&owner);
        owner.run_sync(move |_| o.close_and_release()).unwrap().unwrap();
        lc.wait_until_empty();
        assert_eq!(owner.phase(), WindowPhase::Closed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ctrl_c_copies_backing_canvas() {
        let (lc, _) = recording_lifecycle();
        let runtime = HeadlessRuntime::new();
        let config = WindowConfig {
            width: 5,
            height: 3,
            ..WindowConfig::default()
        };
        let owner = open_window(Arc::new(runtime.clone()), Arc::clone(&lc), config).unwrap();
        owner.stage(&solid(5, 3, tiny_skia::Color::from_rgba8(10, 200, 30, 255)));

        let c_down = || RawInput::Key {
            key: Key::Character("c".into()),
            pressed: true,
            repeat: false,
            text: Some("c".into()),
        };
        owner.post_input(c_down()).unwrap();
        owner.run_sync(|_| ()).unwrap();
        assert!(runtime.copied_frames().is_empty());

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        owner.post_input(RawInput::Modifiers(ctrl)).unwrap();
        owner.post_input(c_down()).unwrap();
        owner.run_sync(|_| ()).unwrap();

        let copied = runtime.copied_frames();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0], owner.canvas_snapshot());
        owner.close_and_release().unwrap();
    }
}
