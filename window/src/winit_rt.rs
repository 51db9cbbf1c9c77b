//! winit + softbuffer runtime.
//!
//! winit does not allow creating an EventLoop twice in the same process, so one
//! global EventLoop lives on a background thread and hosts every window.
//! Marshaled work reaches it as user events through an `EventLoopProxy`.
//!
//! macOS requires the EventLoop on the main thread and is not supported here.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::mpsc;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use softbuffer::{Context, Surface};
use tiny_skia::Pixmap;
use tracing::{debug, error, warn};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget},
    window::{Window, WindowBuilder, WindowButtons, WindowId},
};

use crate::bootstrap::WindowConfig;
use crate::error::{Result, WindowError};
use crate::events::RawInput;
use crate::runtime::{Runtime, Screen, UiMessage, WindowKey};
use crate::ui;

/// Pixels of a precise-scroll delta counted as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 40.0;

static GLOBAL: OnceCell<Arc<WinitRuntime>> = OnceCell::new();

/// Hosts windows on the process-wide winit event loop.
pub struct WinitRuntime {
    proxy: Mutex<EventLoopProxy<UiMessage>>,
}

impl WinitRuntime {
    /// The process-wide runtime, starting the event loop thread on first use.
    pub fn global() -> Result<Arc<WinitRuntime>> {
        GLOBAL.get_or_try_init(start_event_loop).cloned()
    }
}

impl Runtime for WinitRuntime {
    fn post(&self, message: UiMessage) -> Result<()> {
        self.proxy
            .lock()
            .send_event(message)
            .map_err(|_| WindowError::Cancelled)
    }
}

struct WinitScreen {
    window: Arc<Window>,
    surface: Surface<Arc<Window>, Arc<Window>>,
    size: (u32, u32),
}

fn non_zero(v: u32) -> Result<NonZeroU32> {
    NonZeroU32::new(v).ok_or_else(|| WindowError::CreationFailed(format!("zero extent {v}")))
}

impl WinitScreen {
    fn create(elwt: &EventLoopWindowTarget<UiMessage>, config: &WindowConfig) -> Result<Self> {
        let window = Arc::new(
            WindowBuilder::new()
                .with_inner_size(PhysicalSize::new(config.width, config.height))
                .with_title(&config.title)
                .with_resizable(false)
                .with_enabled_buttons(WindowButtons::CLOSE | WindowButtons::MINIMIZE)
                .build(elwt)
                .map_err(|e| WindowError::CreationFailed(e.to_string()))?,
        );
        let ctx = Context::new(Arc::clone(&window))
            .map_err(|e| WindowError::CreationFailed(e.to_string()))?;
        let mut surface = Surface::new(&ctx, Arc::clone(&window))
            .map_err(|e| WindowError::CreationFailed(e.to_string()))?;
        surface
            .resize(non_zero(config.width)?, non_zero(config.height)?)
            .map_err(|e| WindowError::CreationFailed(e.to_string()))?;

        Ok(WinitScreen {
            window,
            surface,
            size: (config.width, config.height),
        })
    }

    fn try_present(&mut self, frame: &Pixmap) -> std::result::Result<(), softbuffer::SoftBufferError> {
        let size = (frame.width(), frame.height());
        if size != self.size {
            if let (Some(w), Some(h)) = (NonZeroU32::new(size.0), NonZeroU32::new(size.1)) {
                self.surface.resize(w, h)?;
                self.size = size;
            }
        }
        let mut buf = self.surface.buffer_mut()?;
        // premultiplied RGBA -> 0x00RRGGBB, i.e. composited over black
        for (dst, px) in buf.iter_mut().zip(frame.pixels()) {
            let (r, g, b) = (px.red() as u32, px.green() as u32, px.blue() as u32);
            *dst = (r << 16) | (g << 8) | b;
        }
        buf.present()
    }
}

impl Screen for WinitScreen {
    fn present(&mut self, frame: &Pixmap) {
        if let Err(e) = self.try_present(frame) {
            warn!(error = %e, "present failed");
        }
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn position(&self) -> (i32, i32) {
        self.window
            .outer_position()
            .map(|p| (p.x, p.y))
            .unwrap_or((0, 0))
    }
}

fn translate(event: WindowEvent) -> Option<RawInput> {
    let input = match event {
        WindowEvent::CloseRequested => RawInput::CloseRequested,
        WindowEvent::CursorMoved { position, .. } => RawInput::CursorMoved {
            x: position.x,
            y: position.y,
        },
        WindowEvent::CursorLeft { .. } => RawInput::CursorLeft,
        WindowEvent::MouseInput { state, button, .. } => RawInput::Button {
            button,
            pressed: state == ElementState::Pressed,
        },
        WindowEvent::MouseWheel { delta, .. } => RawInput::Wheel {
            notches: match delta {
                MouseScrollDelta::LineDelta(_, y) => y as f64,
                MouseScrollDelta::PixelDelta(p) => p.y / PIXELS_PER_NOTCH,
            },
        },
        WindowEvent::KeyboardInput { event, .. } => RawInput::Key {
            key: event.logical_key,
            pressed: event.state == ElementState::Pressed,
            repeat: event.repeat,
            text: event.text.map(|t| t.to_string()),
        },
        WindowEvent::ModifiersChanged(m) => RawInput::Modifiers(m.state().into()),
        WindowEvent::Moved(p) => RawInput::Moved { x: p.x, y: p.y },
        _ => return None,
    };
    Some(input)
}

// ── Event loop thread body ─────────────────────────────────────────────────────
fn event_loop_thread(proxy_tx: mpsc::SyncSender<Result<EventLoopProxy<UiMessage>>>) {
    let mut el_builder = EventLoopBuilder::<UiMessage>::with_user_event();

    #[cfg(target_os = "linux")]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtWayland::with_any_thread(&mut el_builder, true);
        EventLoopBuilderExtX11::with_any_thread(&mut el_builder, true);
    }
    #[cfg(target_os = "windows")]
    {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        EventLoopBuilderExtWindows::with_any_thread(&mut el_builder, true);
    }

    let event_loop = match el_builder.build() {
        Ok(el) => el,
        Err(e) => {
            proxy_tx.send(Err(WindowError::EventLoop(e.to_string()))).ok();
            return;
        }
    };
    proxy_tx.send(Ok(event_loop.create_proxy())).ok();
    debug!("event loop started");

    let mut ids: HashMap<WindowId, WindowKey> = HashMap::new();

    let run = event_loop.run(move |event, elwt: &EventLoopWindowTarget<UiMessage>| {
        elwt.set_control_flow(ControlFlow::Wait);

        match event {
            Event::UserEvent(UiMessage::Open(request)) => {
                let key = request.key;
                let mut created = None;
                ui::open(request, |config| {
                    let screen = WinitScreen::create(elwt, config)?;
                    created = Some(screen.window.id());
                    Ok(Box::new(screen) as Box<dyn Screen>)
                });
                if let Some(id) = created {
                    ids.insert(id, key);
                }
            }
            Event::UserEvent(message) => ui::dispatch(message),

            Event::WindowEvent { window_id, event } => {
                let Some(&key) = ids.get(&window_id) else {
                    return;
                };
                if matches!(event, WindowEvent::RedrawRequested) {
                    ui::redraw(key);
                } else if let Some(input) = translate(event) {
                    ui::deliver(key, input);
                }
            }
            _ => {}
        }

        ids.retain(|_, key| ui::contains(*key));
    });

    if let Err(e) = run {
        error!(error = %e, "event loop exited");
    }
}

fn start_event_loop() -> Result<Arc<WinitRuntime>> {
    let (proxy_tx, proxy_rx) = mpsc::sync_channel(1);
    std::thread::Builder::new()
        .name("litedraw-event-loop".into())
        .spawn(move || event_loop_thread(proxy_tx))
        .map_err(|e| WindowError::EventLoop(e.to_string()))?;
    let proxy = proxy_rx
        .recv()
        .map_err(|_| WindowError::EventLoop("event loop thread failed to start".into()))??;
    Ok(Arc::new(WinitRuntime {
        proxy: Mutex::new(proxy),
    }))
}
