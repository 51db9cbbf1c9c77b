use std::sync::Arc;
use std::time::Duration;

use litedraw_canvas::{centered_rect, Buffer, CanvasError, Color, Font, Image, Pen, Surface, TextFormat};
use litedraw_window::{
    open_window, EventKind, HandlerId, KeyEvent, KeyPressEvent, Lifecycle, MouseEvent, MoveEvent,
    RawInput, Runtime, WindowConfig, WindowEvent, WindowOwner, WinitRuntime,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tiny_skia::Transform;
use tracing::{debug, warn};

use crate::angle::Angle;
use crate::error::Result;

/// Lifecycle shared by every window built without an explicit one.
static DEFAULT_LIFECYCLE: Lazy<Arc<Lifecycle>> = Lazy::new(|| Arc::new(Lifecycle::new()));

pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Pen and brush settings applied to every draw call. Last write wins.
#[derive(Debug, Clone)]
pub struct DrawingState {
    pub color: Color,
    pub pen_size: f32,
    pub font: Option<Font>,
}

impl DrawingState {
    fn pen(&self) -> Pen {
        Pen::new(self.color, self.pen_size)
    }
}

impl Default for DrawingState {
    fn default() -> Self {
        DrawingState {
            color: Color::BLACK,
            pen_size: 1.0,
            font: None,
        }
    }
}

struct Inner {
    owner: WindowOwner,
    buffer: Mutex<Buffer>,
    state: Mutex<DrawingState>,
    clear_color: Color,
}

/// A window you draw on.
///
/// Drawing calls go to an off-screen buffer; nothing is visible until
/// [`show`](Self::show). Cloning gives another handle to the same window,
/// which is also what event callbacks receive.
#[derive(Clone)]
pub struct LiteDraw {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LiteDraw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteDraw")
            .field("owner", &self.inner.owner)
            .field("state", &*self.inner.state.lock())
            .finish()
    }
}

/// Settings for a new [`LiteDraw`] window.
pub struct Builder {
    width: u32,
    height: u32,
    title: String,
    clear_color: Color,
    font_size: f32,
    antialias: bool,
    runtime: Option<Arc<dyn Runtime>>,
    lifecycle: Option<Arc<Lifecycle>>,
}

impl Default for Builder {
    fn default() -> Self {
        let window = WindowConfig::default();
        Builder {
            width: window.width,
            height: window.height,
            title: window.title,
            clear_color: Color::WHITE,
            font_size: DEFAULT_FONT_SIZE,
            antialias: true,
            runtime: None,
            lifecycle: None,
        }
    }
}

impl Builder {
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Color [`LiteDraw::reset`] fills with. White by default.
    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Pixel size of the default system font.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn antialias(mut self, enabled: bool) -> Self {
        self.antialias = enabled;
        self
    }

    /// Host the window on `runtime` instead of the global winit event loop.
    pub fn runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Count the window in `lifecycle` instead of the process default.
    pub fn lifecycle(mut self, lifecycle: Arc<Lifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Open the window, clear it and show it once.
    pub fn build(self) -> Result<LiteDraw> {
        let mut buffer = Buffer::new(self.width, self.height)?;
        buffer.set_antialias(self.antialias);

        let font = match Font::system_sans(self.font_size) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!(error = %e, "no default font, text drawing disabled until set_font");
                None
            }
        };

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => WinitRuntime::global()? as Arc<dyn Runtime>,
        };
        let lifecycle = self
            .lifecycle
            .unwrap_or_else(|| Arc::clone(&DEFAULT_LIFECYCLE));
        let config = WindowConfig {
            width: self.width,
            height: self.height,
            title: self.title,
            ..WindowConfig::default()
        };
        let owner = open_window(runtime, lifecycle, config)?;
        debug!(key = ?owner.key(), "drawing window ready");

        let draw = LiteDraw {
            inner: Arc::new(Inner {
                owner,
                buffer: Mutex::new(buffer),
                state: Mutex::new(DrawingState {
                    font,
                    ..DrawingState::default()
                }),
                clear_color: self.clear_color,
            }),
        };
        draw.reset();
        draw.show()?;
        Ok(draw)
    }
}

impl LiteDraw {
    /// A 600×600 window.
    pub fn new() -> Result<Self> {
        Builder::default().build()
    }

    pub fn with_size(width: u32, height: u32) -> Result<Self> {
        Builder::default().size(width, height).build()
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    fn with_surface<R>(&self, f: impl FnOnce(&mut Surface<'_>, &DrawingState) -> R) -> R {
        let state = self.inner.state.lock().clone();
        let mut buffer = self.inner.buffer.lock();
        let mut surface = buffer.surface();
        f(&mut surface, &state)
    }

    // Lines and curves

    pub fn draw_line(&self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.with_surface(|s, st| s.stroke_line(st.pen(), (x1, y1), (x2, y2)));
    }

    /// Cubic Bezier from `p1` to `p4` with control points `p2` and `p3`.
    pub fn draw_bezier(&self, p1: (i32, i32), p2: (i32, i32), p3: (i32, i32), p4: (i32, i32)) {
        let pt = |p: (i32, i32)| (p.0 as f32, p.1 as f32);
        self.with_surface(|s, st| s.stroke_bezier(st.pen(), [pt(p1), pt(p2), pt(p3), pt(p4)]));
    }

    // Text

    /// Text with its top-left corner at `(x, y)`.
    pub fn draw_text(&self, x: i32, y: i32, text: &str) -> Result<()> {
        self.draw_text_formatted(x, y, text, TextFormat::default())
    }

    /// Text laid out around `(x, y)` according to `format`.
    pub fn draw_text_formatted(&self, x: i32, y: i32, text: &str, format: TextFormat) -> Result<()> {
        self.with_surface(|s, st| -> Result<()> {
            let font = st.font.as_ref().ok_or(CanvasError::NoFont)?;
            s.draw_text(font, st.color, x, y, text, format);
            Ok(())
        })
    }

    // Rectangles

    pub fn draw_point(&self, x: i32, y: i32) {
        self.draw_rectangle(x, y, 1, 1);
    }

    pub fn draw_square(&self, x: i32, y: i32, size: i32) {
        self.draw_rectangle(x, y, size, size);
    }

    pub fn filled_square(&self, x: i32, y: i32, size: i32) {
        self.filled_rectangle(x, y, size, size);
    }

    pub fn draw_rectangle(&self, x: i32, y: i32, width: i32, height: i32) {
        self.with_surface(|s, st| s.stroke_rect(st.pen(), x, y, width, height));
    }

    pub fn filled_rectangle(&self, x: i32, y: i32, width: i32, height: i32) {
        self.with_surface(|s, st| s.fill_rect(st.color, x, y, width, height));
    }

    // Ellipses and arcs, all centred on (x, y)

    pub fn draw_circle(&self, x: i32, y: i32, radius: i32) {
        self.draw_ellipse(x, y, radius, radius);
    }

    pub fn filled_circle(&self, x: i32, y: i32, radius: i32) {
        self.filled_ellipse(x, y, radius, radius);
    }

    pub fn draw_ellipse(&self, x: i32, y: i32, h_radius: i32, v_radius: i32) {
        let (rx, ry, w, h) = centered_rect(x, y, h_radius, v_radius);
        self.with_surface(|s, st| s.stroke_ellipse(st.pen(), rx, ry, w, h));
    }

    pub fn filled_ellipse(&self, x: i32, y: i32, h_radius: i32, v_radius: i32) {
        let (rx, ry, w, h) = centered_rect(x, y, h_radius, v_radius);
        self.with_surface(|s, st| s.fill_ellipse(st.color, rx, ry, w, h));
    }

    /// Arc of the ellipse centred on `(x, y)`. Angles are `i32` degrees or
    /// `f64` radians, clockwise from 3 o'clock.
    pub fn draw_arc(
        &self,
        x: i32,
        y: i32,
        h_radius: i32,
        v_radius: i32,
        start: impl Into<Angle>,
        sweep: impl Into<Angle>,
    ) {
        let (rx, ry, w, h) = centered_rect(x, y, h_radius, v_radius);
        let (start, sweep) = (start.into().degrees(), sweep.into().degrees());
        self.with_surface(|s, st| s.stroke_arc(st.pen(), rx, ry, w, h, start, sweep));
    }

    /// Pie slice; see [`draw_arc`](Self::draw_arc) for the angles.
    pub fn filled_arc(
        &self,
        x: i32,
        y: i32,
        h_radius: i32,
        v_radius: i32,
        start: impl Into<Angle>,
        sweep: impl Into<Angle>,
    ) {
        let (rx, ry, w, h) = centered_rect(x, y, h_radius, v_radius);
        let (start, sweep) = (start.into().degrees(), sweep.into().degrees());
        self.with_surface(|s, st| s.fill_pie(st.color, rx, ry, w, h, start, sweep));
    }

    // Polygons

    /// Closed outline through `points`. Fewer than two points draw nothing.
    pub fn draw_polygon(&self, points: &[(i32, i32)]) {
        self.with_surface(|s, st| s.stroke_polygon(st.pen(), points));
    }

    pub fn filled_polygon(&self, points: &[(i32, i32)]) {
        self.with_surface(|s, st| s.fill_polygon(st.color, points));
    }

    // Images

    pub fn draw_image(&self, x: i32, y: i32, image: &Image) {
        self.with_surface(|s, _| s.draw_image(x, y, image));
    }

    pub fn draw_image_scaled(&self, x: i32, y: i32, width: i32, height: i32, image: &Image) {
        self.with_surface(|s, _| s.draw_image_scaled(x, y, width, height, image));
    }

    // Transform

    /// Apply `ts` to everything drawn from now on, on top of the current transform.
    pub fn transform(&self, ts: Transform) {
        self.inner.buffer.lock().concat_transform(ts);
    }

    pub fn reset_transform(&self) {
        self.inner.buffer.lock().reset_transform();
    }

    // Buffer

    /// Fill the whole buffer with the clear color. The current drawing
    /// color and transform are left alone.
    pub fn reset(&self) {
        self.reset_with(self.inner.clear_color);
    }

    pub fn reset_with(&self, color: Color) {
        self.with_surface(|s, _| s.clear(color));
    }

    /// Snapshot of the buffer, unaffected by later drawing.
    pub fn as_image(&self) -> Image {
        self.inner.buffer.lock().snapshot()
    }

    fn stage(&self) {
        let buffer = self.inner.buffer.lock();
        self.inner.owner.stage(buffer.pixmap());
    }

    /// Copy the buffer to the window and wait until it is on screen.
    pub fn show(&self) -> Result<()> {
        self.stage();
        self.inner.owner.present()?;
        Ok(())
    }

    /// Like [`show`](Self::show), but returns no sooner than `wait` from now.
    /// Handy as a frame limiter in animation loops.
    pub fn show_for(&self, wait: Duration) -> Result<()> {
        self.stage();
        self.inner.owner.present_paced(wait)?;
        Ok(())
    }

    /// Close the window. Closing an already closed window is fine.
    pub fn close(&self) -> Result<()> {
        self.inner.owner.close_and_release()?;
        Ok(())
    }

    // State

    pub fn width(&self) -> u32 {
        self.inner.owner.size().0
    }

    pub fn height(&self) -> u32 {
        self.inner.owner.size().1
    }

    pub fn color(&self) -> Color {
        self.inner.state.lock().color
    }

    pub fn set_color(&self, color: Color) {
        self.inner.state.lock().color = color;
    }

    pub fn pen_size(&self) -> f32 {
        self.inner.state.lock().pen_size
    }

    pub fn set_pen_size(&self, size: f32) {
        self.inner.state.lock().pen_size = size;
    }

    pub fn font(&self) -> Option<Font> {
        self.inner.state.lock().font.clone()
    }

    pub fn set_font(&self, font: Font) {
        self.inner.state.lock().font = Some(font);
    }

    pub fn antialias(&self) -> bool {
        self.inner.buffer.lock().antialias()
    }

    pub fn set_antialias(&self, enabled: bool) {
        self.inner.buffer.lock().set_antialias(enabled);
    }

    pub fn title(&self) -> String {
        self.inner.owner.title()
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        self.inner.owner.set_title(title)?;
        Ok(())
    }

    /// Outer position of the window on the desktop.
    pub fn desktop_position(&self) -> Result<(i32, i32)> {
        Ok(self.inner.owner.position()?)
    }

    /// Feed input through the window as if the user produced it.
    pub fn post_input(&self, input: RawInput) -> Result<()> {
        self.inner.owner.post_input(input)?;
        Ok(())
    }

    // Events

    fn on<F>(&self, kind: EventKind, f: F) -> HandlerId
    where
        F: Fn(&LiteDraw, &WindowEvent) + Send + Sync + 'static,
    {
        let this = self.clone();
        self.inner.owner.subscribe(kind, move |event| f(&this, event))
    }

    fn on_mouse<F>(&self, kind: EventKind, f: F) -> HandlerId
    where
        F: Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static,
    {
        self.on(kind, move |draw, event| match event {
            WindowEvent::MouseClick(m)
            | WindowEvent::MouseDoubleClick(m)
            | WindowEvent::MouseDown(m)
            | WindowEvent::MouseUp(m)
            | WindowEvent::MouseMove(m)
            | WindowEvent::MouseWheel(m) => f(draw, m),
            _ => {}
        })
    }

    pub fn on_mouse_click(&self, f: impl Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static) -> HandlerId {
        self.on_mouse(EventKind::MouseClick, f)
    }

    pub fn on_mouse_double_click(
        &self,
        f: impl Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.on_mouse(EventKind::MouseDoubleClick, f)
    }

    pub fn on_mouse_down(&self, f: impl Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static) -> HandlerId {
        self.on_mouse(EventKind::MouseDown, f)
    }

    pub fn on_mouse_up(&self, f: impl Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static) -> HandlerId {
        self.on_mouse(EventKind::MouseUp, f)
    }

    pub fn on_mouse_move(&self, f: impl Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static) -> HandlerId {
        self.on_mouse(EventKind::MouseMove, f)
    }

    pub fn on_mouse_wheel(&self, f: impl Fn(&LiteDraw, &MouseEvent) + Send + Sync + 'static) -> HandlerId {
        self.on_mouse(EventKind::MouseWheel, f)
    }

    pub fn on_mouse_leave(&self, f: impl Fn(&LiteDraw) + Send + Sync + 'static) -> HandlerId {
        self.on(EventKind::MouseLeave, move |draw, _| f(draw))
    }

    pub fn on_key_down(&self, f: impl Fn(&LiteDraw, &KeyEvent) + Send + Sync + 'static) -> HandlerId {
        self.on(EventKind::KeyDown, move |draw, event| {
            if let WindowEvent::KeyDown(k) = event {
                f(draw, k);
            }
        })
    }

    pub fn on_key_up(&self, f: impl Fn(&LiteDraw, &KeyEvent) + Send + Sync + 'static) -> HandlerId {
        self.on(EventKind::KeyUp, move |draw, event| {
            if let WindowEvent::KeyUp(k) = event {
                f(draw, k);
            }
        })
    }

    pub fn on_key_press(&self, f: impl Fn(&LiteDraw, &KeyPressEvent) + Send + Sync + 'static) -> HandlerId {
        self.on(EventKind::KeyPress, move |draw, event| {
            if let WindowEvent::KeyPress(k) = event {
                f(draw, k);
            }
        })
    }

    pub fn on_window_move(&self, f: impl Fn(&LiteDraw, &MoveEvent) + Send + Sync + 'static) -> HandlerId {
        self.on(EventKind::WindowMove, move |draw, event| {
            if let WindowEvent::WindowMove(m) = event {
                f(draw, m);
            }
        })
    }

    pub fn remove_handler(&self, id: HandlerId) -> bool {
        self.inner.owner.unsubscribe(id)
    }
}

/// Block until every window opened with the default lifecycle has closed.
///
/// Closing the last such window ends the process, so in practice this only
/// returns when no window was opened at all.
pub fn run() {
    DEFAULT_LIFECYCLE.wait_until_empty();
}

#[cfg(test)]
mod tests {
    use super::*;
    use litedraw_window::{HeadlessRuntime, MouseButton};
    use std::f64::consts::FRAC_PI_2;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Instant;

    fn headless(width: u32, height: u32) -> (LiteDraw, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let lifecycle = Lifecycle::with_last_closed(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let draw = LiteDraw::builder()
            .size(width, height)
            .runtime(Arc::new(HeadlessRuntime::new()))
            .lifecycle(Arc::new(lifecycle))
            .build()
            .unwrap();
        (draw, fired)
    }

    #[test]
    fn test_new_window_is_cleared_and_shown() {
        let (draw, _) = headless(20, 10);
        assert_eq!((draw.width(), draw.height()), (20, 10));
        let img = draw.as_image();
        assert!(img.is_uniform());
        assert_eq!(img.pixel(0, 0), Some(Color::WHITE));
        let shown = draw.inner.owner.read_back().unwrap().unwrap();
        assert_eq!(&shown, img.pixmap());
    }

    #[test]
    fn test_reset_is_uniform_and_keeps_color() {
        let (draw, _) = headless(40, 40);
        draw.set_color(Color::RED);
        draw.set_pen_size(3.0);
        draw.filled_rectangle(5, 5, 10, 10);
        draw.draw_line(0, 0, 39, 39);
        draw.transform(Transform::from_scale(0.5, 0.5));
        assert!(!draw.as_image().is_uniform());

        draw.reset();
        let img = draw.as_image();
        assert!(img.is_uniform());
        assert_eq!(img.pixel(20, 20), Some(Color::WHITE));
        assert_eq!(draw.color(), Color::RED);
        assert_eq!(draw.pen_size(), 3.0);

        draw.reset_with(Color::BLUE);
        assert_eq!(draw.as_image().pixel(39, 0), Some(Color::BLUE));
        assert_eq!(draw.color(), Color::RED);
    }

    #[test]
    fn test_circle_matches_ellipse() {
        let (draw, _) = headless(64, 64);
        draw.set_pen_size(2.0);
        draw.draw_circle(32, 30, 17);
        let circle = draw.as_image();
        assert!(!circle.is_uniform());

        draw.reset();
        draw.draw_ellipse(32, 30, 17, 17);
        assert_eq!(draw.as_image(), circle);

        draw.reset();
        draw.filled_circle(32, 30, 9);
        let filled = draw.as_image();
        draw.reset();
        draw.filled_ellipse(32, 30, 9, 9);
        assert_eq!(draw.as_image(), filled);
    }

    #[test]
    fn test_radian_arc_matches_degree_arc() {
        let (draw, _) = headless(80, 80);
        draw.draw_arc(40, 40, 30, 20, 0, 90);
        let degrees = draw.as_image();
        assert!(!degrees.is_uniform());

        draw.reset();
        draw.draw_arc(40, 40, 30, 20, 0.0, FRAC_PI_2);
        assert_eq!(draw.as_image(), degrees);

        draw.reset();
        draw.filled_arc(40, 40, 30, 20, 45, 90);
        let pie = draw.as_image();
        draw.reset();
        draw.filled_arc(40, 40, 30, 20, std::f64::consts::FRAC_PI_4, FRAC_PI_2);
        assert_eq!(draw.as_image(), pie);
    }

    #[test]
    fn test_snapshot_equals_screen_after_show() {
        let (draw, _) = headless(50, 50);
        draw.set_color(Color::BLUE_VIOLET);
        draw.filled_polygon(&[(5, 5), (45, 10), (25, 45)]);
        draw.set_color(Color::ORANGE);
        draw.draw_bezier((0, 49), (10, 0), (40, 0), (49, 49));
        draw.draw_point(1, 1);
        draw.show().unwrap();

        let shown = draw.inner.owner.read_back().unwrap().unwrap();
        assert_eq!(&shown, draw.as_image().pixmap());
        assert_eq!(draw.inner.owner.canvas_snapshot(), shown);
    }

    #[test]
    fn test_as_image_is_independent() {
        let (draw, _) = headless(10, 10);
        let before = draw.as_image();
        draw.filled_square(0, 0, 5);
        assert!(before.is_uniform());
        assert_ne!(draw.as_image(), before);
    }

    #[test]
    fn test_point_marks_pixel() {
        let (draw, _) = headless(10, 10);
        draw.set_antialias(false);
        draw.draw_point(4, 6);
        assert_eq!(draw.as_image().pixel(4, 6), Some(Color::BLACK));
        assert_eq!(draw.as_image().pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_extreme_coordinates_do_not_panic() {
        let (draw, _) = headless(8, 8);
        draw.draw_circle(0, 0, i32::MAX);
        draw.filled_ellipse(i32::MIN, i32::MAX, i32::MAX, i32::MIN);
        draw.filled_rectangle(i32::MIN, 0, -1, 1);
        draw.draw_rectangle(i32::MAX, i32::MAX, i32::MAX, i32::MAX);
        draw.filled_arc(i32::MAX, 0, i32::MAX, 4, 0, 90);
        draw.filled_rectangle(2, 2, 1, 1);
        assert_eq!(draw.as_image().pixel(2, 2), Some(Color::BLACK));
    }

    #[test]
    fn test_show_for_paces_frames() {
        let (draw, _) = headless(16, 16);
        let wait = Duration::from_millis(15);
        let started = Instant::now();
        for i in 0..4 {
            draw.filled_square(i, i, 2);
            draw.show_for(wait).unwrap();
        }
        assert!(started.elapsed() >= wait * 4);
    }

    #[test]
    fn test_text_needs_a_font() {
        let (draw, _) = headless(120, 40);
        match draw.font() {
            Some(font) => {
                assert_eq!(font.size(), DEFAULT_FONT_SIZE);
                draw.draw_text(4, 4, "Hello").unwrap();
                assert!(!draw.as_image().is_uniform());
            }
            None => {
                let err = draw.draw_text(4, 4, "Hello").unwrap_err();
                assert!(matches!(err, crate::Error::Canvas(CanvasError::NoFont)));
            }
        }
    }

    #[test]
    fn test_callback_draws_on_click() {
        let (draw, _) = headless(30, 30);
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        draw.set_color(Color::GREEN);
        draw.on_mouse_click(move |d, m| {
            d.filled_rectangle(m.x, m.y, 4, 4);
            let shown = d.show();
            tx.lock().send(shown.is_ok()).ok();
        });

        draw.post_input(RawInput::CursorMoved { x: 10.0, y: 12.0 }).unwrap();
        for pressed in [true, false] {
            draw.post_input(RawInput::Button {
                button: MouseButton::Left,
                pressed,
            })
            .unwrap();
        }

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        assert_eq!(draw.as_image().pixel(11, 13), Some(Color::GREEN));
        let shown = draw.inner.owner.read_back().unwrap().unwrap();
        assert_eq!(&shown, draw.as_image().pixmap());
    }

    #[test]
    fn test_removed_handler_is_not_called() {
        let (draw, _) = headless(10, 10);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = draw.on_mouse_leave(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(draw.remove_handler(id));
        draw.post_input(RawInput::CursorLeft).unwrap();
        // A round trip through the UI thread orders this after the input.
        draw.set_title("after").unwrap();
        draw.desktop_position().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_close_then_show_is_cancelled() {
        let (draw, fired) = headless(10, 10);
        draw.close().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(draw.show().unwrap_err().is_cancelled());
        draw.close().unwrap();
    }

    #[test]
    fn test_two_windows_close_independently() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let lifecycle = Arc::new(Lifecycle::with_last_closed(move || {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        let open = || {
            LiteDraw::builder()
                .size(8, 8)
                .runtime(Arc::new(HeadlessRuntime::new()))
                .lifecycle(Arc::clone(&lifecycle))
                .build()
                .unwrap()
        };
        let (a, b) = (open(), open());

        a.close().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        b.filled_circle(4, 4, 3);
        b.show().unwrap();
        b.close().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
