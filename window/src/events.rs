//! Input events as delivered to subscribers, and the translation from raw
//! platform input (press/release pairs, cursor motion) into them.

use std::time::{Duration, Instant};

pub use winit::event::MouseButton;
pub use winit::keyboard::{Key, NamedKey};

/// Two clicks closer together than this form a double click.
pub const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
/// ...provided the pointer moved at most this many pixels on either axis.
pub const DOUBLE_CLICK_DISTANCE: i32 = 4;
/// Wheel delta reported per notch.
pub const WHEEL_DELTA: i32 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub logo: bool,
}

impl From<winit::keyboard::ModifiersState> for Modifiers {
    fn from(state: winit::keyboard::ModifiersState) -> Self {
        Modifiers {
            ctrl: state.control_key(),
            shift: state.shift_key(),
            alt: state.alt_key(),
            logo: state.super_key(),
        }
    }
}

/// Mouse payload. Coordinates are client-area pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    /// Button involved, or held during a move.
    pub button: Option<MouseButton>,
    /// 1 for a single click, 2 for the second click of a double click.
    pub clicks: u32,
    /// Wheel rotation, [`WHEEL_DELTA`] per notch; positive scrolls away from the user.
    pub delta: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub repeat: bool,
}

/// A character produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPressEvent {
    pub ch: char,
}

/// New outer position of the window on the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    MouseClick(MouseEvent),
    MouseDoubleClick(MouseEvent),
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    MouseMove(MouseEvent),
    MouseWheel(MouseEvent),
    MouseLeave,
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    KeyPress(KeyPressEvent),
    WindowMove(MoveEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseClick,
    MouseDoubleClick,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseWheel,
    MouseLeave,
    KeyDown,
    KeyUp,
    KeyPress,
    WindowMove,
}

impl WindowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WindowEvent::MouseClick(_) => EventKind::MouseClick,
            WindowEvent::MouseDoubleClick(_) => EventKind::MouseDoubleClick,
            WindowEvent::MouseDown(_) => EventKind::MouseDown,
            WindowEvent::MouseUp(_) => EventKind::MouseUp,
            WindowEvent::MouseMove(_) => EventKind::MouseMove,
            WindowEvent::MouseWheel(_) => EventKind::MouseWheel,
            WindowEvent::MouseLeave => EventKind::MouseLeave,
            WindowEvent::KeyDown(_) => EventKind::KeyDown,
            WindowEvent::KeyUp(_) => EventKind::KeyUp,
            WindowEvent::KeyPress(_) => EventKind::KeyPress,
            WindowEvent::WindowMove(_) => EventKind::WindowMove,
        }
    }
}

/// Platform input before translation, as a runtime receives it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    CursorMoved { x: f64, y: f64 },
    CursorLeft,
    Button { button: MouseButton, pressed: bool },
    /// Wheel rotation in notches (lines); positive scrolls away from the user.
    Wheel { notches: f64 },
    Key {
        key: Key,
        pressed: bool,
        repeat: bool,
        text: Option<String>,
    },
    Modifiers(Modifiers),
    Moved { x: i32, y: i32 },
    CloseRequested,
}

struct Press {
    button: MouseButton,
    at: (i32, i32),
    clicks: u32,
}

struct LastClick {
    button: MouseButton,
    at: (i32, i32),
    time: Instant,
}

/// Turns raw pointer and key input into subscriber events.
#[derive(Default)]
pub struct InputTracker {
    cursor: (i32, i32),
    modifiers: Modifiers,
    pressed: Option<Press>,
    last_click: Option<LastClick>,
}

impl InputTracker {
    fn mouse(&self, button: Option<MouseButton>, clicks: u32, delta: i32) -> MouseEvent {
        MouseEvent {
            x: self.cursor.0,
            y: self.cursor.1,
            button,
            clicks,
            delta,
        }
    }

    fn is_double(&self, button: MouseButton, now: Instant) -> bool {
        match &self.last_click {
            Some(last) => {
                last.button == button
                    && now.duration_since(last.time) <= DOUBLE_CLICK_TIME
                    && (last.at.0 - self.cursor.0).abs() <= DOUBLE_CLICK_DISTANCE
                    && (last.at.1 - self.cursor.1).abs() <= DOUBLE_CLICK_DISTANCE
            }
            None => false,
        }
    }

    /// Translate one raw input. `CloseRequested` yields nothing; the caller
    /// handles it.
    pub fn translate(&mut self, input: RawInput, now: Instant) -> Vec<WindowEvent> {
        match input {
            RawInput::CursorMoved { x, y } => {
                self.cursor = (x.round() as i32, y.round() as i32);
                let held = self.pressed.as_ref().map(|p| p.button);
                vec![WindowEvent::MouseMove(self.mouse(held, 0, 0))]
            }
            RawInput::CursorLeft => vec![WindowEvent::MouseLeave],
            RawInput::Button {
                button,
                pressed: true,
            } => {
                let clicks = if self.is_double(button, now) { 2 } else { 1 };
                self.pressed = Some(Press {
                    button,
                    at: self.cursor,
                    clicks,
                });
                vec![WindowEvent::MouseDown(self.mouse(Some(button), clicks, 0))]
            }
            RawInput::Button {
                button,
                pressed: false,
            } => {
                let mut events = Vec::with_capacity(2);
                match self.pressed.take() {
                    Some(press) if press.button == button => {
                        let ev = self.mouse(Some(button), press.clicks, 0);
                        if press.clicks >= 2 {
                            events.push(WindowEvent::MouseDoubleClick(ev));
                            self.last_click = None;
                        } else {
                            events.push(WindowEvent::MouseClick(ev));
                            self.last_click = Some(LastClick {
                                button,
                                at: press.at,
                                time: now,
                            });
                        }
                    }
                    other => self.pressed = other,
                }
                events.push(WindowEvent::MouseUp(self.mouse(Some(button), 1, 0)));
                events
            }
            RawInput::Wheel { notches } => {
                let delta = (notches * WHEEL_DELTA as f64).round() as i32;
                vec![WindowEvent::MouseWheel(self.mouse(None, 0, delta))]
            }
            RawInput::Key {
                key,
                pressed,
                repeat,
                text,
            } => {
                let ev = KeyEvent {
                    key,
                    modifiers: self.modifiers,
                    repeat,
                };
                if !pressed {
                    return vec![WindowEvent::KeyUp(ev)];
                }
                let mut events = vec![WindowEvent::KeyDown(ev)];
                if let Some(text) = text {
                    events.extend(
                        text.chars()
                            .map(|ch| WindowEvent::KeyPress(KeyPressEvent { ch })),
                    );
                }
                events
            }
            RawInput::Modifiers(m) => {
                self.modifiers = m;
                Vec::new()
            }
            RawInput::Moved { x, y } => vec![WindowEvent::WindowMove(MoveEvent { x, y })],
            RawInput::CloseRequested => Vec::new(),
        }
    }
}

/// True for the fixed copy-to-clipboard chord.
pub fn is_copy_chord(key: &Key, modifiers: Modifiers) -> bool {
    modifiers.ctrl
        && matches!(key, Key::Character(c) if c.as_str().eq_ignore_ascii_case("c"))
}
