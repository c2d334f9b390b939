// Keyboard triggers for the display.
//
// Digit keys 1..=row_count (main row or keypad) toggle the matching row's
// video. Auto-repeat and keys typed into text widgets are ignored.

use gdk4::Key;
use glib::translate::IntoGlib;
use gtk4::prelude::*;
use gtk4::{EventControllerKey, PropagationPhase, Widget};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Callback type for row triggers (0-based row)
pub type RowTriggeredCallback = Box<dyn Fn(usize)>;

const KEYPAD_DIGITS: [(Key, char); 10] = [
    (Key::KP_0, '0'),
    (Key::KP_1, '1'),
    (Key::KP_2, '2'),
    (Key::KP_3, '3'),
    (Key::KP_4, '4'),
    (Key::KP_5, '5'),
    (Key::KP_6, '6'),
    (Key::KP_7, '7'),
    (Key::KP_8, '8'),
    (Key::KP_9, '9'),
];

/// Printable digit for `key`, including keypad digits.
pub fn key_digit(key: Key) -> Option<char> {
    KEYPAD_DIGITS
        .iter()
        .find(|(kp, _)| *kp == key)
        .map(|(_, digit)| *digit)
        .or_else(|| key.to_unicode().filter(char::is_ascii_digit))
}

/// 0-based row for a pressed digit, if it names one of `row_count` rows.
pub fn row_for_digit(digit: char, row_count: usize) -> Option<usize> {
    let number = digit.to_digit(10)? as usize;
    (1..=row_count).contains(&number).then(|| number - 1)
}

/// Hardware keycodes currently held down; a second press without a release
/// is a repeat. Keycodes stay the same when modifiers change mid-press,
/// unlike keyvals.
#[derive(Debug, Default)]
pub struct HeldKeys {
    held: HashSet<u32>,
}

impl HeldKeys {
    /// Returns `true` for a fresh press, `false` for auto-repeat.
    pub fn press(&mut self, keycode: u32) -> bool {
        self.held.insert(keycode)
    }

    pub fn release(&mut self, keycode: u32) {
        self.held.remove(&keycode);
    }

    /// Forget everything, e.g. when releases can no longer be observed.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

fn text_input_focused(widget: Option<Widget>) -> bool {
    let focus = widget.and_then(|w| w.root()).and_then(|root| root.focus());
    match focus {
        Some(focus) => {
            focus.is::<gtk4::Text>() || focus.is::<gtk4::TextView>() || focus.is::<gtk4::Editable>()
        }
        None => false,
    }
}

fn key_label(key: Key) -> String {
    key.to_unicode()
        .filter(|c| !c.is_control())
        .map(String::from)
        .or_else(|| key.name().map(|n| n.to_string()))
        .unwrap_or_else(|| format!("{:#x}", key.into_glib()))
}

/// Keybinding manager for the display window
pub struct Keybindings {
    controller: EventControllerKey,
    held: Rc<RefCell<HeldKeys>>,
    on_row_triggered: Rc<RefCell<Option<RowTriggeredCallback>>>,
}

impl Keybindings {
    pub fn new(row_count: usize) -> Self {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let held = Rc::new(RefCell::new(HeldKeys::default()));
        let on_row_triggered: Rc<RefCell<Option<RowTriggeredCallback>>> =
            Rc::new(RefCell::new(None));

        let held_press = held.clone();
        let on_row_triggered_clone = on_row_triggered.clone();
        controller.connect_key_pressed(move |controller, keyval, keycode, _state| {
            if text_input_focused(controller.widget()) {
                return glib::Propagation::Proceed;
            }
            if !held_press.borrow_mut().press(keycode) {
                return glib::Propagation::Stop;
            }

            let label = key_label(keyval);
            match key_digit(keyval).and_then(|d| row_for_digit(d, row_count)) {
                Some(row) => {
                    tracing::info!("key {} -> row {}", label, row + 1);
                    if let Some(ref callback) = *on_row_triggered_clone.borrow() {
                        callback(row);
                    }
                    glib::Propagation::Stop
                }
                None => {
                    tracing::info!("key {} ignored", label);
                    glib::Propagation::Proceed
                }
            }
        });

        let held_release = held.clone();
        controller.connect_key_released(move |_controller, _keyval, keycode, _state| {
            held_release.borrow_mut().release(keycode);
        });

        Self {
            controller,
            held,
            on_row_triggered,
        }
    }

    /// Attach keybindings to the main window. Held keys are forgotten
    /// whenever the window stops being active, since their releases go
    /// elsewhere.
    pub fn attach(&self, window: &(impl IsA<gtk4::Window> + IsA<gtk4::Widget>)) {
        window.add_controller(self.controller.clone());

        let held = self.held.clone();
        window.connect_is_active_notify(move |window| {
            if !window.is_active() {
                held.borrow_mut().clear();
            }
        });
    }

    pub fn connect_row_triggered<F>(&self, callback: F)
    where
        F: Fn(usize) + 'static,
    {
        *self.on_row_triggered.borrow_mut() = Some(Box::new(callback));
    }
}
