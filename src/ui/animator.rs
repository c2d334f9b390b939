//! Drives a widget inside a `Fixed` through `RectMotion` transitions.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gtk4::prelude::*;
use gtk4::{glib, Fixed, TickCallbackId, Widget};

use crate::layout::{RectMotion, TransitionTiming};
use crate::models::Rect;

fn now() -> Duration {
    Duration::from_micros(glib::monotonic_time().max(0) as u64)
}

fn apply(fixed: &Fixed, widget: &Widget, rect: Rect) {
    fixed.move_(widget, rect.left, rect.top);
    widget.set_size_request(rect.width.round() as i32, rect.height.round() as i32);
}

pub struct WidgetAnimator {
    fixed: Fixed,
    widget: Widget,
    motion: Rc<RefCell<RectMotion>>,
    tick: Rc<RefCell<Option<TickCallbackId>>>,
}

impl WidgetAnimator {
    /// `widget` must already be a child of `fixed`.
    pub fn new(fixed: &Fixed, widget: &impl IsA<Widget>) -> Self {
        Self {
            fixed: fixed.clone(),
            widget: widget.clone().upcast(),
            motion: Rc::new(RefCell::new(RectMotion::new(Rect::default()))),
            tick: Rc::new(RefCell::new(None)),
        }
    }

    /// Instant writes are staged and land on the next frame or `commit`.
    pub fn place(&self, rect: Rect, timing: TransitionTiming) {
        {
            let mut motion = self.motion.borrow_mut();
            if timing.is_instant() {
                motion.set_instant(rect);
            } else {
                motion.transition_to(rect, timing, now());
            }
        }
        self.widget.set_visible(true);
        self.ensure_ticking();
    }

    pub fn commit(&self) {
        let rect = {
            let mut motion = self.motion.borrow_mut();
            motion.commit();
            motion.sample(now())
        };
        apply(&self.fixed, &self.widget, rect);
    }

    pub fn hide(&self) {
        self.stop_ticking();
        self.widget.set_visible(false);
    }

    fn ensure_ticking(&self) {
        if self.tick.borrow().is_some() {
            return;
        }

        let fixed = self.fixed.clone();
        let motion = self.motion.clone();
        let tick_slot = self.tick.clone();
        let id = self.widget.add_tick_callback(move |widget, _clock| {
            let now = now();
            let (rect, settled) = {
                let mut motion = motion.borrow_mut();
                let rect = motion.sample(now);
                (rect, motion.is_settled(now))
            };
            apply(&fixed, widget, rect);

            if settled {
                // Returning Break removes the callback; the id must not be
                // removed again.
                tick_slot.borrow_mut().take();
                glib::ControlFlow::Break
            } else {
                glib::ControlFlow::Continue
            }
        });
        *self.tick.borrow_mut() = Some(id);
    }

    fn stop_ticking(&self) {
        if let Some(id) = self.tick.borrow_mut().take() {
            id.remove();
        }
    }
}

impl Drop for WidgetAnimator {
    fn drop(&mut self) {
        self.stop_ticking();
    }
}
