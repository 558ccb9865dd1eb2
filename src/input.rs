// SPDX: CC0-1.0

//! Pointer, wheel and touch handling as an explicit state machine.
//!
//! The controller only mutates the [`Viewport`]; it never draws. Callers
//! request a repaint whenever [`InputController::handle`] reports a change.

use crate::{viewport::Viewport, Number, Point};

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown(Point<Number>),
    PointerMove(Point<Number>),
    PointerUp,
    PointerLeave,
    /// `delta_y < 0` scrolls up, which zooms in.
    Wheel {
        position: Point<Number>,
        delta_y: Number,
    },
    TouchStart(Vec<Point<Number>>),
    TouchMove(Vec<Point<Number>>),
    /// Carries the touches still on the surface.
    TouchEnd(Vec<Point<Number>>),
}

/// Where a drag started and what the offset was at that moment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSession {
    pub start: Point<Number>,
    pub start_offset: Point<Number>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InputState {
    #[default]
    Idle,
    Dragging(PointerSession),
    /// Two fingers down; `distance` is their last separation in pixels.
    Pinching { distance: Number },
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputController {
    state: InputState,
    wheel_intensity: Number,
}

fn distance(a: Point<Number>, b: Point<Number>) -> Number {
    (a.x - b.x).hypot(a.y - b.y)
}

fn midpoint(a: Point<Number>, b: Point<Number>) -> Point<Number> {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

impl InputController {
    /// Wheel steps zoom by `exp(±wheel_intensity)`.
    pub fn new(wheel_intensity: Number) -> Self {
        Self {
            state: InputState::Idle,
            wheel_intensity,
        }
    }

    pub const fn state(&self) -> InputState {
        self.state
    }

    fn begin_drag(&mut self, at: Point<Number>, viewport: &Viewport) {
        self.state = InputState::Dragging(PointerSession {
            start: at,
            start_offset: viewport.offset(),
        });
    }

    /// Offset is assigned from the session start rather than accumulated,
    /// so a long drag cannot drift.
    fn drag_to(&self, at: Point<Number>, viewport: &mut Viewport) -> bool {
        let InputState::Dragging(session) = self.state else {
            return false;
        };
        let offset = Point::new(
            session.start_offset.x + (at.x - session.start.x),
            session.start_offset.y + (at.y - session.start.y),
        );
        if offset == viewport.offset() {
            return false;
        }
        viewport.set_offset(offset);
        true
    }

    /// Apply one event. Returns `true` when the viewport changed.
    pub fn handle(&mut self, event: &InputEvent, viewport: &mut Viewport) -> bool {
        match event {
            InputEvent::PointerDown(at) => {
                self.begin_drag(*at, viewport);
                false
            }
            InputEvent::PointerMove(at) => self.drag_to(*at, viewport),
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                self.state = InputState::Idle;
                false
            }
            InputEvent::Wheel { position, delta_y } => {
                let direction = if *delta_y < 0.0 {
                    1.0
                } else if *delta_y > 0.0 {
                    -1.0
                } else {
                    return false;
                };
                viewport.zoom_at(*position, (direction * self.wheel_intensity).exp())
            }
            InputEvent::TouchStart(touches) => {
                match touches.as_slice() {
                    [] => self.state = InputState::Idle,
                    [only] => self.begin_drag(*only, viewport),
                    [a, b, ..] => {
                        self.state = InputState::Pinching {
                            distance: distance(*a, *b),
                        }
                    }
                }
                false
            }
            InputEvent::TouchMove(touches) => match (self.state, touches.as_slice()) {
                (InputState::Dragging(_), [first, ..]) => self.drag_to(*first, viewport),
                (InputState::Pinching { distance: prev }, [a, b, ..]) => {
                    let now = distance(*a, *b);
                    if !(prev > 0.0 && now > 0.0) {
                        self.state = InputState::Pinching { distance: now };
                        return false;
                    }
                    let changed = viewport.zoom_at(midpoint(*a, *b), now / prev);
                    self.state = InputState::Pinching { distance: now };
                    changed
                }
                _ => false,
            },
            InputEvent::TouchEnd(_) => {
                self.state = InputState::Idle;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (InputController, Viewport) {
        (InputController::new(0.1), Viewport::new(400.0, 300.0, 40.0))
    }

    #[test]
    fn drag_assigns_offset_from_session_start() {
        let (mut input, mut vp) = setup();
        vp.pan(5.0, 5.0);
        assert!(!input.handle(&InputEvent::PointerDown(Point::new(100.0, 100.0)), &mut vp));
        assert!(matches!(input.state(), InputState::Dragging(_)));
        for p in [(110.0, 90.0), (150.0, 120.0), (130.0, 105.0)] {
            assert!(input.handle(&InputEvent::PointerMove(Point::new(p.0, p.1)), &mut vp));
        }
        assert_eq!(vp.offset(), Point::new(35.0, 10.0));
        assert!(!input.handle(&InputEvent::PointerUp, &mut vp));
        assert_eq!(input.state(), InputState::Idle);
        // moves while idle do nothing
        assert!(!input.handle(&InputEvent::PointerMove(Point::new(0.0, 0.0)), &mut vp));
        assert_eq!(vp.offset(), Point::new(35.0, 10.0));
    }

    #[test]
    fn leaving_ends_the_drag() {
        let (mut input, mut vp) = setup();
        input.handle(&InputEvent::PointerDown(Point::new(1.0, 1.0)), &mut vp);
        input.handle(&InputEvent::PointerLeave, &mut vp);
        assert_eq!(input.state(), InputState::Idle);
    }

    #[test]
    fn wheel_direction() {
        let (mut input, mut vp) = setup();
        let at = Point::new(120.0, 80.0);
        assert!(input.handle(&InputEvent::Wheel { position: at, delta_y: -3.0 }, &mut vp));
        assert!((vp.scale() - 40.0 * (0.1 as Number).exp()).abs() < 1e-9);
        assert!(input.handle(&InputEvent::Wheel { position: at, delta_y: 3.0 }, &mut vp));
        assert!((vp.scale() - 40.0).abs() < 1e-9);
        assert!(!input.handle(&InputEvent::Wheel { position: at, delta_y: 0.0 }, &mut vp));
        assert_eq!(input.state(), InputState::Idle);
    }

    #[test]
    fn wheel_keeps_drag_state() {
        let (mut input, mut vp) = setup();
        input.handle(&InputEvent::PointerDown(Point::new(1.0, 1.0)), &mut vp);
        input.handle(
            &InputEvent::Wheel {
                position: Point::new(1.0, 1.0),
                delta_y: -1.0,
            },
            &mut vp,
        );
        assert!(matches!(input.state(), InputState::Dragging(_)));
    }

    #[test]
    fn single_touch_pans() {
        let (mut input, mut vp) = setup();
        input.handle(&InputEvent::TouchStart(vec![Point::new(10.0, 10.0)]), &mut vp);
        assert!(input.handle(&InputEvent::TouchMove(vec![Point::new(30.0, 0.0)]), &mut vp));
        assert_eq!(vp.offset(), Point::new(20.0, -10.0));
        input.handle(&InputEvent::TouchEnd(vec![]), &mut vp);
        assert_eq!(input.state(), InputState::Idle);
    }

    #[test]
    fn pinch_zooms_about_midpoint() {
        let (mut input, mut vp) = setup();
        let a = Point::new(100.0, 150.0);
        input.handle(&InputEvent::TouchStart(vec![a, Point::new(200.0, 150.0)]), &mut vp);
        assert_eq!(input.state(), InputState::Pinching { distance: 100.0 });

        let mid = Point::new(150.0, 150.0);
        let before = vp.to_math(mid);
        assert!(input.handle(&InputEvent::TouchMove(vec![Point::new(50.0, 150.0), Point::new(250.0, 150.0)]), &mut vp));
        assert!((vp.scale() - 80.0).abs() < 1e-9);
        let after = vp.to_math(mid);
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);

        input.handle(&InputEvent::TouchEnd(vec![a]), &mut vp);
        assert_eq!(input.state(), InputState::Idle);
    }
}
