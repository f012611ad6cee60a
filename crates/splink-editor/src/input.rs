//! Input abstraction layer.
//!
//! Pointer events as the handles consume them. The tool dispatcher that
//! produces them lives outside this crate; positions arrive in view space
//! and are mapped to document space by [`crate::handles::drive`].

use kurbo::Point;

/// Modifier keys held during a pointer event. Only Shift (axis-constrained
/// drag) changes what a handle does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { shift: false };

    pub const SHIFT: Self = Self { shift: true };
}

/// A normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed: a drag starts.
    PointerDown { x: f64, y: f64, modifiers: Modifiers },

    /// Pointer moved while pressed.
    PointerMove { x: f64, y: f64, modifiers: Modifiers },

    /// Pointer released: the drag ends.
    PointerUp { x: f64, y: f64, modifiers: Modifiers },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn position(&self) -> Point {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Point::new(x, y),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match *self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. } => modifiers,
        }
    }

    /// The same event at another position (used for view → document mapping).
    pub fn at(self, p: Point) -> Self {
        match self {
            Self::PointerDown { modifiers, .. } => Self::PointerDown {
                x: p.x,
                y: p.y,
                modifiers,
            },
            Self::PointerMove { modifiers, .. } => Self::PointerMove {
                x: p.x,
                y: p.y,
                modifiers,
            },
            Self::PointerUp { modifiers, .. } => Self::PointerUp {
                x: p.x,
                y: p.y,
                modifiers,
            },
        }
    }

    /// Same event with `modifiers` replaced.
    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        match self {
            Self::PointerDown { x, y, .. } => Self::PointerDown { x, y, modifiers },
            Self::PointerMove { x, y, .. } => Self::PointerMove { x, y, modifiers },
            Self::PointerUp { x, y, .. } => Self::PointerUp { x, y, modifiers },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn remapping_keeps_modifiers() {
        let e = InputEvent::moved(10.0, 20.0).with_modifiers(Modifiers::SHIFT);
        let mapped = e.at(Point::new(5.0, 10.0));
        assert_eq!(mapped.position(), Point::new(5.0, 10.0));
        assert_eq!(mapped.modifiers(), Modifiers::SHIFT);
        assert!(matches!(mapped, InputEvent::PointerMove { .. }));
        assert_eq!(InputEvent::down(0.0, 0.0).modifiers(), Modifiers::NONE);
    }
}
