//! Widget identity, flags and the shared base state.

use std::ops::{BitOr, BitOrAssign};

use slotmap::new_key_type;

use crate::geometry::Region;
use crate::render::canvas::Canvas;

new_key_type! {
    /// Unique identifier for a widget in the arena. Copy, lightweight (u64).
    pub struct WidgetId;
}

// ---------------------------------------------------------------------------
// WidgetFlags
// ---------------------------------------------------------------------------

/// Widget state bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WidgetFlags(pub u16);

impl WidgetFlags {
    pub const NONE: WidgetFlags = WidgetFlags(0);
    pub const MAPPED: WidgetFlags = WidgetFlags(1 << 0);
    pub const HAS_FOCUS: WidgetFlags = WidgetFlags(1 << 1);
    pub const CAN_TAKE_FOCUS: WidgetFlags = WidgetFlags(1 << 2);
    pub const NO_BORDER: WidgetFlags = WidgetFlags(1 << 3);
    pub const NO_SHADOW: WidgetFlags = WidgetFlags(1 << 4);
    pub const URGENT: WidgetFlags = WidgetFlags(1 << 5);
    pub const GROW_X: WidgetFlags = WidgetFlags(1 << 6);
    pub const GROW_Y: WidgetFlags = WidgetFlags(1 << 7);
    pub const INVISIBLE: WidgetFlags = WidgetFlags(1 << 8);
    pub const TRANSIENT: WidgetFlags = WidgetFlags(1 << 9);
    pub const DESTROYING: WidgetFlags = WidgetFlags(1 << 10);
    pub const DRAWING: WidgetFlags = WidgetFlags(1 << 11);

    /// Check whether `self` contains all the bits in `other`.
    pub fn contains(self, other: WidgetFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: WidgetFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: WidgetFlags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: WidgetFlags, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for WidgetFlags {
    type Output = WidgetFlags;
    fn bitor(self, rhs: Self) -> Self::Output {
        WidgetFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for WidgetFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// WidgetBase
// ---------------------------------------------------------------------------

/// State every widget carries regardless of its kind.
///
/// A widget starts unmapped with a zero size. Its canvas (the allocated
/// screen region) is created on the first draw and dropped with the widget.
#[derive(Debug, Clone)]
pub struct WidgetBase {
    /// Class name used for action/binding lookup.
    pub class: String,
    pub name: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub flags: WidgetFlags,
    pub(crate) canvas: Option<Canvas>,
}

impl WidgetBase {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: None,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            min_width: 0,
            min_height: 0,
            flags: WidgetFlags::NONE,
            canvas: None,
        }
    }

    pub fn has(&self, flag: WidgetFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_mapped(&self) -> bool {
        self.has(WidgetFlags::MAPPED)
    }

    pub fn can_take_focus(&self) -> bool {
        self.has(WidgetFlags::CAN_TAKE_FOCUS)
    }

    pub fn is_visible(&self) -> bool {
        !self.has(WidgetFlags::INVISIBLE)
    }

    pub fn has_border(&self) -> bool {
        !self.has(WidgetFlags::NO_BORDER)
    }

    /// Inner rectangle (position and size without shadow).
    pub fn region(&self) -> Region {
        Region::new(self.x, self.y, self.width, self.height)
    }

    /// The allocated screen region, if the widget has been drawn.
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_insert_remove() {
        let mut f = WidgetFlags::NONE;
        f.insert(WidgetFlags::GROW_X | WidgetFlags::GROW_Y);
        assert!(f.contains(WidgetFlags::GROW_X));
        assert!(f.contains(WidgetFlags::GROW_X | WidgetFlags::GROW_Y));
        f.remove(WidgetFlags::GROW_X);
        assert!(!f.contains(WidgetFlags::GROW_X));
        f.set(WidgetFlags::URGENT, true);
        assert!(f.contains(WidgetFlags::URGENT));
        f.set(WidgetFlags::URGENT, false);
        assert!(!f.contains(WidgetFlags::URGENT));
    }

    #[test]
    fn new_base_is_unmapped_and_empty() {
        let base = WidgetBase::new("Widget");
        assert!(!base.is_mapped());
        assert_eq!(base.region(), Region::EMPTY);
        assert!(base.canvas().is_none());
        assert!(base.has_border());
        assert!(base.is_visible());
    }
}
