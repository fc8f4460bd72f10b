#![forbid(unsafe_code)]

//! Geometric primitives for the container surface.

/// A rectangle for surface bounds and layer frames.
///
/// Uses terminal coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Extent along the given axis, as a float for animation math.
    #[inline]
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => f64::from(self.width),
            Axis::Vertical => f64::from(self.height),
        }
    }
}

/// Layout axis used by slide geometry and gesture projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A fractional translation applied to a layer, in cells.
///
/// Animations move layers by sub-cell amounts; renderers round when they
/// rasterize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    /// The identity translation.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create a new offset.
    #[inline]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Offset along a single axis.
    #[inline]
    pub const fn along(axis: Axis, amount: f64) -> Self {
        match axis {
            Axis::Horizontal => Self::new(amount, 0.0),
            Axis::Vertical => Self::new(0.0, amount),
        }
    }

    /// Component of this offset on `axis`.
    #[inline]
    pub const fn component(self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.dx,
            Axis::Vertical => self.dy,
        }
    }

    /// Linear interpolation between `self` and `to` at `t` (unclamped).
    #[inline]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            dx: self.dx + (to.dx - self.dx) * t,
            dy: self.dy + (to.dy - self.dy) * t,
        }
    }

    /// Whether this is the identity translation.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_saturate() {
        let r = Rect::new(u16::MAX - 1, 3, 10, 4);
        assert_eq!(r.right(), u16::MAX);
        assert_eq!(r.bottom(), 7);
    }

    #[test]
    fn rect_empty() {
        assert!(Rect::from_size(0, 10).is_empty());
        assert!(!Rect::from_size(1, 1).is_empty());
    }

    #[test]
    fn extent_per_axis() {
        let r = Rect::from_size(80, 24);
        assert_eq!(r.extent(Axis::Horizontal), 80.0);
        assert_eq!(r.extent(Axis::Vertical), 24.0);
    }

    #[test]
    fn offset_lerp_midpoint() {
        let a = Offset::new(0.0, 10.0);
        let b = Offset::new(20.0, -10.0);
        assert_eq!(a.lerp(b, 0.5), Offset::new(10.0, 0.0));
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn offset_along_and_component() {
        let o = Offset::along(Axis::Vertical, 4.0);
        assert_eq!(o, Offset::new(0.0, 4.0));
        assert_eq!(o.component(Axis::Vertical), 4.0);
        assert_eq!(o.component(Axis::Horizontal), 0.0);
        assert!(Offset::ZERO.is_zero());
    }
}
