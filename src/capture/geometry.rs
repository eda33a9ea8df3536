//! Capture rectangle resolution
//!
//! Reconciles a window's reported bounds with the virtual desktop so the
//! encoder is only ever asked for pixels that exist. The desktop may span
//! several monitors and start at a negative origin.

/// An axis-aligned rectangle in virtual desktop coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[cfg(test)]
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rectangle::new(
            left,
            top,
            (right - left as i64) as u32,
            (bottom - top as i64) as u32,
        )
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x={}, y={}, size={}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Computes the rectangle to hand to the encoder.
///
/// The window is clipped to the desktop first, then each dimension is
/// rounded down to an even value with a floor of 2 (yuv420p rejects odd
/// sizes). Degenerate input never fails; it collapses to the smallest valid
/// rectangle inside the desktop.
pub fn resolve_capture_rect(window: Rectangle, desktop: Rectangle) -> Rectangle {
    let (x, width) = resolve_axis(window.x, window.width, desktop.x, desktop.width);
    let (y, height) = resolve_axis(window.y, window.height, desktop.y, desktop.height);
    Rectangle::new(x, y, width, height)
}

/// Clip-then-round along a single axis. Returns the origin and length.
fn resolve_axis(start: i32, len: u32, bound_start: i32, bound_len: u32) -> (i32, u32) {
    let bound_start = bound_start as i64;
    let bound_end = bound_start + bound_len as i64;

    let mut lo = (start as i64).max(bound_start);
    let hi = (start as i64 + len as i64).min(bound_end);

    let mut span = hi - lo;
    if span < 1 {
        span = 1;
        lo = lo.clamp(bound_start, (bound_end - 1).max(bound_start));
    }

    if span % 2 != 0 {
        span -= 1;
    }
    let span = span.max(2);

    // Flooring can overhang the far edge; slide back inside.
    if lo + span > bound_end {
        lo = (bound_end - span).max(bound_start);
    }

    (lo as i32, span as u32)
}
