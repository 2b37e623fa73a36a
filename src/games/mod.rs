//! Mini-games as pure per-tick updates: state in, state out.
//! Rendering and input polling live with the caller.

pub mod platformer;
pub mod worm;

/// Shop item that halves the worm tick interval.
pub const SPEED_BOOST_ITEM: &str = "speed-boost";
/// Shop item that grants one extra platformer life.
pub const EXTRA_LIFE_ITEM: &str = "extra-life";

fn owns(inventory: &[String], item: &str) -> bool {
    inventory.iter().any(|i| i == item)
}

/// Axis-aligned box in canvas pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.x < other.x + other.width && self.x + self.width > other.x
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.overlaps_x(other) && self.y < other.y + other.height && self.y + self.height > other.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 20.0, 20.0);
        assert!(a.intersects(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        // touching edges do not count
        assert!(!a.intersects(&Rect::new(20.0, 0.0, 20.0, 20.0)));
        assert!(a.overlaps_x(&Rect::new(5.0, 100.0, 5.0, 5.0)));
        assert_eq!(a.bottom(), 20.0);
    }
}
