#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned hit region in scene pixels.
///
/// Entities are placed by their center, so a rect is stored as its center and
/// full size. Edges are inclusive for containment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    center: Vec2,
    size: Vec2,
}

impl Rect {
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn min(&self) -> Vec2 {
        Vec2 {
            x: self.center.x - self.size.x * 0.5,
            y: self.center.y - self.size.y * 0.5,
        }
    }

    pub fn max(&self) -> Vec2 {
        Vec2 {
            x: self.center.x + self.size.x * 0.5,
            y: self.center.y + self.size.y * 0.5,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    pub fn recentered(&self, center: Vec2) -> Self {
        Self {
            center,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_on_edges() {
        let rect = Rect::centered(Vec2::new(100.0, 50.0), Vec2::new(20.0, 10.0));
        assert!(rect.contains(Vec2::new(90.0, 45.0)));
        assert!(rect.contains(Vec2::new(110.0, 55.0)));
        assert!(!rect.contains(Vec2::new(110.5, 50.0)));
        assert!(!rect.contains(Vec2::new(100.0, 44.0)));
    }

    #[test]
    fn recentered_keeps_size() {
        let rect = Rect::centered(Vec2::new(0.0, 0.0), Vec2::new(8.0, 4.0));
        let moved = rect.recentered(Vec2::new(10.0, -2.0));
        assert_eq!(moved.size(), rect.size());
        assert_eq!(moved.min(), Vec2::new(6.0, -4.0));
        assert_eq!(moved.max(), Vec2::new(14.0, 0.0));
    }
}
