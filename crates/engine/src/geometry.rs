#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn normalized(self) -> Vec2 {
        let length = self.length();
        if length <= f32::EPSILON {
            return Vec2::ZERO;
        }
        Vec2 {
            x: self.x / length,
            y: self.y / length,
        }
    }

    pub fn scaled(self, factor: f32) -> Vec2 {
        Vec2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Grid cell address: `c` is the column, `r` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub c: u32,
    pub r: u32,
}

impl GridPos {
    pub fn new(c: u32, r: u32) -> Self {
        Self { c, r }
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.c, self.r)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Idle,
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Direction {
    /// A column step moves right-down on screen and a row step moves
    /// left-down, so the screen deltas are `dc - dr` and `dc + dr`.
    pub fn between(from: GridPos, to: GridPos) -> Direction {
        let dc = i64::from(to.c) - i64::from(from.c);
        let dr = i64::from(to.r) - i64::from(from.r);
        let sx = (dc - dr).signum();
        let sy = (dc + dr).signum();
        match (sx, sy) {
            (0, 0) => Direction::Idle,
            (0, -1) => Direction::N,
            (0, _) => Direction::S,
            (1, 0) => Direction::E,
            (-1, 0) => Direction::W,
            (1, -1) => Direction::NE,
            (-1, -1) => Direction::NW,
            (1, _) => Direction::SE,
            _ => Direction::SW,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::NE => "ne",
            Self::NW => "nw",
            Self::SE => "se",
            Self::SW => "sw",
        }
    }
}

/// Pixel-space lookups the transit core needs from the presentation layer.
pub trait TileGeometry {
    fn tile_center(&self, pos: GridPos) -> Vec2;

    fn tile_contains(&self, pos: GridPos, point: Vec2) -> bool;
}

/// Diamond-tile isometric projection.
///
/// The centre of tile `(c, r)` is
/// `origin + ((c - r) * tile_width / 2, (c + r) * tile_height / 2)`
/// with screen y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsometricLayout {
    pub tile_width: f32,
    pub tile_height: f32,
    pub origin: Vec2,
}

impl Default for IsometricLayout {
    fn default() -> Self {
        Self {
            tile_width: 64.0,
            tile_height: 32.0,
            origin: Vec2::ZERO,
        }
    }
}

impl IsometricLayout {
    pub fn new(tile_width: f32, tile_height: f32) -> Self {
        Self {
            tile_width,
            tile_height,
            origin: Vec2::ZERO,
        }
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    fn half_extents(&self) -> (f32, f32) {
        (self.tile_width * 0.5, self.tile_height * 0.5)
    }
}

impl TileGeometry for IsometricLayout {
    fn tile_center(&self, pos: GridPos) -> Vec2 {
        let (half_w, half_h) = self.half_extents();
        let c = pos.c as f32;
        let r = pos.r as f32;
        Vec2 {
            x: self.origin.x + (c - r) * half_w,
            y: self.origin.y + (c + r) * half_h,
        }
    }

    fn tile_contains(&self, pos: GridPos, point: Vec2) -> bool {
        let (half_w, half_h) = self.half_extents();
        if half_w <= 0.0 || half_h <= 0.0 {
            return false;
        }
        let center = self.tile_center(pos);
        let dx = (point.x - center.x).abs() / half_w;
        let dy = (point.y - center.y).abs() / half_h;
        dx + dy <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_tile_center_is_layout_origin() {
        let layout = IsometricLayout::new(64.0, 32.0).with_origin(Vec2::new(100.0, 20.0));
        assert_eq!(layout.tile_center(GridPos::new(0, 0)), Vec2::new(100.0, 20.0));
    }

    #[test]
    fn column_and_row_steps_move_diagonally_on_screen() {
        let layout = IsometricLayout::new(64.0, 32.0);
        assert_eq!(layout.tile_center(GridPos::new(1, 0)), Vec2::new(32.0, 16.0));
        assert_eq!(layout.tile_center(GridPos::new(0, 1)), Vec2::new(-32.0, 16.0));
        assert_eq!(layout.tile_center(GridPos::new(2, 2)), Vec2::new(0.0, 64.0));
    }

    #[test]
    fn diamond_containment_respects_tile_edges() {
        let layout = IsometricLayout::new(64.0, 32.0);
        let tile = GridPos::new(1, 0);
        let center = layout.tile_center(tile);
        assert!(layout.tile_contains(tile, center));
        assert!(layout.tile_contains(tile, Vec2::new(center.x + 31.0, center.y)));
        assert!(!layout.tile_contains(tile, Vec2::new(center.x + 20.0, center.y + 10.0)));
        assert!(!layout.tile_contains(GridPos::new(0, 0), center));
    }

    #[test]
    fn direction_follows_screen_projection() {
        let from = GridPos::new(5, 5);
        assert_eq!(Direction::between(from, from), Direction::Idle);
        assert_eq!(Direction::between(from, GridPos::new(4, 4)), Direction::N);
        assert_eq!(Direction::between(from, GridPos::new(6, 6)), Direction::S);
        assert_eq!(Direction::between(from, GridPos::new(6, 4)), Direction::E);
        assert_eq!(Direction::between(from, GridPos::new(4, 6)), Direction::W);
        assert_eq!(Direction::between(from, GridPos::new(5, 4)), Direction::NE);
        assert_eq!(Direction::between(from, GridPos::new(4, 5)), Direction::NW);
        assert_eq!(Direction::between(from, GridPos::new(6, 5)), Direction::SE);
        assert_eq!(Direction::between(from, GridPos::new(5, 6)), Direction::SW);
    }

    #[test]
    fn normalized_zero_vector_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let unit = Vec2::new(3.0, 4.0).normalized();
        assert!((unit.length() - 1.0).abs() < 0.0001);
    }
}
