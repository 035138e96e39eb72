use glam::{ivec2, IVec2};

/// An integer rectangle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Rect {
    /// The position of the top-left corner
    /// of this rectangle.
    pub pos: IVec2,
    /// The side lengths of this rectangle.
    pub size: IVec2,
}

impl Rect {
    pub fn new(pos: IVec2, size: IVec2) -> Self {
        Self { pos, size }
    }

    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(ivec2(x, y), ivec2(width, height))
    }

    pub fn left(self) -> i32 {
        self.pos.x
    }

    pub fn top(self) -> i32 {
        self.pos.y
    }

    pub fn width(self) -> i32 {
        self.size.x
    }

    pub fn height(self) -> i32 {
        self.size.y
    }

    pub fn offset(self, offset: IVec2) -> Self {
        Self {
            pos: self.pos + offset,
            size: self.size,
        }
    }

    pub fn is_empty(self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    pub fn contains(self, pos: IVec2) -> bool {
        pos.x >= self.pos.x
            && pos.y >= self.pos.y
            && pos.x < (self.pos.x + self.size.x)
            && pos.y < (self.pos.y + self.size.y)
    }
}
