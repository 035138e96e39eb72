use std::fmt::Display;

/// A power-of-two downscale between sprite resolution and
/// destination pixels.
///
/// At zoom level `N`, one destination pixel covers `2^N` source
/// pixels along each axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    /// Number of supported zoom levels.
    pub const COUNT: usize = 4;

    pub const NORMAL: ZoomLevel = ZoomLevel(0);
    pub const OUT_2X: ZoomLevel = ZoomLevel(1);
    pub const OUT_4X: ZoomLevel = ZoomLevel(2);
    pub const OUT_8X: ZoomLevel = ZoomLevel(3);

    pub const MIN: ZoomLevel = Self::NORMAL;
    pub const MAX: ZoomLevel = Self::OUT_8X;

    /// Creates a zoom level.
    ///
    /// # Panics
    /// Panics if `level >= ZoomLevel::COUNT`.
    pub const fn new(level: u8) -> Self {
        assert!((level as usize) < Self::COUNT, "zoom level out of range");
        Self(level)
    }

    /// Iterates all zoom levels from `MIN` to `MAX`.
    pub fn all() -> impl Iterator<Item = ZoomLevel> {
        (0..Self::COUNT as u8).map(ZoomLevel)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Number of source pixels covered by one destination pixel
    /// along each axis.
    pub fn step(self) -> usize {
        1 << self.0
    }

    /// Converts a destination distance to a source distance.
    pub fn scale_by_zoom(self, value: i32) -> i32 {
        value << self.0
    }

    /// Converts a source distance to a destination distance, rounding up
    /// so that anything non-empty covers at least one pixel.
    pub fn unscale_by_zoom(self, value: i32) -> i32 {
        if value >= 0 {
            (value + (1 << self.0) - 1) >> self.0
        } else {
            value >> self.0
        }
    }
}

impl Display for ZoomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.step())
    }
}
