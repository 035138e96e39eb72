//! Backend-agnostic sprite input and backend-native sprite output.

/// One pixel of a decoded sprite.
///
/// `r`, `g`, `b` and `a` carry the true-colour value, `m` the palette
/// index (its "remap class"). `m == 0` means the pixel has no palette
/// index and is transparent to indexed backends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct CommonPixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub m: u8,
}

impl CommonPixel {
    pub const TRANSPARENT: CommonPixel = CommonPixel {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
        m: 0,
    };

    /// An opaque pixel carrying only a palette index.
    pub const fn indexed(m: u8) -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: if m == 0 { 0 } else { u8::MAX },
            m,
        }
    }

    /// A pixel carrying only a true-colour value.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a, m: 0 }
    }
}

/// What a sprite is used for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Normal,
    /// Font glyphs are only ever drawn at zoom level 0.
    Font,
}

impl Default for SpriteKind {
    fn default() -> Self {
        SpriteKind::Normal
    }
}

/// A decoded sprite in the canonical intermediate layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteDescriptor {
    pub width: u16,
    pub height: u16,
    pub x_offs: i16,
    pub y_offs: i16,
    pub kind: SpriteKind,
    /// Row-major pixels, `width * height` long.
    pub data: Vec<CommonPixel>,
}

impl SpriteDescriptor {
    /// # Panics
    /// Panics if `data` does not hold exactly `width * height` pixels.
    pub fn new(width: u16, height: u16, x_offs: i16, y_offs: i16, data: Vec<CommonPixel>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "sprite data does not match its dimensions"
        );
        Self {
            width,
            height,
            x_offs,
            y_offs,
            kind: SpriteKind::Normal,
            data,
        }
    }

    /// A sprite where every pixel is `pixel`.
    pub fn filled(width: u16, height: u16, pixel: CommonPixel) -> Self {
        Self::new(
            width,
            height,
            0,
            0,
            vec![pixel; width as usize * height as usize],
        )
    }

    /// A sprite built from palette indices only.
    pub fn from_indices(width: u16, height: u16, indices: &[u8]) -> Self {
        Self::new(
            width,
            height,
            0,
            0,
            indices.iter().copied().map(CommonPixel::indexed).collect(),
        )
    }

    pub fn with_offsets(mut self, x_offs: i16, y_offs: i16) -> Self {
        self.x_offs = x_offs;
        self.y_offs = y_offs;
        self
    }

    pub fn with_kind(mut self, kind: SpriteKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> CommonPixel {
        self.data[y * self.width as usize + x]
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to allocate {requested} bytes for an encoded sprite")]
pub struct AllocationError {
    pub requested: usize,
}

/// Supplies the memory of encoded sprites.
///
/// The allocator belongs to whoever owns the sprites (usually a
/// [`SpriteCache`](crate::SpriteCache)); backends only ask it for zeroed
/// buffers of a given size.
pub trait SpriteAllocator {
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, AllocationError>;
}

impl<F> SpriteAllocator for F
where
    F: FnMut(usize) -> Result<Vec<u8>, AllocationError>,
{
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, AllocationError> {
        self(size)
    }
}

/// Allocates sprite memory on the heap, reporting failure instead of aborting.
#[derive(Copy, Clone, Debug, Default)]
pub struct HeapAllocator;

impl SpriteAllocator for HeapAllocator {
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, AllocationError> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| AllocationError { requested: size })?;
        data.resize(size, 0);
        Ok(data)
    }
}

/// A sprite converted to one backend's native layout.
///
/// Only the backend named by [`encoder`](Self::encoder) may draw it.
/// Release builds do not check this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSprite {
    width: u16,
    height: u16,
    x_offs: i16,
    y_offs: i16,
    encoder: &'static str,
    data: Box<[u8]>,
}

impl EncodedSprite {
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn x_offs(&self) -> i16 {
        self.x_offs
    }

    pub fn y_offs(&self) -> i16 {
        self.y_offs
    }

    /// Name of the backend that produced this sprite.
    pub fn encoder(&self) -> &'static str {
        self.encoder
    }

    /// The backend-specific payload. Callers must not interpret it.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total memory held by the sprite payload.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Allocates an encoded sprite of `size` payload bytes through `allocator`
/// and copies the geometry of `sprite` into it.
pub fn allocate_sprite(
    sprite: &SpriteDescriptor,
    encoder: &'static str,
    allocator: &mut dyn SpriteAllocator,
    size: usize,
) -> Result<EncodedSprite, AllocationError> {
    let data = allocator.allocate(size)?;
    debug_assert_eq!(data.len(), size, "allocator returned a buffer of the wrong size");

    Ok(EncodedSprite {
        width: sprite.width,
        height: sprite.height,
        x_offs: sprite.x_offs,
        y_offs: sprite.y_offs,
        encoder,
        data: data.into_boxed_slice(),
    })
}
