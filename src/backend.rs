use std::any::Any;

use crate::{
    colour::Palette,
    remap::RemapTable,
    sprite::{AllocationError, EncodedSprite, SpriteAllocator, SpriteDescriptor},
    surface::RenderSurface,
    zoom::ZoomLevel,
};

pub mod indexed;
pub mod indexed_rle;
pub mod true_colour;

/// The pixel-combination rule applied by [`Backend::draw`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlitterMode {
    /// Copy source pixels, respecting transparency.
    Normal,
    /// Remap palette indices through the request's remap table.
    ColourRemap,
    /// Darken the destination wherever the sprite is opaque.
    Transparent,
    /// Remap for crashed vehicles; plain colours turn grey.
    CrashRemap,
    /// Draw the sprite's silhouette in black.
    BlackRemap,
}

/// Who repaints pixels whose palette entry changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaletteAnimation {
    /// Palette animation is not supported.
    None,
    /// The presenter applies the palette when showing the buffer.
    HostDriven,
    /// The backend redraws animated pixels itself.
    BackendDriven,
}

/// One draw call: which part of a sprite goes where.
///
/// `skip_left`, `skip_top`, `width` and `height` are measured in
/// destination pixels, i.e. already divided by the zoom step.
pub struct BlitterParams<'a> {
    /// The sprite, as encoded by the backend that draws it.
    pub sprite: &'a EncodedSprite,
    /// Table for the remapping blit modes.
    pub remap: Option<&'a RemapTable>,

    pub skip_left: i32,
    pub skip_top: i32,
    pub width: i32,
    pub height: i32,
    /// Destination column of the first drawn pixel.
    pub left: i32,
    /// Destination row of the first drawn pixel.
    pub top: i32,

    /// The destination buffer, in the backend's pixel layout.
    pub dst: &'a mut [u8],
    /// Row pitch of `dst` in pixels.
    pub pitch: u32,
}

impl<'a> BlitterParams<'a> {
    /// Draws the whole sprite at `zoom` with its top-left pixel at
    /// `(left, top)`.
    pub fn whole(
        sprite: &'a EncodedSprite,
        zoom: ZoomLevel,
        left: i32,
        top: i32,
        dst: &'a mut [u8],
        pitch: u32,
    ) -> Self {
        Self {
            sprite,
            remap: None,
            skip_left: 0,
            skip_top: 0,
            width: zoom.unscale_by_zoom(sprite.width() as i32),
            height: zoom.unscale_by_zoom(sprite.height() as i32),
            left,
            top,
            dst,
            pitch,
        }
    }

    pub fn with_remap(mut self, remap: &'a RemapTable) -> Self {
        self.remap = Some(remap);
        self
    }

    /// Pixel offset of the first destination pixel.
    pub(crate) fn dst_origin(&self) -> usize {
        self.top as usize * self.pitch as usize + self.left as usize
    }

    /// The remap table, or the identity table if the caller supplied none.
    pub(crate) fn remap_or_identity(&self) -> &'a RemapTable {
        debug_assert!(self.remap.is_some(), "remapping blit without a remap table");
        self.remap.unwrap_or_else(|| RemapTable::identity())
    }
}

/// A pixel-format-specific implementation of the blitting contract.
pub trait Backend: 'static {
    type Surface<'a>: RenderSurface + 'a
    where
        Self: 'a;

    /// The name this backend is registered under.
    fn name(&self) -> &'static str;

    /// Bits per pixel of the screen this backend draws to.
    fn screen_depth(&self) -> u8;

    fn bytes_per_pixel(&self) -> usize;

    /// Bytes needed for a `width` x `height` buffer of this backend.
    fn buffer_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }

    /// Converts a sprite to this backend's native layout, allocating
    /// its memory through `allocator`.
    fn encode(
        &self,
        sprite: &SpriteDescriptor,
        allocator: &mut dyn SpriteAllocator,
    ) -> Result<EncodedSprite, AllocationError>;

    /// Draws `params.sprite` into `params.dst`.
    ///
    /// The sprite must have been encoded by this backend and the
    /// request must lie within the sprite and the buffer.
    ///
    /// # Panics
    /// Panics if the request addresses pixels outside `params.dst`.
    fn draw(&self, params: BlitterParams, mode: BlitterMode, zoom: ZoomLevel);

    fn palette_animation(&self) -> PaletteAnimation;

    /// Informs the backend of the palette in use.
    fn set_palette(&mut self, _palette: &Palette) {}

    /// Wraps a caller-owned buffer in this backend's surface.
    fn create_surface<'a>(
        &'a self,
        buf: &'a mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
    ) -> Self::Surface<'a>;
}

/// Type-erased version of `Backend`.
pub trait ErasedBackend: 'static {
    fn name(&self) -> &'static str;

    fn screen_depth(&self) -> u8;

    fn bytes_per_pixel(&self) -> usize;

    fn buffer_size(&self, width: u32, height: u32) -> usize;

    fn encode(
        &self,
        sprite: &SpriteDescriptor,
        allocator: &mut dyn SpriteAllocator,
    ) -> Result<EncodedSprite, AllocationError>;

    fn draw(&self, params: BlitterParams, mode: BlitterMode, zoom: ZoomLevel);

    fn palette_animation(&self) -> PaletteAnimation;

    fn set_palette(&mut self, palette: &Palette);

    fn create_surface<'a>(
        &'a self,
        buf: &'a mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
    ) -> Box<dyn RenderSurface + 'a>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> ErasedBackend for T
where
    T: Backend,
{
    fn name(&self) -> &'static str {
        <T as Backend>::name(self)
    }

    fn screen_depth(&self) -> u8 {
        <T as Backend>::screen_depth(self)
    }

    fn bytes_per_pixel(&self) -> usize {
        <T as Backend>::bytes_per_pixel(self)
    }

    fn buffer_size(&self, width: u32, height: u32) -> usize {
        <T as Backend>::buffer_size(self, width, height)
    }

    fn encode(
        &self,
        sprite: &SpriteDescriptor,
        allocator: &mut dyn SpriteAllocator,
    ) -> Result<EncodedSprite, AllocationError> {
        <T as Backend>::encode(self, sprite, allocator)
    }

    fn draw(&self, params: BlitterParams, mode: BlitterMode, zoom: ZoomLevel) {
        <T as Backend>::draw(self, params, mode, zoom)
    }

    fn palette_animation(&self) -> PaletteAnimation {
        <T as Backend>::palette_animation(self)
    }

    fn set_palette(&mut self, palette: &Palette) {
        <T as Backend>::set_palette(self, palette)
    }

    fn create_surface<'a>(
        &'a self,
        buf: &'a mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
    ) -> Box<dyn RenderSurface + 'a> {
        let surface = <T as Backend>::create_surface(self, buf, width, height, pitch);
        Box::new(surface)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
