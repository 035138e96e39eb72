//! The simple 8bpp backend: one palette index per pixel, both in
//! encoded sprites and on screen.

use crate::{
    backend::{Backend, BlitterMode, BlitterParams, PaletteAnimation},
    colour::Palette,
    rect::Rect,
    remap::RemapTable,
    sprite::{allocate_sprite, AllocationError, EncodedSprite, SpriteAllocator, SpriteDescriptor},
    surface::{self, Recolour, RenderSurface},
    zoom::ZoomLevel,
};

/// A palette-indexed backend storing sprites uncompressed.
#[derive(Debug, Default)]
pub struct IndexedBackend;

impl IndexedBackend {
    pub const NAME: &'static str = "software-8bpp";

    pub fn new() -> Self {
        Self
    }
}

/// Picks the remap table a blit mode reads on indexed pixels.
pub(crate) fn remap_for_mode<'a>(
    params: &BlitterParams<'a>,
    mode: BlitterMode,
) -> &'a RemapTable {
    match mode {
        BlitterMode::Normal | BlitterMode::BlackRemap => RemapTable::identity(),
        BlitterMode::CrashRemap => params.remap.unwrap_or_else(|| RemapTable::crash()),
        BlitterMode::Transparent => params.remap.unwrap_or_else(|| RemapTable::shadow()),
        BlitterMode::ColourRemap => params.remap_or_identity(),
    }
}

/// Combines one opaque (non-zero) source index with a destination pixel.
#[inline]
pub(crate) fn blend_index(dst: &mut u8, src: u8, mode: BlitterMode, remap: &RemapTable) {
    let colour = match mode {
        BlitterMode::Normal => src,
        BlitterMode::ColourRemap | BlitterMode::CrashRemap => remap[src],
        BlitterMode::Transparent => remap[*dst],
        BlitterMode::BlackRemap => {
            *dst = 0;
            return;
        }
    };
    if colour != RemapTable::TRANSPARENT {
        *dst = colour;
    }
}

impl Backend for IndexedBackend {
    type Surface<'a> = IndexedSurface<'a>;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn screen_depth(&self) -> u8 {
        8
    }

    fn bytes_per_pixel(&self) -> usize {
        1
    }

    fn encode(
        &self,
        sprite: &SpriteDescriptor,
        allocator: &mut dyn SpriteAllocator,
    ) -> Result<EncodedSprite, AllocationError> {
        let mut encoded = allocate_sprite(sprite, Self::NAME, allocator, sprite.data.len())?;
        for (dst, src) in encoded.data_mut().iter_mut().zip(&sprite.data) {
            *dst = src.m;
        }
        Ok(encoded)
    }

    fn draw(&self, params: BlitterParams, mode: BlitterMode, zoom: ZoomLevel) {
        debug_assert_eq!(
            params.sprite.encoder(),
            Self::NAME,
            "sprite was encoded by another backend"
        );

        let remap = remap_for_mode(&params, mode);
        let src = params.sprite.data();
        let src_width = params.sprite.width() as usize;
        let step = zoom.step();
        let pitch = params.pitch as usize;
        let origin = params.dst_origin();
        let width = params.width.max(0) as usize;

        for y in 0..params.height.max(0) as usize {
            let src_row = (params.skip_top as usize + y) * step * src_width;
            let src_row = &src[src_row..src_row + src_width];
            let dst_start = origin + y * pitch;
            let dst_row = &mut params.dst[dst_start..dst_start + width];

            for (x, dst) in dst_row.iter_mut().enumerate() {
                let index = src_row[(params.skip_left as usize + x) * step];
                if index != 0 {
                    blend_index(dst, index, mode, remap);
                }
            }
        }
    }

    fn palette_animation(&self) -> PaletteAnimation {
        PaletteAnimation::HostDriven
    }

    fn create_surface<'a>(
        &'a self,
        buf: &'a mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
    ) -> IndexedSurface<'a> {
        IndexedSurface::new(buf, width, height, pitch)
    }
}

/// A surface of one palette index per pixel.
///
/// Shared by all indexed backends.
pub struct IndexedSurface<'a> {
    buf: &'a mut [u8],
    width: u32,
    height: u32,
    pitch: u32,
}

impl<'a> IndexedSurface<'a> {
    pub fn new(buf: &'a mut [u8], width: u32, height: u32, pitch: u32) -> Self {
        debug_assert!(pitch >= width, "pitch is smaller than the width");
        debug_assert!(
            buf.len() >= pitch as usize * height as usize,
            "buffer is too small for the surface"
        );
        Self {
            buf,
            width,
            height,
            pitch,
        }
    }
}

impl RenderSurface for IndexedSurface<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pitch(&self) -> u32 {
        self.pitch
    }

    fn set_pixel(&mut self, video: usize, x: i32, y: i32, colour: u8) {
        let offset = self.move_to(video, x, y);
        self.buf[offset] = colour;
    }

    fn draw_rect(&mut self, video: usize, width: i32, height: i32, colour: u8) {
        surface::fill_region(self.buf, self.pitch as usize, video, width, height, colour);
    }

    fn recolour_rect(&mut self, video: usize, width: i32, height: i32, recolour: Recolour) {
        let table = recolour.table();
        surface::map_region(self.buf, self.pitch as usize, video, width, height, |index| {
            table[index]
        });
    }

    fn scroll(&mut self, video: usize, region: &mut Rect, scroll_x: i32, scroll_y: i32) {
        surface::scroll_region(self.buf, self.pitch as usize, video, region, scroll_x, scroll_y);
    }

    /// The presenter owns the palette, so any change means the whole
    /// screen has to be shown again.
    fn palette_animate(&mut self, palette: &Palette) -> bool {
        palette.is_dirty()
    }

    fn copy(&self, dst: &mut [u8], x: i32, y: i32, width: i32, height: i32) {
        surface::copy_region(self.buf, self.pitch as usize, dst, x, y, width, height);
    }

    fn paste(&mut self, src: &[u8], x: i32, y: i32, width: i32, height: i32) {
        surface::paste_region(self.buf, self.pitch as usize, src, x, y, width, height);
    }

    fn export_lines(&self, dst: &mut [u8], dst_pitch: usize, y: u32, height: u32) {
        let width = self.width as usize;
        for row in 0..height as usize {
            let src = (y as usize + row) * self.pitch as usize;
            dst[row * dst_pitch..row * dst_pitch + width]
                .copy_from_slice(&self.buf[src..src + width]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{remap::COMPANY_COLOUR_START, sprite::HeapAllocator, surface::RenderSurface};

    fn encode(sprite: &SpriteDescriptor) -> EncodedSprite {
        IndexedBackend.encode(sprite, &mut HeapAllocator).unwrap()
    }

    #[test]
    fn filled_sprite_lands_at_offset() {
        let sprite = encode(&SpriteDescriptor::filled(8, 8, crate::CommonPixel::indexed(5)));
        let mut screen = vec![0u8; 16 * 16];
        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 4, 4, &mut screen, 16),
            BlitterMode::Normal,
            ZoomLevel::NORMAL,
        );

        for y in 0..16 {
            for x in 0..16 {
                let expected = if (4..12).contains(&x) && (4..12).contains(&y) { 5 } else { 0 };
                assert_eq!(screen[y * 16 + x], expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let sprite = encode(&SpriteDescriptor::from_indices(2, 1, &[0, 9]));
        let mut screen = vec![3u8; 2];
        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 0, 0, &mut screen, 2),
            BlitterMode::Normal,
            ZoomLevel::NORMAL,
        );
        assert_eq!(screen, [3, 9]);
    }

    #[test]
    fn remap_sentinel_skips_pixel() {
        let sprite = encode(&SpriteDescriptor::from_indices(3, 1, &[1, 2, 3]));
        let mut remap = RemapTable::identity().clone();
        remap.set(1, 40);
        remap.set(2, RemapTable::TRANSPARENT);

        let mut screen = vec![7u8; 3];
        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 0, 0, &mut screen, 3)
                .with_remap(&remap),
            BlitterMode::ColourRemap,
            ZoomLevel::NORMAL,
        );
        assert_eq!(screen, [40, 7, 3]);
    }

    #[test]
    fn transparent_mode_remaps_destination() {
        let sprite = encode(&SpriteDescriptor::from_indices(2, 1, &[0, 100]));
        let mut darken = RemapTable::identity().clone();
        darken.set(50, 20);

        let mut screen = vec![50u8; 2];
        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 0, 0, &mut screen, 2)
                .with_remap(&darken),
            BlitterMode::Transparent,
            ZoomLevel::NORMAL,
        );
        assert_eq!(screen, [50, 20]);
    }

    #[test]
    fn transparent_mode_without_table_darkens() {
        let sprite = encode(&SpriteDescriptor::from_indices(2, 1, &[0, 9]));
        let mut screen = vec![15u8; 2];
        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 0, 0, &mut screen, 2),
            BlitterMode::Transparent,
            ZoomLevel::NORMAL,
        );

        let shadow = RemapTable::shadow();
        assert_ne!(shadow[15], 15);
        assert_eq!(screen, [15, shadow[15]]);
        let palette = Palette::default();
        assert!(palette.get(screen[1]).red() < palette.get(15).red());
    }

    #[test]
    fn crash_and_black_modes() {
        let sprite = encode(&SpriteDescriptor::from_indices(2, 1, &[COMPANY_COLOUR_START, 77]));

        let mut screen = vec![9u8; 2];
        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 0, 0, &mut screen, 2),
            BlitterMode::CrashRemap,
            ZoomLevel::NORMAL,
        );
        assert_eq!(screen, [RemapTable::crash()[COMPANY_COLOUR_START], 77]);

        IndexedBackend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 0, 0, &mut screen, 2),
            BlitterMode::BlackRemap,
            ZoomLevel::NORMAL,
        );
        assert_eq!(screen, [0, 0]);
    }

    #[test]
    fn skip_clips_top_left() {
        let indices: Vec<u8> = (1..=16).collect();
        let sprite = encode(&SpriteDescriptor::from_indices(4, 4, &indices));
        let mut screen = vec![0u8; 4];
        IndexedBackend.draw(
            BlitterParams {
                sprite: &sprite,
                remap: None,
                skip_left: 1,
                skip_top: 2,
                width: 2,
                height: 2,
                left: 0,
                top: 0,
                dst: &mut screen,
                pitch: 2,
            },
            BlitterMode::Normal,
            ZoomLevel::NORMAL,
        );
        assert_eq!(screen, [10, 11, 14, 15]);
    }

    #[test]
    fn surface_primitives() {
        let mut buf = vec![0u8; 8 * 4];
        let backend = IndexedBackend;
        let mut surface = backend.create_surface(&mut buf, 8, 4, 8);

        let video = surface.move_to(0, 2, 1);
        assert_eq!(video, 10);
        surface.draw_rect(video, 3, 2, 6);
        surface.set_pixel(0, 7, 3, 1);

        let mut remap = RemapTable::identity().clone();
        remap.set(6, 60);
        surface.recolour_rect(video, 1, 2, Recolour::Table(&remap));

        let mut exported = vec![0u8; 8 * 4];
        surface.export_lines(&mut exported, 8, 0, 4);
        assert_eq!(&exported[8..16], &[0, 0, 60, 6, 6, 0, 0, 0]);
        assert_eq!(&exported[16..24], &[0, 0, 60, 6, 6, 0, 0, 0]);
        assert_eq!(exported[31], 1);
    }

    #[test]
    fn palette_animation_requests_present_when_dirty() {
        let mut buf = vec![0u8; 4];
        let backend = IndexedBackend;
        let mut surface = backend.create_surface(&mut buf, 2, 2, 2);

        let mut palette = Palette::default();
        assert!(!surface.palette_animate(&palette));
        palette.set(3, crate::Colour::rgb(1, 1, 1));
        assert!(surface.palette_animate(&palette));
        assert_eq!(backend.palette_animation(), PaletteAnimation::HostDriven);
    }
}
