//! The 32bpp backend: ARGB pixels on screen, palette indices kept
//! alongside the colour in sprites so they can still be remapped.

use bytemuck::{Pod, Zeroable};

use crate::{
    backend::{Backend, BlitterMode, BlitterParams, PaletteAnimation},
    colour::{
        adjust_brightness, compose_pa, compose_rgba, make_dark, make_grey, make_transparent,
        Colour, Palette, DEFAULT_BRIGHTNESS,
    },
    rect::Rect,
    remap::RemapTable,
    sprite::{allocate_sprite, AllocationError, EncodedSprite, SpriteAllocator, SpriteDescriptor},
    surface::{self, Recolour, RenderSurface},
    zoom::ZoomLevel,
};

/// Darkening applied under sprites drawn with [`BlitterMode::Transparent`].
const TRANSPARENT_SPRITE_NOM: u32 = 192;
/// Darkening applied by [`Recolour::Transparent`].
const TRANSPARENT_RECT_NOM: u32 = 154;

/// A screen pixel as stored in the caller's buffer: a native-endian
/// [`Colour`] with no alignment requirement.
type ScreenPixel = [u8; 4];

#[inline]
fn load(pixel: ScreenPixel) -> Colour {
    Colour::from_argb(u32::from_ne_bytes(pixel))
}

#[inline]
fn store(colour: Colour) -> ScreenPixel {
    colour.argb().to_ne_bytes()
}

/// Views a byte buffer as screen pixels. Trailing bytes that do not make
/// up a whole pixel are left out.
fn screen_pixels(buf: &mut [u8]) -> &mut [ScreenPixel] {
    let len = buf.len() - buf.len() % 4;
    bytemuck::cast_slice_mut(&mut buf[..len])
}

/// One encoded sprite pixel.
///
/// `v` is the brightness a remapped index is drawn with; zero when the
/// pixel carries no index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct Pixel {
    r: u8,
    g: u8,
    b: u8,
    m: u8,
    a: u8,
    v: u8,
}

/// A true-colour backend storing sprites uncompressed.
#[derive(Debug, Default)]
pub struct TrueColourBackend {
    palette: Palette,
}

impl TrueColourBackend {
    pub const NAME: &'static str = "software-32bpp";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    fn remapped(&self, index: u8, brightness: u8) -> Colour {
        adjust_brightness(self.palette.get(index), brightness)
    }

    /// The colour `px` leaves on top of `under`, or `None` when the
    /// pixel is not written.
    #[inline]
    fn blend(
        &self,
        px: Pixel,
        under: Colour,
        mode: BlitterMode,
        remap: &RemapTable,
    ) -> Option<Colour> {
        match mode {
            BlitterMode::Normal => Some(compose_rgba(px.r, px.g, px.b, px.a, under)),
            BlitterMode::ColourRemap | BlitterMode::CrashRemap if px.m != 0 => {
                let index = remap[px.m];
                (index != RemapTable::TRANSPARENT)
                    .then(|| compose_pa(self.remapped(index, px.v), px.a, under))
            }
            BlitterMode::ColourRemap => Some(compose_rgba(px.r, px.g, px.b, px.a, under)),
            BlitterMode::CrashRemap => {
                let grey = make_dark(px.r, px.g, px.b);
                Some(compose_rgba(grey, grey, grey, px.a, under))
            }
            BlitterMode::BlackRemap => (px.a != 0).then(|| Colour::BLACK),
            BlitterMode::Transparent => {
                (px.a != 0).then(|| make_transparent(under, TRANSPARENT_SPRITE_NOM))
            }
        }
    }
}

impl Backend for TrueColourBackend {
    type Surface<'a> = TrueColourSurface<'a>;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn screen_depth(&self) -> u8 {
        32
    }

    fn bytes_per_pixel(&self) -> usize {
        4
    }

    fn encode(
        &self,
        sprite: &SpriteDescriptor,
        allocator: &mut dyn SpriteAllocator,
    ) -> Result<EncodedSprite, AllocationError> {
        let size = sprite.data.len() * std::mem::size_of::<Pixel>();
        let mut encoded = allocate_sprite(sprite, Self::NAME, allocator, size)?;
        let pixels: &mut [Pixel] = bytemuck::cast_slice_mut(encoded.data_mut());

        for (dst, src) in pixels.iter_mut().zip(&sprite.data) {
            *dst = if src.m != 0 {
                // the colour channels only carry the brightness of an
                // indexed pixel
                let mut brightness = src.r.max(src.g).max(src.b);
                if brightness == 0 {
                    brightness = DEFAULT_BRIGHTNESS;
                }
                let colour = self.remapped(src.m, brightness);
                Pixel {
                    r: colour.red(),
                    g: colour.green(),
                    b: colour.blue(),
                    m: src.m,
                    a: src.a,
                    v: brightness,
                }
            } else {
                Pixel {
                    r: src.r,
                    g: src.g,
                    b: src.b,
                    m: 0,
                    a: src.a,
                    v: 0,
                }
            };
        }
        Ok(encoded)
    }

    fn draw(&self, params: BlitterParams, mode: BlitterMode, zoom: ZoomLevel) {
        debug_assert_eq!(
            params.sprite.encoder(),
            Self::NAME,
            "sprite was encoded by another backend"
        );

        let remap = match mode {
            BlitterMode::CrashRemap => params.remap.unwrap_or_else(|| RemapTable::crash()),
            BlitterMode::ColourRemap => params.remap_or_identity(),
            _ => RemapTable::identity(),
        };
        let src: &[Pixel] = bytemuck::cast_slice(params.sprite.data());
        let src_width = params.sprite.width() as usize;
        let step = zoom.step();
        let pitch = params.pitch as usize;
        let origin = params.dst_origin();
        let (skip_left, skip_top) = (params.skip_left as usize, params.skip_top as usize);
        let width = params.width.max(0) as usize;
        let height = params.height.max(0) as usize;
        let dst = screen_pixels(params.dst);

        for y in 0..height {
            let src_row = &src[(skip_top + y) * step * src_width..][..src_width];
            let dst_row = &mut dst[origin + y * pitch..][..width];

            for (x, dst) in dst_row.iter_mut().enumerate() {
                let px = src_row[(skip_left + x) * step];
                if let Some(colour) = self.blend(px, load(*dst), mode, remap) {
                    *dst = store(colour);
                }
            }
        }
    }

    fn palette_animation(&self) -> PaletteAnimation {
        PaletteAnimation::None
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette = palette.clone();
        self.palette.clear_dirty();
    }

    fn create_surface<'a>(
        &'a self,
        buf: &'a mut [u8],
        width: u32,
        height: u32,
        pitch: u32,
    ) -> TrueColourSurface<'a> {
        TrueColourSurface::new(buf, &self.palette, width, height, pitch)
    }
}

/// A surface of native-endian ARGB pixels over a byte buffer of any
/// alignment. Palette indices passed to the drawing primitives are
/// resolved through the backend's palette.
pub struct TrueColourSurface<'a> {
    buf: &'a mut [ScreenPixel],
    palette: &'a Palette,
    width: u32,
    height: u32,
    pitch: u32,
}

impl<'a> TrueColourSurface<'a> {
    pub fn new(
        buf: &'a mut [u8],
        palette: &'a Palette,
        width: u32,
        height: u32,
        pitch: u32,
    ) -> Self {
        debug_assert!(pitch >= width, "pitch is smaller than the width");
        let buf = screen_pixels(buf);
        debug_assert!(
            buf.len() >= pitch as usize * height as usize,
            "buffer is too small for the surface"
        );
        Self {
            buf,
            palette,
            width,
            height,
            pitch,
        }
    }
}

impl RenderSurface for TrueColourSurface<'_> {
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
        self.buf[offset] = store(self.palette.get(colour));
    }

    fn draw_rect(&mut self, video: usize, width: i32, height: i32, colour: u8) {
        let colour = store(self.palette.get(colour));
        surface::fill_region(self.buf, self.pitch as usize, video, width, height, colour);
    }

    fn recolour_rect(&mut self, video: usize, width: i32, height: i32, recolour: Recolour) {
        let pitch = self.pitch as usize;
        match recolour {
            Recolour::Transparent(_) => {
                surface::map_region(self.buf, pitch, video, width, height, |px| {
                    store(make_transparent(load(px), TRANSPARENT_RECT_NOM))
                })
            }
            Recolour::Greyscale(_) => {
                surface::map_region(self.buf, pitch, video, width, height, |px| {
                    store(make_grey(load(px)))
                })
            }
            Recolour::Table(_) => {
                log::warn!(
                    "{} cannot recolour through an arbitrary remap table",
                    TrueColourBackend::NAME
                );
            }
        }
    }

    fn scroll(&mut self, video: usize, region: &mut Rect, scroll_x: i32, scroll_y: i32) {
        surface::scroll_region(self.buf, self.pitch as usize, video, region, scroll_x, scroll_y);
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
            let src = &self.buf[(y as usize + row) * self.pitch as usize..][..width];
            let out = &mut dst[row * dst_pitch..][..width * 4];
            for (out, &px) in out.chunks_exact_mut(4).zip(src) {
                let colour = load(px);
                out.copy_from_slice(&[colour.red(), colour.green(), colour.blue(), u8::MAX]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sprite::HeapAllocator, CommonPixel};

    fn draw_one(
        backend: &TrueColourBackend,
        pixel: CommonPixel,
        under: Colour,
        mode: BlitterMode,
    ) -> Colour {
        draw_one_remapped(backend, pixel, under, mode, None)
    }

    fn draw_one_remapped(
        backend: &TrueColourBackend,
        pixel: CommonPixel,
        under: Colour,
        mode: BlitterMode,
        remap: Option<&RemapTable>,
    ) -> Colour {
        let sprite = backend
            .encode(&SpriteDescriptor::filled(1, 1, pixel), &mut HeapAllocator)
            .unwrap();
        let mut screen = [under];
        let mut params = BlitterParams::whole(
            &sprite,
            ZoomLevel::NORMAL,
            0,
            0,
            bytemuck::cast_slice_mut(&mut screen),
            1,
        );
        params.remap = remap;
        backend.draw(params, mode, ZoomLevel::NORMAL);
        screen[0]
    }

    #[test]
    fn normal_mode_blends_alpha() {
        let backend = TrueColourBackend::new();
        let under = Colour::rgb(0, 0, 200);

        let red = |alpha| {
            let pixel = CommonPixel::rgba(255, 0, 0, alpha);
            draw_one(&backend, pixel, under, BlitterMode::Normal)
        };
        assert_eq!(red(255), Colour::rgb(255, 0, 0));
        assert_eq!(red(0), under);
        assert_eq!(red(128), Colour::rgb(127, 0, 100));
    }

    #[test]
    fn indexed_pixels_take_palette_colour() {
        let backend = TrueColourBackend::new();
        let pixel = CommonPixel::indexed(20);
        let drawn = draw_one(&backend, pixel, Colour::BLACK, BlitterMode::Normal);
        assert_eq!(drawn, backend.palette().get(20));
    }

    #[test]
    fn colour_remap_uses_palette_and_brightness() {
        let backend = TrueColourBackend::new();
        let mut remap = RemapTable::identity().clone();
        remap.set(20, 30);
        remap.set(21, RemapTable::TRANSPARENT);

        let drawn = draw_one_remapped(
            &backend,
            CommonPixel::indexed(20),
            Colour::BLACK,
            BlitterMode::ColourRemap,
            Some(&remap),
        );
        assert_eq!(drawn, backend.palette().get(30));

        let under = Colour::rgb(1, 2, 3);
        let skipped = draw_one_remapped(
            &backend,
            CommonPixel::indexed(21),
            under,
            BlitterMode::ColourRemap,
            Some(&remap),
        );
        assert_eq!(skipped, under);

        // a brightness of 64 halves the looked-up colour
        let dim = CommonPixel { r: 64, ..CommonPixel::indexed(20) };
        let drawn =
            draw_one_remapped(&backend, dim, Colour::BLACK, BlitterMode::ColourRemap, Some(&remap));
        let full = backend.palette().get(30);
        assert_eq!(drawn, Colour::rgb(full.red() / 2, full.green() / 2, full.blue() / 2));
    }

    #[test]
    fn crash_mode_darkens_plain_colours() {
        let backend = TrueColourBackend::new();
        let drawn = draw_one(
            &backend,
            CommonPixel::rgba(100, 100, 100, 255),
            Colour::WHITE,
            BlitterMode::CrashRemap,
        );
        assert_eq!(drawn, Colour::rgb(16, 16, 16));
    }

    #[test]
    fn transparent_and_black_modes() {
        let backend = TrueColourBackend::new();
        let under = Colour::rgb(200, 100, 0);
        let pixel = CommonPixel::rgba(9, 9, 9, 255);

        assert_eq!(
            draw_one(&backend, pixel, under, BlitterMode::Transparent),
            Colour::rgb(150, 75, 0)
        );
        assert_eq!(draw_one(&backend, pixel, under, BlitterMode::BlackRemap), Colour::BLACK);
        assert_eq!(
            draw_one(&backend, CommonPixel::TRANSPARENT, under, BlitterMode::BlackRemap),
            under
        );
    }

    #[test]
    fn zoomed_draw_samples_every_step() {
        let backend = TrueColourBackend::new();
        let pixels = (0..16)
            .map(|i| CommonPixel::rgba(i as u8, 0, 0, 255))
            .collect();
        let sprite = backend
            .encode(&SpriteDescriptor::new(4, 4, 0, 0, pixels), &mut HeapAllocator)
            .unwrap();

        let mut screen = [Colour::TRANSPARENT; 4];
        backend.draw(
            BlitterParams::whole(
                &sprite,
                ZoomLevel::OUT_2X,
                0,
                0,
                bytemuck::cast_slice_mut(&mut screen),
                2,
            ),
            BlitterMode::Normal,
            ZoomLevel::OUT_2X,
        );
        let reds: Vec<u8> = screen.iter().map(|c| c.red()).collect();
        assert_eq!(reds, [0, 2, 8, 10]);
    }

    #[test]
    fn surface_resolves_palette_indices() {
        let backend = TrueColourBackend::new();
        let mut screen = vec![Colour::BLACK; 4 * 2];
        let mut surface = backend.create_surface(bytemuck::cast_slice_mut(&mut screen), 4, 2, 4);

        surface.draw_rect(1, 2, 2, 40);
        surface.set_pixel(0, 3, 1, 15);

        let mut rgba = vec![0u8; 4 * 2 * 4];
        surface.export_lines(&mut rgba, 16, 0, 2);
        let expected = backend.palette().get(40);
        assert_eq!(&rgba[4..8], &[expected.red(), expected.green(), expected.blue(), 255]);
        assert_eq!(&rgba[28..32], &[255, 255, 255, 255]);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn recolour_rect_modes() {
        let backend = TrueColourBackend::new();
        let palette = Palette::default();
        let table = RemapTable::transparent(&palette);
        let mut screen = vec![Colour::rgb(200, 100, 50); 3];
        let mut surface = backend.create_surface(bytemuck::cast_slice_mut(&mut screen), 3, 1, 3);

        surface.recolour_rect(0, 1, 1, Recolour::Transparent(&table));
        surface.recolour_rect(1, 1, 1, Recolour::Greyscale(&table));
        surface.recolour_rect(2, 1, 1, Recolour::Table(&table));
        drop(surface);

        assert_eq!(screen[0], Colour::rgb(120, 60, 30));
        assert_eq!(screen[1], make_grey(Colour::rgb(200, 100, 50)));
        assert_eq!(screen[2], Colour::rgb(200, 100, 50));
    }

    #[test]
    fn set_palette_affects_later_encodes() {
        let mut backend = TrueColourBackend::new();
        let mut palette = Palette::default();
        palette.set(20, Colour::rgb(1, 2, 3));
        backend.set_palette(&palette);

        let pixel = CommonPixel::indexed(20);
        let drawn = draw_one(&backend, pixel, Colour::BLACK, BlitterMode::Normal);
        assert_eq!(drawn, Colour::rgb(1, 2, 3));
        assert_eq!(backend.palette_animation(), PaletteAnimation::None);
    }

    #[test]
    fn draws_into_unaligned_buffer() {
        let backend = TrueColourBackend::new();
        let sprite = backend
            .encode(
                &SpriteDescriptor::filled(2, 2, CommonPixel::rgba(10, 20, 30, 255)),
                &mut HeapAllocator,
            )
            .unwrap();

        let mut aligned = vec![0u8; backend.buffer_size(3, 3)];
        backend.draw(
            BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 1, 1, &mut aligned, 3),
            BlitterMode::Normal,
            ZoomLevel::NORMAL,
        );

        for offset in 1..4 {
            let mut storage = vec![0u8; backend.buffer_size(3, 3) + offset];
            let shifted = &mut storage[offset..];
            backend.draw(
                BlitterParams::whole(&sprite, ZoomLevel::NORMAL, 1, 1, shifted, 3),
                BlitterMode::Normal,
                ZoomLevel::NORMAL,
            );
            assert_eq!(&storage[offset..], &aligned[..], "offset {}", offset);
        }
    }

    #[test]
    fn surface_over_unaligned_buffer() {
        let backend = TrueColourBackend::new();
        let mut storage = vec![0u8; 4 * 2 * 2 + 1];
        let mut surface = backend.create_surface(&mut storage[1..], 2, 2, 2);

        surface.draw_rect(0, 2, 1, 15);
        surface.set_pixel(0, 1, 1, 40);
        surface.recolour_rect(0, 1, 1, Recolour::Greyscale(RemapTable::identity()));
        let mut region = vec![0u8; 4 * 2];
        surface.copy(&mut region, 0, 0, 2, 1);
        surface.paste(&region, 0, 1, 1, 1);

        let mut rgba = vec![0u8; 4 * 2 * 2];
        surface.export_lines(&mut rgba, 8, 0, 2);
        let red = backend.palette().get(40);
        assert_eq!(&rgba[0..8], &[255, 255, 255, 255, 255, 255, 255, 255]);
        assert_eq!(&rgba[8..12], &[255, 255, 255, 255]);
        assert_eq!(&rgba[12..16], &[red.red(), red.green(), red.blue(), 255]);
    }
}
