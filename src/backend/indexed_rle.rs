//! The optimized 8bpp backend.
//!
//! Sprites are pre-scaled to every zoom level and stored run-length
//! encoded, so drawing skips transparent spans without looking at them.
//!
//! Layout of the payload:
//! * a header of [`ZoomLevel::COUNT`] little-endian `u32`s holding the
//!   byte offset of each zoom level's rows;
//! * per zoom level, per row, a sequence of runs `[transparent, count,
//!   index * count]`, ending with the pair `[0, 0]`.

use crate::{
    backend::{
        indexed::{blend_index, remap_for_mode, IndexedSurface},
        Backend, BlitterMode, BlitterParams, PaletteAnimation,
    },
    sprite::{
        allocate_sprite, AllocationError, EncodedSprite, SpriteAllocator, SpriteDescriptor,
        SpriteKind,
    },
    zoom::ZoomLevel,
};

const HEADER_SIZE: usize = ZoomLevel::COUNT * 4;

/// A palette-indexed backend storing sprites as run-length encoded spans.
#[derive(Debug, Default)]
pub struct IndexedRleBackend;

impl IndexedRleBackend {
    pub const NAME: &'static str = "software-8bpp-optimized";

    pub fn new() -> Self {
        Self
    }
}

/// Appends the rows of `sprite` sampled at `zoom`.
fn encode_level(sprite: &SpriteDescriptor, zoom: ZoomLevel, out: &mut Vec<u8>) {
    let step = zoom.step();
    let width = zoom.unscale_by_zoom(sprite.width as i32) as usize;
    let height = zoom.unscale_by_zoom(sprite.height as i32) as usize;

    let mut row = Vec::with_capacity(width);
    for y in 0..height {
        row.clear();
        row.extend((0..width).map(|x| sprite.pixel(x * step, y * step).m));
        encode_row(&row, out);
    }
}

fn encode_row(row: &[u8], out: &mut Vec<u8>) {
    let mut x = 0;
    while x < row.len() {
        let transparent = row[x..].iter().take_while(|&&m| m == 0).count();
        x += transparent;
        if x == row.len() {
            break;
        }

        let mut transparent = transparent;
        while transparent > u8::MAX as usize {
            out.extend_from_slice(&[u8::MAX, 0]);
            transparent -= u8::MAX as usize;
        }

        let opaque = row[x..]
            .iter()
            .take(u8::MAX as usize)
            .take_while(|&&m| m != 0)
            .count();
        out.push(transparent as u8);
        out.push(opaque as u8);
        out.extend_from_slice(&row[x..x + opaque]);
        x += opaque;
    }
    out.extend_from_slice(&[0, 0]);
}

/// Skips `rows` rows of runs starting at `pos`, returning the new position.
fn skip_rows(data: &[u8], mut pos: usize, rows: usize) -> usize {
    for _ in 0..rows {
        loop {
            let (transparent, count) = (data[pos], data[pos + 1]);
            pos += 2 + count as usize;
            if transparent == 0 && count == 0 {
                break;
            }
        }
    }
    pos
}

fn level_offset(data: &[u8], zoom: ZoomLevel) -> usize {
    let at = zoom.index() * 4;
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) as usize
}

impl Backend for IndexedRleBackend {
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
        let mut body = Vec::new();
        let mut offsets = [0u32; ZoomLevel::COUNT];

        for zoom in ZoomLevel::all() {
            // fonts are never drawn zoomed out
            if sprite.kind == SpriteKind::Font && zoom != ZoomLevel::NORMAL {
                offsets[zoom.index()] = offsets[ZoomLevel::NORMAL.index()];
                continue;
            }
            offsets[zoom.index()] = (HEADER_SIZE + body.len()) as u32;
            encode_level(sprite, zoom, &mut body);
        }

        let mut encoded = allocate_sprite(sprite, Self::NAME, allocator, HEADER_SIZE + body.len())?;
        let data = encoded.data_mut();
        for (chunk, offset) in data[..HEADER_SIZE].chunks_exact_mut(4).zip(offsets) {
            chunk.copy_from_slice(&offset.to_le_bytes());
        }
        data[HEADER_SIZE..].copy_from_slice(&body);
        Ok(encoded)
    }

    fn draw(&self, params: BlitterParams, mode: BlitterMode, zoom: ZoomLevel) {
        debug_assert_eq!(
            params.sprite.encoder(),
            Self::NAME,
            "sprite was encoded by another backend"
        );

        let remap = remap_for_mode(&params, mode);
        let data = params.sprite.data();
        let pitch = params.pitch as usize;
        let origin = params.dst_origin();
        let left = params.skip_left.max(0) as usize;
        let right = left + params.width.max(0) as usize;

        let mut pos = skip_rows(data, level_offset(data, zoom), params.skip_top.max(0) as usize);

        for y in 0..params.height.max(0) as usize {
            let dst_row = origin + y * pitch;
            let mut x = 0;
            loop {
                let (transparent, count) = (data[pos], data[pos + 1] as usize);
                pos += 2;
                if transparent == 0 && count == 0 {
                    break;
                }
                x += transparent as usize;

                let start = x.max(left);
                let end = (x + count).min(right);
                for sx in start..end {
                    let dst = &mut params.dst[dst_row + sx - left];
                    blend_index(dst, data[pos + sx - x], mode, remap);
                }

                pos += count;
                x += count;
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
