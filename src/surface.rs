use std::mem;

use bytemuck::Pod;

use crate::{colour::Palette, rect::Rect, remap::RemapTable};

/// How [`RenderSurface::recolour_rect`] maps the pixels it touches.
///
/// Each variant carries the palette-index table that indexed surfaces
/// apply. True-colour surfaces compute `Transparent` and `Greyscale`
/// directly and cannot apply an arbitrary `Table`.
#[derive(Copy, Clone, Debug)]
pub enum Recolour<'a> {
    Table(&'a RemapTable),
    /// Darkens the area, e.g. behind a translucent window.
    Transparent(&'a RemapTable),
    /// Greys the area out, e.g. for a newspaper-style screenshot.
    Greyscale(&'a RemapTable),
}

impl<'a> Recolour<'a> {
    pub fn table(&self) -> &'a RemapTable {
        match *self {
            Recolour::Table(t) | Recolour::Transparent(t) | Recolour::Greyscale(t) => t,
        }
    }
}

/// A caller-owned pixel buffer together with the operations one
/// backend knows how to perform on it.
///
/// A "video" argument is a pixel offset into the buffer, usually
/// obtained from [`move_to`](Self::move_to). Coordinates are trusted:
/// only [`draw_line`](Self::draw_line) clips, and out-of-range input
/// panics on the slice bounds check.
///
/// Colours passed to drawing operations are palette indices, whatever
/// the surface's native format.
pub trait RenderSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Row pitch in pixels.
    fn pitch(&self) -> u32;

    /// Moves `video` by `x` pixels to the right and `y` rows down.
    ///
    /// Pure offset arithmetic; the buffer is not touched.
    fn move_to(&self, video: usize, x: i32, y: i32) -> usize {
        (video as isize + x as isize + y as isize * self.pitch() as isize) as usize
    }

    fn set_pixel(&mut self, video: usize, x: i32, y: i32, colour: u8);

    /// Draws a line of the given width, clipped to
    /// `screen_width` x `screen_height`.
    ///
    /// `dash` is the length of dashes and gaps; 0 draws a solid line.
    #[allow(clippy::too_many_arguments)]
    fn draw_line(
        &mut self,
        video: usize,
        x: i32,
        y: i32,
        x2: i32,
        y2: i32,
        screen_width: i32,
        screen_height: i32,
        colour: u8,
        width: i32,
        dash: i32,
    ) {
        draw_line_generic(
            x,
            y,
            x2,
            y2,
            screen_width,
            screen_height,
            width,
            dash,
            |px, py| self.set_pixel(video, px, py, colour),
        );
    }

    /// Fills `width` x `height` pixels starting at `video`.
    fn draw_rect(&mut self, video: usize, width: i32, height: i32, colour: u8);

    /// Reads every pixel of the area, maps it through `recolour` and
    /// writes it back.
    fn recolour_rect(&mut self, video: usize, width: i32, height: i32, recolour: Recolour);

    /// Moves the contents of `region` (relative to `video`) by
    /// `(scroll_x, scroll_y)`.
    ///
    /// On return `region` covers the pixels that received moved content;
    /// the rest of the original region is stale and must be redrawn by
    /// the caller. Nothing outside the original region is read or written.
    fn scroll(&mut self, video: usize, region: &mut Rect, scroll_x: i32, scroll_y: i32);

    /// Called after palette entries changed. Returns whether the whole
    /// screen must be presented again.
    fn palette_animate(&mut self, _palette: &Palette) -> bool {
        false
    }

    /// Copies an area into `dst`, which must hold at least
    /// `Backend::buffer_size(width, height)` bytes.
    ///
    /// The bytes are backend-specific; callers may only hand them back
    /// to [`paste`](Self::paste) on a surface of the same backend.
    fn copy(&self, dst: &mut [u8], x: i32, y: i32, width: i32, height: i32);

    /// Writes an area previously captured with [`copy`](Self::copy).
    fn paste(&mut self, src: &[u8], x: i32, y: i32, width: i32, height: i32);

    /// Exports `height` rows starting at row `y` in a portable layout:
    /// one palette index per pixel for indexed surfaces, RGBA bytes for
    /// true-colour ones. `dst_pitch` is in bytes.
    fn export_lines(&self, dst: &mut [u8], dst_pitch: usize, y: u32, height: u32);
}

/// Bresenham line rasterisation with width and dashing.
///
/// Calls `set_pixel` for every covered pixel inside
/// `[0, screen_width) x [0, screen_height)`.
#[allow(clippy::too_many_arguments)]
pub fn draw_line_generic(
    mut x1: i32,
    mut y1: i32,
    mut x2: i32,
    mut y2: i32,
    screen_width: i32,
    screen_height: i32,
    width: i32,
    dash: i32,
    mut set_pixel: impl FnMut(i32, i32),
) {
    let (mut dx, stepx) = match (x2 - x1) * 2 {
        d if d < 0 => (-d, -1),
        d => (d, 1),
    };
    let (mut dy, stepy) = match (y2 - y1) * 2 {
        d if d < 0 => (-d, -1),
        d => (d, 1),
    };

    if dx == 0 && dy == 0 {
        // degenerate line; only width 1 is honoured
        if x1 >= 0 && x1 < screen_width && y1 >= 0 && y1 < screen_height {
            set_pixel(x1, y1);
        }
        return;
    }

    let mut frac_diff = width * dx.max(dy);
    if width > 1 {
        // frac_diff = width * sqrt(dx^2 + dy^2), found by bisection in
        // [max(dx, dy), 3/2 * max(dx, dy)]
        let (dx64, dy64, width64) = (dx as i64, dy as i64, width as i64);
        let frac_sq = width64 * width64 * (dx64 * dx64 + dy64 * dy64);
        let mut frac_max = 3 * frac_diff / 2;
        while frac_diff < frac_max {
            let frac_test = (frac_diff + frac_max) / 2;
            if (frac_test as i64) * (frac_test as i64) < frac_sq {
                frac_diff = frac_test + 1;
            } else {
                frac_max = frac_test - 1;
            }
        }
    }

    let gap = dash;
    let dash = if dash == 0 { 1 } else { dash };
    let mut dash_count = 0;

    if dx > dy {
        let mut y_low = y1;
        let mut y_high = y1;
        let mut frac_low = dy - frac_diff / 2;
        let mut frac_high = dy + frac_diff / 2;

        while frac_low + dx / 2 < 0 {
            frac_low += dx;
            y_low -= stepy;
        }
        while frac_high - dx / 2 >= 0 {
            frac_high -= dx;
            y_high += stepy;
        }
        x2 += stepx;

        while x1 != x2 {
            if dash_count < dash && x1 >= 0 && x1 < screen_width {
                let mut y = y_low;
                while y != y_high {
                    if y >= 0 && y < screen_height {
                        set_pixel(x1, y);
                    }
                    y += stepy;
                }
            }
            if frac_low >= 0 {
                y_low += stepy;
                frac_low -= dx;
            }
            if frac_high >= 0 {
                y_high += stepy;
                frac_high -= dx;
            }
            x1 += stepx;
            frac_low += dy;
            frac_high += dy;
            dash_count += 1;
            if dash_count >= dash + gap {
                dash_count = 0;
            }
        }
    } else {
        // steep line: x and y swap roles
        std::mem::swap(&mut dx, &mut dy);
        let mut x_low = x1;
        let mut x_high = x1;
        let mut frac_low = dy - frac_diff / 2;
        let mut frac_high = dy + frac_diff / 2;

        while frac_low + dx / 2 < 0 {
            frac_low += dx;
            x_low -= stepx;
        }
        while frac_high - dx / 2 >= 0 {
            frac_high -= dx;
            x_high += stepx;
        }
        y2 += stepy;

        while y1 != y2 {
            if dash_count < dash && y1 >= 0 && y1 < screen_height {
                let mut x = x_low;
                while x != x_high {
                    if x >= 0 && x < screen_width {
                        set_pixel(x, y1);
                    }
                    x += stepx;
                }
            }
            if frac_low >= 0 {
                x_low += stepx;
                frac_low -= dx;
            }
            if frac_high >= 0 {
                x_high += stepx;
                frac_high -= dx;
            }
            y1 += stepy;
            frac_low += dy;
            frac_high += dy;
            dash_count += 1;
            if dash_count >= dash + gap {
                dash_count = 0;
            }
        }
    }
}

/// Fills `width` x `height` pixels starting at `video`.
pub(crate) fn fill_region<T: Copy>(
    buf: &mut [T],
    pitch: usize,
    video: usize,
    width: i32,
    height: i32,
    value: T,
) {
    let width = width.max(0) as usize;
    for row in 0..height.max(0) as usize {
        let start = video + row * pitch;
        buf[start..start + width].fill(value);
    }
}

/// Applies `f` to every pixel of a `width` x `height` area.
pub(crate) fn map_region<T: Copy>(
    buf: &mut [T],
    pitch: usize,
    video: usize,
    width: i32,
    height: i32,
    f: impl Fn(T) -> T,
) {
    let width = width.max(0) as usize;
    for row in 0..height.max(0) as usize {
        let start = video + row * pitch;
        for pixel in &mut buf[start..start + width] {
            *pixel = f(*pixel);
        }
    }
}

/// Row-wise, overlap-safe scroll shared by all surfaces.
pub(crate) fn scroll_region<T: Copy>(
    buf: &mut [T],
    pitch: usize,
    video: usize,
    region: &mut Rect,
    scroll_x: i32,
    scroll_y: i32,
) {
    let (mut left, mut top) = (region.left(), region.top());
    let (mut width, mut height) = (region.width(), region.height());

    let mut src_x = left;
    if scroll_x >= 0 {
        left += scroll_x;
        width -= scroll_x;
    } else {
        src_x -= scroll_x;
        width += scroll_x;
    }
    if scroll_y > 0 {
        top += scroll_y;
        height -= scroll_y;
    } else {
        height += scroll_y;
    }

    *region = Rect::from_xywh(left, top, width, height);
    debug_assert!(!region.is_empty(), "scrolled by more than the region size");
    if region.is_empty() {
        return;
    }

    let width = width as usize;
    let mut copy_row = |row: i32| {
        let dst = video + row as usize * pitch + left as usize;
        let src = video + (row - scroll_y) as usize * pitch + src_x as usize;
        buf.copy_within(src..src + width, dst);
    };
    // rows are moved away from the direction of travel first so that
    // no source row is overwritten before it is read
    if scroll_y > 0 {
        (top..top + height).rev().for_each(&mut copy_row);
    } else {
        (top..top + height).for_each(&mut copy_row);
    }
}

/// Copies an area out of `buf` as raw bytes.
pub(crate) fn copy_region<T: Pod>(
    buf: &[T],
    pitch: usize,
    dst: &mut [u8],
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) {
    let width = width.max(0) as usize;
    let row_bytes = width * mem::size_of::<T>();
    for row in 0..height.max(0) as usize {
        let start = (y as usize + row) * pitch + x as usize;
        dst[row * row_bytes..(row + 1) * row_bytes]
            .copy_from_slice(bytemuck::cast_slice(&buf[start..start + width]));
    }
}

/// Writes raw bytes produced by [`copy_region`] back into `buf`.
pub(crate) fn paste_region<T: Pod>(
    buf: &mut [T],
    pitch: usize,
    src: &[u8],
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) {
    let width = width.max(0) as usize;
    let row_bytes = width * mem::size_of::<T>();
    for row in 0..height.max(0) as usize {
        let start = (y as usize + row) * pitch + x as usize;
        let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut buf[start..start + width]);
        dst.copy_from_slice(&src[row * row_bytes..(row + 1) * row_bytes]);
    }
}
