use std::fmt::Display;

use once_cell::sync::Lazy;

/// Brightness at which a palette colour is drawn unchanged.
pub const DEFAULT_BRIGHTNESS: u8 = 128;

/// Number of entries in a palette.
pub const PALETTE_SIZE: usize = 256;

/// A 32-bit colour stored as packed ARGB.
///
/// This is the native pixel of the true-colour backend, so a
/// `[Colour]` can be viewed as raw bytes through `bytemuck`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Colour(u32);

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);
    pub const WHITE: Colour = Colour::rgb(u8::MAX, u8::MAX, u8::MAX);
    pub const TRANSPARENT: Colour = Colour::rgba(0, 0, 0, 0);

    /// Creates a colour from its RGBA components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Creates a colour from RGB components with 100% alpha.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, u8::MAX)
    }

    pub const fn from_argb(argb: u32) -> Self {
        Self(argb)
    }

    pub fn argb(&self) -> u32 {
        self.0
    }

    pub fn red(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(&self) -> u8 {
        self.0 as u8
    }

    pub fn alpha(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Gets the colour as an array of values in RGBA order.
    pub fn to_rgba(&self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }
}

impl Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rgba = self.to_rgba();
        write!(f, "#{:02x}{:02x}{:02x}", rgba[0], rgba[1], rgba[2])?;
        if rgba[3] != u8::MAX {
            write!(f, "{:02x}", rgba[3])?;
        }
        Ok(())
    }
}

/// Composes a colour with alpha `a` over `current`.
#[inline]
pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8, current: Colour) -> Colour {
    match a {
        0 => current,
        u8::MAX => Colour::rgb(r, g, b),
        a => {
            let blend = |src: u8, dst: u8| {
                let (src, dst, a) = (src as i32, dst as i32, a as i32);
                (dst + ((src - dst) * a) / 256) as u8
            };
            Colour::rgb(
                blend(r, current.red()),
                blend(g, current.green()),
                blend(b, current.blue()),
            )
        }
    }
}

/// Composes `colour` with alpha `a` over `current`.
#[inline]
pub fn compose_pa(colour: Colour, a: u8, current: Colour) -> Colour {
    compose_rgba(colour.red(), colour.green(), colour.blue(), a, current)
}

/// Scales every component by `nom / 256`, darkening the colour.
#[inline]
pub fn make_transparent(colour: Colour, nom: u32) -> Colour {
    let scale = |c: u8| ((c as u32 * nom) / 256) as u8;
    Colour::rgba(
        scale(colour.red()),
        scale(colour.green()),
        scale(colour.blue()),
        colour.alpha(),
    )
}

/// Perceived darkness of a colour, used to grey out crashed sprites.
#[inline]
pub fn make_dark(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 13063 + g as u32 * 25647 + b as u32 * 4770) / 262144) as u8
}

/// Converts a colour to greyscale using its luminance.
#[inline]
pub fn make_grey(colour: Colour) -> Colour {
    let grey = ((colour.red() as u32 * 19595
        + colour.green() as u32 * 38470
        + colour.blue() as u32 * 7471)
        / 65536) as u8;
    Colour::rgba(grey, grey, grey, colour.alpha())
}

/// Scales a colour by `brightness / DEFAULT_BRIGHTNESS`.
///
/// Overbright components are clamped and half of the excess is spread
/// over the remaining components, so bright remaps tend towards white
/// instead of saturating a single channel.
pub fn adjust_brightness(colour: Colour, brightness: u8) -> Colour {
    if brightness == DEFAULT_BRIGHTNESS {
        return colour;
    }

    let scale = |c: u8| (c as u32 * brightness as u32) >> 7;
    let (r, g, b) = (
        scale(colour.red()),
        scale(colour.green()),
        scale(colour.blue()),
    );
    if r <= 255 && g <= 255 && b <= 255 {
        return Colour::rgba(r as u8, g as u8, b as u8, colour.alpha());
    }

    let overbright = [r, g, b]
        .iter()
        .filter(|&&c| c > 255)
        .map(|&c| c - 255)
        .sum::<u32>()
        / 2;
    let spread = |c: u32| {
        if c >= 255 {
            255
        } else {
            (c + overbright * (255 - c) / 256).min(255) as u8
        }
    };
    Colour::rgba(spread(r), spread(g), spread(b), colour.alpha())
}

static DEFAULT_COLOURS: Lazy<[Colour; PALETTE_SIZE]> = Lazy::new(|| {
    let mut colours = [Colour::BLACK; PALETTE_SIZE];
    // 1..16: grey ramp
    for i in 1..16 {
        let v = (i * 17) as u8;
        colours[i] = Colour::rgb(v, v, v);
    }
    // 16..232: 6x6x6 colour cube
    for i in 0..216 {
        let level = |n: usize| (n * 51) as u8;
        colours[16 + i] = Colour::rgb(level(i / 36), level((i / 6) % 6), level(i % 6));
    }
    // 232..256: fine grey ramp
    for i in 0..24 {
        let v = (8 + i * 10) as u8;
        colours[232 + i] = Colour::rgb(v, v, v);
    }
    colours
});

/// A 256-entry colour palette.
///
/// Index 0 is the transparent entry of every indexed sprite. The dirty
/// range records which entries changed since the last palette animation
/// step and is consumed by [`RenderSurface::palette_animate`].
///
/// [`RenderSurface::palette_animate`]: crate::RenderSurface::palette_animate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colours: [Colour; PALETTE_SIZE],
    first_dirty: usize,
    count_dirty: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(*DEFAULT_COLOURS)
    }
}

impl Palette {
    pub fn new(colours: [Colour; PALETTE_SIZE]) -> Self {
        Self {
            colours,
            first_dirty: 0,
            count_dirty: 0,
        }
    }

    #[inline]
    pub fn get(&self, index: u8) -> Colour {
        self.colours[index as usize]
    }

    pub fn colours(&self) -> &[Colour; PALETTE_SIZE] {
        &self.colours
    }

    /// Replaces an entry and extends the dirty range to cover it.
    pub fn set(&mut self, index: u8, colour: Colour) {
        let index = index as usize;
        if self.colours[index] == colour {
            return;
        }
        self.colours[index] = colour;

        if self.count_dirty == 0 {
            self.first_dirty = index;
            self.count_dirty = 1;
        } else {
            let start = self.first_dirty.min(index);
            let end = (self.first_dirty + self.count_dirty).max(index + 1);
            self.first_dirty = start;
            self.count_dirty = end - start;
        }
    }

    pub fn first_dirty(&self) -> usize {
        self.first_dirty
    }

    pub fn count_dirty(&self) -> usize {
        self.count_dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.count_dirty != 0
    }

    pub fn clear_dirty(&mut self) {
        self.first_dirty = 0;
        self.count_dirty = 0;
    }

    /// Finds the entry closest to `colour`, ignoring the transparent index 0.
    pub fn nearest(&self, colour: Colour) -> u8 {
        let distance = |c: Colour| {
            let d = |a: u8, b: u8| (a as i32 - b as i32).pow(2);
            d(c.red(), colour.red()) + d(c.green(), colour.green()) + d(c.blue(), colour.blue())
        };
        (1..PALETTE_SIZE)
            .min_by_key(|&i| distance(self.colours[i]))
            .unwrap_or(0) as u8
    }
}
