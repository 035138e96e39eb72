use std::ops::Index;

use once_cell::sync::Lazy;

use crate::colour::{make_grey, make_transparent, Colour, Palette, PALETTE_SIZE};

/// First palette index of the company-colour range.
pub const COMPANY_COLOUR_START: u8 = 198;
/// Number of palette indices in the company-colour range.
pub const COMPANY_COLOUR_COUNT: u8 = 8;

static IDENTITY: Lazy<RemapTable> = Lazy::new(|| {
    let mut table = [0u8; PALETTE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = i as u8;
    }
    RemapTable(table)
});

static CRASH: Lazy<RemapTable> = Lazy::new(|| {
    let mut table = RemapTable::identity().clone();
    // company colours fade to the dark end of the grey ramp
    for i in 0..COMPANY_COLOUR_COUNT {
        table.set(COMPANY_COLOUR_START + i, 1 + i / 2);
    }
    table
});

static SHADOW: Lazy<RemapTable> = Lazy::new(|| RemapTable::transparent(&Palette::default()));

/// Maps palette indices to palette indices.
///
/// An entry of [`RemapTable::TRANSPARENT`] means "do not write"; it is
/// distinct from the identity mapping of any non-zero index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapTable([u8; PALETTE_SIZE]);

impl RemapTable {
    /// The reserved sentinel for pixels that must not be written.
    pub const TRANSPARENT: u8 = 0;

    pub fn new(table: [u8; PALETTE_SIZE]) -> Self {
        Self(table)
    }

    /// The table mapping every index to itself.
    pub fn identity() -> &'static RemapTable {
        &IDENTITY
    }

    /// The fixed table used to draw crashed vehicles.
    pub fn crash() -> &'static RemapTable {
        &CRASH
    }

    /// The darkening table of the default palette. Indexed backends fall
    /// back to it for `Transparent` blits without a table.
    pub fn shadow() -> &'static RemapTable {
        &SHADOW
    }

    /// Builds a table mapping each index to the entry closest to a
    /// darkened version of its colour. Used by the `Transparent` blit mode
    /// and transparent recolouring on indexed surfaces.
    pub fn transparent(palette: &Palette) -> Self {
        Self::derive(palette, |c| make_transparent(c, 192))
    }

    /// Builds a table mapping every non-transparent index to the darkest
    /// usable entry, for drawing silhouettes through a remap.
    pub fn black(palette: &Palette) -> Self {
        Self::derive(palette, |_| Colour::BLACK)
    }

    /// Builds a table mapping each index to the nearest grey entry.
    pub fn greyscale(palette: &Palette) -> Self {
        Self::derive(palette, make_grey)
    }

    fn derive(palette: &Palette, f: impl Fn(Colour) -> Colour) -> Self {
        let mut table = [Self::TRANSPARENT; PALETTE_SIZE];
        for (i, entry) in table.iter_mut().enumerate().skip(1) {
            *entry = palette.nearest(f(palette.get(i as u8)));
        }
        Self(table)
    }

    #[inline]
    pub fn get(&self, index: u8) -> u8 {
        self.0[index as usize]
    }

    pub fn set(&mut self, index: u8, value: u8) {
        self.0[index as usize] = value;
    }

    pub fn as_array(&self) -> &[u8; PALETTE_SIZE] {
        &self.0
    }
}

impl Index<u8> for RemapTable {
    type Output = u8;

    fn index(&self, index: u8) -> &u8 {
        &self.0[index as usize]
    }
}
