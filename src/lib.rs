//! Software sprite blitters for palette-based 2D games.
//!
//! A [`Backend`] converts decoded sprites into its own pixel layout and
//! draws them into caller-owned buffers with one of several
//! [`BlitterMode`]s. Backends for 8bpp indexed and 32bpp true-colour
//! screens are provided; a [`BackendRegistry`] picks one by name.

mod backend;
mod cache;
mod colour;
mod export;
mod rect;
mod registry;
mod remap;
mod sprite;
mod surface;
mod zoom;

pub use backend::{
    indexed::{IndexedBackend, IndexedSurface},
    indexed_rle::IndexedRleBackend,
    true_colour::{TrueColourBackend, TrueColourSurface},
    Backend, BlitterMode, BlitterParams, ErasedBackend, PaletteAnimation,
};
pub use cache::{SpriteCache, SpriteId};
pub use colour::{
    adjust_brightness, compose_pa, compose_rgba, make_dark, make_grey, make_transparent, Colour,
    Palette, DEFAULT_BRIGHTNESS, PALETTE_SIZE,
};
pub use export::export_image;
#[cfg(feature = "png")]
pub use export::save_png;
pub use rect::Rect;
pub use registry::{BackendConfig, BackendRegistry, NoSuchBackend};
pub use remap::{RemapTable, COMPANY_COLOUR_COUNT, COMPANY_COLOUR_START};
pub use sprite::{
    allocate_sprite, AllocationError, CommonPixel, EncodedSprite, HeapAllocator, SpriteAllocator,
    SpriteDescriptor, SpriteKind,
};
pub use surface::{draw_line_generic, Recolour, RenderSurface};
pub use zoom::ZoomLevel;

pub extern crate glam;
pub extern crate image;
