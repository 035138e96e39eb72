//! Screenshots of render surfaces.

use image::{Rgba, RgbaImage};

use crate::{colour::Palette, surface::RenderSurface};

/// Copies the visible part of `surface` into an RGBA image.
///
/// `depth` is the screen depth of the backend that created the surface;
/// indexed surfaces are resolved through `palette`.
///
/// # Panics
/// Panics if `depth` is neither 8 nor 32.
pub fn export_image(surface: &dyn RenderSurface, depth: u8, palette: &Palette) -> RgbaImage {
    let (width, height) = (surface.width(), surface.height());
    let mut image = RgbaImage::new(width, height);

    match depth {
        8 => {
            let mut indices = vec![0u8; width as usize * height as usize];
            surface.export_lines(&mut indices, width as usize, 0, height);
            for (pixel, &index) in image.pixels_mut().zip(&indices) {
                *pixel = Rgba(palette.get(index).to_rgba());
            }
        }
        32 => surface.export_lines(&mut image, width as usize * 4, 0, height),
        depth => panic!("cannot export a {}bpp surface", depth),
    }

    image
}

/// Writes a screenshot of `surface` to a PNG file.
#[cfg(feature = "png")]
pub fn save_png(
    surface: &dyn RenderSurface,
    depth: u8,
    palette: &Palette,
    path: impl AsRef<std::path::Path>,
) -> image::ImageResult<()> {
    let image = export_image(surface, depth, palette);
    log::info!(
        "Saving {}x{} screenshot to {}",
        image.width(),
        image.height(),
        path.as_ref().display()
    );
    image.save_with_format(path, image::ImageFormat::Png)
}
