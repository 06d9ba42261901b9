use crate::error::{Error, Result};
use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

/// Decodes any supported image file and promotes it to RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Writes an RGB buffer as PNG.
pub fn save_png(path: &Path, image: &RgbImage) -> Result<()> {
    let save_error = |source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    };
    let output = std::fs::File::create(path).map_err(|e| save_error(image::ImageError::IoError(e)))?;
    let encoder = image::codecs::png::PngEncoder::new(std::io::BufWriter::new(output));

    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(save_error)?;

    Ok(())
}
