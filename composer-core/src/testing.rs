//! Fixtures shared by tests.

pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> image::RgbaImage {
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
}

/// Write `image` as `folder/name`. Content is always PNG, whatever the name says, as decoding
/// sniffs the format.
pub fn write_layer(
    folder: &std::path::Path,
    name: &str,
    image: &image::RgbaImage,
) -> std::path::PathBuf {
    let path = folder.join(name);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}
