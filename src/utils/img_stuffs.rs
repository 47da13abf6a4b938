use std::path::Path;

use eyre::eyre;

/// An indexed image with its palette indices intact. Pixel value 0 is the
/// transparent color.
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,
    /// Row-major, one palette index per byte.
    pub pixels: Vec<u8>,
    pub palette: Vec<[u8; 4]>,
}

/// Decodes an 8-bit indexed PNG without color conversion, so the pixel
/// bytes stay palette indices. Palettes shorter than 16 entries are padded
/// with zeroes.
pub fn decode_indexed_png(bytes: &[u8]) -> eyre::Result<IndexedImage> {
    let mut decoder = lodepng::Decoder::new();
    decoder.color_convert(false);

    let png = decoder
        .decode(bytes)
        .map_err(|err| eyre!("LodePNG error: {}", err))?;

    let info = decoder.info_png();
    if info.color.colortype() != lodepng::ColorType::PALETTE || info.color.bitdepth() != 8 {
        return Err(eyre!("Spritesheet must be an 8-bit indexed PNG"));
    }

    let bitmap = match png {
        lodepng::Image::RawData(bitmap) => bitmap,
        _ => return Err(eyre!("Spritesheet must be an 8-bit indexed PNG")),
    };

    let mut palette = info
        .color
        .palette()
        .iter()
        .map(|color| [color.r, color.g, color.b, color.a])
        .collect::<Vec<[u8; 4]>>();

    if palette.len() < 16 {
        log::warn!(
            "palette only has {} entries, padding to 16 with black",
            palette.len()
        );
        palette.resize(16, [0u8; 4]);
    }

    Ok(IndexedImage {
        width: bitmap.width,
        height: bitmap.height,
        pixels: bitmap.buffer,
        palette,
    })
}

pub fn load_indexed_png(path: impl AsRef<Path>) -> eyre::Result<IndexedImage> {
    let bytes = std::fs::read(path.as_ref())?;
    let image = decode_indexed_png(&bytes)?;

    println!(
        "Loaded \"{}\": {} x {}",
        path.as_ref().display(),
        image.width,
        image.height
    );

    Ok(image)
}
