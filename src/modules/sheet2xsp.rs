use std::path::{Path, PathBuf};

use eyre::eyre;
use xsp::{
    ConvMode, FrmEntry, Palette, Pattern, RefEntry, Xsp, FRM_MAX_COUNT, PATTERN_BYTES,
    REF_MAX_COUNT, SUB_TILE_BYTES, SUB_TILE_PX, TILE_PX,
};

use crate::utils::img_stuffs::{load_indexed_png, IndexedImage};

pub struct Sheet2XspOptions {
    pub frame_w: usize,
    pub frame_h: usize,
    /// Origin in frame-local pixels. Defaults to the frame center; values
    /// past the frame edge are clamped onto it.
    pub origin: Option<(usize, usize)>,
    pub bundle: bool,
}

/// One frame cell of the sheet, in image coordinates.
#[derive(Debug, Clone, Copy)]
struct FrameRect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

/// Hunts top-down, then left-right, for a sprite chunk to clip out of
/// `rect`. Returns None once the rectangle is fully transparent.
fn claim(pixels: &[u8], image_w: usize, rect: FrameRect) -> Option<(usize, usize)> {
    // Walk down row by row looking for non-transparent pixel data.
    let mut row = None;
    'row_scan: for y in rect.y..rect.y + rect.h {
        for x in rect.x..rect.x + rect.w {
            if pixels[x + y * image_w] != 0 {
                row = Some(y);
                break 'row_scan;
            }
        }
    }
    // We never found a filled row, so the rectangle is empty.
    let row = row?;

    // We have the top row, but the chunk to extract starts at the leftmost
    // column with data within a 16px band below it. The probe must not
    // leave the clipping rectangle.
    let y_lim = (row + TILE_PX).min(rect.y + rect.h);
    for x in rect.x..rect.x + rect.w {
        for y in row..y_lim {
            if pixels[x + y * image_w] != 0 {
                return Some((x, row));
            }
        }
    }

    // The row scan hit a pixel, so the band scan has to as well.
    log::warn!("unexpectedly empty strip from row {}", row);
    None
}

/// Packs the 8x8 block at (x, y) into 32 bytes of 4bpp data, row-major,
/// two pixels per byte with the first pixel in the high nibble. Pixels at
/// or past the clip limits read as 0.
fn clip_8x8_tile(
    pixels: &[u8],
    image_w: usize,
    x: usize,
    y: usize,
    lim_x: usize,
    lim_y: usize,
) -> [u8; SUB_TILE_BYTES] {
    let mut out = [0u8; SUB_TILE_BYTES];

    for dy in 0..SUB_TILE_PX {
        for dx in 0..SUB_TILE_PX {
            let px = x + dx;
            let py = y + dy;
            let value = if px < lim_x && py < lim_y {
                pixels[px + py * image_w] & 0x0F
            } else {
                0
            };

            let byte = &mut out[dy * (SUB_TILE_PX / 2) + dx / 2];
            if dx % 2 == 0 {
                *byte = value << 4;
            } else {
                *byte |= value;
            }
        }
    }

    out
}

/// Zeroes a claimed 16x16 region, clipped to the frame, so later scans
/// never reclaim the same pixels. Scanning consumes the buffer; the run
/// owns it exclusively.
fn erase_tile(pixels: &mut [u8], image_w: usize, x: usize, y: usize, lim_x: usize, lim_y: usize) {
    for py in y..(y + TILE_PX).min(lim_y) {
        for px in x..(x + TILE_PX).min(lim_x) {
            pixels[px + py * image_w] = 0;
        }
    }
}

/// Strips every sprite chunk out of one frame cell. Patterns go to the
/// pattern table; in XOBJ mode each chunk also gets an FRM placement
/// record and the frame gets one REF record at the end.
fn chop_frame(xsp: &mut Xsp, sheet: &mut IndexedImage, rect: FrameRect, origin: (usize, usize)) {
    let image_w = sheet.width;
    let lim_x = rect.x + rect.w;
    let lim_y = rect.y + rect.h;

    // The REF entry for this frame points at the first FRM entry recorded
    // below.
    let frm_offset = xsp.frm_offset();
    let mut sp_count: u16 = 0;
    let mut claimed = false;

    // Hardware sprites use their top-left as (0, 0), so the user origin
    // shifts by half a tile.
    let origin_x = origin.0 as i32 - (TILE_PX / 2) as i32;
    let origin_y = origin.1 as i32 - (TILE_PX / 2) as i32;

    let mut last_vx = 0i32;
    let mut last_vy = 0i32;

    while let Some((clip_x, clip_y)) = claim(&sheet.pixels, image_w, rect) {
        claimed = true;

        if xsp.mode == ConvMode::Xobj && xsp.frm.len() >= FRM_MAX_COUNT {
            log::warn!("FRM data is full, dropping the rest of this frame");
            break;
        }

        // Four 8x8 cells: top-left, bottom-left, top-right, bottom-right.
        let mut data = [0u8; PATTERN_BYTES];
        let pixels = &sheet.pixels;
        data[..32].copy_from_slice(&clip_8x8_tile(pixels, image_w, clip_x, clip_y, lim_x, lim_y));
        data[32..64].copy_from_slice(&clip_8x8_tile(
            pixels,
            image_w,
            clip_x,
            clip_y + SUB_TILE_PX,
            lim_x,
            lim_y,
        ));
        data[64..96].copy_from_slice(&clip_8x8_tile(
            pixels,
            image_w,
            clip_x + SUB_TILE_PX,
            clip_y,
            lim_x,
            lim_y,
        ));
        data[96..].copy_from_slice(&clip_8x8_tile(
            pixels,
            image_w,
            clip_x + SUB_TILE_PX,
            clip_y + SUB_TILE_PX,
            lim_x,
            lim_y,
        ));
        let pattern = Pattern(data);

        erase_tile(&mut sheet.pixels, image_w, clip_x, clip_y, lim_x, lim_y);

        // Duplicate patterns are only merged in XOBJ mode.
        let found = match xsp.mode {
            ConvMode::Xobj => xsp.patterns.find(&pattern),
            ConvMode::Sp => None,
        };
        let pattern_index = match found {
            Some(index) => index,
            None => match xsp.patterns.insert(pattern) {
                Some(index) => index,
                None => {
                    log::warn!("PCG area is full, dropping the rest of this frame");
                    break;
                }
            },
        };

        if xsp.mode != ConvMode::Xobj {
            continue;
        }

        let vx = (clip_x % rect.w) as i32 - origin_x;
        let vy = (clip_y % rect.h) as i32 - origin_y;
        xsp.frm.push(FrmEntry {
            vx: (vx - last_vx) as i16,
            vy: (vy - last_vy) as i16,
            pattern: pattern_index as i16,
            reserved: 0,
        });
        sp_count += 1;

        last_vx = vx;
        last_vy = vy;
    }

    if xsp.mode != ConvMode::Xobj {
        return;
    }
    // Fully transparent frames contribute no REF entry. A frame cut short
    // by a full table still gets one, consistent with the FRM records that
    // actually landed.
    if !claimed {
        return;
    }
    if xsp.refs.len() >= REF_MAX_COUNT {
        log::warn!("REF data is full, dropping frame reference");
        return;
    }
    xsp.refs.push(RefEntry {
        sp_count,
        frm_offset,
        reserved: 0,
    });
}

/// Chops every frame cell out of the sheet and returns the accumulated
/// XSP data. The sheet's pixels are consumed (zeroed) in the process.
pub fn convert_sheet(sheet: &mut IndexedImage, options: &Sheet2XspOptions) -> eyre::Result<Xsp> {
    let Sheet2XspOptions {
        frame_w, frame_h, ..
    } = *options;

    if frame_w == 0 || frame_h == 0 {
        return Err(eyre!("Invalid frame size {} x {}", frame_w, frame_h));
    }
    if frame_w > sheet.width || frame_h > sheet.height {
        return Err(eyre!(
            "Frame size ({} x {}) exceeds source image ({} x {})",
            frame_w,
            frame_h,
            sheet.width,
            sheet.height
        ));
    }

    // Frames that fit a single hardware sprite skip the XOBJ metadata.
    let mode = if frame_w <= TILE_PX && frame_h <= TILE_PX {
        ConvMode::Sp
    } else {
        ConvMode::Xobj
    };

    let (origin_x, origin_y) = options.origin.unwrap_or((frame_w / 2, frame_h / 2));
    let origin = (origin_x.min(frame_w), origin_y.min(frame_h));

    let mut xsp = Xsp::new(mode);
    xsp.palette = Palette::from_rgba8(&sheet.palette);

    // Remainder pixels past the last full frame are ignored.
    let frame_rows = sheet.height / frame_h;
    let frame_columns = sheet.width / frame_w;
    for y in 0..frame_rows {
        for x in 0..frame_columns {
            let rect = FrameRect {
                x: x * frame_w,
                y: y * frame_h,
                w: frame_w,
                h: frame_h,
            };
            chop_frame(&mut xsp, sheet, rect, origin);
        }
    }

    Ok(xsp)
}

/// Loads the spritesheet, converts it, and writes either the separate
/// output files or one .xsb bundle next to `outname`.
pub fn sheet2xsp(
    sheet_path: impl AsRef<Path>,
    outname: impl AsRef<Path> + Into<PathBuf>,
    options: &Sheet2XspOptions,
) -> eyre::Result<Xsp> {
    let mut sheet = load_indexed_png(sheet_path)?;
    let xsp = convert_sheet(&mut sheet, options)?;

    if options.bundle {
        xsp.write_bundle_to_file(outname)?;
    } else {
        xsp.write_to_files(outname)?;
    }

    Ok(xsp)
}
