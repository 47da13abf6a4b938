use std::{ffi::OsStr, path::Path};

use image::RgbImage;
use nom::Parser;

use crate::{
    error::XspError,
    parser::{parse_frm_entries, parse_header, parse_patterns, parse_ref_entries},
    x68k_color_to_rgb8, ConvMode, PatternTable, Xsp, FRM_ENTRY_BYTES, PATTERN_BYTES,
    REF_ENTRY_BYTES, TILE_PX,
};

impl Xsp {
    pub fn open_from_bytes(i: &[u8]) -> Result<Xsp, XspError> {
        let (_, header) = parse_header
            .parse(i)
            .map_err(|op| XspError::NomError {
                source: op.to_owned(),
            })?;

        let mode = ConvMode::from_type_tag(header.type_tag).ok_or(XspError::UnknownTypeTag {
            tag: header.type_tag,
        })?;

        // The segments are addressed from the file start; make sure every
        // one of them actually lies inside the file before slicing.
        let ref_offset = header.ref_offset as usize;
        let frm_offset = header.frm_offset as usize;
        let pattern_offset = header.pattern_offset as usize;

        let ref_count = header.ref_count as usize;
        if frm_offset < ref_offset || ref_offset + ref_count * REF_ENTRY_BYTES > frm_offset {
            return Err(XspError::SegmentOutOfBounds { segment: "REF" });
        }
        if pattern_offset < frm_offset || pattern_offset > i.len() {
            return Err(XspError::SegmentOutOfBounds { segment: "FRM" });
        }
        let frm_len = pattern_offset - frm_offset;
        // The 16-bit header field truncates past 64 KiB, so it can only be
        // checked against the segment length when the stream is short
        // enough for it to be exact.
        if frm_len <= u16::MAX as usize && header.frm_bytes as usize != frm_len {
            return Err(XspError::MismatchedFrmLength {
                expect: frm_len,
                have: header.frm_bytes as usize,
            });
        }
        let frm_count = frm_len / FRM_ENTRY_BYTES;

        let pattern_count = header.pattern_count as usize;
        if pattern_offset + pattern_count * PATTERN_BYTES > i.len() {
            return Err(XspError::SegmentOutOfBounds { segment: "pattern" });
        }

        let nom_err = |op: nom::Err<nom::error::Error<&[u8]>>| XspError::NomError {
            source: op.to_owned(),
        };

        let (_, refs) = parse_ref_entries(&i[ref_offset..], ref_count).map_err(nom_err)?;
        let (_, frm) = parse_frm_entries(&i[frm_offset..], frm_count).map_err(nom_err)?;
        let (_, patterns) = parse_patterns(&i[pattern_offset..], pattern_count).map_err(nom_err)?;

        Ok(Xsp {
            mode,
            patterns: PatternTable(patterns),
            frm,
            refs,
            palette: header.palette,
        })
    }

    pub fn open_from_file(path: impl AsRef<OsStr> + AsRef<Path>) -> Result<Xsp, XspError> {
        let file = std::fs::read(path).map_err(|op| XspError::IOError { source: op })?;

        Self::open_from_bytes(&file)
    }

    /// Debug view of one pattern: expands the 4bpp cells through the
    /// palette into a 16x16 RGB image.
    pub fn to_rgb8(&self, pattern_index: usize) -> RgbImage {
        let pattern = &self.patterns.get_patterns()[pattern_index];
        let mut image = RgbImage::new(TILE_PX as u32, TILE_PX as u32);

        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let color_index = pattern.pixel(x as usize, y as usize);
            let color = self.palette.0[color_index as usize];
            *pixel = image::Rgb(x68k_color_to_rgb8(color));
        }

        image
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::XspError, ConvMode, FrmEntry, Palette, Pattern, PatternTable, RefEntry, Xsp,
        PATTERN_BYTES,
    };

    fn sample_xobj() -> Xsp {
        let mut xsp = Xsp::new(ConvMode::Xobj);

        let mut tile = [0u8; PATTERN_BYTES];
        tile[0] = 0x12;
        tile[127] = 0x34;
        xsp.patterns = PatternTable(vec![Pattern(tile), Pattern([0xAB; PATTERN_BYTES])]);
        xsp.frm = vec![
            FrmEntry {
                vx: -8,
                vy: -8,
                pattern: 0,
                reserved: 0,
            },
            FrmEntry {
                vx: 16,
                vy: 0,
                pattern: 1,
                reserved: 0,
            },
            FrmEntry {
                vx: -4,
                vy: 12,
                pattern: 0,
                reserved: 0,
            },
        ];
        xsp.refs = vec![
            RefEntry {
                sp_count: 2,
                frm_offset: 0,
                reserved: 0,
            },
            RefEntry {
                sp_count: 1,
                frm_offset: 16,
                reserved: 0,
            },
        ];
        xsp.palette = Palette::from_rgba8(&[
            [0, 0, 0, 0],
            [248, 0, 0, 255],
            [0, 248, 0, 255],
            [0, 0, 248, 255],
        ]);

        xsp
    }

    #[test]
    fn bundle_round_trip() {
        let xsp = sample_xobj();
        let bytes = xsp.write_to_bytes();

        let reread = Xsp::open_from_bytes(&bytes).unwrap();

        assert_eq!(reread, xsp);
    }

    #[test]
    fn unknown_type_tag_rejected() {
        let mut bytes = sample_xobj().write_to_bytes();
        bytes[1] = 9;

        assert!(matches!(
            Xsp::open_from_bytes(&bytes),
            Err(XspError::UnknownTypeTag { tag: 9 })
        ));
    }

    #[test]
    fn truncated_bundle_rejected() {
        let bytes = sample_xobj().write_to_bytes();

        assert!(matches!(
            Xsp::open_from_bytes(&bytes[..bytes.len() - 1]),
            Err(XspError::SegmentOutOfBounds { .. })
        ));
    }

    #[test]
    fn pattern_renders_through_palette() {
        let mut xsp = Xsp::new(ConvMode::Sp);

        let mut tile = [0u8; PATTERN_BYTES];
        tile[0] = 0x10; // pixel (0, 0) uses palette entry 1
        xsp.patterns = PatternTable(vec![Pattern(tile)]);
        xsp.palette = Palette::from_rgba8(&[[0, 0, 0, 0], [248, 0, 0, 255]]);

        let image = xsp.to_rgb8(0);

        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(image.get_pixel(0, 0).0, [248, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0]);
    }
}
