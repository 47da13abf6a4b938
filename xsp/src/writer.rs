use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use byte_writer::ByteWriter;

use crate::{ConvMode, FrmEntry, Palette, Pattern, RefEntry, Xsp};

trait WriteToWriter {
    fn write_to_bytes(&self, writer: &mut ByteWriter);
}

impl WriteToWriter for Pattern {
    fn write_to_bytes(&self, writer: &mut ByteWriter) {
        writer.append_u8_slice(&self.0);
    }
}

impl WriteToWriter for FrmEntry {
    fn write_to_bytes(&self, writer: &mut ByteWriter) {
        let Self {
            vx,
            vy,
            pattern,
            reserved,
        } = self;

        writer.append_i16(*vx);
        writer.append_i16(*vy);
        writer.append_i16(*pattern);
        writer.append_u16(*reserved);
    }
}

impl WriteToWriter for RefEntry {
    fn write_to_bytes(&self, writer: &mut ByteWriter) {
        let Self {
            sp_count,
            frm_offset,
            reserved,
        } = self;

        writer.append_u16(*sp_count);
        writer.append_u32(*frm_offset);
        writer.append_u16(*reserved);
    }
}

impl WriteToWriter for Palette {
    fn write_to_bytes(&self, writer: &mut ByteWriter) {
        for color in self.0 {
            writer.append_u16(color);
        }
    }
}

impl Xsp {
    pub fn pattern_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();

        self.patterns
            .get_patterns()
            .iter()
            .for_each(|pattern| pattern.write_to_bytes(&mut writer));

        writer.data
    }

    pub fn frm_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();

        self.frm
            .iter()
            .for_each(|entry| entry.write_to_bytes(&mut writer));

        writer.data
    }

    pub fn ref_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();

        self.refs
            .iter()
            .for_each(|entry| entry.write_to_bytes(&mut writer));

        writer.data
    }

    pub fn palette_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();

        self.palette.write_to_bytes(&mut writer);

        writer.data
    }

    /// Serializes the whole asset as one .xsb bundle: the fixed header,
    /// then the REF, FRM and pattern segments back to back.
    pub fn write_to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();

        writer.append_u16(self.mode.type_tag());
        writer.append_u16(self.refs.len() as u16);
        // The header keeps this length field 16-bit; FRM streams past
        // 64 KiB truncate here while the segment offsets below stay exact.
        writer.append_u16(self.frm_offset() as u16);
        writer.append_u16(self.patterns.len() as u16);
        self.palette.write_to_bytes(&mut writer);

        // Segment offsets get patched in once the segments are appended.
        let ref_offset_index = writer.get_offset();
        writer.append_u32(0);
        let frm_offset_index = writer.get_offset();
        writer.append_u32(0);
        let pattern_offset_index = writer.get_offset();
        writer.append_u32(0);

        let ref_offset = writer.get_offset();
        self.refs
            .iter()
            .for_each(|entry| entry.write_to_bytes(&mut writer));

        let frm_offset = writer.get_offset();
        self.frm
            .iter()
            .for_each(|entry| entry.write_to_bytes(&mut writer));

        let pattern_offset = writer.get_offset();
        self.patterns
            .get_patterns()
            .iter()
            .for_each(|pattern| pattern.write_to_bytes(&mut writer));

        writer.replace_with_u32(ref_offset_index, ref_offset as u32);
        writer.replace_with_u32(frm_offset_index, frm_offset as u32);
        writer.replace_with_u32(pattern_offset_index, pattern_offset as u32);

        writer.data
    }

    /// Writes the .xsb bundle next to `outname`.
    pub fn write_bundle_to_file(&self, outname: impl AsRef<Path> + Into<PathBuf>) -> eyre::Result<()> {
        write_file(outname.into().with_extension("xsb"), &self.write_to_bytes())
    }

    /// Writes the separate output files: patterns to .xsp (XOBJ) or .sp
    /// (SP), the palette to .pal, and in XOBJ mode the FRM and REF streams
    /// to .frm and .ref.
    pub fn write_to_files(&self, outname: impl AsRef<Path> + Into<PathBuf>) -> eyre::Result<()> {
        let outname: PathBuf = outname.into();

        write_file(
            outname.with_extension(self.mode.pattern_extension()),
            &self.pattern_bytes(),
        )?;
        write_file(outname.with_extension("pal"), &self.palette_bytes())?;

        if self.mode == ConvMode::Xobj {
            write_file(outname.with_extension("frm"), &self.frm_bytes())?;
            write_file(outname.with_extension("ref"), &self.ref_bytes())?;
        }

        Ok(())
    }
}

fn write_file(path: PathBuf, bytes: &[u8]) -> eyre::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    file.write_all(bytes)?;

    file.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::{
        ConvMode, FrmEntry, Palette, Pattern, PatternTable, RefEntry, Xsp, PATTERN_BYTES,
        XSB_HEADER_BYTES,
    };

    fn be_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_be_bytes([bytes[at], bytes[at + 1]])
    }

    fn be_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn frm_entry_layout() {
        let mut xsp = Xsp::new(ConvMode::Xobj);
        xsp.frm.push(FrmEntry {
            vx: -1,
            vy: 2,
            pattern: 3,
            reserved: 0,
        });

        assert_eq!(
            xsp.frm_bytes(),
            vec![0xFF, 0xFF, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00]
        );
    }

    #[test]
    fn ref_entry_layout() {
        let mut xsp = Xsp::new(ConvMode::Xobj);
        xsp.refs.push(RefEntry {
            sp_count: 2,
            frm_offset: 0x0102_0304,
            reserved: 0,
        });

        assert_eq!(
            xsp.ref_bytes(),
            vec![0x00, 0x02, 0x01, 0x02, 0x03, 0x04, 0x00, 0x00]
        );
    }

    #[test]
    fn empty_palette_serializes_to_zeroes() {
        let xsp = Xsp::new(ConvMode::Sp);

        assert_eq!(xsp.palette_bytes(), vec![0u8; 32]);
    }

    #[test]
    fn empty_sp_bundle_is_just_the_header() {
        let xsp = Xsp::new(ConvMode::Sp);
        let bytes = xsp.write_to_bytes();

        assert_eq!(bytes.len(), XSB_HEADER_BYTES);
        assert_eq!(be_u16(&bytes, 0), 1); // SP type tag
        assert_eq!(be_u32(&bytes, 40), XSB_HEADER_BYTES as u32);
        assert_eq!(be_u32(&bytes, 44), XSB_HEADER_BYTES as u32);
        assert_eq!(be_u32(&bytes, 48), XSB_HEADER_BYTES as u32);
    }

    #[test]
    fn bundle_offsets_are_cumulative() {
        let mut xsp = Xsp::new(ConvMode::Xobj);
        xsp.patterns = PatternTable(vec![
            Pattern([0x11; PATTERN_BYTES]),
            Pattern([0x22; PATTERN_BYTES]),
        ]);
        xsp.frm = vec![
            FrmEntry {
                vx: 0,
                vy: 0,
                pattern: 0,
                reserved: 0,
            };
            3
        ];
        xsp.refs = vec![
            RefEntry {
                sp_count: 1,
                frm_offset: 0,
                reserved: 0,
            };
            2
        ];
        xsp.palette = Palette::from_rgba8(&[[0, 0, 0, 0], [255, 255, 255, 255]]);

        let bytes = xsp.write_to_bytes();

        let ref_count = be_u16(&bytes, 2) as u32;
        let frm_bytes_field = be_u16(&bytes, 4) as u32;
        let pattern_count = be_u16(&bytes, 6) as u32;
        let ref_offset = be_u32(&bytes, 40);
        let frm_offset = be_u32(&bytes, 44);
        let pattern_offset = be_u32(&bytes, 48);

        assert_eq!(ref_offset, XSB_HEADER_BYTES as u32);
        assert_eq!(frm_offset, ref_offset + ref_count * 8);
        assert_eq!(pattern_offset, frm_offset + frm_bytes_field);
        assert_eq!(
            bytes.len() as u32,
            pattern_offset + pattern_count * PATTERN_BYTES as u32
        );

        // The palette sits at byte 8 of the header.
        assert_eq!(be_u16(&bytes, 8), 0);
        assert_eq!(be_u16(&bytes, 10), xsp.palette.0[1]);
    }
}
