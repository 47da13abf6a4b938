use nom::{
    bytes::complete::take,
    combinator::map,
    multi::count,
    number::complete::{be_i16, be_u16, be_u32},
    IResult as _IResult, Parser,
};

use crate::{FrmEntry, Palette, Pattern, RefEntry, PATTERN_BYTES};

pub type IResult<'a, T> = _IResult<&'a [u8], T>;

pub(crate) struct XsbHeader {
    pub type_tag: u16,
    pub ref_count: u16,
    pub frm_bytes: u16,
    pub pattern_count: u16,
    pub palette: Palette,
    pub ref_offset: u32,
    pub frm_offset: u32,
    pub pattern_offset: u32,
}

fn parse_palette(i: &'_ [u8]) -> IResult<'_, Palette> {
    map(take(32usize), |bytes: &[u8]| {
        let mut colors = [0u16; 16];

        for (color, pair) in colors.iter_mut().zip(bytes.chunks_exact(2)) {
            *color = u16::from_be_bytes([pair[0], pair[1]]);
        }

        Palette(colors)
    })
    .parse(i)
}

pub(crate) fn parse_header(i: &'_ [u8]) -> IResult<'_, XsbHeader> {
    map(
        (
            be_u16,
            be_u16,
            be_u16,
            be_u16,
            parse_palette,
            be_u32,
            be_u32,
            be_u32,
        ),
        |(
            type_tag,
            ref_count,
            frm_bytes,
            pattern_count,
            palette,
            ref_offset,
            frm_offset,
            pattern_offset,
        )| XsbHeader {
            type_tag,
            ref_count,
            frm_bytes,
            pattern_count,
            palette,
            ref_offset,
            frm_offset,
            pattern_offset,
        },
    )
    .parse(i)
}

pub(crate) fn parse_frm_entry(i: &'_ [u8]) -> IResult<'_, FrmEntry> {
    map(
        (be_i16, be_i16, be_i16, be_u16),
        |(vx, vy, pattern, reserved)| FrmEntry {
            vx,
            vy,
            pattern,
            reserved,
        },
    )
    .parse(i)
}

pub(crate) fn parse_ref_entry(i: &'_ [u8]) -> IResult<'_, RefEntry> {
    map(
        (be_u16, be_u32, be_u16),
        |(sp_count, frm_offset, reserved)| RefEntry {
            sp_count,
            frm_offset,
            reserved,
        },
    )
    .parse(i)
}

pub(crate) fn parse_pattern(i: &'_ [u8]) -> IResult<'_, Pattern> {
    map(take(PATTERN_BYTES), |bytes: &[u8]| {
        let mut data = [0u8; PATTERN_BYTES];
        data.copy_from_slice(bytes);

        Pattern(data)
    })
    .parse(i)
}

pub(crate) fn parse_frm_entries(i: &'_ [u8], frm_count: usize) -> IResult<'_, Vec<FrmEntry>> {
    count(parse_frm_entry, frm_count).parse(i)
}

pub(crate) fn parse_ref_entries(i: &'_ [u8], ref_count: usize) -> IResult<'_, Vec<RefEntry>> {
    count(parse_ref_entry, ref_count).parse(i)
}

pub(crate) fn parse_patterns(i: &'_ [u8], pattern_count: usize) -> IResult<'_, Vec<Pattern>> {
    count(parse_pattern, pattern_count).parse(i)
}
