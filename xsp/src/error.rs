#[derive(Debug, thiserror::Error)]
pub enum XspError {
    #[error("Error parsing bundle: {source}")]
    NomError {
        #[source]
        source: nom::Err<nom::error::Error<Vec<u8>>>,
    },
    #[error("Unknown bundle type tag: {tag:#06x}")]
    UnknownTypeTag { tag: u16 },
    #[error("Bundle {segment} segment lies outside the file")]
    SegmentOutOfBounds { segment: &'static str },
    #[error("Mismatched FRM length. Expect ({expect}). Have ({have})")]
    MismatchedFrmLength { expect: usize, have: usize },
    #[error("Error opening bundle: {source}")]
    IOError {
        #[source]
        source: std::io::Error,
    },
}
