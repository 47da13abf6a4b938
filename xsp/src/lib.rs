//! XSP sprite data for the X68000.
//!
//! XSP draws either a single 16x16 hardware sprite (SP) or a metasprite
//! composed of several of them (an XOBJ). The library is fed PCG pattern
//! data plus, for XOBJ drawing, FRM records that place patterns relative
//! to an origin and REF records that index the FRM stream per frame.
//! See https://yosshin4004.github.io/x68k/xsp/index.html
pub mod error;
mod parser;
mod types;
mod utils;
mod writer;

pub use types::*;
