use std::path::PathBuf;

use clap::Parser;
use xsp::ConvMode;

use crate::modules::sheet2xsp::{sheet2xsp, Sheet2XspOptions};

pub enum CliRes {
    Ok,
    Err,
}

/// Chops an indexed spritesheet .png into XSP sprite data
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Png2XspCli {
    /// Path to the 8-bit indexed spritesheet .png
    png: PathBuf,
    /// Width of a sprite frame within the spritesheet
    frame_w: usize,
    /// Height of a sprite frame within the spritesheet
    frame_h: usize,
    /// Base file path and name for output
    outname: PathBuf,
    /// Origin X within a frame, in pixels. Defaults to frame_w / 2
    #[arg(long)]
    origin_x: Option<usize>,
    /// Origin Y within a frame, in pixels. Defaults to frame_h / 2
    #[arg(long)]
    origin_y: Option<usize>,
    /// Write a single .xsb bundle instead of separate output files
    #[arg(short, long)]
    bundle: bool,
}

pub fn cli() -> CliRes {
    let cli = Png2XspCli::parse();

    if cli.frame_w == 0 || cli.frame_h == 0 {
        println!("Invalid frame size {} x {}", cli.frame_w, cli.frame_h);
        return CliRes::Err;
    }

    let origin = match (cli.origin_x, cli.origin_y) {
        (None, None) => None,
        (x, y) => Some((x.unwrap_or(cli.frame_w / 2), y.unwrap_or(cli.frame_h / 2))),
    };

    let options = Sheet2XspOptions {
        frame_w: cli.frame_w,
        frame_h: cli.frame_h,
        origin,
        bundle: cli.bundle,
    };

    let xsp = match sheet2xsp(&cli.png, &cli.outname, &options) {
        Ok(xsp) => xsp,
        Err(err) => {
            println!("{}", err);
            return CliRes::Err;
        }
    };

    match xsp.mode {
        ConvMode::Sp => println!("{} SP.", xsp.patterns.len()),
        ConvMode::Xobj => {
            println!("{} XSP.", xsp.patterns.len());
            println!("{} FRM.", xsp.frm.len());
            println!("{} REF.", xsp.refs.len());
        }
    }

    CliRes::Ok
}
