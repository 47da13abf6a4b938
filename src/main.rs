// png2xsp
//
// Converts a spritesheet PNG into data for use with XSP. See
// https://yosshin4004.github.io/x68k/xsp/index.html for the usage and
// theory of operation of the XSP library.
//
// Rather than require a metadata file that specifies sprite size and
// clipping regions for each sprite, the converter operates on a fixed
// frame size for the whole sheet and omits unused space, so enormous
// frames that barely use their area cost nothing.
mod cli;
pub mod modules;
pub mod utils;

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let cli_res = cli::cli();

    let err_exit = ExitCode::from(1);
    let ok_exit = ExitCode::from(0);

    match cli_res {
        cli::CliRes::Ok => ok_exit,
        cli::CliRes::Err => err_exit,
    }
}
