//! Atlasdef - command-line tool for inspecting atlases and expanding animation definitions

use std::process::ExitCode;

use atlasdef::cli;

fn main() -> ExitCode {
    cli::run()
}
