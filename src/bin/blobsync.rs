#![deny(unsafe_code)]

use mimalloc::MiMalloc;

/// High-performance memory allocator for improved allocation throughput.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let code = cli::run_with(env::args_os(), &mut stdout, &mut stderr);
    let _ = io::Write::flush(&mut stdout);
    let _ = io::Write::flush(&mut stderr);
    code.into()
}
