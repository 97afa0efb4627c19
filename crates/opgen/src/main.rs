//! `tfl-opgen` binary: generate Lua raw-op stubs for the tfl wrapper.

fn main() {
    let code = tfl_opgen_cli::run(std::env::args().collect());
    std::process::exit(code);
}
