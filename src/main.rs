use kindling::app::{self, AppOptions};

/// Optional arguments: a geometry file and a WGSL shader file. With no
/// arguments the built-in demo shape and embedded shader are used.
fn main() {
    let mut args = std::env::args().skip(1);
    let options = AppOptions {
        geometry: args.next().map(Into::into),
        shader: args.next().map(Into::into),
    };

    if let Err(e) = app::run(options) {
        eprintln!("Failed to initialize the application. Program terminated: {e:#}");
        std::process::exit(1);
    }
}
