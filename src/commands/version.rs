//! Command: print version information.

/// Version string: `OMD_VERSION` from the build, else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("OMD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the omdot version to stdout.
pub fn run() {
    println!("omdot {}", version());
}
