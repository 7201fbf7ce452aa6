//! Build script for the ping-pong node firmware
//!
//! Handles:
//! - Memory layout configuration
//! - Linker scripts for the embedded binary (cortex-m-rt, defmt)

fn main() {
    // Tell Cargo to re-run this if the linker script changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (tests, simulator) need no linker scripts
    if std::env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    // Link memory.x from project directory
    if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") {
        println!("cargo:rustc-link-search={dir}");
    }

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
