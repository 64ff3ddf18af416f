// File: crates/sextant-core/build.rs
// Summary: Links the Windows system libraries Skia's font manager needs when the
// target (not the host) is Windows.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("windows") {
        // registry access from SkFontMgr
        println!("cargo:rustc-link-lib=advapi32");
    }
}
