use std::env;

fn main() {
    // Version string shown by `--version` and `/health`; DASH_VERSION_SUFFIX
    // lets packagers tag builds (e.g. "-deb1").
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let suffix = env::var("DASH_VERSION_SUFFIX").unwrap_or_default();
    println!("cargo:rustc-env=DASH_VERSION={version}{suffix}");

    println!("cargo:rerun-if-env-changed=DASH_VERSION_SUFFIX");
    println!("cargo:rerun-if-changed=Cargo.toml");
}
