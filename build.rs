use std::env;

fn main() {
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=CLIPSHELF_TARGET={}", target);

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=CLIPSHELF_PROFILE={}", profile);

    // Shown by `clipshelf status`
    let build_date = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    println!("cargo:rustc-env=CLIPSHELF_BUILD_DATE={}", build_date);

    println!("cargo:rerun-if-changed=build.rs");
}
