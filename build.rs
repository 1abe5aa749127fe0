fn main() {
    // Embed the bundled resources directory name at compile time
    println!("cargo:rerun-if-env-changed=GWLAUNCHER_RESOURCES_DIR");

    if let Ok(dir) = std::env::var("GWLAUNCHER_RESOURCES_DIR") {
        println!("cargo:rustc-env=GWLAUNCHER_RESOURCES_DIR={}", dir);
    } else {
        println!("cargo:rustc-env=GWLAUNCHER_RESOURCES_DIR=resources");
    }
}
