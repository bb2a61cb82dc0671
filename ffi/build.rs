//! Regenerates `include/routes_ffi.h` from the `extern "C"` surface.

fn main() {
    println!("cargo:rerun-if-changed=src");

    let Ok(crate_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let result = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("ROUTES_FFI_H")
        .generate();
    match result {
        Ok(bindings) => {
            bindings.write_to_file(format!("{crate_dir}/include/routes_ffi.h"));
        }
        Err(e) => println!("cargo:warning=routes_ffi.h not generated: {e}"),
    }
}
