// build.rs
use std::path::PathBuf;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());

    let input_file = PathBuf::from(&manifest_dir).join("src/calc.y");
    println!("cargo:rerun-if-changed={}", input_file.display());
    let summary = ayacc_gen::generate(&input_file, &out_dir, "calc_parser", false).unwrap();
    if !summary.conflicts.is_empty() {
        println!("cargo:warning=calc.y: {}", summary.conflicts);
    }
}
