//! Retrieves information about the version of the library from Git and the
//! build environment. This information is then written to a file in the output
//! directory and can be accessed at runtime by the binary.

use std::path::Path;
use std::{env, fs};

fn generate_file(filename: &str, contents: &str) {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join(filename);
    fs::write(dest_path, contents).unwrap();
}

// Population count is on the hot path of the derived state pipeline.
fn generate_build_info() {
    let features = [
        ("popcnt", cfg!(target_feature = "popcnt")),
        ("bmi1", cfg!(target_feature = "bmi1")),
    ]
    .iter()
    .map(|(name, enabled)| format!("{}{name}", if *enabled { "+" } else { "-" }))
    .collect::<Vec<_>>()
    .join(" ");
    generate_file("features", &features);
}

fn main() -> shadow_rs::SdResult<()> {
    generate_build_info();
    shadow_rs::new()
}
