//! Bitboard chess position core: decodes Forsyth-Edwards Notation into a
//! [`chess::position::Position`] carrying the occupancy, check and pin
//! information a move generator needs. For more information, see [README].
//!
//! [README]: https://github.com/kirillbobyrev/tabiya/blob/main/README.md

pub mod chess;

use shadow_rs::shadow;

shadow!(build);

/// Build type and target. Produced by `build.rs`.
const FEATURES: &str = include_str!(concat!(env!("OUT_DIR"), "/features"));

/// Returns the full version that can be used to identify how the library was
/// built in the first place.
fn version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Prints information about the version, author and GitHub repository on
/// startup.
pub fn print_version_info() {
    println!("Tabiya {}", version());
    println!("<https://github.com/kirillbobyrev/tabiya>");
}

/// Prints information the build type, features and whether the build is clean
/// on startup.
pub fn print_binary_info() {
    println!("Release build: {}", !shadow_rs::is_debug());
    println!("Features: {FEATURES}");
    if !shadow_rs::git_clean() {
        println!("Warning: built with uncommitted changes");
    }
    println!();
}
