use std::io;
use std::io::prelude::*;

use tabiya::chess::attacks::{self, AttackerSpec};
use tabiya::chess::position::Position;

fn main() -> anyhow::Result<()> {
    tabiya::print_version_info();
    tabiya::print_binary_info();
    let mut position = Position::starting();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if let Some(fen) = line.strip_prefix("position ") {
            position = if fen.trim() == "startpos" {
                Position::starting()
            } else {
                match Position::try_from(fen) {
                    Ok(pos) => pos,
                    Err(e) => {
                        println!("Error reading the position: {e}");
                        continue;
                    },
                }
            };
        } else if line == "d" {
            println!("{position:?}");
        } else if line == "threats" {
            println!("Attacked by all pieces:");
            println!("{:?}", attacks::attacks_of(AttackerSpec::All, &position));
            println!("King danger squares:");
            println!("{:?}", position.king_danger_squares());
            println!("Xrays:");
            println!("{:?}", attacks::xray_attacks(&position));
            println!("Pinned: {}", position.is_own_piece_pinned());
            println!("Discovery candidate: {}", position.has_discovery_candidate());
        } else if line == "quit" {
            break;
        }
    }
    Ok(())
}
