//! A thin local development driver: perft/divide and fixed-depth or
//! fixed-time search from a FEN, useful for poking at positions without a
//! GUI. Not a protocol implementation.

use std::io::{self, BufRead};
use std::str::FromStr;
use std::time::Duration;
use vantage::board::Board;
use vantage::moves::magic::loader::load_magic_tables;
use vantage::moves::perft::{perft, perft_divide};
use vantage::search::search::search;

fn main() {
    let tables = load_magic_tables();
    let mut board = Board::new();

    println!("vantage dev shell — commands: fen <fen>, perft <depth>, divide <depth>, go depth <n> | movetime <ms>, d, quit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "quit" | "exit" => break,
            "d" | "display" => println!("{board}"),
            "fen" => {
                if parts.len() < 2 {
                    println!("usage: fen <fen-string>");
                    continue;
                }
                let fen = parts[1..].join(" ");
                match Board::from_str(&fen) {
                    Ok(b) => board = b,
                    Err(e) => println!("invalid fen: {e}"),
                }
            }
            "startpos" => board = Board::new(),
            "perft" => {
                let Some(depth) = parts.get(1).and_then(|d| d.parse::<u32>().ok()) else {
                    println!("usage: perft <depth>");
                    continue;
                };
                let mut b = board.clone();
                let nodes = perft(&mut b, &tables, depth);
                println!("perft({depth}) = {nodes}");
            }
            "divide" => {
                let Some(depth) = parts.get(1).and_then(|d| d.parse::<u32>().ok()) else {
                    println!("usage: divide <depth>");
                    continue;
                };
                let mut b = board.clone();
                let total = perft_divide(&mut b, &tables, depth);
                println!("total = {total}");
            }
            "go" => {
                let time_manager = match parts.get(1..) {
                    Some(["depth", n, ..]) => {
                        let depth: i32 = n.parse().unwrap_or(6);
                        let (tm, _) = run_search(&mut board, &tables, depth, None);
                        println!("bestmove {}", tm.map(|m| m.to_uci()).unwrap_or_else(|| "0000".to_string()));
                        continue;
                    }
                    Some(["movetime", ms, ..]) => {
                        let ms: u64 = ms.parse().unwrap_or(1000);
                        Some(Duration::from_millis(ms))
                    }
                    _ => None,
                };
                let (best, _) = run_search(&mut board, &tables, 64, time_manager);
                println!("bestmove {}", best.map(|m| m.to_uci()).unwrap_or_else(|| "0000".to_string()));
            }
            _ => println!("unknown command: {}", parts[0]),
        }
    }
}

fn run_search(
    board: &mut Board,
    tables: &vantage::moves::magic::MagicTables,
    depth: i32,
    time_limit: Option<Duration>,
) -> (Option<vantage::moves::types::Move>, i32) {
    let (score, mv) = search(board, tables, depth, time_limit);
    (mv, score)
}
