//! Builds rook/bishop magic tables from scratch by brute-force search.
//!
//! Used whenever the `load_magic` feature is off, and by tests that want a
//! small, repeatable table (see `structs.rs`'s test module).

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use crate::moves::magic::search::find_magic_number_for_square;
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[cfg(feature = "deterministic_magic")]
const MAGIC_SEED: u64 = 0x5125_1337_F00D_CAFE;

/// Selects how the magic-search RNG is seeded.
pub enum MagicTableSeed {
    /// Deterministic: same seed always produces the same magic numbers.
    Fixed(u64),
    /// Seeded from OS entropy, unless the `deterministic_magic` feature
    /// pins it to a fixed constant for reproducible builds.
    FromEntropy,
}

fn make_rng(seed: MagicTableSeed) -> StdRng {
    match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::FromEntropy => {
            #[cfg(feature = "deterministic_magic")]
            {
                StdRng::seed_from_u64(MAGIC_SEED)
            }
            #[cfg(not(feature = "deterministic_magic"))]
            {
                let mut seed = [0u8; 32];
                rand::rng().fill_bytes(&mut seed);
                StdRng::from_seed(seed)
            }
        }
    }
}

/// Squares a rook cares about, excluding the board edge on each ray (an
/// occupant there always stops the slider, so it never needs its own bit).
fn rook_relevant_mask(square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }

    mask
}

/// Squares a bishop cares about, excluding the board edge on each diagonal.
fn bishop_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;

    for (dr, df) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let mut r = rank + dr;
        let mut f = file + df;
        while (1..=6).contains(&r) && (1..=6).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }

    mask
}

/// Enumerates every subset of `mask` via the classic carry-rippler trick.
fn subsets_of(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1usize << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        if subset == mask {
            break;
        }
        subset = subset.wrapping_sub(mask) & mask;
    }
    subsets
}

fn build_entry<F>(square: usize, mask_fn: fn(usize) -> u64, attacks_fn: F, rng: &mut StdRng) -> Result<MagicEntry, String>
where
    F: Fn(usize, u64) -> u64,
{
    let mask = mask_fn(square);
    let blockers = subsets_of(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| attacks_fn(square, b)).collect();
    let shift = 64 - mask.count_ones();

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)
        .map_err(|e| format!("square {square}: {e}"))?;

    let mut table = vec![0u64; 1usize << mask.count_ones()];
    for (&b, &a) in blockers.iter().zip(attacks.iter()) {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = a;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = make_rng(seed);

    let mut rook_entries = Vec::with_capacity(64);
    for square in 0..64 {
        rook_entries.push(build_entry(
            square,
            rook_relevant_mask,
            rook_attacks_per_square,
            &mut rng,
        )?);
    }

    let mut bishop_entries = Vec::with_capacity(64);
    for square in 0..64 {
        bishop_entries.push(build_entry(
            square,
            bishop_relevant_mask,
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsets_of_enumerates_all_combinations() {
        let mask = 0b101u64;
        let subsets = subsets_of(mask);
        assert_eq!(subsets.len(), 4);
        assert!(subsets.contains(&0));
        assert!(subsets.contains(&0b001));
        assert!(subsets.contains(&0b100));
        assert!(subsets.contains(&0b101));
    }

    #[test]
    fn rook_relevant_mask_excludes_board_edge() {
        let mask = rook_relevant_mask(0); // a1
        assert_eq!(mask & (1u64 << 7), 0, "h-file edge must be excluded");
        assert_eq!(mask & (1u64 << 56), 0, "rank-8 edge must be excluded");
    }

    #[test]
    fn generate_magic_tables_is_deterministic_for_fixed_seed() {
        let a = generate_magic_tables(MagicTableSeed::Fixed(7)).unwrap();
        let b = generate_magic_tables(MagicTableSeed::Fixed(7)).unwrap();
        assert_eq!(a.rook.entries[0].magic, b.rook.entries[0].magic);
        assert_eq!(a.bishop.entries[27].magic, b.bishop.entries[27].magic);
    }
}
