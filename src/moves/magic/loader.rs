//! Process-wide access to the rook/bishop magic tables.
//!
//! Generation (or, with the `load_magic` feature, deserialization of a
//! precomputed blob) happens once per process; every caller after the
//! first gets a cheap clone of the cached tables.

use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;
use once_cell::sync::OnceCell;

#[cfg(feature = "load_magic")]
const MAGIC_TABLE_PATH: &str = "magic_tables.bin";

#[cfg(feature = "load_magic")]
fn load_from_disk() -> Option<MagicTables> {
    use std::fs::File;
    use std::io::BufReader;

    let file = File::open(MAGIC_TABLE_PATH).ok()?;
    match bincode::deserialize_from(BufReader::new(file)) {
        Ok(tables) => Some(tables),
        Err(err) => {
            tracing::warn!(
                "failed to deserialize {}: {err}; regenerating magic tables",
                MAGIC_TABLE_PATH
            );
            None
        }
    }
}

fn build_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    {
        if let Some(tables) = load_from_disk() {
            return tables;
        }
    }

    generate_magic_tables(MagicTableSeed::FromEntropy).expect("magic table generation failed")
}

/// Returns a clone of the process-wide magic tables, generating (or
/// loading) them lazily on first use.
pub fn load_magic_tables() -> MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(build_tables).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_magic_tables_is_internally_consistent() {
        let tables = load_magic_tables();
        // d4 with no blockers should match the unmagicked scan result.
        let expected = crate::moves::magic::attacks::rook_attacks_per_square(27, 0);
        assert_eq!(tables.rook.get_attacks(27, 0), expected);
    }

    #[test]
    fn repeated_calls_share_the_same_cache() {
        let a = load_magic_tables();
        let b = load_magic_tables();
        assert_eq!(a.rook.entries[0].magic, b.rook.entries[0].magic);
    }
}
