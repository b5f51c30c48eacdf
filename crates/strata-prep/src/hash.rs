use sha2::{Digest, Sha256};

use crate::prepare::PreparedTable;

/// Fingerprints a prepared table over identifiers, column names and value bits.
pub fn fingerprint_prepared(table: &PreparedTable) -> String {
    let mut hasher = Sha256::new();
    hasher.update(table.id_column().as_bytes());
    hasher.update([0u8]);
    for id in table.ids() {
        hasher.update(id.to_string().as_bytes());
        hasher.update([0u8]);
    }
    for column in table.columns() {
        hasher.update(column.name.as_bytes());
        hasher.update([0u8]);
    }
    for value in table.values() {
        hasher.update(value.to_bits().to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprints a dissimilarity matrix over its dimension and value bits.
pub fn fingerprint_distances(n: usize, values: &[f64]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((n as u64).to_le_bytes());
    for value in values {
        hasher.update(value.to_bits().to_le_bytes());
    }
    hex::encode(hasher.finalize())
}
