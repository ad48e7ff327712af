use sha2::{Digest, Sha256};

use crate::record::University;

/// Short, well-formed references are embedded directly in the id; anything
/// longer or containing other characters is hashed so the id stays stable
/// and filesystem/URL safe.
const MAX_LITERAL_REF: usize = 20;

/// Build the stable record id: `{CODE}-{reference}` or `{CODE}-{hash}`.
/// The same key always maps to the same id across runs.
pub fn make_id(university: University, key: &str) -> String {
    let key = crate::normalize::clean(key);
    let key = if key.is_empty() { "unknown".to_string() } else { key };
    let code = university.code().to_uppercase();

    if key.len() <= MAX_LITERAL_REF
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return format!("{code}-{key}");
    }

    let digest = Sha256::digest(key.as_bytes());
    let mut hex = String::with_capacity(10);
    for byte in digest.iter().take(5) {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!("{code}-{hex}")
}
