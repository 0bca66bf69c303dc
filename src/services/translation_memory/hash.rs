use sha2::{Digest, Sha256};

/// Hex SHA-256 of the exact source text, used as the cache key.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_texts_get_distinct_keys() {
        assert_eq!(hash_text("Привет"), hash_text("Привет"));
        assert_ne!(hash_text("Привет"), hash_text("Привет "));
        assert_eq!(hash_text("").len(), 64);
    }
}
