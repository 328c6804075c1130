//! Session-scoped identifier tokens for windows and controller bindings.

use rand::Rng;

/// Length of generated object identifiers.
pub const OBJECT_ID_LEN: usize = 8;

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates an 8-character alphanumeric token whose first character is alphabetic.
///
/// Tokens are safe to use as DOM ids and selectors. Uniqueness is probabilistic; callers that
/// need a guarantee check against live ids with [`generate_unique_object_id`].
pub fn generate_object_id() -> String {
    let mut rng = rand::thread_rng();
    let mut token = String::with_capacity(OBJECT_ID_LEN);
    token.push(ALPHA[rng.gen_range(0..ALPHA.len())] as char);
    for _ in 1..OBJECT_ID_LEN {
        token.push(ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char);
    }
    token
}

/// Generates tokens until `is_taken` rejects none of them.
pub fn generate_unique_object_id(is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let token = generate_object_id();
        if !is_taken(&token) {
            return token;
        }
    }
}

/// Returns whether `raw` has the generated token shape.
pub fn is_object_id(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == OBJECT_ID_LEN
        && bytes[0].is_ascii_alphabetic()
        && bytes.iter().all(u8::is_ascii_alphanumeric)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_ids_have_token_shape() {
        for _ in 0..500 {
            let id = generate_object_id();
            assert!(is_object_id(&id), "bad token {id}");
        }
    }

    #[test]
    fn shape_check_rejects_malformed_tokens() {
        assert!(is_object_id("a1B2c3D4"));
        assert!(!is_object_id("1abcdefg"));
        assert!(!is_object_id("abc"));
        assert!(!is_object_id("abcdefg-"));
    }

    #[test]
    fn unique_generation_skips_taken_tokens() {
        let mut taken = HashSet::new();
        for _ in 0..200 {
            let id = generate_unique_object_id(|candidate| taken.contains(candidate));
            assert!(taken.insert(id));
        }
    }
}
