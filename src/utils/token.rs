//! Opaque tokens for refresh sessions and password resets.

use rand::distr::{Alphanumeric, SampleString};

/// Length of every opaque token handed to clients.
pub const OPAQUE_TOKEN_LENGTH: usize = 64;

/// Generates a random alphanumeric token from the thread-local CSPRNG.
pub fn generate_opaque_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), OPAQUE_TOKEN_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let token = generate_opaque_token();
        assert_eq!(token.len(), OPAQUE_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_opaque_token()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
