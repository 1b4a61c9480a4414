use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use nanoid::nanoid;
use rand::Rng;

const TOKEN_BYTES: usize = 32;

pub fn generate_uuid() -> String {
    nanoid!()
}

/// Generate an unguessable invitation token: 32 random bytes,
/// base64 url-safe encoded so it can live in a link path.
pub fn generate_invite_token() -> String {
    let mut token_bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut token_bytes);
    URL_SAFE_NO_PAD.encode(token_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_tokens_are_unique() {
        let first = generate_invite_token();
        let second = generate_invite_token();

        assert_ne!(first, second);
    }

    #[test]
    fn test_invite_token_is_url_safe() {
        let token = generate_invite_token();

        // 32 bytes encode to 43 characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
