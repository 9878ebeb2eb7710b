use thiserror::Error;

/// Path of the obfuscated-address links the directory emits in place of `mailto:`.
pub const EMAIL_PROTECTION_PREFIX: &str = "/cdn-cgi/l/email-protection#";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailDecodeError {
    #[error("token has no key byte")]
    Empty,
    #[error("token has an odd number of hex digits")]
    OddLength,
    #[error("invalid hex pair {0:?}")]
    InvalidHex(String),
}

/// Decodes an email-protection link. Values without the token path are
/// returned unchanged.
pub fn decode_email(value: &str) -> Result<String, EmailDecodeError> {
    match value.find(EMAIL_PROTECTION_PREFIX) {
        Some(at) => decode_token(&value[at + EMAIL_PROTECTION_PREFIX.len()..]),
        None => Ok(value.to_string()),
    }
}

/// Decodes a bare hex token. The first pair is the XOR key and each
/// following pair is one character.
pub fn decode_token(token: &str) -> Result<String, EmailDecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(EmailDecodeError::Empty);
    }
    if token.len() % 2 != 0 {
        return Err(EmailDecodeError::OddLength);
    }

    let bytes = token
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = String::from_utf8_lossy(pair);
            if !pair.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(EmailDecodeError::InvalidHex(pair.into_owned()));
            }
            u8::from_str_radix(&pair, 16).map_err(|_| EmailDecodeError::InvalidHex(pair.into_owned()))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let key = bytes[0];
    Ok(bytes[1..].iter().map(|b| char::from(key ^ b)).collect())
}
