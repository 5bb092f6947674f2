use serde::{Deserialize, Serialize};

/// Name of a persisted token entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    pub const ALL: [TokenKey; 2] = [TokenKey::Access, TokenKey::Refresh];

    /// Storage entry name
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKey::Access => "access",
            TokenKey::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access/refresh token pair issued by the identity service.
///
/// The access token is short-lived and sent with every request; the refresh
/// token is long-lived and only used to mint a new access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens stay out of debug output and logs
impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &crate::utils::mask_token(&self.access))
            .field("refresh", &crate::utils::mask_token(&self.refresh))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key_names() {
        assert_eq!(TokenKey::Access.as_str(), "access");
        assert_eq!(TokenKey::Refresh.to_string(), "refresh");
    }

    #[test]
    fn test_credential_pair_debug_masks_tokens() {
        let pair = CredentialPair::new("access-token-value", "refresh-token-value");
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("access-token-value"));
        assert!(!debug.contains("refresh-token-value"));
    }

    #[test]
    fn test_credential_pair_parses_token_response() {
        let pair: CredentialPair = serde_json::from_str(r#"{"access":"A1","refresh":"R1"}"#)
            .expect("token response parses");
        assert_eq!(pair, CredentialPair::new("A1", "R1"));
    }
}
