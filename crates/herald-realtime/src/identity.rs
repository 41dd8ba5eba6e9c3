use herald_common::new_short_id;
use serde::{Deserialize, Serialize};

/// Who this client is and which section of the app it is viewing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub client_id: String,
    pub location: String,
}

impl ClientIdentity {
    pub fn new(client_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            location: location.into(),
        }
    }

    /// Anonymous identity of the form `visitor-xxxxxx`.
    pub fn visitor(location: impl Into<String>) -> Self {
        Self::new(format!("visitor-{}", new_short_id()), location)
    }

    /// Configured id when present, otherwise a fresh visitor id.
    pub fn from_config(client_id: Option<&str>, location: &str) -> Self {
        match client_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::new(id, location),
            None => Self::visitor(location),
        }
    }

    pub fn is_visitor(&self) -> bool {
        self.client_id.starts_with("visitor-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_ids_have_six_hex_chars() {
        let identity = ClientIdentity::visitor("public");
        let suffix = identity.client_id.strip_prefix("visitor-").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(identity.location, "public");
        assert!(identity.is_visitor());
    }

    #[test]
    fn visitor_ids_differ() {
        let a = ClientIdentity::visitor("public");
        let b = ClientIdentity::visitor("public");
        assert_ne!(a.client_id, b.client_id);
    }

    #[test]
    fn from_config_prefers_configured_id() {
        let identity = ClientIdentity::from_config(Some("editor-7"), "admin");
        assert_eq!(identity.client_id, "editor-7");
        assert!(!identity.is_visitor());

        assert!(ClientIdentity::from_config(Some("  "), "admin").is_visitor());
        assert!(ClientIdentity::from_config(None, "admin").is_visitor());
    }
}
