//! Cache-key fingerprinting.
//!
//! The key is a change-detection digest, not a security boundary. Its
//! components are fed in a fixed order with a NUL byte between them:
//!
//! ```text
//! version \0 options-json \0 source \0 rel-filename \0 config-string
//!   \0 config-files \0 "instrument"|"" \0 NODE_ENV \0 BABEL_ENV
//! ```

use sha2::{Digest, Sha256};

/// Identifies this adapter build. Any release invalidates every key the
/// previous one produced.
pub const ADAPTER_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION"));

const SEPARATOR: &[u8] = b"\0";
/// Hex characters kept from the digest.
pub const KEY_LEN: usize = 32;

/// Environment values folded into the key, captured once instead of read
/// on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvContext {
    pub node_env: Option<String>,
    pub babel_env: Option<String>,
}

impl EnvContext {
    pub fn from_env() -> Self {
        Self {
            node_env: std::env::var("NODE_ENV").ok(),
            babel_env: std::env::var("BABEL_ENV").ok(),
        }
    }
}

/// Ordered, NUL-separated digest builder.
pub struct Fingerprint {
    hasher: Sha256,
    empty: bool,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprint {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            empty: true,
        }
    }

    pub fn update(&mut self, part: impl AsRef<[u8]>) -> &mut Self {
        if !self.empty {
            self.hasher.update(SEPARATOR);
        }
        self.empty = false;
        self.hasher.update(part.as_ref());
        self
    }

    /// Lowercase hex, truncated to [`KEY_LEN`].
    pub fn finish(self) -> String {
        let mut key = hex::encode(self.hasher.finalize());
        key.truncate(KEY_LEN);
        key
    }
}

/// Everything a cache key depends on, already resolved.
#[derive(Debug, Clone, Copy)]
pub struct CacheKeyParts<'a> {
    pub version: &'a str,
    pub options_json: &'a str,
    pub file_data: &'a [u8],
    pub relative_filename: &'a str,
    pub config_string: &'a str,
    pub config_files: &'a str,
    pub instrument: bool,
    pub env: &'a EnvContext,
}

impl CacheKeyParts<'_> {
    pub fn digest(&self) -> String {
        let mut fp = Fingerprint::new();
        fp.update(self.version)
            .update(self.options_json)
            .update(self.file_data)
            .update(self.relative_filename)
            .update(self.config_string)
            .update(self.config_files)
            .update(if self.instrument { "instrument" } else { "" })
            .update(self.env.node_env.as_deref().unwrap_or_default())
            .update(self.env.babel_env.as_deref().unwrap_or_default());
        fp.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(env: &'a EnvContext) -> CacheKeyParts<'a> {
        CacheKeyParts {
            version: ADAPTER_VERSION,
            options_json: r#"{"plugins":[]}"#,
            file_data: b"const x = 1;",
            relative_filename: "src/a.js",
            config_string: "{}",
            config_files: "",
            instrument: false,
            env,
        }
    }

    #[test]
    fn digest_is_deterministic() {
        let env = EnvContext::default();
        assert_eq!(parts(&env).digest(), parts(&env).digest());
    }

    #[test]
    fn digest_is_32_lowercase_hex() {
        let env = EnvContext::default();
        let key = parts(&env).digest();
        assert_eq!(key.len(), KEY_LEN);
        assert!(key
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn every_component_changes_the_key() {
        let env = EnvContext::default();
        let base = parts(&env).digest();

        let node = EnvContext {
            node_env: Some("test".into()),
            ..Default::default()
        };
        let babel = EnvContext {
            babel_env: Some("test".into()),
            ..Default::default()
        };

        let variants = [
            CacheKeyParts { version: "babel_jest@0.0.0", ..parts(&env) },
            CacheKeyParts { options_json: "{}", ..parts(&env) },
            CacheKeyParts { file_data: b"const x = 2;", ..parts(&env) },
            CacheKeyParts { relative_filename: "src/b.js", ..parts(&env) },
            CacheKeyParts { config_string: "{\"a\":1}", ..parts(&env) },
            CacheKeyParts { config_files: "/repo/babel.config.js", ..parts(&env) },
            CacheKeyParts { instrument: true, ..parts(&env) },
            parts(&node),
            parts(&babel),
        ];
        for v in variants {
            assert_ne!(v.digest(), base);
        }
    }

    #[test]
    fn node_env_and_babel_env_are_distinct_slots() {
        let node = EnvContext {
            node_env: Some("test".into()),
            ..Default::default()
        };
        let babel = EnvContext {
            babel_env: Some("test".into()),
            ..Default::default()
        };
        assert_ne!(parts(&node).digest(), parts(&babel).digest());
    }

    #[test]
    fn separator_keeps_boundaries() {
        let mut a = Fingerprint::new();
        a.update("ab").update("");
        let mut b = Fingerprint::new();
        b.update("a").update("b");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn version_names_the_crate() {
        assert!(ADAPTER_VERSION.starts_with("babel_jest@"));
    }
}
