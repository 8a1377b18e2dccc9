use sha2::{Digest, Sha256};
use std::fmt;

#[cfg(test)]
pub mod test;

/// Hex-encoded SHA-256 digest used to derive assembly labels.
///
/// Equal inputs always produce equal names, so labels stay stable across runs
/// and builds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StableName(String);

impl StableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn stable_name(bytes: impl AsRef<[u8]>) -> StableName {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    StableName(format!("{:x}", hasher.finalize()))
}
