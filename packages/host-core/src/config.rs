//! Host configuration.

use serde::{Deserialize, Serialize};

/// Static configuration of an IBC host instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostConfig {
    /// The address allowed to upload code and migrate client bindings.
    pub authority: String,
    /// Key prefix this chain commits its IBC state under. Counterparties
    /// verify proofs about this chain below this prefix.
    #[serde(default = "default_commitment_prefix")]
    pub commitment_prefix: String,
    /// Upper bound on uploaded code size, after decompression.
    #[serde(default = "default_max_code_size")]
    pub max_code_size: usize,
    /// Connection versions this host supports, in preference order.
    #[serde(default = "default_supported_versions")]
    pub supported_versions: Vec<String>,
}

fn default_commitment_prefix() -> String {
    "ibc".to_string()
}

/// 3 MiB, the conventional bound for uploaded light-client bytecode.
const fn default_max_code_size() -> usize {
    3 * 1024 * 1024
}

fn default_supported_versions() -> Vec<String> {
    vec![ibc_aegis_types::connection::DEFAULT_VERSION.to_string()]
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            authority: String::new(),
            commitment_prefix: default_commitment_prefix(),
            max_code_size: default_max_code_size(),
            supported_versions: default_supported_versions(),
        }
    }
}

impl HostConfig {
    /// The commitment prefix as bytes, as used in proof paths.
    #[must_use]
    pub fn commitment_prefix_bytes(&self) -> Vec<u8> {
        self.commitment_prefix.as_bytes().to_vec()
    }
}
