//! The content-addressed code registry.
//!
//! Uploaded bytecode is addressed by the sha256 of its decompressed bytes;
//! gzip uploads are detected by magic bytes and decompressed with a hard
//! size bound before hashing, so the same code always maps to the same
//! checksum regardless of how it was shipped.

use std::io::Read;

use flate2::read::GzDecoder;
use ibc_aegis_types::path;
use ibc_aegis_types::store::HostStore;

use crate::checksum::Checksum;
use crate::error::CodeRegistryError;

/// The two magic bytes opening every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn is_gzip(code: &[u8]) -> bool {
    code.len() >= 2 && code[..2] == GZIP_MAGIC
}

fn decompress_gzip(code: &[u8], max_size: usize) -> Result<Vec<u8>, CodeRegistryError> {
    let mut decompressed = Vec::new();
    let mut bounded = GzDecoder::new(code).take(max_size as u64 + 1);
    bounded
        .read_to_end(&mut decompressed)
        .map_err(|e| CodeRegistryError::InvalidGzip {
            reason: e.to_string(),
        })?;
    if decompressed.len() > max_size {
        return Err(CodeRegistryError::TooLarge {
            size: decompressed.len(),
            max: max_size,
        });
    }
    Ok(decompressed)
}

/// Store uploaded code, decompressing if needed, and return its checksum.
///
/// # Errors
/// Rejects empty or oversized uploads, gzip streams that do not
/// decompress, and checksums that are already stored.
pub fn store_code(
    store: &mut dyn HostStore,
    max_size: usize,
    code: &[u8],
) -> Result<Checksum, CodeRegistryError> {
    if code.is_empty() {
        return Err(CodeRegistryError::EmptyCode);
    }
    if code.len() > max_size {
        return Err(CodeRegistryError::TooLarge {
            size: code.len(),
            max: max_size,
        });
    }

    let decompressed = if is_gzip(code) {
        decompress_gzip(code, max_size)?
    } else {
        code.to_vec()
    };
    if decompressed.is_empty() {
        return Err(CodeRegistryError::EmptyCode);
    }

    let checksum = Checksum::of(&decompressed);
    let code_path = path::code(&checksum.to_hex());
    if store.has(code_path.as_bytes()) {
        return Err(CodeRegistryError::Duplicate { checksum });
    }
    store.set(code_path.as_bytes(), &decompressed);
    Ok(checksum)
}

/// The stored (decompressed) code bytes for a checksum.
#[must_use]
pub fn code(store: &dyn HostStore, checksum: &Checksum) -> Option<Vec<u8>> {
    store.get(path::code(&checksum.to_hex()).as_bytes())
}

/// Whether code is stored under the checksum.
#[must_use]
pub fn has_code(store: &dyn HostStore, checksum: &Checksum) -> bool {
    store.has(path::code(&checksum.to_hex()).as_bytes())
}
