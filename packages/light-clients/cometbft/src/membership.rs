//! ICS-23 Merkle membership and non-membership proofs.

use ibc_core_commitment_types::commitment::CommitmentRoot;
use ibc_core_commitment_types::merkle::{MerklePath, MerkleProof};
use ibc_core_commitment_types::proto::ics23::HostFunctionsManager;
use ibc_core_commitment_types::specs::ProofSpecs;
use ibc_core_host_types::path::PathBytes;
use ibc_proto::ibc::core::commitment::v1::MerkleProof as RawMerkleProof;
use ibc_proto::Protobuf;

use crate::error::CometBftError;

fn decode_proof(proof_bytes: &[u8]) -> Result<MerkleProof, CometBftError> {
    <MerkleProof as Protobuf<RawMerkleProof>>::decode_vec(proof_bytes).map_err(|e| {
        CometBftError::InvalidProof {
            reason: format!("proof decode: {e}"),
        }
    })
}

fn merkle_path(prefix: &[u8], path: &[u8]) -> MerklePath {
    MerklePath::new(vec![
        PathBytes::from_bytes(prefix.to_vec()),
        PathBytes::from_bytes(path.to_vec()),
    ])
}

/// Verify that `value` is committed under `prefix/path` in the state root.
///
/// # Errors
/// Returns [`CometBftError::InvalidProof`] if the proof does not decode or
/// does not verify against the root.
pub fn verify_membership(
    root: &[u8],
    prefix: &[u8],
    path: &[u8],
    value: &[u8],
    proof_bytes: &[u8],
) -> Result<(), CometBftError> {
    let proof = decode_proof(proof_bytes)?;
    let commitment_root = CommitmentRoot::from_bytes(root);

    proof
        .verify_membership::<HostFunctionsManager>(
            &ProofSpecs::cosmos(),
            commitment_root.into(),
            merkle_path(prefix, path),
            value.to_vec(),
            0,
        )
        .map_err(|e| CometBftError::InvalidProof {
            reason: e.to_string(),
        })
}

/// Verify that nothing is committed under `prefix/path` in the state root.
///
/// # Errors
/// Returns [`CometBftError::InvalidProof`] if the proof does not decode or
/// does not prove exclusion.
pub fn verify_non_membership(
    root: &[u8],
    prefix: &[u8],
    path: &[u8],
    proof_bytes: &[u8],
) -> Result<(), CometBftError> {
    let proof = decode_proof(proof_bytes)?;
    let commitment_root = CommitmentRoot::from_bytes(root);

    proof
        .verify_non_membership::<HostFunctionsManager>(
            &ProofSpecs::cosmos(),
            commitment_root.into(),
            merkle_path(prefix, path),
        )
        .map_err(|e| CometBftError::InvalidProof {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::{verify_membership, verify_non_membership};
    use crate::error::CometBftError;

    #[test]
    fn garbage_proof_bytes_do_not_verify() {
        let err = verify_membership(&[0; 32], b"ibc", b"path", b"value", b"\x01garbage");
        assert!(matches!(err, Err(CometBftError::InvalidProof { .. })));

        let err = verify_non_membership(&[0; 32], b"ibc", b"path", b"\x01garbage");
        assert!(matches!(err, Err(CometBftError::InvalidProof { .. })));
    }

    #[test]
    fn empty_proof_does_not_verify() {
        // An empty message decodes to a proof with no entries, which must
        // be rejected rather than treated as vacuously true.
        let err = verify_membership(&[0; 32], b"ibc", b"path", b"value", &[]);
        assert!(err.is_err());
    }
}
