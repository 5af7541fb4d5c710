//! Signed call verification
//!
//! The registry treats callers as already authenticated. Hosts that receive
//! Ed25519-signed calls can use [`verify_signed_call`] to turn one into the
//! [`Identity`] placed in a [`crate::CallContext`].

use crate::errors::{RegistryError, Result};
use crate::types::Identity;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

pub const PREORDER_TAG: &[u8] = b"IPPAN_NAME_PREORDER";
pub const REGISTER_TAG: &[u8] = b"IPPAN_NAME_REGISTER";
pub const TRANSFER_TAG: &[u8] = b"IPPAN_NAME_TRANSFER";
pub const RENEW_TAG: &[u8] = b"IPPAN_NAME_RENEW";
pub const UPDATE_TAG: &[u8] = b"IPPAN_NAME_UPDATE";

/// Digest the signer is expected to have signed.
pub fn signing_message(tag: &[u8], payload: &[u8], signer: &Identity) -> [u8; 32] {
    let mut message = Vec::with_capacity(tag.len() + payload.len() + 32);
    message.extend_from_slice(tag);
    message.extend_from_slice(payload);
    message.extend_from_slice(signer.as_bytes());
    Sha256::digest(&message).into()
}

/// Check `signature` over `payload` by `signer` and return the signer as caller.
pub fn verify_signed_call(
    tag: &[u8],
    payload: &[u8],
    signer: &Identity,
    signature: &[u8],
) -> Result<Identity> {
    let unauthorized = || RegistryError::NotAuthorized {
        caller: signer.to_string(),
        subject: String::from_utf8_lossy(tag).into_owned(),
    };

    if signature.len() != 64 {
        return Err(unauthorized());
    }

    let Ok(verifying_key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
        return Err(unauthorized());
    };

    let Ok(signature) = Signature::from_slice(signature) else {
        return Err(unauthorized());
    };

    let digest = signing_message(tag, payload, signer);
    verifying_key
        .verify(&digest, &signature)
        .map_err(|_| unauthorized())?;

    Ok(*signer)
}
