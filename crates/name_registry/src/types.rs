//! Types for the name registry

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clock value (e.g. block height) used for all period and expiry math.
pub type ClockTick = u64;

/// Opaque caller identity (32 bytes, e.g. an Ed25519 public key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    /// Create from byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get as byte array
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Human-readable name claimed through the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainName(pub String);

impl DomainName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes, which is what the name bounds are measured in.
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DomainName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// SHA-256 digest binding a name to a secret salt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitmentHash(pub [u8; 32]);

impl CommitmentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(value: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(value, &mut out)?;
        Ok(Self(out))
    }
}

impl fmt::Display for CommitmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Paid commitment awaiting its reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreorderEntry {
    /// Who funded the preorder
    pub payer: Identity,
    /// Amount debited at preorder time
    pub amount_paid: u64,
    /// Clock tick of the preorder
    pub committed_at: ClockTick,
}

/// Ownership row for a registered name.
///
/// A row existing does not mean the name is live; compare `expires_at`
/// against the current tick with [`DomainRecord::is_active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub owner: Identity,
    pub registered_at: ClockTick,
    pub expires_at: ClockTick,
    pub resolver: Option<Identity>,
    /// Commitment that won the preorder, kept for audit
    pub name_commitment_hash: CommitmentHash,
}

impl DomainRecord {
    pub fn is_expired(&self, now: ClockTick) -> bool {
        now >= self.expires_at
    }

    pub fn is_active(&self, now: ClockTick) -> bool {
        !self.is_expired(now)
    }
}

/// Explicit transaction context handed to every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Already-authenticated caller
    pub caller: Identity,
    /// Clock tick the operation executes at
    pub now: ClockTick,
}

impl CallContext {
    pub fn new(caller: Identity, now: ClockTick) -> Self {
        Self { caller, now }
    }

    /// Sample the clock once for the whole operation.
    pub fn from_clock(caller: Identity, clock: &dyn crate::Clock) -> Self {
        Self::new(caller, clock.now())
    }
}
