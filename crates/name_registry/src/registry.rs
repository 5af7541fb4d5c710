//! Name registry engine
//!
//! Two-phase registration: a caller first pays for an opaque commitment
//! (`preorder`), then reveals the name and salt behind it (`register`).
//! Every later mutation is gated on ownership and, except for `renew`, on the
//! domain not having expired.

use crate::commitment::compute_commitment;
use crate::config::RegistryConfig;
use crate::errors::*;
use crate::ledger::Ledger;
use crate::locks::{LockKey, LockStripes};
use crate::store::{MemoryStore, RegistryStore, WriteBatch};
use crate::types::*;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registry engine
///
/// Owns the preorder, domain and record tables through its store. Each
/// mutating operation holds the row locks of the names and commitments it
/// touches, so that validation, the ledger debit and the table write happen
/// as one unit while operations on other rows proceed.
pub struct NameRegistry {
    config: RegistryConfig,
    store: Arc<dyn RegistryStore>,
    ledger: Arc<dyn Ledger>,
    locks: LockStripes,
}

impl fmt::Debug for NameRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NameRegistry {
    /// Create a registry over the given store and ledger
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn RegistryStore>,
        ledger: Arc<dyn Ledger>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            ledger,
            locks: LockStripes::default(),
        })
    }

    /// Create a registry backed by a fresh [`MemoryStore`]
    pub fn in_memory(config: RegistryConfig, ledger: Arc<dyn Ledger>) -> Result<Self> {
        Self::new(config, Arc::new(MemoryStore::new()), ledger)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn registration_fee(&self) -> u64 {
        self.config.registration_fee
    }

    /// Pay for a commitment to a (still secret) name.
    ///
    /// Overwrites any earlier preorder under the same hash.
    pub fn preorder(&self, ctx: &CallContext, hash: CommitmentHash, amount: u64) -> Result<()> {
        let required = self.config.registration_fee;
        if amount < required {
            debug!(
                target: "name_registry",
                "Preorder {} rejected: offered {} < fee {}",
                hash,
                amount,
                required
            );
            return Err(RegistryError::InsufficientPayment {
                offered: amount,
                required,
            });
        }

        let _guards = self.locks.lock(&[LockKey::Commitment(&hash)]);

        let entry = PreorderEntry {
            payer: ctx.caller,
            amount_paid: amount,
            committed_at: ctx.now,
        };

        self.charge(&ctx.caller, amount)?;
        self.commit(&ctx.caller, amount, WriteBatch::new().put_preorder(hash, entry))?;

        info!(
            target: "name_registry",
            "Preorder {} by {} at tick {} ({} paid)",
            hash,
            ctx.caller,
            ctx.now,
            amount
        );
        Ok(())
    }

    /// Reveal `name` and `salt` to claim the name behind a prior preorder.
    pub fn register(&self, ctx: &CallContext, name: &DomainName, salt: &[u8]) -> Result<()> {
        self.check_name_bounds(name)?;

        let hash = compute_commitment(name, salt);
        let _guards = self
            .locks
            .lock(&[LockKey::Commitment(&hash), LockKey::Name(name)]);

        if self.store.get_domain(name)?.is_some() {
            return Err(RegistryError::DomainAlreadyRegistered {
                name: name.to_string(),
            });
        }

        let preorder =
            self.store
                .get_preorder(&hash)?
                .ok_or_else(|| RegistryError::PreorderNotFound {
                    commitment: hash.to_hex(),
                })?;

        if let Some(deadline) = self.config.preorder_deadline(preorder.committed_at) {
            if ctx.now >= deadline {
                return Err(RegistryError::PreorderExpired {
                    commitment: hash.to_hex(),
                    expired_at: deadline,
                });
            }
        }

        if preorder.payer != ctx.caller {
            return Err(RegistryError::NotAuthorized {
                caller: ctx.caller.to_string(),
                subject: format!("preorder {hash}"),
            });
        }

        let record = DomainRecord {
            owner: ctx.caller,
            registered_at: ctx.now,
            expires_at: ctx.now.saturating_add(self.config.registration_period),
            resolver: None,
            name_commitment_hash: hash,
        };
        let expires_at = record.expires_at;

        self.store.apply(
            WriteBatch::new()
                .delete_preorder(hash)
                .put_domain(name.clone(), record),
        )?;

        info!(
            target: "name_registry",
            "Registered {} to {} at tick {} (expires {})",
            name,
            ctx.caller,
            ctx.now,
            expires_at
        );
        Ok(())
    }

    /// Hand the domain to `new_owner`. Resolver and records carry over.
    pub fn transfer(&self, ctx: &CallContext, name: &DomainName, new_owner: Identity) -> Result<()> {
        let _guards = self.locks.lock(&[LockKey::Name(name)]);

        let mut record = self.owned_active(ctx, name)?;
        let previous = record.owner;
        record.owner = new_owner;
        self.store
            .apply(WriteBatch::new().put_domain(name.clone(), record))?;

        info!(
            target: "name_registry",
            "Transferred {} from {} to {}",
            name,
            previous,
            new_owner
        );
        Ok(())
    }

    /// Extend the expiry by one registration period, counted from the
    /// current expiry rather than from `now`. Allowed after lapse.
    pub fn renew(&self, ctx: &CallContext, name: &DomainName) -> Result<()> {
        let _guards = self.locks.lock(&[LockKey::Name(name)]);

        let mut record = self.owned(ctx, name)?;
        let fee = self.config.registration_fee;
        record.expires_at = record
            .expires_at
            .saturating_add(self.config.registration_period);
        let expires_at = record.expires_at;

        self.charge(&ctx.caller, fee)?;
        self.commit(
            &ctx.caller,
            fee,
            WriteBatch::new().put_domain(name.clone(), record),
        )?;

        info!(
            target: "name_registry",
            "Renewed {} until tick {}",
            name,
            expires_at
        );
        Ok(())
    }

    /// Set or clear (`None`) the resolver of a live domain.
    pub fn set_resolver(
        &self,
        ctx: &CallContext,
        name: &DomainName,
        resolver: Option<Identity>,
    ) -> Result<()> {
        let _guards = self.locks.lock(&[LockKey::Name(name)]);

        let mut record = self.owned_active(ctx, name)?;
        record.resolver = resolver;
        self.store
            .apply(WriteBatch::new().put_domain(name.clone(), record))?;

        debug!(
            target: "name_registry",
            "Resolver of {} set to {:?}",
            name,
            resolver.map(|r| r.to_string())
        );
        Ok(())
    }

    /// Upsert a key/value record on a live domain.
    pub fn set_record(
        &self,
        ctx: &CallContext,
        name: &DomainName,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let _guards = self.locks.lock(&[LockKey::Name(name)]);

        self.owned_active(ctx, name)?;
        self.check_record_bounds(name, key, value)?;
        self.store.apply(WriteBatch::new().put_record(
            name.clone(),
            key.to_string(),
            value.to_string(),
        ))?;

        debug!(target: "name_registry", "Record {}[{}] updated", name, key);
        Ok(())
    }

    /// Raw domain row, expired or not.
    pub fn get_domain(&self, name: &DomainName) -> Result<Option<DomainRecord>> {
        Ok(self.store.get_domain(name)?)
    }

    pub fn get_record(&self, name: &DomainName, key: &str) -> Result<Option<String>> {
        Ok(self.store.get_record(name, key)?)
    }

    /// All records stored under `name`, ordered by key
    pub fn list_records(&self, name: &DomainName) -> Result<Vec<(String, String)>> {
        Ok(self.store.list_records(name)?)
    }

    /// True iff no row exists for `name`. Expired rows still count as taken.
    pub fn is_available(&self, name: &DomainName) -> Result<bool> {
        Ok(self.store.get_domain(name)?.is_none())
    }

    /// True iff a row exists and has not expired at `now`.
    pub fn is_active(&self, name: &DomainName, now: ClockTick) -> Result<bool> {
        Ok(self
            .store
            .get_domain(name)?
            .is_some_and(|record| record.is_active(now)))
    }

    pub fn get_expiration(&self, name: &DomainName) -> Result<ClockTick> {
        self.store
            .get_domain(name)?
            .map(|record| record.expires_at)
            .ok_or_else(|| RegistryError::DomainNotRegistered {
                name: name.to_string(),
            })
    }

    pub fn get_preorder(&self, hash: &CommitmentHash) -> Result<Option<PreorderEntry>> {
        Ok(self.store.get_preorder(hash)?)
    }

    /// Names currently recorded under `owner`, expired ones included
    pub fn list_owner_domains(&self, owner: &Identity) -> Result<Vec<DomainName>> {
        Ok(self
            .store
            .list_domains()?
            .into_iter()
            .filter(|(_, record)| record.owner == *owner)
            .map(|(name, _)| name)
            .collect())
    }

    /// Delete preorders that can no longer be revealed. Returns how many went.
    pub fn prune_stale_preorders(&self, now: ClockTick) -> Result<usize> {
        let _guards = self.locks.lock_all();

        let stale: Vec<CommitmentHash> = self
            .store
            .list_preorders()?
            .into_iter()
            .filter(|(_, entry)| {
                self.config
                    .preorder_deadline(entry.committed_at)
                    .is_some_and(|deadline| now >= deadline)
            })
            .map(|(hash, _)| hash)
            .collect();

        let batch = stale
            .iter()
            .fold(WriteBatch::new(), |batch, hash| batch.delete_preorder(*hash));
        if batch.is_empty() {
            return Ok(0);
        }
        self.store.apply(batch)?;

        info!(
            target: "name_registry",
            "Pruned {} stale preorders at tick {}",
            stale.len(),
            now
        );
        Ok(stale.len())
    }

    fn check_name_bounds(&self, name: &DomainName) -> Result<()> {
        let (min, max) = (self.config.min_name_len, self.config.max_name_len);
        if name.byte_len() < min || name.byte_len() > max {
            return Err(RegistryError::InvalidDomainName {
                name: name.to_string(),
                min,
                max,
            });
        }
        Ok(())
    }

    fn check_record_bounds(&self, name: &DomainName, key: &str, value: &str) -> Result<()> {
        let reason = if key.is_empty() {
            Some("record key is empty".to_string())
        } else if key.len() > self.config.max_record_key_len {
            Some(format!(
                "record key exceeds {} bytes",
                self.config.max_record_key_len
            ))
        } else if value.len() > self.config.max_record_value_len {
            Some(format!(
                "record value exceeds {} bytes",
                self.config.max_record_value_len
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RegistryError::InvalidRecord {
                name: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Look up `name` and require the caller to own it.
    fn owned(&self, ctx: &CallContext, name: &DomainName) -> Result<DomainRecord> {
        let record =
            self.store
                .get_domain(name)?
                .ok_or_else(|| RegistryError::DomainNotRegistered {
                    name: name.to_string(),
                })?;

        if record.owner != ctx.caller {
            debug!(
                target: "name_registry",
                "{} is not the owner of {}",
                ctx.caller,
                name
            );
            return Err(RegistryError::NotAuthorized {
                caller: ctx.caller.to_string(),
                subject: name.to_string(),
            });
        }
        Ok(record)
    }

    /// [`Self::owned`] plus the domain must not have expired at `ctx.now`.
    fn owned_active(&self, ctx: &CallContext, name: &DomainName) -> Result<DomainRecord> {
        let record = self.owned(ctx, name)?;
        if record.is_expired(ctx.now) {
            return Err(RegistryError::DomainExpired {
                name: name.to_string(),
                expires_at: record.expires_at,
            });
        }
        Ok(record)
    }

    fn charge(&self, payer: &Identity, amount: u64) -> Result<()> {
        self.ledger.debit(payer, amount).map_err(|e| {
            warn!(
                target: "name_registry",
                "Debit of {} from {} failed: {}",
                amount,
                payer,
                e
            );
            RegistryError::PaymentFailed(e)
        })
    }

    /// Apply a batch that follows a successful debit.
    fn commit(&self, payer: &Identity, paid: u64, batch: WriteBatch) -> Result<()> {
        self.store.apply(batch).map_err(|e| {
            error!(
                target: "name_registry",
                "Store write failed after debiting {} from {}: {}",
                paid,
                payer,
                e
            );
            RegistryError::StorageError(e)
        })
    }
}
