//! Persistence for the preorder, domain and record tables
//!
//! Reads are point lookups or scans; writes go through [`WriteBatch`] so that
//! every registry operation lands in the tables as a single atomic unit.

use crate::types::{CommitmentHash, DomainName, DomainRecord, PreorderEntry};
use anyhow::Result;
use parking_lot::RwLock;
use sled::transaction::TransactionError;
use sled::{Transactional, Tree};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Single table mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PutPreorder(CommitmentHash, PreorderEntry),
    DeletePreorder(CommitmentHash),
    PutDomain(DomainName, DomainRecord),
    PutRecord {
        name: DomainName,
        key: String,
        value: String,
    },
}

/// Ordered set of mutations applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_preorder(mut self, hash: CommitmentHash, entry: PreorderEntry) -> Self {
        self.ops.push(Mutation::PutPreorder(hash, entry));
        self
    }

    pub fn delete_preorder(mut self, hash: CommitmentHash) -> Self {
        self.ops.push(Mutation::DeletePreorder(hash));
        self
    }

    pub fn put_domain(mut self, name: DomainName, record: DomainRecord) -> Self {
        self.ops.push(Mutation::PutDomain(name, record));
        self
    }

    pub fn put_record(mut self, name: DomainName, key: String, value: String) -> Self {
        self.ops.push(Mutation::PutRecord { name, key, value });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Storage backend for the registry tables
pub trait RegistryStore: Send + Sync {
    fn get_preorder(&self, hash: &CommitmentHash) -> Result<Option<PreorderEntry>>;
    fn get_domain(&self, name: &DomainName) -> Result<Option<DomainRecord>>;
    fn get_record(&self, name: &DomainName, key: &str) -> Result<Option<String>>;
    /// All records of a name, ordered by key
    fn list_records(&self, name: &DomainName) -> Result<Vec<(String, String)>>;
    fn list_domains(&self) -> Result<Vec<(DomainName, DomainRecord)>>;
    fn list_preorders(&self) -> Result<Vec<(CommitmentHash, PreorderEntry)>>;
    /// Apply every mutation in `batch`, or none of them.
    fn apply(&self, batch: WriteBatch) -> Result<()>;
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    preorders: RwLock<HashMap<CommitmentHash, PreorderEntry>>,
    domains: RwLock<HashMap<DomainName, DomainRecord>>,
    records: RwLock<HashMap<DomainName, BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for MemoryStore {
    fn get_preorder(&self, hash: &CommitmentHash) -> Result<Option<PreorderEntry>> {
        Ok(self.preorders.read().get(hash).cloned())
    }

    fn get_domain(&self, name: &DomainName) -> Result<Option<DomainRecord>> {
        Ok(self.domains.read().get(name).cloned())
    }

    fn get_record(&self, name: &DomainName, key: &str) -> Result<Option<String>> {
        Ok(self
            .records
            .read()
            .get(name)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn list_records(&self, name: &DomainName) -> Result<Vec<(String, String)>> {
        Ok(self
            .records
            .read()
            .get(name)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_domains(&self) -> Result<Vec<(DomainName, DomainRecord)>> {
        let mut domains: Vec<_> = self
            .domains
            .read()
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect();
        domains.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(domains)
    }

    fn list_preorders(&self) -> Result<Vec<(CommitmentHash, PreorderEntry)>> {
        let mut preorders: Vec<_> = self
            .preorders
            .read()
            .iter()
            .map(|(hash, entry)| (*hash, entry.clone()))
            .collect();
        preorders.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(preorders)
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        // Fixed lock order: preorders, domains, records.
        let mut preorders = self.preorders.write();
        let mut domains = self.domains.write();
        let mut records = self.records.write();

        for op in batch.ops {
            match op {
                Mutation::PutPreorder(hash, entry) => {
                    preorders.insert(hash, entry);
                }
                Mutation::DeletePreorder(hash) => {
                    preorders.remove(&hash);
                }
                Mutation::PutDomain(name, record) => {
                    domains.insert(name, record);
                }
                Mutation::PutRecord { name, key, value } => {
                    records.entry(name).or_default().insert(key, value);
                }
            }
        }
        Ok(())
    }
}

/// Sled-backed implementation, one tree per table
pub struct SledStore {
    db: sled::Db,
    preorders: Tree,
    domains: Tree,
    records: Tree,
}

enum EncodedOp {
    Insert(Table, Vec<u8>, Vec<u8>),
    Remove(Table, Vec<u8>),
}

#[derive(Clone, Copy)]
enum Table {
    Preorders,
    Domains,
    Records,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Throwaway database removed on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let preorders = db.open_tree("preorders")?;
        let domains = db.open_tree("domains")?;
        let records = db.open_tree("records")?;
        Ok(Self {
            db,
            preorders,
            domains,
            records,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// `u16-BE(name_len) ‖ name`, the prefix shared by all records of a name.
    /// `None` when the name is too long to encode, so no record can exist for it.
    fn record_prefix(name: &DomainName) -> Option<Vec<u8>> {
        let bytes = name.as_str().as_bytes();
        let len = u16::try_from(bytes.len()).ok()?;
        let mut prefix = Vec::with_capacity(2 + bytes.len());
        prefix.extend_from_slice(&len.to_be_bytes());
        prefix.extend_from_slice(bytes);
        Some(prefix)
    }

    fn record_key(name: &DomainName, key: &str) -> Option<Vec<u8>> {
        let mut full = Self::record_prefix(name)?;
        full.extend_from_slice(key.as_bytes());
        Some(full)
    }

    fn encode(op: Mutation) -> Result<EncodedOp> {
        Ok(match op {
            Mutation::PutPreorder(hash, entry) => EncodedOp::Insert(
                Table::Preorders,
                hash.0.to_vec(),
                serde_json::to_vec(&entry)?,
            ),
            Mutation::DeletePreorder(hash) => EncodedOp::Remove(Table::Preorders, hash.0.to_vec()),
            Mutation::PutDomain(name, record) => EncodedOp::Insert(
                Table::Domains,
                name.as_str().as_bytes().to_vec(),
                serde_json::to_vec(&record)?,
            ),
            Mutation::PutRecord { name, key, value } => EncodedOp::Insert(
                Table::Records,
                Self::record_key(&name, &key).ok_or_else(|| {
                    anyhow::anyhow!("name too long for record key: {} bytes", name.as_str().len())
                })?,
                value.into_bytes(),
            ),
        })
    }
}

impl RegistryStore for SledStore {
    fn get_preorder(&self, hash: &CommitmentHash) -> Result<Option<PreorderEntry>> {
        self.preorders
            .get(&hash.0[..])?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn get_domain(&self, name: &DomainName) -> Result<Option<DomainRecord>> {
        self.domains
            .get(name.as_str().as_bytes())?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn get_record(&self, name: &DomainName, key: &str) -> Result<Option<String>> {
        let Some(record_key) = Self::record_key(name, key) else {
            return Ok(None);
        };
        self.records
            .get(record_key)?
            .map(|v| String::from_utf8(v.to_vec()))
            .transpose()
            .map_err(Into::into)
    }

    fn list_records(&self, name: &DomainName) -> Result<Vec<(String, String)>> {
        let Some(prefix) = Self::record_prefix(name) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for item in self.records.scan_prefix(&prefix) {
            let (k, v) = item?;
            let key = String::from_utf8(k[prefix.len()..].to_vec())?;
            let value = String::from_utf8(v.to_vec())?;
            out.push((key, value));
        }
        Ok(out)
    }

    fn list_domains(&self) -> Result<Vec<(DomainName, DomainRecord)>> {
        let mut out = Vec::new();
        for item in self.domains.iter() {
            let (k, v) = item?;
            let name = DomainName::new(String::from_utf8(k.to_vec())?);
            out.push((name, serde_json::from_slice(&v)?));
        }
        Ok(out)
    }

    fn list_preorders(&self) -> Result<Vec<(CommitmentHash, PreorderEntry)>> {
        let mut out = Vec::new();
        for item in self.preorders.iter() {
            let (k, v) = item?;
            let mut hash = [0u8; 32];
            if k.len() != hash.len() {
                anyhow::bail!("corrupt preorder key of {} bytes", k.len());
            }
            hash.copy_from_slice(&k);
            out.push((CommitmentHash(hash), serde_json::from_slice(&v)?));
        }
        Ok(out)
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        let encoded = batch
            .ops
            .into_iter()
            .map(Self::encode)
            .collect::<Result<Vec<_>>>()?;

        let outcome: std::result::Result<(), TransactionError<()>> =
            (&self.preorders, &self.domains, &self.records).transaction(
                |(preorders, domains, records)| {
                    for op in &encoded {
                        match op {
                            EncodedOp::Insert(table, k, v) => {
                                let tree = match table {
                                    Table::Preorders => preorders,
                                    Table::Domains => domains,
                                    Table::Records => records,
                                };
                                tree.insert(k.as_slice(), v.as_slice())?;
                            }
                            EncodedOp::Remove(table, k) => {
                                let tree = match table {
                                    Table::Preorders => preorders,
                                    Table::Domains => domains,
                                    Table::Records => records,
                                };
                                tree.remove(k.as_slice())?;
                            }
                        }
                    }
                    Ok(())
                },
            );

        outcome.map_err(|e| anyhow::anyhow!("registry transaction failed: {e:?}"))
    }
}
