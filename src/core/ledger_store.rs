use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::errors::LedgerError;
use crate::ledger::{Expense, FuelSale, FuelType, LedgerState, Lubricant, SalesSummary, SummaryField};
use crate::storage::{self, ArchiveInfo, SnapshotStorage};

/// Storage key of the current ledger layout. Breaking layout changes bump the key.
pub const DEFAULT_STORAGE_KEY: &str = "app-storage-v2";

pub type SubscriptionId = u64;

type SummaryListener = Box<dyn FnMut(&SalesSummary) + Send>;
type WarningListener = Box<dyn FnMut(&PersistenceWarning) + Send>;

/// A write that did not reach storage. The in-memory state is still current.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceWarning {
    pub key: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not persist `{}`: {}", self.key, self.message)
    }
}

/// Describes how the store was initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMetadata {
    pub key: String,
    /// A persisted snapshot was found and applied.
    pub restored: bool,
    /// The snapshot's summary disagreed with its item lists and was recomputed.
    pub repaired: bool,
    /// Items that shared an id with an earlier item and were given a new one.
    pub reassigned_ids: usize,
}

/// Owns the shift ledger, writes it through to storage after every mutation and
/// notifies subscribers with the new summary.
pub struct LedgerStore {
    state: LedgerState,
    key: String,
    storage: Arc<dyn SnapshotStorage>,
    metadata: LoadMetadata,
    listeners: Vec<(SubscriptionId, SummaryListener)>,
    warning_listeners: Vec<(SubscriptionId, WarningListener)>,
    next_subscription: SubscriptionId,
    pending_warning: Option<PersistenceWarning>,
    dirty: bool,
}

impl fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerStore")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl LedgerStore {
    /// Loads the snapshot stored under `key`, or starts from an empty ledger.
    ///
    /// Fails when a snapshot exists but cannot be read or decoded, or holds
    /// amounts that new input would reject.
    pub fn open(storage: Arc<dyn SnapshotStorage>, key: impl Into<String>) -> Result<Self, LedgerError> {
        let key = key.into();
        let loaded: Option<LedgerState> = storage::load_json(storage.as_ref(), &key)?;
        let restored = loaded.is_some();
        let mut state = loaded.unwrap_or_default();
        let reassigned_ids = state.check_loaded()?;
        if reassigned_ids > 0 {
            warn!(key = %key, reassigned_ids, "persisted items shared ids; reassigned");
        }
        let repaired = state.refresh_summary();
        if repaired {
            info!(key = %key, "persisted summary disagreed with its items; recomputed");
        }
        info!(
            key = %key,
            restored,
            fuel_sales = state.fuel_sales.len(),
            lubricants = state.lubricants.len(),
            expenses = state.expenses.len(),
            "ledger store opened"
        );
        Ok(Self {
            state,
            metadata: LoadMetadata {
                key: key.clone(),
                restored,
                repaired,
                reassigned_ids,
            },
            key,
            storage,
            listeners: Vec::new(),
            warning_listeners: Vec::new(),
            next_subscription: 1,
            pending_warning: None,
            dirty: repaired || reassigned_ids > 0,
        })
    }

    pub fn open_default(storage: Arc<dyn SnapshotStorage>) -> Result<Self, LedgerError> {
        Self::open(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> LedgerState {
        self.state.clone()
    }

    pub fn summary(&self) -> &SalesSummary {
        &self.state.sales_summary
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load_metadata(&self) -> &LoadMetadata {
        &self.metadata
    }

    pub fn storage(&self) -> &dyn SnapshotStorage {
        self.storage.as_ref()
    }

    /// `true` while the last write to storage has not succeeded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn add_fuel_sale(
        &mut self,
        fuel_type: FuelType,
        price_per_unit: f64,
        quantity: f64,
    ) -> Result<String, LedgerError> {
        let id = self.state.add_fuel_sale(fuel_type, price_per_unit, quantity)?;
        debug!(%id, %fuel_type, price_per_unit, quantity, "fuel sale recorded");
        self.commit();
        Ok(id)
    }

    /// Returns whether an item was removed. Unknown ids leave the store untouched.
    pub fn remove_fuel_sale(&mut self, id: &str) -> bool {
        let removed = self.state.remove_fuel_sale(id);
        self.after_remove("fuel sale", id, removed)
    }

    pub fn replace_fuel_sales(&mut self, items: Vec<FuelSale>) -> Result<(), LedgerError> {
        self.state.replace_fuel_sales(items)?;
        debug!(count = self.state.fuel_sales.len(), "fuel sales replaced");
        self.commit();
        Ok(())
    }

    pub fn add_lubricant(&mut self, kind: impl Into<String>, amount: f64) -> Result<String, LedgerError> {
        let id = self.state.add_lubricant(kind, amount)?;
        debug!(%id, amount, "lubricant sale recorded");
        self.commit();
        Ok(id)
    }

    pub fn remove_lubricant(&mut self, id: &str) -> bool {
        let removed = self.state.remove_lubricant(id);
        self.after_remove("lubricant", id, removed)
    }

    pub fn replace_lubricants(&mut self, items: Vec<Lubricant>) -> Result<(), LedgerError> {
        self.state.replace_lubricants(items)?;
        debug!(count = self.state.lubricants.len(), "lubricants replaced");
        self.commit();
        Ok(())
    }

    pub fn add_expense(&mut self, amount: f64, description: impl Into<String>) -> Result<String, LedgerError> {
        let id = self.state.add_expense(amount, description)?;
        debug!(%id, amount, "expense recorded");
        self.commit();
        Ok(id)
    }

    pub fn remove_expense(&mut self, id: &str) -> bool {
        let removed = self.state.remove_expense(id);
        self.after_remove("expense", id, removed)
    }

    pub fn replace_expenses(&mut self, items: Vec<Expense>) -> Result<(), LedgerError> {
        self.state.replace_expenses(items)?;
        debug!(count = self.state.expenses.len(), "expenses replaced");
        self.commit();
        Ok(())
    }

    /// Sets one of the manually entered categories (credits, cards, bonds,
    /// deposits, cash).
    pub fn set_summary_field(&mut self, field: SummaryField, value: f64) -> Result<(), LedgerError> {
        self.state.set_summary_field(field, value)?;
        debug!(%field, value, "summary field updated");
        self.commit();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state.reset();
        info!(key = %self.key, "ledger reset");
        self.commit();
    }

    /// Archives the current shift, then resets the ledger.
    ///
    /// Nothing is reset if the archive cannot be written.
    pub fn close_shift(&mut self, note: Option<&str>) -> Result<ArchiveInfo, LedgerError> {
        let json = serde_json::to_string_pretty(&self.state)?;
        let archive = self.storage.write_archive(&self.key, &json, note)?;
        info!(key = %self.key, archive = %archive.id, total = self.state.sales_summary.total, "shift closed");
        self.reset();
        Ok(archive)
    }

    pub fn list_archives(&self) -> Result<Vec<ArchiveInfo>, LedgerError> {
        self.storage.list_archives(&self.key)
    }

    pub fn load_archive(&self, id: &str) -> Result<LedgerState, LedgerError> {
        let raw = self.storage.read_archive(&self.key, id)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Registers a listener invoked with the new summary after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SalesSummary) + Send + 'static,
    {
        let id = self.allocate_subscription();
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Registers a listener for writes that failed to reach storage.
    pub fn on_persistence_warning<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PersistenceWarning) + Send + 'static,
    {
        let id = self.allocate_subscription();
        self.warning_listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len() + self.warning_listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.warning_listeners.retain(|(sub, _)| *sub != id);
        before != self.listeners.len() + self.warning_listeners.len()
    }

    /// Returns and clears the most recent persistence failure, if any.
    pub fn take_persistence_warning(&mut self) -> Option<PersistenceWarning> {
        self.pending_warning.take()
    }

    /// Writes the current state to storage, surfacing any failure.
    pub fn flush(&mut self) -> Result<(), LedgerError> {
        storage::save_json(self.storage.as_ref(), &self.key, &self.state)?;
        self.dirty = false;
        Ok(())
    }

    pub fn close(mut self) -> Result<(), LedgerError> {
        self.flush()?;
        info!(key = %self.key, "ledger store closed");
        Ok(())
    }

    fn allocate_subscription(&mut self) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        id
    }

    fn after_remove(&mut self, kind: &str, id: &str, removed: bool) -> bool {
        if removed {
            debug!(%id, kind, "item removed");
            self.commit();
        } else {
            debug!(%id, kind, "remove ignored for unknown id");
        }
        removed
    }

    fn commit(&mut self) {
        debug_assert!(self.state.is_consistent());
        self.persist();
        let summary = &self.state.sales_summary;
        for (_, listener) in self.listeners.iter_mut() {
            listener(summary);
        }
    }

    fn persist(&mut self) {
        match storage::save_json(self.storage.as_ref(), &self.key, &self.state) {
            Ok(()) => self.dirty = false,
            Err(err) => {
                warn!(key = %self.key, %err, "ledger snapshot was not persisted");
                self.dirty = true;
                let warning = PersistenceWarning {
                    key: self.key.clone(),
                    message: err.to_string(),
                    occurred_at: Utc::now(),
                };
                for (_, listener) in self.warning_listeners.iter_mut() {
                    listener(&warning);
                }
                self.pending_warning = Some(warning);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Mutex;

    fn store() -> (LedgerStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = LedgerStore::open_default(storage.clone()).expect("open store");
        (store, storage)
    }

    #[test]
    fn opens_empty_when_nothing_persisted() {
        let (store, _) = store();
        assert!(store.state().is_empty());
        assert!(!store.load_metadata().restored);
        assert_eq!(store.key(), DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn every_mutation_is_written_through() {
        let (mut store, storage) = store();
        store.add_expense(12.0, "oil rag").unwrap();
        let persisted: LedgerState = storage::load_json(storage.as_ref(), DEFAULT_STORAGE_KEY)
            .unwrap()
            .expect("snapshot written");
        assert_eq!(&persisted, store.state());
    }

    #[test]
    fn listeners_receive_new_summary_until_unsubscribed() {
        let (mut store, _) = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = store.subscribe(move |summary| sink.lock().unwrap().push(summary.total));

        store.set_summary_field(SummaryField::Cash, 50.0).unwrap();
        store.set_summary_field(SummaryField::Deposits, 20.0).unwrap();
        assert!(store.unsubscribe(id));
        store.set_summary_field(SummaryField::Cards, 1.0).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![50.0, 30.0]);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn rejected_operations_do_not_notify() {
        let (mut store, _) = store();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        store.subscribe(move |_| *counter.lock().unwrap() += 1);

        assert!(store.set_summary_field(SummaryField::Total, 1.0).is_err());
        assert!(store.add_expense(f64::NAN, "bad").is_err());
        assert!(!store.remove_lubricant("missing"));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn failed_write_keeps_memory_state_and_reports_warning() {
        let (mut store, storage) = store();
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let sink = warnings.clone();
        store.on_persistence_warning(move |w| sink.lock().unwrap().push(w.clone()));

        storage.set_fail_writes(true);
        let id = store.add_fuel_sale(FuelType::Regular, 3.5, 10.0).unwrap();
        assert!(store.is_dirty());
        assert_eq!(store.state().fuel_sales[0].id, id);
        assert_eq!(warnings.lock().unwrap().len(), 1);
        let pending = store.take_persistence_warning().expect("pending warning");
        assert_eq!(pending.key, DEFAULT_STORAGE_KEY);
        assert!(store.take_persistence_warning().is_none());

        assert!(store.flush().is_err());
        storage.set_fail_writes(false);
        store.flush().expect("flush after recovery");
        assert!(!store.is_dirty());
    }

    #[test]
    fn close_shift_archives_then_resets() {
        let (mut store, _) = store();
        store.add_lubricant("20W-50", 18.0).unwrap();
        let archive = store.close_shift(Some("night")).expect("close shift");
        assert!(store.state().is_empty());

        let archived = store.load_archive(&archive.id).expect("load archive");
        assert_eq!(archived.lubricants.len(), 1);
        assert_eq!(store.list_archives().unwrap().len(), 1);
    }

    #[test]
    fn close_shift_keeps_state_when_archive_fails() {
        let (mut store, storage) = store();
        store.add_lubricant("20W-50", 18.0).unwrap();
        storage.set_fail_writes(true);
        assert!(store.close_shift(None).is_err());
        assert_eq!(store.state().lubricants.len(), 1);
    }
}
