// 📒 Record Store - the session's single source of truth
//
// Owns the expense collection and the storage it came from. Every mutation
// is followed by a save; a failed save is logged and the in-memory state
// stays authoritative for the rest of the session.

use crate::entities::{Expense, ExpenseDraft};
use crate::error::{ExpenseError, Result};
use crate::persistence::{load_expenses, save_expenses, KeyValueStore};
use chrono::NaiveDate;
use tracing::{info, warn};

pub struct ExpenseStore {
    expenses: Vec<Expense>,
    storage: Box<dyn KeyValueStore>,
}

impl ExpenseStore {
    /// Load the saved collection (empty if there's none or it's unreadable).
    ///
    /// Saved records dated after `today` or otherwise invalid are left out.
    pub fn open(storage: Box<dyn KeyValueStore>, today: NaiveDate) -> Self {
        let expenses = load_expenses(storage.as_ref(), today);
        info!(count = expenses.len(), "expense store opened");
        ExpenseStore { expenses, storage }
    }

    /// All records, newest-created first
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Record a new expense with a fresh id
    pub fn add(&mut self, draft: ExpenseDraft) -> &Expense {
        let expense = Expense::from_draft(draft);
        info!(id = %expense.id, amount = expense.amount, category = %expense.category, "expense added");

        self.expenses.insert(0, expense);
        self.persist();
        &self.expenses[0]
    }

    /// Replace every field of an existing expense except its id
    pub fn update(&mut self, id: &str, draft: ExpenseDraft) -> Result<&Expense> {
        let index = self.position(id)?;
        self.expenses[index].apply(draft);
        info!(id, "expense updated");

        self.persist();
        Ok(&self.expenses[index])
    }

    pub fn remove(&mut self, id: &str) -> Result<Expense> {
        let index = self.position(id)?;
        let removed = self.expenses.remove(index);
        info!(id, "expense removed");

        self.persist();
        Ok(removed)
    }

    /// Add many expenses with a single save; returns how many were added
    pub fn import(&mut self, drafts: Vec<ExpenseDraft>) -> usize {
        let count = drafts.len();
        if count == 0 {
            return 0;
        }

        let mut added: Vec<Expense> = drafts.into_iter().map(Expense::from_draft).collect();
        added.reverse();
        added.append(&mut self.expenses);
        self.expenses = added;

        info!(count, "expenses imported");
        self.persist();
        count
    }

    /// Save now, reporting failure to the caller
    pub fn save(&self) -> Result<()> {
        save_expenses(self.storage.as_ref(), &self.expenses)
            .map_err(|e| ExpenseError::Storage(format!("{:#}", e)))
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "save failed, keeping in-memory state");
        }
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ExpenseError::NotFound(id.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Category;
    use crate::persistence::{MemoryStorage, EXPENSES_KEY};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    fn draft(amount: f64, description: &str) -> ExpenseDraft {
        ExpenseDraft {
            amount,
            category: Category::Entertainment,
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        }
    }

    /// Storage whose writes always fail
    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn saved(storage: &MemoryStorage) -> Vec<Expense> {
        let bytes = storage.get(EXPENSES_KEY).unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_add_puts_newest_first_and_saves() {
        let storage = MemoryStorage::new();
        let mut store = ExpenseStore::open(Box::new(storage.clone()), today());

        store.add(draft(10.0, "Concert"));
        let second_id = store.add(draft(5.0, "Arcade")).id.clone();

        assert_eq!(store.len(), 2);
        assert_eq!(store.expenses()[0].id, second_id);
        assert_eq!(saved(&storage), store.expenses());
    }

    #[test]
    fn test_reopen_restores_collection() {
        let storage = MemoryStorage::new();
        {
            let mut store = ExpenseStore::open(Box::new(storage.clone()), today());
            store.add(draft(10.0, "Concert"));
        }

        let store = ExpenseStore::open(Box::new(storage), today());
        assert_eq!(store.len(), 1);
        assert_eq!(store.expenses()[0].description, "Concert");
    }

    #[test]
    fn test_update_replaces_fields_keeps_id() {
        let storage = MemoryStorage::new();
        let mut store = ExpenseStore::open(Box::new(storage.clone()), today());
        let id = store.add(draft(10.0, "Concert")).id.clone();

        let updated = store.update(&id, draft(12.0, "Concert tickets")).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.amount, 12.0);

        assert_eq!(saved(&storage)[0].description, "Concert tickets");
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = ExpenseStore::open(Box::new(MemoryStorage::new()), today());
        let err = store.update("missing", draft(1.0, "x")).unwrap_err();
        assert!(matches!(err, ExpenseError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();
        let mut store = ExpenseStore::open(Box::new(storage.clone()), today());
        let id = store.add(draft(10.0, "Concert")).id.clone();
        store.add(draft(3.0, "Popcorn"));

        let removed = store.remove(&id).unwrap();
        assert_eq!(removed.description, "Concert");
        assert!(store.get(&id).is_none());
        assert_eq!(saved(&storage).len(), 1);

        assert!(matches!(store.remove(&id), Err(ExpenseError::NotFound(_))));
    }

    #[test]
    fn test_import_adds_rows_as_if_entered_in_order() {
        let storage = MemoryStorage::new();
        let mut store = ExpenseStore::open(Box::new(storage.clone()), today());
        store.add(draft(1.0, "existing"));

        let added = store.import(vec![draft(2.0, "first"), draft(3.0, "second")]);
        assert_eq!(added, 2);

        let descriptions: Vec<&str> = store.expenses().iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["second", "first", "existing"]);
        assert_eq!(saved(&storage).len(), 3);
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let mut store = ExpenseStore::open(Box::new(BrokenStorage), today());

        let id = store.add(draft(10.0, "Concert")).id.clone();
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_some());

        let err = store.save().unwrap_err();
        assert!(matches!(err, ExpenseError::Storage(msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_open_leaves_out_invalid_saved_records() {
        let storage = MemoryStorage::new();
        let mut future = Expense::from_draft(draft(80.0, "Festival"));
        future.date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut negative = Expense::from_draft(draft(-5.0, "Refund"));
        negative.date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let kept = Expense::from_draft(draft(15.0, "Museum"));
        save_expenses(&storage, &[future, negative, kept.clone()]).unwrap();

        let store = ExpenseStore::open(Box::new(storage), today());
        assert_eq!(store.expenses(), &[kept][..]);
    }
}
