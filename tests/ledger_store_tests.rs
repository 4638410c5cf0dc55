mod common;

use std::sync::{Arc, Mutex};

use common::assert_close;
use fuel_ledger::{
    ledger::{Expense, FuelSale, FuelType, Lubricant, SummaryField},
    storage::{MemoryStorage, SnapshotStorage},
    LedgerError, LedgerStore,
};

fn memory_store() -> (LedgerStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = LedgerStore::open_default(storage.clone()).expect("open store");
    (store, storage)
}

#[test]
fn shift_scenario_tracks_running_total() {
    let (mut store, _) = memory_store();

    let sale = store.add_fuel_sale(FuelType::Regular, 3.5, 10.0).unwrap();
    assert_close(store.state().fuel_sales[0].total, 35.0);
    assert_close(store.summary().fuel_sales, 35.0);
    assert_close(store.summary().total, 35.0);

    store.add_expense(12.0, "oil rag").unwrap();
    assert_close(store.summary().expenses, 12.0);
    assert_close(store.summary().total, 23.0);

    store.set_summary_field(SummaryField::Cash, 50.0).unwrap();
    assert_close(store.summary().total, 73.0);

    assert!(store.remove_fuel_sale(&sale));
    assert_close(store.summary().fuel_sales, 0.0);
    assert_close(store.summary().total, 38.0);
}

#[test]
fn every_category_contributes_with_its_sign() {
    let (mut store, _) = memory_store();
    store.add_fuel_sale(FuelType::Diesel, 10.0, 10.0).unwrap();
    store.add_lubricant("20W50", 40.0).unwrap();
    store.add_expense(5.0, "coffee").unwrap();
    store.set_summary_field(SummaryField::Credits, 7.0).unwrap();
    store.set_summary_field(SummaryField::Cards, 8.0).unwrap();
    store.set_summary_field(SummaryField::Bonds, 9.0).unwrap();
    store.set_summary_field(SummaryField::Deposits, 30.0).unwrap();
    store.set_summary_field(SummaryField::Cash, 1.0).unwrap();

    // 100 + 40 + 7 + 8 + 9 - 5 - 30 + 1
    assert_close(store.summary().total, 130.0);
}

#[test]
fn replacing_with_empty_list_clears_the_category() {
    let (mut store, _) = memory_store();
    for qty in [1.0, 2.0, 3.0] {
        store.add_fuel_sale(FuelType::AdBlue, 2.0, qty).unwrap();
    }
    store.add_lubricant("grease", 4.0).unwrap();

    store.replace_fuel_sales(Vec::new()).unwrap();

    assert!(store.state().fuel_sales.is_empty());
    assert_close(store.summary().fuel_sales, 0.0);
    assert_close(store.summary().total, 4.0);
}

#[test]
fn replace_sums_stored_totals_as_given() {
    let (mut store, _) = memory_store();
    let mut sale = FuelSale::new(FuelType::Regular, 2.0, 2.0);
    sale.total = 10.0;
    store.replace_fuel_sales(vec![sale]).unwrap();
    store
        .replace_lubricants(vec![Lubricant::new("atf", 3.0), Lubricant::new("atf", 3.0)])
        .unwrap();
    store.replace_expenses(vec![Expense::new(1.5, "ice")]).unwrap();

    assert_close(store.summary().fuel_sales, 10.0);
    assert_close(store.summary().lubricant_sales, 6.0);
    assert_close(store.summary().total, 14.5);
}

#[test]
fn duplicate_ids_in_replacement_leave_state_untouched() {
    let (mut store, _) = memory_store();
    store.add_expense(2.0, "tape").unwrap();
    let expense = Expense::new(9.0, "twice");

    let err = store
        .replace_expenses(vec![expense.clone(), expense])
        .unwrap_err();

    assert!(matches!(err, LedgerError::DuplicateId(_)));
    assert_eq!(store.state().expenses.len(), 1);
    assert_close(store.summary().expenses, 2.0);
}

#[test]
fn derived_fields_cannot_be_set() {
    let (mut store, _) = memory_store();
    for field in [
        SummaryField::FuelSales,
        SummaryField::LubricantSales,
        SummaryField::Expenses,
        SummaryField::Total,
    ] {
        let err = store.set_summary_field(field, 1.0).unwrap_err();
        assert!(matches!(err, LedgerError::ReadOnlyField(f) if f == field));
    }
    assert_close(store.summary().total, 0.0);
}

#[test]
fn invalid_amounts_are_rejected_without_mutation() {
    let (mut store, storage) = memory_store();
    assert!(store.add_fuel_sale(FuelType::Regular, f64::NAN, 1.0).is_err());
    assert!(store.add_lubricant("oil", -1.0).is_err());
    assert!(store.add_expense(f64::INFINITY, "x").is_err());
    assert!(store.set_summary_field(SummaryField::Cash, -5.0).is_err());

    assert!(store.state().is_empty());
    assert!(storage.get_item(store.key()).unwrap().is_none());
}

#[test]
fn ids_are_unique_across_adds() {
    let (mut store, _) = memory_store();
    let mut ids: Vec<String> = (0..50)
        .map(|i| store.add_lubricant("oil", i as f64).unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[test]
fn reset_is_idempotent_and_persisted() {
    let (mut store, storage) = memory_store();
    store.add_fuel_sale(FuelType::Diesel, 4.0, 4.0).unwrap();
    store.set_summary_field(SummaryField::Bonds, 3.0).unwrap();

    store.reset();
    let first = store.snapshot();
    store.reset();

    assert_eq!(store.snapshot(), first);
    assert!(first.is_empty());
    let reopened = LedgerStore::open_default(storage).unwrap();
    assert!(reopened.state().is_empty());
}

#[test]
fn removing_unknown_id_does_not_notify_or_persist() {
    let (mut store, storage) = memory_store();
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    store.subscribe(move |_| *counter.lock().unwrap() += 1);

    assert!(!store.remove_expense("missing"));
    assert!(!store.remove_lubricant("missing"));

    assert_eq!(*calls.lock().unwrap(), 0);
    assert!(storage.get_item(store.key()).unwrap().is_none());
}

#[test]
fn listeners_see_each_new_summary_until_unsubscribed() {
    let (mut store, _) = memory_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = store.subscribe(move |summary| sink.lock().unwrap().push(summary.total));

    store.add_lubricant("oil", 10.0).unwrap();
    store.add_expense(4.0, "soap").unwrap();
    store.reset();
    assert!(store.unsubscribe(id));
    store.add_lubricant("oil", 1.0).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![10.0, 6.0, 0.0]);
}

#[test]
fn write_failures_keep_memory_state_and_surface_warnings() {
    let (mut store, storage) = memory_store();
    let warnings = Arc::new(Mutex::new(Vec::new()));
    let sink = warnings.clone();
    store.on_persistence_warning(move |warning| sink.lock().unwrap().push(warning.key.clone()));

    storage.set_fail_writes(true);
    store.add_lubricant("oil", 12.0).unwrap();

    assert_close(store.summary().total, 12.0);
    assert!(store.is_dirty());
    assert!(store.take_persistence_warning().is_some());
    assert_eq!(warnings.lock().unwrap().len(), 1);
    assert!(store.flush().is_err());

    storage.set_fail_writes(false);
    store.close().expect("flush once storage recovers");
    let reopened = LedgerStore::open_default(storage).unwrap();
    assert_close(reopened.summary().total, 12.0);
}

fn assert_formula(store: &LedgerStore) {
    let state = store.state();
    let s = &state.sales_summary;
    let fuel: f64 = state.fuel_sales.iter().map(|f| f.total).sum();
    let lubes: f64 = state.lubricants.iter().map(|l| l.amount).sum();
    let expenses: f64 = state.expenses.iter().map(|e| e.amount).sum();
    assert_close(s.fuel_sales, fuel);
    assert_close(s.lubricant_sales, lubes);
    assert_close(s.expenses, expenses);
    assert_close(
        s.total,
        s.fuel_sales + s.lubricant_sales + s.credits + s.cards + s.bonds - s.expenses - s.deposits
            + s.cash,
    );
}

#[test]
fn formula_holds_over_mixed_operation_sequence() {
    let (mut store, _) = memory_store();
    let mut fuel_ids = Vec::new();
    let mut lube_ids = Vec::new();
    let mut expense_ids = Vec::new();
    for step in 0..60 {
        let value = (step % 7) as f64 + 0.25;
        let before = store.summary().clone();
        match step % 9 {
            0 => fuel_ids.push(store.add_fuel_sale(FuelType::Regular, value, 1.5).unwrap()),
            1 => lube_ids.push(store.add_lubricant("oil", value).unwrap()),
            2 => expense_ids.push(store.add_expense(value, "misc").unwrap()),
            3 => store.set_summary_field(SummaryField::Deposits, value).unwrap(),
            4 => {
                if let Some(id) = fuel_ids.pop() {
                    let total = store.state().fuel_sales.iter().find(|f| f.id == id).unwrap().total;
                    assert!(store.remove_fuel_sale(&id));
                    assert_close(store.summary().fuel_sales, before.fuel_sales - total);
                    assert_close(store.summary().total, before.total - total);
                }
            }
            5 => {
                if let Some(id) = lube_ids.pop() {
                    let amount = store.state().lubricants.iter().find(|l| l.id == id).unwrap().amount;
                    assert!(store.remove_lubricant(&id));
                    assert_close(store.summary().lubricant_sales, before.lubricant_sales - amount);
                    assert_close(store.summary().total, before.total - amount);
                }
            }
            6 => {
                if let Some(id) = expense_ids.pop() {
                    let amount = store.state().expenses.iter().find(|e| e.id == id).unwrap().amount;
                    assert!(store.remove_expense(&id));
                    assert_close(store.summary().expenses, before.expenses - amount);
                    assert_close(store.summary().total, before.total + amount);
                }
            }
            7 => lube_ids.push(store.add_lubricant("grease", value * 3.0).unwrap()),
            _ => store.set_summary_field(SummaryField::Cards, value * 2.0).unwrap(),
        }
        assert_formula(&store);
    }
}

#[test]
fn removing_lubricants_and_expenses_by_id_updates_total() {
    let (mut store, _) = memory_store();
    let oil = store.add_lubricant("oil", 10.0).unwrap();
    let grease = store.add_lubricant("grease", 6.0).unwrap();
    let soap = store.add_expense(4.0, "soap").unwrap();
    assert_close(store.summary().total, 12.0);

    assert!(store.remove_lubricant(&oil));
    assert_close(store.summary().lubricant_sales, 6.0);
    assert_close(store.summary().total, 2.0);

    assert!(store.remove_expense(&soap));
    assert_close(store.summary().expenses, 0.0);
    assert_close(store.summary().total, 6.0);

    assert!(store.remove_lubricant(&grease));
    assert_close(store.summary().total, 0.0);
    assert!(!store.remove_lubricant(&grease));
}

#[test]
fn replacing_lubricants_and_expenses_with_empty_lists_clears_them() {
    let (mut store, _) = memory_store();
    store.add_lubricant("oil", 10.0).unwrap();
    store.add_lubricant("atf", 5.0).unwrap();
    store.add_expense(4.0, "soap").unwrap();
    store.set_summary_field(SummaryField::Cash, 20.0).unwrap();
    assert_close(store.summary().total, 31.0);

    store.replace_lubricants(Vec::new()).unwrap();
    assert!(store.state().lubricants.is_empty());
    assert_close(store.summary().lubricant_sales, 0.0);
    assert_close(store.summary().total, 16.0);

    store.replace_expenses(Vec::new()).unwrap();
    assert!(store.state().expenses.is_empty());
    assert_close(store.summary().expenses, 0.0);
    assert_close(store.summary().total, 20.0);
}

#[test]
fn closing_a_shift_archives_then_resets() {
    let (mut store, _) = memory_store();
    store.add_fuel_sale(FuelType::Regular, 5.0, 2.0).unwrap();

    let archive = store.close_shift(Some("night shift")).unwrap();

    assert!(store.state().is_empty());
    let archived = store.load_archive(&archive.id).unwrap();
    assert_close(archived.sales_summary.total, 10.0);
    assert_eq!(store.list_archives().unwrap()[0].id, archive.id);
}

#[test]
fn failed_archive_keeps_the_shift_open() {
    let (mut store, storage) = memory_store();
    store.add_expense(3.0, "fuse").unwrap();
    storage.set_fail_writes(true);

    assert!(store.close_shift(None).is_err());
    assert_eq!(store.state().expenses.len(), 1);
}
