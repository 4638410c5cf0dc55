use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    items::{fresh_id, Expense, FuelSale, FuelType, LineItem, Lubricant},
    summary::{SalesSummary, SummaryField},
};
use crate::errors::LedgerError;

/// Tolerance used when comparing derived totals.
pub const TOTAL_EPSILON: f64 = 1e-6;

/// Itemized shift collections plus the summary derived from them.
///
/// Every mutator keeps the list-derived summary fields and `total` in step with
/// the collections; only the manual categories are ever written directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    #[serde(default)]
    pub fuel_sales: Vec<FuelSale>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub lubricants: Vec<Lubricant>,
    #[serde(default)]
    pub sales_summary: SalesSummary,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> &SalesSummary {
        &self.sales_summary
    }

    pub fn add_fuel_sale(
        &mut self,
        fuel_type: FuelType,
        price_per_gal: f64,
        quantity_gal: f64,
    ) -> Result<String, LedgerError> {
        ensure_amount("price per gallon", price_per_gal)?;
        ensure_amount("quantity", quantity_gal)?;
        let sale = FuelSale::new(fuel_type, price_per_gal, quantity_gal);
        ensure_amount("fuel sale total", sale.total)?;
        let id = sale.id.clone();
        self.fuel_sales.push(sale);
        self.refresh_fuel_sales();
        Ok(id)
    }

    pub fn remove_fuel_sale(&mut self, id: &str) -> bool {
        let removed = remove_by_id(&mut self.fuel_sales, id);
        self.refresh_fuel_sales();
        removed
    }

    /// Per-item totals are taken as given, not recomputed from price and quantity.
    pub fn replace_fuel_sales(&mut self, items: Vec<FuelSale>) -> Result<(), LedgerError> {
        ensure_replacement(&items, "fuel sale total")?;
        self.fuel_sales = items;
        self.refresh_fuel_sales();
        Ok(())
    }

    pub fn add_lubricant(
        &mut self,
        kind: impl Into<String>,
        amount: f64,
    ) -> Result<String, LedgerError> {
        ensure_amount("lubricant amount", amount)?;
        let lubricant = Lubricant::new(kind, amount);
        let id = lubricant.id.clone();
        self.lubricants.push(lubricant);
        self.refresh_lubricants();
        Ok(id)
    }

    pub fn remove_lubricant(&mut self, id: &str) -> bool {
        let removed = remove_by_id(&mut self.lubricants, id);
        self.refresh_lubricants();
        removed
    }

    pub fn replace_lubricants(&mut self, items: Vec<Lubricant>) -> Result<(), LedgerError> {
        ensure_replacement(&items, "lubricant amount")?;
        self.lubricants = items;
        self.refresh_lubricants();
        Ok(())
    }

    pub fn add_expense(
        &mut self,
        amount: f64,
        description: impl Into<String>,
    ) -> Result<String, LedgerError> {
        ensure_amount("expense amount", amount)?;
        let expense = Expense::new(amount, description);
        let id = expense.id.clone();
        self.expenses.push(expense);
        self.refresh_expenses();
        Ok(id)
    }

    pub fn remove_expense(&mut self, id: &str) -> bool {
        let removed = remove_by_id(&mut self.expenses, id);
        self.refresh_expenses();
        removed
    }

    pub fn replace_expenses(&mut self, items: Vec<Expense>) -> Result<(), LedgerError> {
        ensure_replacement(&items, "expense amount")?;
        self.expenses = items;
        self.refresh_expenses();
        Ok(())
    }

    pub fn set_summary_field(&mut self, field: SummaryField, value: f64) -> Result<(), LedgerError> {
        if !field.is_manual() {
            return Err(LedgerError::ReadOnlyField(field));
        }
        ensure_amount(field.as_str(), value)?;
        self.sales_summary.set_manual(field, value)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Recomputes every derived field from the collections.
    ///
    /// Returns `true` when the stored summary disagreed with the lists.
    pub fn refresh_summary(&mut self) -> bool {
        let consistent = self.is_consistent();
        self.sales_summary.fuel_sales = sum(&self.fuel_sales);
        self.sales_summary.lubricant_sales = sum(&self.lubricants);
        self.sales_summary.expenses = sum(&self.expenses);
        self.sales_summary.recompute_total();
        !consistent
    }

    pub fn is_consistent(&self) -> bool {
        let summary = &self.sales_summary;
        close(summary.fuel_sales, sum(&self.fuel_sales))
            && close(summary.lubricant_sales, sum(&self.lubricants))
            && close(summary.expenses, sum(&self.expenses))
            && close(summary.total, summary.computed_total())
    }

    /// Checks a snapshot read back from storage.
    ///
    /// Amounts follow the same rules as new input. Items sharing an id get a
    /// fresh one so a later removal only drops the one item. Returns how many
    /// ids were reassigned.
    pub fn check_loaded(&mut self) -> Result<usize, LedgerError> {
        for sale in &self.fuel_sales {
            ensure_amount("price per gallon", sale.price_per_gal)?;
            ensure_amount("quantity", sale.quantity_gal)?;
            ensure_amount("fuel sale total", sale.total)?;
        }
        for lubricant in &self.lubricants {
            ensure_amount("lubricant amount", lubricant.amount)?;
        }
        for expense in &self.expenses {
            ensure_amount("expense amount", expense.amount)?;
        }
        for field in SummaryField::MANUAL {
            ensure_amount(field.as_str(), self.sales_summary.get(field))?;
        }
        Ok(reassign_duplicate_ids(&mut self.fuel_sales, |sale| &mut sale.id)
            + reassign_duplicate_ids(&mut self.lubricants, |lubricant| &mut lubricant.id)
            + reassign_duplicate_ids(&mut self.expenses, |expense| &mut expense.id))
    }

    fn refresh_fuel_sales(&mut self) {
        self.sales_summary.fuel_sales = sum(&self.fuel_sales);
        self.sales_summary.recompute_total();
    }

    fn refresh_lubricants(&mut self) {
        self.sales_summary.lubricant_sales = sum(&self.lubricants);
        self.sales_summary.recompute_total();
    }

    fn refresh_expenses(&mut self) {
        self.sales_summary.expenses = sum(&self.expenses);
        self.sales_summary.recompute_total();
    }
}

// Folding from +0.0 keeps empty collections at 0 rather than -0.0.
fn sum<T: LineItem>(items: &[T]) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + item.value())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOTAL_EPSILON
}

fn remove_by_id<T: LineItem>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

/// Monetary inputs must be finite and non-negative.
pub fn ensure_amount(label: &str, value: f64) -> Result<(), LedgerError> {
    if !value.is_finite() {
        return Err(LedgerError::Validation(format!(
            "{label} must be a finite number, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(LedgerError::Validation(format!(
            "{label} cannot be negative, got {value}"
        )));
    }
    Ok(())
}

fn reassign_duplicate_ids<T>(items: &mut [T], id_of: impl Fn(&mut T) -> &mut String) -> usize {
    let mut seen = HashSet::with_capacity(items.len());
    let mut reassigned = 0;
    for item in items.iter_mut() {
        let id = id_of(item);
        if !seen.insert(id.clone()) {
            *id = fresh_id();
            seen.insert(id.clone());
            reassigned += 1;
        }
    }
    reassigned
}

fn ensure_replacement<T: LineItem>(items: &[T], label: &str) -> Result<(), LedgerError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id()) {
            return Err(LedgerError::DuplicateId(item.id().to_string()));
        }
        ensure_amount(label, item.value())?;
    }
    Ok(())
}
