//! Presentation-ready view of the shift summary.

use crate::{
    config::Config,
    currency::format_currency_value,
    ledger::{LedgerState, SummaryField},
};

/// One category line of the reconciliation sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub field: SummaryField,
    pub label: &'static str,
    pub amount: f64,
    pub formatted: String,
    /// `+1.0` when the category adds to the total, `-1.0` when it subtracts.
    pub sign: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub rows: Vec<SummaryRow>,
    pub total: f64,
    pub formatted_total: String,
    pub fuel_sale_count: usize,
    pub lubricant_count: usize,
    pub expense_count: usize,
}

impl SummaryReport {
    pub fn from_state(state: &LedgerState, config: &Config) -> Self {
        let code = config.currency_code();
        let options = config.format_options();
        let format = |amount: f64| format_currency_value(amount, &code, &config.locale, &options);
        let summary = state.summary();
        let rows = SummaryField::CATEGORIES
            .iter()
            .map(|field| {
                let amount = summary.get(*field);
                SummaryRow {
                    field: *field,
                    label: field.label(),
                    amount,
                    formatted: format(amount),
                    sign: field.sign(),
                }
            })
            .collect();
        Self {
            rows,
            total: summary.total,
            formatted_total: format(summary.total),
            fuel_sale_count: state.fuel_sales.len(),
            lubricant_count: state.lubricants.len(),
            expense_count: state.expenses.len(),
        }
    }

    /// Aligned `label  value` lines, ending with the total.
    pub fn render_plain(&self) -> Vec<String> {
        let label_width = self
            .rows
            .iter()
            .map(|row| row.label.len())
            .chain(std::iter::once(SummaryField::Total.label().len()))
            .max()
            .unwrap_or(0);
        let value_width = self
            .rows
            .iter()
            .map(|row| row.formatted.chars().count())
            .chain(std::iter::once(self.formatted_total.chars().count()))
            .max()
            .unwrap_or(0);
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let marker = if row.sign < 0.0 { '-' } else { '+' };
                format!(
                    "{marker} {:<label_width$}  {:>value_width$}",
                    row.label.to_uppercase(),
                    row.formatted
                )
            })
            .collect();
        lines.push(format!(
            "= {:<label_width$}  {:>value_width$}",
            SummaryField::Total.label().to_uppercase(),
            self.formatted_total
        ));
        lines
    }
}
