use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Reconciliation record combining every category of the shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub fuel_sales: f64,
    pub lubricant_sales: f64,
    pub credits: f64,
    pub cards: f64,
    pub bonds: f64,
    pub expenses: f64,
    pub deposits: f64,
    pub cash: f64,
    pub total: f64,
}

impl SalesSummary {
    /// fuel + lubricants + credits + cards + bonds - expenses - deposits + cash
    pub fn computed_total(&self) -> f64 {
        self.fuel_sales + self.lubricant_sales + self.credits + self.cards + self.bonds
            - self.expenses
            - self.deposits
            + self.cash
    }

    pub fn recompute_total(&mut self) {
        self.total = self.computed_total();
    }

    pub fn get(&self, field: SummaryField) -> f64 {
        match field {
            SummaryField::FuelSales => self.fuel_sales,
            SummaryField::LubricantSales => self.lubricant_sales,
            SummaryField::Credits => self.credits,
            SummaryField::Cards => self.cards,
            SummaryField::Bonds => self.bonds,
            SummaryField::Expenses => self.expenses,
            SummaryField::Deposits => self.deposits,
            SummaryField::Cash => self.cash,
            SummaryField::Total => self.total,
        }
    }

    /// Overwrites a manually entered category. Derived fields are refused.
    pub(crate) fn set_manual(&mut self, field: SummaryField, value: f64) -> Result<(), LedgerError> {
        let slot = match field {
            SummaryField::Credits => &mut self.credits,
            SummaryField::Cards => &mut self.cards,
            SummaryField::Bonds => &mut self.bonds,
            SummaryField::Deposits => &mut self.deposits,
            SummaryField::Cash => &mut self.cash,
            derived => return Err(LedgerError::ReadOnlyField(derived)),
        };
        *slot = value;
        self.recompute_total();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryField {
    FuelSales,
    LubricantSales,
    Credits,
    Cards,
    Bonds,
    Expenses,
    Deposits,
    Cash,
    Total,
}

impl SummaryField {
    /// Categories in the order the station sheet lists them.
    pub const CATEGORIES: [SummaryField; 8] = [
        SummaryField::FuelSales,
        SummaryField::LubricantSales,
        SummaryField::Credits,
        SummaryField::Cards,
        SummaryField::Bonds,
        SummaryField::Expenses,
        SummaryField::Deposits,
        SummaryField::Cash,
    ];

    pub const MANUAL: [SummaryField; 5] = [
        SummaryField::Credits,
        SummaryField::Cards,
        SummaryField::Bonds,
        SummaryField::Deposits,
        SummaryField::Cash,
    ];

    pub fn is_manual(&self) -> bool {
        Self::MANUAL.contains(self)
    }

    /// Sign applied to the field when it enters the grand total.
    pub fn sign(&self) -> f64 {
        match self {
            SummaryField::Expenses | SummaryField::Deposits => -1.0,
            _ => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryField::FuelSales => "fuelSales",
            SummaryField::LubricantSales => "lubricantSales",
            SummaryField::Credits => "credits",
            SummaryField::Cards => "cards",
            SummaryField::Bonds => "bonds",
            SummaryField::Expenses => "expenses",
            SummaryField::Deposits => "deposits",
            SummaryField::Cash => "cash",
            SummaryField::Total => "total",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SummaryField::FuelSales => "Fuel sold",
            SummaryField::LubricantSales => "Lubricants sold",
            SummaryField::Credits => "Credits",
            SummaryField::Cards => "Cards",
            SummaryField::Bonds => "Bonds",
            SummaryField::Expenses => "Expenses",
            SummaryField::Deposits => "Deposits",
            SummaryField::Cash => "Cash",
            SummaryField::Total => "Total",
        }
    }
}

impl fmt::Display for SummaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryField {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "fuelsales" => Ok(SummaryField::FuelSales),
            "lubricantsales" => Ok(SummaryField::LubricantSales),
            "credits" => Ok(SummaryField::Credits),
            "cards" => Ok(SummaryField::Cards),
            "bonds" => Ok(SummaryField::Bonds),
            "expenses" => Ok(SummaryField::Expenses),
            "deposits" => Ok(SummaryField::Deposits),
            "cash" => Ok(SummaryField::Cash),
            "total" => Ok(SummaryField::Total),
            _ => Err(LedgerError::UnknownField(s.to_string())),
        }
    }
}
