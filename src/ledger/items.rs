use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared view over the three kinds of recorded transactions.
pub trait LineItem {
    fn id(&self) -> &str;

    /// Monetary contribution of the item to its summary category.
    fn value(&self) -> f64;
}

pub(crate) fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelType {
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "diesel")]
    Diesel,
    #[serde(rename = "adBlue")]
    AdBlue,
}

impl FuelType {
    pub const ALL: [FuelType; 3] = [FuelType::Regular, FuelType::Diesel, FuelType::AdBlue];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Regular => "regular",
            FuelType::Diesel => "diesel",
            FuelType::AdBlue => "adBlue",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metered fuel sale. `total` is fixed when the sale is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FuelSale {
    pub id: String,
    #[serde(rename = "type")]
    pub fuel_type: FuelType,
    pub price_per_gal: f64,
    pub quantity_gal: f64,
    pub total: f64,
}

impl FuelSale {
    pub fn new(fuel_type: FuelType, price_per_gal: f64, quantity_gal: f64) -> Self {
        Self {
            id: fresh_id(),
            fuel_type,
            price_per_gal,
            quantity_gal,
            total: price_per_gal * quantity_gal,
        }
    }
}

impl LineItem for FuelSale {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> f64 {
        self.total
    }
}

/// A lubricant sale; `amount` is the value charged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lubricant {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
}

impl Lubricant {
    pub fn new(kind: impl Into<String>, amount: f64) -> Self {
        Self {
            id: fresh_id(),
            kind: kind.into(),
            amount,
        }
    }
}

impl LineItem for Lubricant {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub description: String,
}

impl Expense {
    pub fn new(amount: f64, description: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            amount,
            description: description.into(),
        }
    }
}

impl LineItem for Expense {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> f64 {
        self.amount
    }
}
