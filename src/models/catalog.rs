use serde::{Deserialize, Serialize};

/// Upstream category, unique on `(provider, external_id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCategory {
    pub provider: String,
    pub external_id: String,
    pub name: String,
}

/// Upstream biller (a merchant or utility), unique on `(provider, external_id)`.
/// Stored in `bill_providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biller {
    pub provider: String,
    pub external_id: String,
    pub name: String,
}

/// Keyword classification of a product. Flags are independent, a product may carry several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFlags {
    pub is_airtime: bool,
    pub is_data: bool,
    pub is_power: bool,
    pub is_tv: bool,
}

impl ProductFlags {
    pub fn union(self, other: ProductFlags) -> ProductFlags {
        ProductFlags {
            is_airtime: self.is_airtime || other.is_airtime,
            is_data: self.is_data || other.is_data,
            is_power: self.is_power || other.is_power,
            is_tv: self.is_tv || other.is_tv,
        }
    }
}

/// Purchasable unit, unique on `(provider, external_id)`.
///
/// Category and biller references are weak (natural keys, no foreign key).
/// Money is kept in minor units. `None` amounts mean "not reported by this
/// provider" and leave a stored value untouched on upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillProduct {
    pub provider: String,
    pub external_id: String,
    pub name: String,
    pub category_external_id: Option<String>,
    pub biller_external_id: Option<String>,
    pub payment_code: Option<String>,
    pub currency_code: Option<String>,
    pub amount_minor_units: Option<u64>,
    pub fee_minor_units: Option<u64>,
    #[serde(flatten)]
    pub flags: ProductFlags,
}

impl BillProduct {
    pub fn amount(&self) -> u64 {
        self.amount_minor_units.unwrap_or(0)
    }

    pub fn fee(&self) -> u64 {
        self.fee_minor_units.unwrap_or(0)
    }
}
