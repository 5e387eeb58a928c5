//! Normalisation of heterogeneous upstream catalog payloads into typed records.
//!
//! Upstream field names vary between environments and casing conventions, so every
//! field is read through an explicit alias table tried in priority order.

use serde_json::Value;

use super::money::minor_units_from_value;

/// Accepted key aliases per field, highest priority first.
pub mod aliases {
    pub const CATEGORY_LIST: &[&str] = &["BillerCategories"];
    pub const CATEGORY_ID: &[&str] = &["categoryid", "Id"];
    pub const CATEGORY_NAME: &[&str] = &["categoryname", "Name"];

    // Billers[] with nested PaymentItems[]
    pub const BILLERS: &[&str] = &["Billers"];
    pub const BILLER_ID: &[&str] = &["Id"];
    pub const BILLER_NAME: &[&str] = &["Name"];
    pub const BILLER_CATEGORY_ID: &[&str] = &["BillerCategoryId"];
    pub const PAYMENT_ITEMS: &[&str] = &["PaymentItems"];
    pub const ITEM_ID: &[&str] = &["Id"];
    pub const ITEM_NAME: &[&str] = &["Name"];
    pub const ITEM_PAYMENT_CODE: &[&str] = &["PaymentCode"];
    pub const ITEM_CURRENCY: &[&str] = &["CurrencyCode"];

    // BillerList.Category[].Billers[]
    pub const BILLER_LIST: &[&str] = &["BillerList"];
    pub const BILLER_LIST_CATEGORIES: &[&str] = &["Category"];
    pub const LISTED_CATEGORY_ID: &[&str] = &["Id"];
    pub const LISTED_BILLERS: &[&str] = &["Billers"];
    pub const LISTED_BILLER_CURRENCY: &[&str] = &["CurrencyCode"];
    pub const LISTED_BILLER_PRODUCT_CODE: &[&str] = &["ProductCode"];

    // flat services[]
    pub const SERVICES: &[&str] = &["services", "Services"];
    pub const SERVICE_ID: &[&str] = &["serviceid", "id"];
    pub const SERVICE_NAME: &[&str] = &["name", "Name"];
    pub const SERVICE_CATEGORY_ID: &[&str] = &["categoryid", "CategoryId"];
    pub const SERVICE_BILLER_ID: &[&str] = &["billerid", "BillerId"];
    pub const SERVICE_BILLER_NAME: &[&str] = &["billername", "BillerName"];
    pub const SERVICE_PAYMENT_CODE: &[&str] = &["paymentCode", "paymentcode", "PaymentCode"];
    pub const SERVICE_CURRENCY: &[&str] = &["currencyCode", "currencycode", "CurrencyCode"];

    // billers-by-category / bill-items listings
    pub const LISTING_DATA: &[&str] = &["data"];
    pub const LISTING_BILLER_CODE: &[&str] = &["biller_code", "code", "id"];
    pub const LISTING_BILLER_NAME: &[&str] = &["name", "biller_name"];
    pub const LISTING_CURRENCY: &[&str] = &["currency"];
    pub const LISTING_ITEM_CODE: &[&str] = &["item_code", "itemcode"];
    pub const LISTING_ITEM_NAME: &[&str] = &["short_name", "biller_name", "name"];
    pub const LISTING_ITEM_AMOUNT: &[&str] = &["amount"];
    pub const LISTING_ITEM_FEE: &[&str] = &["fee"];
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub external_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillerRecord {
    pub external_id: String,
    pub name: Option<String>,
}

impl BillerRecord {
    /// Stored name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.external_id)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductRecord {
    pub external_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub biller_id: Option<String>,
    pub biller_name: Option<String>,
    pub payment_code: Option<String>,
    pub currency_code: Option<String>,
    pub amount_minor_units: Option<u64>,
    pub fee_minor_units: Option<u64>,
}

/// A biller (when identifiable) and the products it owns, upserted in that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BillerGroup {
    pub biller: Option<BillerRecord>,
    pub products: Vec<ProductRecord>,
}

/// First alias that is present and non-null, rendered as a trimmed non-empty string.
pub fn pick_str(item: &Value, keys: &[&str]) -> Option<String> {
    let value = pick(item, keys)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// First alias that is present and non-null.
pub fn pick<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
}

/// First alias holding an array; empty when none does.
pub fn pick_array<'a>(item: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Category listing: `BillerCategories[]`, or a bare top-level array.
pub fn category_items(payload: &Value) -> &[Value] {
    let wrapped = pick_array(payload, aliases::CATEGORY_LIST);
    if !wrapped.is_empty() {
        return wrapped;
    }
    payload.as_array().map(Vec::as_slice).unwrap_or_default()
}

pub fn normalize_category(item: &Value) -> Option<CategoryRecord> {
    Some(CategoryRecord {
        external_id: pick_str(item, aliases::CATEGORY_ID)?,
        name: pick_str(item, aliases::CATEGORY_NAME)?,
    })
}

/// The three services payload shapes. Any combination may be present at once.
#[derive(Debug, Default)]
pub struct ServicesPayload<'a> {
    pub billers: &'a [Value],
    pub biller_list_categories: &'a [Value],
    pub flat_services: &'a [Value],
}

impl<'a> ServicesPayload<'a> {
    pub fn split(payload: &'a Value) -> Self {
        Self {
            billers: pick_array(payload, aliases::BILLERS),
            biller_list_categories: pick(payload, aliases::BILLER_LIST)
                .map(|list| pick_array(list, aliases::BILLER_LIST_CATEGORIES))
                .unwrap_or_default(),
            flat_services: pick_array(payload, aliases::SERVICES),
        }
    }

    /// All groups in processing order: nested billers, category listings, flat services.
    pub fn groups(&self) -> Vec<BillerGroup> {
        let mut groups: Vec<BillerGroup> = self.billers.iter().map(normalize_biller_with_items).collect();
        groups.extend(self.biller_list_categories.iter().flat_map(normalize_listed_category));
        groups.extend(self.flat_services.iter().filter_map(normalize_service));
        groups
    }
}

/// Biller carrying nested payment items; each item is a product.
pub fn normalize_biller_with_items(biller: &Value) -> BillerGroup {
    let biller_id = pick_str(biller, aliases::BILLER_ID);
    let biller_name = pick_str(biller, aliases::BILLER_NAME);
    let category_id = pick_str(biller, aliases::BILLER_CATEGORY_ID);

    let products = pick_array(biller, aliases::PAYMENT_ITEMS)
        .iter()
        .filter_map(|item| {
            Some(ProductRecord {
                external_id: pick_str(item, aliases::ITEM_ID)?,
                name: pick_str(item, aliases::ITEM_NAME)?,
                category_id: category_id.clone(),
                biller_id: biller_id.clone(),
                biller_name: biller_name.clone(),
                payment_code: pick_str(item, aliases::ITEM_PAYMENT_CODE),
                currency_code: pick_str(item, aliases::ITEM_CURRENCY),
                ..ProductRecord::default()
            })
        })
        .collect();

    BillerGroup {
        biller: biller_id.clone().map(|external_id| BillerRecord {
            external_id,
            name: biller_name.clone(),
        }),
        products,
    }
}

/// Category holding billers; each biller doubles as a product keyed by the biller id,
/// with the provider product code as its payment code.
pub fn normalize_listed_category(category: &Value) -> Vec<BillerGroup> {
    let category_id = pick_str(category, aliases::LISTED_CATEGORY_ID);

    pick_array(category, aliases::LISTED_BILLERS)
        .iter()
        .filter_map(|raw| {
            let record = BillerRecord {
                external_id: pick_str(raw, aliases::BILLER_ID)?,
                name: pick_str(raw, aliases::BILLER_NAME),
            };
            Some(record.with_product(raw, category_id.clone()))
        })
        .collect()
}

impl BillerRecord {
    fn with_product(self, raw: &Value, category_id: Option<String>) -> BillerGroup {
        let product = ProductRecord {
            external_id: self.external_id.clone(),
            name: self.display_name().to_string(),
            category_id,
            biller_id: Some(self.external_id.clone()),
            biller_name: None,
            payment_code: pick_str(raw, aliases::LISTED_BILLER_PRODUCT_CODE),
            currency_code: pick_str(raw, aliases::LISTED_BILLER_CURRENCY),
            ..ProductRecord::default()
        };
        BillerGroup {
            biller: Some(self),
            products: vec![product],
        }
    }
}

/// Flat service already denormalised to one product.
pub fn normalize_service(service: &Value) -> Option<BillerGroup> {
    let external_id = pick_str(service, aliases::SERVICE_ID)?;
    let name = pick_str(service, aliases::SERVICE_NAME)?;
    let biller_id = pick_str(service, aliases::SERVICE_BILLER_ID);
    let biller_name = pick_str(service, aliases::SERVICE_BILLER_NAME);

    let product = ProductRecord {
        external_id,
        name,
        category_id: pick_str(service, aliases::SERVICE_CATEGORY_ID),
        biller_id: biller_id.clone(),
        biller_name: biller_name.clone(),
        payment_code: pick_str(service, aliases::SERVICE_PAYMENT_CODE),
        currency_code: pick_str(service, aliases::SERVICE_CURRENCY),
        ..ProductRecord::default()
    };

    Some(BillerGroup {
        biller: biller_id.map(|external_id| BillerRecord {
            external_id,
            name: biller_name,
        }),
        products: vec![product],
    })
}

/// `data[]` of a listing response, empty when absent or not an array.
pub fn listing_items(payload: &Value) -> Vec<Value> {
    pick_array(payload, aliases::LISTING_DATA).to_vec()
}

/// Biller from a billers-by-category listing, with its currency.
pub fn normalize_listed_biller(item: &Value) -> Option<(BillerRecord, Option<String>)> {
    let record = BillerRecord {
        external_id: pick_str(item, aliases::LISTING_BILLER_CODE)?,
        name: pick_str(item, aliases::LISTING_BILLER_NAME),
    };
    Some((record, pick_str(item, aliases::LISTING_CURRENCY)))
}

/// Priced item of one biller; the item code doubles as payment code.
pub fn normalize_listed_item(
    item: &Value,
    biller: &BillerRecord,
    category_id: &str,
    currency_code: Option<&str>,
    default_name: &str,
) -> Option<ProductRecord> {
    let item_code = pick_str(item, aliases::LISTING_ITEM_CODE)?;

    Some(ProductRecord {
        external_id: item_code.clone(),
        name: pick_str(item, aliases::LISTING_ITEM_NAME).unwrap_or_else(|| default_name.to_string()),
        category_id: Some(category_id.to_string()),
        biller_id: Some(biller.external_id.clone()),
        biller_name: biller.name.clone(),
        payment_code: Some(item_code),
        currency_code: currency_code.map(str::to_string),
        amount_minor_units: Some(minor_units_from_value(pick(item, aliases::LISTING_ITEM_AMOUNT))),
        fee_minor_units: Some(minor_units_from_value(pick(item, aliases::LISTING_ITEM_FEE))),
    })
}
