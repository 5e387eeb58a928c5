//! Best-effort keyword classification of catalog products.

use crate::models::ProductFlags;

const AIRTIME_KEYWORDS: &[&str] = &["airtime", "mobile"];
const DATA_KEYWORDS: &[&str] = &["data", "mb", "gb"];
const POWER_KEYWORDS: &[&str] = &["power", "electric", "ikeja", "eko disco"];
const TV_KEYWORDS: &[&str] = &["tv", "dstv", "gotv", "startimes"];

/// Match keywords case-insensitively against product name, biller name and category id.
pub fn classify_product(
    product_name: Option<&str>,
    biller_name: Option<&str>,
    category_id: Option<&str>,
) -> ProductFlags {
    let haystack = format!(
        "{} {} {}",
        product_name.unwrap_or_default(),
        biller_name.unwrap_or_default(),
        category_id.unwrap_or_default()
    )
    .to_lowercase();

    let matches = |keywords: &[&str]| keywords.iter().any(|k| haystack.contains(k));

    ProductFlags {
        is_airtime: matches(AIRTIME_KEYWORDS),
        is_data: matches(DATA_KEYWORDS),
        is_power: matches(POWER_KEYWORDS),
        is_tv: matches(TV_KEYWORDS),
    }
}
