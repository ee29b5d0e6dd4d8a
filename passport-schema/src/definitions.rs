//! Embedded category schema documents.

use passport_core::ProductCategory;

pub const BATTERY_INDUSTRIAL: &str = include_str!("../schemas/battery_industrial.json");
pub const TEXTILE_APPAREL: &str = include_str!("../schemas/textile_apparel.json");

/// Schemas shipped with the binary. Categories absent here are declared but
/// unsupported for intake.
pub fn builtin_sources() -> [(ProductCategory, &'static str); 2] {
    [
        (ProductCategory::BatteryIndustrial, BATTERY_INDUSTRIAL),
        (ProductCategory::TextileApparel, TEXTILE_APPAREL),
    ]
}
