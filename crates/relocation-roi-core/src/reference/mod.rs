//! Static reference data: entrepreneur personas, destination countries and
//! the catalog that holds them.
//!
//! Records are immutable once loaded. The built-in tables can be replaced
//! wholesale by a catalog deserialized from JSON.

pub mod catalog;
pub mod country;
pub mod persona;

pub use catalog::Catalog;
pub use country::{CountryProfile, RiskCategory};
pub use persona::Persona;

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
