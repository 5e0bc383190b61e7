//! Vendor to category mapping.

use std::collections::HashMap;

use crate::models::config::ExtractionConfig;

/// Maps a resolved vendor name onto a spending category.
///
/// Lookup is by exact vendor name; anything unmapped falls back to the
/// configured default category.
pub struct CategoryMapper {
    categories: HashMap<String, String>,
    default_category: String,
}

impl CategoryMapper {
    pub fn new(config: &ExtractionConfig) -> Self {
        let mut categories = HashMap::with_capacity(config.vendors.len());
        for entry in &config.vendors {
            // First declaration wins.
            categories
                .entry(entry.name.clone())
                .or_insert_with(|| entry.category.clone());
        }

        Self {
            categories,
            default_category: config.default_category.clone(),
        }
    }

    pub fn categorize(&self, vendor: Option<&str>) -> &str {
        vendor
            .and_then(|name| self.categories.get(name))
            .map(String::as_str)
            .unwrap_or(&self.default_category)
    }

    /// Whether the vendor name has an explicit category.
    pub fn is_mapped(&self, vendor: &str) -> bool {
        self.categories.contains_key(vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::VendorEntry;

    #[test]
    fn test_known_vendor_category() {
        let mapper = CategoryMapper::new(&ExtractionConfig::default());
        assert_eq!(mapper.categorize(Some("Amazon")), "Shopping");
        assert_eq!(mapper.categorize(Some("Tata Power")), "Electricity");
    }

    #[test]
    fn test_lookup_is_exact() {
        let mapper = CategoryMapper::new(&ExtractionConfig::default());
        assert_eq!(mapper.categorize(Some("amazon")), "Other");
        assert_eq!(mapper.categorize(Some("Joe's Diner")), "Other");
        assert_eq!(mapper.categorize(None), "Other");
    }

    #[test]
    fn test_first_entry_wins_and_default_is_configurable() {
        let config = ExtractionConfig {
            vendors: vec![
                VendorEntry {
                    name: "Cafe".to_string(),
                    category: "Dining".to_string(),
                },
                VendorEntry {
                    name: "Cafe".to_string(),
                    category: "Groceries".to_string(),
                },
            ],
            default_category: "Misc".to_string(),
            ..ExtractionConfig::default()
        };
        let mapper = CategoryMapper::new(&config);
        assert_eq!(mapper.categorize(Some("Cafe")), "Dining");
        assert_eq!(mapper.categorize(Some("Amazon")), "Misc");
        assert!(mapper.is_mapped("Cafe"));
    }
}
