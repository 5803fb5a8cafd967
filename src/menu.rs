//! Category lookup built from a branch's menu configuration.
//!
//! The menu maps a category label to its items, where the items arrive
//! either as a map of item-name to detail or as a list of detail maps.
//! The lookup resolves an item name to (category, main category). The main
//! category is the first parenthesized group of the category label, so
//! "SOUP (APPETIZER)" rolls up to "APPETIZER"; labels without parentheses
//! roll up to themselves.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::{value_str, UNCATEGORIZED};

#[derive(Debug, Clone)]
struct CategoryEntry {
    category: String,
    main_category: String,
}

/// Item-name to category resolution, read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct CategoryLookup {
    by_item: HashMap<String, CategoryEntry>,
}

impl CategoryLookup {
    /// Build the lookup from the raw menu configuration. A missing or
    /// malformed menu yields an empty lookup; unknown items then resolve
    /// to the uncategorized sentinel rather than an error.
    pub fn from_menu(menu: &Value) -> Self {
        let categories = match menu.as_object() {
            Some(map) => map,
            None => {
                debug!("Menu configuration absent or not an object; all items will be uncategorized");
                return Self::default();
            }
        };

        let paren = Regex::new(r"\(([^)]+)\)").unwrap();
        let mut by_item: HashMap<String, CategoryEntry> = HashMap::new();
        for (category, items) in categories {
            let main_category = main_category_label(&paren, category);
            let mut insert = |name: &str| {
                by_item.insert(
                    name.to_string(),
                    CategoryEntry {
                        category: category.clone(),
                        main_category: main_category.clone(),
                    },
                );
            };
            match items {
                // Map shape: keys are the item names.
                Value::Object(map) => {
                    for item_name in map.keys() {
                        insert(item_name);
                    }
                }
                // List shape: each entry is an item-detail map.
                Value::Array(list) => {
                    for detail in list {
                        if let Some(name) = value_str(detail, &["name", "item_name"]) {
                            insert(&name);
                        }
                    }
                }
                _ => {
                    debug!(category = %category, "Skipping menu category with unrecognized item shape");
                }
            }
        }
        Self { by_item }
    }

    /// Resolve an item name to (category, main category). Unknown names get
    /// the uncategorized sentinel for both.
    pub fn resolve(&self, item_name: &str) -> (&str, &str) {
        match self.by_item.get(item_name) {
            Some(entry) => (entry.category.as_str(), entry.main_category.as_str()),
            None => (UNCATEGORIZED, UNCATEGORIZED),
        }
    }

    pub fn item_count(&self) -> usize {
        self.by_item.len()
    }
}

fn main_category_label(paren: &Regex, category: &str) -> String {
    paren
        .captures(category)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|main| !main.is_empty())
        .unwrap_or_else(|| category.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_items_from_map_shaped_categories() {
        let menu = json!({
            "SOUP (APPETIZER)": {
                "SOUP": { "price": 10_000 },
                "CLEAR BROTH": { "price": 8_000 }
            }
        });
        let lookup = CategoryLookup::from_menu(&menu);
        assert_eq!(lookup.item_count(), 2);
        assert_eq!(lookup.resolve("SOUP"), ("SOUP (APPETIZER)", "APPETIZER"));
    }

    #[test]
    fn resolves_items_from_list_shaped_categories() {
        let menu = json!({
            "COFFEE (BEVERAGE)": [
                { "name": "LATTE", "price": 25_000 },
                { "item_name": "AMERICANO", "price": 20_000 }
            ]
        });
        let lookup = CategoryLookup::from_menu(&menu);
        assert_eq!(lookup.resolve("LATTE"), ("COFFEE (BEVERAGE)", "BEVERAGE"));
        assert_eq!(
            lookup.resolve("AMERICANO"),
            ("COFFEE (BEVERAGE)", "BEVERAGE")
        );
    }

    #[test]
    fn unknown_items_resolve_to_the_sentinel() {
        let lookup = CategoryLookup::from_menu(&json!({}));
        assert_eq!(lookup.resolve("MYSTERY DISH"), ("Uncategorized", "Uncategorized"));
    }

    #[test]
    fn missing_menu_yields_an_empty_lookup() {
        let lookup = CategoryLookup::from_menu(&json!(null));
        assert_eq!(lookup.item_count(), 0);
        assert_eq!(lookup.resolve("SOUP"), ("Uncategorized", "Uncategorized"));
    }

    #[test]
    fn label_without_parentheses_is_its_own_main_category() {
        let menu = json!({ "DESSERT": { "PUDDING": {} } });
        let lookup = CategoryLookup::from_menu(&menu);
        assert_eq!(lookup.resolve("PUDDING"), ("DESSERT", "DESSERT"));
    }

    #[test]
    fn first_parenthesized_group_wins() {
        let paren = Regex::new(r"\(([^)]+)\)").unwrap();
        assert_eq!(main_category_label(&paren, "COFFEE (HOT) (SMALL)"), "HOT");
        assert_eq!(main_category_label(&paren, "  SNACKS  "), "SNACKS");
        assert_eq!(main_category_label(&paren, "ODD ()"), "ODD ()");
    }

    #[test]
    fn mixed_category_shapes_coexist() {
        let menu = json!({
            "SOUP (APPETIZER)": { "SOUP": {} },
            "COFFEE (BEVERAGE)": [ { "name": "LATTE" } ],
            "BROKEN": "not items"
        });
        let lookup = CategoryLookup::from_menu(&menu);
        assert_eq!(lookup.item_count(), 2);
        assert_eq!(lookup.resolve("SOUP").1, "APPETIZER");
        assert_eq!(lookup.resolve("LATTE").1, "BEVERAGE");
    }
}
