use crate::api::models::Product;

pub const ALL_CATEGORIES: &str = "All";

/// Minimum Jaro-Winkler similarity for a query word to count as a typo of a name word.
const FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub query: String,
}

impl ProductFilter {
    pub fn new(category: Option<&str>, query: &str) -> Self {
        Self {
            category: category.map(str::to_string),
            query: query.to_string(),
        }
    }

    fn category_matches(&self, product: &Product) -> bool {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(c) if c.eq_ignore_ascii_case(ALL_CATEGORIES) => true,
            Some(c) => product.category.trim().to_lowercase() == c.to_lowercase(),
        }
    }

    fn text_matches(&self, product: &Product) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let name = product.name.to_lowercase();
        if name.contains(&query)
            || product.description.to_lowercase().contains(&query)
            || product.category.to_lowercase().contains(&query)
        {
            return true;
        }
        query.split_whitespace().any(|q| {
            name.split_whitespace()
                .any(|word| strsim::jaro_winkler(q, word) >= FUZZY_THRESHOLD)
        })
    }
}

pub fn filter_products<'a>(products: &'a [Product], filter: &ProductFilter) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| filter.category_matches(p) && filter.text_matches(p))
        .collect()
}

/// `"All"` followed by the distinct product categories, sorted and deduplicated ignoring case.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut out: Vec<String> = products
        .iter()
        .map(|p| p.category.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    out.sort_by_key(|c| c.to_lowercase());
    out.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
    out.insert(0, ALL_CATEGORIES.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, name: &str, category: &str, description: &str) -> Product {
        Product {
            id,
            name: name.into(),
            description: description.into(),
            category: category.into(),
            price: 100.0,
            stock: 5,
            image_url: None,
        }
    }

    fn shelf() -> Vec<Product> {
        vec![
            product(1, "Claw Hammer", "Tools", "Steel head, fiberglass handle"),
            product(2, "Acrylic Paint Set", "Paint", "12 colors"),
            product(3, "Pine Plank", "Wood", "1x4, 8ft"),
            product(4, "Paint Brush", "paint", "Synthetic bristles"),
        ]
    }

    fn ids(found: Vec<&Product>) -> Vec<u64> {
        found.into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let products = shelf();
        assert_eq!(ids(filter_products(&products, &ProductFilter::default())), vec![1, 2, 3, 4]);
        assert_eq!(ids(filter_products(&products, &ProductFilter::new(Some("all"), ""))), vec![1, 2, 3, 4]);
    }

    #[test]
    fn category_is_case_insensitive() {
        let products = shelf();
        assert_eq!(ids(filter_products(&products, &ProductFilter::new(Some("Paint"), ""))), vec![2, 4]);
    }

    #[test]
    fn substring_search_covers_description() {
        let products = shelf();
        assert_eq!(ids(filter_products(&products, &ProductFilter::new(None, "bristles"))), vec![4]);
    }

    #[test]
    fn fuzzy_search_tolerates_typos() {
        let products = shelf();
        assert_eq!(ids(filter_products(&products, &ProductFilter::new(None, "hamer"))), vec![1]);
        assert!(filter_products(&products, &ProductFilter::new(None, "xylophone")).is_empty());
    }

    #[test]
    fn category_list_starts_with_all() {
        let products = shelf();
        assert_eq!(categories(&products), vec!["All", "Paint", "Tools", "Wood"]);
    }
}
