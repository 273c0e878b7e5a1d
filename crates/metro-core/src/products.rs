use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One product card scraped from a category listing.
///
/// Field order matches the exported snapshot: `id`, `price`, `name`, `link`,
/// `old_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Site-assigned SKU, taken from the card's `data-sku` attribute.
    pub id: String,
    /// Current price with locale thousand separators removed, e.g. `"1299"`.
    pub price: String,
    pub name: String,
    /// Site base URL concatenated with the card's relative href, verbatim.
    pub link: String,
    /// Pre-discount price. `None` when the card carries no old-price element.
    pub old_price: Option<String>,
}

impl Product {
    /// Returns `true` when the card advertised a pre-discount price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.old_price.is_some()
    }
}

/// Products keyed by their SKU.
///
/// Keys always equal the `id` of the stored product because the only way in
/// is [`Catalog::insert`]. A later product with an already-seen id replaces
/// the earlier one. Iteration is sorted by id so snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: BTreeMap<String, Product>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `product` under its own id, returning the product it replaced.
    pub fn insert(&mut self, product: Product) -> Option<Product> {
        self.products.insert(product.id.clone(), product)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Iterates `(id, product)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Product)> {
        self.products.iter().map(|(id, p)| (id.as_str(), p))
    }

    /// Number of products carrying an old price.
    #[must_use]
    pub fn discounted_count(&self) -> usize {
        self.products.values().filter(|p| p.is_discounted()).count()
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for product in iter {
            catalog.insert(product);
        }
        catalog
    }
}
