//! Product catalog store.
//!
//! Local state is the source of truth; a remote pull may wholesale-replace
//! the contents when (and only when) the remote list is non-empty. Admin
//! edits go through `upsert`/`remove` and are mirrored to the backend by the
//! admin controller.

use crate::models::{LocalizedText, Product};

/// The current set of purchasable products.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// A catalog seeded with the built-in demo products, used until the
    /// first successful pull from a populated backend.
    pub fn with_defaults() -> Self {
        Self::new(default_products())
    }

    pub fn list(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Wholesale replacement from a remote pull.
    pub fn replace_all(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    /// Replace the product with the same id, or prepend when new. Returns
    /// `true` when an existing entry was replaced.
    pub fn upsert(&mut self, product: Product) -> bool {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => {
                *existing = product;
                true
            }
            None => {
                self.products.insert(0, product);
                false
            }
        }
    }

    /// Remove by id. Returns whether an entry was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        self.products.len() < before
    }
}

/// The four demo products the shop opens with before any backend is
/// connected.
pub fn default_products() -> Vec<Product> {
    vec![
        Product {
            id: "p1".to_string(),
            name: LocalizedText::new("精选拿铁咖啡", "厳選ラテ"),
            price: 500,
            category: "Beverages".to_string(),
            image: "https://images.unsplash.com/photo-1509042239860-f550ce710b93?auto=format&fit=crop&w=400&q=80".to_string(),
            description: LocalizedText::new(
                "选用优质咖啡豆，口感顺滑。",
                "高品質のコーヒー豆を使用した、滑らかな味わい。",
            ),
        },
        Product {
            id: "p2".to_string(),
            name: LocalizedText::new("经典三明治", "クラシックサンドイッチ"),
            price: 750,
            category: "Food".to_string(),
            image: "https://images.unsplash.com/photo-1525351484163-7529414344d8?auto=format&fit=crop&w=400&q=80".to_string(),
            description: LocalizedText::new(
                "新鲜火腿与芝士的完美结合。",
                "新鮮なハムとチーズの完璧な組み合わせ。",
            ),
        },
        Product {
            id: "p3".to_string(),
            name: LocalizedText::new("抹茶红豆蛋糕", "抹茶小豆ケーキ"),
            price: 850,
            category: "Dessert".to_string(),
            image: "https://images.unsplash.com/photo-1536599018102-9f803c140fc1?auto=format&fit=crop&w=400&q=80".to_string(),
            description: LocalizedText::new(
                "地道京都抹茶，口感醇厚。",
                "本場京都の抹茶を使用、濃厚な味わい。",
            ),
        },
        Product {
            id: "p4".to_string(),
            name: LocalizedText::new("冷萃冰茶", "コールドブリューティー"),
            price: 450,
            category: "Beverages".to_string(),
            image: "https://images.unsplash.com/photo-1556679343-c7306c1976bc?auto=format&fit=crop&w=400&q=80".to_string(),
            description: LocalizedText::new(
                "清爽解渴，夏季首选。",
                "爽やかで渇きを癒す、夏に最適。",
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, zh: &str) -> Product {
        Product {
            id: id.to_string(),
            name: LocalizedText::new(zh, "商品"),
            price: 100,
            category: "General".to_string(),
            image: String::new(),
            description: LocalizedText::default(),
        }
    }

    #[test]
    fn test_default_catalog_seed() {
        let catalog = Catalog::with_defaults();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("p1").unwrap().price, 500);
        assert_eq!(catalog.get("p3").unwrap().name.ja, "抹茶小豆ケーキ");
    }

    #[test]
    fn test_upsert_prepends_new_and_replaces_existing() {
        let mut catalog = Catalog::new(vec![product("p1", "旧名")]);

        let replaced = catalog.upsert(product("p2", "新品"));
        assert!(!replaced);
        assert_eq!(catalog.list()[0].id, "p2", "new products go to the front");

        let replaced = catalog.upsert(product("p1", "改名"));
        assert!(replaced);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("p1").unwrap().name.zh, "改名");
    }

    #[test]
    fn test_remove() {
        let mut catalog = Catalog::new(vec![product("p1", "甲"), product("p2", "乙")]);
        assert!(catalog.remove("p1"));
        assert!(!catalog.remove("p1"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_replace_all() {
        let mut catalog = Catalog::with_defaults();
        catalog.replace_all(vec![product("r1", "云端")]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("p1").is_none());
    }
}
