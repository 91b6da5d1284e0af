use crate::api::models::{OrderLine, Product};

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }

    fn max_quantity(&self) -> u32 {
        u32::try_from(self.product.stock).unwrap_or(u32::MAX)
    }
}

/// Client-side cart. Lines stay in the order products were first added.
#[derive(Debug, Default, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Adds `quantity` of `product`, capped at the product's stock. Returns the resulting quantity.
    pub fn add(&mut self, product: &Product, quantity: u32) -> u32 {
        if quantity == 0 {
            return self.quantity_of(product.id);
        }
        if let Some(pos) = self.lines.iter().position(|l| l.product.id == product.id) {
            let line = &mut self.lines[pos];
            line.product = product.clone();
            line.quantity = line.quantity.saturating_add(quantity).min(line.max_quantity());
            let now = line.quantity;
            if now == 0 {
                log::debug!("product {} sold out, dropping it from the cart", product.id);
                self.lines.remove(pos);
            }
            return now;
        }
        let line = CartLine {
            product: product.clone(),
            quantity,
        };
        let capped = quantity.min(line.max_quantity());
        if capped == 0 {
            log::debug!("product {} is out of stock", product.id);
            return 0;
        }
        self.lines.push(CartLine { quantity: capped, ..line });
        capped
    }

    /// Sets the quantity of an existing line; zero removes it. Returns false when the product isn't in the cart.
    pub fn set_quantity(&mut self, product_id: u64, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        let Some(pos) = self.lines.iter().position(|l| l.product.id == product_id) else {
            return false;
        };
        let line = &mut self.lines[pos];
        line.quantity = quantity.min(line.max_quantity());
        if line.quantity == 0 {
            self.lines.remove(pos);
        }
        true
    }

    pub fn remove(&mut self, product_id: u64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product.id != product_id);
        self.lines.len() != before
    }

    pub fn quantity_of(&self, product_id: u64) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product.id == product_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product.id,
                quantity: l.quantity,
            })
            .collect()
    }
}
