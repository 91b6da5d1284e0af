use std::fmt::Write;

use crate::api::models::{Order, Product, SessionUser, Tutorial};
use crate::cart::Cart;
use crate::utils::format_price;

pub fn render_products(products: &[&Product]) -> String {
    if products.is_empty() {
        return "No products found.\n".to_string();
    }
    let mut out = String::new();
    for p in products {
        let stock = if p.stock == 0 {
            "out of stock".to_string()
        } else {
            format!("{} in stock", p.stock)
        };
        let _ = writeln!(
            out,
            "#{:<5} {:<32} {:>12}  [{}] {}",
            p.id,
            p.name,
            format_price(p.price),
            p.category,
            stock
        );
    }
    out
}

pub fn render_product_detail(p: &Product) -> String {
    let mut out = format!("{} (#{})\n{}  ·  {}\n", p.name, p.id, format_price(p.price), p.category);
    if !p.description.is_empty() {
        let _ = writeln!(out, "{}", p.description);
    }
    let _ = writeln!(out, "Stock: {}", p.stock);
    if let Some(url) = &p.image_url {
        let _ = writeln!(out, "Image: {url}");
    }
    out
}

pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.\n".to_string();
    }
    let mut out = String::new();
    for line in cart.lines() {
        let _ = writeln!(
            out,
            "#{:<5} {:<32} x{:<3} {:>12}",
            line.product.id,
            line.product.name,
            line.quantity,
            format_price(line.subtotal())
        );
    }
    let _ = writeln!(out, "{} item(s), total {}", cart.item_count(), format_price(cart.total()));
    out
}

pub fn render_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "You have no orders yet.\n".to_string();
    }
    let mut out = String::new();
    for o in orders {
        let count: u32 = o.items.iter().map(|l| l.quantity).sum();
        let _ = writeln!(
            out,
            "Order #{:<6} {:<11} {:>12}  {:>3} item(s)  {}",
            o.id,
            o.status.label(),
            format_price(o.total),
            count,
            o.created_at
        );
    }
    out
}

pub fn render_tutorials(tutorials: &[Tutorial]) -> String {
    if tutorials.is_empty() {
        return "No tutorials found.\n".to_string();
    }
    let mut out = String::new();
    for t in tutorials {
        let difficulty = t.difficulty.as_deref().unwrap_or("any level");
        let _ = writeln!(out, "#{:<5} {} ({difficulty})", t.id, t.title);
        if !t.description.is_empty() {
            let _ = writeln!(out, "       {}", t.description);
        }
        if !t.materials.is_empty() {
            let _ = writeln!(out, "       Materials: {}", t.materials.join(", "));
        }
        if let Some(url) = &t.video_url {
            let _ = writeln!(out, "       Video: {url}");
        }
    }
    out
}

pub fn render_account(user: &SessionUser) -> String {
    let mut out = format!("{} <{}>\n", user.name, user.email);
    let _ = writeln!(out, "Phone:   {}", user.phone.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Address: {}", user.address.as_deref().unwrap_or("-"));
    if let Some(url) = &user.image_url {
        let _ = writeln!(out, "Photo:   {url}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::OrderStatus;

    fn product(id: u64, name: &str, stock: u64) -> Product {
        Product {
            id,
            name: name.into(),
            description: String::new(),
            category: "Tools".into(),
            price: 99.0,
            stock,
            image_url: None,
        }
    }

    #[test]
    fn product_rows_show_stock() {
        let a = product(1, "Hammer", 2);
        let b = product(2, "Saw", 0);
        let text = render_products(&[&a, &b]);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("2 in stock"));
        assert!(text.contains("out of stock"));
        assert_eq!(render_products(&[]), "No products found.\n");
    }

    #[test]
    fn cart_summary_has_total() {
        let mut cart = Cart::default();
        cart.add(&product(1, "Hammer", 5), 2);
        let text = render_cart(&cart);
        assert!(text.ends_with("2 item(s), total ₱198.00\n"), "{text}");
    }

    #[test]
    fn orders_show_status_label() {
        let order = Order {
            id: 12,
            status: OrderStatus::Shipped,
            total: 250.0,
            created_at: "2026-10-01".into(),
            items: vec![],
            payment_method: None,
            payment_url: None,
        };
        assert!(render_orders(&[order]).contains("Shipped"));
    }
}
