use serde::{Deserialize, Deserializer, Serialize};

/// Every backend endpoint wraps its payload in this shape.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionUser {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_u64")]
    pub stock: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tutorial {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub materials: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn is_final(self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Failed | PaymentStatus::Expired)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Gcash,
    Card,
}

impl PaymentMethod {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "cod" | "cash" | "cash on delivery" => Some(PaymentMethod::Cod),
            "gcash" => Some(PaymentMethod::Gcash),
            "card" => Some(PaymentMethod::Card),
            _ => None,
        }
    }

    /// Online methods hand back a payment URL whose status has to be polled.
    pub fn is_online(self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Order {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub status: OrderStatus,
    #[serde(deserialize_with = "de_f64")]
    pub total: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlaceOrderRequest {
    pub user_id: u64,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct ProfileUpdate {
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// PHP backends hand numbers back as strings about half the time.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(u64),
    Float(f64),
    Text(String),
}

fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n),
        NumberOrString::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        NumberOrString::Float(f) => Err(serde::de::Error::custom(format!("not an integer: {f}"))),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n as f64),
        NumberOrString::Float(f) => Ok(f),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_accepts_stringly_numbers() {
        let product: Product = serde_json::from_value(json!({
            "id": "12",
            "name": "Pine plank",
            "category": "Wood",
            "price": "199.50",
            "stock": "4"
        }))
        .unwrap();
        assert_eq!(product.id, 12);
        assert_eq!(product.price, 199.5);
        assert_eq!(product.stock, 4);
        assert_eq!(product.description, "");
    }

    #[test]
    fn unknown_statuses_do_not_fail_decoding() {
        let status: OrderStatus = serde_json::from_value(json!("on_hold")).unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        let status: PaymentStatus = serde_json::from_value(json!("paid")).unwrap();
        assert!(status.is_final());
    }

    #[test]
    fn envelope_without_data() {
        let env: Envelope<Vec<Product>> =
            serde_json::from_value(json!({"success": false, "message": "Invalid credentials"})).unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
        assert_eq!(env.message.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn payment_method_aliases() {
        assert_eq!(PaymentMethod::parse(" Cash "), Some(PaymentMethod::Cod));
        assert_eq!(PaymentMethod::parse("GCash"), Some(PaymentMethod::Gcash));
        assert_eq!(PaymentMethod::parse("bitcoin"), None);
        assert!(!PaymentMethod::Cod.is_online());
    }
}
