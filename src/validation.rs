use thiserror::Error;

use crate::api::models::{Location, PaymentMethod, PlaceOrderRequest, RegisterRequest};
use crate::cart::Cart;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("enter a valid email address")]
    Email,
    #[error("enter a valid phone number")]
    Phone,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("pin must look like `lat,lng` with lat in -90..90 and lng in -180..180")]
    Location,
    #[error("unknown payment method `{0}` (cod, gcash or card)")]
    PaymentMethod(String),
    #[error("your cart is empty")]
    EmptyCart,
}

pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let email = require("email", input)?;
    let (local, domain) = email.split_once('@').ok_or(ValidationError::Email)?;
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) || domain.contains('@') {
        return Err(ValidationError::Email);
    }
    Ok(email)
}

/// Accepts an optional leading `+` and 10 to 13 digits; spaces and dashes are dropped.
pub fn validate_phone(input: &str) -> Result<String, ValidationError> {
    let raw = require("phone", input)?;
    let (plus, rest) = match raw.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", raw.as_str()),
    };
    let digits: String = rest.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !(10..=13).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Phone);
    }
    Ok(format!("{plus}{digits}"))
}

pub fn validate_password(input: &str) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::Required("password"));
    }
    if input.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

impl Location {
    /// Parses a typed map pin such as `14.5995, 120.9842`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let (lat, lng) = input.split_once(',').ok_or(ValidationError::Location)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| ValidationError::Location)?;
        let longitude: f64 = lng.trim().parse().map_err(|_| ValidationError::Location)?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::Location);
        }
        Ok(Location { latitude, longitude })
    }
}

#[derive(Debug, Default, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let name = require("name", &self.name)?;
        let email = validate_email(&self.email)?;
        let phone = validate_phone(&self.phone)?;
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(RegisterRequest {
            name,
            email,
            phone,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckoutForm {
    pub address: String,
    pub payment_method: String,
    /// Optional `lat,lng` pin; blank means no pin.
    pub pin: String,
}

impl CheckoutForm {
    pub fn validate(&self, user_id: u64, cart: &Cart) -> Result<PlaceOrderRequest, ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let address = require("delivery address", &self.address)?;
        let method = require("payment method", &self.payment_method)?;
        let payment_method =
            PaymentMethod::parse(&method).ok_or_else(|| ValidationError::PaymentMethod(method.clone()))?;
        let location = if self.pin.trim().is_empty() {
            None
        } else {
            Some(Location::parse(&self.pin)?)
        };
        Ok(PlaceOrderRequest {
            user_id,
            items: cart.order_lines(),
            payment_method,
            address,
            location,
        })
    }
}
