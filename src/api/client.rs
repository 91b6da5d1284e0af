use std::path::Path;
use std::time::Duration;

use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::api::models::{
    Envelope, Order, OrderStatus, PaymentStatus, PlaceOrderRequest, Product, ProfileUpdate, RegisterRequest,
    SessionUser, Tutorial,
};
use crate::error::{Result, ShopError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Deserialize)]
struct StatusPayload<S> {
    status: S,
}

#[derive(Deserialize)]
struct ImagePayload {
    image_url: String,
}

/// Thin wrapper over the shop's PHP endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub http: HttpClient,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base: Self::base_api(base_url)?,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn base_api(base_url: &str) -> Result<Url> {
        let normalized = crate::utils::normalize_url(base_url);
        let trimmed = normalized.trim_end_matches('/');
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        Ok(self.base.join(name)?)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn read_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Envelope<T>> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ShopError::Status(status));
        }
        let bytes = resp.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "The server rejected the request".into());
            return Err(ShopError::Api(message));
        }
        Ok(envelope)
    }

    async fn read_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let url = resp.url().clone();
        Self::read_envelope(resp).await?.data.ok_or_else(|| {
            log::warn!("{url} replied success without data");
            ShopError::Api("The server returned no data".into())
        })
    }

    /// Lists default to empty when the backend leaves `data` out.
    async fn read_list<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Vec<T>> {
        Ok(Self::read_envelope(resp).await?.data.unwrap_or_default())
    }

    async fn get(&self, name: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let endpoint = self.endpoint(name)?;
        log::debug!("GET {endpoint}");
        Ok(self.with_auth(self.http.get(endpoint).query(query)).send().await?)
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, name: &str, body: &B) -> Result<reqwest::Response> {
        let endpoint = self.endpoint(name)?;
        log::debug!("POST {endpoint}");
        Ok(self.with_auth(self.http.post(endpoint).json(body)).send().await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        let resp = self
            .post("login.php", &json!({ "email": email, "password": password }))
            .await?;
        let user: SessionUser = Self::read_data(resp).await?;
        log::info!("logged in as user {}", user.id);
        Ok(user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<SessionUser> {
        let resp = self.post("register.php", request).await?;
        Self::read_data(resp).await
    }

    /// Fetch the catalogue, optionally narrowed to one category server-side.
    pub async fn products(&self, category: Option<&str>) -> Result<Vec<Product>> {
        let query: Vec<(&str, String)> = category.map(|c| ("category", c.to_string())).into_iter().collect();
        let resp = self.get("products.php", &query).await?;
        Self::read_list(resp).await
    }

    pub async fn product(&self, id: u64) -> Result<Product> {
        let resp = self.get("product.php", &[("id", id.to_string())]).await?;
        Self::read_data(resp).await
    }

    pub async fn tutorials(&self, search: Option<&str>) -> Result<Vec<Tutorial>> {
        let query: Vec<(&str, String)> = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| ("search", s.to_string()))
            .into_iter()
            .collect();
        let resp = self.get("tutorials.php", &query).await?;
        Self::read_list(resp).await
    }

    pub async fn place_order(&self, request: &PlaceOrderRequest) -> Result<Order> {
        let resp = self.post("place_order.php", request).await?;
        let order: Order = Self::read_data(resp).await?;
        log::info!("placed order {} ({} lines)", order.id, request.items.len());
        Ok(order)
    }

    pub async fn orders(&self, user_id: u64) -> Result<Vec<Order>> {
        let resp = self.get("orders.php", &[("user_id", user_id.to_string())]).await?;
        Self::read_list(resp).await
    }

    pub async fn order_status(&self, order_id: u64) -> Result<OrderStatus> {
        let resp = self
            .get("order_status.php", &[("order_id", order_id.to_string())])
            .await?;
        let payload: StatusPayload<OrderStatus> = Self::read_data(resp).await?;
        Ok(payload.status)
    }

    pub async fn payment_status(&self, order_id: u64) -> Result<PaymentStatus> {
        let resp = self
            .get("payment_status.php", &[("order_id", order_id.to_string())])
            .await?;
        let payload: StatusPayload<PaymentStatus> = Self::read_data(resp).await?;
        Ok(payload.status)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<SessionUser> {
        let resp = self.post("update_profile.php", update).await?;
        Self::read_data(resp).await
    }

    /// Upload a profile picture and return the URL the backend stored it under.
    pub async fn upload_profile_image(&self, user_id: u64, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "profile.jpg".into());
        let mime = match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        };
        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;
        let form = Form::new().text("user_id", user_id.to_string()).part("image", part);

        let endpoint = self.endpoint("upload_image.php")?;
        log::debug!("POST {endpoint} (multipart)");
        let resp = self.with_auth(self.http.post(endpoint).multipart(form)).send().await?;
        let payload: ImagePayload = Self::read_data(resp).await?;
        Ok(payload.image_url)
    }
}
