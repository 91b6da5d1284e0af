use std::path::PathBuf;
use std::time::Duration;

use crate::api::client::ApiClient;
use crate::api::events::{OrderEvent, watch_payment};
use crate::api::models::{PaymentStatus, Product, ProfileUpdate, SessionUser};
use crate::app::AppState;
use crate::cart::Cart;
use crate::catalog::{ALL_CATEGORIES, ProductFilter, categories, filter_products};
use crate::error::{Result, ShopError};
use crate::storage::ProductCache;
use crate::ui::{chat_view, product_list};
use crate::utils::{Console, format_price};
use crate::validation::CheckoutForm;

const PAYMENT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const PAYMENT_POLL_ATTEMPTS: u32 = 40;

const HELP: &str = "\
Commands:
  products [search...]          list products, optionally filtered by text
  browse <category> [search...] list products in one category
  categories                    list categories
  show <id>                     product details
  add <id> [qty]                add to cart
  set <id> <qty>                change a cart quantity (0 removes)
  remove <id>                   remove from cart
  cart                          show cart
  checkout                      place an order for the cart
  orders                        your orders
  track <order id>              order status
  tutorials [search...]         DIY tutorials
  chat                          ask the shop assistant
  account [edit | photo <path>] view or update your profile
  logout | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAction {
    Show,
    Edit,
    Photo(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Products { category: Option<String>, query: String },
    Categories,
    Show(u64),
    Add { id: u64, quantity: u32 },
    SetQuantity { id: u64, quantity: u32 },
    Remove(u64),
    Cart,
    Checkout,
    Orders,
    Track(u64),
    Tutorials(String),
    Chat,
    Account(AccountAction),
    Logout,
    Help,
    Quit,
}

fn parse_id(arg: Option<&str>, what: &str) -> std::result::Result<u64, String> {
    let arg = arg.ok_or_else(|| format!("missing {what}"))?;
    arg.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("`{arg}` is not a valid {what}"))
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Command, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err("type `help` for a list of commands".into());
        };
        let rest: Vec<&str> = words.collect();
        let cmd = match head.to_lowercase().as_str() {
            "products" | "p" => Command::Products {
                category: None,
                query: rest.join(" "),
            },
            "browse" => {
                let (category, query) = rest.split_first().ok_or("missing category")?;
                Command::Products {
                    category: Some(category.to_string()),
                    query: query.join(" "),
                }
            }
            "categories" => Command::Categories,
            "show" => Command::Show(parse_id(rest.first().copied(), "product id")?),
            "add" => {
                let id = parse_id(rest.first().copied(), "product id")?;
                let quantity = match rest.get(1) {
                    Some(q) => q
                        .parse::<u32>()
                        .ok()
                        .filter(|q| *q > 0)
                        .ok_or_else(|| format!("`{q}` is not a valid quantity"))?,
                    None => 1,
                };
                Command::Add { id, quantity }
            }
            "set" | "qty" => {
                let id = parse_id(rest.first().copied(), "product id")?;
                let q = rest.get(1).ok_or("missing quantity")?;
                let quantity = q.parse::<u32>().map_err(|_| format!("`{q}` is not a valid quantity"))?;
                Command::SetQuantity { id, quantity }
            }
            "remove" | "rm" => Command::Remove(parse_id(rest.first().copied(), "product id")?),
            "cart" => Command::Cart,
            "checkout" => Command::Checkout,
            "orders" => Command::Orders,
            "track" => Command::Track(parse_id(rest.first().copied(), "order id")?),
            "tutorials" | "diy" => Command::Tutorials(rest.join(" ")),
            "chat" | "assistant" => Command::Chat,
            "account" | "me" => match rest.as_slice() {
                [] => Command::Account(AccountAction::Show),
                ["edit"] => Command::Account(AccountAction::Edit),
                ["photo", path @ ..] if !path.is_empty() => {
                    Command::Account(AccountAction::Photo(PathBuf::from(path.join(" "))))
                }
                _ => return Err("usage: account [edit | photo <path>]".into()),
            },
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command `{other}`; type `help`")),
        };
        Ok(cmd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Logout,
    Quit,
}

struct MainWindow<'a> {
    state: &'a mut AppState,
    client: ApiClient,
    cache: Option<ProductCache>,
    products: Vec<Product>,
    cart: Cart,
}

impl MainWindow<'_> {
    fn user(&self) -> Result<&SessionUser> {
        self.state.user.as_ref().ok_or(ShopError::NotLoggedIn)
    }

    /// Network first; the local cache covers for a fresh-enough or unreachable backend.
    async fn load_products(&mut self) -> Result<&[Product]> {
        let max_age = Duration::from_secs(self.state.cache.max_age_secs);
        let fresh = match &self.cache {
            Some(cache) => !self.products.is_empty() && cache.is_fresh(max_age)?,
            None => false,
        };
        if fresh {
            log::debug!("using in-memory catalogue");
            return Ok(&self.products);
        }
        match self.client.products(None).await {
            Ok(products) => {
                if let Some(cache) = &mut self.cache {
                    if let Err(e) = cache.upsert_products(&products) {
                        log::warn!("failed to cache products: {e}");
                    }
                }
                self.products = products;
            }
            Err(e) => {
                let cached = match &self.cache {
                    Some(cache) => cache.products(None, None)?,
                    None => Vec::new(),
                };
                if cached.is_empty() {
                    return Err(e);
                }
                println!("Offline: showing saved products ({e})");
                self.products = cached;
            }
        }
        Ok(&self.products)
    }

    /// One category, asked of the backend; the cache answers when it's unreachable.
    async fn browse(&mut self, category: &str) -> Result<Vec<Product>> {
        match self.client.products(Some(category)).await {
            Ok(products) => {
                if let Some(cache) = &mut self.cache {
                    if let Err(e) = cache.upsert_products(&products) {
                        log::warn!("failed to cache products: {e}");
                    }
                }
                Ok(products)
            }
            Err(e) => {
                let cached = match &self.cache {
                    Some(cache) => cache.products(Some(category), None)?,
                    None => Vec::new(),
                };
                if cached.is_empty() {
                    return Err(e);
                }
                println!("Offline: showing saved {category} products ({e})");
                Ok(cached)
            }
        }
    }

    async fn find_product(&self, id: u64) -> Result<Product> {
        if let Some(p) = self.products.iter().find(|p| p.id == id) {
            return Ok(p.clone());
        }
        self.client.product(id).await
    }

    async fn checkout(&mut self, console: &mut Console) -> Result<()> {
        if self.cart.is_empty() {
            println!("Your cart is empty.");
            return Ok(());
        }
        let user = self.user()?.clone();
        print!("{}", product_list::render_cart(&self.cart));

        let default_address = user.address.clone().unwrap_or_default();
        let label = if default_address.is_empty() {
            "Delivery address: ".to_string()
        } else {
            format!("Delivery address [{default_address}]: ")
        };
        let Some(mut address) = console.prompt(&label).await? else { return Ok(()) };
        if address.trim().is_empty() {
            address = default_address;
        }
        let Some(pin) = console.prompt("Map pin `lat,lng` (optional): ").await? else { return Ok(()) };
        let Some(payment_method) = console.prompt("Payment method (cod, gcash, card): ").await? else {
            return Ok(());
        };

        let form = CheckoutForm {
            address,
            payment_method,
            pin,
        };
        let request = form.validate(user.id, &self.cart)?;
        let order = self.client.place_order(&request).await?;
        self.cart.clear();
        println!(
            "Order #{} placed: {} ({})",
            order.id,
            format_price(order.total),
            order.status.label()
        );

        if request.payment_method.is_online() {
            let Some(url) = order.payment_url.as_deref() else {
                println!("The payment page is not available yet; check `track {}` later.", order.id);
                return Ok(());
            };
            println!("Complete your payment at: {url}");
            self.await_payment(order.id).await;
        }
        Ok(())
    }

    async fn await_payment(&self, order_id: u64) {
        println!("Waiting for payment confirmation…");
        let (mut rx, handle) = watch_payment(
            self.client.clone(),
            order_id,
            PAYMENT_POLL_INTERVAL,
            PAYMENT_POLL_ATTEMPTS,
        );
        while let Some(event) = rx.recv().await {
            match event {
                OrderEvent::Payment(PaymentStatus::Paid) => println!("Payment received. Thank you!"),
                OrderEvent::Payment(PaymentStatus::Failed) => println!("Payment failed."),
                OrderEvent::Payment(PaymentStatus::Expired) => println!("The payment link expired."),
                OrderEvent::Payment(status) => log::debug!("payment for order {order_id}: {status:?}"),
                OrderEvent::TimedOut => {
                    println!("Still waiting on the payment; check `track {order_id}` later.")
                }
            }
        }
        let _ = handle.await;
    }

    async fn account(&mut self, action: AccountAction, console: &mut Console) -> Result<()> {
        let user = self.user()?.clone();
        let updated = match action {
            AccountAction::Show => {
                print!("{}", product_list::render_account(&user));
                return Ok(());
            }
            AccountAction::Edit => {
                let mut update = ProfileUpdate {
                    user_id: user.id,
                    ..ProfileUpdate::default()
                };
                let blank_keeps = |v: String| Some(v.trim().to_string()).filter(|v| !v.is_empty());
                let Some(name) = console.prompt(&format!("Name [{}]: ", user.name)).await? else {
                    return Ok(());
                };
                update.name = blank_keeps(name);
                let Some(phone) = console.prompt("Phone (blank keeps): ").await? else { return Ok(()) };
                update.phone = match blank_keeps(phone) {
                    Some(p) => Some(crate::validation::validate_phone(&p)?),
                    None => None,
                };
                let Some(address) = console.prompt("Address (blank keeps): ").await? else { return Ok(()) };
                update.address = blank_keeps(address);
                self.client.update_profile(&update).await?
            }
            AccountAction::Photo(path) => {
                let image_url = self.client.upload_profile_image(user.id, &path).await?;
                SessionUser {
                    image_url: Some(image_url),
                    ..user.clone()
                }
            }
        };
        let token = updated.token.clone().or(user.token);
        self.state.user = Some(SessionUser { token, ..updated });
        if let Err(e) = self.state.save() {
            log::warn!("failed to save settings: {e}");
        }
        println!("Profile updated.");
        Ok(())
    }

    async fn handle(&mut self, command: Command, console: &mut Console) -> Result<Option<Exit>> {
        match command {
            Command::Products { category: None, query } => {
                let filter = ProductFilter::new(None, &query);
                let products = self.load_products().await?;
                print!("{}", product_list::render_products(&filter_products(products, &filter)));
            }
            Command::Products {
                category: Some(category),
                query,
            } => {
                let filter = ProductFilter::new(Some(&category), &query);
                let products = if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
                    self.load_products().await?.to_vec()
                } else {
                    self.browse(&category).await?
                };
                print!("{}", product_list::render_products(&filter_products(&products, &filter)));
            }
            Command::Categories => {
                let products = self.load_products().await?;
                println!("{}", categories(products).join(", "));
            }
            Command::Show(id) => {
                let product = self.find_product(id).await?;
                print!("{}", product_list::render_product_detail(&product));
            }
            Command::Add { id, quantity } => {
                let product = self.find_product(id).await?;
                let now = self.cart.add(&product, quantity);
                if now == 0 {
                    println!("{} is out of stock.", product.name);
                } else {
                    println!("{} x{now} in cart.", product.name);
                }
            }
            Command::SetQuantity { id, quantity } => {
                if self.cart.set_quantity(id, quantity) {
                    print!("{}", product_list::render_cart(&self.cart));
                } else {
                    println!("#{id} is not in your cart.");
                }
            }
            Command::Remove(id) => {
                if self.cart.remove(id) {
                    println!("Removed #{id} from cart.");
                } else {
                    println!("#{id} is not in your cart.");
                }
            }
            Command::Cart => print!("{}", product_list::render_cart(&self.cart)),
            Command::Checkout => self.checkout(console).await?,
            Command::Orders => {
                let orders = self.client.orders(self.user()?.id).await?;
                print!("{}", product_list::render_orders(&orders));
            }
            Command::Track(order_id) => {
                let status = self.client.order_status(order_id).await?;
                println!("Order #{order_id}: {}", status.label());
                if !status.is_final() {
                    println!("Check back later for updates.");
                }
            }
            Command::Tutorials(query) => {
                let query = query.trim();
                let tutorials = self
                    .client
                    .tutorials(Some(query).filter(|q| !q.is_empty()))
                    .await?;
                print!("{}", product_list::render_tutorials(&tutorials));
            }
            Command::Chat => chat_view::show_chat(console, self.state.assistant.reply_delay()).await?,
            Command::Account(action) => self.account(action, console).await?,
            Command::Logout => return Ok(Some(Exit::Logout)),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Some(Exit::Quit)),
        }
        Ok(None)
    }
}

/// The signed-in shell. Errors from single commands are reported and the loop continues.
pub async fn show_main_window(state: &mut AppState, console: &mut Console) -> Result<Exit> {
    let token = state.user.as_ref().and_then(|u| u.token.clone());
    let client = ApiClient::new(&state.base_url)?.with_token(token);
    let cache = match ProductCache::open_default() {
        Ok(cache) => Some(cache),
        Err(e) => {
            log::warn!("product cache unavailable: {e}");
            None
        }
    };
    log::info!("using backend {}", client.base_url());
    if let Some(user) = &state.user {
        println!("Hello, {}! Type `help` for commands.", user.name);
    }
    let mut window = MainWindow {
        state,
        client,
        cache,
        products: Vec::new(),
        cart: Cart::default(),
    };

    loop {
        let Some(line) = console.prompt("diyshop> ").await? else {
            return Ok(Exit::Quit);
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        match window.handle(command, console).await {
            Ok(Some(exit)) => return Ok(exit),
            Ok(None) => {}
            Err(ShopError::Io(e)) => return Err(ShopError::Io(e)),
            Err(e) => {
                log::warn!("command failed: {e}");
                println!("Error: {e}");
            }
        }
    }
}
