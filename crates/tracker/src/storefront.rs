//! Instrumented storefront journeys.
//!
//! Each method is one shopper action on the demo site: it moves the page
//! context to the route the action happens on, updates client state, and
//! emits the same events the web storefront does.
//!
//! | Route        | Action            | Event                                      |
//! |--------------|-------------------|--------------------------------------------|
//! | `/login`     | view / submit     | `page_view`, `user_login` / `user_signup`  |
//! | `/dashboard` | view / ad click   | `page_view`, `ad_click`                    |
//! | `/products`  | view / click / add| `page_view`, `product_view`, `add_to_cart` |
//! | `/cart`      | view / checkout   | `page_view`, `checkout_start`              |
//! | `/checkout`  | view / pay        | `page_view`, `payment_info_entered`, `purchase` |

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::form_urlencoded;

use aixel_core::{Email, EventType, ProductId};

use crate::cart::{Cart, CartTotals};
use crate::catalog::{self, Product};
use crate::context::Utm;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::event::TrackOptions;
use crate::identity::{self, IdentityResolver, Resolution, StoredUserDirectory, User, UserDirectory};
use crate::storage::KeyValueStore;
use crate::tracker::{TrackOutcome, Tracker};
use crate::transport::{HttpTransport, Transport};

/// Route paths of the demo storefront.
pub mod routes {
    pub const LOGIN: &str = "/login";
    pub const DASHBOARD: &str = "/dashboard";
    pub const PRODUCTS: &str = "/products";
    pub const CART: &str = "/cart";
    pub const CHECKOUT: &str = "/checkout";
}

/// Event type for dashboard banner clicks.
pub const AD_CLICK: &str = "ad_click";

/// Shopper actions that cannot be performed in the current state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorefrontError {
    #[error("no product with id {0}")]
    UnknownProduct(ProductId),

    #[error("cart has no item at position {index} (cart holds {len})")]
    NoSuchCartItem { index: usize, len: usize },

    #[error("cart is empty")]
    EmptyCart,
}

/// Which login form tab was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    #[default]
    Login,
    Signup,
}

impl LoginMode {
    #[must_use]
    pub const fn event_type(self) -> EventType {
        match self {
            Self::Login => EventType::UserLogin,
            Self::Signup => EventType::UserSignup,
        }
    }
}

/// Result of [`Storefront::submit_login`].
#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub resolution: Resolution,
    pub outcome: TrackOutcome,
}

/// Result of [`Storefront::view_checkout`].
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutView {
    /// The checkout page was shown.
    Shown(TrackOutcome),
    /// The cart was empty; the shopper landed on the products page instead.
    Redirected(TrackOutcome),
}

/// Result of [`Storefront::pay`].
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub items: Vec<Product>,
    pub totals: CartTotals,
    pub payment: TrackOutcome,
    pub purchase: TrackOutcome,
}

/// A shopper's session on the demo storefront.
pub struct Storefront<T = HttpTransport, D = StoredUserDirectory<Arc<dyn KeyValueStore>>> {
    tracker: Tracker<T>,
    resolver: IdentityResolver<D>,
    cart: Cart,
}

impl<T: Transport> Storefront<T> {
    /// Open the storefront with the user directory kept in the tracker's
    /// own storage.
    #[must_use]
    pub fn new(tracker: Tracker<T>) -> Self {
        let directory = StoredUserDirectory::new(Arc::clone(tracker.store()));
        Self::with_directory(tracker, directory)
    }
}

impl<T: Transport, D: UserDirectory> Storefront<T, D> {
    /// Open the storefront over an explicit user directory.
    ///
    /// A shopper still logged in from an earlier run is attached to the
    /// Sentry scope again.
    #[must_use]
    pub fn with_directory(tracker: Tracker<T>, directory: D) -> Self {
        let cart = Cart::load(Arc::clone(tracker.store()));
        let shop = Self {
            tracker,
            resolver: IdentityResolver::new(directory),
            cart,
        };
        if let Some(user) = shop.current_user() {
            set_sentry_user(&user.user_id, Some(user.email.as_str()));
        }
        shop
    }

    #[must_use]
    pub const fn tracker(&self) -> &Tracker<T> {
        &self.tracker
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The logged-in shopper, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        identity::current_user(&**self.tracker.store())
    }

    // =========================================================================
    // Login
    // =========================================================================

    pub async fn view_login(&self) -> TrackOutcome {
        self.tracker.navigate(routes::LOGIN);
        self.page_view("login").await
    }

    /// Log in (or sign up) as `email`, then emit the login event attributed
    /// to the resolved user.
    pub async fn submit_login(&self, email: &Email, name: Option<&str>, mode: LoginMode) -> Login {
        self.ensure_at(routes::LOGIN);

        let resolution = self.resolver.resolve_user(email, name);
        let user = &resolution.user;
        identity::set_current_user(&**self.tracker.store(), user);
        set_sentry_user(&user.user_id, Some(user.email.as_str()));
        info!(user_id = %user.user_id, returning = resolution.returning, "Logged in");

        let outcome = self
            .tracker
            .track(
                mode.event_type(),
                TrackOptions::new()
                    .user(Some(&user.user_id))
                    .metadata(json!({"email": email.as_str(), "method": "email"})),
            )
            .await;

        Login { resolution, outcome }
    }

    /// Forget the user and empty the cart. Emits nothing.
    pub fn logout(&mut self) {
        identity::clear_current_user(&**self.tracker.store());
        self.cart.clear();
        clear_sentry_user();
        info!("Logged out");
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn view_dashboard(&self) -> TrackOutcome {
        self.tracker.navigate(routes::DASHBOARD);
        self.page_view("dashboard").await
    }

    /// Click a dashboard banner: emit `ad_click`, then land on the products
    /// page tagged with the banner's campaign.
    ///
    /// Returns the outcomes of the click and of the landing page view.
    pub async fn click_ad(&self, campaign: &str) -> (TrackOutcome, TrackOutcome) {
        self.ensure_at(routes::DASHBOARD);
        let click = self
            .tracker
            .track(
                AD_CLICK,
                self.as_user()
                    .metadata(json!({"campaign": campaign, "source": "dashboard"})),
            )
            .await;

        let landing = self
            .view_products(Some(&Utm {
                source: "dashboard".to_string(),
                medium: "banner".to_string(),
                campaign: campaign.to_string(),
            }))
            .await;
        (click, landing)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Open the products page, optionally through a campaign link.
    pub async fn view_products(&self, utm: Option<&Utm>) -> TrackOutcome {
        let target = utm.map_or_else(
            || routes::PRODUCTS.to_string(),
            |utm| {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("utm_source", &utm.source)
                    .append_pair("utm_medium", &utm.medium)
                    .append_pair("utm_campaign", &utm.campaign)
                    .finish();
                format!("{}?{query}", routes::PRODUCTS)
            },
        );
        self.tracker.navigate(&target);

        let landing = self.tracker.page().is_campaign_landing();
        self.tracker
            .track(
                EventType::PageView,
                self.as_user()
                    .metadata(json!({"landing": landing, "page": "products"})),
            )
            .await
    }

    /// Open a product's details.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::UnknownProduct` if `id` is not in the catalog.
    pub async fn view_product(&self, id: ProductId) -> Result<TrackOutcome, StorefrontError> {
        let product = catalog::find(id).ok_or(StorefrontError::UnknownProduct(id))?;
        self.ensure_at(routes::PRODUCTS);
        Ok(self.track_product(EventType::ProductView, &product).await)
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::UnknownProduct` if `id` is not in the catalog.
    pub async fn add_to_cart(&mut self, id: ProductId) -> Result<TrackOutcome, StorefrontError> {
        let product = catalog::find(id).ok_or(StorefrontError::UnknownProduct(id))?;
        self.ensure_at(routes::PRODUCTS);
        let outcome = self.track_product(EventType::AddToCart, &product).await;
        self.cart.add(product);
        Ok(outcome)
    }

    // =========================================================================
    // Cart & checkout
    // =========================================================================

    pub async fn view_cart(&self) -> TrackOutcome {
        self.tracker.navigate(routes::CART);
        self.page_view("cart").await
    }

    /// Remove the cart entry at `index`. Emits nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::NoSuchCartItem` for an out-of-range index.
    pub fn remove_from_cart(&mut self, index: usize) -> Result<Product, StorefrontError> {
        self.ensure_at(routes::CART);
        let len = self.cart.len();
        self.cart
            .remove(index)
            .ok_or(StorefrontError::NoSuchCartItem { index, len })
    }

    /// Press the checkout button on the cart page.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::EmptyCart` when there is nothing to check out.
    pub async fn start_checkout(&self) -> Result<TrackOutcome, StorefrontError> {
        if self.cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        self.ensure_at(routes::CART);

        let totals = self.cart.totals();
        Ok(self
            .tracker
            .track(
                EventType::CheckoutStart,
                self.as_user().metadata(json!({
                    "items_count": self.cart.len(),
                    "total_amount": amount(totals.total),
                })),
            )
            .await)
    }

    /// Open the checkout page; an empty cart bounces to the products page.
    pub async fn view_checkout(&self) -> CheckoutView {
        if self.cart.is_empty() {
            return CheckoutView::Redirected(self.view_products(None).await);
        }
        self.tracker.navigate(routes::CHECKOUT);
        CheckoutView::Shown(self.page_view("checkout").await)
    }

    /// Submit the payment form: emit `payment_info_entered` and `purchase`,
    /// then empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::EmptyCart` when there is nothing to pay for.
    pub async fn pay(&mut self) -> Result<Receipt, StorefrontError> {
        if self.cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        self.ensure_at(routes::CHECKOUT);

        let items = self.cart.items().to_vec();
        let totals = self.cart.totals();

        let payment = self
            .tracker
            .track(
                EventType::PaymentInfoEntered,
                self.as_user().metadata(json!({
                    "total_amount": amount(totals.total),
                    "items_count": items.len(),
                })),
            )
            .await;

        let line_items: Vec<Value> = items
            .iter()
            .map(|item| json!({"id": item.id, "name": item.name, "price": amount(item.price)}))
            .collect();
        let purchase = self
            .tracker
            .track(
                EventType::Purchase,
                self.as_user().revenue(totals.total).metadata(json!({
                    "items": line_items,
                    "tax": amount(totals.tax),
                    "subtotal": amount(totals.subtotal),
                })),
            )
            .await;

        self.cart.clear();
        info!(total = %totals.total, items = items.len(), "Purchase complete");

        Ok(Receipt {
            items,
            totals,
            payment,
            purchase,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn page_view(&self, page: &str) -> TrackOutcome {
        self.tracker
            .track(EventType::PageView, TrackOptions::new().metadata(json!({"page": page})))
            .await
    }

    async fn track_product(&self, event_type: EventType, product: &Product) -> TrackOutcome {
        self.tracker
            .track(
                event_type,
                self.as_user().metadata(json!({
                    "product_id": product.id,
                    "product_name": product.name,
                    "price": amount(product.price),
                })),
            )
            .await
    }

    /// Options attributed explicitly to the logged-in user.
    fn as_user(&self) -> TrackOptions {
        TrackOptions::new().user(self.current_user().map(|u| u.user_id).as_ref())
    }

    /// Navigate to `route` unless already there (keeping any query string).
    fn ensure_at(&self, route: &str) {
        if self.tracker.page().path() != route {
            self.tracker.navigate(route);
        }
    }
}

/// Money amount as a JSON number.
fn amount(value: Decimal) -> Value {
    value.to_f64().map_or(Value::Null, Value::from)
}
