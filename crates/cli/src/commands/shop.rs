//! Shopper journeys.
//!
//! # Usage
//!
//! ```bash
//! aixel login -e jane@example.com -n "Jane Doe" --signup
//! aixel products --utm-source google --utm-medium cpc --utm-campaign spring
//! aixel add 1
//! aixel checkout
//! aixel pay
//! ```
//!
//! Every command starts a fresh page context, so each one first navigates
//! to the route the action happens on.

use std::sync::Arc;

use aixel_core::{Email, EventType, ProductId};
use aixel_tracker::catalog;
use aixel_tracker::context::Utm;
use aixel_tracker::storefront::{AD_CLICK, CheckoutView};
use aixel_tracker::{FileStore, KeyValueStore, LoginMode, Storefront, Tracker, TrackerConfig};

use super::{CliError, report};

/// Open the storefront over the configured state file and backend.
///
/// # Errors
///
/// Returns `CliError::Storage` if the state file cannot be opened.
pub fn open(config: &TrackerConfig) -> Result<Storefront, CliError> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.state_path)?);
    tracing::debug!(path = %config.state_path.display(), "Opened client state");
    Ok(Storefront::new(Tracker::with_http(config, store)))
}

/// View the login page and submit it.
///
/// # Errors
///
/// Returns `CliError::InvalidEmail` if `email` is not an email address.
pub async fn login(
    shop: &Storefront,
    email: &str,
    name: Option<&str>,
    signup: bool,
) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let mode = if signup {
        LoginMode::Signup
    } else {
        LoginMode::Login
    };

    report("page_view", &shop.view_login().await);
    let login = shop.submit_login(&email, name, mode).await;
    report(mode.event_type().as_str(), &login.outcome);

    let user = &login.resolution.user;
    say(&format!(
        "{} {} ({})",
        if login.resolution.returning {
            "Welcome back,"
        } else {
            "Welcome,"
        },
        user.name,
        user.user_id
    ));
    Ok(())
}

pub fn logout(shop: &mut Storefront) {
    shop.logout();
    say("Logged out; cart emptied.");
}

pub async fn dashboard(shop: &Storefront) {
    report("page_view", &shop.view_dashboard().await);
    let name = shop.current_user().map_or_else(|| "User".to_string(), |u| u.name);
    say(&format!("Welcome back, {name}!"));
}

pub async fn ad_click(shop: &Storefront, campaign: &str) {
    let (click, landing) = shop.click_ad(campaign).await;
    report(AD_CLICK, &click);
    report("page_view", &landing);
    list_products();
}

pub async fn products(shop: &Storefront, utm: Option<Utm>) {
    report("page_view", &shop.view_products(utm.as_ref()).await);
    if shop.tracker().page().is_campaign_landing() {
        say("Special offer active! 40% off all products.");
    }
    list_products();
}

/// # Errors
///
/// Returns `CliError::Storefront` for an unknown product id.
pub async fn view(shop: &Storefront, id: ProductId) -> Result<(), CliError> {
    report(EventType::ProductView.as_str(), &shop.view_product(id).await?);
    if let Some(product) = catalog::find(id) {
        say(&format!(
            "{} {} - {}\n  {}",
            product.emoji,
            product.name,
            product.price().display(),
            product.description
        ));
    }
    Ok(())
}

/// # Errors
///
/// Returns `CliError::Storefront` for an unknown product id.
pub async fn add(shop: &mut Storefront, id: ProductId) -> Result<(), CliError> {
    report(EventType::AddToCart.as_str(), &shop.add_to_cart(id).await?);
    say(&format!("Cart now holds {} item(s).", shop.cart().len()));
    Ok(())
}

/// # Errors
///
/// Returns `CliError::Storefront` if there is no entry at `index`.
pub fn remove(shop: &mut Storefront, index: usize) -> Result<(), CliError> {
    let removed = shop.remove_from_cart(index)?;
    say(&format!("Removed {}.", removed.name));
    Ok(())
}

pub async fn cart(shop: &Storefront) {
    report("page_view", &shop.view_cart().await);
    if shop.cart().is_empty() {
        say("Your cart is empty. Add some awesome AI tools to get started!");
        return;
    }
    for (index, item) in shop.cart().items().iter().enumerate() {
        say(&format!("  [{index}] {} {} {}", item.emoji, item.name, item.price().display()));
    }
    print_totals(shop);
}

/// Press checkout on the cart page, then land on the checkout page.
///
/// # Errors
///
/// Returns `CliError::Storefront` if the cart is empty.
pub async fn checkout(shop: &Storefront) -> Result<(), CliError> {
    report(EventType::CheckoutStart.as_str(), &shop.start_checkout().await?);
    match shop.view_checkout().await {
        CheckoutView::Shown(outcome) => {
            report("page_view", &outcome);
            print_totals(shop);
        }
        CheckoutView::Redirected(outcome) => report("page_view", &outcome),
    }
    Ok(())
}

/// # Errors
///
/// Returns `CliError::Storefront` if the cart is empty.
pub async fn pay(shop: &mut Storefront) -> Result<(), CliError> {
    let receipt = shop.pay().await?;
    report(EventType::PaymentInfoEntered.as_str(), &receipt.payment);
    report(EventType::Purchase.as_str(), &receipt.purchase);
    say(&format!(
        "Purchase successful! {} item(s), total ${:.2}",
        receipt.items.len(),
        receipt.totals.total
    ));
    Ok(())
}

fn list_products() {
    for product in catalog::catalog() {
        say(&format!(
            "  #{} {} {} {}",
            product.id,
            product.emoji,
            product.name,
            product.price().display()
        ));
    }
}

fn print_totals(shop: &Storefront) {
    let totals = shop.cart().totals();
    say(&format!(
        "  Subtotal ${:.2}\n  Tax (10%) ${:.2}\n  Total ${:.2}",
        totals.subtotal, totals.tax, totals.total
    ));
}

#[allow(clippy::print_stdout)]
fn say(line: &str) {
    println!("{line}");
}
