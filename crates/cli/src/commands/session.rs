//! Inspect the persisted client state.

use aixel_tracker::{Storefront, TrackerConfig};

/// Print the session id, logged-in user and cart size. Emits no events.
#[allow(clippy::print_stdout)]
pub fn show(shop: &Storefront, config: &TrackerConfig) {
    println!("Session:  {}", shop.tracker().session_id());
    match shop.current_user() {
        Some(user) => println!("User:     {} <{}> ({})", user.name, user.email, user.user_id),
        None => println!("User:     (anonymous)"),
    }
    println!("Cart:     {} item(s)", shop.cart().len());
    println!("State:    {}", config.state_path.display());
    println!("Collector: {}", config.track_url());
}
