//! The demo storefront's product catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aixel_core::{Price, ProductId};

/// A catalog product, as rendered by the storefront and stored in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// USD amount; a JSON number on the wire.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub image: String,
    pub emoji: String,
}

impl Product {
    /// The price in USD.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::usd(self.price)
    }
}

/// All products on sale, in display order.
#[must_use]
pub fn catalog() -> Vec<Product> {
    vec![
        product(
            1,
            "AI Analytics Pro",
            299,
            "Advanced AI-powered analytics dashboard with real-time insights and predictive modeling.",
            "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=400&h=300&fit=crop",
            "📊",
        ),
        product(
            2,
            "Marketing Dashboard",
            199,
            "Complete marketing analytics suite with campaign tracking and ROI optimization.",
            "https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=400&h=300&fit=crop",
            "📈",
        ),
        product(
            3,
            "Customer Insights",
            399,
            "Deep customer behavior analysis with AI-driven recommendations and segmentation.",
            "https://images.unsplash.com/photo-1522071820081-009f0129c71c?w=400&h=300&fit=crop",
            "👥",
        ),
        product(
            4,
            "Journey Tracker",
            249,
            "Track complete customer journeys across all touchpoints with visual funnel analysis.",
            "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=400&h=300&fit=crop",
            "🎯",
        ),
    ]
}

/// Look up a product by id.
#[must_use]
pub fn find(id: ProductId) -> Option<Product> {
    catalog().into_iter().find(|p| p.id == id)
}

fn product(id: i32, name: &str, dollars: i64, description: &str, image: &str, emoji: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Decimal::from(dollars),
        description: description.to_string(),
        image: image.to_string(),
        emoji: emoji.to_string(),
    }
}
