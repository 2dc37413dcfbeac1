//! Demo checkout server that forwards checkout, payment-intent, coupon and
//! webhook traffic to Stripe on behalf of a browser frontend.

pub mod checkout;
pub mod config;
pub mod dtos;
pub mod error;
pub mod models;
pub mod provider;
pub mod routes;
pub mod stripe_client;
pub mod webhook;

pub use config::AppConfig;
pub use provider::PaymentProvider;
pub use routes::{app, AppState};
pub use stripe_client::StripeProvider;
