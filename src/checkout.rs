//! Translation of the frontend's checkout options into Checkout Session
//! parameters.

use serde_json::Value;

use crate::dtos::CreateCheckoutSessionRequest;
use crate::models::{
    AdjustableQuantity, AfterExpiration, CheckoutMode, Enabled, InvoiceCreation, InvoiceData,
    LineItem, PriceData, ProductData, Recovery, Recurring, SessionConfig,
    ShippingAddressCollection, SubscriptionData, UiMode,
};

const DEFAULT_CURRENCY: &str = "usd";
const DEFAULT_COUNTRIES: [&str; 3] = ["US", "CA", "GB"];
const SAMPLE_IMAGE: &str = "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400";
const RETURN_PATH: &str = "/return?session_id={CHECKOUT_SESSION_ID}";
const CANCEL_PATH: &str = "/hosted.html";

/// Builds the session parameters for `request`.
///
/// `origin` prefixes the return/cancel URLs and `now` is the current unix
/// time used to compute `expires_at`.
pub fn build_session_config(
    request: CreateCheckoutSessionRequest,
    origin: &str,
    now: i64,
) -> SessionConfig {
    let mode = request.mode;
    let currency = request
        .currency
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let or_auto = |value: Option<String>| value.unwrap_or_else(|| "auto".to_string());

    let line_items = match mode {
        CheckoutMode::Subscription => vec![subscription_item(
            request.line_items.as_deref().and_then(<[LineItem]>::first),
            &currency,
            request.adjustable_quantity,
        )],
        _ => {
            let mut items = request
                .line_items
                .unwrap_or_else(|| vec![sample_item(&currency)]);
            if request.adjustable_quantity {
                for item in &mut items {
                    item.adjustable_quantity = Some(adjustable_quantity());
                }
            }
            items
        }
    };

    let submit_type = request
        .submit_type
        .filter(|t| mode == CheckoutMode::Payment && t != "auto");

    let expires_at = request
        .expires_in_minutes
        .filter(|minutes| *minutes > 0)
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(|secs| now.checked_add(secs));

    let shipping_address_collection = request.shipping_address_collection.map(|opts| {
        let allowed_countries = opts
            .allowed_countries
            .filter(|countries| !countries.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect());
        ShippingAddressCollection { allowed_countries }
    });

    let invoice_creation = (request.invoice_creation && mode == CheckoutMode::Payment).then(|| {
        InvoiceCreation {
            enabled: true,
            invoice_data: InvoiceData {
                description: "Invoice for your purchase".to_string(),
            },
        }
    });

    let after_expiration = request.recovery_enabled.then(|| AfterExpiration {
        recovery: Recovery {
            enabled: true,
            allow_promotion_codes: request.allow_promotion_codes,
        },
    });

    let subscription_data = match (mode, request.trial_period_days) {
        (CheckoutMode::Subscription, Some(days)) if days > 0 => Some(SubscriptionData {
            trial_period_days: u32::try_from(days).unwrap_or(u32::MAX),
        }),
        _ => None,
    };

    let return_url = format!("{origin}{RETURN_PATH}");
    let (success_url, cancel_url, return_url) = match request.ui_mode {
        UiMode::Hosted => (Some(return_url), Some(format!("{origin}{CANCEL_PATH}")), None),
        UiMode::Embedded | UiMode::Custom => (None, None, Some(return_url)),
    };

    SessionConfig {
        ui_mode: request.ui_mode,
        line_items,
        mode,
        phone_number_collection: Enabled {
            enabled: request.phone_number_collection,
        },
        allow_promotion_codes: request.allow_promotion_codes,
        billing_address_collection: or_auto(request.billing_address_collection),
        locale: or_auto(request.locale),
        customer_creation: (mode == CheckoutMode::Payment).then(|| {
            request
                .customer_creation
                .unwrap_or_else(|| "if_required".to_string())
        }),
        customer_email: request.customer_email.filter(|email| !email.is_empty()),
        tax_id_collection: request.tax_id_collection.then(Enabled::on),
        automatic_tax: request.automatic_tax.then(Enabled::on),
        submit_type,
        expires_at,
        payment_method_types: request.payment_method_types.filter(|t| !t.is_empty()),
        shipping_address_collection,
        shipping_options: non_empty(request.shipping_options),
        custom_fields: non_empty(request.custom_fields),
        consent_collection: present(request.consent_collection),
        custom_text: present(request.custom_text),
        discounts: non_empty(request.discounts),
        metadata: Some(request.metadata).filter(|m| !m.is_empty()),
        invoice_creation,
        after_expiration,
        subscription_data,
        saved_payment_method_options: present(request.saved_payment_method_options),
        success_url,
        cancel_url,
        return_url,
    }
}

fn non_empty(values: Vec<Value>) -> Option<Vec<Value>> {
    Some(values).filter(|v| !v.is_empty())
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn adjustable_quantity() -> AdjustableQuantity {
    AdjustableQuantity {
        enabled: true,
        minimum: Some(1),
        maximum: Some(10),
    }
}

fn sample_item(currency: &str) -> LineItem {
    LineItem {
        price_data: Some(PriceData {
            currency: Some(currency.to_string()),
            product_data: Some(ProductData {
                name: Some("Sample Product".to_string()),
                description: Some("A test product for checkout experimentation".to_string()),
                images: vec![SAMPLE_IMAGE.to_string()],
                ..Default::default()
            }),
            unit_amount: Some(2000),
            ..Default::default()
        }),
        quantity: Some(1),
        ..Default::default()
    }
}

/// Subscriptions always bill one monthly recurring price, seeded from the
/// first supplied item where it has usable values.
fn subscription_item(first: Option<&LineItem>, currency: &str, adjustable: bool) -> LineItem {
    let price_data = first.and_then(|item| item.price_data.as_ref());
    let name = price_data
        .and_then(|p| p.product_data.as_ref())
        .and_then(|p| p.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Monthly Subscription".to_string());
    let unit_amount = price_data
        .and_then(|p| p.unit_amount)
        .filter(|amount| *amount != 0)
        .unwrap_or(999);
    let quantity = first
        .and_then(|item| item.quantity)
        .filter(|quantity| *quantity != 0)
        .unwrap_or(1);

    LineItem {
        price_data: Some(PriceData {
            currency: Some(currency.to_string()),
            product_data: Some(ProductData {
                name: Some(name),
                description: Some("A recurring monthly subscription".to_string()),
                ..Default::default()
            }),
            unit_amount: Some(unit_amount),
            recurring: Some(Recurring {
                interval: "month".to_string(),
                interval_count: None,
            }),
            ..Default::default()
        }),
        quantity: Some(quantity),
        adjustable_quantity: adjustable.then(adjustable_quantity),
        ..Default::default()
    }
}
