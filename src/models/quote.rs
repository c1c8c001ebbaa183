use failure::Error as FailureError;

use super::DeliveryDecision;
use errors::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub delivery_zone: String,
    pub estimated_delivery_minutes: Option<u32>,
}

/// Prices an order against a delivery decision. Orders are never quoted
/// for addresses outside the delivery area.
pub fn quote_order(subtotal: f64, decision: &DeliveryDecision) -> Result<OrderQuote, FailureError> {
    if !subtotal.is_finite() || subtotal < 0.0 {
        return Err(format_err!("Order subtotal {} is not a valid amount", subtotal)
            .context(Error::InvalidOrder)
            .into());
    }
    let fee = match (decision.in_delivery_area, decision.delivery_fee) {
        (true, Some(fee)) => fee,
        _ => {
            return Err(format_err!("Cannot create order: {}", decision.reason)
                .context(Error::NotDeliverable)
                .into())
        }
    };
    Ok(OrderQuote {
        subtotal: round_pence(subtotal),
        delivery_fee: round_pence(fee),
        total: round_pence(subtotal + fee),
        delivery_zone: decision.zone_name.clone(),
        estimated_delivery_minutes: decision.max_distance_minutes,
    })
}

fn round_pence(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::error_kind;
    use models::{DeliveryDecision, STANDARD_ZONE_NAME};

    #[test]
    fn total_adds_fee() {
        let decision = DeliveryDecision::deliverable(STANDARD_ZONE_NAME, 3.0, Some(15), Some(12), "12 min drive".to_string());
        let quote = quote_order(24.5, &decision).unwrap();
        assert_eq!(quote.total, 27.5);
        assert_eq!(quote.delivery_zone, STANDARD_ZONE_NAME);
        assert_eq!(quote.estimated_delivery_minutes, Some(15));
    }

    #[test]
    fn total_is_rounded_to_pence() {
        let decision = DeliveryDecision::deliverable(STANDARD_ZONE_NAME, 3.0, Some(15), Some(12), String::new());
        assert_eq!(quote_order(0.1 + 0.2, &decision).unwrap().total, 3.3);
    }

    #[test]
    fn outside_area_is_refused() {
        let decision = DeliveryDecision::outside(Some(40), "40 min drive".to_string());
        let err = quote_order(20.0, &decision).unwrap_err();
        assert_eq!(error_kind(&err), Some(Error::NotDeliverable));
        assert!(quote_order(20.0, &DeliveryDecision::zones_not_configured()).is_err());
    }

    #[test]
    fn bad_subtotal_is_refused() {
        let decision = DeliveryDecision::deliverable(STANDARD_ZONE_NAME, 3.0, Some(15), Some(12), String::new());
        assert_eq!(error_kind(&quote_order(-1.0, &decision).unwrap_err()), Some(Error::InvalidOrder));
    }
}
