use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One pizza on the menu. Seeded once at startup, read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub ingredients: String,
    pub price_cents: i64,
}

impl MenuItem {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

/// Renders cents as a decimal string with exactly two fractional digits,
/// the format the cart tag and tool replies are committed to.
pub fn format_price(cents: i64) -> String {
    Decimal::new(cents, 2).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_price, MenuItem};

    #[test]
    fn price_renders_with_two_decimal_digits() {
        assert_eq!(format_price(4000), "40.00");
        assert_eq!(format_price(3550), "35.50");
        assert_eq!(format_price(5), "0.05");
    }

    #[test]
    fn menu_item_exposes_decimal_price() {
        let item = MenuItem {
            id: 1,
            name: "Calabresa".to_string(),
            ingredients: "Molho, queijo, calabresa e cebola".to_string(),
            price_cents: 4000,
        };
        assert_eq!(item.price().to_string(), "40.00");
    }
}
