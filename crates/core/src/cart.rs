use serde::{Deserialize, Serialize};

use crate::menu::format_price;

/// One ordered item, merged by pizza name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

impl CartLine {
    /// Wire tag consumed by the ordering client. Price carries exactly two
    /// decimal digits.
    pub fn tag(&self) -> String {
        format!(":::ADD:{}|{}:::", self.name, format_price(self.unit_price_cents))
    }
}

/// Explicit per-session cart backing the `:::ADD:...:::` tag convention.
///
/// The tag stays the external contract; this entity is the source of truth so
/// the tag can be emitted mechanically instead of trusting model output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit of `name`, merging with an existing line for the same
    /// pizza. Returns the line the item landed on.
    pub fn add(&mut self, name: &str, unit_price_cents: i64) -> &CartLine {
        if let Some(index) = self.lines.iter().position(|line| line.name == name) {
            self.lines[index].quantity += 1;
            return &self.lines[index];
        }
        self.lines.push(CartLine {
            name: name.to_string(),
            unit_price_cents,
            quantity: 1,
        });
        self.lines.last().expect("line just pushed")
    }

    pub fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| line.unit_price_cents.saturating_mul(i64::from(line.quantity)))
            .sum()
    }
}
