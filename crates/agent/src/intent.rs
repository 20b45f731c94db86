//! Deterministic classification of the user's utterance.
//!
//! The cart must not depend on the model remembering to emit a tag, so order
//! and checkout intents are detected here with plain keyword matching against
//! the seeded menu names.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderIntent {
    /// The user asked to order; carries the menu names mentioned in the text.
    AddItems(Vec<String>),
    /// The user wants to close the order and pay.
    Checkout,
    /// Anything else (questions, small talk, payment-method answers).
    Other,
}

const ORDER_MARKERS: &[&str] = &[
    "quero",
    "vou querer",
    "me ve",
    "me vê",
    "adiciona",
    "pode mandar",
    "manda",
    "traz",
    "aceito",
];

const CHECKOUT_MARKERS: &[&str] = &["fechar", "pagar", "finalizar"];

#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Classifies `text` against the known menu `names`. Checkout wins over
    /// ordering when both markers appear in the same utterance.
    pub fn extract(&self, text: &str, names: &[String]) -> OrderIntent {
        let normalized = normalize(text);

        if CHECKOUT_MARKERS.iter().any(|marker| normalized.contains(marker)) {
            return OrderIntent::Checkout;
        }

        let wants_to_order = ORDER_MARKERS.iter().any(|marker| normalized.contains(marker));
        if !wants_to_order {
            return OrderIntent::Other;
        }

        let mentioned: Vec<String> = names
            .iter()
            .filter(|name| normalized.contains(&normalize(name)))
            .cloned()
            .collect();

        if mentioned.is_empty() {
            OrderIntent::Other
        } else {
            OrderIntent::AddItems(mentioned)
        }
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{IntentExtractor, OrderIntent};

    fn menu_names() -> Vec<String> {
        ["Calabresa", "Mussarela", "Portuguesa", "Quatro Queijos", "Frango com Catupiry", "Marguerita", "Pepperoni"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn order_request_with_menu_name_adds_item() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("quero uma calabresa", &menu_names());
        assert_eq!(intent, OrderIntent::AddItems(vec!["Calabresa".to_string()]));
    }

    #[test]
    fn order_request_collects_every_mentioned_pizza() {
        let extractor = IntentExtractor::new();
        let intent =
            extractor.extract("manda uma calabresa e uma mussarela", &menu_names());
        assert_eq!(
            intent,
            OrderIntent::AddItems(vec!["Calabresa".to_string(), "Mussarela".to_string()])
        );
    }

    #[test]
    fn price_question_is_not_an_order() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("quanto custa a calabresa?", &menu_names());
        assert_eq!(intent, OrderIntent::Other);
    }

    #[test]
    fn checkout_phrases_classify_as_checkout() {
        let extractor = IntentExtractor::new();
        assert_eq!(extractor.extract("fechar", &menu_names()), OrderIntent::Checkout);
        assert_eq!(extractor.extract("quero pagar agora", &menu_names()), OrderIntent::Checkout);
        assert_eq!(
            extractor.extract("pode finalizar o pedido", &menu_names()),
            OrderIntent::Checkout
        );
    }

    #[test]
    fn checkout_wins_over_order_marker() {
        let extractor = IntentExtractor::new();
        assert_eq!(
            extractor.extract("quero fechar a conta", &menu_names()),
            OrderIntent::Checkout
        );
    }

    #[test]
    fn order_verb_without_known_pizza_is_other() {
        let extractor = IntentExtractor::new();
        assert_eq!(extractor.extract("quero uma pizza havaiana", &menu_names()), OrderIntent::Other);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("QUERO UMA CALABRESA", &menu_names());
        assert_eq!(intent, OrderIntent::AddItems(vec!["Calabresa".to_string()]));
    }
}
