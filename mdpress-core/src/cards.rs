//! Out-of-band storage for HTML that must come through the pipeline byte-for-byte
//!
//! Extensions render a `<section data-id="ID">` placeholder and hand the real payload to the
//! [`CardDataManager`]. After every DOM stage has run, [`CardDataManager::restore_card`] swaps
//! each placeholder for its payload with a plain text replace, so the payload never goes
//! through an HTML parser.

use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use tracing::{debug, error};

#[derive(Debug, Default)]
pub struct CardDataManager {
    cards: BTreeMap<String, String>,
}

impl CardDataManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_card_data(&mut self, id: &str, payload: &str) {
        debug!(id, "storing card payload");
        self.cards.insert(id.to_string(), payload.to_string());
    }

    pub fn card(&self, id: &str) -> Option<&str> {
        self.cards.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Replace every stored card's placeholder section with its payload
    ///
    /// A card whose placeholder is missing is logged and skipped; the html is left as is.
    pub fn restore_card(&self, html: &str) -> String {
        let mut output = html.to_string();
        for (id, payload) in &self.cards {
            let pattern = format!(
                r#"(?s)<section[^>]*?data-id="{}"[^>]*>.*?</section>"#,
                regex::escape(id)
            );
            let re = match Regex::new(&pattern) {
                Ok(re) => re,
                Err(err) => {
                    error!(id = id.as_str(), %err, "invalid card placeholder pattern");
                    continue;
                }
            };
            if !re.is_match(&output) {
                error!(id = id.as_str(), "card placeholder not found");
                continue;
            }
            output = re.replace(&output, NoExpand(payload)).into_owned();
        }
        output
    }

    /// Forget all cards; called when switching documents
    pub fn cleanup(&mut self) {
        self.cards.clear();
    }
}
