//! EAN lookup for the barcode search.
//!
//! The site has no barcode search of its own, so a handful of known codes are
//! mapped to product names and everything else is searched as typed.

const EAN_PRODUCTS: &[(&str, &str)] = &[
    ("8594001000108", "Tatranka čokoládová"),
    ("8594001000207", "Tatranka oříšková"),
    ("8594001000306", "Tatranka kokosová"),
    ("8594001000405", "Tatranka lískooříšková"),
];

/// Product name registered for an EAN code, if any.
pub fn product_name(barcode: &str) -> Option<&'static str> {
    let barcode = barcode.trim();
    EAN_PRODUCTS
        .iter()
        .find(|(code, _)| *code == barcode)
        .map(|(_, name)| *name)
}

/// Query to run through the search relay for a scanned barcode.
pub fn search_term_for(barcode: &str) -> String {
    product_name(barcode)
        .map(str::to_string)
        .unwrap_or_else(|| barcode.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_maps_to_name() {
        assert_eq!(search_term_for("8594001000207"), "Tatranka oříšková");
        assert_eq!(product_name(" 8594001000405 "), Some("Tatranka lískooříšková"));
    }

    #[test]
    fn test_unknown_code_is_searched_verbatim() {
        assert_eq!(product_name("4001234567890"), None);
        assert_eq!(search_term_for("4001234567890"), "4001234567890");
    }
}
