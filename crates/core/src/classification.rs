//! Source constants and keyword classification of regulation titles.

/// Issuing entity of every listing scraped from the source site.
pub const ENTITY_NAME: &str = "Agencia Nacional de Infraestructura";

/// Classification assigned to every scraped regulation.
pub const FIXED_CLASSIFICATION_ID: i32 = 13;

/// Regulation type used when no title keyword matches (decree).
pub const DEFAULT_RTYPE_ID: i32 = 14;

/// Component every loaded regulation is associated with.
pub const DEFAULT_COMPONENT_ID: i32 = 7;

/// Lower-case title keywords and the regulation type they imply.
/// Checked in order; the first match wins.
pub const RTYPE_KEYWORDS: &[(&str, i32)] = &[
    ("resolución", 15),
    ("resolucion", 15),
    ("decreto", 14),
];

/// Infer the regulation type from keywords in the title.
pub fn rtype_for_title(title: &str) -> i32 {
    let lower = title.to_lowercase();
    RTYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(DEFAULT_RTYPE_ID, |&(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_titles_map_to_15() {
        assert_eq!(rtype_for_title("Resolución 123 de 2024"), 15);
        assert_eq!(rtype_for_title("RESOLUCION 20243030001"), 15);
    }

    #[test]
    fn decree_and_unknown_titles_map_to_default() {
        assert_eq!(rtype_for_title("Decreto 1079"), 14);
        assert_eq!(rtype_for_title("Circular 5"), DEFAULT_RTYPE_ID);
    }
}
