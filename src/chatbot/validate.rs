//! Input normalization and answer validation.
//!
//! Validators never fail loudly: an invalid answer is a value the engine
//! branches on to re-prompt the same step.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// `DD-MM-YYYY` or `DD/MM/YYYY`, same separator on both sides.
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}([-/])\d{1,2}([-/])\d{4}$").unwrap());

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const RELATIONSHIPS: [&str; 8] = [
    "madre", "padre", "esposo", "esposa", "hijo", "hija", "hermano", "hermana",
];

/// Case-fold and trim free text or a button payload before matching.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Parse a birth date typed by the user. `None` means "re-prompt".
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    let caps = DATE_SHAPE.captures(input)?;
    if caps[1] != caps[2] {
        return None;
    }
    let format = if &caps[1] == "-" { "%d-%m-%Y" } else { "%d/%m/%Y" };
    NaiveDate::parse_from_str(input, format).ok()
}

/// Render an accepted date as `YYYY-MM-DD` for the quoting service.
pub fn to_sql_date(input: &str) -> Option<String> {
    parse_date(input).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Structural `local@domain.tld` check. Exotic addresses may be rejected.
pub fn is_valid_email(input: &str) -> bool {
    EMAIL_SHAPE.is_match(input.trim())
}

pub fn is_valid_relationship(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    RELATIONSHIPS.contains(&input.as_str())
}

/// Upper-case the first letter of every word, lower-case the rest.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_separators_normalize_identically() {
        assert_eq!(to_sql_date("25-12-2024").as_deref(), Some("2024-12-25"));
        assert_eq!(to_sql_date("25/12/2024").as_deref(), Some("2024-12-25"));
        assert_eq!(parse_date("25-12-2024"), parse_date("25/12/2024"));
    }

    #[test]
    fn test_rejects_sql_order() {
        assert_eq!(parse_date("2024-12-25"), None);
    }

    #[test]
    fn test_rejects_impossible_calendar_dates() {
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("29-02-2023"), None);
        assert!(parse_date("29-02-2024").is_some());
    }

    #[test]
    fn test_rejects_malformed_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("hoy"), None);
        assert_eq!(parse_date("25-12/2024"), None);
        assert_eq!(parse_date("25/12/24"), None);
        assert_eq!(parse_date("25.12.2024"), None);
    }

    #[test]
    fn test_accepts_unpadded_dates() {
        assert_eq!(to_sql_date("5/3/1980").as_deref(), Some("1980-03-05"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ana@correo.com"));
        assert!(is_valid_email("  ana.perez+seguros@mail.example.co "));
        assert!(!is_valid_email("ana@correo"));
        assert!(!is_valid_email("anacorreo.com"));
        assert!(!is_valid_email("ana@@correo.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_relationships_are_case_insensitive() {
        assert!(is_valid_relationship("Madre"));
        assert!(is_valid_relationship(" HERMANA "));
        assert!(!is_valid_relationship("primo"));
        assert!(!is_valid_relationship(""));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hola \n"), "hola");
        assert_eq!(normalize("Soporte al Cliente"), "soporte al cliente");
        assert_eq!(normalize("MÉTODOS Pago"), "métodos pago");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("juan pérez"), "Juan Pérez");
        assert_eq!(title_case("MARÍA de los ángeles"), "María De Los Ángeles");
        assert_eq!(title_case("o'neil"), "O'Neil");
    }
}
