//! User-visible reply texts

use crate::error::BotError;

pub const GENERIC_FAILURE: &str =
    "Nešto je puklo prilikom izvođenja naredbe. Molimo pokušajte ponovo.";

pub const TOKEN_SENT: &str =
    "Kod ti je poslan na email. Dobiveni kod predaj pomoću `/predaj-kod` naredbe!";

pub const REDEEM_SUCCESS: &str = "Kod uspješno predan! Dodijeljene su ti relevantne uloge.";

pub const EMAIL_NOT_FOUND: &str =
    "Email nije pronađen u popisu članova. Pokušaj ponovno ili se javi svojem šefu za pomoć.";

pub const NOT_REGISTERED: &str =
    "Nisi registriran na serveru. Prvo se registriraj pomoću `/prijavi-se` naredbe.";

pub const NOT_IN_ROSTER: &str =
    "Tvoj OIB nije pronađen u popisu članova. Javi se svojem šefu za pomoć.";

pub const INVALID_TOKEN: &str = "Predan kod nije ispravan. Pokušaj ponovno.";

pub const NAME_FAILURE: &str =
    "Došlo je do greške prilikom postavljanja imena. Javi se svojem šefu za pomoć.";

pub const ROLES_FAILURE: &str =
    "Došlo je do greške prilikom dodjele uloga. Javi se svojem šefu za pomoć.";

/// Localized reply for an expected denial outcome. The invalid-token text
/// covers wrong, used, and foreign tokens alike so nothing leaks about
/// which check failed.
pub fn denial(error: &BotError) -> &'static str {
    match error {
        BotError::EmailNotInRoster => EMAIL_NOT_FOUND,
        BotError::NotRegistered => NOT_REGISTERED,
        BotError::NotInRoster => NOT_IN_ROSTER,
        BotError::InvalidToken => INVALID_TOKEN,
        _ => GENERIC_FAILURE,
    }
}
