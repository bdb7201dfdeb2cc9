//! Verification token generation

use rand::Rng;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Generate a single-use verification token of the form `abcdefg-1234567`:
/// seven random lowercase letters, a hyphen, seven random digits.
///
/// Collisions are not checked; at expected volumes the space is large
/// enough that a duplicate unconsumed token is harmless anyway (either
/// copy validates for its own user only).
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();

    let mut token = String::with_capacity(15);
    for _ in 0..7 {
        token.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
    }
    token.push('-');
    for _ in 0..7 {
        token.push(DIGITS[rng.gen_range(0..DIGITS.len())] as char);
    }

    token
}
