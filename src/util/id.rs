//! Room-code generation.

use rand::Rng;

/// Characters allowed in a room code. Uppercase so codes read well when
/// shared out loud or typed on a phone.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const CODE_LEN: usize = 6;

/// Generate a short shareable room code (e.g. `AB12CD`).
///
/// 36^6 codes; uniqueness against live rooms is enforced by the caller
/// (the manager retries on collision).
pub fn new_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_uppercase_and_fixed_length() {
        for _ in 0..100 {
            let code = new_room_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
