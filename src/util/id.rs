//! ID utilities (room ids).

use rand::Rng;

const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ROOM_ID_LEN: usize = 6;

/// Generate a short room ID: 6 lowercase base36 characters.
///
/// Not globally unique; the registry retries on the rare collision.
pub fn new_room_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_ids_are_short_base36() {
        for _ in 0..100 {
            let id = new_room_id();
            assert_eq!(id.len(), 6);
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }
}
