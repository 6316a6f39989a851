//! Byte-level decoder for raw-mode stdin.
//!
//! Raw mode delivers keys as bytes, with arrows arriving as three-byte
//! CSI sequences. The decoder is a pure function over one read chunk so
//! it can be tested without a terminal.

/// One decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Enter,
    Esc,
    Char(char),
}

/// Decode every key in one chunk of raw input.
///
/// Unknown escape sequences are discarded rather than leaking their
/// bytes as characters: `ESC [ x` (CSI) and `ESC O x` (SS3, arrows in
/// application cursor mode) consume three bytes, and ESC followed by
/// any other byte drops both (Alt-chords are not commands here). Only
/// a lone ESC at the end of the chunk is a real Escape press.
pub fn decode(bytes: &[u8]) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            // Ctrl-C, honored even mid-sequence.
            0x03 => {
                keys.push(Key::Quit);
                i += 1;
            }
            0x1B => match bytes.get(i + 1) {
                Some(b'[') | Some(b'O') => {
                    match bytes.get(i + 2) {
                        Some(b'A') => keys.push(Key::Up),
                        Some(b'B') => keys.push(Key::Down),
                        Some(b'C') => keys.push(Key::Right),
                        Some(b'D') => keys.push(Key::Left),
                        _ => {}
                    }
                    i += 3;
                }
                Some(_) => {
                    i += 2;
                }
                None => {
                    keys.push(Key::Esc);
                    i += 1;
                }
            },
            0x7F | 0x08 => {
                keys.push(Key::Backspace);
                i += 1;
            }
            b'\n' | b'\r' => {
                keys.push(Key::Enter);
                i += 1;
            }
            0x20..=0x7E => {
                keys.push(Key::Char(b as char));
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }
    keys
}
