use ltop::ui::input::{decode, Key};

#[test]
fn test_navigation_burst() {
    // A held-down arrow key delivers several sequences in one read.
    let keys = decode(b"\x1B[B\x1B[B\x1B[B\x1B[A");
    assert_eq!(keys, vec![Key::Down, Key::Down, Key::Down, Key::Up]);
}

#[test]
fn test_search_session() {
    let mut keys = decode(b"/");
    keys.extend(decode(b"fire"));
    keys.extend(decode(b"\r"));
    assert_eq!(keys[0], Key::Char('/'));
    assert_eq!(keys[1..5], [
        Key::Char('f'),
        Key::Char('i'),
        Key::Char('r'),
        Key::Char('e')
    ]);
    assert_eq!(keys[5], Key::Enter);
}

#[test]
fn test_ctrl_c_inside_burst() {
    let keys = decode(b"jj\x03kk");
    assert!(keys.contains(&Key::Quit));
}

#[test]
fn test_function_keys_ignored() {
    // F5 and Delete arrive as longer CSI sequences; their lead bytes
    // must not be misread as Escape plus text.
    assert!(!decode(b"\x1B[15~").contains(&Key::Char('1')));
    assert!(!decode(b"\x1B[3~").contains(&Key::Char('3')));
}
