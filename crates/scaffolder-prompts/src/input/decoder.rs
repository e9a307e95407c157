//! Byte stream decoder for terminal input
//!
//! Turns raw stdin chunks into [`InputEvent`]s:
//! - Printable ASCII and UTF-8 characters
//! - Control bytes (Enter, Tab, Backspace, Ctrl+letter)
//! - CSI sequences (arrows, Home/End, PageUp/Down, Insert/Delete, F-keys, modifiers)
//! - SS3 sequences (arrows and F1-F4 in application mode)
//! - SGR mouse reports (`ESC [ < b ; x ; y M|m`)
//! - Alt+key (ESC followed by a printable byte)
//!
//! The decoder keeps unterminated sequences buffered across `feed` calls, so a
//! sequence split over two reads decodes exactly once. A lone ESC can't be told
//! apart from the start of a sequence by looking at bytes alone: the caller
//! invokes [`Decoder::flush`] once its escape timeout expires with no new input.

use super::event::{
    InputEvent, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};

const ESC: u8 = 0x1B;

/// Sequences longer than this without a terminator are treated as garbage
const MAX_SEQUENCE_LEN: usize = 64;

/// Outcome of decoding from the front of the buffer
#[derive(Debug, PartialEq)]
enum Decoded {
    /// An event and the number of bytes it consumed
    Event(InputEvent, usize),
    /// Unknown or malformed input of this many bytes, dropped
    Discard(usize),
    /// Need more bytes
    Incomplete,
}

/// Stateful input decoder
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_SEQUENCE_LEN),
        }
    }

    /// Feed a chunk and return every event that is complete so far
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<InputEvent> {
        self.buf.extend_from_slice(bytes);
        self.drain()
    }

    /// Whether bytes are buffered waiting for a continuation
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve buffered bytes after the escape timeout elapsed.
    ///
    /// A buffered ESC becomes a standalone Escape key; whatever follows it is
    /// decoded on its own. Other incomplete input (a truncated UTF-8 character)
    /// is dropped.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        let mut events = self.drain();
        while !self.buf.is_empty() {
            if self.buf[0] == ESC {
                self.buf.remove(0);
                events.push(key_event(Key::Escape, Modifiers::empty(), &[ESC]));
            } else {
                tracing::trace!(bytes = ?self.buf, "dropping incomplete input");
                self.buf.clear();
            }
            events.extend(self.drain());
        }
        events
    }

    fn drain(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while !self.buf.is_empty() {
            match decode_one(&self.buf) {
                Decoded::Event(event, consumed) => {
                    events.push(event);
                    self.buf.drain(..consumed);
                }
                Decoded::Discard(consumed) => {
                    tracing::trace!(
                        bytes = ?&self.buf[..consumed],
                        "discarding unrecognized input"
                    );
                    self.buf.drain(..consumed);
                }
                Decoded::Incomplete => break,
            }
        }
        events
    }
}

fn key_event(key: Key, modifiers: Modifiers, raw: &[u8]) -> InputEvent {
    InputEvent::Key(KeyEvent::new(key, modifiers).with_raw(raw))
}

fn emit(key: Key, modifiers: Modifiers, buf: &[u8], len: usize) -> Decoded {
    Decoded::Event(key_event(key, modifiers, &buf[..len]), len)
}

fn decode_one(buf: &[u8]) -> Decoded {
    let first = buf[0];
    match first {
        ESC => decode_escape(buf),
        b'\r' | b'\n' => emit(Key::Enter, Modifiers::empty(), buf, 1),
        b'\t' => emit(Key::Tab, Modifiers::empty(), buf, 1),
        0x08 | 0x7F => emit(Key::Backspace, Modifiers::empty(), buf, 1),
        b' ' => emit(Key::Space, Modifiers::empty(), buf, 1),
        0x00 => emit(Key::Space, Modifiers::CTRL, buf, 1),
        0x01..=0x1A => {
            let c = (first - 1 + b'a') as char;
            emit(Key::Char(c), Modifiers::CTRL, buf, 1)
        }
        0x1C..=0x1F => emit(Key::Char((first + 0x40) as char), Modifiers::CTRL, buf, 1),
        0x21..=0x7E => emit(Key::Char(first as char), Modifiers::empty(), buf, 1),
        0x80..=0xFF => decode_utf8(buf),
    }
}

fn decode_utf8(buf: &[u8]) -> Decoded {
    let len = match buf[0] {
        b if b & 0xE0 == 0xC0 => 2,
        b if b & 0xF0 == 0xE0 => 3,
        b if b & 0xF8 == 0xF0 => 4,
        _ => return Decoded::Discard(1),
    };
    if buf.len() < len {
        return Decoded::Incomplete;
    }
    match std::str::from_utf8(&buf[..len])
        .ok()
        .and_then(|s| s.chars().next())
    {
        Some(c) => emit(Key::Char(c), Modifiers::empty(), buf, len),
        None => Decoded::Discard(1),
    }
}

fn decode_escape(buf: &[u8]) -> Decoded {
    if buf.len() < 2 {
        return Decoded::Incomplete;
    }
    match buf[1] {
        b'[' => decode_csi(buf),
        b'O' => decode_ss3(buf),
        ESC => emit(Key::Escape, Modifiers::empty(), buf, 1),
        0x7F => emit(Key::Backspace, Modifiers::ALT, buf, 2),
        b' ' => emit(Key::Space, Modifiers::ALT, buf, 2),
        c @ 0x21..=0x7E => emit(Key::Char(c as char), Modifiers::ALT, buf, 2),
        // ESC followed by something that can't continue a sequence: bare Escape
        _ => emit(Key::Escape, Modifiers::empty(), buf, 1),
    }
}

fn decode_ss3(buf: &[u8]) -> Decoded {
    if buf.len() < 3 {
        return Decoded::Incomplete;
    }
    let key = match buf[2] {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        b'M' => Key::Enter,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        _ => return Decoded::Discard(3),
    };
    emit(key, Modifiers::empty(), buf, 3)
}

fn decode_csi(buf: &[u8]) -> Decoded {
    if buf.len() < 3 {
        return Decoded::Incomplete;
    }
    if buf[2] == b'<' {
        return decode_sgr_mouse(buf);
    }

    // Parameter and intermediate bytes are 0x20..=0x3F, the final byte 0x40..=0x7E
    let mut end = 2;
    loop {
        if end >= buf.len() {
            return if buf.len() > MAX_SEQUENCE_LEN {
                Decoded::Discard(buf.len())
            } else {
                Decoded::Incomplete
            };
        }
        match buf[end] {
            0x20..=0x3F => end += 1,
            0x40..=0x7E => break,
            // Broken sequence: drop the prefix, decode the rest normally
            _ => return Decoded::Discard(end),
        }
    }
    let consumed = end + 1;
    let final_byte = buf[end];

    // Legacy X10 mouse report carries three raw payload bytes
    if final_byte == b'M' && end == 2 {
        return if buf.len() < 6 {
            Decoded::Incomplete
        } else {
            Decoded::Discard(6)
        };
    }

    let Some(params) = parse_params(&buf[2..end]) else {
        return Decoded::Discard(consumed);
    };
    let modifiers = params
        .get(1)
        .copied()
        .map(decode_modifiers)
        .unwrap_or_default();

    let key = match final_byte {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        b'Z' => return emit(Key::BackTab, Modifiers::SHIFT, buf, consumed),
        b'~' => match params.first().copied().unwrap_or(0) {
            1 | 7 => Key::Home,
            2 => Key::Insert,
            3 => Key::Delete,
            4 | 8 => Key::End,
            5 => Key::PageUp,
            6 => Key::PageDown,
            11 => Key::F(1),
            12 => Key::F(2),
            13 => Key::F(3),
            14 => Key::F(4),
            15 => Key::F(5),
            17 => Key::F(6),
            18 => Key::F(7),
            19 => Key::F(8),
            20 => Key::F(9),
            21 => Key::F(10),
            23 => Key::F(11),
            24 => Key::F(12),
            _ => return Decoded::Discard(consumed),
        },
        _ => return Decoded::Discard(consumed),
    };
    emit(key, modifiers, buf, consumed)
}

/// Parse `;`-separated decimal parameters. Empty fields count as 0.
fn parse_params(bytes: &[u8]) -> Option<Vec<u32>> {
    if bytes.is_empty() {
        return Some(Vec::new());
    }
    std::str::from_utf8(bytes)
        .ok()?
        .split(';')
        .map(|field| {
            if field.is_empty() {
                Some(0)
            } else {
                field.parse::<u32>().ok()
            }
        })
        .collect()
}

/// CSI modifier parameter is 1 + bitmask (shift=1, alt=2, ctrl=4)
fn decode_modifiers(param: u32) -> Modifiers {
    let bits = param.saturating_sub(1);
    let mut modifiers = Modifiers::empty();
    if bits & 1 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        modifiers |= Modifiers::CTRL;
    }
    modifiers
}

// SGR button code bits
const SGR_SHIFT: u32 = 4;
const SGR_ALT: u32 = 8;
const SGR_CTRL: u32 = 16;
const SGR_MOTION: u32 = 32;
const SGR_WHEEL: u32 = 64;

fn decode_sgr_mouse(buf: &[u8]) -> Decoded {
    let mut end = 3;
    loop {
        if end >= buf.len() {
            return if buf.len() > MAX_SEQUENCE_LEN {
                Decoded::Discard(buf.len())
            } else {
                Decoded::Incomplete
            };
        }
        match buf[end] {
            b'0'..=b'9' | b';' => end += 1,
            b'M' | b'm' => break,
            _ => return Decoded::Discard(end),
        }
    }
    let consumed = end + 1;
    let release = buf[end] == b'm';

    let params = match parse_params(&buf[3..end]) {
        Some(params) if params.len() == 3 => params,
        _ => return Decoded::Discard(consumed),
    };
    let (code, x, y) = (params[0], params[1], params[2]);
    if x == 0 || y == 0 {
        return Decoded::Discard(consumed);
    }

    let mut modifiers = Modifiers::empty();
    if code & SGR_SHIFT != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if code & SGR_ALT != 0 {
        modifiers |= Modifiers::ALT;
    }
    if code & SGR_CTRL != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let low = code & 0b11;
    let (kind, button) = if code & SGR_WHEEL != 0 {
        match low {
            0 => (MouseEventKind::ScrollUp, MouseButton::None),
            1 => (MouseEventKind::ScrollDown, MouseButton::None),
            // horizontal wheel
            _ => return Decoded::Discard(consumed),
        }
    } else {
        let button = match low {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        };
        let kind = if code & SGR_MOTION != 0 {
            MouseEventKind::Move
        } else if release {
            MouseEventKind::Release
        } else {
            MouseEventKind::Press
        };
        (kind, button)
    };

    let event = MouseEvent {
        kind,
        button,
        x,
        y,
        modifiers,
    };
    Decoded::Event(InputEvent::Mouse(event), consumed)
}

/// Encode a mouse event the way an SGR-capable terminal reports it
pub fn encode_sgr(event: &MouseEvent) -> String {
    let button = match event.button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::None => 3,
    };
    let (mut code, suffix) = match event.kind {
        MouseEventKind::Press => (button, 'M'),
        MouseEventKind::Release => (button, 'm'),
        MouseEventKind::Move => (button | SGR_MOTION, 'M'),
        MouseEventKind::ScrollUp => (SGR_WHEEL, 'M'),
        MouseEventKind::ScrollDown => (SGR_WHEEL | 1, 'M'),
    };
    if event.modifiers.contains(Modifiers::SHIFT) {
        code |= SGR_SHIFT;
    }
    if event.modifiers.contains(Modifiers::ALT) {
        code |= SGR_ALT;
    }
    if event.modifiers.contains(Modifiers::CTRL) {
        code |= SGR_CTRL;
    }
    format!("\x1b[<{};{};{}{}", code, event.x, event.y, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<InputEvent> {
        Decoder::new().feed(bytes)
    }

    fn keys(events: &[InputEvent]) -> Vec<(Key, Modifiers)> {
        events
            .iter()
            .filter_map(|e| match e {
                InputEvent::Key(k) => Some((k.key, k.modifiers)),
                InputEvent::Mouse(_) => None,
            })
            .collect()
    }

    fn plain(key: Key) -> (Key, Modifiers) {
        (key, Modifiers::empty())
    }

    fn mouse(kind: MouseEventKind, button: MouseButton, x: u32, y: u32) -> InputEvent {
        InputEvent::Mouse(MouseEvent::new(kind, button, x, y))
    }

    #[test]
    fn test_printable_and_named_keys() {
        let events = decode(b"ab \r\t\x7f");
        assert_eq!(
            keys(&events),
            vec![
                plain(Key::Char('a')),
                plain(Key::Char('b')),
                plain(Key::Space),
                plain(Key::Enter),
                plain(Key::Tab),
                plain(Key::Backspace),
            ]
        );
    }

    #[test]
    fn test_raw_bytes_are_kept() {
        let events = decode(b"\x1b[A");
        match &events[0] {
            InputEvent::Key(k) => assert_eq!(k.raw, b"\x1b[A".to_vec()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ctrl_letters() {
        assert_eq!(keys(&decode(b"\x03")), vec![(Key::Char('c'), Modifiers::CTRL)]);
        assert_eq!(keys(&decode(b"\x15")), vec![(Key::Char('u'), Modifiers::CTRL)]);
    }

    #[test]
    fn test_utf8_characters() {
        assert_eq!(
            keys(&decode("é✓".as_bytes())),
            vec![plain(Key::Char('é')), plain(Key::Char('✓'))]
        );
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let bytes = "✓".as_bytes();
        let mut decoder = Decoder::new();
        assert!(decoder.feed(&bytes[..1]).is_empty());
        assert!(decoder.has_pending());
        assert_eq!(keys(&decoder.feed(&bytes[1..])), vec![plain(Key::Char('✓'))]);
    }

    #[test]
    fn test_navigation_sequences() {
        let events =
            decode(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1b[H\x1b[F\x1b[5~\x1b[6~\x1b[3~\x1bOP\x1b[15~");
        assert_eq!(
            keys(&events),
            vec![
                plain(Key::Up),
                plain(Key::Down),
                plain(Key::Right),
                plain(Key::Left),
                plain(Key::Home),
                plain(Key::End),
                plain(Key::PageUp),
                plain(Key::PageDown),
                plain(Key::Delete),
                plain(Key::F(1)),
                plain(Key::F(5)),
            ]
        );
    }

    #[test]
    fn test_csi_modifiers() {
        assert_eq!(keys(&decode(b"\x1b[1;5A")), vec![(Key::Up, Modifiers::CTRL)]);
        assert_eq!(keys(&decode(b"\x1b[1;2D")), vec![(Key::Left, Modifiers::SHIFT)]);
        assert_eq!(keys(&decode(b"\x1b[Z")), vec![(Key::BackTab, Modifiers::SHIFT)]);
    }

    #[test]
    fn test_alt_char() {
        assert_eq!(keys(&decode(b"\x1bx")), vec![(Key::Char('x'), Modifiers::ALT)]);
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut decoder = Decoder::new();
        assert!(decoder.feed(b"\x1b").is_empty());
        assert!(decoder.feed(b"[").is_empty());
        assert!(decoder.feed(b"1;5").is_empty());
        assert_eq!(
            keys(&decoder.feed(b"Bz")),
            vec![(Key::Down, Modifiers::CTRL), plain(Key::Char('z'))]
        );
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_lone_escape_waits_for_flush() {
        let mut decoder = Decoder::new();
        assert!(decoder.feed(b"\x1b").is_empty());
        assert!(decoder.has_pending());
        assert_eq!(keys(&decoder.flush()), vec![plain(Key::Escape)]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_flush_incomplete_csi() {
        let mut decoder = Decoder::new();
        assert!(decoder.feed(b"\x1b[").is_empty());
        assert_eq!(keys(&decoder.flush()), vec![plain(Key::Escape), plain(Key::Char('['))]);
    }

    #[test]
    fn test_double_escape() {
        let mut decoder = Decoder::new();
        let first = decoder.feed(b"\x1b\x1b");
        assert_eq!(keys(&first), vec![plain(Key::Escape)]);
        assert_eq!(keys(&decoder.flush()), vec![plain(Key::Escape)]);
    }

    #[test]
    fn test_unknown_sequences_are_skipped() {
        let events = decode(b"\x1b[99~a\x1b[?25xb\x1bO~c");
        assert_eq!(
            keys(&events),
            vec![plain(Key::Char('a')), plain(Key::Char('b')), plain(Key::Char('c'))]
        );
    }

    #[test]
    fn test_broken_sequence_keeps_following_bytes() {
        // A control byte interrupts the CSI: the prefix is dropped, Enter survives
        let events = decode(b"\x1b[1\r");
        assert_eq!(keys(&events), vec![plain(Key::Enter)]);
    }

    #[test]
    fn test_overlong_sequence_is_dropped() {
        let mut bytes = b"\x1b[".to_vec();
        bytes.extend(std::iter::repeat(b'1').take(MAX_SEQUENCE_LEN + 1));
        let mut decoder = Decoder::new();
        assert!(decoder.feed(&bytes).is_empty());
        assert!(!decoder.has_pending());
        assert_eq!(keys(&decoder.feed(b"q")), vec![plain(Key::Char('q'))]);
    }

    #[test]
    fn test_sgr_mouse_press_and_release() {
        let events = decode(b"\x1b[<0;10;20M\x1b[<2;3;4m");
        assert_eq!(
            events,
            vec![
                mouse(MouseEventKind::Press, MouseButton::Left, 10, 20),
                mouse(MouseEventKind::Release, MouseButton::Right, 3, 4),
            ]
        );
    }

    #[test]
    fn test_sgr_mouse_large_coordinates() {
        let events = decode(b"\x1b[<1;1200;480M");
        assert_eq!(
            events,
            vec![mouse(MouseEventKind::Press, MouseButton::Middle, 1200, 480)]
        );
    }

    #[test]
    fn test_sgr_mouse_motion_and_modifiers() {
        let events = decode(b"\x1b[<35;5;6M\x1b[<20;1;1M");
        let mut ctrl_shift = MouseEvent::new(MouseEventKind::Press, MouseButton::Left, 1, 1);
        ctrl_shift.modifiers = Modifiers::CTRL | Modifiers::SHIFT;
        assert_eq!(
            events,
            vec![
                mouse(MouseEventKind::Move, MouseButton::None, 5, 6),
                InputEvent::Mouse(ctrl_shift),
            ]
        );
    }

    #[test]
    fn test_sgr_wheel() {
        let events = decode(b"\x1b[<64;2;2M\x1b[<65;2;2M");
        assert_eq!(
            events,
            vec![
                mouse(MouseEventKind::ScrollUp, MouseButton::None, 2, 2),
                mouse(MouseEventKind::ScrollDown, MouseButton::None, 2, 2),
            ]
        );
    }

    #[test]
    fn test_malformed_sgr_mouse_is_skipped() {
        let events = decode(b"\x1b[<0;10M\x1b[<0;0;5Mk");
        assert_eq!(keys(&events), vec![plain(Key::Char('k'))]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_sgr_split_across_chunks() {
        let mut decoder = Decoder::new();
        assert!(decoder.feed(b"\x1b[<0;1").is_empty());
        let events = decoder.feed(b"2;7M");
        assert_eq!(
            events,
            vec![mouse(MouseEventKind::Press, MouseButton::Left, 12, 7)]
        );
    }

    #[test]
    fn test_sgr_round_trip() {
        let buttons = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];
        let kinds = [MouseEventKind::Press, MouseEventKind::Release, MouseEventKind::Move];
        let coords = [(1, 1), (2, 9), (80, 24), (223, 224), (1000, 5000), (65_536, 3)];

        for button in buttons {
            for kind in kinds {
                for (x, y) in coords {
                    let original = MouseEvent::new(kind, button, x, y);
                    let decoded = decode(encode_sgr(&original).as_bytes());
                    assert_eq!(decoded, vec![InputEvent::Mouse(original)]);
                }
            }
        }
    }
}
