// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ESC/POS self-test receipt.
//
// Printed after the user saves new printer settings, as proof that the
// bridge can reach the printer.  Layout:
//
// ```text
// ESC @                      initialise
// ESC a 1, ESC ! 0x38        centred, double size, emphasised
//   OTTER ORDER
// ESC ! 0, ESC a 0           normal, left aligned
//   banner, IP, port, timestamp
// ESC a 1                    centred
//   success glyph, blank feed lines
// GS V 1                     cut
// ```

use chrono::NaiveDateTime;

use otter_bridge_core::Preferences;

/// Escape, prefix of most printer commands.
pub const ESC: u8 = 0x1B;

/// Group separator, prefix of the cut command.
pub const GS: u8 = 0x1D;

/// `ESC !` mode: double height, double width, emphasised.
pub const MODE_TITLE: u8 = 0x38;

/// `ESC !` mode: plain text.
pub const MODE_NORMAL: u8 = 0x00;

/// Format used for the "Time:" line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TITLE: &str = "OTTER ORDER";
const RULE: &str = "============================";
const SUCCESS_GLYPH: &str = "\u{2705} PRINT OK \u{2705}";

/// Blank lines fed after the glyph so the text clears the cutter.
const TRAILING_FEEDS: usize = 9;

/// Horizontal alignment for `ESC a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left = 0,
    Center = 1,
}

/// Chainable builder for an ESC/POS byte stream.
#[derive(Debug, Default)]
pub struct EscPosBuilder {
    buf: Vec<u8>,
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ESC @`: reset the printer to power-on state.
    pub fn initialize(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b'@']);
        self
    }

    /// `ESC a n`
    pub fn align(&mut self, align: Align) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b'a', align as u8]);
        self
    }

    /// `ESC ! n`: character size and emphasis.
    pub fn mode(&mut self, mode: u8) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, b'!', mode]);
        self
    }

    /// Text followed by a line feed.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(b'\n');
        self
    }

    pub fn feed(&mut self, lines: usize) -> &mut Self {
        self.buf.extend(std::iter::repeat_n(b'\n', lines));
        self
    }

    /// `GS V 1`: partial cut.
    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, b'V', 0x01]);
        self
    }

    pub fn build(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Render the test receipt for `prefs`, stamped with `printed_at`.
pub fn render_test_page(prefs: &Preferences, printed_at: NaiveDateTime) -> Vec<u8> {
    EscPosBuilder::new()
        .initialize()
        .align(Align::Center)
        .mode(MODE_TITLE)
        .line(TITLE)
        .mode(MODE_NORMAL)
        .align(Align::Left)
        .line("Printer Bridge Test Page")
        .line(RULE)
        .line("Connection successful!")
        .line(&format!("IP:   {}", prefs.printer_ip))
        .line(&format!("Port: {}", prefs.printer_port))
        .line(&format!("Time: {}", printed_at.format(TIMESTAMP_FORMAT)))
        .line(RULE)
        .feed(1)
        .align(Align::Center)
        .line(SUCCESS_GLYPH)
        .feed(TRAILING_FEEDS)
        .cut()
        .build()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn starts_with_init_and_centred_title() {
        let page = render_test_page(&Preferences::new("10.0.0.9", "9100"), stamp());
        let mut expected = vec![ESC, b'@', ESC, b'a', 1, ESC, b'!', 0x38];
        expected.extend_from_slice(b"OTTER ORDER\n");
        expected.extend_from_slice(&[ESC, b'!', 0x00, ESC, b'a', 0]);
        assert!(page.starts_with(&expected));
    }

    #[test]
    fn body_lists_connection_details() {
        let page = render_test_page(&Preferences::new("10.0.0.9", "9101"), stamp());
        assert!(contains(&page, b"Printer Bridge Test Page\n"));
        assert!(contains(&page, b"IP:   10.0.0.9\n"));
        assert!(contains(&page, b"Port: 9101\n"));
        assert!(contains(&page, b"Time: 2026-03-04 05:06:07\n"));
    }

    #[test]
    fn ends_with_glyph_feeds_and_cut() {
        let page = render_test_page(&Preferences::new("10.0.0.9", "9100"), stamp());

        let mut tail = vec![ESC, b'a', 1];
        tail.extend_from_slice("\u{2705} PRINT OK \u{2705}\n".as_bytes());
        tail.extend_from_slice(&[b'\n'; 9]);
        tail.extend_from_slice(&[GS, b'V', 1]);
        assert!(page.ends_with(&tail));
    }

    #[test]
    fn builder_resets_after_build() {
        let mut builder = EscPosBuilder::new();
        assert_eq!(builder.initialize().build(), vec![ESC, b'@']);
        assert!(builder.build().is_empty());
    }
}
