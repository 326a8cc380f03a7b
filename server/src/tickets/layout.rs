//! Ticket layout: one set of Helvetica metrics and a top-down cursor.
//!
//! Coordinates are PDF points measured from the top-left corner; the PDF
//! writer flips them. Text wraps greedily at word boundaries and the page
//! never grows, so every field has a line budget and overflowing text is cut
//! with an ellipsis. The budgets keep the QR code and ticket number on the page.

use super::qr::{QrMatrix, QUIET_ZONE};
use super::TicketData;

pub const PAGE_WIDTH: f32 = 300.0;
pub const PAGE_HEIGHT: f32 = 520.0;
pub const MARGIN: f32 = 24.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const LINE_HEIGHT: f32 = 1.3;
const BLOCK_SPACING: f32 = 10.0;
const LABEL_SIZE: f32 = 7.5;
const QR_SIZE: f32 = 150.0;
const RULE_THICKNESS: f32 = 0.75;
const ELLIPSIS: &str = "...";

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const FALLBACK_WIDTH: u16 = 556;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        text: String,
    },
    /// Filled rectangle, `y` is the top edge.
    Rect { x: f32, y: f32, width: f32, height: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketLayout {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

/// Width of `text` at `size` points. Bold text is measured with the regular
/// table plus a fixed allowance.
pub fn text_width(text: &str, size: f32, weight: FontWeight) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    let width = units as f32 * size / 1000.0;
    match weight {
        FontWeight::Regular => width,
        FontWeight::Bold => width * 1.08,
    }
}

fn char_width(c: char) -> u16 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Greedy word wrap. Words wider than a full line are split by characters.
pub fn wrap(text: &str, size: f32, weight: FontWeight, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, size, weight) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if text_width(word, size, weight) <= max_width {
            current = word.to_string();
        } else {
            for ch in word.chars() {
                current.push(ch);
                if text_width(&current, size, weight) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, ch.to_string()));
                }
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Keeps at most `max_lines`, ending the last kept line with an ellipsis
/// that still fits within `max_width`.
pub fn clamp_lines(
    mut lines: Vec<String>,
    max_lines: usize,
    size: f32,
    weight: FontWeight,
    max_width: f32,
) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let mut kept = last.trim_end().to_string();
        while !kept.is_empty()
            && text_width(&format!("{kept}{ELLIPSIS}"), size, weight) > max_width
        {
            kept.pop();
            kept.truncate(kept.trim_end().len());
        }
        *last = format!("{kept}{ELLIPSIS}");
    }
    lines
}

struct Cursor {
    y: f32,
    ops: Vec<DrawOp>,
}

impl Cursor {
    fn new() -> Self {
        Self {
            y: MARGIN,
            ops: Vec::new(),
        }
    }

    fn text(&mut self, text: &str, size: f32, weight: FontWeight, max_lines: usize) {
        let lines = wrap(text, size, weight, CONTENT_WIDTH);
        for line in clamp_lines(lines, max_lines, size, weight, CONTENT_WIDTH) {
            self.ops.push(DrawOp::Text {
                x: MARGIN,
                y: self.y + size,
                size,
                weight,
                text: line,
            });
            self.y += size * LINE_HEIGHT;
        }
    }

    fn field(&mut self, label: &str, values: &[(&str, f32, FontWeight, usize)]) {
        self.text(label, LABEL_SIZE, FontWeight::Bold, 1);
        for (value, size, weight, max_lines) in values {
            if !value.trim().is_empty() {
                self.text(value, *size, *weight, *max_lines);
            }
        }
        self.space(BLOCK_SPACING);
    }

    fn rule(&mut self) {
        self.ops.push(DrawOp::Rect {
            x: MARGIN,
            y: self.y,
            width: CONTENT_WIDTH,
            height: RULE_THICKNESS,
        });
        self.space(BLOCK_SPACING + RULE_THICKNESS);
    }

    fn qr(&mut self, matrix: &QrMatrix) {
        let module = QR_SIZE / matrix.padded_width() as f32;
        let left = (PAGE_WIDTH - QR_SIZE) / 2.0;
        let top = self.y;

        for (x, y) in matrix.dark_modules() {
            self.ops.push(DrawOp::Rect {
                x: left + (x + QUIET_ZONE) as f32 * module,
                y: top + (y + QUIET_ZONE) as f32 * module,
                width: module,
                height: module,
            });
        }
        self.space(QR_SIZE + BLOCK_SPACING);
    }

    fn space(&mut self, amount: f32) {
        self.y += amount;
    }
}

pub fn layout_ticket(data: &TicketData, qr: &QrMatrix) -> TicketLayout {
    let mut cursor = Cursor::new();

    cursor.text("EVNTOS TICKET", LABEL_SIZE, FontWeight::Bold, 1);
    cursor.space(4.0);
    cursor.text(&data.event_title, 18.0, FontWeight::Bold, 3);
    cursor.space(BLOCK_SPACING);

    cursor.field("DATE & TIME", &[(data.schedule.as_str(), 11.0, FontWeight::Regular, 1)]);
    if !data.venue_name.trim().is_empty() || !data.venue_address.trim().is_empty() {
        cursor.field(
            "VENUE",
            &[
                (data.venue_name.as_str(), 11.0, FontWeight::Regular, 1),
                (data.venue_address.as_str(), 9.0, FontWeight::Regular, 1),
            ],
        );
    }
    cursor.rule();

    cursor.field(
        "GUEST",
        &[
            (data.guest_name.as_str(), 12.0, FontWeight::Bold, 2),
            (data.guest_email.as_str(), 9.0, FontWeight::Regular, 1),
        ],
    );
    cursor.qr(qr);
    cursor.field("TICKET NO.", &[(data.ticket_number.as_str(), 8.0, FontWeight::Regular, 2)]);

    TicketLayout {
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
        ops: cursor.ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> TicketData {
        TicketData {
            event_title: "Summer Fest".to_string(),
            schedule: "2025-07-01 · 18:00".to_string(),
            venue_name: "Riverside Park".to_string(),
            venue_address: "1 River Rd".to_string(),
            guest_name: "Jane Doe".to_string(),
            guest_email: "jane@x.com".to_string(),
            ticket_number: "3f2a9c1e7b6d4e0fa1b2c3d4e5f60718".to_string(),
        }
    }

    fn texts(layout: &TicketLayout) -> Vec<&str> {
        layout
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rect { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_text_width_uses_metrics() {
        // "Il" = 278 + 222
        assert!((text_width("Il", 10.0, FontWeight::Regular) - 5.0).abs() < f32::EPSILON);
        assert!(text_width("Il", 10.0, FontWeight::Bold) > 5.0);
    }

    #[test]
    fn test_wrap_breaks_at_word_boundaries() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 12.0, FontWeight::Regular, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
        for line in &lines {
            assert!(text_width(line, 12.0, FontWeight::Regular) <= 100.0, "{line} overflows");
        }
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let word = "w".repeat(40);
        let lines = wrap(&word, 12.0, FontWeight::Regular, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_empty_text_has_no_lines() {
        assert!(wrap("   ", 12.0, FontWeight::Regular, 100.0).is_empty());
    }

    #[test]
    fn test_layout_places_fields_top_down() {
        let qr = QrMatrix::encode("ticket").unwrap();
        let layout = layout_ticket(&data(), &qr);

        assert_eq!(
            texts(&layout),
            vec![
                "EVNTOS TICKET",
                "Summer Fest",
                "DATE & TIME",
                "2025-07-01 · 18:00",
                "VENUE",
                "Riverside Park",
                "1 River Rd",
                "GUEST",
                "Jane Doe",
                "jane@x.com",
                "TICKET NO.",
                "3f2a9c1e7b6d4e0fa1b2c3d4e5f60718",
            ]
        );

        let baselines: Vec<f32> = layout
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y),
                DrawOp::Rect { .. } => None,
            })
            .collect();
        assert!(baselines.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(baselines.iter().all(|y| *y < PAGE_HEIGHT - MARGIN));
    }

    #[test]
    fn test_layout_skips_missing_venue() {
        let mut data = data();
        data.venue_name.clear();
        data.venue_address.clear();
        let layout = layout_ticket(&data, &QrMatrix::encode("ticket").unwrap());
        assert!(!texts(&layout).contains(&"VENUE"));
    }

    #[test]
    fn test_clamp_lines_ends_with_ellipsis_within_width() {
        let lines = wrap(&"lorem ipsum ".repeat(40), 12.0, FontWeight::Regular, 120.0);
        let clamped = clamp_lines(lines, 2, 12.0, FontWeight::Regular, 120.0);

        assert_eq!(clamped.len(), 2);
        assert!(clamped[1].ends_with("..."));
        assert!(text_width(&clamped[1], 12.0, FontWeight::Regular) <= 120.0);
        assert_eq!(clamp_lines(vec!["short".to_string()], 2, 12.0, FontWeight::Regular, 120.0), vec!["short"]);
    }

    #[test]
    fn test_long_fields_keep_everything_on_the_page() {
        let mut data = data();
        data.event_title = "Annual International Conference ".repeat(12);
        data.guest_name = "Maximiliana Wolfeschlegelsteinhausen ".repeat(10);
        data.guest_email = format!("{}@example.com", "a".repeat(300));
        data.venue_name = "Grand Hall ".repeat(30);
        data.venue_address = "1 Very Long Street Name ".repeat(20);
        data.schedule = "Saturday the first of July ".repeat(15);
        assert!(data.event_title.len() > 300 && data.guest_name.len() > 300);

        let qr = QrMatrix::encode(&data.ticket_number).unwrap();
        let layout = layout_ticket(&data, &qr);
        let bottom = PAGE_HEIGHT - MARGIN;

        for op in &layout.ops {
            match op {
                DrawOp::Text { y, .. } => assert!(*y <= bottom, "text baseline {y} below {bottom}"),
                DrawOp::Rect { y, height, .. } => {
                    assert!(y + height <= bottom, "rect ends at {} below {bottom}", y + height)
                }
            }
        }

        let texts = texts(&layout);
        assert!(texts.contains(&"TICKET NO."));
        assert!(texts.contains(&data.ticket_number.as_str()));
        let title_lines = layout
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { size, .. } if *size == 18.0))
            .count();
        assert_eq!(title_lines, 3);
    }

    #[test]
    fn test_qr_modules_are_centered_squares() {
        let qr = QrMatrix::encode("ticket").unwrap();
        let layout = layout_ticket(&data(), &qr);
        let modules: Vec<_> = layout
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { x, width, height, .. } if (width - height).abs() < f32::EPSILON => {
                    Some(*x)
                }
                _ => None,
            })
            .collect();

        assert_eq!(modules.len(), qr.dark_modules().count());
        let left = (PAGE_WIDTH - QR_SIZE) / 2.0;
        assert!(modules.iter().all(|x| *x >= left && *x < left + QR_SIZE));
    }
}
