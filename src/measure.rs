use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Approximate text measurement for the 8pt labels drawn inside entity boxes.
pub struct TextMetrics {
    pub char_width: f64,
    pub text_offset_x: f64,
    pub padding_right: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 6.0,
            text_offset_x: 20.0,
            padding_right: 4.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        UnicodeWidthStr::width(text) as f64 * self.char_width
    }

    /// Shorten `text` with an ellipsis so it fits a box of `box_width`.
    pub fn fit_label(&self, text: &str, box_width: f64) -> String {
        let available = box_width - self.text_offset_x - self.padding_right;
        if self.text_width(text) <= available {
            return text.to_string();
        }
        let max_cells = ((available / self.char_width).floor() as usize).saturating_sub(1);
        let mut out = String::new();
        let mut cells = 0;
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if cells + w > max_cells {
                break;
            }
            cells += w;
            out.push(ch);
        }
        out.push('…');
        out
    }
}

/// Left-align `text` in a field of `width` display cells.
pub fn pad_display(text: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(text);
    if w >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - w))
    }
}
