//! Advance widths of the standard Helvetica faces, in 1/1000 em, for the
//! printable ASCII range. Characters outside it are measured as a digit.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
  Regular,
  Bold,
}

/// Distance from the top of a line box to the baseline, in em.
pub const ASCENT: f32 = 0.718;

const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
  278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
  556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
  1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
  667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
  333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
  556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
  278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
  556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
  975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
  667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
  333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
  611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, weight: FontWeight) -> u16 {
  let table = match weight {
    FontWeight::Regular => &HELVETICA,
    FontWeight::Bold => &HELVETICA_BOLD,
  };
  let code = c as u32;
  if (32..=126).contains(&code) {
    table[(code - 32) as usize]
  } else {
    FALLBACK_WIDTH
  }
}

/// Width of `text` set at `size` points.
pub fn text_width(text: &str, size: f32, weight: FontWeight) -> f32 {
  let units: u32 = text.chars().map(|c| u32::from(char_width(c, weight))).sum();
  units as f32 * size / 1000.0
}

/// Greedy word wrap to `max_width`. Words wider than a line are split
/// between characters. Always returns at least one line.
pub fn wrap_text(text: &str, size: f32, weight: FontWeight, max_width: f32) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();

  for word in text.split_whitespace() {
    let candidate = if current.is_empty() {
      word.to_string()
    } else {
      format!("{} {}", current, word)
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
      continue;
    }

    for c in word.chars() {
      current.push(c);
      if text_width(&current, size, weight) > max_width && current.chars().count() > 1 {
        current.pop();
        lines.push(std::mem::take(&mut current));
        current.push(c);
      }
    }
  }

  if !current.is_empty() || lines.is_empty() {
    lines.push(current);
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_text_width() {
    // "INVOICE" in Helvetica-Bold: 278+722+667+778+278+722+667 = 4112
    let width = text_width("INVOICE", 24.0, FontWeight::Bold);
    assert!((width - 98.688).abs() < 0.001);
    assert_eq!(text_width("", 10.0, FontWeight::Regular), 0.0);
    assert!(text_width("Wi", 10.0, FontWeight::Regular) > text_width("il", 10.0, FontWeight::Regular));
  }

  #[test]
  fn test_wrap_text_keeps_lines_within_width() {
    let text = "Replace cracked screen assembly, recalibrate touch digitizer and run diagnostics";
    let lines = wrap_text(text, 10.0, FontWeight::Regular, 150.0);
    assert!(lines.len() > 1);
    for line in &lines {
      assert!(text_width(line, 10.0, FontWeight::Regular) <= 150.0, "{}", line);
    }
    assert_eq!(lines.join(" "), text);
  }

  #[test]
  fn test_wrap_text_splits_long_words() {
    let lines = wrap_text(&"X".repeat(60), 10.0, FontWeight::Regular, 100.0);
    assert!(lines.len() > 1);
    assert_eq!(lines.concat().len(), 60);
  }

  #[test]
  fn test_wrap_text_empty() {
    assert_eq!(wrap_text("   ", 10.0, FontWeight::Regular, 100.0), vec![String::new()]);
  }
}
