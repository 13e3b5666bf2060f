//! Text measurement for the built-in Helvetica face.
//!
//! Widths come from the standard Helvetica AFM advance table, in 1/1000 em,
//! covering ASCII 0x20..=0x7E. Everything else (accented letters included)
//! falls back to the width of a lowercase letter, which is close enough for
//! line breaking. Bold glyphs are measured with the regular table.

/// Millimetres per PostScript point
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Fallback advance for characters outside the table
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica advance widths, index = (char as usize) - 32
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // sp    !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
      278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
      556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    //  :    ;    <    =    >    ?     @
      278, 278, 584, 584, 584, 556, 1015,
    // A-Z
      667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
      722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    //  [    \    ]    ^    _    `
      278, 278, 278, 469, 556, 333,
    // a-z
      556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
      556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    //  {    |    }    ~
      334, 260, 334, 584,
];

fn char_width(c: char) -> u16 {
    let code = c as usize;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[code - 32]
    } else {
        FALLBACK_WIDTH
    }
}

/// Rendered width of a string in millimetres at the given font size
pub fn text_width(text: &str, font_size_pt: f32) -> f32 {
    let em_thousandths: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    em_thousandths as f32 / 1000.0 * font_size_pt * MM_PER_PT
}

/// Break text into lines no wider than `max_width` millimetres
///
/// Explicit newlines start a new paragraph. Words are never reordered; a
/// single word wider than the line is broken between characters.
pub fn wrap_text(text: &str, max_width: f32, font_size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, font_size_pt) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, font_size_pt) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, max_width, font_size_pt);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        lines.push(current);
    }

    // Trailing blank paragraphs add nothing to the printed block
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines
}

fn break_word(word: &str, max_width: f32, font_size_pt: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && text_width(&current, font_size_pt) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_known_glyphs() {
        // "Il" = 278 + 222 em/1000; at 10pt = 5.00pt
        let width = text_width("Il", 10.0);
        assert!((width - 5.0 * MM_PER_PT).abs() < 1e-4);
    }

    #[test]
    fn test_non_ascii_uses_fallback() {
        assert_eq!(text_width("é", 12.0), text_width("a", 12.0));
    }

    #[test]
    fn test_wrap_short_text_single_line() {
        let lines = wrap_text("Tomar com água", 170.0, 12.0);
        assert_eq!(lines, vec!["Tomar com água".to_string()]);
    }

    #[test]
    fn test_wrap_respects_width_and_order() {
        let text = "Evitar bebidas alcoólicas durante todo o tratamento e retornar \
                    para reavaliação em trinta dias com os exames solicitados";
        let lines = wrap_text(text, 60.0, 12.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 12.0) <= 60.0, "line too wide: {:?}", line);
        }
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let lines = wrap_text("Primeira linha\nSegunda linha\n\n", 170.0, 12.0);
        assert_eq!(lines, vec!["Primeira linha", "Segunda linha"]);
    }

    #[test]
    fn test_wrap_breaks_oversized_word() {
        let word = "W".repeat(40);
        let lines = wrap_text(&word, 30.0, 12.0);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, 12.0) <= 30.0);
        }
    }
}
