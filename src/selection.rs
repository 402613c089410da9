//! Text search and selection over structured text pages

use mupdf::TextPage;
use mupdf::text_page::TextBlockType;

use crate::protocol::{PagePoint, Quad, SearchHit};

/// One text line with its bounds and per-character x origins.
struct LineRun {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    chars: Vec<PlacedChar>,
}

struct PlacedChar {
    c: char,
    x: f32,
}

impl LineRun {
    /// Quad covering the character range `start..end` of this line.
    ///
    /// The right edge is the origin of the first character after the
    /// range, falling back to the line bound for a range ending at EOL.
    fn quad_for(&self, start: usize, end: usize) -> Quad {
        let x_start = self.chars.get(start).map_or(self.x0, |c| c.x);
        let x_end = self.chars.get(end).map_or(self.x1, |c| c.x);
        Quad::from_rect(x_start, self.y0, x_end, self.y1)
    }
}

fn collect_lines(text_page: &TextPage) -> Vec<LineRun> {
    let mut lines = Vec::new();

    for block in text_page.blocks() {
        if block.r#type() != TextBlockType::Text {
            continue;
        }
        for line in block.lines() {
            let bbox = line.bounds();
            let chars: Vec<PlacedChar> = line
                .chars()
                .filter_map(|ch| {
                    ch.char().map(|c| PlacedChar {
                        c,
                        x: ch.origin().x,
                    })
                })
                .collect();
            if chars.is_empty() {
                continue;
            }
            lines.push(LineRun {
                x0: bbox.x0,
                y0: bbox.y0,
                x1: bbox.x1,
                y1: bbox.y1,
                chars,
            });
        }
    }

    lines
}

/// Non-overlapping match ranges of `needle` within `hay`, as char indices.
fn match_ranges(hay: &[char], needle: &[char]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if needle.is_empty() || hay.len() < needle.len() {
        return ranges;
    }

    let mut i = 0;
    while i + needle.len() <= hay.len() {
        if hay[i..i + needle.len()] == *needle {
            ranges.push((i, i + needle.len()));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    ranges
}

/// Case-insensitive search across a page's text.
///
/// Matching continues across line breaks, which compare as a single
/// space, so text wrapped over lines is still found; each hit carries
/// one quad per line segment the match covers. Characters compare under
/// full lowercase folding, including multi-char expansions such as 'İ'.
pub fn search_text_page(text_page: &TextPage, needle: &str, max_hits: usize) -> Vec<SearchHit> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() || max_hits == 0 {
        return Vec::new();
    }
    search_lines(&collect_lines(text_page), &needle, max_hits)
}

/// Match a pre-folded needle over the flattened char stream of `lines`.
///
/// A line break folds to a single space carrying no source position, so
/// break spaces never contribute quads of their own.
fn search_lines(lines: &[LineRun], needle: &[char], max_hits: usize) -> Vec<SearchHit> {
    let mut stream: Vec<(char, Option<(usize, usize)>)> = Vec::new();
    for (li, run) in lines.iter().enumerate() {
        if li > 0 {
            stream.push((' ', None));
        }
        for (ci, pc) in run.chars.iter().enumerate() {
            for folded in pc.c.to_lowercase() {
                stream.push((folded, Some((li, ci))));
            }
        }
    }

    let hay: Vec<char> = stream.iter().map(|&(c, _)| c).collect();
    let mut hits = Vec::new();
    for (start, end) in match_ranges(&hay, needle) {
        let quads = segment_quads(lines, &stream[start..end]);
        if quads.is_empty() {
            continue;
        }
        hits.push(SearchHit { quads });
        if hits.len() >= max_hits {
            break;
        }
    }
    hits
}

/// One quad per contiguous run of matched characters on a single line.
fn segment_quads(lines: &[LineRun], matched: &[(char, Option<(usize, usize)>)]) -> Vec<Quad> {
    let mut quads = Vec::new();
    // (line, from, to) of the segment being grown
    let mut current: Option<(usize, usize, usize)> = None;
    for &(_, pos) in matched {
        let Some((li, ci)) = pos else { continue };
        current = match current {
            // the same source char appears twice under multi-char folding
            Some((cl, from, to)) if cl == li && (ci == to || ci + 1 == to) => {
                Some((cl, from, to.max(ci + 1)))
            }
            Some((cl, from, to)) => {
                quads.push(lines[cl].quad_for(from, to));
                Some((li, ci, ci + 1))
            }
            None => Some((li, ci, ci + 1)),
        };
    }
    if let Some((cl, from, to)) = current {
        quads.push(lines[cl].quad_for(from, to));
    }
    quads
}

/// Order two selection endpoints into reading order (top-down, then
/// left-to-right).
fn ordered(a: PagePoint, b: PagePoint) -> (PagePoint, PagePoint) {
    if b.y < a.y || (b.y == a.y && b.x < a.x) {
        (b, a)
    } else {
        (a, b)
    }
}

/// Character span of `line` covered by the selection, if any.
///
/// Lines overlapping the selection's vertical extent are included; the
/// boundary lines are additionally trimmed by the endpoints' x origins.
fn selected_span(line: &LineRun, start: PagePoint, end: PagePoint) -> Option<(usize, usize)> {
    if line.y1 < start.y || line.y0 > end.y {
        return None;
    }
    let is_first = line.y0 <= start.y && line.y1 >= start.y;
    let is_last = line.y0 <= end.y && line.y1 >= end.y;

    let from = if is_first {
        line.chars.iter().position(|c| c.x >= start.x)?
    } else {
        0
    };
    let to = if is_last {
        line.chars.iter().rposition(|c| c.x <= end.x)? + 1
    } else {
        line.chars.len()
    };

    (from < to).then_some((from, to))
}

/// Quads covering the text between two page points.
pub fn highlight_selection(text_page: &TextPage, a: PagePoint, b: PagePoint) -> Vec<Quad> {
    let (start, end) = ordered(a, b);

    collect_lines(text_page)
        .iter()
        .filter_map(|line| {
            let (from, to) = selected_span(line, start, end)?;
            Some(line.quad_for(from, to))
        })
        .collect()
}

/// Extract the text between two page points, joined line by line.
pub fn copy_selection(text_page: &TextPage, a: PagePoint, b: PagePoint) -> String {
    let (start, end) = ordered(a, b);

    let mut selected: Vec<(f32, String)> = collect_lines(text_page)
        .iter()
        .filter_map(|line| {
            let (from, to) = selected_span(line, start, end)?;
            let text: String = line.chars[from..to].iter().map(|pc| pc.c).collect();
            (!text.is_empty()).then_some((line.y0, text))
        })
        .collect();

    selected.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let joined = selected
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n");
    joined.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(y0: f32, y1: f32, text: &str) -> LineRun {
        // 10pt advance per character starting at x = 0
        let chars = text
            .chars()
            .enumerate()
            .map(|(i, c)| PlacedChar {
                c,
                x: i as f32 * 10.0,
            })
            .collect::<Vec<_>>();
        let x1 = chars.len() as f32 * 10.0;
        LineRun {
            x0: 0.0,
            y0,
            x1,
            y1,
            chars,
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn match_ranges_finds_non_overlapping_occurrences() {
        assert_eq!(
            match_ranges(&chars("abcabcab"), &chars("abc")),
            vec![(0, 3), (3, 6)]
        );
        assert_eq!(match_ranges(&chars("aaaa"), &chars("aa")), vec![(0, 2), (2, 4)]);
        assert!(match_ranges(&chars("short"), &chars("longer needle")).is_empty());
        assert!(match_ranges(&chars("anything"), &chars("")).is_empty());
    }

    #[test]
    fn search_spans_line_breaks_with_one_quad_per_segment() {
        let lines = vec![line(10.0, 20.0, "Hello paper"), line(30.0, 40.0, "one two")];
        let needle: Vec<char> = "paper one".chars().collect();

        let hits = search_lines(&lines, &needle, 8);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].quads.len(), 2);

        // "paper" ends the first line, "one" starts the second
        assert_eq!(hits[0].quads[0].ulx, 60.0);
        assert_eq!(hits[0].quads[0].urx, 110.0);
        assert_eq!(hits[0].quads[0].uly, 10.0);
        assert_eq!(hits[0].quads[1].ulx, 0.0);
        assert_eq!(hits[0].quads[1].urx, 30.0);
        assert_eq!(hits[0].quads[1].uly, 30.0);
    }

    #[test]
    fn search_folds_multi_char_lowercase_expansions() {
        // 'İ' lowercases to 'i' plus a combining dot above
        let lines = vec![line(0.0, 10.0, "İstanbul")];
        let needle: Vec<char> = "i\u{307}stanbul".chars().collect();

        let hits = search_lines(&lines, &needle, 4);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].quads.len(), 1);
        assert_eq!(hits[0].quads[0].ulx, 0.0);
        assert_eq!(hits[0].quads[0].urx, 80.0);
    }

    #[test]
    fn quad_spans_matched_characters() {
        let run = line(100.0, 112.0, "hello world");
        let q = run.quad_for(6, 11); // "world"

        assert_eq!(q.ulx, 60.0);
        assert_eq!(q.urx, 110.0); // line right bound, match ends the line
        assert_eq!(q.uly, 100.0);
        assert_eq!(q.lly, 112.0);
    }

    #[test]
    fn span_covers_middle_lines_fully() {
        let run = line(50.0, 60.0, "middle line");
        let start = PagePoint { x: 80.0, y: 10.0 };
        let end = PagePoint { x: 5.0, y: 200.0 };

        assert_eq!(selected_span(&run, start, end), Some((0, 11)));
    }

    #[test]
    fn span_trims_boundary_lines_by_x() {
        let first = line(10.0, 20.0, "abcdef");
        let last = line(90.0, 100.0, "uvwxyz");
        let start = PagePoint { x: 25.0, y: 15.0 };
        let end = PagePoint { x: 35.0, y: 95.0 };

        // first line: chars at x >= 25 (index 3 onward)
        assert_eq!(selected_span(&first, start, end), Some((3, 6)));
        // last line: chars at x <= 35 (up to index 3 inclusive)
        assert_eq!(selected_span(&last, start, end), Some((0, 4)));
    }

    #[test]
    fn span_skips_lines_outside_selection() {
        let run = line(200.0, 210.0, "below");
        let start = PagePoint { x: 0.0, y: 10.0 };
        let end = PagePoint { x: 50.0, y: 100.0 };

        assert_eq!(selected_span(&run, start, end), None);
    }

    #[test]
    fn single_line_selection_trims_both_ends() {
        let run = line(10.0, 20.0, "abcdefgh");
        let start = PagePoint { x: 15.0, y: 12.0 };
        let end = PagePoint { x: 52.0, y: 18.0 };

        // x >= 15 starts at index 2, x <= 52 ends after index 5
        assert_eq!(selected_span(&run, start, end), Some((2, 6)));
    }

    #[test]
    fn endpoints_are_normalized_to_reading_order() {
        let (start, end) = ordered(
            PagePoint { x: 5.0, y: 300.0 },
            PagePoint { x: 50.0, y: 10.0 },
        );
        assert_eq!(start.y, 10.0);
        assert_eq!(end.y, 300.0);
    }
}
