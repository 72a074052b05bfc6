use std::fs::File;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

use crate::dto::shopping_list::AggregatedLine;

pub const PDF_FILENAME: &str = "shopping_list.pdf";

const PAGE_TITLE: &str = "Shopping list";
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const START_X_MM: f32 = 30.0;
const START_Y_MM: f32 = 250.0;
const LINE_HEIGHT_MM: f32 = 7.0;
const BOTTOM_MARGIN_MM: f32 = 30.0;
const FONT_SIZE: f32 = 12.0;

/// The built-in Helvetica only covers WinAnsi; ingredient names in
/// non-Latin scripts need an embedded TTF supplied via `PDF_FONT_PATH`.
fn load_font(doc: &PdfDocumentReference) -> anyhow::Result<IndirectFontRef> {
    if let Ok(path) = std::env::var("PDF_FONT_PATH") {
        let file = File::open(&path)?;
        return Ok(doc.add_external_font(file)?);
    }
    Ok(doc.add_builtin_font(BuiltinFont::Helvetica)?)
}

fn format_line(line: &AggregatedLine) -> String {
    format!("{}: {} {}", line.name, line.amount, line.measurement_unit)
}

/// Split formatted lines into pages following the cursor rule: lines descend
/// from just below the title; when the next line would cross the bottom
/// margin, a fresh page starts. An empty input yields a single title-only
/// page.
fn paginate(lines: &[AggregatedLine]) -> Vec<Vec<String>> {
    let mut pages: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut y = START_Y_MM - LINE_HEIGHT_MM;
    for line in lines {
        if y < BOTTOM_MARGIN_MM {
            pages.push(std::mem::take(&mut current));
            y = START_Y_MM - LINE_HEIGHT_MM;
        }
        current.push(format_line(line));
        y -= LINE_HEIGHT_MM;
    }
    pages.push(current);
    pages
}

/// Render the aggregated shopping list to a finalized PDF. Every page
/// repeats the title; the layout is fixed, so equal inputs produce equal
/// text placement.
pub fn render(lines: &[AggregatedLine]) -> anyhow::Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        PAGE_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "shopping-list",
    );
    let font = load_font(&doc)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    for (index, page_lines) in paginate(lines).iter().enumerate() {
        if index > 0 {
            let (page, layer_index) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "shopping-list");
            layer = doc.get_page(page).get_layer(layer_index);
        }
        layer.use_text(PAGE_TITLE, FONT_SIZE, Mm(START_X_MM), Mm(START_Y_MM), &font);
        let mut y = START_Y_MM - LINE_HEIGHT_MM;
        for text in page_lines {
            layer.use_text(text.clone(), FONT_SIZE, Mm(START_X_MM), Mm(y), &font);
            y -= LINE_HEIGHT_MM;
        }
    }

    Ok(doc.save_to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, amount: i64, unit: &str) -> AggregatedLine {
        AggregatedLine {
            name: name.to_string(),
            amount,
            measurement_unit: unit.to_string(),
        }
    }

    // Page capacity implied by the cursor rule: line k sits at
    // START_Y - (k + 1) * LINE_HEIGHT and must stay at or above the margin.
    fn lines_per_page() -> usize {
        let mut count = 0;
        let mut y = START_Y_MM - LINE_HEIGHT_MM;
        while y >= BOTTOM_MARGIN_MM {
            count += 1;
            y -= LINE_HEIGHT_MM;
        }
        count
    }

    #[test]
    fn formats_name_amount_unit() {
        assert_eq!(format_line(&line("flour", 300, "g")), "flour: 300 g");
    }

    #[test]
    fn empty_input_is_single_title_only_page() {
        let pages = paginate(&[]);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn breaks_page_exactly_at_capacity() {
        let capacity = lines_per_page();
        let full: Vec<AggregatedLine> =
            (0..capacity).map(|i| line(&format!("item-{i:03}"), 1, "g")).collect();
        assert_eq!(paginate(&full).len(), 1);

        let overflow: Vec<AggregatedLine> =
            (0..capacity + 1).map(|i| line(&format!("item-{i:03}"), 1, "g")).collect();
        let pages = paginate(&overflow);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), capacity);
        assert_eq!(pages[1].len(), 1);
    }

    #[test]
    fn pagination_preserves_line_order() {
        let input: Vec<AggregatedLine> =
            (0..lines_per_page() * 2 + 3).map(|i| line(&format!("item-{i:03}"), 1, "g")).collect();
        let flattened: Vec<String> = paginate(&input).concat();
        let expected: Vec<String> = input.iter().map(format_line).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn render_produces_finalized_pdf() {
        let bytes = render(&[line("flour", 300, "g"), line("sugar", 50, "g")])
            .expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
    }

    #[test]
    fn render_accepts_empty_list() {
        let bytes = render(&[]).expect("empty cart still renders a title page");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
