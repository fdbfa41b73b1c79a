use std::collections::HashMap;

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, TextStr};
use svg2pdf::usvg;
use thiserror::Error;

/// A4 in PostScript points (210mm x 297mm). Every committed page of a
/// sheet document uses this size regardless of the source SVG size.
pub const A4_WIDTH: f32 = 595.2756;
pub const A4_HEIGHT: f32 = 841.8898;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page is not valid SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("SVG to PDF conversion failed: {0}")]
    Convert(String),
}

/// One decoded score page: a parsed SVG tree plus its intrinsic size.
///
/// Transient by design. A page is decoded from the raw bytes fetched
/// for one index, committed into a [`SheetDocument`], and dropped.
pub struct VectorPage {
    tree: usvg::Tree,
}

impl VectorPage {
    /// Decode raw SVG bytes into a drawable page.
    pub fn decode(data: &[u8]) -> Result<Self, RenderError> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(data, &options)?;
        Ok(VectorPage { tree })
    }

    /// Intrinsic width in SVG user units (1 unit = 1pt here).
    pub fn width(&self) -> f32 {
        self.tree.size().width()
    }

    /// Intrinsic height in SVG user units.
    pub fn height(&self) -> f32 {
        self.tree.size().height()
    }
}

/// Per-axis scale factors that map a source size onto a target size.
///
/// The two axes are scaled independently: the source aspect ratio is
/// NOT preserved. The host's page SVGs carry inconsistent intrinsic
/// sizes, and stretching each axis to the full target page is the
/// established rendering behavior for them.
pub fn fit_scale(source: (f32, f32), target: (f32, f32)) -> (f32, f32) {
    (target.0 / source.0, target.1 / source.1)
}

/// An A4 PDF document built incrementally, one score page at a time.
///
/// Pages are committed in call order and the caller is expected to push
/// them in ascending page-index order. A document finished with zero
/// committed pages is still a well-formed (empty) PDF.
pub struct SheetDocument {
    pdf: Pdf,
    alloc: Ref,
    catalog_id: Ref,
    page_tree_id: Ref,
    info_id: Ref,
    page_ids: Vec<Ref>,
    title: String,
}

impl SheetDocument {
    /// Create an empty document. `title` becomes the PDF title metadata.
    pub fn new(title: &str) -> Self {
        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let page_tree_id = alloc.bump();
        let info_id = alloc.bump();
        SheetDocument {
            pdf: Pdf::new(),
            alloc,
            catalog_id,
            page_tree_id,
            info_id,
            page_ids: Vec::new(),
            title: title.to_string(),
        }
    }

    /// Number of pages committed so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Commit one decoded page, rescaled to fill the full A4 page.
    pub fn push_page(&mut self, page: &VectorPage) -> Result<(), RenderError> {
        let (chunk, svg_ref) = svg2pdf::to_chunk(&page.tree, svg2pdf::ConversionOptions::default())
            .map_err(|e| RenderError::Convert(format!("{e:?}")))?;

        // Renumber the converted chunk into this document's id space.
        let mut map = HashMap::new();
        let chunk = chunk.renumber(|old| *map.entry(old).or_insert_with(|| self.alloc.bump()));
        let svg_ref = map[&svg_ref];
        self.pdf.extend(&chunk);

        // The converted form XObject is normalized to a unit square, so
        // the placement transform carries the full scaled page size.
        let (scale_x, scale_y) = fit_scale((page.width(), page.height()), (A4_WIDTH, A4_HEIGHT));
        tracing::debug!(
            width = page.width(),
            height = page.height(),
            scale_x,
            scale_y,
            "Committing page"
        );

        let mut content = Content::new();
        content.transform([
            scale_x * page.width(),
            0.0,
            0.0,
            scale_y * page.height(),
            0.0,
            0.0,
        ]);
        content.x_object(Name(b"Pg"));
        let content_id = self.alloc.bump();
        self.pdf.stream(content_id, &content.finish());

        let page_id = self.alloc.bump();
        let mut page_writer = self.pdf.page(page_id);
        page_writer.media_box(Rect::new(0.0, 0.0, A4_WIDTH, A4_HEIGHT));
        page_writer.parent(self.page_tree_id);
        page_writer.contents(content_id);
        page_writer
            .resources()
            .x_objects()
            .pair(Name(b"Pg"), svg_ref);
        page_writer.finish();

        self.page_ids.push(page_id);
        Ok(())
    }

    /// Write the catalog, page tree, and metadata, and return the
    /// serialized PDF.
    pub fn finish(mut self) -> Vec<u8> {
        self.pdf.catalog(self.catalog_id).pages(self.page_tree_id);
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.page_ids.iter().copied())
            .count(self.page_ids.len() as i32);
        self.pdf.document_info(self.info_id).title(TextStr(&self.title));
        self.pdf.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="200">
        <rect x="10" y="10" width="80" height="180" fill="black"/>
    </svg>"#;

    #[test]
    fn decode_reports_intrinsic_size() {
        let page = VectorPage::decode(PAGE_SVG.as_bytes()).unwrap();
        assert_eq!(page.width(), 100.0);
        assert_eq!(page.height(), 200.0);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(VectorPage::decode(b"not an svg").is_err());
    }

    #[test]
    fn fit_scale_is_independent_per_axis() {
        let (sx, sy) = fit_scale((100.0, 200.0), (210.0, 297.0));
        assert_eq!(sx, 2.1);
        assert_eq!(sy, 1.485);
    }

    #[test]
    fn document_commits_pages_in_order() {
        let mut doc = SheetDocument::new("Test Score");
        let page = VectorPage::decode(PAGE_SVG.as_bytes()).unwrap();
        doc.push_page(&page).unwrap();
        doc.push_page(&page).unwrap();
        assert_eq!(doc.page_count(), 2);

        let bytes = doc.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Count 2"));
    }

    #[test]
    fn empty_document_is_valid() {
        let doc = SheetDocument::new("Empty");
        assert_eq!(doc.page_count(), 0);

        let bytes = doc.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Count 0"));
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }
}
