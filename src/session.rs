//! Document session: native resource ownership and lifecycle

use mupdf::{DisplayList, Document, Page, TextPage, TextPageFlags};

use crate::cache::BoundedCache;
use crate::convert::{self, RgbaBuffer};
use crate::protocol::{EngineError, PageInfo, PagePoint, Quad, SearchHit, TileRect};
use crate::selection;

/// Display lists and text pages for typical pages are small relative to
/// rendered pixmaps, so a uniform per-entry bound is adequate.
const PAGE_RESOURCE_CACHE_CAP: usize = 8;

/// Owns at most one open document and the per-page resources derived
/// from it.
///
/// All per-page derived resources live in two independent bounded caches
/// and are invalidated when the document handle is replaced or destroyed.
/// Page and pixmap handles never outlive a single operation. The session
/// is single-threaded by construction; the worker loop is its only caller.
pub struct DocumentSession {
    // Field order matters: caches drop before the document handle.
    display_lists: BoundedCache<DisplayList>,
    text_pages: BoundedCache<TextPage>,
    doc: Option<Document>,
    page_count: i32,
}

impl DocumentSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            display_lists: BoundedCache::new(PAGE_RESOURCE_CACHE_CAP),
            text_pages: BoundedCache::new(PAGE_RESOURCE_CACHE_CAP),
            doc: None,
            page_count: 0,
        }
    }

    /// Open a document from raw bytes, replacing any open document.
    ///
    /// The previous document and both caches are torn down strictly before
    /// the new bytes are parsed; a failed open leaves the session closed.
    pub fn open(&mut self, bytes: &[u8]) -> Result<i32, EngineError> {
        self.destroy();

        let doc = Document::from_bytes(bytes, "application/pdf")
            .map_err(|e| EngineError::DocumentOpen(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| EngineError::DocumentOpen(e.to_string()))?;

        log::debug!("opened document with {page_count} pages");
        self.doc = Some(doc);
        self.page_count = page_count;
        Ok(page_count)
    }

    /// Release both caches, then the document handle. Idempotent.
    pub fn destroy(&mut self) {
        // Caches hold resources derived from the open handle, so they are
        // released first, while the handle is still valid.
        self.display_lists
            .clear(|page, _| log::debug!("released display list for page {page}"));
        self.text_pages
            .clear(|page, _| log::debug!("released text page for page {page}"));

        if self.doc.take().is_some() {
            log::debug!("released document handle");
        }
        self.page_count = 0;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.doc.is_some()
    }

    #[must_use]
    pub fn page_count(&self) -> i32 {
        self.page_count
    }

    /// Resident display list count, for cache observability.
    #[must_use]
    pub fn cached_display_lists(&self) -> usize {
        self.display_lists.len()
    }

    /// Resident text page count, for cache observability.
    #[must_use]
    pub fn cached_text_pages(&self) -> usize {
        self.text_pages.len()
    }

    fn check_page(&self, page: i32) -> Result<(), EngineError> {
        if self.doc.is_none() {
            return Err(EngineError::NotOpen);
        }
        if page < 0 || page >= self.page_count {
            return Err(EngineError::PageIndex {
                page,
                count: self.page_count,
            });
        }
        Ok(())
    }

    /// Load a page handle scoped to one operation.
    fn load_page(&self, page: i32) -> Result<Page, EngineError> {
        self.check_page(page)?;
        let doc = self.doc.as_ref().ok_or(EngineError::NotOpen)?;
        Ok(doc.load_page(page)?)
    }

    /// Page bounds in points. The page handle is transient, not cached.
    pub fn page_info(&self, page: i32) -> Result<PageInfo, EngineError> {
        let loaded = self.load_page(page)?;
        let bounds = loaded.bounds()?;
        Ok(PageInfo {
            width_pts: bounds.x1 - bounds.x0,
            height_pts: bounds.y1 - bounds.y0,
        })
    }

    /// Materialize the page's display list, reporting whether it was
    /// already resident.
    pub fn build_display_list(&mut self, page: i32) -> Result<bool, EngineError> {
        self.check_page(page)?;
        let was_cached = self.display_lists.contains(page);
        if !was_cached {
            self.materialize_display_list(page)?;
        }
        Ok(was_cached)
    }

    fn materialize_display_list(&mut self, page: i32) -> Result<(), EngineError> {
        let loaded = self.load_page(page)?;
        // Annotations are recorded into the list alongside page content.
        let list = loaded.to_display_list(true)?;
        // The display list is self-contained; the page handle can go
        // before the list enters the cache.
        drop(loaded);

        self.display_lists.insert(page, list, |evicted, _| {
            log::debug!("display list cache full, released page {evicted}");
        });
        Ok(())
    }

    /// Cached display list for a page, building it on first request.
    fn ensure_display_list(&mut self, page: i32) -> Result<&DisplayList, EngineError> {
        self.check_page(page)?;
        if !self.display_lists.contains(page) {
            self.materialize_display_list(page)?;
        }
        self.display_lists
            .get(page)
            .ok_or_else(|| EngineError::Internal {
                detail: "display list missing after build".into(),
            })
    }

    /// Cached structured text for a page, building it on first request.
    fn ensure_text_page(&mut self, page: i32) -> Result<&TextPage, EngineError> {
        self.check_page(page)?;
        if !self.text_pages.contains(page) {
            let loaded = self.load_page(page)?;
            let text_page = loaded.to_text_page(TextPageFlags::empty())?;
            drop(loaded);

            self.text_pages.insert(page, text_page, |evicted, _| {
                log::debug!("text page cache full, released page {evicted}");
            });
        }
        self.text_pages
            .get(page)
            .ok_or_else(|| EngineError::Internal {
                detail: "text page missing after build".into(),
            })
    }

    /// Rasterize the whole page at `scale` into packed RGBA.
    pub fn render_page(&mut self, page: i32, scale: f32) -> Result<RgbaBuffer, EngineError> {
        let list = self.ensure_display_list(page)?;
        convert::rasterize_rgba(list, scale)
    }

    /// Rasterize the page at `scale` and crop `rect` out of the result.
    ///
    /// The full page is rasterized for every tile request; only the
    /// display list is reused across tiles of one (page, scale) pair.
    pub fn render_tile(
        &mut self,
        page: i32,
        scale: f32,
        rect: TileRect,
    ) -> Result<RgbaBuffer, EngineError> {
        let full = self.render_page(page, scale)?;
        Ok(convert::extract_tile(&full, rect))
    }

    /// Case-insensitive text search on one page.
    pub fn search(
        &mut self,
        page: i32,
        needle: &str,
        max_hits: usize,
    ) -> Result<Vec<SearchHit>, EngineError> {
        let text_page = self.ensure_text_page(page)?;
        Ok(selection::search_text_page(text_page, needle, max_hits))
    }

    /// Quads covering the text between two page points.
    pub fn highlight(
        &mut self,
        page: i32,
        start: PagePoint,
        end: PagePoint,
    ) -> Result<Vec<Quad>, EngineError> {
        let text_page = self.ensure_text_page(page)?;
        Ok(selection::highlight_selection(text_page, start, end))
    }

    /// Text between two page points.
    pub fn copy_text(
        &mut self,
        page: i32,
        start: PagePoint,
        end: PagePoint,
    ) -> Result<String, EngineError> {
        let text_page = self.ensure_text_page(page)?;
        Ok(selection::copy_selection(text_page, start, end))
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}
