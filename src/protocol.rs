//! Request and response types for the render worker

use serde::{Deserialize, Serialize};

/// Unique identifier correlating a request with its single response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Page dimensions in point units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub width_pts: f32,
    pub height_pts: f32,
}

/// A point in unscaled page coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned sub-rectangle of a rendered page, in device pixels.
///
/// The origin may be negative and the extent may overshoot the rendered
/// page; extraction clamps to the intersection instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Four-corner region descriptor for glyph and match bounds on a page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub ulx: f32,
    pub uly: f32,
    pub urx: f32,
    pub ury: f32,
    pub llx: f32,
    pub lly: f32,
    pub lrx: f32,
    pub lry: f32,
}

impl Quad {
    /// Axis-aligned quad covering the rectangle (x0, y0)-(x1, y1).
    #[must_use]
    pub fn from_rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            ulx: x0,
            uly: y0,
            urx: x1,
            ury: y0,
            llx: x0,
            lly: y1,
            lrx: x1,
            lry: y1,
        }
    }
}

/// One search match: the quads covering every region the match spans.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub quads: Vec<Quad>,
}

/// Errors surfaced to the caller as typed error responses.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The supplied bytes were not a parsable document.
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    /// Page index outside the open document's valid range.
    #[error("page index {page} out of range 0..{count}")]
    PageIndex { page: i32, count: i32 },

    /// A page-scoped operation was attempted with no document open.
    #[error("no document open")]
    NotOpen,

    /// Native library failure during rasterization or extraction.
    #[error("render engine: {0}")]
    Engine(#[from] mupdf::error::Error),

    /// PNG encoding failure.
    #[error("image encode: {0}")]
    Encode(#[from] image::ImageError),

    /// Broken internal invariant; should not happen.
    #[error("{detail}")]
    Internal { detail: String },
}

/// Requests accepted by the render worker.
///
/// A closed sum: adding a request kind forces every dispatch site to
/// handle it. Each variant carries the id echoed in its response.
#[derive(Debug)]
pub enum Request {
    /// Open a document from raw bytes, replacing any open document.
    Open { id: RequestId, bytes: Vec<u8> },

    /// Report a page's bounds in points. The page is loaded transiently.
    PageInfo { id: RequestId, page: i32 },

    /// Materialize the page's display list into the cache.
    BuildDisplayList { id: RequestId, page: i32 },

    /// Rasterize the whole page at `scale` and encode it as PNG.
    RenderPage {
        id: RequestId,
        page: i32,
        scale: f32,
    },

    /// Rasterize the page at `scale` and crop `rect` out of it as raw RGBA.
    RenderTile {
        id: RequestId,
        page: i32,
        scale: f32,
        rect: TileRect,
    },

    /// Find occurrences of `needle` in the page text.
    Search {
        id: RequestId,
        page: i32,
        needle: String,
        max_hits: u32,
    },

    /// Quads covering the text between two page points.
    Highlight {
        id: RequestId,
        page: i32,
        start: PagePoint,
        end: PagePoint,
    },

    /// The text between two page points as a string.
    CopyText {
        id: RequestId,
        page: i32,
        start: PagePoint,
        end: PagePoint,
    },

    /// Release the document and both caches. Never fails.
    Destroy { id: RequestId },

    /// Terminate the worker loop. No response is sent.
    Shutdown,
}

/// Responses produced by the render worker, one per request.
#[derive(Debug)]
pub enum Response {
    Opened {
        id: RequestId,
        page_count: i32,
    },

    /// `page` echoes the requested index so a caller that has since moved
    /// on can discard the stale response.
    PageInfo {
        id: RequestId,
        page: i32,
        info: PageInfo,
    },

    /// `cached` reports whether the display list was already resident.
    DisplayListBuilt {
        id: RequestId,
        cached: bool,
    },

    PageRendered {
        id: RequestId,
        width: u32,
        height: u32,
        png: Vec<u8>,
    },

    /// Raw tightly packed RGBA bytes, possibly zero-sized after clamping.
    TileRendered {
        id: RequestId,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },

    SearchResults {
        id: RequestId,
        hits: Vec<SearchHit>,
    },

    HighlightQuads {
        id: RequestId,
        quads: Vec<Quad>,
    },

    CopiedText {
        id: RequestId,
        text: String,
    },

    Destroyed {
        id: RequestId,
    },

    Error {
        id: RequestId,
        error: EngineError,
    },
}

impl Response {
    /// Id of the request this response answers.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Opened { id, .. }
            | Self::PageInfo { id, .. }
            | Self::DisplayListBuilt { id, .. }
            | Self::PageRendered { id, .. }
            | Self::TileRendered { id, .. }
            | Self::SearchResults { id, .. }
            | Self::HighlightQuads { id, .. }
            | Self::CopiedText { id, .. }
            | Self::Destroyed { id }
            | Self::Error { id, .. } => *id,
        }
    }
}
