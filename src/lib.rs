//! Off-main-thread PDF page rendering.
//!
//! A dedicated worker thread owns one open document at a time and serves
//! typed requests over channels: page info, display-list warming, full
//! page rendering (PNG), tile rendering (raw RGBA), text search, and
//! point-to-point text selection. Per-page display lists and structured
//! text are kept in small bounded LRU caches; every native resource is
//! released deterministically on eviction, re-open, and destroy.

mod cache;
mod convert;
mod protocol;
mod selection;
mod service;
mod session;
mod worker;

pub use cache::BoundedCache;
pub use convert::{RgbaBuffer, extract_tile, repack_rgba};
pub use protocol::{
    EngineError, PageInfo, PagePoint, Quad, Request, RequestId, Response, SearchHit, TileRect,
};
pub use service::{DEFAULT_SEARCH_HITS, EngineHandle};
pub use session::DocumentSession;
pub use worker::run_worker;
