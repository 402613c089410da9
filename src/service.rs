//! Host-side handle for the render worker thread

use flume::{Receiver, Sender};

use crate::protocol::{PagePoint, Request, RequestId, Response, TileRect};
use crate::worker::run_worker;

/// Default bound on search hits per request.
pub const DEFAULT_SEARCH_HITS: u32 = 256;

/// Spawns the worker thread and correlates requests with responses.
///
/// Requests are answered strictly in submission order, so callers that
/// submit several requests can match responses positionally or via
/// [`Response::request_id`]. Binary payloads are moved through the
/// channel, never copied.
pub struct EngineHandle {
    request_tx: Sender<Request>,
    response_rx: Receiver<Response>,
    next_request_id: u64,
}

impl EngineHandle {
    /// Spawn a worker thread with no document open.
    #[must_use]
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || run_worker(request_rx, response_tx));

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }

    fn submit(&self, request: Request) {
        let _ = self.request_tx.send(request);
    }

    /// Open a document from raw bytes, replacing any open document.
    pub fn open(&mut self, bytes: Vec<u8>) -> RequestId {
        let id = self.next_id();
        self.submit(Request::Open { id, bytes });
        id
    }

    /// Request a page's bounds in points.
    pub fn page_info(&mut self, page: i32) -> RequestId {
        let id = self.next_id();
        self.submit(Request::PageInfo { id, page });
        id
    }

    /// Warm the display list cache for a page.
    pub fn build_display_list(&mut self, page: i32) -> RequestId {
        let id = self.next_id();
        self.submit(Request::BuildDisplayList { id, page });
        id
    }

    /// Render a full page at `scale` as PNG.
    pub fn render_page(&mut self, page: i32, scale: f32) -> RequestId {
        let id = self.next_id();
        self.submit(Request::RenderPage { id, page, scale });
        id
    }

    /// Render a sub-rectangle of a page at `scale` as raw RGBA.
    ///
    /// Tiles of one (page, scale) pair should be requested back to back
    /// so the rasterizations share the cached display list.
    pub fn render_tile(&mut self, page: i32, scale: f32, rect: TileRect) -> RequestId {
        let id = self.next_id();
        self.submit(Request::RenderTile {
            id,
            page,
            scale,
            rect,
        });
        id
    }

    /// Search a page's text, bounded by [`DEFAULT_SEARCH_HITS`].
    pub fn search(&mut self, page: i32, needle: impl Into<String>) -> RequestId {
        self.search_with_limit(page, needle, DEFAULT_SEARCH_HITS)
    }

    /// Search a page's text with an explicit hit bound.
    pub fn search_with_limit(
        &mut self,
        page: i32,
        needle: impl Into<String>,
        max_hits: u32,
    ) -> RequestId {
        let id = self.next_id();
        self.submit(Request::Search {
            id,
            page,
            needle: needle.into(),
            max_hits,
        });
        id
    }

    /// Request highlight quads for the text between two page points.
    pub fn highlight(&mut self, page: i32, start: PagePoint, end: PagePoint) -> RequestId {
        let id = self.next_id();
        self.submit(Request::Highlight {
            id,
            page,
            start,
            end,
        });
        id
    }

    /// Request the text between two page points.
    pub fn copy_text(&mut self, page: i32, start: PagePoint, end: PagePoint) -> RequestId {
        let id = self.next_id();
        self.submit(Request::CopyText {
            id,
            page,
            start,
            end,
        });
        id
    }

    /// Release the open document and its caches.
    pub fn destroy(&mut self) -> RequestId {
        let id = self.next_id();
        self.submit(Request::Destroy { id });
        id
    }

    /// Block until the next response arrives.
    ///
    /// Returns `None` once the worker has terminated.
    #[must_use]
    pub fn recv(&self) -> Option<Response> {
        self.response_rx.recv().ok()
    }

    /// Drain any responses that have already arrived.
    pub fn poll(&self) -> Vec<Response> {
        let mut responses = Vec::new();
        while let Ok(response) = self.response_rx.try_recv() {
            responses.push(response);
        }
        responses
    }

    /// Response receiver for async or select-based usage.
    #[must_use]
    pub fn responses(&self) -> &Receiver<Response> {
        &self.response_rx
    }

    /// Terminate the worker loop.
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(Request::Shutdown);
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
