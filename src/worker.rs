//! Render worker loop - runs in a dedicated thread

use flume::{Receiver, Sender};

use crate::convert;
use crate::protocol::{EngineError, Request, RequestId, Response};
use crate::session::DocumentSession;

/// Hard ceiling on search hits per request, protecting the worker from
/// pathological pages regardless of what the caller asked for.
const SEARCH_HITS_CEILING: usize = 1024;

/// Main worker loop: one request at a time, one response per request.
///
/// Requests are processed strictly in arrival order; the native library
/// is never invoked concurrently against the same document. Failures are
/// converted to error responses here - nothing propagates past this loop.
pub fn run_worker(requests: Receiver<Request>, responses: Sender<Response>) {
    let mut session = DocumentSession::new();

    for request in requests.iter() {
        let response = match request {
            Request::Shutdown => break,

            Request::Open { id, bytes } => reply(id, session.open(&bytes), |page_count| {
                Response::Opened { id, page_count }
            }),

            Request::PageInfo { id, page } => {
                reply(id, session.page_info(page), |info| Response::PageInfo {
                    id,
                    page,
                    info,
                })
            }

            Request::BuildDisplayList { id, page } => {
                reply(id, session.build_display_list(page), |cached| {
                    Response::DisplayListBuilt { id, cached }
                })
            }

            Request::RenderPage { id, page, scale } => {
                reply(id, render_page_png(&mut session, page, scale), |(width, height, png)| {
                    Response::PageRendered {
                        id,
                        width,
                        height,
                        png,
                    }
                })
            }

            Request::RenderTile {
                id,
                page,
                scale,
                rect,
            } => reply(id, session.render_tile(page, scale, rect), |tile| {
                Response::TileRendered {
                    id,
                    width: tile.width,
                    height: tile.height,
                    rgba: tile.pixels,
                }
            }),

            Request::Search {
                id,
                page,
                needle,
                max_hits,
            } => {
                let max_hits = (max_hits as usize).min(SEARCH_HITS_CEILING);
                reply(id, session.search(page, &needle, max_hits), |hits| {
                    Response::SearchResults { id, hits }
                })
            }

            Request::Highlight {
                id,
                page,
                start,
                end,
            } => reply(id, session.highlight(page, start, end), |quads| {
                Response::HighlightQuads { id, quads }
            }),

            Request::CopyText {
                id,
                page,
                start,
                end,
            } => reply(id, session.copy_text(page, start, end), |text| {
                Response::CopiedText { id, text }
            }),

            Request::Destroy { id } => {
                session.destroy();
                Response::Destroyed { id }
            }
        };

        if responses.send(response).is_err() {
            break;
        }
    }

    session.destroy();
}

fn reply<T>(
    id: RequestId,
    result: Result<T, EngineError>,
    ok: impl FnOnce(T) -> Response,
) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(error) => {
            log::debug!("request {} failed: {error}", id.0);
            Response::Error { id, error }
        }
    }
}

fn render_page_png(
    session: &mut DocumentSession,
    page: i32,
    scale: f32,
) -> Result<(u32, u32, Vec<u8>), EngineError> {
    let full = session.render_page(page, scale)?;
    let (width, height) = (full.width, full.height);
    let png = convert::encode_png(full)?;
    Ok((width, height, png))
}
