/// External data-source clients.
///
/// Each submodule wraps one upstream source behind plain fetch functions
/// taking a shared blocking HTTP client. Failures are returned per request
/// and isolated per station/metric by the batch drivers in `pipeline`.
///
/// Submodules:
/// - `wrcc` — Western Regional Climate Center daily-normals scraper.
/// - `snap` — SNAP/earthmaps.io community lookup and degree-day grids.

pub mod snap;
pub mod wrcc;
