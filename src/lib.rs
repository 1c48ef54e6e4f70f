/// Degree-day climatology and bias-correction service.
///
/// Builds observed degree-day climatologies from WRCC daily normals and
/// delta-corrects SNAP model projections against them. The stages run as
/// subcommands of the `degday` binary or as library calls through
/// `pipeline`.

pub mod analysis;
pub mod climatology;
pub mod config;
pub mod degree_days;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod stations;
pub mod store;
pub mod verify;
