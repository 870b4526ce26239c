pub mod api;
pub mod config;
pub mod figma;
pub mod gemini;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod runs;
