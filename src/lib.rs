//! Scan folders into size/count trees filtered by file extension, and keep an
//! aggregate store of the scanned roots consistent under additions and removals.

pub mod app;
pub mod config;
pub mod core;
pub mod utils;
