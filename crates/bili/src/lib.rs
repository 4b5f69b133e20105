//! Client for the Bilibili web API.
//!
//! Covers the three endpoints a downloader needs: the unauthenticated nav
//! endpoint (WBI key fragments), the video view endpoint (metadata lookup by
//! BV id) and the WBI-signed playurl endpoint (DASH stream catalog).

pub mod client;
pub mod error;
pub mod models;
pub mod playurl;
pub mod video;
pub mod wbi;

pub use client::{BASE_URL, DEFAULT_UA, default_client};
pub use error::BiliError;
pub use playurl::{Catalog, MediaKind, StreamDescriptor, fetch_catalog};
pub use video::{VideoIdentity, resolve_video};
pub use wbi::WbiKeys;
