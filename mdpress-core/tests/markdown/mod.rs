//! Markdown stage tests
//!
//! Extension lifecycle, ordering and reference numbering through the public parser API.

mod footnote_order;
mod pipeline;
