//! Platform adapter tests
//!
//! Full renders through the publisher and chain-order checks for the WeChat adapter.

mod cards;
mod links;
mod wechat;
