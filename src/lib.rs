//! Product Catalog Library
//!
//! Persistent data model for a product catalog: manufacturers, brands, a
//! category tree, variant axes and values, products, product variants and
//! product images, on top of sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod media;
pub mod services;
pub mod slug;

pub use errors::ServiceError;
pub use migrations::Migrator;
pub use services::{CatalogServices, Page, Paginated};
