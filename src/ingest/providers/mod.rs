// src/ingest/providers/mod.rs
pub mod feed;
pub mod lovdata;
pub mod stortinget;
