pub mod api;
pub mod config;
pub mod crawler;
pub mod data_models;
pub mod enricher;
pub mod extractor;
pub mod search;
pub mod shutdown;
pub mod tool;
