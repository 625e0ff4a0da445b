//! Core library for ytmusic-playlist-importer
pub mod api;
pub mod config;
pub mod delay;
pub mod error;
pub mod importer;
pub mod models;
pub mod reconcile;
pub mod resolver;
pub mod sanitize;
