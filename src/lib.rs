//! Tile board service: personal dashboards of rich-text tiles with
//! drag-and-drop ordering, JSON export/import, read-only share links,
//! clipboard formats and a donation checkout.
//!
//! ARCHITECTURE
//! ============
//! `routes` translates HTTP into calls on `services`, which hold the
//! business rules and reach storage only through the `data` traits.
//! `main` picks the backend (`data::postgres` with `DATABASE_URL`,
//! `data::memory` without) and wires everything into `state::AppState`.

pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod model;
pub mod pages;
pub mod routes;
pub mod services;
pub mod state;
