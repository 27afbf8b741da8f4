//! Hyperspectral and thermal pixel inspection.
//!
//! The GUI in `main.rs` is a thin adapter over these modules: it loads a
//! [`session::Scene`], renders a band, forwards clicks through
//! [`input::step`] and shows the [`session::PixelReport`] produced by
//! [`session::Scene::inspect`].

pub mod config;
pub mod data;
pub mod index;
pub mod input;
pub mod report;
pub mod session;
pub mod smoothing;
