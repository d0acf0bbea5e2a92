//! photobooth-kiosk library crate.
//!
//! A kiosk client that captures a portrait, lets the visitor pick a
//! character, and runs a remote face swap against it. The binary wires
//! these pieces to a terminal; integration tests drive them with fakes.

pub mod camera;
pub mod config;
pub mod kiosk;
pub mod photo;
pub mod print;
pub mod router;
pub mod selection;
pub mod session;
pub mod swap;
pub mod view;
