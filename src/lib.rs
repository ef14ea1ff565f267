//! Scrim Rooms - real-time room coordination for scrim matchmaking
//!
//! Players gather in a room, are drafted onto two teams, pick sides, and
//! talk over channel-scoped chat and voice. The durable room aggregate is
//! the source of truth; live connections are a derived view re-synced after
//! every change.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
