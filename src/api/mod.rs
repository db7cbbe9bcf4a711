//! Resource endpoints. Each method builds a path and delegates to
//! [`Chartmetric::get`](crate::Chartmetric::get).

mod artist;
mod curator;
mod playlist;
mod track;

pub use playlist::DEFAULT_PLAYLIST_SPAN;
