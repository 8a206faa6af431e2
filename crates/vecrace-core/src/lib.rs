pub mod effect;
pub mod events;
pub mod geometry;
pub mod notice;
pub mod player;
pub mod time;
