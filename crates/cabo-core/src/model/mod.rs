pub mod action;
pub mod deck;
pub mod player;
pub mod rank;
