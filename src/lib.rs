pub mod app;
pub mod audio;
pub mod camera;
pub mod collision;
pub mod compute;
pub mod config;
pub mod display;
pub mod engine;
pub mod entities;
pub mod error;
pub mod game;
pub mod gesture;
pub mod input;
pub mod level;
pub mod mode;
pub mod spawner;
pub mod sprites;
pub mod timer;
