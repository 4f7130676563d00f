pub mod capture;
pub mod config;
pub mod console_display;
pub mod coordinator;
pub mod mode;
pub mod redraw;
pub mod registry;
pub mod render;
pub mod scene_writer;
pub mod script;
pub mod simulator;
pub mod timeline;
pub mod types;
