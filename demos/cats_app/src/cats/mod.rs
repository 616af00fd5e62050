// gantry/demos/cats_app/src/cats/mod.rs

pub mod controller;
pub mod service;

pub use controller::CatsController;
pub use service::CatsService;
