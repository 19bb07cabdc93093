pub mod service;

pub use service::ImageService;
