pub mod health;
pub mod image;
pub mod judge;
pub mod search;

pub use health::health_handler;
pub use image::{extract_image_handler, image_proxy_handler};
pub use judge::judge_handler;
pub use search::search_handler;
