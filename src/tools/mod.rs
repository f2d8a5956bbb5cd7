//! 工具箱：Tool trait、注册表与图片搜索工具

pub mod registry;
pub mod unsplash_images;

pub use registry::{Tool, ToolRegistry};
pub use unsplash_images::{ImageSearchArgs, UnsplashImagesTool, GET_IMAGES_TOOL};
