pub mod image;
pub mod media;
pub mod music;
pub mod text;
pub mod video;

pub use image::{ImageAdapter, ImageProvider};
pub use media::{Executor, MediaAdapter, MediaProvider};
pub use music::{MusicAdapter, MusicProvider};
pub use text::TextAdapter;
pub use video::{VideoAdapter, VideoProvider};
