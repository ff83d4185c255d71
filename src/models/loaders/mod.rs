pub mod json_loader;

pub use json_loader::{load_all_comic_files, load_comic_file, save_comic_file};
