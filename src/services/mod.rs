pub mod asset_downloader;
pub mod generation;
pub mod storage;
pub mod store;

pub use asset_downloader::{AssetDownloader, DownloadReport};
pub use generation::{GenerationProvider, OpenAiGenerationProvider};
pub use storage::{FileStorage, LocalFileStorage, RemoteFileStorage};
pub use store::{ComicStore, FileComicStore, MemoryComicStore, RemoteComicStore};
