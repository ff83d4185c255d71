pub mod comic;
pub mod humor;
pub mod loaders;
pub mod script;

pub use comic::{Comic, ComicPatch, ComicStatus, NewComic};
pub use humor::HumorStyle;
pub use loaders::{load_all_comic_files, load_comic_file, save_comic_file};
pub use script::{DraftPage, DraftPanel, Page, Panel, ScriptDraft};
