pub mod file_client;
pub mod http;
pub mod image_client;
pub mod llm_client;
pub mod store_client;

pub use file_client::FileClient;
pub use image_client::ImageClient;
pub use llm_client::LlmClient;
pub use store_client::StoreClient;
