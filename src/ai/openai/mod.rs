pub mod client;
pub mod poem;
pub mod types;

pub use poem::OpenAiPoemClient;
