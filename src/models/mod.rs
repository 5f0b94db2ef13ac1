pub mod loaders;
pub mod task;

pub use loaders::{find_latest_csv, load_tasks, read_paragraphs, write_prompt_records};
pub use task::{GenerationTask, PromptBatch, PromptRecord};
