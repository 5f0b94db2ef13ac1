pub mod csv_loader;

pub use csv_loader::{
    check_csv_path, find_latest_csv, load_tasks, read_paragraphs, read_prompt_records,
    write_prompt_records,
};
