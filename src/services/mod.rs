pub mod admission;
pub mod diagnostics;
pub mod login_flow;
pub mod project_settings;
pub mod prompt_generator;
pub mod recovery;
pub mod session_manager;

pub use admission::AdmissionController;
pub use diagnostics::Diagnostics;
pub use login_flow::{LoginFlow, LoginState};
pub use prompt_generator::{generate_prompts, LlmPromptGenerator, PromptGenerator};
pub use recovery::RecoveryManager;
pub use session_manager::SessionManager;
