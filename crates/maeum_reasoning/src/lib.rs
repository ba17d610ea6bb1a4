pub mod api_types;
pub mod classifier;
pub mod journal;
pub mod llm;
pub mod mode;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod session;

pub use classifier::HttpEmotionClassifier;
pub use journal::{DiaryJournal, JournalEntry, JournalError};
pub use mode::{ModeDetector, ModeStrategy};
pub use prompts::PromptAssembler;
pub use session::{ConversationSession, Stage, StageWarning, TurnContext, TurnError, TurnOutcome};
