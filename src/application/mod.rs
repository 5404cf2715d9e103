pub mod use_cases;

pub use use_cases::chat::{ChatSession, ChatUseCase};
pub use use_cases::dashboard::{DashboardSession, DashboardView};
pub use use_cases::dataset_analysis::DatasetAnalysisUseCase;
