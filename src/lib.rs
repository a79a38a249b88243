//! StudyMate backend — a study-assistant service answering questions and
//! building quizzes strictly from a student's own uploaded material.

pub mod config;
pub mod core;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
