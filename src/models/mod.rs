// Models module

pub mod question;

// Re-export commonly used types
pub use question::{
    Choice, CreateQuestionRequest, CreateQuestionResponse, NewChoice, Question, QuestionCreated,
};
