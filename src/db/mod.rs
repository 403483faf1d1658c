//! Persistence gateway for questions and their choices.
//!
//! A `QuestionStore` hands out `UnitOfWork`s: one pooled session with an open
//! transaction. The write flow itself lives in `QuestionStore::create_question`
//! so every backend runs the same insert sequence.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::{Choice, NewChoice, Question, QuestionCreated};

pub use memory::InMemoryStore;
pub use postgres::Database;

/// A session against the store with an open transaction.
///
/// Writes become visible to other sessions only after `commit`. Dropping a unit
/// of work without committing discards its writes and releases the session.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Inserts a question row and flushes it, returning the generated id.
    async fn insert_question(&mut self, question_text: &str) -> Result<i32, StoreError>;

    /// Inserts a choice row referencing `question_id`, returning the generated id.
    async fn insert_choice(&mut self, question_id: i32, choice: &NewChoice) -> Result<i32, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Acquires a session and begins a transaction on it.
    async fn begin<'a>(&'a self) -> Result<Box<dyn UnitOfWork + 'a>, StoreError>;

    /// Round-trips to the store without touching any table.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Writes one question and all of its choices as a single transaction.
    ///
    /// Choices are inserted in input order after the question has its id. Any
    /// failure rolls the whole unit back, so a question never survives without
    /// the choices it was submitted with.
    async fn create_question(
        &self,
        question_text: &str,
        choices: &[NewChoice],
    ) -> Result<QuestionCreated, StoreError> {
        let mut uow = self.begin().await?;

        match write_question(&mut *uow, question_text, choices).await {
            Ok(created) => {
                uow.commit().await?;
                debug!(question_id = created.question.id, "committed");
                Ok(created)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!("Rollback after failed question write also failed: {}", rollback_err);
                }
                debug!("question write failed, rolled back: {}", err);
                Err(err)
            }
        }
    }
}

async fn write_question(
    uow: &mut (dyn UnitOfWork + '_),
    question_text: &str,
    choices: &[NewChoice],
) -> Result<QuestionCreated, StoreError> {
    let question_id = uow.insert_question(question_text).await?;
    debug!(question_id, "question written");

    let mut written = Vec::with_capacity(choices.len());
    for choice in choices {
        let id = uow.insert_choice(question_id, choice).await?;
        written.push(Choice {
            id,
            choice_txt: choice.choice_txt.clone(),
            is_correct: choice.is_correct,
            question_id,
        });
    }
    debug!(question_id, count = written.len(), "choices written");

    Ok(QuestionCreated {
        question: Question {
            id: question_id,
            question_text: question_text.to_string(),
        },
        choices: written,
    })
}
