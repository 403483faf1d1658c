use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{QuestionStore, UnitOfWork};
use crate::error::StoreError;
use crate::models::{Choice, NewChoice, Question};

#[derive(Debug, Default)]
struct Tables {
    questions: Vec<Question>,
    choices: Vec<Choice>,
    last_question_id: i32,
    last_choice_id: i32,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    choice_insert: Option<(usize, StoreError)>,
}

/// In-memory question store for testing.
///
/// Behaves like the PostgreSQL store as far as the write flow can observe:
/// ids come from never-reused sequences, choices must reference an existing
/// question, and nothing is visible until commit. Faults can be injected to
/// simulate a lost connection or a failing insert.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every store operation fails with `StoreError::Connection`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.faults.write().await.unavailable = unavailable;
    }

    /// Makes the `index`-th choice insert (0-based) of every later unit of work fail with `error`.
    pub async fn fail_choice_insert_at(&self, index: usize, error: StoreError) {
        self.faults.write().await.choice_insert = Some((index, error));
    }

    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    /// Committed questions in insertion order.
    pub async fn questions(&self) -> Vec<Question> {
        self.tables.read().await.questions.clone()
    }

    /// Committed choices in insertion order.
    pub async fn choices(&self) -> Vec<Choice> {
        self.tables.read().await.choices.clone()
    }

    pub async fn choices_for(&self, question_id: i32) -> Vec<Choice> {
        self.tables
            .read()
            .await
            .choices
            .iter()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect()
    }

    async fn check_available(&self) -> Result<(), StoreError> {
        if self.faults.read().await.unavailable {
            return Err(StoreError::connection("connection refused: store is unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for InMemoryStore {
    async fn begin<'a>(&'a self) -> Result<Box<dyn UnitOfWork + 'a>, StoreError> {
        self.check_available().await?;
        let choice_fault = self.faults.read().await.choice_insert.clone();

        Ok(Box::new(MemoryUnitOfWork {
            store: self,
            pending_questions: Vec::new(),
            pending_choices: Vec::new(),
            choice_fault,
            open: true,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available().await
    }
}

struct MemoryUnitOfWork<'a> {
    store: &'a InMemoryStore,
    pending_questions: Vec<Question>,
    pending_choices: Vec<Choice>,
    choice_fault: Option<(usize, StoreError)>,
    open: bool,
}

impl MemoryUnitOfWork<'_> {
    async fn check_open(&self) -> Result<(), StoreError> {
        if !self.open {
            return Err(StoreError::Query("transaction already finished".to_string()));
        }
        self.store.check_available().await
    }
}

#[async_trait]
impl<'a> UnitOfWork for MemoryUnitOfWork<'a> {
    async fn insert_question(&mut self, question_text: &str) -> Result<i32, StoreError> {
        self.check_open().await?;

        let id = {
            let mut tables = self.store.tables.write().await;
            tables.last_question_id += 1;
            tables.last_question_id
        };

        self.pending_questions.push(Question {
            id,
            question_text: question_text.to_string(),
        });
        Ok(id)
    }

    async fn insert_choice(&mut self, question_id: i32, choice: &NewChoice) -> Result<i32, StoreError> {
        self.check_open().await?;

        if let Some((index, error)) = &self.choice_fault {
            if *index == self.pending_choices.len() {
                return Err(error.clone());
            }
        }

        let mut tables = self.store.tables.write().await;
        let parent_exists = self.pending_questions.iter().any(|q| q.id == question_id)
            || tables.questions.iter().any(|q| q.id == question_id);
        if !parent_exists {
            return Err(StoreError::integrity(format!(
                "insert on table \"choices\" violates foreign key constraint: question {} does not exist",
                question_id
            )));
        }

        tables.last_choice_id += 1;
        let id = tables.last_choice_id;
        drop(tables);

        self.pending_choices.push(Choice {
            id,
            choice_txt: choice.choice_txt.clone(),
            is_correct: choice.is_correct,
            question_id,
        });
        Ok(id)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.check_open().await?;

        let mut tables = self.store.tables.write().await;
        tables.questions.append(&mut self.pending_questions);
        tables.choices.append(&mut self.pending_choices);
        self.open = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.pending_questions.clear();
        self.pending_choices.clear();
        self.open = false;
        Ok(())
    }
}
