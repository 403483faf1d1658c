use serde::{Deserialize, Serialize};

/// 永続化済みの設問。`id` は `questions.id` (SERIAL) で採番される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i32,
    pub question_text: String,
}

/// 設問にぶら下がる選択肢。`question_id` は `questions.id` への外部キー。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: i32,
    pub choice_txt: String,
    pub is_correct: bool,
    pub question_id: i32,
}

/// 設問作成 API が受け取るペイロード。
/// 選択肢の配列はリクエスト上 `choice` という単数形のキーで届く点に注意。
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub question_text: String,
    pub choice: Vec<NewChoice>,
}

/// リクエスト内の 1 選択肢。`is_correct` は入力側では必須。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewChoice {
    pub choice_txt: String,
    pub is_correct: bool,
}

/// 書き込みが成功したときにストアが返す結果。選択肢は入力順に並ぶ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCreated {
    pub question: Question,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateQuestionResponse {
    pub message: String,
}

impl CreateQuestionResponse {
    pub fn created() -> Self {
        CreateQuestionResponse {
            message: "Question created successfully".to_string(),
        }
    }
}

impl CreateQuestionRequest {
    /// 型レベルで表せないルールだけをここで検証する。
    /// 文字数や「正解が 1 つ以上」といった制約は課さない。
    pub fn validate(&self) -> Result<(), String> {
        if self.choice.is_empty() {
            return Err("choice: at least one choice is required".to_string());
        }

        Ok(())
    }
}
