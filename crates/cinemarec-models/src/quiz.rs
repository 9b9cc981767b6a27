use crate::upload::ImageUpload;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Every question offers exactly this many answer choices
pub const ANSWERS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: Option<u64>,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub answers: Vec<String>,
    /// Index into `answers`
    pub correct_answer: usize,
}

impl Question {
    pub fn is_correct(&self, answer: usize) -> bool {
        self.correct_answer == answer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator_email: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, alias = "public")]
    pub is_public: bool,
}

impl Quiz {
    pub fn is_created_by(&self, email: &str) -> bool {
        self.creator_email
            .as_deref()
            .is_some_and(|creator| creator.eq_ignore_ascii_case(email))
    }
}

/// Stored outcome of one completed play
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub quiz_id: u64,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

/// Payload posted once a play completes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuizResult {
    pub quiz_id: u64,
    pub score: u32,
    pub total_questions: u32,
}

/// Editable form of a quiz, sent to the service as indexed multipart fields
#[derive(Debug, Clone, Default)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub text: String,
    pub answers: Vec<String>,
    pub correct_answer: usize,
    /// Newly attached image, replaces `image_url` when present
    pub image: Option<ImageUpload>,
    /// Image already stored by the service
    pub image_url: Option<String>,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            answers: vec![String::new(); ANSWERS_PER_QUESTION],
            correct_answer: 0,
            image: None,
            image_url: None,
        }
    }
}

impl From<&Quiz> for QuizDraft {
    fn from(quiz: &Quiz) -> Self {
        Self {
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            is_public: quiz.is_public,
            questions: quiz
                .questions
                .iter()
                .map(|q| QuestionDraft {
                    text: q.text.clone(),
                    answers: q.answers.clone(),
                    correct_answer: q.correct_answer,
                    image: None,
                    image_url: q.image_url.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_accepts_public_alias() {
        let quiz: Quiz = serde_json::from_str(
            r#"{"id":3,"title":"Nolan","creatorEmail":"Ann@x.io","public":true,
                "questions":[{"text":"Year of Memento?","answers":["1998","2000","2002","2004"],"correctAnswer":1}]}"#,
        )
        .unwrap();
        assert!(quiz.is_public);
        assert!(quiz.is_created_by("ann@x.io"));
        assert!(quiz.questions[0].is_correct(1));
    }

    #[test]
    fn test_draft_from_quiz_keeps_stored_images() {
        let quiz = Quiz {
            id: 1,
            title: "T".to_string(),
            description: String::new(),
            creator_email: None,
            questions: vec![Question {
                id: Some(9),
                text: "Q".to_string(),
                image_url: Some("http://img/q.png".to_string()),
                answers: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: 2,
            }],
            is_public: false,
        };
        let draft = QuizDraft::from(&quiz);
        assert_eq!(draft.questions[0].image_url.as_deref(), Some("http://img/q.png"));
        assert_eq!(draft.questions[0].correct_answer, 2);
        assert!(draft.questions[0].image.is_none());
    }
}
