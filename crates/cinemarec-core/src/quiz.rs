//! Quizzes tab: linear play with delayed advance, authoring, and recent results.

use crate::error::{ViewError, ViewResult};
use crate::session::Session;
use cinemarec_models::{NewQuizResult, Question, Quiz, QuizDraft, QuizResult, ANSWERS_PER_QUESTION};
use cinemarec_services::QuizzesApi;
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many past results the results panel shows
pub const RECENT_RESULTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFeedback {
    Correct,
    Incorrect { correct_answer: usize },
}

impl AnswerFeedback {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerFeedback::Correct)
    }
}

/// One run through a quiz.
///
/// Questions are answered strictly in order: select, submit, then advance. Each question
/// scores at most once and the final result is handed out once.
#[derive(Debug, Clone)]
pub struct QuizPlay {
    quiz: Quiz,
    index: usize,
    selected: Option<usize>,
    feedback: Option<AnswerFeedback>,
    score: u32,
    finished: bool,
    result_taken: bool,
}

impl QuizPlay {
    pub fn new(quiz: Quiz) -> ViewResult<Self> {
        if quiz.questions.is_empty() {
            return Err(ViewError::validation(format!("Quiz '{}' has no questions", quiz.title)));
        }
        Ok(Self {
            quiz,
            index: 0,
            selected: None,
            feedback: None,
            score: 0,
            finished: false,
            result_taken: false,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn current(&self) -> Option<&Question> {
        (!self.finished).then(|| self.quiz.questions.get(self.index)).flatten()
    }

    /// 1-based position of the current question and the question count
    pub fn progress(&self) -> (usize, usize) {
        (self.index + 1, self.quiz.questions.len())
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn feedback(&self) -> Option<AnswerFeedback> {
        self.feedback
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.quiz.questions.len() as u32
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn select(&mut self, answer: usize) -> ViewResult<()> {
        let question = self
            .current()
            .ok_or_else(|| ViewError::validation("Quiz is already finished"))?;
        if self.feedback.is_some() {
            return Err(ViewError::validation("Answer already submitted"));
        }
        if answer >= question.answers.len() {
            return Err(ViewError::validation(format!("No answer {}", answer + 1)));
        }
        self.selected = Some(answer);
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        !self.finished && self.selected.is_some() && self.feedback.is_none()
    }

    /// Reveal correctness of the selected answer, scoring it once
    pub fn submit(&mut self) -> ViewResult<AnswerFeedback> {
        if !self.can_submit() {
            return Err(ViewError::validation("Select an answer first"));
        }
        let (Some(question), Some(selected)) = (self.current(), self.selected) else {
            return Err(ViewError::validation("Select an answer first"));
        };
        let feedback = if question.is_correct(selected) {
            AnswerFeedback::Correct
        } else {
            AnswerFeedback::Incorrect {
                correct_answer: question.correct_answer,
            }
        };
        if feedback.is_correct() {
            self.score += 1;
        }
        self.feedback = Some(feedback);
        Ok(feedback)
    }

    /// Move past a submitted question; the last one finishes the play
    pub fn advance(&mut self) -> ViewResult<()> {
        if self.feedback.is_none() {
            return Err(ViewError::validation("Submit an answer before moving on"));
        }
        self.selected = None;
        self.feedback = None;
        if self.index + 1 >= self.quiz.questions.len() {
            self.finished = true;
        } else {
            self.index += 1;
        }
        Ok(())
    }

    /// The completed result, handed out exactly once
    pub fn take_result(&mut self) -> Option<NewQuizResult> {
        if !self.finished || self.result_taken {
            return None;
        }
        self.result_taken = true;
        Some(NewQuizResult {
            quiz_id: self.quiz.id,
            score: self.score,
            total_questions: self.total(),
        })
    }
}

/// Check an authored quiz before it is sent
pub fn validate_quiz(draft: &QuizDraft) -> ViewResult<()> {
    if draft.title.trim().is_empty() {
        return Err(ViewError::validation("Quiz title is required"));
    }
    if draft.questions.is_empty() {
        return Err(ViewError::validation("Add at least one question"));
    }
    for (i, question) in draft.questions.iter().enumerate() {
        let number = i + 1;
        if question.text.trim().is_empty() {
            return Err(ViewError::validation(format!("Question {} needs text", number)));
        }
        if question.answers.len() != ANSWERS_PER_QUESTION {
            return Err(ViewError::validation(format!(
                "Question {} needs exactly {} answers",
                number, ANSWERS_PER_QUESTION
            )));
        }
        if question.answers.iter().any(|a| a.trim().is_empty()) {
            return Err(ViewError::validation(format!("Question {} has an empty answer", number)));
        }
        if question.correct_answer >= ANSWERS_PER_QUESTION {
            return Err(ViewError::validation(format!(
                "Question {} has no valid correct answer",
                number
            )));
        }
    }
    Ok(())
}

/// Most recent results first, capped to [`RECENT_RESULTS`]
pub fn recent_results(mut results: Vec<QuizResult>) -> Vec<QuizResult> {
    results.sort_by_key(|r| Reverse(r.completed_at));
    results.truncate(RECENT_RESULTS);
    results
}

pub struct QuizzesView {
    api: Arc<dyn QuizzesApi>,
    advance_delay: Duration,
    quizzes: Vec<Quiz>,
    results: Vec<QuizResult>,
    play: Option<QuizPlay>,
}

impl QuizzesView {
    pub fn new(api: Arc<dyn QuizzesApi>, advance_delay: Duration) -> Self {
        Self {
            api,
            advance_delay,
            quizzes: Vec::new(),
            results: Vec::new(),
            play: None,
        }
    }

    pub async fn load(&mut self) -> ViewResult<&[Quiz]> {
        self.quizzes = self.api.list_quizzes().await?;
        debug!("Loaded {} quizzes", self.quizzes.len());
        Ok(&self.quizzes)
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    pub fn find(&self, quiz_id: u64) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.id == quiz_id)
    }

    pub async fn load_results(&mut self, session: &Session) -> ViewResult<&[QuizResult]> {
        self.results = recent_results(self.api.results(session.email()).await?);
        Ok(&self.results)
    }

    pub fn results(&self) -> &[QuizResult] {
        &self.results
    }

    /// Quizzes the signed-in user may edit
    pub fn editable<'a>(&'a self, session: &'a Session) -> impl Iterator<Item = &'a Quiz> {
        self.quizzes.iter().filter(move |q| q.is_created_by(session.email()))
    }

    pub fn start(&mut self, quiz_id: u64) -> ViewResult<&mut QuizPlay> {
        let quiz = self
            .find(quiz_id)
            .cloned()
            .ok_or_else(|| ViewError::validation(format!("Quiz {} not found", quiz_id)))?;
        info!("Starting quiz '{}'", quiz.title);
        Ok(self.play.insert(QuizPlay::new(quiz)?))
    }

    pub fn play(&self) -> Option<&QuizPlay> {
        self.play.as_ref()
    }

    pub fn play_mut(&mut self) -> Option<&mut QuizPlay> {
        self.play.as_mut()
    }

    fn active_play(&mut self) -> ViewResult<&mut QuizPlay> {
        self.play
            .as_mut()
            .ok_or_else(|| ViewError::validation("No quiz in progress"))
    }

    pub fn select(&mut self, answer: usize) -> ViewResult<()> {
        self.active_play()?.select(answer)
    }

    pub fn submit(&mut self) -> ViewResult<AnswerFeedback> {
        self.active_play()?.submit()
    }

    /// Wait the advance delay, move on, and post the score when the play completes.
    /// Returns the posted result, if this call finished the quiz.
    pub async fn advance(&mut self, session: &Session) -> ViewResult<Option<NewQuizResult>> {
        if self.active_play()?.feedback().is_none() {
            return Err(ViewError::validation("Submit an answer before moving on"));
        }
        if !self.advance_delay.is_zero() {
            tokio::time::sleep(self.advance_delay).await;
        }
        let play = self.active_play()?;
        play.advance()?;

        let Some(result) = play.take_result() else {
            return Ok(None);
        };
        match self.api.submit_result(session.email(), &result).await {
            Ok(()) => {
                info!("Posted quiz result {}/{}", result.score, result.total_questions);
                Ok(Some(result))
            }
            Err(e) => {
                warn!("Failed to post quiz result: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn create(&mut self, session: &Session, draft: &QuizDraft) -> ViewResult<&Quiz> {
        validate_quiz(draft)?;
        let quiz = self.api.create_quiz(session.email(), draft).await?;
        info!("Created quiz {} '{}'", quiz.id, quiz.title);
        self.quizzes.push(quiz);
        self.quizzes
            .last()
            .ok_or_else(|| ViewError::Service("Created quiz missing".to_string()))
    }

    pub async fn edit(&mut self, session: &Session, quiz_id: u64, draft: &QuizDraft) -> ViewResult<&Quiz> {
        let quiz = self
            .find(quiz_id)
            .ok_or_else(|| ViewError::validation(format!("Quiz {} not found", quiz_id)))?;
        if !quiz.is_created_by(session.email()) {
            return Err(ViewError::validation("Only the creator can edit this quiz"));
        }
        validate_quiz(draft)?;

        let updated = self.api.update_quiz(session.email(), quiz_id, draft).await?;
        info!("Updated quiz {}", quiz_id);
        let index = self
            .quizzes
            .iter()
            .position(|q| q.id == quiz_id)
            .unwrap_or(0);
        self.quizzes[index] = updated;
        Ok(&self.quizzes[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{session_for, FakeBackend};
    use chrono::NaiveDate;
    use cinemarec_models::QuestionDraft;

    fn question(text: &str, correct: usize) -> Question {
        Question {
            id: None,
            text: text.to_string(),
            image_url: None,
            answers: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
        }
    }

    fn quiz(id: u64, creator: &str) -> Quiz {
        Quiz {
            id,
            title: format!("Quiz {}", id),
            description: String::new(),
            creator_email: Some(creator.to_string()),
            questions: vec![question("Q1", 0), question("Q2", 2), question("Q3", 1)],
            is_public: true,
        }
    }

    fn draft() -> QuizDraft {
        QuizDraft {
            title: "Nineties".to_string(),
            description: "Films of the decade".to_string(),
            is_public: true,
            questions: vec![QuestionDraft {
                text: "Who directed Heat?".to_string(),
                answers: vec!["Mann".into(), "Scott".into(), "Fincher".into(), "Nolan".into()],
                correct_answer: 0,
                ..QuestionDraft::default()
            }],
        }
    }

    async fn loaded(backend: &Arc<FakeBackend>) -> QuizzesView {
        *backend.quizzes.lock().unwrap() = vec![quiz(1, "ann@x.io"), quiz(2, "bob@x.io")];
        let mut view = QuizzesView::new(backend.clone(), Duration::ZERO);
        view.load().await.unwrap();
        view
    }

    #[test]
    fn test_submit_needs_selection_and_scores_once() {
        let mut play = QuizPlay::new(quiz(1, "ann@x.io")).unwrap();
        assert!(!play.can_submit());
        assert!(play.submit().is_err());

        play.select(0).unwrap();
        assert_eq!(play.submit().unwrap(), AnswerFeedback::Correct);
        assert!(play.submit().is_err());
        assert!(play.select(1).is_err());
        assert_eq!(play.score(), 1);

        play.advance().unwrap();
        play.select(0).unwrap();
        assert_eq!(play.submit().unwrap(), AnswerFeedback::Incorrect { correct_answer: 2 });
        assert_eq!(play.score(), 1);
    }

    #[test]
    fn test_result_taken_once() {
        let mut play = QuizPlay::new(quiz(1, "ann@x.io")).unwrap();
        for answer in [0, 2, 1] {
            assert!(play.take_result().is_none());
            play.select(answer).unwrap();
            play.submit().unwrap();
            play.advance().unwrap();
        }
        assert!(play.is_finished());
        assert!(play.current().is_none());
        let result = play.take_result().unwrap();
        assert_eq!((result.score, result.total_questions), (3, 3));
        assert!(play.take_result().is_none());
    }

    #[test]
    fn test_empty_quiz_cannot_be_played() {
        let empty = Quiz {
            questions: Vec::new(),
            ..quiz(9, "ann@x.io")
        };
        assert!(QuizPlay::new(empty).is_err());
    }

    #[test]
    fn test_quiz_validation() {
        assert!(validate_quiz(&draft()).is_ok());
        assert!(validate_quiz(&QuizDraft { title: " ".into(), ..draft() }).is_err());
        assert!(validate_quiz(&QuizDraft { questions: Vec::new(), ..draft() }).is_err());

        let mut bad = draft();
        bad.questions[0].answers[3].clear();
        assert!(validate_quiz(&bad).is_err());

        let mut bad = draft();
        bad.questions[0].correct_answer = 4;
        assert!(validate_quiz(&bad).is_err());
    }

    #[test]
    fn test_recent_results_newest_first() {
        let at = |day| NaiveDate::from_ymd_opt(2024, 3, day).and_then(|d| d.and_hms_opt(12, 0, 0));
        let results: Vec<QuizResult> = (1..=6)
            .map(|day| QuizResult {
                id: Some(day as u64),
                user_email: None,
                quiz_id: 1,
                score: 1,
                total_questions: 3,
                completed_at: at(day),
            })
            .collect();
        let ids: Vec<Option<u64>> = recent_results(results).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(6), Some(5), Some(4), Some(3)]);
    }

    #[tokio::test]
    async fn test_full_play_posts_result_exactly_once() {
        let backend = FakeBackend::new();
        let mut view = loaded(&backend).await;
        let session = session_for("ann@x.io");

        view.start(1).unwrap();
        let mut posted = Vec::new();
        for answer in [0, 0, 1] {
            view.select(answer).unwrap();
            view.submit().unwrap();
            posted.push(view.advance(&session).await.unwrap());
        }
        assert_eq!(posted[..2], [None, None]);
        let result = posted[2].unwrap();
        assert_eq!(result.score, 2);
        assert!(result.score <= result.total_questions);

        assert!(view.advance(&session).await.is_err());
        assert_eq!(backend.count("submit_result"), 1);
        assert_eq!(backend.posted_results.lock().unwrap()[0], result);
    }

    #[tokio::test]
    async fn test_only_creator_edits() {
        let backend = FakeBackend::new();
        let mut view = loaded(&backend).await;
        let ann = session_for("ann@x.io");

        let editable: Vec<u64> = view.editable(&ann).map(|q| q.id).collect();
        assert_eq!(editable, vec![1]);

        assert!(view.edit(&ann, 2, &draft()).await.unwrap_err().is_validation());
        assert_eq!(backend.count("update_quiz"), 0);

        let updated = view.edit(&ann, 1, &draft()).await.unwrap();
        assert_eq!(updated.title, "Nineties");
        assert_eq!(backend.saved_quizzes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_validates_before_request() {
        let backend = FakeBackend::new();
        let mut view = loaded(&backend).await;
        let ann = session_for("ann@x.io");

        assert!(view.create(&ann, &QuizDraft::default()).await.is_err());
        assert_eq!(backend.count("create_quiz"), 0);

        let created = view.create(&ann, &draft()).await.unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(view.quizzes().len(), 3);
    }
}
