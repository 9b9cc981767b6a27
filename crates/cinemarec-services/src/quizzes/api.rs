use crate::error::Result;
use crate::http::{join, send, send_json, with_bearer};
use crate::multipart::{into_form, FormField};
use cinemarec_models::{NewQuizResult, Quiz, QuizDraft, QuizResult};
use reqwest::Client;
use tracing::debug;

/// Flatten a quiz into the indexed field names the quiz service binds
/// (`questions[0].answers[2]` and so on).
pub fn quiz_fields(draft: &QuizDraft) -> Vec<FormField> {
    let mut fields = vec![
        FormField::text("title", &draft.title),
        FormField::text("description", &draft.description),
        FormField::text("isPublic", draft.is_public),
    ];

    for (i, question) in draft.questions.iter().enumerate() {
        let prefix = format!("questions[{}]", i);
        fields.push(FormField::text(format!("{}.text", prefix), &question.text));
        for (j, answer) in question.answers.iter().enumerate() {
            fields.push(FormField::text(format!("{}.answers[{}]", prefix, j), answer));
        }
        fields.push(FormField::text(format!("{}.correctAnswer", prefix), question.correct_answer));

        match (&question.image, &question.image_url) {
            (Some(image), _) => fields.push(FormField::file(format!("{}.image", prefix), image)),
            (None, Some(url)) => fields.push(FormField::text(format!("{}.imageUrl", prefix), url)),
            (None, None) => {}
        }
    }
    fields
}

pub async fn list_quizzes(client: &Client, base_url: &str, token: Option<&str>) -> Result<Vec<Quiz>> {
    let url = join(base_url, "/quizzes");
    debug!("Fetching quizzes from {}", url);
    send_json(with_bearer(client.get(&url), token), "fetch quizzes").await
}

pub async fn create_quiz(client: &Client, base_url: &str, token: Option<&str>, email: &str, draft: &QuizDraft) -> Result<Quiz> {
    let url = join(base_url, "/quizzes");
    let form = into_form(quiz_fields(draft))?;
    debug!("Creating quiz '{}' with {} questions", draft.title, draft.questions.len());
    send_json(
        with_bearer(client.post(&url), token).query(&[("email", email)]).multipart(form),
        "create quiz",
    )
    .await
}

pub async fn update_quiz(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    quiz_id: u64,
    draft: &QuizDraft,
) -> Result<Quiz> {
    let url = join(base_url, &format!("/quizzes/{}", quiz_id));
    let form = into_form(quiz_fields(draft))?;
    send_json(
        with_bearer(client.put(&url), token).query(&[("email", email)]).multipart(form),
        "update quiz",
    )
    .await
}

pub async fn submit_result(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    email: &str,
    result: &NewQuizResult,
) -> Result<()> {
    let url = join(base_url, "/quizzes/results");
    debug!("Posting result {}/{} for quiz {}", result.score, result.total_questions, result.quiz_id);
    send(
        with_bearer(client.post(&url), token).query(&[("email", email)]).json(result),
        "save quiz result",
    )
    .await?;
    Ok(())
}

pub async fn get_results(client: &Client, base_url: &str, token: Option<&str>, email: &str) -> Result<Vec<QuizResult>> {
    let url = join(base_url, "/quizzes/results");
    send_json(with_bearer(client.get(&url), token).query(&[("email", email)]), "fetch quiz results").await
}
