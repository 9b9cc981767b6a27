use super::context::AppContext;
use super::prompts;
use super::ui::{self, Spinner};
use crate::output::Output;
use crate::QuizzesCommands;
use cinemarec_core::{AnswerFeedback, DashboardTab, QuizzesView, Route, Session};
use cinemarec_models::{QuestionDraft, Quiz, QuizDraft, ANSWERS_PER_QUESTION};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;
use std::path::Path;

const MAX_QUESTIONS: u32 = 50;

pub async fn run_quizzes(cmd: QuizzesCommands, output: &Output) -> Result<()> {
    let route = Route::Dashboard(DashboardTab::Quizzes);
    let mut ctx = AppContext::load()?;
    let session = ctx.require_session(&route)?;
    let services = ctx.services(Some(&session))?;
    let mut view = QuizzesView::new(services.quizzes.clone(), ctx.config.timing.quiz_advance());

    let spinner = Spinner::start("Loading quizzes...", output);
    let loaded = view.load().await.map(|_| ());
    spinner.finish();
    loaded.map_err(|e| ctx.fail(e, &route))?;

    match cmd {
        QuizzesCommands::List => print_quizzes(&view, &session, output),
        QuizzesCommands::Play { quiz_id } => {
            play(&mut view, &session, quiz_id, output)
                .await
                .map_err(|report| ctx.recover(report, &route))?;
        }
        QuizzesCommands::Create => {
            let draft = read_quiz(None).await?;
            let spinner = Spinner::start("Publishing quiz...", output);
            let created = view.create(&session, &draft).await.map(|q| q.id);
            spinner.finish();
            let id = created.map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Published quiz {} '{}'", id, draft.title));
        }
        QuizzesCommands::Edit { quiz_id } => {
            let existing = view
                .find(quiz_id)
                .ok_or_else(|| eyre!("Quiz {} not found", quiz_id))?;
            if !existing.is_created_by(session.email()) {
                return Err(eyre!("Only the creator can edit this quiz"));
            }
            let draft = read_quiz(Some(existing)).await?;
            let spinner = Spinner::start("Saving quiz...", output);
            let updated = view.edit(&session, quiz_id, &draft).await.map(|_| ());
            spinner.finish();
            updated.map_err(|e| ctx.fail(e, &route))?;
            output.success(format!("Updated quiz {}", quiz_id));
        }
        QuizzesCommands::Results => {
            view.load_results(&session).await.map_err(|e| ctx.fail(e, &route))?;
            print_results(&view, output);
        }
    }
    Ok(())
}

fn print_quizzes(view: &QuizzesView, session: &Session, output: &Output) {
    if !output.is_human() {
        output.json(&json!({ "quizzes": view.quizzes() }));
        return;
    }

    if view.quizzes().is_empty() {
        output.info("No quizzes yet. Run `cinemarec quizzes create` to write one.");
        return;
    }
    let mut table = ui::table(&["ID", "Title", "Questions", "Creator", "Public"]);
    for quiz in view.quizzes() {
        let creator = if quiz.is_created_by(session.email()) {
            "you".to_string()
        } else {
            quiz.creator_email.clone().unwrap_or_else(|| "-".to_string())
        };
        table.add_row(vec![
            Cell::new(quiz.id),
            Cell::new(&quiz.title),
            Cell::new(quiz.questions.len()),
            Cell::new(creator),
            Cell::new(ui::check_mark(quiz.is_public)),
        ]);
    }
    output.println(table.to_string());
}

fn print_results(view: &QuizzesView, output: &Output) {
    if !output.is_human() {
        output.json(&json!({ "results": view.results() }));
        return;
    }

    if view.results().is_empty() {
        output.info("No results yet");
        return;
    }
    let mut table = ui::table(&["Quiz", "Score", "Completed"]);
    for result in view.results() {
        let title = view
            .find(result.quiz_id)
            .map(|q| q.title.clone())
            .unwrap_or_else(|| format!("#{}", result.quiz_id));
        table.add_row(vec![
            Cell::new(title),
            Cell::new(format!("{}/{}", result.score, result.total_questions)),
            Cell::new(
                result
                    .completed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    output.println(table.to_string());
}

async fn play(view: &mut QuizzesView, session: &Session, quiz_id: u64, output: &Output) -> Result<()> {
    let title = view.start(quiz_id)?.quiz().title.clone();
    ui::section(&title, output);

    loop {
        let Some(play) = view.play() else {
            return Ok(());
        };
        let Some(question) = play.current() else {
            return Ok(());
        };
        let (number, total) = play.progress();
        let answers = question.answers.clone();

        output.println("");
        output.println(format!("Question {}/{}: {}", number, total, question.text));
        if let Some(url) = &question.image_url {
            output.println(format!("Image: {}", url));
        }

        let choice = prompts::prompt_select("Your answer", &answers, 0)?;
        view.select(choice)?;
        match view.submit()? {
            AnswerFeedback::Correct => output.success("Correct!"),
            AnswerFeedback::Incorrect { correct_answer } => output.error(format!(
                "Wrong. The answer was: {}",
                answers.get(correct_answer).map(String::as_str).unwrap_or("?")
            )),
        }

        if let Some(result) = view.advance(session).await? {
            if output.is_human() {
                ui::section("Quiz complete", output);
                output.println(format!("You scored {}/{}", result.score, result.total_questions));
            } else {
                output.json(&json!({ "result": result }));
            }
            return Ok(());
        }
    }
}

async fn read_question(number: usize, existing: Option<&cinemarec_models::Question>) -> Result<QuestionDraft> {
    let text = prompts::prompt_required(
        &format!("Question {}", number),
        existing.map(|q| q.text.as_str()),
    )?;

    let mut answers = Vec::with_capacity(ANSWERS_PER_QUESTION);
    for slot in 0..ANSWERS_PER_QUESTION {
        let default = existing.and_then(|q| q.answers.get(slot)).map(String::as_str);
        answers.push(prompts::prompt_required(&format!("  Answer {}", slot + 1), default)?);
    }

    let default_correct = existing.map(|q| q.correct_answer as u32 + 1).or(Some(1));
    let correct = prompts::prompt_number("  Correct answer", default_correct, 1, ANSWERS_PER_QUESTION as u32)?;

    let image_path = prompts::prompt_string("  Image file (optional)", None)?;
    let image = match image_path.trim() {
        "" => None,
        path => Some(ui::read_image(Path::new(path)).await?),
    };

    Ok(QuestionDraft {
        text,
        answers,
        correct_answer: (correct - 1) as usize,
        image,
        image_url: existing.and_then(|q| q.image_url.clone()),
    })
}

/// Interactive quiz form; an existing quiz fills in the defaults
async fn read_quiz(existing: Option<&Quiz>) -> Result<QuizDraft> {
    let title = prompts::prompt_required("Title", existing.map(|q| q.title.as_str()))?;
    let description = prompts::prompt_string("Description", existing.map(|q| q.description.as_str()))?;
    let is_public = prompts::prompt_yes_no("Public?", Some(existing.map_or(true, |q| q.is_public)))?;

    let current = existing.map(|q| q.questions.len() as u32).filter(|n| *n > 0);
    let count = prompts::prompt_number("Number of questions", current.or(Some(5)), 1, MAX_QUESTIONS)?;

    let mut questions = Vec::with_capacity(count as usize);
    for index in 0..count as usize {
        let previous = existing.and_then(|q| q.questions.get(index));
        questions.push(read_question(index + 1, previous).await?);
    }

    Ok(QuizDraft {
        title,
        description,
        is_public,
        questions,
    })
}
