use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, CoursesApi};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30 * 60);

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl Question {
    fn new(id: u32, prompt: &str, options: [&str; 4], correct_answer: usize) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
            correct_answer,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// The built-in quiz served until quizzes come from the backend.
    pub fn react_components() -> Self {
        Self {
            title: "React Components Quiz".to_string(),
            description: "Test your knowledge of React components and their lifecycle."
                .to_string(),
            questions: vec![
                Question::new(
                    1,
                    "What is the correct way to update state in React?",
                    [
                        "this.state.count = 5",
                        "setState({ count: 5 })",
                        "state.count = 5",
                        "updateState(count: 5)",
                    ],
                    1,
                ),
                Question::new(
                    2,
                    "Which hook is used for side effects in React?",
                    ["useEffect", "useState", "useContext", "useReducer"],
                    0,
                ),
                Question::new(
                    3,
                    "What is the purpose of keys in React lists?",
                    [
                        "To style list items",
                        "To make lists look better",
                        "To help React identify which items have changed",
                        "To count list items",
                    ],
                    2,
                ),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("question {0} does not exist")]
    UnknownQuestion(usize),
    #[error("question {question} has no option {option}")]
    UnknownOption { question: usize, option: usize },
    #[error("every question must be answered before submitting")]
    Incomplete,
    #[error("quiz was already submitted")]
    AlreadySubmitted,
    #[error("failed to save quiz result: {0}")]
    Api(#[from] ApiError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnswerStatus {
    Unselected,
    Selected,
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: u32,
    pub selected_option: usize,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultRequest {
    pub user_id: String,
    pub quiz_id: String,
    pub submitted_at: DateTime<Utc>,
    pub score: u32,
    pub answers: Vec<AnswerRecord>,
}

/// One student's pass through a quiz.
#[derive(Clone, Debug)]
pub struct QuizAttempt {
    quiz: Quiz,
    answers: Vec<Option<usize>>,
    current: usize,
    submitted: bool,
}

impl QuizAttempt {
    pub fn new(quiz: Quiz) -> Self {
        let answers = vec![None; quiz.questions.len()];
        Self {
            quiz,
            answers,
            current: 0,
            submitted: false,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn current_question(&self) -> usize {
        self.current
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.quiz.questions.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Records an answer. Returns `Ok(false)` once the attempt is submitted:
    /// answers are frozen from then on.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<bool, QuizError> {
        if self.submitted {
            return Ok(false);
        }
        let entry = self
            .quiz
            .questions
            .get(question)
            .ok_or(QuizError::UnknownQuestion(question))?;
        if option >= entry.options.len() {
            return Err(QuizError::UnknownOption { question, option });
        }
        self.answers[question] = Some(option);
        Ok(true)
    }

    pub fn answer(&self, question: usize) -> Option<usize> {
        self.answers.get(question).copied().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn correct_count(&self) -> usize {
        self.quiz
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| **answer == Some(question.correct_answer))
            .count()
    }

    /// Percentage of correct answers, rounded half up to a whole number.
    pub fn score(&self) -> u32 {
        let total = self.quiz.questions.len();
        if total == 0 {
            return 0;
        }
        let ratio = Decimal::from(self.correct_count() as u64) / Decimal::from(total as u64);
        (ratio * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }

    pub fn answer_status(&self, question: usize, option: usize) -> AnswerStatus {
        let selected = self.answer(question) == Some(option);
        if !self.submitted {
            return if selected {
                AnswerStatus::Selected
            } else {
                AnswerStatus::Unselected
            };
        }
        let correct = self
            .quiz
            .questions
            .get(question)
            .is_some_and(|entry| entry.correct_answer == option);
        match (correct, selected) {
            (true, _) => AnswerStatus::Correct,
            (false, true) => AnswerStatus::Incorrect,
            (false, false) => AnswerStatus::Unselected,
        }
    }

    /// Freezes the attempt and builds the payload recorded by the backend.
    pub fn submit(
        &mut self,
        user_id: impl Into<String>,
        quiz_id: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Result<QuizResultRequest, QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        if !self.is_complete() {
            return Err(QuizError::Incomplete);
        }
        self.submitted = true;
        let answers = self
            .quiz
            .questions
            .iter()
            .zip(&self.answers)
            .filter_map(|(question, answer)| {
                answer.map(|selected_option| AnswerRecord {
                    question_id: question.id,
                    selected_option,
                })
            })
            .collect();
        Ok(QuizResultRequest {
            user_id: user_id.into(),
            quiz_id: quiz_id.into(),
            submitted_at,
            score: self.score(),
            answers,
        })
    }
}

/// Submits the attempt and posts the result. The attempt stays submitted even
/// when the backend call fails.
pub async fn submit_attempt<A>(
    api: &A,
    attempt: &mut QuizAttempt,
    user_id: &str,
    quiz_id: &str,
    submitted_at: DateTime<Utc>,
) -> Result<u32, QuizError>
where
    A: CoursesApi + ?Sized,
{
    let request = attempt.submit(user_id, quiz_id, submitted_at)?;
    let score = request.score;
    match api.submit_result(request).await {
        Ok(()) => {
            info!(quiz = quiz_id, score, "quiz result saved");
            Ok(score)
        }
        Err(error) => {
            warn!(quiz = quiz_id, %error, "failed to submit quiz result");
            Err(QuizError::Api(error))
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QuizTimer {
    remaining: Duration,
}

impl Default for QuizTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_LIMIT)
    }
}

impl QuizTimer {
    pub fn new(limit: Duration) -> Self {
        Self { remaining: limit }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.remaining = self.remaining.saturating_sub(elapsed);
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn format_remaining(&self) -> String {
        let seconds = self.remaining.as_secs();
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RecordingCoursesApi;
    use chrono::TimeZone;
    use futures::executor::block_on;

    fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn score_rounds_to_whole_percent() {
        let mut attempt = QuizAttempt::new(Quiz::react_components());
        attempt.select_answer(0, 1).expect("answer q1");
        attempt.select_answer(1, 3).expect("answer q2");
        attempt.select_answer(2, 0).expect("answer q3");
        assert_eq!(attempt.correct_count(), 1);
        assert_eq!(attempt.score(), 33);

        attempt.select_answer(2, 2).expect("change q3");
        assert_eq!(attempt.score(), 67);

        attempt.select_answer(1, 0).expect("change q2");
        assert_eq!(attempt.score(), 100);
    }

    #[test]
    fn selection_is_range_checked() {
        let mut attempt = QuizAttempt::new(Quiz::react_components());
        assert!(matches!(
            attempt.select_answer(7, 0),
            Err(QuizError::UnknownQuestion(7))
        ));
        assert!(matches!(
            attempt.select_answer(0, 4),
            Err(QuizError::UnknownOption {
                question: 0,
                option: 4
            })
        ));
    }

    #[test]
    fn submit_requires_every_answer_and_freezes_attempt() {
        let mut attempt = QuizAttempt::new(Quiz::react_components());
        attempt.select_answer(0, 1).expect("answer q1");
        assert!(matches!(
            attempt.submit("user123", "7", submitted_at()),
            Err(QuizError::Incomplete)
        ));

        attempt.select_answer(1, 0).expect("answer q2");
        attempt.select_answer(2, 1).expect("answer q3");
        let request = attempt
            .submit("user123", "7", submitted_at())
            .expect("complete attempt submits");
        assert_eq!(request.score, 67);
        assert_eq!(request.answers.len(), 3);
        assert_eq!(
            request.answers[2],
            AnswerRecord {
                question_id: 3,
                selected_option: 1
            }
        );

        assert!(!attempt.select_answer(0, 0).expect("ignored after submit"));
        assert_eq!(attempt.answer(0), Some(1));
        assert_eq!(attempt.answer_status(2, 2), AnswerStatus::Correct);
        assert_eq!(attempt.answer_status(2, 1), AnswerStatus::Incorrect);
        assert_eq!(attempt.answer_status(2, 0), AnswerStatus::Unselected);
        assert!(matches!(
            attempt.submit("user123", "7", submitted_at()),
            Err(QuizError::AlreadySubmitted)
        ));
    }

    #[test]
    fn result_payload_uses_camel_case_fields() {
        let mut attempt = QuizAttempt::new(Quiz::react_components());
        for (question, option) in [(0, 1), (1, 0), (2, 2)] {
            attempt
                .select_answer(question, option)
                .expect("answer question");
        }
        let request = attempt
            .submit("user123", "42", submitted_at())
            .expect("submit");
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["userId"], "user123");
        assert_eq!(json["quizId"], "42");
        assert_eq!(json["score"], 100);
        assert_eq!(json["answers"][0]["questionId"], 1);
        assert_eq!(json["answers"][0]["selectedOption"], 1);
        assert!(json["submittedAt"].as_str().is_some());
    }

    #[test]
    fn submit_attempt_posts_result_through_api() {
        let api = RecordingCoursesApi::new();
        let mut attempt = QuizAttempt::new(Quiz::react_components());
        for question in 0..3 {
            attempt.select_answer(question, 0).expect("answer");
        }
        let score = block_on(submit_attempt(
            &api,
            &mut attempt,
            "user123",
            "react-components",
            submitted_at(),
        ))
        .expect("result saved");
        assert_eq!(score, 33);
        assert_eq!(api.results().len(), 1);
        assert!(attempt.is_submitted());
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut attempt = QuizAttempt::new(Quiz::react_components());
        assert!(!attempt.previous());
        assert!(attempt.next());
        assert!(attempt.next());
        assert!(!attempt.next());
        assert_eq!(attempt.current_question(), 2);
    }

    #[test]
    fn timer_counts_down_and_formats_minutes() {
        let mut timer = QuizTimer::default();
        assert_eq!(timer.format_remaining(), "30:00");
        timer.tick(Duration::from_secs(65));
        assert_eq!(timer.format_remaining(), "28:55");
        timer.tick(Duration::from_secs(3600));
        assert!(timer.is_expired());
        assert_eq!(timer.format_remaining(), "0:00");
    }
}
