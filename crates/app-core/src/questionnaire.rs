//! Three-question questionnaire
//!
//! Answers are collected by position. Selecting an option on the last
//! question yields a [`Submission`] once; after that the questionnaire
//! rejects further input.

use advice_client::{AnswerSet, QUESTION_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Questionnaire error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionnaireError {
    /// Option is not offered by the current question
    #[error("\"{option}\" is not an option for question {question}")]
    InvalidOption {
        /// Zero-based question index
        question: usize,
        /// Rejected option text
        option: String,
    },

    /// Option index out of range
    #[error("Option index {0} out of range")]
    OptionOutOfRange(usize),

    /// Answers were already submitted
    #[error("Questionnaire already submitted")]
    AlreadySubmitted,
}

/// Result type for questionnaire operations
pub type Result<T> = std::result::Result<T, QuestionnaireError>;

/// A fixed multiple-choice question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// Prompt shown to the user
    pub prompt: &'static str,
    /// Choices, in display order
    pub options: &'static [&'static str],
}

impl Question {
    /// Whether `option` is one of this question's choices
    pub fn offers(&self, option: &str) -> bool {
        self.options.contains(&option)
    }
}

/// The questions, in order
pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        prompt: "Who is she with?",
        options: &[
            "Alone",
            "With another girl",
            "With another guy",
            "With a group of girls",
            "With a mixed group",
        ],
    },
    Question {
        prompt: "What's the environment like?",
        options: &[
            "Quiet and calm",
            "Moderately busy",
            "Very busy and loud",
            "Social/party setting",
        ],
    },
    Question {
        prompt: "Has there been any eye contact?",
        options: &["Yes, multiple times", "Yes, once", "No, not yet", "Not sure"],
    },
];

/// Completed questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Situation the answers describe
    pub situation: String,
    /// Ordered answers
    pub answers: AnswerSet,
}

/// Result of selecting an option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Moved on to the question at this index
    Next(usize),
    /// Last question answered
    Submitted(Submission),
}

/// Result of going back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Now showing the question at this index
    Previous(usize),
    /// Already at the first question; leave the questionnaire
    Exit,
}

/// Questionnaire state machine
#[derive(Debug, Clone)]
pub struct Questionnaire {
    situation: String,
    index: usize,
    answers: [Option<String>; QUESTION_COUNT],
    submitted: bool,
}

impl Questionnaire {
    /// Start at the first question
    pub fn new(situation: impl Into<String>) -> Self {
        Self {
            situation: situation.into(),
            index: 0,
            answers: Default::default(),
            submitted: false,
        }
    }

    /// Situation being described
    pub fn situation(&self) -> &str {
        &self.situation
    }

    /// Zero-based index of the current question
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Current question
    pub fn current_question(&self) -> &'static Question {
        &QUESTIONS[self.index]
    }

    /// Answer recorded for question `index`, if any
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    /// Fraction of the questionnaire reached, counting the current question
    pub fn progress(&self) -> f32 {
        (self.index + 1) as f32 / QUESTION_COUNT as f32
    }

    /// Whether the answers were submitted
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Record `option` for the current question and advance
    pub fn select(&mut self, option: &str) -> Result<Step> {
        if self.submitted {
            return Err(QuestionnaireError::AlreadySubmitted);
        }
        if !self.current_question().offers(option) {
            return Err(QuestionnaireError::InvalidOption {
                question: self.index,
                option: option.to_string(),
            });
        }

        self.answers[self.index] = Some(option.to_string());

        if self.index + 1 < QUESTION_COUNT {
            self.index += 1;
            return Ok(Step::Next(self.index));
        }

        let answers: Vec<String> = self.answers.iter().flatten().cloned().collect();
        let answers = AnswerSet::try_from(answers).map_err(|_| QuestionnaireError::InvalidOption {
            question: self.index,
            option: option.to_string(),
        })?;

        self.submitted = true;
        tracing::debug!("questionnaire submitted");
        Ok(Step::Submitted(Submission { situation: self.situation.clone(), answers }))
    }

    /// Select the current question's option at `option_index`
    pub fn select_index(&mut self, option_index: usize) -> Result<Step> {
        let option = self
            .current_question()
            .options
            .get(option_index)
            .ok_or(QuestionnaireError::OptionOutOfRange(option_index))?;
        self.select(option)
    }

    /// Step back one question
    ///
    /// Earlier answers are kept and overwritten on reselection.
    pub fn back(&mut self) -> BackOutcome {
        if self.index == 0 {
            BackOutcome::Exit
        } else {
            self.index -= 1;
            BackOutcome::Previous(self.index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_fixed() {
        assert_eq!(QUESTIONS[0].prompt, "Who is she with?");
        assert_eq!(QUESTIONS[0].options.len(), 5);
        assert_eq!(QUESTIONS[1].options[3], "Social/party setting");
        assert_eq!(QUESTIONS[2].options, ["Yes, multiple times", "Yes, once", "No, not yet", "Not sure"]);
    }

    #[test]
    fn test_full_walk_submits_once() {
        let mut q = Questionnaire::new("At a coffee shop");
        assert!((q.progress() - 1.0 / 3.0).abs() < f32::EPSILON);

        assert_eq!(q.select("Alone").unwrap(), Step::Next(1));
        assert_eq!(q.select("Quiet and calm").unwrap(), Step::Next(2));
        assert!((q.progress() - 1.0).abs() < f32::EPSILON);

        let step = q.select("Yes, once").unwrap();
        let Step::Submitted(submission) = step else {
            panic!("expected submission");
        };
        assert_eq!(submission.situation, "At a coffee shop");
        assert_eq!(submission.answers.as_slice(), ["Alone", "Quiet and calm", "Yes, once"]);
        assert!(q.is_submitted());

        assert_eq!(q.select("Not sure"), Err(QuestionnaireError::AlreadySubmitted));
    }

    #[test]
    fn test_rejects_foreign_option() {
        let mut q = Questionnaire::new("Gym");
        let err = q.select("Quiet and calm").unwrap_err();
        assert!(matches!(err, QuestionnaireError::InvalidOption { question: 0, .. }));
        assert_eq!(q.current_index(), 0);
        assert!(q.answer(0).is_none());
    }

    #[test]
    fn test_back_and_reselect() {
        let mut q = Questionnaire::new("Party");
        assert_eq!(q.back(), BackOutcome::Exit);

        q.select("With a mixed group").unwrap();
        assert_eq!(q.back(), BackOutcome::Previous(0));
        assert_eq!(q.answer(0), Some("With a mixed group"));

        q.select("Alone").unwrap();
        q.select("Social/party setting").unwrap();
        let Step::Submitted(submission) = q.select("No, not yet").unwrap() else {
            panic!("expected submission");
        };
        assert_eq!(submission.answers.company(), "Alone");
    }

    #[test]
    fn test_select_index() {
        let mut q = Questionnaire::new("Bookshop");
        assert_eq!(q.select_index(1).unwrap(), Step::Next(1));
        assert_eq!(q.answer(0), Some("With another girl"));
        assert_eq!(q.select_index(9), Err(QuestionnaireError::OptionOutOfRange(9)));
    }
}
