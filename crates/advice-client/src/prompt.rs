//! Advice prompt template
//!
//! The answers are interpolated by position: company, environment, then
//! eye contact. [`AnswerSet`] can only be built with exactly
//! [`QUESTION_COUNT`] answers, so the template never reads a missing slot.

use serde::{Deserialize, Serialize};

use crate::AdviceError;

/// Number of questionnaire answers the prompt expects
pub const QUESTION_COUNT: usize = 3;

/// Answer used when replaying saved advice whose answers were not kept
pub const PLACEHOLDER_ANSWER: &str = "N/A";

/// System message sent ahead of every prompt
pub const SYSTEM_PERSONA: &str =
    "You are a respectful dating coach focused on helping people make genuine connections.";

/// Ordered questionnaire answers
///
/// # Examples
/// ```
/// use advice_client::AnswerSet;
///
/// let answers = AnswerSet::new(["Alone", "Quiet and calm", "Yes, once"]).unwrap();
/// assert_eq!(answers.environment(), "Quiet and calm");
///
/// assert!(AnswerSet::new(["Alone"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AnswerSet([String; QUESTION_COUNT]);

impl AnswerSet {
    /// Build an answer set, rejecting anything but exactly three answers
    pub fn new<I, S>(answers: I) -> Result<Self, AdviceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        Self::try_from(answers)
    }

    /// Three "N/A" answers, used for entries replayed from history
    pub fn placeholder() -> Self {
        Self([
            PLACEHOLDER_ANSWER.to_string(),
            PLACEHOLDER_ANSWER.to_string(),
            PLACEHOLDER_ANSWER.to_string(),
        ])
    }

    /// Who the other person is with
    pub fn company(&self) -> &str {
        &self.0[0]
    }

    /// What the surroundings are like
    pub fn environment(&self) -> &str {
        &self.0[1]
    }

    /// Whether there has been eye contact
    pub fn eye_contact(&self) -> &str {
        &self.0[2]
    }

    /// Answers in question order
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether this is the replay placeholder
    pub fn is_placeholder(&self) -> bool {
        self.0.iter().all(|a| a == PLACEHOLDER_ANSWER)
    }
}

impl TryFrom<Vec<String>> for AnswerSet {
    type Error = AdviceError;

    fn try_from(answers: Vec<String>) -> Result<Self, Self::Error> {
        let found = answers.len();
        let array: [String; QUESTION_COUNT] = answers
            .try_into()
            .map_err(|_| AdviceError::InvalidAnswers { expected: QUESTION_COUNT, found })?;
        Ok(Self(array))
    }
}

impl From<AnswerSet> for Vec<String> {
    fn from(answers: AnswerSet) -> Self {
        answers.0.into()
    }
}

/// Build the user prompt for a situation and its answers
///
/// The line breaks and the trailing space on each of the first four lines
/// are part of the template.
pub fn build_prompt(situation: &str, answers: &AnswerSet) -> String {
    format!(
        "Given this situation: \"{}\". \nThe person is {}. \nThe environment is {}. \nEye contact situation: {}. \nPlease provide a short, respectful, and practical suggestion (max 4 sentences) on how to approach and start a conversation. Focus on being genuine and respectful.",
        situation,
        answers.company(),
        answers.environment(),
        answers.eye_contact(),
    )
}
