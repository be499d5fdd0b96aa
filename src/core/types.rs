use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_option == option
    }
}

/// Selected option per question index. Entries are overwritten, never removed.
pub type AnswerMap = BTreeMap<usize, String>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub correct_count: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn summary(&self) -> String {
        format!("{} / {} correct", self.correct_count, self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizSessionState {
    pub current_index: usize,
    pub answers: AnswerMap,
    pub revealed: bool,
    pub result: Option<QuizScore>,
}

impl QuizSessionState {
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn current_answer(&self) -> Option<&str> {
        self.answers.get(&self.current_index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAction {
    SelectOption(String),
    Next,
    Previous,
    Reset,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FinancialInputs {
    pub income: f64,
    pub expenses: f64,
    pub debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub savings_rate_percent: f64,
    pub debt_to_income_ratio_percent: f64,
    pub recommended_emergency_fund: f64,
    pub advice: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lender {
    pub name: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub url: String,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityGroup {
    pub title: String,
    pub url: String,
    pub description: String,
}
