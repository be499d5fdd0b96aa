use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::catalog::QuizBank;
use super::types::{QuizAction, QuizScore, QuizSessionState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizStateError {
    #[error("currentIndex {index} is out of range for a bank of {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("answer recorded for question {index}, but the bank has {len} questions")]
    AnswerOutOfRange { index: usize, len: usize },
    #[error("revealed is set but question {index} has no answer")]
    RevealedWithoutAnswer { index: usize },
    #[error("result total {total} does not match the bank size {len}")]
    ResultTotalMismatch { total: usize, len: usize },
    #[error("result claims {correct_count} correct answers out of {total}")]
    ScoreExceedsTotal { correct_count: usize, total: usize },
}

/// Checks a session state received from outside the process against the bank.
pub fn validate_state(bank: &QuizBank, state: &QuizSessionState) -> Result<(), QuizStateError> {
    let len = bank.len();
    if let Some(index) = state.answers.keys().copied().find(|&i| i >= len) {
        return Err(QuizStateError::AnswerOutOfRange { index, len });
    }
    match state.result {
        Some(score) if score.total != len => {
            Err(QuizStateError::ResultTotalMismatch {
                total: score.total,
                len,
            })
        }
        Some(score) if score.correct_count > score.total => {
            Err(QuizStateError::ScoreExceedsTotal {
                correct_count: score.correct_count,
                total: score.total,
            })
        }
        Some(_) => Ok(()),
        None if state.current_index >= len => Err(QuizStateError::IndexOutOfRange {
            index: state.current_index,
            len,
        }),
        None if state.revealed && state.current_answer().is_none() => {
            Err(QuizStateError::RevealedWithoutAnswer {
                index: state.current_index,
            })
        }
        None => Ok(()),
    }
}

/// Applies one user action. Guarded transitions that do not apply leave the state untouched.
pub fn transition(
    bank: &QuizBank,
    mut state: QuizSessionState,
    action: QuizAction,
) -> QuizSessionState {
    apply(bank, &mut state, action);
    state
}

fn apply(bank: &QuizBank, state: &mut QuizSessionState, action: QuizAction) -> bool {
    match action {
        QuizAction::SelectOption(option) => {
            if state.is_finished() || state.revealed {
                return false;
            }
            state.answers.insert(state.current_index, option);
            state.revealed = true;
            true
        }
        QuizAction::Next => {
            if state.is_finished() || !state.revealed {
                return false;
            }
            if state.current_index + 1 < bank.len() {
                state.current_index += 1;
                state.revealed = false;
            } else {
                state.result = Some(score(bank, state));
            }
            true
        }
        QuizAction::Previous => {
            if state.is_finished() || state.current_index == 0 {
                return false;
            }
            state.current_index -= 1;
            state.revealed = false;
            true
        }
        QuizAction::Reset => {
            *state = QuizSessionState::default();
            true
        }
    }
}

fn score(bank: &QuizBank, state: &QuizSessionState) -> QuizScore {
    let correct_count = bank
        .questions()
        .iter()
        .enumerate()
        .filter(|(i, q)| state.answers.get(i).is_some_and(|a| q.is_correct(a)))
        .count();
    QuizScore {
        correct_count,
        total: bank.len(),
    }
}

/// A single quiz session bound to its question bank.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    bank: Arc<QuizBank>,
    state: QuizSessionState,
}

impl QuizEngine {
    pub fn new(bank: Arc<QuizBank>) -> Self {
        Self {
            bank,
            state: QuizSessionState::default(),
        }
    }

    pub fn state(&self) -> &QuizSessionState {
        &self.state
    }

    pub fn bank(&self) -> &QuizBank {
        &self.bank
    }

    pub fn dispatch(&mut self, action: QuizAction) -> bool {
        apply(&self.bank, &mut self.state, action)
    }

    pub fn select_option(&mut self, option: impl Into<String>) -> bool {
        self.dispatch(QuizAction::SelectOption(option.into()))
    }

    pub fn next(&mut self) -> bool {
        self.dispatch(QuizAction::Next)
    }

    pub fn previous(&mut self) -> bool {
        self.dispatch(QuizAction::Previous)
    }

    pub fn reset(&mut self) {
        self.dispatch(QuizAction::Reset);
    }

    pub fn view(&self) -> QuizView {
        QuizView::render(&self.bank, &self.state)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Feedback {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub text: String,
    pub selected: bool,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub number: usize,
    pub total: usize,
    pub progress_percent: f64,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub revealed: bool,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub next_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum QuizView {
    InProgress(QuestionView),
    #[serde(rename_all = "camelCase")]
    Finished { score: QuizScore, summary: String },
}

impl QuizView {
    /// Renders a state that satisfies [`validate_state`] for `bank`.
    pub fn render(bank: &QuizBank, state: &QuizSessionState) -> Self {
        if let Some(score) = state.result {
            return QuizView::Finished {
                score,
                summary: score.summary(),
            };
        }

        let total = bank.len();
        let index = state.current_index.min(total.saturating_sub(1));
        let Some(question) = bank.get(index) else {
            let score = QuizScore {
                correct_count: 0,
                total,
            };
            return QuizView::Finished {
                score,
                summary: score.summary(),
            };
        };
        let answer = state.answers.get(&index).map(String::as_str);

        let options = question
            .options
            .iter()
            .map(|opt| {
                let selected = answer == Some(opt.as_str());
                let correct = question.is_correct(opt);
                let feedback = match (state.revealed, correct, selected) {
                    (true, true, _) => Some(Feedback::Correct),
                    (true, false, true) => Some(Feedback::Incorrect),
                    _ => None,
                };
                OptionView {
                    text: opt.clone(),
                    selected,
                    feedback,
                }
            })
            .collect();

        QuizView::InProgress(QuestionView {
            number: index + 1,
            total,
            progress_percent: (index + 1) as f64 / total as f64 * 100.0,
            prompt: question.prompt.clone(),
            options,
            revealed: state.revealed,
            can_go_previous: index > 0,
            can_go_next: state.revealed,
            next_label: if index + 1 < total { "Next" } else { "Finish" },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, QuizQuestion};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use proptest::strategy::Strategy;

    fn builtin_bank() -> Arc<QuizBank> {
        Arc::new(Catalog::builtin().quiz)
    }

    fn small_bank() -> QuizBank {
        QuizBank::new(vec![
            QuizQuestion {
                prompt: "One?".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                correct_option: "a".to_string(),
            },
            QuizQuestion {
                prompt: "Two?".to_string(),
                options: vec!["c".to_string(), "d".to_string()],
                correct_option: "d".to_string(),
            },
        ])
        .expect("valid bank")
    }

    fn wrong_option(question: &QuizQuestion) -> String {
        question
            .options
            .iter()
            .find(|o| !question.is_correct(o))
            .cloned()
            .expect("question has a wrong option")
    }

    #[test]
    fn initial_state_is_first_question_unrevealed() {
        let engine = QuizEngine::new(builtin_bank());
        assert_eq!(engine.state(), &QuizSessionState::default());
        assert_eq!(engine.state().current_index, 0);
        assert!(engine.state().answers.is_empty());
        assert!(!engine.state().revealed);
        assert!(engine.state().result.is_none());
    }

    #[test]
    fn select_option_records_answer_and_reveals() {
        let mut engine = QuizEngine::new(builtin_bank());
        assert!(engine.select_option("10%"));
        assert_eq!(engine.state().current_answer(), Some("10%"));
        assert!(engine.state().revealed);
        assert_eq!(engine.state().current_index, 0);
    }

    #[test]
    fn select_option_after_reveal_is_ignored() {
        let mut engine = QuizEngine::new(builtin_bank());
        engine.select_option("10%");
        let before = engine.state().clone();
        assert!(!engine.select_option("20%"));
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn next_without_reveal_is_noop() {
        let mut engine = QuizEngine::new(builtin_bank());
        let before = engine.state().clone();
        assert!(!engine.next());
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn previous_at_first_question_is_noop() {
        let mut engine = QuizEngine::new(builtin_bank());
        engine.select_option("20%");
        let before = engine.state().clone();
        assert!(!engine.previous());
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn previous_keeps_answer_and_allows_overwrite() {
        let mut engine = QuizEngine::new(builtin_bank());
        engine.select_option("5%");
        engine.next();
        engine.select_option("Risk");

        assert!(engine.previous());
        assert_eq!(engine.state().current_index, 0);
        assert!(!engine.state().revealed);
        assert_eq!(engine.state().answers.len(), 2);
        assert_eq!(engine.state().current_answer(), Some("5%"));

        assert!(engine.select_option("20%"));
        assert_eq!(engine.state().current_answer(), Some("20%"));
        assert!(engine.state().revealed);
    }

    #[test]
    fn alternating_answers_score_three_of_six() {
        let mut engine = QuizEngine::new(builtin_bank());
        let questions = engine.bank().questions().to_vec();
        for (i, question) in questions.iter().enumerate() {
            let option = if i % 2 == 0 {
                question.correct_option.clone()
            } else {
                wrong_option(question)
            };
            assert!(engine.select_option(option));
            assert!(engine.next());
        }
        assert_eq!(
            engine.state().result,
            Some(QuizScore {
                correct_count: 3,
                total: 6
            })
        );
        assert_eq!(
            engine.view(),
            QuizView::Finished {
                score: QuizScore {
                    correct_count: 3,
                    total: 6
                },
                summary: "3 / 6 correct".to_string(),
            }
        );
    }

    #[test]
    fn all_correct_answers_score_full_marks() {
        let bank = builtin_bank();
        let mut engine = QuizEngine::new(bank.clone());
        for question in bank.questions() {
            engine.select_option(question.correct_option.clone());
            engine.next();
        }
        assert_eq!(
            engine.state().result,
            Some(QuizScore {
                correct_count: bank.len(),
                total: bank.len()
            })
        );
    }

    #[test]
    fn scoring_is_case_sensitive_and_ignores_unknown_options() {
        let bank = small_bank();
        let mut state = QuizSessionState::default();
        state = transition(&bank, state, QuizAction::SelectOption("A".to_string()));
        state = transition(&bank, state, QuizAction::Next);
        state = transition(&bank, state, QuizAction::SelectOption("zzz".to_string()));
        state = transition(&bank, state, QuizAction::Next);
        assert_eq!(
            state.result,
            Some(QuizScore {
                correct_count: 0,
                total: 2
            })
        );
    }

    #[test]
    fn finished_session_ignores_everything_but_reset() {
        let bank = small_bank();
        let mut state = QuizSessionState::default();
        for action in [
            QuizAction::SelectOption("a".to_string()),
            QuizAction::Next,
            QuizAction::SelectOption("d".to_string()),
            QuizAction::Next,
        ] {
            state = transition(&bank, state, action);
        }
        assert!(state.is_finished());
        let finished = state.clone();

        for action in [
            QuizAction::SelectOption("c".to_string()),
            QuizAction::Next,
            QuizAction::Previous,
        ] {
            state = transition(&bank, state, action);
            assert_eq!(state, finished);
        }

        state = transition(&bank, state, QuizAction::Reset);
        assert_eq!(state, QuizSessionState::default());
    }

    #[test]
    fn view_shows_feedback_only_after_reveal() {
        let bank = small_bank();
        let state = QuizSessionState::default();
        let QuizView::InProgress(view) = QuizView::render(&bank, &state) else {
            panic!("expected in-progress view");
        };
        assert_eq!(view.number, 1);
        assert_eq!(view.next_label, "Next");
        assert!(!view.can_go_next);
        assert!(!view.can_go_previous);
        assert!(view.options.iter().all(|o| o.feedback.is_none()));

        let state = transition(&bank, state, QuizAction::SelectOption("b".to_string()));
        let QuizView::InProgress(view) = QuizView::render(&bank, &state) else {
            panic!("expected in-progress view");
        };
        assert!(view.can_go_next);
        assert_eq!(view.options[0].feedback, Some(Feedback::Correct));
        assert!(!view.options[0].selected);
        assert_eq!(view.options[1].feedback, Some(Feedback::Incorrect));
        assert!(view.options[1].selected);
    }

    #[test]
    fn view_labels_last_question_finish() {
        let bank = small_bank();
        let mut state = QuizSessionState::default();
        state = transition(&bank, state, QuizAction::SelectOption("a".to_string()));
        state = transition(&bank, state, QuizAction::Next);
        let QuizView::InProgress(view) = QuizView::render(&bank, &state) else {
            panic!("expected in-progress view");
        };
        assert_eq!(view.number, 2);
        assert_eq!(view.next_label, "Finish");
        assert!(view.can_go_previous);
        assert!((view.progress_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn validate_state_rejects_broken_invariants() {
        let bank = small_bank();
        assert_eq!(validate_state(&bank, &QuizSessionState::default()), Ok(()));

        let state = QuizSessionState {
            current_index: 2,
            ..QuizSessionState::default()
        };
        assert_eq!(
            validate_state(&bank, &state),
            Err(QuizStateError::IndexOutOfRange { index: 2, len: 2 })
        );

        let state = QuizSessionState {
            revealed: true,
            ..QuizSessionState::default()
        };
        assert_eq!(
            validate_state(&bank, &state),
            Err(QuizStateError::RevealedWithoutAnswer { index: 0 })
        );

        let mut state = QuizSessionState::default();
        state.answers.insert(5, "a".to_string());
        assert_eq!(
            validate_state(&bank, &state),
            Err(QuizStateError::AnswerOutOfRange { index: 5, len: 2 })
        );

        let state = QuizSessionState {
            result: Some(QuizScore {
                correct_count: 1,
                total: 3,
            }),
            ..QuizSessionState::default()
        };
        assert_eq!(
            validate_state(&bank, &state),
            Err(QuizStateError::ResultTotalMismatch { total: 3, len: 2 })
        );

        let state = QuizSessionState {
            result: Some(QuizScore {
                correct_count: 3,
                total: 2,
            }),
            ..QuizSessionState::default()
        };
        assert_eq!(
            validate_state(&bank, &state),
            Err(QuizStateError::ScoreExceedsTotal {
                correct_count: 3,
                total: 2
            })
        );
    }

    fn action_strategy() -> impl Strategy<Value = QuizAction> {
        (0u8..10, 0usize..5).prop_map(|(kind, option)| match kind {
            0..=3 => QuizAction::SelectOption(["a", "b", "c", "d", "x"][option].to_string()),
            4..=6 => QuizAction::Next,
            7 | 8 => QuizAction::Previous,
            _ => QuizAction::Reset,
        })
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_reachable_states_keep_invariants(
            actions in proptest::collection::vec(action_strategy(), 0..60)
        ) {
            let bank = small_bank();
            let mut state = QuizSessionState::default();
            for action in actions {
                let before = state.clone();
                state = transition(&bank, state, action.clone());

                prop_assert!(validate_state(&bank, &state).is_ok());
                prop_assert!(state.answers.len() <= bank.len());
                if !state.is_finished() {
                    prop_assert!(state.current_index < bank.len());
                }
                match action {
                    QuizAction::Next if !before.revealed => prop_assert_eq!(&state, &before),
                    QuizAction::Previous => {
                        prop_assert_eq!(state.answers.len(), before.answers.len());
                        for (index, answer) in &before.answers {
                            prop_assert_eq!(state.answers.get(index), Some(answer));
                        }
                    }
                    QuizAction::Reset => prop_assert_eq!(&state, &QuizSessionState::default()),
                    _ => {}
                }
            }
        }

        #[test]
        fn prop_revisited_answers_are_rescored(back_steps in 1usize..6) {
            let bank = builtin_bank();
            let last = bank.len() - 1;
            let mut engine = QuizEngine::new(bank.clone());
            for (i, question) in bank.questions().iter().enumerate() {
                engine.select_option(wrong_option(question));
                if i < last {
                    engine.next();
                }
            }
            prop_assert!(engine.state().result.is_none());

            for _ in 0..back_steps {
                prop_assert!(engine.previous());
            }
            let start = engine.state().current_index;
            prop_assert_eq!(start, last - back_steps);
            for question in &bank.questions()[start..] {
                prop_assert!(engine.select_option(question.correct_option.clone()));
                engine.next();
            }
            prop_assert_eq!(
                engine.state().result.map(|s| s.correct_count),
                Some(back_steps + 1)
            );
        }
    }
}
