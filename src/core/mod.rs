mod catalog;
mod health;
mod quiz;
mod types;

pub use catalog::{Catalog, CatalogError, QuizBank, RESOURCE_PREVIEW_LEN};
pub use health::{
    CURRENCY_PREFIX, HealthCheckForm, InputError, MAX_AMOUNT, compute, compute_from_text,
    format_currency, format_percent, parse_amount, parse_amount_strict,
};
pub use quiz::{
    Feedback, OptionView, QuestionView, QuizEngine, QuizStateError, QuizView, transition,
    validate_state,
};
pub use types::{
    AnswerMap, CommunityGroup, FinancialInputs, HealthReport, Lender, QuizAction, QuizQuestion,
    QuizScore, QuizSessionState, Resource,
};
