use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::types::{CommunityGroup, Lender, QuizQuestion, Resource};

/// Number of resources listed before the directory is expanded.
pub const RESOURCE_PREVIEW_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("quiz bank must contain at least one question")]
    EmptyBank,
    #[error("question {index} has no options")]
    NoOptions { index: usize },
    #[error("question {index} lists option {option:?} more than once")]
    DuplicateOption { index: usize, option: String },
    #[error("question {index}: correct option {option:?} is not among its options")]
    CorrectOptionMissing { index: usize, option: String },
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed, validated sequence of quiz questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizBank {
    questions: Vec<QuizQuestion>,
}

impl QuizBank {
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::EmptyBank);
        }

        for (index, question) in questions.iter().enumerate() {
            if question.options.is_empty() {
                return Err(CatalogError::NoOptions { index });
            }
            let mut seen = HashSet::new();
            for option in &question.options {
                if !seen.insert(option.as_str()) {
                    return Err(CatalogError::DuplicateOption {
                        index,
                        option: option.clone(),
                    });
                }
            }
            if !seen.contains(question.correct_option.as_str()) {
                return Err(CatalogError::CorrectOptionMissing {
                    index,
                    option: question.correct_option.clone(),
                });
            }
        }

        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub quiz: QuizBank,
    pub lenders: Vec<Lender>,
    pub resources: Vec<Resource>,
    pub community_groups: Vec<CommunityGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    quiz: Vec<QuizQuestion>,
    #[serde(default)]
    lenders: Vec<Lender>,
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    community_groups: Vec<CommunityGroup>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self {
            quiz: QuizBank::new(file.quiz)?,
            lenders: file.lenders,
            resources: file.resources,
            community_groups: file.community_groups,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn visible_resources(&self, show_all: bool) -> &[Resource] {
        if show_all {
            &self.resources
        } else {
            &self.resources[..self.resources.len().min(RESOURCE_PREVIEW_LEN)]
        }
    }

    pub fn has_more_resources(&self) -> bool {
        self.resources.len() > RESOURCE_PREVIEW_LEN
    }

    pub fn builtin() -> Self {
        Self {
            quiz: builtin_quiz_bank(),
            lenders: builtin_lenders(),
            resources: builtin_resources(),
            community_groups: builtin_community_groups(),
        }
    }
}

fn question(prompt: &str, options: [&str; 4], correct_option: &str) -> QuizQuestion {
    QuizQuestion {
        prompt: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_option: correct_option.to_string(),
    }
}

fn builtin_quiz_bank() -> QuizBank {
    QuizBank {
        questions: vec![
            question(
                "What percentage of your income should ideally go to savings?",
                ["5%", "10%", "20%", "50%"],
                "20%",
            ),
            question(
                "Diverse investment helps reduce...",
                ["Liquidity", "Risk", "Interest rates", "Inflation"],
                "Risk",
            ),
            question(
                "Which account is best for emergency funds?",
                ["Checking", "Savings", "Stock Market", "Real Estate"],
                "Savings",
            ),
            question(
                "A budget surplus means...",
                [
                    "You spent more than earned",
                    "You earned more than spent",
                    "Income equals expenses",
                    "No income",
                ],
                "You earned more than spent",
            ),
            question(
                "What is a key benefit of compound interest?",
                ["Simple growth", "Faster debt", "Exponential growth", "No growth"],
                "Exponential growth",
            ),
            question(
                "Diversification in investing helps to...",
                ["Increase fees", "Reduce risk", "Guarantee profit", "Eliminate taxes"],
                "Reduce risk",
            ),
        ],
    }
}

fn builtin_lenders() -> Vec<Lender> {
    [
        (
            "JPA",
            "https://www.jpa.gov.my",
            "Provides scholarships and loan grants. Knowing JPA helps you access funding opportunities and understand eligibility criteria for your education finances. Visit their site for application details and deadlines.",
        ),
        (
            "PTPTN",
            "https://www.ptptn.gov.my",
            "Issues student loans for higher education. PTPTN is essential for low-interest financing options and repayment schemes. Check their site for loan eligibility, repayment calculators, and disbursement schedules.",
        ),
        (
            "MARA",
            "https://www.mara.gov.my",
            "Supports students with loans and educational programs. MARA offers tailored loans and bursaries. Explore their website to learn about program requirements, scholarship applications, and empowerment initiatives.",
        ),
    ]
    .into_iter()
    .map(|(name, url, description)| Lender {
        name: name.to_string(),
        url: url.to_string(),
        description: description.to_string(),
    })
    .collect()
}

fn builtin_resources() -> Vec<Resource> {
    [
        ("Financial Faiz", "https://www.youtube.com/@FinancialFaiz", "YouTube"),
        ("Afham Yusof", "https://www.youtube.com/@afhamyusof", "YouTube"),
        ("Mr Money TV", "https://www.youtube.com/@MrMoneyTV", "YouTube"),
        (
            "Direct Lending",
            "https://www.tiktok.com/@directlendingmy?lang=en",
            "TikTok",
        ),
        (
            "PTree Sulaiman | Simpanan Emas",
            "https://www.tiktok.com/@ptree_sulaiman?lang=en",
            "TikTok",
        ),
        (
            "AbangJakPar",
            "https://www.tiktok.com/@faredabdullah?lang=en",
            "TikTok",
        ),
        ("Investopedia", "https://www.investopedia.com", "Web"),
        (
            "LinkedIn Guide",
            "https://www.linkedin.com/pulse/10-ways-college-student-can-start-own-financial-plan-guddi-sharma-advjc/",
            "LinkedIn",
        ),
    ]
    .into_iter()
    .map(|(title, url, platform)| Resource {
        title: title.to_string(),
        url: url.to_string(),
        platform: platform.to_string(),
    })
    .collect()
}

fn builtin_community_groups() -> Vec<CommunityGroup> {
    [
        (
            "MARA Students",
            "https://t.me/joinchat/w7CHfiVa4spmYTY9",
            "Connect with other MARA scholars. Share experiences, ask questions, and get support from peers who understand the MARA journey.",
        ),
        (
            "PTPTN Students",
            "https://t.me/perbincanganPTPTN",
            "Join the PTPTN discussion group. Get advice on loan applications, repayment strategies, and connect with other PTPTN borrowers.",
        ),
        (
            "JPA Scholars",
            "https://t.me/+puN3KTMEU000NWE9",
            "Connect with fellow JPA scholars. Share scholarship experiences, discuss opportunities, and build your professional network.",
        ),
    ]
    .into_iter()
    .map(|(title, url, description)| CommunityGroup {
        title: title.to_string(),
        url: url.to_string(),
        description: description.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_passes_bank_validation() {
        let catalog = Catalog::builtin();
        let rebuilt = QuizBank::new(catalog.quiz.questions().to_vec()).expect("valid bank");
        assert_eq!(rebuilt.len(), 6);
        assert_eq!(catalog.lenders.len(), 3);
        assert_eq!(catalog.resources.len(), 8);
        assert_eq!(catalog.community_groups.len(), 3);
    }

    #[test]
    fn bank_rejects_empty_question_list() {
        let err = QuizBank::new(Vec::new()).expect_err("must reject empty bank");
        assert!(matches!(err, CatalogError::EmptyBank));
    }

    #[test]
    fn bank_rejects_correct_option_outside_options() {
        let err = QuizBank::new(vec![question("Q?", ["a", "b", "c", "d"], "e")])
            .expect_err("must reject missing correct option");
        assert!(matches!(err, CatalogError::CorrectOptionMissing { index: 0, .. }));
    }

    #[test]
    fn bank_rejects_duplicate_options() {
        let err = QuizBank::new(vec![
            question("Q1?", ["a", "b", "c", "d"], "a"),
            question("Q2?", ["a", "b", "b", "d"], "a"),
        ])
        .expect_err("must reject duplicates");
        assert!(matches!(err, CatalogError::DuplicateOption { index: 1, .. }));
    }

    #[test]
    fn visible_resources_previews_first_four() {
        let catalog = Catalog::builtin();
        assert!(catalog.has_more_resources());
        let preview = catalog.visible_resources(false);
        assert_eq!(preview.len(), RESOURCE_PREVIEW_LEN);
        assert_eq!(preview[0].title, "Financial Faiz");
        assert_eq!(catalog.visible_resources(true).len(), 8);
    }

    #[test]
    fn visible_resources_handles_short_lists() {
        let mut catalog = Catalog::builtin();
        catalog.resources.truncate(2);
        assert!(!catalog.has_more_resources());
        assert_eq!(catalog.visible_resources(false).len(), 2);
    }

    #[test]
    fn from_json_str_parses_and_validates() {
        let json = r#"{
          "quiz": [
            { "prompt": "Pick b", "options": ["a", "b"], "correctOption": "b" }
          ],
          "communityGroups": [
            { "title": "Group", "url": "https://t.me/x", "description": "d" }
          ]
        }"#;
        let catalog = Catalog::from_json_str(json).expect("json should parse");
        assert_eq!(catalog.quiz.len(), 1);
        assert!(catalog.lenders.is_empty());
        assert_eq!(catalog.community_groups[0].title, "Group");

        let bad = r#"{ "quiz": [ { "prompt": "Pick", "options": ["a"], "correctOption": "B" } ] }"#;
        let err = Catalog::from_json_str(bad).expect_err("must reject case mismatch");
        assert!(err.to_string().contains("not among its options"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/finwiz-catalog.json"))
            .expect_err("must fail on missing file");
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
