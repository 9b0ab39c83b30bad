//! Respondent-side survey taking and per-survey submission reports

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::SurveyService;
use crate::errors::{Result, SurveyhubError};
use crate::storage::{Answer, AnswerType, Question, SeaOrmStorage, Submission, Survey};
use crate::utils::csv_handler::records_to_csv;

/// 多选答案的分隔符
pub const MULTI_ANSWER_SEPARATOR: char = ';';

#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub submission_id: String,
    pub redirect_url: String,
}

fn check_answer(question: &Question, answer: &str) -> Result<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(SurveyhubError::validation(format!(
            "Answer required for \"{}\"",
            question.question_text
        )));
    }

    match question.answer_type {
        AnswerType::Text => Ok(answer.to_string()),
        AnswerType::Single => {
            if question.options.iter().any(|o| o == answer) {
                Ok(answer.to_string())
            } else {
                Err(SurveyhubError::validation(format!(
                    "\"{}\" is not an option of \"{}\"",
                    answer, question.question_text
                )))
            }
        }
        AnswerType::Multiple => {
            let mut seen = HashSet::new();
            let mut picked = Vec::new();
            for part in answer.split(MULTI_ANSWER_SEPARATOR).map(str::trim) {
                if part.is_empty() {
                    continue;
                }
                if !question.options.iter().any(|o| o == part) {
                    return Err(SurveyhubError::validation(format!(
                        "\"{}\" is not an option of \"{}\"",
                        part, question.question_text
                    )));
                }
                if seen.insert(part) {
                    picked.push(part);
                }
            }
            if picked.is_empty() {
                return Err(SurveyhubError::validation(format!(
                    "Answer required for \"{}\"",
                    question.question_text
                )));
            }
            Ok(picked.join(";"))
        }
    }
}

/// 校验答案：每题恰好一个答案，引用的题目必须存在
pub fn validate_responses(survey: &Survey, responses: Vec<Answer>) -> Result<Vec<Answer>> {
    let questions: HashMap<&str, &Question> = survey
        .questions
        .iter()
        .map(|q| (q.id.as_str(), q))
        .collect();

    let mut answered: HashMap<String, String> = HashMap::new();
    for response in responses {
        let question = questions.get(response.question_id.as_str()).ok_or_else(|| {
            SurveyhubError::validation(format!("Unknown question: {}", response.question_id))
        })?;
        let value = check_answer(question, &response.answer)?;
        if answered.insert(response.question_id.clone(), value).is_some() {
            return Err(SurveyhubError::validation(format!(
                "Duplicate answer for question: {}",
                response.question_id
            )));
        }
    }

    // 按问卷题目顺序输出
    survey
        .questions
        .iter()
        .map(|q| {
            answered
                .remove(&q.id)
                .map(|answer| Answer {
                    question_id: q.id.clone(),
                    answer,
                })
                .ok_or_else(|| {
                    SurveyhubError::validation(format!(
                        "Answer required for \"{}\"",
                        q.question_text
                    ))
                })
        })
        .collect()
}

/// 答卷导出："Sr No.", 各题题目, "Submitted At"；缺失答案写 `-`
pub fn submissions_to_csv(survey: &Survey, submissions: &[Submission]) -> Result<String> {
    let mut headers = vec!["Sr No.".to_string()];
    headers.extend(survey.questions.iter().map(|q| q.question_text.clone()));
    headers.push("Submitted At".to_string());

    let rows: Vec<Vec<String>> = submissions
        .iter()
        .enumerate()
        .map(|(idx, sub)| {
            let by_question: HashMap<&str, &str> = sub
                .responses
                .iter()
                .map(|a| (a.question_id.as_str(), a.answer.as_str()))
                .collect();

            let mut row = vec![(idx + 1).to_string()];
            row.extend(survey.questions.iter().map(|q| {
                by_question
                    .get(q.id.as_str())
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string())
            }));
            row.push(sub.submitted_at.to_rfc3339());
            row
        })
        .collect();

    records_to_csv(&headers, &rows)
}

pub struct SubmissionService {
    storage: Arc<SeaOrmStorage>,
    surveys: Arc<SurveyService>,
}

impl SubmissionService {
    pub fn new(storage: Arc<SeaOrmStorage>, surveys: Arc<SurveyService>) -> Self {
        Self { storage, surveys }
    }

    /// 受访者可见的问卷（仅 Live）
    pub async fn public_survey(&self, id: &str) -> Result<Survey> {
        self.surveys.require_live(id).await
    }

    pub async fn submit(
        &self,
        survey_id: &str,
        responses: Vec<Answer>,
        ip_address: Option<String>,
    ) -> Result<SubmitResult> {
        let survey = self.surveys.require_live(survey_id).await?;
        let responses = validate_responses(&survey, responses)?;

        let submission = Submission {
            id: uuid::Uuid::new_v4().to_string(),
            survey_id: survey_id.to_string(),
            responses,
            ip_address,
            submitted_at: Utc::now(),
        };
        let outcome = self.storage.insert_submission_with_quota(&submission).await?;
        let receipt = SurveyService::receipt_for(survey_id, outcome)?;

        info!(
            "Submission {} accepted for survey {} ({}/{})",
            submission.id, survey_id, receipt.count, survey.max_responses
        );
        Ok(SubmitResult {
            submission_id: submission.id,
            redirect_url: survey.redirect_url,
        })
    }

    pub async fn list_for_survey(&self, survey_id: &str) -> Result<(Survey, Vec<Submission>)> {
        let survey = self
            .storage
            .get_survey(survey_id)
            .await?
            .ok_or_else(|| SurveyhubError::not_found(format!("Survey not found: {}", survey_id)))?;
        let submissions = self.storage.list_submissions_for_survey(survey_id).await?;
        Ok((survey, submissions))
    }

    pub async fn export_csv(&self, survey_id: &str) -> Result<(Survey, String)> {
        let (survey, submissions) = self.list_for_survey(survey_id).await?;
        let csv = submissions_to_csv(&survey, &submissions)?;
        Ok((survey, csv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Survey {
        let now = Utc::now();
        Survey {
            id: "s1".into(),
            survey_name: "Test".into(),
            description: String::new(),
            project_id_from_client: String::new(),
            project_id_from_inter: String::new(),
            questions: vec![
                Question {
                    id: "q1".into(),
                    question_text: "Name".into(),
                    answer_type: AnswerType::Text,
                    options: vec![],
                },
                Question {
                    id: "q2".into(),
                    question_text: "Color".into(),
                    answer_type: AnswerType::Single,
                    options: vec!["Red".into(), "Blue".into()],
                },
                Question {
                    id: "q3".into(),
                    question_text: "Pets".into(),
                    answer_type: AnswerType::Multiple,
                    options: vec!["Cat".into(), "Dog".into(), "Fish".into()],
                },
            ],
            redirect_url: "https://example.com/done".into(),
            max_responses: 0,
            response_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(q: &str, a: &str) -> Answer {
        Answer {
            question_id: q.into(),
            answer: a.into(),
        }
    }

    #[test]
    fn test_valid_responses_are_ordered_and_normalized() {
        let out = validate_responses(
            &survey(),
            vec![
                answer("q3", " Dog ; Cat;Dog "),
                answer("q1", " Ada "),
                answer("q2", "Blue"),
            ],
        )
        .unwrap();
        assert_eq!(out[0].answer, "Ada");
        assert_eq!(out[1].answer, "Blue");
        assert_eq!(out[2].answer, "Dog;Cat");
    }

    #[test]
    fn test_missing_answer_rejected() {
        let err = validate_responses(&survey(), vec![answer("q1", "Ada"), answer("q2", "Red")])
            .unwrap_err();
        assert!(err.message().contains("Pets"));
    }

    #[test]
    fn test_invalid_option_rejected() {
        assert!(
            validate_responses(
                &survey(),
                vec![answer("q1", "Ada"), answer("q2", "Green"), answer("q3", "Cat")]
            )
            .is_err()
        );
        assert!(
            validate_responses(
                &survey(),
                vec![answer("q1", "Ada"), answer("q2", "Red"), answer("q3", "Cat;Cow")]
            )
            .is_err()
        );
    }

    #[test]
    fn test_unknown_and_duplicate_questions_rejected() {
        assert!(validate_responses(&survey(), vec![answer("zz", "x")]).is_err());
        assert!(
            validate_responses(&survey(), vec![answer("q1", "a"), answer("q1", "b")]).is_err()
        );
    }

    #[test]
    fn test_submission_csv_marks_missing_answers() {
        let s = survey();
        let sub = Submission {
            id: "x".into(),
            survey_id: "s1".into(),
            responses: vec![answer("q1", "Ada"), answer("q3", "Cat;Dog")],
            ip_address: None,
            submitted_at: Utc::now(),
        };
        let csv = submissions_to_csv(&s, &[sub]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Sr No.,Name,Color,Pets,Submitted At");
        assert!(lines.next().unwrap().starts_with("1,Ada,-,Cat;Dog,"));
    }
}
