//! Survey lifecycle and quota enforcement tests

mod common;

use std::sync::Arc;

use chrono::Utc;

use common::{TestEnv, survey_request};
use surveyhub::errors::SurveyhubError;
use surveyhub::services::{SurveyListParams, UpdateSurveyRequest};
use surveyhub::storage::{Answer, Submission, Survey};

fn answers_for(survey: &Survey) -> Vec<Answer> {
    vec![
        Answer {
            question_id: survey.questions[0].id.clone(),
            answer: "Ada".to_string(),
        },
        Answer {
            question_id: survey.questions[1].id.clone(),
            answer: "Blue".to_string(),
        },
    ]
}

#[tokio::test]
async fn test_create_assigns_question_ids_and_link() {
    let env = TestEnv::new().await;
    let created = env
        .ctx
        .surveys
        .create_survey(survey_request("create", Some(5)))
        .await
        .unwrap();

    assert!(created.survey.is_active);
    assert_eq!(created.survey.response_count, 0);
    assert!(created.survey.questions.iter().all(|q| !q.id.is_empty()));
    assert!(created.generated_link.ends_with(&created.survey.id));
}

#[tokio::test]
async fn test_reaching_quota_deactivates_survey() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("quota", Some(2)))
        .await
        .unwrap()
        .survey;

    let first = env.ctx.surveys.record_completion(&survey.id).await.unwrap();
    assert_eq!(first.count, 1);
    assert!(!first.now_full);

    let second = env.ctx.surveys.record_completion(&survey.id).await.unwrap();
    assert_eq!(second.count, 2);
    assert!(second.now_full);

    let stored = env.ctx.surveys.get_survey(&survey.id).await.unwrap().survey;
    assert!(stored.is_full());
    assert!(!stored.is_active);

    let third = env.ctx.surveys.record_completion(&survey.id).await;
    assert!(matches!(third, Err(SurveyhubError::SurveyQuotaFull(_))));
    let stored = env.ctx.surveys.get_survey(&survey.id).await.unwrap().survey;
    assert_eq!(stored.response_count, 2);
}

#[tokio::test]
async fn test_full_survey_cannot_be_reactivated() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("toggle", Some(1)))
        .await
        .unwrap()
        .survey;
    env.ctx.surveys.record_completion(&survey.id).await.unwrap();

    let result = env.ctx.surveys.toggle_survey(&survey.id).await;
    assert!(matches!(result, Err(SurveyhubError::SurveyQuotaFull(_))));

    // 提高上限后可以重新启用
    env.ctx
        .surveys
        .update_survey(
            &survey.id,
            UpdateSurveyRequest {
                max_responses: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let toggled = env.ctx.surveys.toggle_survey(&survey.id).await.unwrap();
    assert!(toggled.is_active);
    assert_eq!(toggled.response_count, 1);

    // Live -> Paused -> Live
    let paused = env.ctx.surveys.toggle_survey(&survey.id).await.unwrap();
    assert!(!paused.is_active);
    let live = env.ctx.surveys.toggle_survey(&survey.id).await.unwrap();
    assert!(live.is_active);
}

#[tokio::test]
async fn test_paused_survey_rejects_completion() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("paused", None))
        .await
        .unwrap()
        .survey;

    let paused = env.ctx.surveys.toggle_survey(&survey.id).await.unwrap();
    assert!(!paused.is_active);

    let result = env.ctx.surveys.record_completion(&survey.id).await;
    assert!(matches!(result, Err(SurveyhubError::SurveyNotLive(_))));
}

#[tokio::test]
async fn test_lowering_max_below_count_deactivates() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("lower", Some(10)))
        .await
        .unwrap()
        .survey;
    for _ in 0..3 {
        env.ctx.surveys.record_completion(&survey.id).await.unwrap();
    }

    let updated = env
        .ctx
        .surveys
        .update_survey(
            &survey.id,
            UpdateSurveyRequest {
                max_responses: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.response_count, 3);
    assert!(updated.is_full());
    assert!(!updated.is_active);
}

#[tokio::test]
async fn test_negative_max_responses_rejected() {
    let env = TestEnv::new().await;
    let result = env
        .ctx
        .surveys
        .create_survey(survey_request("negative", Some(-1)))
        .await;
    assert!(matches!(result, Err(SurveyhubError::Validation(_))));
}

#[tokio::test]
async fn test_concurrent_submissions_never_overshoot() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("race", Some(3)))
        .await
        .unwrap()
        .survey;

    let submissions = env.ctx.submissions.clone();
    let mut handles = Vec::new();
    for i in 0..10 {
        let submissions = Arc::clone(&submissions);
        let survey_id = survey.id.clone();
        let answers = answers_for(&survey);
        handles.push(tokio::spawn(async move {
            submissions
                .submit(&survey_id, answers, Some(format!("10.0.0.{}", i)))
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(SurveyhubError::SurveyQuotaFull(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(accepted, 3);

    let stored = env.ctx.surveys.get_survey(&survey.id).await.unwrap().survey;
    assert_eq!(stored.response_count, 3);
    assert!(!stored.is_active);

    let (_, rows) = env.ctx.submissions.list_for_survey(&survey.id).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_failed_submission_insert_rolls_back_count() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("rollback", Some(2)))
        .await
        .unwrap()
        .survey;
    let accepted = env
        .ctx
        .submissions
        .submit(&survey.id, answers_for(&survey), None)
        .await
        .unwrap();

    // 主键冲突：插入失败，计数不能变
    let duplicate = Submission {
        id: accepted.submission_id.clone(),
        survey_id: survey.id.clone(),
        responses: answers_for(&survey),
        ip_address: None,
        submitted_at: Utc::now(),
    };
    let result = env.ctx.storage.insert_submission_with_quota(&duplicate).await;
    assert!(matches!(result, Err(SurveyhubError::DatabaseOperation(_))));

    let stored = env.ctx.surveys.get_survey(&survey.id).await.unwrap().survey;
    assert_eq!(stored.response_count, 1);
    assert!(stored.is_active);

    let (_, rows) = env.ctx.submissions.list_for_survey(&survey.id).await.unwrap();
    assert_eq!(rows.len(), 1);

    // 最后一个名额仍然可用
    env.ctx
        .submissions
        .submit(&survey.id, answers_for(&survey), None)
        .await
        .unwrap();
    let stored = env.ctx.surveys.get_survey(&survey.id).await.unwrap().survey;
    assert_eq!(stored.response_count, 2);
    assert!(!stored.is_active);
}

#[tokio::test]
async fn test_list_search_and_paging() {
    let env = TestEnv::new().await;
    for name in ["alpha", "beta", "gamma"] {
        env.ctx
            .surveys
            .create_survey(survey_request(name, None))
            .await
            .unwrap();
    }

    let page = env
        .ctx
        .surveys
        .list_surveys(&SurveyListParams {
            page: Some(1),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages, 2);

    let found = env
        .ctx
        .surveys
        .list_surveys(&SurveyListParams {
            search: Some("BET".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].survey_name, "beta");

    // LIKE 通配符按字面匹配
    for name in ["a_b", "axb"] {
        env.ctx
            .surveys
            .create_survey(survey_request(name, None))
            .await
            .unwrap();
    }
    let search = |term: &str| SurveyListParams {
        search: Some(term.to_string()),
        ..Default::default()
    };
    let literal = env.ctx.surveys.list_surveys(&search("a_b")).await.unwrap();
    assert_eq!(literal.total, 1);
    assert_eq!(literal.items[0].survey_name, "a_b");
    let percent = env.ctx.surveys.list_surveys(&search("%")).await.unwrap();
    assert_eq!(percent.total, 0);

    let bad_sort = env
        .ctx
        .surveys
        .list_surveys(&SurveyListParams {
            sort_by: Some("nope".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad_sort, Err(SurveyhubError::Validation(_))));
}

#[tokio::test]
async fn test_delete_survey_removes_submissions() {
    let env = TestEnv::new().await;
    let survey = env
        .ctx
        .surveys
        .create_survey(survey_request("delete", None))
        .await
        .unwrap()
        .survey;
    env.ctx
        .submissions
        .submit(&survey.id, answers_for(&survey), None)
        .await
        .unwrap();

    env.ctx.surveys.delete_survey(&survey.id).await.unwrap();
    assert!(matches!(
        env.ctx.surveys.get_survey(&survey.id).await,
        Err(SurveyhubError::NotFound(_))
    ));
    assert!(matches!(
        env.ctx.surveys.delete_survey(&survey.id).await,
        Err(SurveyhubError::NotFound(_))
    ));
}
