//! 集成测试公共设施：临时 SQLite 数据库 + 装配好的 service

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;

use surveyhub::config::init_config_from;
use surveyhub::runtime::lifetime::startup::StartupContext;
use surveyhub::services::{CreateSurveyRequest, OtpSender};
use surveyhub::storage::{AnswerType, Question, SeaOrmStorage};
use tempfile::TempDir;

static INIT: Once = Once::new();

/// 加载不存在的配置文件 = 全部默认值（ENV 仍生效）
pub fn init_test_config() {
    INIT.call_once(|| {
        init_config_from("surveyhub-test-nonexistent.toml");
    });
}

/// 记录发送内容的验证码通道
#[derive(Default)]
pub struct CapturingSender {
    pub sent: Mutex<Vec<(String, String)>>,
    /// 为 true 时下一次发送失败
    pub fail_next: AtomicBool,
}

impl CapturingSender {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl OtpSender for CapturingSender {
    async fn send(&self, email: &str, code: &str, _ttl_secs: u64) -> surveyhub::errors::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(surveyhub::errors::SurveyhubError::file_operation(
                "mail relay unavailable",
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestEnv {
    pub ctx: StartupContext,
    pub sender: Arc<CapturingSender>,
    _dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        init_test_config();

        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("surveyhub_test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let storage = Arc::new(
            SeaOrmStorage::new(&db_url, "sqlite")
                .await
                .expect("Failed to create storage"),
        );
        let sender = Arc::new(CapturingSender::default());
        let ctx = StartupContext::from_storage(storage, sender.clone());

        Self {
            ctx,
            sender,
            _dir: dir,
        }
    }
}

pub fn question(text: &str, answer_type: AnswerType, options: &[&str]) -> Question {
    Question {
        id: String::new(),
        question_text: text.to_string(),
        answer_type,
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

pub fn survey_request(name: &str, max_responses: Option<i64>) -> CreateSurveyRequest {
    CreateSurveyRequest {
        survey_name: name.to_string(),
        description: "integration test survey".to_string(),
        project_id_from_client: "CLIENT-1".to_string(),
        project_id_from_inter: format!("INTER-{}", name),
        questions: vec![
            question("Your name?", AnswerType::Text, &[]),
            question("Favourite colour?", AnswerType::Single, &["Red", "Blue"]),
        ],
        redirect_url: "https://example.com/thanks".to_string(),
        max_responses,
    }
}
