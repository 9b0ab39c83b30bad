use std::sync::Arc;

use actix_web::web;
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::services::{AppStartTime, configure_routes};
use crate::config::get_config;
use crate::services::{
    AdminService, ClickService, DashboardService, LinkService, LogOtpSender, OtpSender,
    OtpService, RegistrationService, SubmissionService, SurveyService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};

/// 服务启动所需的全部共享状态
#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub surveys: Arc<SurveyService>,
    pub clicks: Arc<ClickService>,
    pub links: Arc<LinkService>,
    pub submissions: Arc<SubmissionService>,
    pub otp: Arc<OtpService>,
    pub registrations: Arc<RegistrationService>,
    pub admins: Arc<AdminService>,
    pub dashboard: Arc<DashboardService>,
    pub app_start_time: AppStartTime,
}

impl StartupContext {
    /// 基于已就绪的存储装配各个 service
    pub fn from_storage(storage: Arc<SeaOrmStorage>, otp_sender: Arc<dyn OtpSender>) -> Self {
        let config = get_config();

        let surveys = Arc::new(SurveyService::new(storage.clone()));
        let otp = Arc::new(OtpService::new(
            storage.clone(),
            otp_sender,
            config.otp.clone(),
        ));

        Self {
            clicks: Arc::new(ClickService::new(storage.clone(), surveys.clone())),
            links: Arc::new(LinkService::new(storage.clone())),
            submissions: Arc::new(SubmissionService::new(storage.clone(), surveys.clone())),
            registrations: Arc::new(RegistrationService::new(storage.clone(), otp.clone())),
            admins: Arc::new(AdminService::new(storage.clone())),
            dashboard: Arc::new(DashboardService::new(storage.clone())),
            surveys,
            otp,
            storage,
            app_start_time: AppStartTime {
                start_datetime: chrono::Utc::now(),
            },
        }
    }

    /// 注册 `web::Data` 与全部路由
    pub fn configure_app(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(self.surveys.clone()))
            .app_data(web::Data::new(self.clicks.clone()))
            .app_data(web::Data::new(self.links.clone()))
            .app_data(web::Data::new(self.submissions.clone()))
            .app_data(web::Data::new(self.otp.clone()))
            .app_data(web::Data::new(self.registrations.clone()))
            .app_data(web::Data::new(self.admins.clone()))
            .app_data(web::Data::new(self.dashboard.clone()))
            .app_data(web::Data::new(self.app_start_time.clone()))
            .app_data(web::JsonConfig::default().limit(1024 * 1024));
        configure_routes(cfg);
    }
}

/// 首次启动时按配置创建初始管理员
pub async fn ensure_bootstrap_admin(admins: &AdminService) -> Result<()> {
    let auth = &get_config().auth;
    let created = admins
        .bootstrap(&auth.bootstrap_username, auth.bootstrap_password.as_deref())
        .await
        .context("Failed to bootstrap admin account")?;

    if !created {
        debug!("Admin bootstrap skipped");
    }
    Ok(())
}

/// 准备服务器启动的上下文：存储、迁移、service 装配、初始管理员
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let context = StartupContext::from_storage(storage, Arc::new(LogOtpSender));
    ensure_bootstrap_admin(&context.admins).await?;

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(context)
}
