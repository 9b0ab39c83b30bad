pub mod admin;
pub mod dashboard;
pub mod health;
pub mod helpers;
pub mod registration;
pub mod submission;
pub mod survey;
pub mod survey_link;
pub mod types;

pub use admin::{ClientIpKeyExtractor, admin_routes};
pub use dashboard::dashboard_routes;
pub use health::{AppStartTime, health_routes};
pub use helpers::{ApiResponse, api_result, error_from_surveyhub, error_response, success_response};
pub use registration::{otp_routes, registration_routes};
pub use submission::submission_routes;
pub use survey::survey_routes;
pub use survey_link::survey_link_routes;

/// 挂载全部路由
pub fn configure_routes(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(admin_routes())
        .service(survey_routes())
        .service(submission_routes())
        .service(survey_link_routes())
        .service(registration_routes())
        .service(otp_routes())
        .service(dashboard_routes())
        .service(health_routes());
}
