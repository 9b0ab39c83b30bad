//! Service layer for business logic
//!
//! Survey lifecycle, quota gate, click capture, links, submissions,
//! registration/OTP, admin accounts and dashboard aggregates. Shared by
//! the HTTP handlers and the CLI.

mod admin_service;
mod click_service;
mod dashboard_service;
mod link_service;
mod otp_service;
mod registration_service;
mod submission_service;
mod survey_service;

pub use admin_service::*;
pub use click_service::*;
pub use dashboard_service::*;
pub use link_service::*;
pub use otp_service::*;
pub use registration_service::*;
pub use submission_service::*;
pub use survey_service::*;

use crate::config::get_config;

/// 一页结果
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

/// page 从 1 开始；limit 夹在 1..=max_page_size
pub fn normalize_paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let survey = &get_config().survey;
    let page = page.unwrap_or(1).max(1);
    let limit = limit
        .unwrap_or(survey.default_page_size)
        .clamp(1, survey.max_page_size.max(1));
    (page, limit)
}
