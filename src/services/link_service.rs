//! Redirect link management
//!
//! The stored `url` is always regenerated from `parameters` and `status`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::config::get_config;
use crate::errors::{Result, SurveyhubError};
use crate::storage::{ClickStatus, SeaOrmStorage, SurveyLink};
use crate::utils::url_builder::build_click_url;
use crate::utils::validators::require_non_blank;

#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    pub name: String,
    pub parameters: BTreeMap<String, String>,
    pub status: ClickStatus,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLinkRequest {
    pub name: Option<String>,
    pub parameters: Option<BTreeMap<String, String>>,
    pub status: Option<ClickStatus>,
}

/// 去掉空白 key，key/value 两端空白
fn clean_parameters(parameters: BTreeMap<String, String>) -> BTreeMap<String, String> {
    parameters
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn render_url(parameters: &BTreeMap<String, String>, status: ClickStatus) -> String {
        build_click_url(
            &get_config().server.public_base_url,
            parameters,
            status.as_ref(),
        )
    }

    pub async fn list_links(&self) -> Result<Vec<SurveyLink>> {
        self.storage.list_links().await
    }

    pub async fn get_link(&self, id: &str) -> Result<SurveyLink> {
        self.storage
            .get_link(id)
            .await?
            .ok_or_else(|| SurveyhubError::not_found(format!("Link not found: {}", id)))
    }

    pub async fn create_link(&self, req: CreateLinkRequest) -> Result<SurveyLink> {
        let name = require_non_blank(&req.name, "name")?;
        let parameters = clean_parameters(req.parameters);
        let now = Utc::now();

        let link = SurveyLink {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            url: Self::render_url(&parameters, req.status),
            parameters,
            status: req.status,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_link(&link).await?;
        Ok(link)
    }

    pub async fn update_link(&self, id: &str, req: UpdateLinkRequest) -> Result<SurveyLink> {
        let mut link = self.get_link(id).await?;

        if let Some(name) = req.name {
            link.name = require_non_blank(&name, "name")?;
        }
        if let Some(parameters) = req.parameters {
            link.parameters = clean_parameters(parameters);
        }
        if let Some(status) = req.status {
            link.status = status;
        }
        link.url = Self::render_url(&link.parameters, link.status);
        link.updated_at = Utc::now();

        self.storage.update_link(&link).await?;
        Ok(link)
    }

    pub async fn delete_link(&self, id: &str) -> Result<()> {
        self.storage.delete_link(id).await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<SurveyLink> {
        self.storage.set_link_active(id, active).await?;
        self.get_link(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_parameters() {
        let mut raw = BTreeMap::new();
        raw.insert(" pid ".to_string(), " P1 ".to_string());
        raw.insert("  ".to_string(), "x".to_string());
        raw.insert("uid".to_string(), String::new());

        let cleaned = clean_parameters(raw);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.get("pid").map(String::as_str), Some("P1"));
        assert_eq!(cleaned.get("uid").map(String::as_str), Some(""));
    }
}
