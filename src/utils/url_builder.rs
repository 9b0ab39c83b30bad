//! 跳转链接 / 问卷链接生成

use std::collections::BTreeMap;

/// 点击回调的固定路径
pub const CLICK_PATH: &str = "/api/survey/click";

fn trim_base(base: &str) -> &str {
    base.trim().trim_end_matches('/')
}

/// 生成点击回调 URL
///
/// 形如 `{base}/api/survey/click?k1=v1&k2=v2&status=complete`：
/// 跳过 key 或 value 为空白的参数，按 key 排序，`status` 总在最后。
pub fn build_click_url(base: &str, parameters: &BTreeMap<String, String>, status: &str) -> String {
    let mut pairs: Vec<String> = parameters
        .iter()
        .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty() && k.trim() != "status")
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.trim()),
                urlencoding::encode(v.trim())
            )
        })
        .collect();
    pairs.push(format!("status={}", urlencoding::encode(status)));

    format!("{}{}?{}", trim_base(base), CLICK_PATH, pairs.join("&"))
}

/// 受访者打开问卷的链接
pub fn build_survey_link(base: &str, survey_id: &str) -> String {
    format!("{}/survey/{}", trim_base(base), survey_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_status_is_last_and_keys_sorted() {
        let url = build_click_url(
            "https://hub.example.com/",
            &params(&[("uid", "u1"), ("pid", "p9")]),
            "complete",
        );
        assert_eq!(
            url,
            "https://hub.example.com/api/survey/click?pid=p9&uid=u1&status=complete"
        );
    }

    #[test]
    fn test_blank_params_are_skipped() {
        let url = build_click_url(
            "http://localhost:8080",
            &params(&[("", "x"), ("uid", "  "), ("pid", "42")]),
            "terminate",
        );
        assert_eq!(
            url,
            "http://localhost:8080/api/survey/click?pid=42&status=terminate"
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let url = build_click_url(
            "http://h",
            &params(&[("uid", "a b&c")]),
            "quota_full",
        );
        assert_eq!(
            url,
            "http://h/api/survey/click?uid=a%20b%26c&status=quota_full"
        );
    }

    #[test]
    fn test_status_parameter_cannot_be_overridden() {
        let url = build_click_url("http://h", &params(&[("status", "complete")]), "terminate");
        assert_eq!(url, "http://h/api/survey/click?status=terminate");
    }

    #[test]
    fn test_survey_link() {
        assert_eq!(
            build_survey_link("http://localhost:8080/", "abc"),
            "http://localhost:8080/survey/abc"
        );
    }
}
