//! Pipeline configuration, loaded from a TOML file.
//!
//! Every field has a default so an absent file, or a file that only sets a
//! few keys, still yields a usable configuration.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

const DEFAULT_FEEDS: &[&str] = &[
    "http://www.boannews.com/media/news_rss.xml?mkind=1",
    "http://www.boannews.com/media/news_rss.xml?kind=1",
    "http://www.boannews.com/media/news_rss.xml?kind=4",
    "http://www.boannews.com/media/news_rss.xml?skind=5",
    "https://knvd.krcert.or.kr/rss/securityInfo.do",
    "https://knvd.krcert.or.kr/rss/securityNotice.do",
    "https://www.dailysecu.com/rss/allArticle.xml",
    "https://feeds.feedburner.com/TheHackersNews",
    "https://krebsonsecurity.com/feed/",
    "https://www.bleepingcomputer.com/feed/",
    "https://us-cert.cisa.gov/ncas/all.xml",
    "https://www.darkreading.com/rss_simple.xml",
    "https://isc.sans.edu/rss.xml",
];

const DEFAULT_KEYWORDS: &[&str] = &[
    "랜섬웨어", "Ransomware", "다크웹", "Darkweb", "APT", "Advanced Persistent Threat",
    "제로데이", "Zero-day", "취약점", "Vulnerability", "익스플로잇", "Exploit",
    "해킹", "Hacking", "침해사고", "Breach", "정보유출", "Data Breach", "데이터 유출", "Data Leak",
    "피싱", "Phishing", "스피어피싱", "Spear Phishing", "악성코드", "Malware",
    "트로이 목마", "Trojan", "바이러스", "Virus",
    "디도스", "DDoS", "서비스 거부", "Denial of Service",
    "공급망 공격", "Supply Chain Attack",
    "스캠", "Scam", "사기", "Fraud",
    "보안 업데이트", "Security Update", "패치", "Patch", "보안 권고", "Security Advisory", "CISA",
    "클라우드 보안", "Cloud Security", "OT 보안", "OT Security", "ICS 보안", "ICS Security",
    "산업 제어 시스템", "Industrial Control System",
    "AI 보안", "AI Security", "머신러닝 보안", "Machine Learning Security",
    "보안 인증", "Security Certification", "GDPR", "개인정보보호", "Privacy", "PII",
    "Personally Identifiable Information",
    "규제", "Regulation", "법률", "Law", "가이드라인", "Guideline",
    "사이버 안보", "Cybersecurity", "국가 안보", "National Security",
    "아동 성착취물", "CSAM", "아동 음란물", "Child Pornography",
    "다크 패턴", "Dark Patterns", "불법 광고",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub feeds: Vec<String>,
    pub keywords: Vec<String>,
    /// Only entries published within this many days are collected.
    pub latest_days: i64,
    /// Length of the weekly window; the window spans this many days plus today.
    pub weekly_report_days: i64,
    pub data_dir: PathBuf,
    pub weekly_report_dir: PathBuf,
    pub analysis_report_dir: PathBuf,
    /// Fixed UTC offset all timestamps are expressed in, e.g. `+09:00`.
    pub timezone: String,
    pub user_agent: String,
    pub inference: InferenceSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            latest_days: 2,
            weekly_report_days: 7,
            data_dir: PathBuf::from("security_news_data"),
            weekly_report_dir: PathBuf::from("weekly_reports"),
            analysis_report_dir: PathBuf::from("ai_analysis_reports"),
            timezone: "+09:00".to_string(),
            user_agent: format!("secnews/{}", env!("CARGO_PKG_VERSION")),
            inference: InferenceSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Backend name: `dummy`, `deepseek`, `gemini` or `ollama`.
    pub model: String,
    pub model_url: Option<String>,
    pub model_name: Option<String>,
    /// Environment variable holding the API key of the backend.
    pub api_key_env: Option<String>,
    pub max_input_chars: usize,
    pub min_valid_chars: usize,
    pub min_article_chars: usize,
    pub report_language: String,
    pub translate: bool,
    pub target_language: String,
    pub translate_from: Vec<String>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            model: "dummy".to_string(),
            model_url: None,
            model_name: None,
            api_key_env: None,
            max_input_chars: 3000,
            min_valid_chars: 50,
            min_article_chars: 30,
            report_language: "Korean".to_string(),
            translate: false,
            target_language: "en".to_string(),
            translate_from: vec!["ko".to_string()],
        }
    }
}

impl InferenceSettings {
    /// Reads the API key from the configured environment variable, if any.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl PipelineConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, days) in [("latest_days", self.latest_days), ("weekly_report_days", self.weekly_report_days)] {
            if !(1..=MAX_DAYS).contains(&days) {
                return Err(Error::Config(format!("{} must be between 1 and {}", name, MAX_DAYS)));
            }
        }
        if self.inference.max_input_chars == 0 {
            return Err(Error::Config("inference.max_input_chars must be positive".to_string()));
        }
        for feed in &self.feeds {
            Url::parse(feed).map_err(|e| Error::Config(format!("invalid feed URL {}: {}", feed, e)))?;
        }
        self.offset()?;
        Ok(())
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        parse_offset(&self.timezone)
    }
}

/// Upper bound for day counts; keeps date arithmetic in range.
pub const MAX_DAYS: i64 = 3650;

/// Parses `+09:00`, `-0530`, `+9`, `UTC` or `Z` into a fixed offset.
pub fn parse_offset(value: &str) -> Result<FixedOffset> {
    let value = value.trim();
    let invalid = || Error::Config(format!("invalid timezone offset: {}", value));
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    if !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return Err(invalid());
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => match (rest.get(..2), rest.get(2..)) {
            (Some(h), Some(m)) => (h, m),
            _ => return Err(invalid()),
        },
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.latest_days, 2);
        assert_eq!(config.weekly_report_days, 7);
        assert_eq!(config.offset().unwrap().local_minus_utc(), 9 * 3600);
        assert!(config.keywords.iter().any(|k| k == "랜섬웨어"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            latest_days = 3
            keywords = ["Ransomware"]

            [inference]
            model = "deepseek"
            translate = true
            "#,
        )
        .unwrap();
        assert_eq!(config.latest_days, 3);
        assert_eq!(config.keywords, vec!["Ransomware".to_string()]);
        assert_eq!(config.weekly_report_days, 7);
        assert_eq!(config.inference.model, "deepseek");
        assert!(config.inference.translate);
        assert_eq!(config.inference.max_input_chars, 3000);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(PipelineConfig::from_toml("latest_days = 0").is_err());
        assert!(PipelineConfig::from_toml("timezone = \"Asia/Seoul\"").is_err());
        assert!(PipelineConfig::from_toml("feeds = [\"not a url\"]").is_err());
    }

    #[test]
    fn test_day_counts_are_bounded() {
        assert!(PipelineConfig::from_toml("latest_days = 3650").is_ok());
        assert!(PipelineConfig::from_toml("latest_days = 100000").is_err());
        assert!(PipelineConfig::from_toml("weekly_report_days = 99999999999").is_err());
        assert!(PipelineConfig::from_toml("weekly_report_days = -1").is_err());
    }

    #[test]
    fn test_parse_offset_forms() {
        assert_eq!(parse_offset("+09:00").unwrap().local_minus_utc(), 32400);
        assert_eq!(parse_offset("-0530").unwrap().local_minus_utc(), -19800);
        assert_eq!(parse_offset("+9").unwrap().local_minus_utc(), 32400);
        assert_eq!(parse_offset("UTC").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("09:00").is_err());
        assert!(parse_offset("+25:00").is_err());
        assert!(parse_offset("+a한").is_err());
        assert!(parse_offset("+-9").is_err());
        assert!(parse_offset("+").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
