use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document as clients see it: the store identifier projected to
/// `id`, the resource's own fields inline, and whichever timestamps the
/// resource manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    pub id: String,
    #[serde(flatten)]
    pub fields: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

/// Multi-word fields also accept their snake_case spelling, which older
/// admin clients send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(alias = "image_url")]
    pub image_url: String,
    #[serde(alias = "github_link")]
    pub github_link: String,
    #[serde(default, alias = "demo_link")]
    pub demo_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutProfile {
    pub bio: String,
    pub skills: Vec<String>,
    pub hobbies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}
