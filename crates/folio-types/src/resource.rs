//! Collection descriptors.
//!
//! Every collection the API serves is described by a [`Schema`]: where it is
//! stored, which timestamps the handlers manage, and who may call each
//! operation. The field struct itself is the payload schema; serde decides
//! which fields are required and which fall back to defaults, and
//! [`Resource::validate`] adds the checks serde cannot express.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{AboutProfile, BlogPost, ContactMessage, Project};

/// Timestamps a collection maintains on its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamps {
    /// `createdAt` only; the document is immutable.
    Created,
    /// `updatedAt` only.
    Updated,
    CreatedAndUpdated,
}

impl Timestamps {
    pub fn tracks_created(self) -> bool {
        matches!(self, Self::Created | Self::CreatedAndUpdated)
    }

    pub fn tracks_updated(self) -> bool {
        matches!(self, Self::Updated | Self::CreatedAndUpdated)
    }
}

/// Who may call an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Admin,
    /// The route does not exist for this collection.
    Denied,
}

impl Access {
    pub fn is_routed(self) -> bool {
        self != Self::Denied
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Store collection name.
    pub collection: &'static str,
    /// Path segment under `/api`.
    pub route: &'static str,
    /// Human label used in client-facing messages ("Blog not found").
    pub label: &'static str,
    pub timestamps: Timestamps,
    pub list: Access,
    pub get: Access,
    pub create: Access,
    pub update: Access,
    pub delete: Access,
    pub upload: Access,
}

impl Schema {
    /// Listings are newest-first whenever documents carry `createdAt`.
    pub fn newest_first(&self) -> bool {
        self.timestamps.tracks_created()
    }
}

pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const SCHEMA: Schema;

    /// Semantic checks on an already well-shaped payload. The error string is
    /// returned to the client verbatim.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

fn require_entries(field: &str, values: &[String]) -> Result<(), String> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(format!("{field} must not contain empty entries"));
    }
    Ok(())
}

impl Resource for BlogPost {
    const SCHEMA: Schema = Schema {
        collection: "blogs",
        route: "blogs",
        label: "Blog",
        timestamps: Timestamps::CreatedAndUpdated,
        list: Access::Public,
        get: Access::Public,
        create: Access::Admin,
        update: Access::Admin,
        delete: Access::Admin,
        upload: Access::Admin,
    };

    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        require_text("excerpt", &self.excerpt)
    }
}

impl Resource for Project {
    const SCHEMA: Schema = Schema {
        collection: "projects",
        route: "projects",
        label: "Project",
        timestamps: Timestamps::CreatedAndUpdated,
        list: Access::Public,
        get: Access::Public,
        create: Access::Admin,
        update: Access::Admin,
        delete: Access::Admin,
        upload: Access::Admin,
    };

    // imageUrl and the links may legitimately be empty while a project is
    // being drafted.
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)
    }
}

impl Resource for AboutProfile {
    const SCHEMA: Schema = Schema {
        collection: "about",
        route: "about",
        label: "About section",
        timestamps: Timestamps::Updated,
        list: Access::Public,
        get: Access::Public,
        create: Access::Admin,
        update: Access::Admin,
        delete: Access::Admin,
        upload: Access::Admin,
    };

    fn validate(&self) -> Result<(), String> {
        require_text("bio", &self.bio)?;
        require_entries("skills", &self.skills)?;
        require_entries("hobbies", &self.hobbies)
    }
}

impl Resource for ContactMessage {
    const SCHEMA: Schema = Schema {
        collection: "contacts",
        route: "contact",
        label: "Contact",
        timestamps: Timestamps::Created,
        list: Access::Admin,
        get: Access::Denied,
        create: Access::Public,
        update: Access::Denied,
        delete: Access::Admin,
        upload: Access::Denied,
    };

    fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("message", &self.message)?;
        match self.email.trim().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err("email must be a valid email address".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(email: &str) -> ContactMessage {
        ContactMessage {
            name: "Ada".into(),
            email: email.into(),
            message: "Hello".into(),
        }
    }

    #[test]
    fn contact_email_needs_both_parts() {
        assert!(contact("ada@example.com").validate().is_ok());
        assert!(contact("ada@").validate().is_err());
        assert!(contact("@example.com").validate().is_err());
        assert!(contact("ada.example.com").validate().is_err());
    }

    #[test]
    fn blank_required_text_is_rejected() {
        let post = BlogPost {
            title: "   ".into(),
            content: "C".into(),
            excerpt: "E".into(),
        };
        assert_eq!(post.validate().unwrap_err(), "title must not be empty");
    }

    #[test]
    fn project_demo_link_defaults_to_empty() {
        let project: Project = serde_json::from_str(
            r#"{"title":"T","description":"D","image_url":"i","githubLink":"g"}"#,
        )
        .unwrap();
        assert_eq!(project.demo_link, "");
        assert_eq!(project.image_url, "i");
        assert!(project.validate().is_ok());
    }

    #[test]
    fn about_skills_reject_blank_entries() {
        let about = AboutProfile {
            bio: "bio".into(),
            skills: vec!["Rust".into(), " ".into()],
            hobbies: vec![],
        };
        assert!(about.validate().is_err());
    }

    #[test]
    fn only_timestamped_collections_sort_newest_first() {
        assert!(BlogPost::SCHEMA.newest_first());
        assert!(ContactMessage::SCHEMA.newest_first());
        assert!(!AboutProfile::SCHEMA.newest_first());
    }
}
