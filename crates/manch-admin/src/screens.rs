//! The screen registry.
//!
//! Every content type of the platform is a [`ScreenConfig`]: a namespace,
//! a title, an ordered field schema, and an optional asset slot.  The
//! lifecycle manager validates against the same schema the form renderer
//! displays, so the two can never disagree about which fields exist.

use serde::Serialize;

use manch_media::UploadConstraints;
use manch_shared::schema::{FieldKind, FieldSpec};
use manch_shared::Namespace;

/// What kind of file a screen's asset slot accepts.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Pdf,
}

impl AssetKind {
    pub fn constraints(self) -> UploadConstraints {
        match self {
            AssetKind::Image => UploadConstraints::images(),
            AssetKind::Pdf => UploadConstraints::pdf(),
        }
    }
}

/// One CRUD screen as pure configuration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScreenConfig {
    pub namespace: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    pub asset: Option<AssetKind>,
}

impl ScreenConfig {
    /// The screen's collection namespace.
    pub fn collection(&self) -> Namespace {
        // registry namespaces are static and covered by a test below
        Namespace::parse(self.namespace).expect("screen namespace is valid")
    }
}

use FieldKind::{Date, Email, Multiline, Phone, Text, Url};

/// All content screens of the platform.
pub const REGISTRY: &[ScreenConfig] = &[
    ScreenConfig {
        namespace: "banners",
        title: "Banners",
        fields: &[
            FieldSpec::required("title", "Title", Text),
            FieldSpec::required("startDate", "Visible from", Date),
            FieldSpec::required("endDate", "Visible until", Date),
        ],
        asset: Some(AssetKind::Image),
    },
    ScreenConfig {
        namespace: "news",
        title: "News",
        fields: &[
            FieldSpec::required("title", "Headline", Text),
            FieldSpec::required("summary", "Summary", Multiline),
            FieldSpec::optional("publishedOn", "Published on", Date),
            FieldSpec::optional("link", "External link", Url),
        ],
        asset: Some(AssetKind::Image),
    },
    ScreenConfig {
        namespace: "biography",
        title: "Biography",
        fields: &[
            FieldSpec::required("heading", "Heading", Text),
            FieldSpec::required("body", "Body", Multiline),
        ],
        asset: Some(AssetKind::Image),
    },
    ScreenConfig {
        namespace: "completed_works",
        title: "Completed works",
        fields: &[
            FieldSpec::required("title", "Title", Text),
            FieldSpec::required("description", "Description", Multiline),
            FieldSpec::optional("location", "Location", Text),
            FieldSpec::optional("completedOn", "Completed on", Date),
        ],
        asset: Some(AssetKind::Image),
    },
    ScreenConfig {
        namespace: "leaders",
        title: "Leaders",
        fields: &[
            FieldSpec::required("name", "Name", Text),
            FieldSpec::required("designation", "Designation", Text),
            FieldSpec::optional("about", "About", Multiline),
        ],
        asset: Some(AssetKind::Image),
    },
    ScreenConfig {
        namespace: "parties",
        title: "Parties",
        fields: &[
            FieldSpec::required("name", "Party name", Text),
            FieldSpec::optional("president", "President", Text),
            FieldSpec::optional("founded", "Founded", Date),
        ],
        asset: Some(AssetKind::Image),
    },
    ScreenConfig {
        namespace: "schemes",
        title: "Government schemes",
        fields: &[
            FieldSpec::required("title", "Scheme name", Text),
            FieldSpec::required("summary", "Summary", Multiline),
            FieldSpec::optional("department", "Department", Text),
            FieldSpec::optional("link", "Application link", Url),
        ],
        asset: Some(AssetKind::Pdf),
    },
    ScreenConfig {
        namespace: "contacts",
        title: "Contact submissions",
        fields: &[
            FieldSpec::required("name", "Name", Text),
            FieldSpec::required("phone", "Phone", Phone),
            FieldSpec::optional("email", "Email", Email),
            FieldSpec::optional("message", "Message", Multiline),
        ],
        asset: None,
    },
    ScreenConfig {
        namespace: "join_requests",
        title: "Join requests",
        fields: &[
            FieldSpec::required("name", "Name", Text),
            FieldSpec::required("phone", "Phone", Phone),
            FieldSpec::optional("village", "Village", Text),
            FieldSpec::optional("occupation", "Occupation", Text),
        ],
        asset: None,
    },
    ScreenConfig {
        namespace: "user_roles",
        title: "User roles",
        fields: &[
            FieldSpec::required("email", "Email", Email),
            FieldSpec::required("role", "Role", Text),
            FieldSpec::optional("displayName", "Display name", Text),
        ],
        asset: None,
    },
];

/// Look a screen up by namespace.
pub fn find(namespace: &str) -> Option<&'static ScreenConfig> {
    REGISTRY.iter().find(|s| s.namespace == namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_namespaces_are_valid_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for screen in REGISTRY {
            let _ = screen.collection();
            assert!(seen.insert(screen.namespace), "duplicate {}", screen.namespace);
        }
    }

    #[test]
    fn every_screen_has_a_required_field() {
        for screen in REGISTRY {
            assert!(
                screen.fields.iter().any(|f| f.required),
                "{} has no required field",
                screen.namespace
            );
        }
    }

    #[test]
    fn find_resolves_known_namespaces() {
        assert!(find("banners").is_some());
        assert!(find("schemes").is_some());
        assert!(find("unknown").is_none());
    }
}
