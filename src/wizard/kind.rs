//! Wizard kinds and submission modes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::step::StepRegistry;
use crate::entities;

/// Entity a wizard composes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    Project,
    Organization,
}

impl WizardKind {
    pub fn all() -> &'static [WizardKind] {
        &[WizardKind::Project, WizardKind::Organization]
    }

    /// Identifier used in URLs and draft namespaces
    pub fn slug(&self) -> &'static str {
        match self {
            WizardKind::Project => "project",
            WizardKind::Organization => "organization",
        }
    }

    /// Remote API collection the entity is created in
    pub fn collection(&self) -> &'static str {
        match self {
            WizardKind::Project => "projects",
            WizardKind::Organization => "organizations",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WizardKind::Project => "Project",
            WizardKind::Organization => "Organization",
        }
    }

    /// Static step table for this wizard
    pub fn registry(&self) -> StepRegistry {
        match self {
            WizardKind::Project => entities::project::registry(),
            WizardKind::Organization => entities::organization::registry(),
        }
    }
}

impl fmt::Display for WizardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for WizardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "project" | "projects" => Ok(WizardKind::Project),
            "organization" | "organizations" | "org" => Ok(WizardKind::Organization),
            other => Err(format!("unknown wizard '{other}'")),
        }
    }
}

/// How the final submission treats the aggregate value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmitMode {
    /// New record
    #[default]
    Create,
    /// Update the existing record with this id
    Edit { id: String },
    /// New record seeded from an existing one; server-assigned ids are stripped
    Duplicate,
}

impl SubmitMode {
    /// Whether this flow keeps a resumable local draft
    pub fn persists_drafts(&self) -> bool {
        !matches!(self, SubmitMode::Edit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wizard_kind_from_str() {
        assert_eq!("project".parse::<WizardKind>(), Ok(WizardKind::Project));
        assert_eq!("Organizations".parse::<WizardKind>(), Ok(WizardKind::Organization));
        assert!("volunteer".parse::<WizardKind>().is_err());
    }

    #[test]
    fn test_every_kind_has_a_registry() {
        for kind in WizardKind::all() {
            let registry = kind.registry();
            assert_eq!(registry.kind(), *kind);
            assert!(!registry.steps().is_empty());
        }
    }

    #[test]
    fn test_submit_mode_serde() {
        let mode: SubmitMode = serde_json::from_str(r#"{"mode":"edit","id":"42"}"#).unwrap();
        assert_eq!(mode, SubmitMode::Edit { id: "42".into() });
        assert!(!mode.persists_drafts());
        assert!(SubmitMode::Duplicate.persists_drafts());
    }
}
