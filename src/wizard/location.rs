//! Deep-linkable wizard position
//!
//! The current step and draft index are mirrored into the page URL's query
//! string (`?step=roles&draft=2`) so a reload lands on the same step.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const STEP_PARAM: &str = "step";
const DRAFT_PARAM: &str = "draft";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StepLocation {
    pub step_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_index: Option<usize>,
}

impl StepLocation {
    pub fn new(step_id: impl Into<String>, draft_index: Option<usize>) -> Self {
        Self {
            step_id: step_id.into(),
            draft_index,
        }
    }

    /// `url` with `step` and `draft` set; other query parameters are kept
    pub fn apply_to(&self, url: &Url) -> Url {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != STEP_PARAM && k != DRAFT_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut out = url.clone();
        {
            let mut pairs = out.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(STEP_PARAM, &self.step_id);
            if let Some(index) = self.draft_index {
                pairs.append_pair(DRAFT_PARAM, &index.to_string());
            }
        }
        out
    }

    /// Read the location from a URL. `None` without a `step` parameter; an
    /// unparsable `draft` value is ignored.
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut step_id = None;
        let mut draft_index = None;
        for (k, v) in url.query_pairs() {
            match &*k {
                STEP_PARAM if !v.is_empty() => step_id = Some(v.into_owned()),
                DRAFT_PARAM => draft_index = v.parse().ok(),
                _ => {}
            }
        }
        step_id.map(|step_id| Self {
            step_id,
            draft_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unrelated_params() {
        let url = Url::parse("https://example.org/projects/new?channel=city&step=basics").unwrap();
        let out = StepLocation::new("roles", Some(2)).apply_to(&url);

        assert_eq!(out.path(), "/projects/new");
        assert_eq!(out.query(), Some("channel=city&step=roles&draft=2"));
    }

    #[test]
    fn test_from_url() {
        let url = Url::parse("https://example.org/new?draft=3&step=location").unwrap();
        assert_eq!(
            StepLocation::from_url(&url),
            Some(StepLocation::new("location", Some(3)))
        );

        let bad_draft = Url::parse("https://example.org/new?step=roles&draft=x").unwrap();
        assert_eq!(
            StepLocation::from_url(&bad_draft),
            Some(StepLocation::new("roles", None))
        );

        let none = Url::parse("https://example.org/new?draft=1").unwrap();
        assert!(StepLocation::from_url(&none).is_none());
    }

    #[test]
    fn test_location_survives_a_reload() {
        let base = Url::parse("https://example.org/organizations/new").unwrap();
        let location = StepLocation::new("contact", Some(0));
        let url = location.apply_to(&base);
        assert_eq!(StepLocation::from_url(&url), Some(location));
    }
}
