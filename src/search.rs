//! Fuzzy search and display ordering.
//!
//! With an empty query the view is sectioned: recently opened projects
//! first (recency order, capped), then everything else in backend order.
//! With a query, sectioning is suppressed and projects are ranked by a
//! weighted fuzzy score over name and description. Matching is pure fuzzy —
//! position in the string carries no bonus beyond what the matcher itself
//! assigns.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};
use std::collections::HashSet;

use crate::models::Project;

/// Relative weight of a name match.
pub const NAME_WEIGHT: f64 = 0.7;

/// Relative weight of a description match.
pub const DESCRIPTION_WEIGHT: f64 = 0.3;

/// Minimum weighted similarity for a project to appear in results.
pub const MIN_SCORE: f64 = 0.3;

/// Default number of recents shown in the sectioned view.
pub const DEFAULT_RECENT_DISPLAY: usize = 5;

/// A project with its query similarity, `MIN_SCORE..=1.0`.
#[derive(Debug, Clone)]
pub struct ScoredProject {
    pub project: Project,
    pub score: f64,
}

/// The ordered view handed to a UI.
#[derive(Debug, Clone)]
pub enum Ranked {
    /// Empty-query view: recents first, then the rest in backend order.
    Sections {
        recent: Vec<Project>,
        remainder: Vec<Project>,
    },
    /// Query view: one flat list, best match first.
    Matches(Vec<ScoredProject>),
}

/// Produce the display ordering for `projects` given the current query and
/// the recency list (most-recent-first).
pub fn rank(
    projects: &[Project],
    query: &str,
    recent_ids: &[String],
    recent_display: usize,
) -> Ranked {
    let query = query.trim();
    if query.is_empty() {
        return section(projects, recent_ids, recent_display);
    }
    Ranked::Matches(score_all(projects, query))
}

fn section(projects: &[Project], recent_ids: &[String], recent_display: usize) -> Ranked {
    let recent: Vec<Project> = recent_ids
        .iter()
        .filter_map(|id| projects.iter().find(|p| &p.id == id))
        .take(recent_display)
        .cloned()
        .collect();

    let shown: HashSet<&str> = recent.iter().map(|p| p.id.as_str()).collect();
    let remainder: Vec<Project> = projects
        .iter()
        .filter(|p| !shown.contains(p.id.as_str()))
        .cloned()
        .collect();

    Ranked::Sections { recent, remainder }
}

fn score_all(projects: &[Project], query: &str) -> Vec<ScoredProject> {
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = Pattern::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
    );

    // Normalize field scores against the pattern matched on the query text
    // itself, which is the best score this pattern can realistically earn.
    let mut buf = Vec::new();
    let self_score = pattern
        .score(Utf32Str::new(query, &mut buf), &mut matcher)
        .unwrap_or(1)
        .max(1) as f64;

    let mut scored: Vec<ScoredProject> = projects
        .iter()
        .filter_map(|project| {
            let name_sim = similarity(&pattern, &mut matcher, self_score, &project.name);
            let desc_sim = project
                .description
                .as_deref()
                .map(|d| similarity(&pattern, &mut matcher, self_score, d))
                .unwrap_or(0.0);

            let score = NAME_WEIGHT * name_sim + DESCRIPTION_WEIGHT * desc_sim;
            if score < MIN_SCORE {
                return None;
            }
            Some(ScoredProject {
                project: project.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.project.id.cmp(&b.project.id))
    });
    scored
}

fn similarity(pattern: &Pattern, matcher: &mut Matcher, self_score: f64, text: &str) -> f64 {
    let mut buf = Vec::new();
    match pattern.score(Utf32Str::new(text, &mut buf), matcher) {
        Some(score) => (score as f64 / self_score).min(1.0),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn project(id: &str, name: &str, description: Option<&str>) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            open_url: Url::parse(&format!("https://chatgpt.com/g/p-{}", id)).unwrap(),
            description: description.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn query_matches_by_name_and_excludes_misses() {
        let projects = vec![
            project("p1", "Billing Q3", Some("invoices")),
            project("p2", "Marketing", None),
        ];

        let Ranked::Matches(matches) = rank(&projects, "billing", &[], 5) else {
            panic!("expected matches");
        };
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].project.id, "p1");
    }

    #[test]
    fn name_match_outranks_description_match() {
        let projects = vec![
            project("p1", "Notes", Some("billing archive")),
            project("p2", "Billing", None),
        ];

        let Ranked::Matches(matches) = rank(&projects, "billing", &[], 5) else {
            panic!("expected matches");
        };
        assert_eq!(matches[0].project.id, "p2");
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn query_suppresses_recency_sectioning() {
        let projects = vec![
            project("p1", "Billing Q3", None),
            project("p2", "Billing Q4", None),
        ];
        let recents = vec!["p2".to_string()];

        match rank(&projects, "billing", &recents, 5) {
            Ranked::Matches(matches) => assert_eq!(matches.len(), 2),
            Ranked::Sections { .. } => panic!("sectioning must be suppressed while searching"),
        }
    }

    #[test]
    fn empty_query_sections_recent_then_remainder() {
        let projects = vec![
            project("p1", "Alpha", None),
            project("p2", "Beta", None),
            project("p3", "Gamma", None),
        ];
        let recents = vec!["p2".to_string(), "p1".to_string()];

        let Ranked::Sections { recent, remainder } = rank(&projects, "", &recents, 2) else {
            panic!("expected sections");
        };
        let recent_ids: Vec<&str> = recent.iter().map(|p| p.id.as_str()).collect();
        let remainder_ids: Vec<&str> = remainder.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(recent_ids, vec!["p2", "p1"]);
        assert_eq!(remainder_ids, vec!["p3"]);
    }

    #[test]
    fn recent_section_respects_display_cap() {
        let projects = vec![
            project("p1", "Alpha", None),
            project("p2", "Beta", None),
            project("p3", "Gamma", None),
        ];
        let recents = vec!["p3".to_string(), "p1".to_string()];

        let Ranked::Sections { recent, remainder } = rank(&projects, "", &recents, 1) else {
            panic!("expected sections");
        };
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "p3");
        // beyond-cap recents stay in the remainder, backend order preserved
        let remainder_ids: Vec<&str> = remainder.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(remainder_ids, vec!["p1", "p2"]);
    }

    #[test]
    fn stale_recent_ids_are_skipped() {
        let projects = vec![project("p1", "Alpha", None)];
        let recents = vec!["gone".to_string(), "p1".to_string()];

        let Ranked::Sections { recent, remainder } = rank(&projects, "", &recents, 5) else {
            panic!("expected sections");
        };
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "p1");
        assert!(remainder.is_empty());
    }

    #[test]
    fn whitespace_query_is_treated_as_empty() {
        let projects = vec![project("p1", "Alpha", None)];
        assert!(matches!(
            rank(&projects, "   ", &[], 5),
            Ranked::Sections { .. }
        ));
    }
}
