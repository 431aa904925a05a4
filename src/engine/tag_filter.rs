//! engine::tag_filter
//!
//! Narrows the repository's tags to the ones that get a changelog window.
//!
//! # Pipeline
//!
//! Stages run in a fixed order over tags whose instants are already known:
//!
//! 1. **since**: keep tags at or after the since tag. The since tag is the
//!    configured one, else the newest version already present in the base
//!    changelog. An unknown name is a warning and keeps everything.
//! 2. **between**: keep the range spanned by the given tags. Unlike the
//!    other stages an unknown name here is fatal.
//! 3. **due**: keep tags at or before the due tag. Unknown name: warning.
//! 4. **exclude**: drop exact names, then names matching the pattern
//!    (anchored at the start of the name).
//!
//! The result is stable-sorted newest first.

use regex::Regex;

use super::error::GeneratorError;
use super::resolver::{sort_timed_desc, TemporalResolver, TimedTag};
use crate::core::types::Tag;

/// Tag filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilterOptions {
    /// Keep tags at or after this one.
    pub since_tag: Option<String>,
    /// Newest version heading of the base changelog, used when `since_tag`
    /// is unset.
    pub base_since_tag: Option<String>,
    /// Keep only the range spanned by these tags.
    pub between_tags: Vec<String>,
    /// Keep tags at or before this one.
    pub due_tag: Option<String>,
    /// Drop these exact tag names.
    pub exclude_tags: Vec<String>,
    /// Drop tags whose name matches this pattern at its start.
    pub exclude_tags_regex: Option<String>,
}

impl TagFilterOptions {
    /// The since tag in effect.
    pub fn effective_since(&self) -> Option<&str> {
        self.since_tag
            .as_deref()
            .or(self.base_since_tag.as_deref())
    }

    /// Whether the oldest window's lower bound should be inferred from the
    /// full tag list rather than repository creation.
    pub fn narrows_history(&self) -> bool {
        self.effective_since().is_some() || !self.between_tags.is_empty()
    }
}

/// Compile an exclude pattern anchored at the start of the tag name.
pub fn compile_exclude_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}

/// Resolve all tags and run the filter pipeline.
///
/// Returns every tag with its instant (fetch order) alongside the filtered,
/// newest-first subset.
pub async fn filter_tags(
    resolver: &TemporalResolver<'_>,
    all_tags: &[Tag],
    options: &TagFilterOptions,
) -> Result<(Vec<TimedTag>, Vec<TimedTag>), GeneratorError> {
    let timed = resolver.timed(all_tags).await?;
    let filtered = apply(timed.clone(), options)?;
    tracing::info!(
        total = timed.len(),
        kept = filtered.len(),
        "filtered tags"
    );
    Ok((timed, filtered))
}

/// Run every stage over already-timed tags.
pub fn apply(
    tags: Vec<TimedTag>,
    options: &TagFilterOptions,
) -> Result<Vec<TimedTag>, GeneratorError> {
    let pattern = options
        .exclude_tags_regex
        .as_deref()
        .map(|p| {
            compile_exclude_pattern(p).map_err(|e| GeneratorError::InvalidPattern {
                pattern: p.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()?;

    let tags = filter_since(tags, options.effective_since());
    let tags = filter_between(tags, &options.between_tags)?;
    let tags = filter_due(tags, options.due_tag.as_deref());
    let mut tags = filter_excluded(tags, &options.exclude_tags, pattern.as_ref());
    sort_timed_desc(&mut tags);
    Ok(tags)
}

fn find<'t>(tags: &'t [TimedTag], name: &str) -> Option<&'t TimedTag> {
    tags.iter().find(|t| t.name() == name)
}

/// Keep tags at or after `since`.
pub fn filter_since(tags: Vec<TimedTag>, since: Option<&str>) -> Vec<TimedTag> {
    let Some(since) = since else {
        return tags;
    };
    let Some(since_at) = find(&tags, since).map(|t| t.at) else {
        tracing::warn!("since tag '{}' was not found; keeping all tags", since);
        return tags;
    };
    tags.into_iter().filter(|t| t.at >= since_at).collect()
}

/// Keep the range spanned by `between`.
///
/// The newest and oldest named tags bound the range and every tag strictly
/// between them is added. A single name yields a single-point range.
pub fn filter_between(
    tags: Vec<TimedTag>,
    between: &[String],
) -> Result<Vec<TimedTag>, GeneratorError> {
    if between.is_empty() {
        return Ok(tags);
    }

    let mut bounds = between
        .iter()
        .map(|name| {
            find(&tags, name).cloned().ok_or_else(|| GeneratorError::TagNotFound {
                tag: name.clone(),
                option: "--between-tags",
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    sort_timed_desc(&mut bounds);

    let (Some(newest), Some(oldest)) = (bounds.first().cloned(), bounds.last().cloned()) else {
        return Ok(tags);
    };

    let mut result = vec![newest.clone()];
    result.extend(
        tags.into_iter()
            .filter(|t| oldest.at < t.at && t.at < newest.at),
    );
    result.push(oldest.clone());

    if newest.at == oldest.at {
        result.remove(0);
    }
    Ok(result)
}

/// Keep tags at or before `due`.
pub fn filter_due(tags: Vec<TimedTag>, due: Option<&str>) -> Vec<TimedTag> {
    let Some(due) = due else {
        return tags;
    };
    let Some(due_at) = find(&tags, due).map(|t| t.at) else {
        tracing::warn!("due tag '{}' was not found; keeping all tags", due);
        return tags;
    };
    tags.into_iter().filter(|t| t.at <= due_at).collect()
}

/// Drop exact names, then pattern matches.
pub fn filter_excluded(
    tags: Vec<TimedTag>,
    names: &[String],
    pattern: Option<&Regex>,
) -> Vec<TimedTag> {
    for name in names {
        if find(&tags, name).is_none() {
            tracing::warn!("exclude tag '{}' was not found", name);
        }
    }
    let mut tags: Vec<TimedTag> = tags
        .into_iter()
        .filter(|t| !names.iter().any(|n| n == t.name()))
        .collect();

    if let Some(pattern) = pattern {
        let before = tags.len();
        tags.retain(|t| !pattern.is_match(t.name()));
        if tags.len() == before {
            tracing::warn!(
                "exclude-tags-regex '{}' matched no tags",
                pattern.as_str()
            );
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn timed(name: &str, day: u32) -> TimedTag {
        TimedTag {
            tag: Tag::release(name, format!("sha-{}", name)),
            at: Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap(),
        }
    }

    fn names(tags: &[TimedTag]) -> Vec<&str> {
        tags.iter().map(|t| t.name()).collect()
    }

    fn sample() -> Vec<TimedTag> {
        vec![
            timed("v4", 4),
            timed("v3", 3),
            timed("v2", 2),
            timed("v1", 1),
        ]
    }

    mod since {
        use super::*;

        #[test]
        fn keeps_since_and_newer() {
            let out = filter_since(sample(), Some("v2"));
            assert_eq!(names(&out), vec!["v4", "v3", "v2"]);
        }

        #[test]
        fn unknown_keeps_all() {
            let out = filter_since(sample(), Some("v9"));
            assert_eq!(out.len(), 4);
        }

        #[test]
        fn base_changelog_version_used_when_unset() {
            let options = TagFilterOptions {
                base_since_tag: Some("v3".into()),
                ..Default::default()
            };
            let out = apply(sample(), &options).unwrap();
            assert_eq!(names(&out), vec!["v4", "v3"]);
        }

        #[test]
        fn configured_wins_over_base() {
            let options = TagFilterOptions {
                since_tag: Some("v2".into()),
                base_since_tag: Some("v3".into()),
                ..Default::default()
            };
            assert_eq!(options.effective_since(), Some("v2"));
        }
    }

    mod between {
        use super::*;

        #[test]
        fn range_inclusive_of_bounds() {
            let out = filter_between(sample(), &["v1".into(), "v3".into()]).unwrap();
            assert_eq!(names(&out), vec!["v3", "v2", "v1"]);
        }

        #[test]
        fn single_name_is_single_point() {
            let out = filter_between(sample(), &["v2".into()]).unwrap();
            assert_eq!(names(&out), vec!["v2"]);
        }

        #[test]
        fn same_instant_bounds_keep_older() {
            let mut tags = sample();
            tags.push(timed("v2-rc", 2));
            let out = filter_between(tags, &["v2".into(), "v2-rc".into()]).unwrap();
            assert_eq!(names(&out), vec!["v2-rc"]);
        }

        #[test]
        fn unknown_is_fatal() {
            let err = filter_between(sample(), &["v1".into(), "nope".into()]).unwrap_err();
            assert!(matches!(
                err,
                GeneratorError::TagNotFound { ref tag, .. } if tag == "nope"
            ));
        }
    }

    mod due {
        use super::*;

        #[test]
        fn keeps_due_and_older() {
            let out = filter_due(sample(), Some("v2"));
            assert_eq!(names(&out), vec!["v2", "v1"]);
        }

        #[test]
        fn unknown_keeps_all() {
            assert_eq!(filter_due(sample(), Some("v9")).len(), 4);
        }
    }

    mod exclude {
        use super::*;

        #[test]
        fn exact_names() {
            let out = filter_excluded(sample(), &["v2".into(), "v9".into()], None);
            assert_eq!(names(&out), vec!["v4", "v3", "v1"]);
        }

        #[test]
        fn pattern_anchored_at_start() {
            let tags = vec![timed("v1.0", 3), timed("v0.2", 2), timed("v0.1", 1)];
            let pattern = compile_exclude_pattern(r"v0\.").unwrap();
            let out = filter_excluded(tags, &[], Some(&pattern));
            assert_eq!(names(&out), vec!["v1.0"]);

            let tags = vec![timed("release-v0.1", 1)];
            let out = filter_excluded(tags, &[], Some(&pattern));
            assert_eq!(out.len(), 1);
        }

        #[test]
        fn names_and_pattern_both_apply() {
            let options = TagFilterOptions {
                exclude_tags: vec!["v4".into()],
                exclude_tags_regex: Some("v1".into()),
                ..Default::default()
            };
            let out = apply(sample(), &options).unwrap();
            assert_eq!(names(&out), vec!["v3", "v2"]);
        }

        #[test]
        fn invalid_pattern_reported() {
            let options = TagFilterOptions {
                exclude_tags_regex: Some("(".into()),
                ..Default::default()
            };
            assert!(matches!(
                apply(sample(), &options),
                Err(GeneratorError::InvalidPattern { .. })
            ));
        }
    }

    #[test]
    fn result_sorted_newest_first() {
        let shuffled = vec![timed("v2", 2), timed("v4", 4), timed("v1", 1), timed("v3", 3)];
        let out = apply(shuffled, &TagFilterOptions::default()).unwrap();
        assert_eq!(names(&out), vec!["v4", "v3", "v2", "v1"]);
    }

    #[test]
    fn narrows_history() {
        assert!(!TagFilterOptions::default().narrows_history());
        assert!(TagFilterOptions {
            between_tags: vec!["v1".into()],
            ..Default::default()
        }
        .narrows_history());
    }
}
