// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Owning-project extraction for eligibility checks.
//!
//! Pure: the entity itself carries everything needed. A comment belongs
//! to its parent issue's project; a comment without a parent issue has no
//! project and is never mirrored.

use crate::entity::SyncEntity;

/// The project that owns an entity, or `None` when the entity lives
/// outside any project.
pub fn project_id(entity: &SyncEntity) -> Option<i64> {
    match entity {
        SyncEntity::Issue(issue) => Some(issue.project_id),
        SyncEntity::Milestone(milestone) => Some(milestone.project_id),
        SyncEntity::Comment(comment) => comment.issue.as_ref().map(|i| i.project_id),
    }
}

#[cfg(test)]
mod tests {
    use tether_core::IssueRef;

    use super::*;
    use crate::test_helpers::{comment, issue, milestone};

    #[test]
    fn test_issue_and_milestone_direct() {
        assert_eq!(project_id(&issue(3, "t").into()), Some(3));
        assert_eq!(project_id(&milestone(4, "m").into()), Some(4));
    }

    #[test]
    fn test_comment_follows_parent_issue() {
        let attached = comment(
            "hi",
            Some(IssueRef {
                id: 9,
                project_id: 5,
                external_id: None,
            }),
        );
        assert_eq!(project_id(&attached.into()), Some(5));
    }

    #[test]
    fn test_detached_comment_has_none() {
        let detached = comment("board note", None);
        assert_eq!(project_id(&detached.into()), None);
    }
}
