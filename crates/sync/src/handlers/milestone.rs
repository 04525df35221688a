// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tracing::{debug, info, warn};

use tether_core::{Database, EntityKind, Milestone};

use crate::error::SyncResult;
use crate::state;
use crate::tracker::{ClientFactory, TrackerError};

pub struct MilestoneHandler<'a> {
    db: &'a Database,
    clients: &'a dyn ClientFactory,
}

impl<'a> MilestoneHandler<'a> {
    pub fn new(db: &'a Database, clients: &'a dyn ClientFactory) -> Self {
        Self { db, clients }
    }

    pub async fn create(&self, milestone: &mut Milestone) -> SyncResult<()> {
        let integration = super::active_integration(self.db, milestone.project_id)?;
        let client = self.clients.client(&integration)?;

        let created = client.create_milestone(milestone.name.clone()).await?;
        state::mark_synced(milestone, created.number, None);
        self.db
            .save_sync_state(EntityKind::Milestone, milestone.id, &milestone.sync)?;
        info!(
            milestone = milestone.id,
            number = created.number,
            "tracker milestone created"
        );
        Ok(())
    }

    /// The external side only mirrors the title at creation; an update
    /// verifies the milestone still exists and bumps the sync clock.
    pub async fn update(&self, milestone: &mut Milestone) -> SyncResult<()> {
        let Some(number) = milestone.sync.external_id else {
            warn!(milestone = milestone.id, "update requested without an external id");
            return Ok(());
        };
        let integration = super::active_integration(self.db, milestone.project_id)?;
        let client = self.clients.client(&integration)?;

        match client.get_milestone(number).await {
            Ok(_) => {
                milestone.sync.touch();
                self.db
                    .save_sync_state(EntityKind::Milestone, milestone.id, &milestone.sync)?;
                info!(milestone = milestone.id, number, "tracker milestone verified");
                Ok(())
            }
            Err(TrackerError::NotFound) => {
                warn!(milestone = milestone.id, number, "tracker milestone is gone");
                state::mark_sync_failed(milestone, "tracker milestone not found");
                self.db
                    .save_sync_state(EntityKind::Milestone, milestone.id, &milestone.sync)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, milestone: &mut Milestone) -> SyncResult<()> {
        let Some(number) = milestone.sync.external_id else {
            debug!(milestone = milestone.id, "skipping external delete: never synced");
            return Ok(());
        };
        let integration = super::active_integration(self.db, milestone.project_id)?;
        let client = self.clients.client(&integration)?;

        match client.get_milestone(number).await {
            Ok(_) => {}
            Err(TrackerError::NotFound) => {
                warn!(milestone = milestone.id, number, "tracker milestone already gone");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        client.delete_milestone(number).await?;
        info!(milestone = milestone.id, number, "tracker milestone deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "milestone_tests.rs"]
mod tests;
