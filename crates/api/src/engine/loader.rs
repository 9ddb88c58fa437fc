//! Snapshot loader behind `GET /load`.

use crudsync_core::collection::DeploymentVariant;
use crudsync_core::types::DbId;
use crudsync_db::repositories::RecordRepo;
use futures::future::try_join_all;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::response::{LoadResponse, ProjectInfo};

/// Message returned to the widget when the snapshot cannot be read.
pub const LOAD_FAILED_MESSAGE: &str =
    "There was an error loading the resources, events, and dependencies data.";

/// Reads every collection of the deployment variant in one go.
pub struct SnapshotLoader {
    pool: PgPool,
    variant: DeploymentVariant,
    project_calendar_id: Option<DbId>,
}

impl SnapshotLoader {
    pub fn new(
        pool: PgPool,
        variant: DeploymentVariant,
        project_calendar_id: Option<DbId>,
    ) -> Self {
        Self {
            pool,
            variant,
            project_calendar_id,
        }
    }

    /// Fetch all collections concurrently. Any failure fails the whole load.
    pub async fn load(&self) -> AppResult<LoadResponse> {
        let collections = self.variant.collections();
        let snapshots = try_join_all(
            collections
                .iter()
                .map(|collection| RecordRepo::list(&self.pool, collection.schema())),
        )
        .await?;

        let mut response = LoadResponse::success();
        if self.variant.includes_project() {
            response.project = self
                .project_calendar_id
                .map(|calendar| ProjectInfo { calendar });
        }
        for (collection, rows) in collections.iter().zip(snapshots) {
            tracing::debug!(%collection, rows = rows.len(), "Loaded collection");
            response.insert_rows(*collection, rows);
        }

        Ok(response)
    }

    /// Like [`load`](Self::load), but reports failure in-band.
    pub async fn respond(&self) -> LoadResponse {
        match self.load().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load scheduler data");
                LoadResponse::failure(LOAD_FAILED_MESSAGE)
            }
        }
    }
}
