use std::sync::Arc;

use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Timelike, Utc};
use doorsign_db::models::{Membership, Organization, PresenceStatus, StatusTag};
use mongodb::Database;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::dao::base::{BaseDao, DaoResult};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Daily per-org status reset. Hours are interpreted in UTC: no timezone is
/// stored on the org, so the configured hour is a single globally assumed
/// clock.
pub struct AutoResetService {
    orgs: BaseDao<Organization>,
    members: BaseDao<Membership>,
    statuses: BaseDao<PresenceStatus>,
}

impl AutoResetService {
    pub fn new(db: &Database) -> Self {
        Self {
            orgs: BaseDao::new(db, Organization::COLLECTION),
            members: BaseDao::new(db, Membership::COLLECTION),
            statuses: BaseDao::new(db, PresenceStatus::COLLECTION),
        }
    }

    /// Sweeps every org configured for `hour`. Returns the number of
    /// statuses reverted to the default.
    ///
    /// Idempotent within the window: the reset stamps `updated_at` past
    /// `window_start`, so a re-run matches nothing new, and a member who
    /// changed status after the sweep fired is left alone.
    pub async fn run_for_hour(&self, hour: u8, window_start: DateTime) -> DaoResult<u64> {
        let orgs = self
            .orgs
            .find_many(doc! { "reset_hour": hour as i32 }, None)
            .await?;

        let mut total = 0;
        for org in orgs {
            let Some(org_id) = org.id else { continue };
            total += self.reset_org(org_id, window_start).await?;
        }
        Ok(total)
    }

    pub async fn reset_org(&self, org_id: ObjectId, window_start: DateTime) -> DaoResult<u64> {
        let members = self
            .members
            .find_many(doc! { "org_id": org_id }, None)
            .await?;
        let user_ids: Vec<ObjectId> = members.iter().map(|m| m.user_id).collect();
        if user_ids.is_empty() {
            return Ok(0);
        }

        let default_tag =
            bson::to_bson(&StatusTag::default()).map_err(bson::ser::Error::from)?;
        self.statuses
            .update_many(
                doc! {
                    "user_id": { "$in": user_ids },
                    "status": { "$ne": &default_tag },
                    "updated_at": { "$lt": window_start },
                },
                doc! { "$set": { "status": default_tag, "updated_at": DateTime::now() } },
            )
            .await
    }
}

/// Registers the hourly trigger. The sweep itself filters orgs by their
/// configured hour, so one cron entry covers all 24 slots.
pub async fn start_auto_reset(
    service: Arc<AutoResetService>,
) -> Result<JobScheduler, JobSchedulerError> {
    let sched = JobScheduler::new().await?;

    let job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let service = service.clone();
        Box::pin(async move {
            let now = Utc::now();
            let hour = now.hour() as u8;
            let window_start = DateTime::from_millis(
                now.timestamp_millis() - now.timestamp_millis() % MILLIS_PER_HOUR,
            );
            match service.run_for_hour(hour, window_start).await {
                Ok(reset) => info!(hour, reset, "Auto-reset sweep complete"),
                Err(e) => error!(hour, error = %e, "Auto-reset sweep failed"),
            }
        })
    })?;

    sched.add(job).await?;
    sched.start().await?;
    info!("Auto-reset scheduler started");
    Ok(sched)
}
