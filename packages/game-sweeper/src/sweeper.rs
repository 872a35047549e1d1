use chrono::{DateTime, Utc};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use shared::models::game::responses::SweepReport;
use shared::services::game_service::GameService;
use tracing::{info, warn};

/// Completes games whose timer ran out. Triggered on a schedule, so the
/// event payload carries nothing the sweep needs.
#[derive(Clone)]
pub struct Sweeper {
    service: GameService,
}

impl Sweeper {
    pub fn new(service: GameService) -> Self {
        Self { service }
    }

    pub async fn process_event(&self, event: LambdaEvent<Value>) -> Result<SweepReport, Error> {
        info!("Sweep triggered by request {}", event.context.request_id);
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, Error> {
        let report = self.service.sweep_expired_games_at(now).await?;

        if !report.failed_game_ids.is_empty() {
            warn!(
                "Could not complete {} expired game(s): {:?}",
                report.failed_game_ids.len(),
                report.failed_game_ids
            );
        }
        info!(
            "Sweep finished, {} game(s) completed",
            report.completed_game_ids.len()
        );
        Ok(report)
    }
}
