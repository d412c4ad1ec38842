use chrono::{Local, Timelike};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::services::{email::EmailService, relances::RelanceService};

/// Seconds from `secs_today` (seconds since local midnight) to the next
/// occurrence of `hour`:00.
pub fn secs_until_hour(secs_today: u32, hour: u32) -> u64 {
    let target_secs = hour * 3600;
    if secs_today < target_secs {
        (target_secs - secs_today) as u64
    } else {
        // Already past today → wait until tomorrow
        (86400 - secs_today + target_secs) as u64
    }
}

/// Spawn a background task that wakes up daily at `send_hour` (local time)
/// and emails every payment reminder that has fallen due.
pub fn start(pool: PgPool, email: Arc<EmailService>, send_hour: u32) {
    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let secs_today = now.hour() * 3600 + now.minute() * 60 + now.second();
            tokio::time::sleep(tokio::time::Duration::from_secs(secs_until_hour(
                secs_today, send_hour,
            )))
            .await;

            let today = Local::now().date_naive();
            match RelanceService::dispatch_due(&pool, Some(email.as_ref()), None, today, false).await {
                Ok(report) => info!(
                    "Reminder scheduler: {} sent, {} failed for {}",
                    report.sent, report.failed, today
                ),
                Err(e) => warn!("Reminder scheduler: dispatch failed: {}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_until_today_or_tomorrow() {
        assert_eq!(secs_until_hour(8 * 3600, 9), 3600);
        assert_eq!(secs_until_hour(9 * 3600, 9), 86400);
        assert_eq!(secs_until_hour(23 * 3600, 9), 10 * 3600);
        assert_eq!(secs_until_hour(0, 0), 86400);
    }
}
