use backend_domain::{DeadlineFilter, DeadlineList, DeadlineListQuery, DeadlineView, RecordId};
use tracing::error;

use crate::{AppError, AppState};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

pub async fn list_deadlines(
    state: &AppState,
    query: DeadlineListQuery,
) -> Result<DeadlineList, AppError> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let filter = DeadlineFilter {
        club: query.club,
        category: query.category,
    }
    .normalized();

    let records = state
        .record_store
        .list(skip, limit, &filter)
        .await
        .map_err(|err| {
            error!("failed to list deadlines: {}", err);
            AppError::from(err)
        })?;

    let deadlines: Vec<DeadlineView> = records.iter().map(DeadlineView::from).collect();
    Ok(DeadlineList {
        total: deadlines.len(),
        deadlines,
        skip,
        limit,
    })
}

pub async fn get_deadline(state: &AppState, id: &str) -> Result<DeadlineView, AppError> {
    let record = state
        .record_store
        .get_by_id(&RecordId::from(id))
        .await
        .map_err(|err| {
            error!("failed to fetch deadline {}: {}", id, err);
            AppError::from(err)
        })?;
    record
        .as_ref()
        .map(DeadlineView::from)
        .ok_or_else(|| AppError::NotFound(format!("deadline {} not found", id)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{app_state, candidate, FakeRepository, ScriptedModel};
    use backend_domain::{Category, StoredDeadline};
    use chrono::Duration;

    async fn seeded_state() -> AppState {
        let repo = Arc::new(FakeRepository::default());
        for idx in 0..3 {
            let mut event = candidate(&format!("m-{idx}"), "2025-04-15");
            event.received_at += Duration::minutes(idx);
            if idx == 2 {
                event.organization = "Chess Club".to_string();
                event.category = Category::Meeting;
            }
            repo.seed(StoredDeadline {
                id: RecordId::from(format!("r{idx}").as_str()),
                event,
            })
            .await;
        }
        app_state(repo, Arc::new(ScriptedModel::default()), None)
    }

    #[tokio::test]
    async fn lists_newest_first_with_paging() {
        let state = seeded_state().await;
        let list = list_deadlines(
            &state,
            DeadlineListQuery {
                skip: Some(1),
                limit: Some(1),
                ..DeadlineListQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(list.deadlines.len(), 1);
        assert_eq!(list.deadlines[0].id, "r1");
        assert_eq!(list.total, 1);
        assert_eq!((list.skip, list.limit), (1, 1));
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let state = seeded_state().await;
        let list = list_deadlines(
            &state,
            DeadlineListQuery {
                limit: Some(0),
                ..DeadlineListQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(list.limit, 1);

        let list = list_deadlines(
            &state,
            DeadlineListQuery {
                limit: Some(5000),
                ..DeadlineListQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(list.limit, MAX_LIMIT);
        assert_eq!(list.total, 3);
    }

    #[tokio::test]
    async fn filters_by_club_and_category() {
        let state = seeded_state().await;
        let list = list_deadlines(
            &state,
            DeadlineListQuery {
                club: Some("Chess Club".to_string()),
                category: Some("MEETING".to_string()),
                ..DeadlineListQuery::default()
            },
        )
        .await
        .expect("list");
        assert_eq!(list.total, 1);
        assert_eq!(list.deadlines[0].club, "Chess Club");
        assert_eq!(list.deadlines[0].course, "Chess Club");
    }

    #[tokio::test]
    async fn get_by_id_or_not_found() {
        let state = seeded_state().await;
        let view = get_deadline(&state, "r0").await.expect("found");
        assert_eq!(view.due_date, "2025-04-15T00:00:00");
        assert_eq!(view.date_str, "2025-04-15");
        assert!(matches!(
            get_deadline(&state, "missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
