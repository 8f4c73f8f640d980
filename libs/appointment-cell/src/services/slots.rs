use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use provider_cell::models::{weekday_index, weekday_name, AppointmentType, WorkingHours};
use provider_cell::services::ProviderDirectory;

use crate::models::{AppointmentError, BlockingAppointment, Slot, SlotQuery, SlotsResponse, TimeBlock};
use crate::services::conflict::is_block_free;
use crate::services::store::AppointmentStore;

/// Slots for one calendar day.
///
/// The working window `[date@start, date@end]` is clipped to the requested
/// range and walked in back-to-back blocks of `buffer_before + duration +
/// buffer_after`. A block survives when it fits the window and overlaps no
/// blocking appointment; the slot offered is the block minus its buffers.
pub fn slots_for_day(
    date: NaiveDate,
    hours: &WorkingHours,
    appointment_type: &AppointmentType,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
    blocking: &[BlockingAppointment],
) -> Vec<Slot> {
    let window_start = date.and_time(hours.start).max(range_start);
    let window_end = date.and_time(hours.end).min(range_end);

    let total = appointment_type.total_block();
    // Non-positive blocks would never advance the walk.
    if window_start >= window_end || total <= Duration::zero() {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut block_start = window_start;

    while block_start + total <= window_end {
        let block = TimeBlock {
            start: block_start,
            end: block_start + total,
        };

        if is_block_free(&block, blocking) {
            let start = block.start + appointment_type.buffer_before();
            slots.push(Slot {
                start,
                end: start + appointment_type.duration(),
            });
        }

        block_start = block.end;
    }

    slots
}

/// Distinct weekday names covered by the range, in calendar order.
pub fn weekdays_in_range(range_start: NaiveDateTime, range_end: NaiveDateTime) -> Vec<&'static str> {
    let span_days = (range_end.date() - range_start.date()).num_days() + 1;
    range_start
        .date()
        .iter_days()
        .take(span_days.clamp(1, 7) as usize)
        .map(|date| weekday_name(weekday_index(date)))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SlotSearch {
    pub slots: Vec<Slot>,
    /// Days in the range that had an active working-hours row.
    pub scheduled_days: usize,
}

pub struct SlotService {
    directory: Arc<dyn ProviderDirectory>,
    store: Arc<dyn AppointmentStore>,
    max_range_days: i64,
}

impl SlotService {
    pub fn new(
        directory: Arc<dyn ProviderDirectory>,
        store: Arc<dyn AppointmentStore>,
        max_range_days: i64,
    ) -> Self {
        Self {
            directory,
            store,
            max_range_days,
        }
    }

    /// Ordered bookable slots for a provider at a location between
    /// `range_start` and `range_end`.
    ///
    /// The caller is responsible for checking the provider serves the location.
    pub async fn generate_slots(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        appointment_type: &AppointmentType,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<SlotSearch, AppointmentError> {
        if range_start > range_end {
            return Err(AppointmentError::InvalidRange);
        }

        let span_days = (range_end.date() - range_start.date()).num_days() + 1;
        if span_days > self.max_range_days {
            return Err(AppointmentError::RangeTooLarge {
                max_days: self.max_range_days,
            });
        }

        // Blocks near midnight can reach into the neighbouring days.
        let blocking = self
            .store
            .list_blocking_appointments(
                provider_id,
                location_id,
                range_start.date() - Duration::days(1),
                range_end.date() + Duration::days(1),
            )
            .await?;

        let mut search = SlotSearch::default();

        for date in range_start.date().iter_days().take(span_days as usize) {
            let weekday = weekday_index(date);

            let Some(hours) = self
                .directory
                .find_working_hours(provider_id, location_id, weekday)
                .await?
            else {
                debug!("No schedule for provider {} on {} ({})", provider_id, date, weekday_name(weekday));
                continue;
            };

            search.scheduled_days += 1;

            search.slots.extend(slots_for_day(
                date,
                &hours,
                appointment_type,
                range_start,
                range_end,
                &blocking,
            ));
        }

        Ok(search)
    }

    /// Resolve the query's identifiers, then generate slots
    pub async fn get_slots(&self, query: SlotQuery) -> Result<SlotsResponse, AppointmentError> {
        debug!(
            "Slot request: provider {} location {} type {} from {} to {}",
            query.provider_id, query.location_id, query.type_id, query.start, query.end
        );

        self.directory.get_provider(query.provider_id).await?;
        self.directory.get_location(query.location_id).await?;
        let appointment_type = self.directory.get_appointment_type(query.type_id).await?;

        if !self
            .directory
            .provider_serves_location(query.provider_id, query.location_id)
            .await?
        {
            return Err(AppointmentError::ProviderLocationMismatch);
        }

        let search = self
            .generate_slots(
                query.provider_id,
                query.location_id,
                &appointment_type,
                query.start,
                query.end,
            )
            .await?;

        let message = (search.scheduled_days == 0).then(|| {
            format!(
                "No schedule found for this provider on {}",
                weekdays_in_range(query.start, query.end).join(", ")
            )
        });

        info!("Generated {} slots for provider {}", search.slots.len(), query.provider_id);

        Ok(SlotsResponse {
            provider_id: query.provider_id,
            location_id: query.location_id,
            type_id: query.type_id,
            slots: search.slots,
            message,
        })
    }
}
