//! Operating hours and the fixed daily charging-slot grid.
//!
//! A station day is divided into fixed two-hour slots. The grid is static
//! configuration rather than something computed from the slot duration, so an
//! irregular grid (gaps, uneven spacing) stays expressible. All instants are
//! `DateTime<Utc>`; a slot start is valid iff its time-of-day component is
//! exactly one of the grid entries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Fixed slot length in hours.
pub const SLOT_DURATION_HOURS: i64 = 2;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Station operating hours as minutes from midnight.
///
/// `close` may be `1440` (24:00): the end-of-day boundary is representable
/// even though no wall-clock instant carries it. The rollover applies only to
/// the end-boundary comparison, never below `open`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    /// Opening time, minutes from midnight
    pub open: u32,
    /// Closing time, minutes from midnight; 1440 means midnight of the next day
    pub close: u32,
}

impl OperatingHours {
    /// Creates operating hours from minute offsets.
    #[must_use]
    pub const fn new(open: u32, close: u32) -> Self {
        Self { open, close }
    }

    /// The recognized reference configuration: 06:00 through 24:00.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            open: 6 * 60,
            close: MINUTES_PER_DAY,
        }
    }

    /// True iff a slot starting at `start_minutes` and running for
    /// [`SLOT_DURATION_HOURS`] fits inside the operating window.
    #[must_use]
    pub const fn admits(&self, start_minutes: u32) -> bool {
        let slot_minutes = (SLOT_DURATION_HOURS * 60) as u32;
        start_minutes >= self.open && start_minutes + slot_minutes <= self.close
    }
}

/// One entry of the slot grid: a start time-of-day and its display label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Start time-of-day of the slot
    pub start: NaiveTime,
    /// Human-readable label, e.g. `"06:00 AM - 08:00 AM"`
    pub label: String,
}

/// A concrete two-hour charging slot anchored to a date. Value type, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot start instant
    pub start_time: DateTime<Utc>,
    /// Display label for the slot
    pub display_name: String,
}

impl TimeSlot {
    /// Slot end instant; rolls into the next day for the last slot.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::hours(SLOT_DURATION_HOURS)
    }
}

/// The fixed daily slot grid plus operating hours.
///
/// Pure configuration: every query is a deterministic function of its input,
/// so the calendar can be cloned freely and shared across the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotCalendar {
    hours: OperatingHours,
    grid: Vec<SlotDefinition>,
}

impl TimeSlotCalendar {
    /// Creates a calendar from explicit configuration. Grid entries are kept
    /// in ascending start order.
    #[must_use]
    pub fn new(hours: OperatingHours, mut grid: Vec<SlotDefinition>) -> Self {
        grid.sort_by_key(|slot| slot.start);
        grid.dedup_by_key(|slot| slot.start);
        Self { hours, grid }
    }

    /// The reference calendar: 06:00–24:00 operating hours, one slot every
    /// two hours from 06:00 through 22:00 - nine slots per day.
    #[must_use]
    pub fn reference() -> Self {
        let grid = (0..9_u32)
            .filter_map(|i| {
                let hour = 6 + i * 2;
                let start = NaiveTime::from_hms_opt(hour, 0, 0)?;
                Some(SlotDefinition {
                    label: reference_label(hour),
                    start,
                })
            })
            .collect();
        Self::new(OperatingHours::reference(), grid)
    }

    /// The configured operating hours.
    #[must_use]
    pub const fn hours(&self) -> OperatingHours {
        self.hours
    }

    /// True iff `time`'s time-of-day exactly matches a grid entry.
    ///
    /// Sub-minute components disqualify: `10:00:30` is not a slot start even
    /// on a grid that contains `10:00`.
    #[must_use]
    pub fn is_valid_slot_start(&self, time: DateTime<Utc>) -> bool {
        self.grid.iter().any(|slot| slot.start == time.time())
    }

    /// True iff a slot starting at `slot_start` lies fully inside operating
    /// hours.
    #[must_use]
    pub fn is_within_operating_hours(&self, slot_start: DateTime<Utc>) -> bool {
        let start_minutes = slot_start.hour() * 60 + slot_start.minute();
        self.hours.admits(start_minutes)
    }

    /// Every slot of `date`, anchored to UTC and filtered by operating hours.
    #[must_use]
    pub fn slots_for_date(&self, date: NaiveDate) -> Vec<TimeSlot> {
        self.grid
            .iter()
            .filter(|slot| {
                let minutes = slot.start.hour() * 60 + slot.start.minute();
                self.hours.admits(minutes)
            })
            .map(|slot| TimeSlot {
                start_time: date.and_time(slot.start).and_utc(),
                display_name: slot.label.clone(),
            })
            .collect()
    }

    /// End instant of a slot starting at `slot_start`.
    #[must_use]
    pub fn end_time(slot_start: DateTime<Utc>) -> DateTime<Utc> {
        slot_start + Duration::hours(SLOT_DURATION_HOURS)
    }

    /// Display label for a slot start.
    ///
    /// Falls back to a computed `"HH:MM–HH:MM"` string when `slot_start` is
    /// not a recognized grid entry.
    #[must_use]
    pub fn display_name(&self, slot_start: DateTime<Utc>) -> String {
        self.grid
            .iter()
            .find(|slot| slot.start == slot_start.time())
            .map_or_else(
                || {
                    let end = Self::end_time(slot_start);
                    format!(
                        "{:02}:{:02}–{:02}:{:02}",
                        slot_start.hour(),
                        slot_start.minute(),
                        end.hour(),
                        end.minute()
                    )
                },
                |slot| slot.label.clone(),
            )
    }
}

impl Default for TimeSlotCalendar {
    fn default() -> Self {
        Self::reference()
    }
}

/// 12-hour label for a reference grid entry, e.g. `"06:00 AM - 08:00 AM"`.
fn reference_label(start_hour: u32) -> String {
    let fmt = |hour: u32| {
        let hour = hour % 24;
        let (h12, meridiem) = match hour {
            0 => (12, "AM"),
            1..=11 => (hour, "AM"),
            12 => (12, "PM"),
            _ => (hour - 12, "PM"),
        };
        format!("{h12:02}:00 {meridiem}")
    };
    format!("{} - {}", fmt(start_hour), fmt(start_hour + 2))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(date: (i32, u32, u32), h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(date.0, date.1, date.2, h, m, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn reference_grid_has_nine_slots() {
        let calendar = TimeSlotCalendar::reference();
        let slots = calendar.slots_for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0].start_time, at((2024, 1, 15), 6, 0));
        assert_eq!(slots[8].start_time, at((2024, 1, 15), 22, 0));
    }

    #[test]
    fn last_slot_ends_at_midnight_next_day() {
        let calendar = TimeSlotCalendar::reference();
        let slots = calendar.slots_for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let last = slots.last().unwrap();
        assert_eq!(last.end_time(), at((2024, 1, 16), 0, 0));
    }

    #[test]
    fn grid_membership_is_exact() {
        let calendar = TimeSlotCalendar::reference();
        assert!(calendar.is_valid_slot_start(at((2024, 1, 15), 10, 0)));
        assert!(!calendar.is_valid_slot_start(at((2024, 1, 15), 10, 30)));
        assert!(!calendar.is_valid_slot_start(at((2024, 1, 15), 5, 0)));
        // Sub-minute precision disqualifies
        let odd = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 30).single().unwrap();
        assert!(!calendar.is_valid_slot_start(odd));
    }

    #[test]
    fn operating_hours_admit_first_and_last_reference_slots() {
        let calendar = TimeSlotCalendar::reference();
        assert!(calendar.is_within_operating_hours(at((2024, 1, 15), 6, 0)));
        assert!(calendar.is_within_operating_hours(at((2024, 1, 15), 22, 0)));
        // 23:00 would end past 24:00
        assert!(!calendar.is_within_operating_hours(at((2024, 1, 15), 23, 0)));
        // 04:00 starts before open
        assert!(!calendar.is_within_operating_hours(at((2024, 1, 15), 4, 0)));
    }

    #[test]
    fn narrower_hours_filter_the_grid() {
        // 08:00 through 18:00 keeps 08:00..=16:00 starts only
        let calendar = TimeSlotCalendar::new(
            OperatingHours::new(8 * 60, 18 * 60),
            TimeSlotCalendar::reference()
                .slots_for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
                .into_iter()
                .map(|slot| SlotDefinition {
                    start: slot.start_time.time(),
                    label: slot.display_name,
                })
                .collect(),
        );
        let slots = calendar.slots_for_date(NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].start_time.time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(slots[4].start_time.time(), NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[test]
    fn display_name_prefers_grid_label_and_falls_back() {
        let calendar = TimeSlotCalendar::reference();
        assert_eq!(
            calendar.display_name(at((2024, 1, 15), 10, 0)),
            "10:00 AM - 12:00 PM"
        );
        assert_eq!(
            calendar.display_name(at((2024, 1, 15), 10, 30)),
            "10:30–12:30"
        );
    }

    #[test]
    fn grid_is_sorted_and_deduplicated() {
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let six = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        let calendar = TimeSlotCalendar::new(
            OperatingHours::reference(),
            vec![
                SlotDefinition { start: ten, label: "ten".to_string() },
                SlotDefinition { start: six, label: "six".to_string() },
                SlotDefinition { start: ten, label: "ten again".to_string() },
            ],
        );
        let slots = calendar.slots_for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].display_name, "six");
        assert_eq!(slots[1].display_name, "ten");
    }
}
