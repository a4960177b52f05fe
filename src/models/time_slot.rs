//! Weekly time grid: days, clock times, time slots.
//!
//! The institution shares one ordered sequence of time slots across all
//! working days. Break slots (short breaks, lunch) sit inside the grid so
//! that contiguity is explicit, but nothing can ever be assigned to them.
//!
//! # Time Model
//! Clock times are minutes since midnight. One teaching slot counts as one
//! contact hour for every hour limit, regardless of its length in minutes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A day of the teaching week. `Monday` is day 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    /// All days the grid knows about, in week order.
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Monday through Friday.
    pub const WEEKDAYS: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Zero-based position in the week.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Day at a zero-based position.
    pub fn from_index(index: usize) -> Option<Day> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wall-clock time of day with minute precision, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Creates a clock time. Returns `None` outside 00:00..=23:59.
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid clock time '{s}', expected HH:MM"))?;
        let hour: u16 = h
            .parse()
            .map_err(|_| format!("invalid hour in clock time '{s}'"))?;
        let minute: u16 = m
            .parse()
            .map_err(|_| format!("invalid minute in clock time '{s}'"))?;
        Self::new(hour, minute).ok_or_else(|| format!("clock time '{s}' out of range"))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// A clock interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl TimeWindow {
    pub fn new(start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Whether `other` lies entirely inside this window.
    pub fn covers(&self, other: &Self) -> bool {
        other.start_time >= self.start_time && other.end_time <= self.end_time
    }

    /// Whether two windows overlap. Touching windows do not.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// Kind of non-teaching slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Short,
    Lunch,
}

/// One period of the institutional day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub is_break: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_type: Option<BreakKind>,
}

impl TimeSlot {
    /// Creates a teaching slot.
    pub fn teaching(id: impl Into<String>, start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            is_break: false,
            break_type: None,
        }
    }

    /// Creates a break slot.
    pub fn break_slot(
        id: impl Into<String>,
        start_time: ClockTime,
        end_time: ClockTime,
        kind: BreakKind,
    ) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            is_break: true,
            break_type: Some(kind),
        }
    }

    /// Length in minutes.
    pub fn duration(&self) -> u16 {
        self.end_time.minutes().saturating_sub(self.start_time.minutes())
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// The ordered, institution-wide slot sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotGrid {
    slots: Vec<TimeSlot>,
}

impl SlotGrid {
    pub fn new(slots: Vec<TimeSlot>) -> Self {
        Self { slots }
    }

    /// The default institutional day: 09:00 to 17:05 with a lunch break and
    /// two short breaks.
    pub fn institutional() -> Self {
        let t = |h: u16, m: u16| ClockTime(h * 60 + m);
        Self::new(vec![
            TimeSlot::teaching("t1", t(9, 0), t(9, 50)),
            TimeSlot::teaching("t2", t(9, 50), t(10, 40)),
            TimeSlot::break_slot("t3", t(10, 40), t(10, 55), BreakKind::Short),
            TimeSlot::teaching("t4", t(10, 55), t(11, 45)),
            TimeSlot::teaching("t5", t(11, 45), t(12, 35)),
            TimeSlot::break_slot("t6", t(12, 35), t(13, 30), BreakKind::Lunch),
            TimeSlot::teaching("t7", t(13, 30), t(14, 20)),
            TimeSlot::teaching("t8", t(14, 20), t(15, 10)),
            TimeSlot::break_slot("t9", t(15, 10), t(15, 25), BreakKind::Short),
            TimeSlot::teaching("t10", t(15, 25), t(16, 15)),
            TimeSlot::teaching("t11", t(16, 15), t(17, 5)),
        ])
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&TimeSlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Position of a slot by id.
    pub fn index_of(&self, slot_id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.id == slot_id)
    }

    /// Number of assignable slots per day.
    pub fn teaching_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_break).count()
    }

    /// Whether slots `a` and `a + 1` form a continuous teaching block.
    fn joins(&self, a: usize) -> bool {
        match (self.slots.get(a), self.slots.get(a + 1)) {
            (Some(x), Some(y)) => !x.is_break && !y.is_break && x.end_time == y.start_time,
            _ => false,
        }
    }

    /// Start indices of every run of `len` contiguous teaching slots.
    ///
    /// Runs never span a break and never have a gap between slots.
    pub fn block_starts(&self, len: usize) -> Vec<usize> {
        if len == 0 || len > self.slots.len() {
            return Vec::new();
        }
        (0..=self.slots.len() - len)
            .filter(|&start| {
                !self.slots[start].is_break && (start..start + len - 1).all(|i| self.joins(i))
            })
            .collect()
    }

    /// Whether the given indices are consecutive and contiguous teaching slots.
    pub fn is_contiguous(&self, indices: &[usize]) -> bool {
        match indices.first() {
            None => false,
            Some(&first) => {
                self.slots.get(first).is_some_and(|s| !s.is_break)
                    && indices.windows(2).all(|w| w[1] == w[0] + 1 && self.joins(w[0]))
            }
        }
    }

    /// Clock window covered by a run of slots.
    pub fn span_window(&self, indices: &[usize]) -> Option<TimeWindow> {
        let first = self.slots.get(*indices.first()?)?;
        let last = self.slots.get(*indices.last()?)?;
        Some(TimeWindow::new(first.start_time, last.end_time))
    }

    /// Slot ids for a run of indices.
    pub fn ids_for(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&i| self.slots.get(i).map(|s| s.id.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_clock_time_parse_and_display() {
        assert_eq!(hm("09:00").minutes(), 540);
        assert_eq!(hm("17:05").to_string(), "17:05");
        assert_eq!(hm(" 7:5 ").to_string(), "07:05");
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("nine".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_clock_time_serde() {
        let t: ClockTime = serde_json::from_str("\"13:30\"").unwrap();
        assert_eq!(t, hm("13:30"));
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"13:30\"");
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn test_time_window() {
        let day = TimeWindow::new(hm("09:00"), hm("17:00"));
        let morning = TimeWindow::new(hm("09:00"), hm("09:50"));
        let late = TimeWindow::new(hm("16:15"), hm("17:05"));
        assert!(day.covers(&morning));
        assert!(!day.covers(&late));
        assert!(day.overlaps(&late));

        let lunch = TimeWindow::new(hm("12:35"), hm("13:30"));
        let after = TimeWindow::new(hm("13:30"), hm("14:20"));
        assert!(!lunch.overlaps(&after)); // touching
    }

    #[test]
    fn test_day_order() {
        assert_eq!(Day::Monday.index(), 0);
        assert_eq!(Day::from_index(4), Some(Day::Friday));
        assert_eq!(Day::from_index(6), None);
        assert!(Day::Monday < Day::Tuesday);
        assert_eq!(Day::Wednesday.to_string(), "Wednesday");
    }

    #[test]
    fn test_institutional_grid() {
        let grid = SlotGrid::institutional();
        assert_eq!(grid.len(), 11);
        assert_eq!(grid.teaching_slot_count(), 8);
        assert_eq!(grid.index_of("t7"), Some(6));
        assert_eq!(grid.get(0).unwrap().duration(), 50);
        assert!(grid.get(5).unwrap().is_break);
    }

    #[test]
    fn test_block_starts_skip_breaks() {
        let grid = SlotGrid::institutional();
        assert_eq!(grid.block_starts(1), vec![0, 1, 3, 4, 6, 7, 9, 10]);
        // t1-t2, t4-t5, t7-t8, t10-t11
        assert_eq!(grid.block_starts(2), vec![0, 3, 6, 9]);
        assert!(grid.block_starts(3).is_empty());
    }

    #[test]
    fn test_contiguity() {
        let grid = SlotGrid::institutional();
        assert!(grid.is_contiguous(&[0, 1]));
        assert!(!grid.is_contiguous(&[1, 2])); // into a break
        assert!(!grid.is_contiguous(&[1, 3])); // across a break
        assert!(!grid.is_contiguous(&[]));
        assert_eq!(grid.ids_for(&[6, 7]), vec!["t7".to_string(), "t8".to_string()]);
        let w = grid.span_window(&[6, 7]).unwrap();
        assert_eq!(w.start_time, hm("13:30"));
        assert_eq!(w.end_time, hm("15:10"));
    }

    #[test]
    fn test_time_slot_serde_shape() {
        let json = r#"{"id":"t6","startTime":"12:35","endTime":"13:30","isBreak":true,"breakType":"lunch"}"#;
        let slot: TimeSlot = serde_json::from_str(json).unwrap();
        assert_eq!(slot.break_type, Some(BreakKind::Lunch));
        assert_eq!(slot.duration(), 55);
    }
}
