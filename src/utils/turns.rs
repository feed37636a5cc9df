use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};

use crate::models::class_schedule::Turn;

/// Minutes a teacher may still check in after a turn's window closes, and
/// how long the auto-absence run waits past the window before recording
/// faltas.
pub const CHECKIN_TOLERANCE_MINUTES: i64 = 10;

fn time(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).expect("valid time literal")
}

/// Canonical shift windows. Contiguous and non-overlapping; together they
/// cover 07:00:00 through 23:59:59.
pub fn turn_window(turn: Turn) -> (NaiveTime, NaiveTime) {
    match turn {
        Turn::Matutino => (time(7, 0, 0), time(11, 59, 59)),
        Turn::Vespertino => (time(12, 0, 0), time(17, 59, 59)),
        Turn::Noturno => (time(18, 0, 0), time(23, 59, 59)),
    }
}

/// The turn whose window contains `at`, or None outside all windows.
pub fn turn_of(at: NaiveTime) -> Option<Turn> {
    [Turn::Matutino, Turn::Vespertino, Turn::Noturno]
        .into_iter()
        .find(|&turn| {
            let (start, end) = turn_window(turn);
            start <= at && at <= end
        })
}

/// Whether an hour interval lies fully inside the turn's window.
pub fn within_turn(turn: Turn, hour_start: NaiveTime, hour_end: NaiveTime) -> bool {
    let (start, end) = turn_window(turn);
    start <= hour_start && hour_end <= end
}

/// Campus wall-clock time for a UTC instant. All turn decisions run on
/// local time; the conversion happens once, at the edges.
pub fn to_local(now_utc: DateTime<Utc>, utc_offset_hours: i64) -> NaiveDateTime {
    (now_utc + Duration::hours(utc_offset_hours)).naive_utc()
}

/// Whether `at` is past the turn's end plus the check-in tolerance.
/// When the tolerance spills past midnight the grace never expires that day.
pub fn past_grace(turn: Turn, at: NaiveTime) -> bool {
    let (_, end) = turn_window(turn);
    let (cutoff, wrapped) = end.overflowing_add_signed(Duration::minutes(CHECKIN_TOLERANCE_MINUTES));
    if wrapped != 0 {
        return false;
    }
    at > cutoff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_are_contiguous() {
        let (_, m_end) = turn_window(Turn::Matutino);
        let (v_start, v_end) = turn_window(Turn::Vespertino);
        let (n_start, _) = turn_window(Turn::Noturno);

        assert_eq!(m_end + Duration::seconds(1), v_start);
        assert_eq!(v_end + Duration::seconds(1), n_start);
    }

    #[test]
    fn test_turn_of_boundaries() {
        assert_eq!(turn_of(time(6, 59, 59)), None);
        assert_eq!(turn_of(time(7, 0, 0)), Some(Turn::Matutino));
        assert_eq!(turn_of(time(11, 59, 59)), Some(Turn::Matutino));
        assert_eq!(turn_of(time(12, 0, 0)), Some(Turn::Vespertino));
        assert_eq!(turn_of(time(17, 59, 59)), Some(Turn::Vespertino));
        assert_eq!(turn_of(time(18, 0, 0)), Some(Turn::Noturno));
        assert_eq!(turn_of(time(23, 59, 59)), Some(Turn::Noturno));
        assert_eq!(turn_of(time(0, 30, 0)), None);
    }

    #[test]
    fn test_within_turn() {
        assert!(within_turn(Turn::Matutino, time(8, 0, 0), time(8, 50, 0)));
        assert!(within_turn(Turn::Matutino, time(7, 0, 0), time(11, 59, 59)));
        // Crosses into the afternoon window
        assert!(!within_turn(Turn::Matutino, time(11, 30, 0), time(12, 20, 0)));
        assert!(!within_turn(Turn::Vespertino, time(8, 0, 0), time(8, 50, 0)));
        assert!(within_turn(Turn::Noturno, time(19, 0, 0), time(19, 50, 0)));
    }

    #[test]
    fn test_to_local_applies_offset() {
        let utc = DateTime::parse_from_rfc3339("2025-06-02T14:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let local = to_local(utc, -3);
        assert_eq!(local.to_string(), "2025-06-02 11:30:00");

        // Offset can push the local date back across midnight
        let early = DateTime::parse_from_rfc3339("2025-06-02T01:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(to_local(early, -3).to_string(), "2025-06-01 22:00:00");
    }

    #[test]
    fn test_past_grace() {
        assert!(!past_grace(Turn::Matutino, time(11, 59, 59)));
        assert!(!past_grace(Turn::Matutino, time(12, 9, 59)));
        assert!(past_grace(Turn::Matutino, time(12, 10, 0)));
        // NOTURNO's tolerance crosses midnight, so it never expires that day
        assert!(!past_grace(Turn::Noturno, time(23, 59, 59)));
    }
}
