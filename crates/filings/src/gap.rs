//! Detection of calendar quarters with no reported filing.

use filings_core::{Period, RecordSet};

/// Returns the periods that no record in `records` reports on.
///
/// A period is covered when at least one record's `period_end` lies in
/// `[start, end]`. The result keeps the order of `periods`.
#[must_use]
pub fn find_gaps(periods: &[Period], records: &RecordSet) -> Vec<Period> {
    periods
        .iter()
        .filter(|period| !is_covered(period, records))
        .copied()
        .collect()
}

/// Returns the periods that at least one record reports on, in order.
#[must_use]
pub fn covered_periods(periods: &[Period], records: &RecordSet) -> Vec<Period> {
    periods
        .iter()
        .filter(|period| is_covered(period, records))
        .copied()
        .collect()
}

fn is_covered(period: &Period, records: &RecordSet) -> bool {
    records.iter().any(|r| period.contains(r.period_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filings_core::{EntityId, FilingRecord, RecordKind, generate_periods_from};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quarterly(end: NaiveDate) -> FilingRecord {
        FilingRecord::new("q.txt", EntityId::new("AAPL"), RecordKind::Quarterly, end)
    }

    fn q3_2023() -> Period {
        Period::for_quarter(2023, 2).unwrap()
    }

    fn q4_2023() -> Period {
        Period::for_quarter(2023, 3).unwrap()
    }

    #[test]
    fn test_covered_period_is_not_a_gap() {
        let records = RecordSet::from_records(vec![quarterly(date(2023, 8, 15))]);
        assert!(find_gaps(&[q3_2023()], &records).is_empty());
    }

    #[test]
    fn test_uncovered_period_is_a_gap() {
        let records = RecordSet::from_records(vec![quarterly(date(2023, 8, 15))]);
        assert_eq!(find_gaps(&[q4_2023()], &records), vec![q4_2023()]);
    }

    #[test]
    fn test_empty_records_leave_every_period_open() {
        let periods = generate_periods_from(date(2024, 5, 15), 6).unwrap();
        assert_eq!(find_gaps(&periods, &RecordSet::new()), periods);
        assert!(covered_periods(&periods, &RecordSet::new()).is_empty());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let records = RecordSet::from_records(vec![
            quarterly(date(2023, 7, 1)),
            quarterly(date(2023, 12, 31)),
        ]);
        assert!(find_gaps(&[q3_2023(), q4_2023()], &records).is_empty());
    }

    #[test]
    fn test_order_is_preserved_and_inputs_untouched() {
        let periods = generate_periods_from(date(2024, 5, 15), 4).unwrap();
        let records = RecordSet::from_records(vec![
            quarterly(date(2023, 12, 30)),
            FilingRecord::new("k.txt", EntityId::new("AAPL"), RecordKind::Annual, date(2024, 3, 30)),
        ]);
        let before = records.clone();

        let gaps = find_gaps(&periods, &records);
        assert_eq!(gaps, vec![periods[0], periods[3]]);
        assert_eq!(covered_periods(&periods, &records), vec![periods[1], periods[2]]);
        assert_eq!(find_gaps(&periods, &records), gaps);
        assert_eq!(records, before);
    }
}
