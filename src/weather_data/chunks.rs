use chrono::{DateTime, TimeDelta, Utc};

/// A half-open `[start, end)` slice of a larger request interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeChunk {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeChunk {
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Splits `[start, end)` into consecutive chunks no longer than `max_span`.
///
/// Each chunk ends exactly where the next one starts and the last chunk is clipped
/// to `end`. Returns no chunks when the interval is empty or `max_span` is not positive.
pub fn chunk_range(start: DateTime<Utc>, end: DateTime<Utc>, max_span: TimeDelta) -> Vec<TimeChunk> {
    if max_span <= TimeDelta::zero() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = cursor + max_span;
        chunks.push(TimeChunk {
            start: cursor,
            end: next.min(end),
        });
        cursor = next;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assert_partition(start: DateTime<Utc>, end: DateTime<Utc>, span: TimeDelta) {
        let chunks = chunk_range(start, end, span);
        assert!(!chunks.is_empty());
        assert_eq!(chunks.first().unwrap().start, start);
        assert_eq!(chunks.last().unwrap().end, end);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "chunks must be contiguous");
        }
        for chunk in &chunks {
            assert!(chunk.start < chunk.end);
            assert!(chunk.duration() <= span);
        }
        let total: TimeDelta = chunks.iter().map(TimeChunk::duration).sum();
        assert_eq!(total, end - start);
    }

    #[test]
    fn test_chunks_reconstruct_interval() {
        let start = Utc.with_ymd_and_hms(2024, 5, 26, 0, 0, 0).unwrap();

        // 36 days fits inside a single 999 hour chunk
        assert_partition(start, start + TimeDelta::days(36), TimeDelta::hours(999));
        // Exactly one span
        assert_partition(start, start + TimeDelta::hours(999), TimeDelta::hours(999));
        // A whole season needs several chunks with a short tail
        assert_partition(start, start + TimeDelta::days(120), TimeDelta::hours(999));
        // Odd sizes
        assert_partition(start, start + TimeDelta::minutes(90), TimeDelta::minutes(7));
    }

    #[test]
    fn test_chunk_count_and_tail() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + TimeDelta::hours(2500);
        let chunks = chunk_range(start, end, TimeDelta::hours(999));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].duration(), TimeDelta::hours(999));
        assert_eq!(chunks[1].duration(), TimeDelta::hours(999));
        assert_eq!(chunks[2].duration(), TimeDelta::hours(502));
    }

    #[test]
    fn test_empty_and_degenerate_ranges() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(chunk_range(start, start, TimeDelta::hours(1)).is_empty());
        assert!(chunk_range(start + TimeDelta::hours(1), start, TimeDelta::hours(1)).is_empty());
        assert!(chunk_range(start, start + TimeDelta::hours(5), TimeDelta::zero()).is_empty());
    }
}
