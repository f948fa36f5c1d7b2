use super::UploadError;
use crate::gateway::PartLimits;

/// A half-open byte range `[start, end)` of the source, tagged with the
/// 1-based part number it will be uploaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub sequence_number: u32,
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits a payload of known length into size-bounded parts.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    chunk_size: u64,
}

impl ChunkPlanner {
    /// Create a planner producing parts of `chunk_size` bytes.
    ///
    /// `max_part_size` is the largest part the gateway accepts.
    pub fn new(chunk_size: u64, max_part_size: u64) -> Result<Self, UploadError> {
        if chunk_size == 0 {
            return Err(UploadError::Configuration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if chunk_size > max_part_size {
            return Err(UploadError::Configuration(format!(
                "chunk size {chunk_size} exceeds the maximum part size {max_part_size}"
            )));
        }
        Ok(ChunkPlanner { chunk_size })
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Plan the parts for a payload of `total_len` bytes.
    pub fn plan(&self, total_len: u64) -> ChunkPlan {
        ChunkPlan {
            total_len,
            chunk_size: self.chunk_size,
            next_start: 0,
            next_sequence: 1,
            finished: false,
        }
    }

    /// Check that the plan for `total_len` bytes fits the gateway's limits.
    pub fn check(&self, total_len: u64, limits: &PartLimits) -> Result<(), UploadError> {
        if self.chunk_size > limits.max_part_size {
            return Err(UploadError::Configuration(format!(
                "chunk size {} exceeds the maximum part size {}",
                self.chunk_size, limits.max_part_size
            )));
        }

        let parts = self.part_count(total_len);
        if parts > limits.max_parts {
            return Err(UploadError::Configuration(format!(
                "{total_len} bytes in parts of {} needs {parts} parts, more than the limit of {}",
                self.chunk_size, limits.max_parts
            )));
        }
        // Only the last part may be smaller than the minimum
        if parts > 1 && self.chunk_size < limits.min_part_size {
            return Err(UploadError::Configuration(format!(
                "chunk size {} is below the minimum part size {}",
                self.chunk_size, limits.min_part_size
            )));
        }
        Ok(())
    }

    /// Number of parts a payload of `total_len` bytes is split into.
    /// An empty payload still produces one (empty) part.
    pub fn part_count(&self, total_len: u64) -> u64 {
        total_len.div_ceil(self.chunk_size).max(1)
    }
}

/// Ordered, one-shot sequence of ranges covering `[0, total_len)`.
#[derive(Debug)]
pub struct ChunkPlan {
    total_len: u64,
    chunk_size: u64,
    next_start: u64,
    next_sequence: u32,
    finished: bool,
}

impl ChunkPlan {
    pub fn total_len(&self) -> u64 {
        self.total_len
    }
}

impl Iterator for ChunkPlan {
    type Item = ChunkRange;

    fn next(&mut self) -> Option<ChunkRange> {
        if self.finished {
            return None;
        }

        // Empty payloads still get exactly one upload attempt
        if self.total_len == 0 {
            self.finished = true;
            return Some(ChunkRange {
                sequence_number: 1,
                start: 0,
                end: 0,
            });
        }

        if self.next_start >= self.total_len {
            self.finished = true;
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.chunk_size).min(self.total_len);
        let range = ChunkRange {
            sequence_number: self.next_sequence,
            start,
            end,
        };

        self.next_start = end;
        self.next_sequence = self.next_sequence.saturating_add(1);
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.finished {
            0
        } else if self.total_len == 0 {
            1
        } else {
            (self.total_len - self.next_start).div_ceil(self.chunk_size) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkPlan {}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn planner(chunk_size: u64) -> ChunkPlanner {
        ChunkPlanner::new(chunk_size, u64::MAX).unwrap()
    }

    #[test]
    fn test_zero_chunk_size_is_configuration_error() {
        let err = ChunkPlanner::new(0, MIB).unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
    }

    #[test]
    fn test_chunk_above_max_part_size_rejected() {
        let err = ChunkPlanner::new(MIB + 1, MIB).unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
        assert!(ChunkPlanner::new(MIB, MIB).is_ok());
    }

    #[test]
    fn test_check_part_count_limit() {
        let limits = PartLimits {
            min_part_size: 0,
            max_part_size: u64::MAX,
            max_parts: 3,
        };
        assert!(planner(4).check(12, &limits).is_ok());
        let err = planner(4).check(13, &limits).unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
    }

    #[test]
    fn test_check_s3_limits() {
        let s3 = PartLimits::S3;

        // Default part size reaches the 10,000 part limit at about 49 GiB
        let p = planner(5 * MIB);
        assert!(p.check(10_000 * 5 * MIB, &s3).is_ok());
        assert!(p.check(10_000 * 5 * MIB + 1, &s3).is_err());

        // Small parts are fine as long as there is only one of them
        let small = planner(MIB);
        assert!(small.check(MIB, &s3).is_ok());
        assert!(small.check(MIB + 1, &s3).is_err());
    }

    #[test]
    fn test_check_unbounded_caps_part_numbers() {
        let limits = PartLimits::UNBOUNDED;
        let max = u32::MAX as u64;
        assert!(planner(1).check(max, &limits).is_ok());
        assert!(planner(1).check(max + 1, &limits).is_err());
    }

    #[test]
    fn test_twelve_mib_in_five_mib_parts() {
        let ranges: Vec<_> = planner(5 * MIB).plan(12 * MIB).collect();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].len(), 5 * MIB);
        assert_eq!(ranges[1].len(), 5 * MIB);
        assert_eq!(ranges[2].len(), 2 * MIB);
        let numbers: Vec<_> = ranges.iter().map(|r| r.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_payload_yields_one_empty_range() {
        let ranges: Vec<_> = planner(4).plan(0).collect();
        assert_eq!(
            ranges,
            vec![ChunkRange {
                sequence_number: 1,
                start: 0,
                end: 0
            }]
        );
        assert_eq!(planner(4).part_count(0), 1);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_range() {
        let ranges: Vec<_> = planner(4).plan(8).collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].start, 4);
        assert_eq!(ranges[1].end, 8);
    }

    #[test]
    fn test_ranges_are_contiguous_and_cover_payload() {
        for chunk_size in [1u64, 3, 7, 64] {
            for total in [0u64, 1, 2, 6, 7, 63, 64, 65, 200] {
                let p = planner(chunk_size);
                let plan = p.plan(total);
                assert_eq!(plan.len() as u64, p.part_count(total));

                let ranges: Vec<_> = plan.collect();
                assert_eq!(ranges.len() as u64, p.part_count(total));

                let mut expected_start = 0;
                for (i, range) in ranges.iter().enumerate() {
                    assert_eq!(range.sequence_number as usize, i + 1);
                    assert_eq!(range.start, expected_start);
                    let last = i == ranges.len() - 1;
                    if last {
                        assert!(range.len() <= chunk_size);
                        assert!(total == 0 || range.len() > 0);
                    } else {
                        assert_eq!(range.len(), chunk_size);
                    }
                    expected_start = range.end;
                }
                assert_eq!(expected_start, total);
            }
        }
    }

    #[test]
    fn test_plan_is_not_restartable() {
        let mut plan = planner(4).plan(5);
        assert_eq!(plan.by_ref().count(), 2);
        assert!(plan.next().is_none());
        assert_eq!(plan.len(), 0);
    }
}
