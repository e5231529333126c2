use crate::ActivityId;

/// Time-keyed activity preference.
///
/// Keyframes define a step function: the activity of the latest keyframe at or before `now`. A
/// cyclic schedule folds `now` into `[0, period)` first, and times before its first keyframe wrap
/// around to the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    keyframes: Vec<(u64, ActivityId)>,
    period: Option<u64>,
}

impl Schedule {
    /// Keyframes may be given in any order. When two share a time the later one wins.
    pub fn new(keyframes: impl IntoIterator<Item = (u64, ActivityId)>) -> Self {
        let mut sorted: Vec<(u64, ActivityId)> = keyframes.into_iter().collect();
        sorted.sort_by_key(|(at, _)| *at);

        let mut keyframes: Vec<(u64, ActivityId)> = Vec::with_capacity(sorted.len());
        for (at, activity) in sorted {
            match keyframes.last_mut() {
                Some(last) if last.0 == at => last.1 = activity,
                _ => keyframes.push((at, activity)),
            }
        }

        Self {
            keyframes,
            period: None,
        }
    }

    pub fn cyclic(period: u64, keyframes: impl IntoIterator<Item = (u64, ActivityId)>) -> Self {
        Self::new(keyframes).with_period(period)
    }

    /// A zero period means "not cyclic".
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = (period > 0).then_some(period);
        self
    }

    pub fn keyframes(&self) -> &[(u64, ActivityId)] {
        &self.keyframes
    }

    pub fn period(&self) -> Option<u64> {
        self.period
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn tick(&self, now: u64) -> Option<ActivityId> {
        let t = self.period.map_or(now, |period| now % period);
        match self.keyframes.partition_point(|(at, _)| *at <= t) {
            0 if self.period.is_some() => self.keyframes.last().map(|(_, activity)| *activity),
            0 => None,
            idx => Some(self.keyframes[idx - 1].1),
        }
    }
}
