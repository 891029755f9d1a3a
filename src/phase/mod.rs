/// 경매 단계 계산
/// 서버 시각과 경매 시작/종료 시간만으로 단계를 계산하는 순수 함수 모음
/// 단계는 저장하지 않고, 필요할 때마다 다시 계산한다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

// endregion: --- Imports

// region:    --- Phase
const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// 경매 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Upcoming,
    Active,
    Ended,
}

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Upcoming => "upcoming",
            Phase::Active => "active",
            Phase::Ended => "ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 남은 시간(일/시/분/초)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    /// 밀리초를 정수 나눗셈으로 분해한다. 음수는 0으로 취급한다.
    pub fn from_millis(millis: i64) -> Self {
        let millis = millis.max(0);
        Self {
            days: millis / MILLIS_PER_DAY,
            hours: (millis / MILLIS_PER_HOUR) % 24,
            minutes: (millis / MILLIS_PER_MINUTE) % 60,
            seconds: (millis / MILLIS_PER_SECOND) % 60,
        }
    }
}

/// 하루 이상 남았으면 "2d 03h 04m", 그 외에는 "03:04:05"
impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d {:02}h {:02}m", self.days, self.hours, self.minutes)
        } else {
            write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
        }
    }
}

/// 특정 시각 기준 경매 단계와 다음 경계까지 남은 시간
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub phase: Phase,
    pub remaining_ms: i64,
    pub time_left: TimeLeft,
}

/// 단계만 계산
pub fn resolve_phase(now: DateTime<Utc>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Phase {
    if now < start_time {
        Phase::Upcoming
    } else if now < end_time {
        Phase::Active
    } else {
        Phase::Ended
    }
}

/// 단계와 남은 시간 계산
/// Upcoming이면 시작까지, Active면 종료까지 남은 시간이며 Ended면 0이다.
pub fn snapshot(now: DateTime<Utc>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> PhaseSnapshot {
    let phase = resolve_phase(now, start_time, end_time);
    let remaining_ms = match phase {
        Phase::Upcoming => (start_time - now).num_milliseconds(),
        Phase::Active => (end_time - now).num_milliseconds(),
        Phase::Ended => 0,
    };
    PhaseSnapshot {
        phase,
        remaining_ms,
        time_left: TimeLeft::from_millis(remaining_ms),
    }
}

// endregion: --- Phase
