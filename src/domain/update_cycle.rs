use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::domain::wire::{DecodeError, optional_str, require_i64};

/// Operation result reported when the service could not reach the vehicle.
/// Observed in traffic; no further meaning is documented.
pub const ELECTRIC_WAVE_ABNORMAL: &str = "ELECTRIC_WAVE_ABNORMAL";

/// `responseFlag` value reported once a refresh has finished.
/// Observed in traffic; no further meaning is documented.
pub const RESPONSE_FLAG_COMPLETE: i64 = 1;

/// Identifies one in-flight refresh. Not `Clone`: a key belongs to a single cycle.
#[derive(PartialEq, Eq)]
pub struct ResultKey(String);

impl ResultKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResultKey").field(&self.0).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReply {
    Ready,
    Pending,
    /// The service gave up reaching the vehicle.
    Abnormal,
}

/// Interprets a `BatteryStatusCheckResultRequest` reply.
///
/// The abnormal sentinel wins over the completion flag.
pub fn decode_poll_reply(payload: &Value) -> Result<PollReply, DecodeError> {
    let object = payload.as_object().ok_or(DecodeError::InvalidPayloadType)?;

    if optional_str(object, "operationResult") == Some(ELECTRIC_WAVE_ABNORMAL) {
        return Ok(PollReply::Abnormal);
    }

    if require_i64(object, "responseFlag")? == RESPONSE_FLAG_COMPLETE {
        Ok(PollReply::Ready)
    } else {
        Ok(PollReply::Pending)
    }
}

/// Caller-side polling cadence. The protocol itself gives no completion guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Requested,
    Polling { attempts: u32 },
    Completed { attempts: u32 },
    Failed { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl UpdatePhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Exhausted { .. }
        )
    }

    fn attempts(self) -> u32 {
        match self {
            Self::Requested => 0,
            Self::Polling { attempts }
            | Self::Completed { attempts }
            | Self::Failed { attempts }
            | Self::Exhausted { attempts } => attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Tracks one refresh from request to a terminal phase.
#[derive(Debug)]
pub struct UpdateCycle {
    result_key: ResultKey,
    max_attempts: u32,
    phase: UpdatePhase,
}

impl UpdateCycle {
    pub fn new(result_key: ResultKey, policy: &PollPolicy) -> Self {
        Self {
            result_key,
            max_attempts: policy.max_attempts.max(1),
            phase: UpdatePhase::Requested,
        }
    }

    pub fn result_key(&self) -> &ResultKey {
        &self.result_key
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    /// Records one poll answer. Returns the outcome once the cycle reaches a terminal phase.
    pub fn observe(&mut self, ready: bool) -> Option<CycleOutcome> {
        if self.phase.is_terminal() {
            return None;
        }

        let attempts = self.phase.attempts() + 1;

        if ready {
            self.phase = UpdatePhase::Completed { attempts };
            return Some(CycleOutcome::Completed { attempts });
        }

        if attempts >= self.max_attempts {
            self.phase = UpdatePhase::Exhausted { attempts };
            return Some(CycleOutcome::Exhausted { attempts });
        }

        self.phase = UpdatePhase::Polling { attempts };
        None
    }

    /// Marks the cycle failed after a poll error; the error itself stays with the caller.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = UpdatePhase::Failed {
                attempts: self.phase.attempts() + 1,
            };
        }
    }

    /// Consumes the cycle and its result key.
    pub fn finish(self) -> UpdatePhase {
        self.phase
    }
}
