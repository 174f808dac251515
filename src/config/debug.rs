//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Cache entry creation, coalescing and state transitions.
    pub log_cache: bool,

    /// Outbound HTTP calls and retries.
    pub log_fetch: bool,

    /// Raw/settled date changes inside the debouncer.
    pub log_debounce: bool,

    /// Slot add/remove/set.
    pub log_slots: bool,

    /// Activate trace_time macro (for scope-level timing)
    pub log_performance: bool,
}

pub const DF: LogFlags = LogFlags {
    log_cache: false,
    log_fetch: true,
    log_debounce: false,
    log_slots: true,
    log_performance: false,
};
