mod demo;
mod provider;
mod rate_cache;

pub use {
    demo::DemoCurrencyApi,
    provider::{CurrencyApi, HttpCurrencyApi},
    rate_cache::{
        CacheEntry, CacheKey, CacheStats, EntryState, MergedView, RateCell, WindowedRateCache,
    },
};
