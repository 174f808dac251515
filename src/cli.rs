use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::Cli;
use crate::config::RateApiConfig;
use crate::data::{CurrencyApi, DemoCurrencyApi, HttpCurrencyApi};
use crate::engine::{CatalogState, DashboardController, SelectOutcome};
use crate::ui::{render_dashboard, render_status_line};
use crate::utils::{AppInstant, today_local};

/// Runs one dashboard session: load units, apply CLI choices, settle the date,
/// then print the window as it fills in.
pub async fn run(args: Cli) -> Result<()> {
    let api: Arc<dyn CurrencyApi> = if args.offline {
        log::info!("Using bundled demo rates");
        Arc::new(DemoCurrencyApi::load()?)
    } else {
        let config = match &args.api_base {
            Some(base) => RateApiConfig::with_base_url(base.as_str()),
            None => RateApiConfig::default(),
        };
        log::info!("Using rate API at {}", config.base_url);
        Arc::new(HttpCurrencyApi::new(config)?)
    };

    let mut ctrl = DashboardController::on_current_runtime(api, today_local());
    ctrl.start_catalog_load();

    // Settle the date before any unit is set so only one window gets fetched.
    if let Some(input) = &args.date {
        match ctrl.select_date(input, AppInstant::now()) {
            SelectOutcome::Accepted(_) => {}
            SelectOutcome::Clamped(d) => log::warn!("Date {} out of range, using {}", input, d),
            SelectOutcome::Rejected => bail!("Invalid date '{}' (expected YYYY-MM-DD)", input),
        }
        if let Some(wait) = ctrl.selector().remaining(AppInstant::now()) {
            tokio::time::sleep(wait).await;
        }
    }
    ctrl.tick(AppInstant::now());
    apply_unit_choices(&mut ctrl, &args)?;

    if let CatalogState::Failed(reason) = ctrl.wait_for_catalog().await {
        log::warn!("Continuing without unit names: {}", reason);
    }
    if ctrl.main_unit().is_none() {
        println!("{}", render_dashboard(&ctrl.view()));
        bail!("No main unit: pass --main or check the unit list endpoint");
    }

    while let Some(key) = ctrl.next_completion().await {
        log::debug!("Settled {}", key);
        if args.progress {
            println!("{}", render_status_line(&ctrl.view()));
        }
    }

    let view = crate::trace_time!("Build dashboard view", 1_000, { ctrl.view() });
    println!("{}", render_dashboard(&view));

    let stats = ctrl.cache().stats();
    log::info!(
        "{} fetches issued, entries by state: {:?}",
        stats.fetches_issued,
        stats.by_state
    );
    Ok(())
}

fn apply_unit_choices(ctrl: &mut DashboardController, args: &Cli) -> Result<()> {
    if let Some(main) = &args.main {
        ctrl.set_main_unit(main)
            .with_context(|| format!("Invalid main unit '{}'", main))?;
    }

    for (i, code) in args.side.iter().enumerate() {
        let position = i as u32 + 1;
        while !ctrl.slots().contains(position) {
            if ctrl.add_slot().is_none() {
                bail!(
                    "Too many side units: at most {} allowed",
                    ctrl.slots().limits().max
                );
            }
        }
        ctrl.set_side_unit(position, code);
    }
    Ok(())
}
