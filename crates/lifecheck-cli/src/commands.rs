use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use lifecheck_fixture::FixtureParams;
use lifecheck_harness::{scenario, Verifier};
use lifecheck_provider::SimSqlProvider;
use lifecheck_store::InMemoryStore;
use tracing::info;

use crate::output;

fn params_for(location: &str, run_id: Option<u32>) -> FixtureParams {
    match run_id {
        Some(id) => FixtureParams::new(id, location),
        None => FixtureParams::generate(location),
    }
}

fn load(name: &str, params: &FixtureParams) -> Result<scenario::Scenario> {
    scenario::by_name(name, params)
        .ok_or_else(|| {
            anyhow!(
                "unknown scenario '{}' (known: {})",
                name,
                scenario::NAMES.join(", ")
            )
        })?
        .map_err(Into::into)
}

pub fn list() -> Result<()> {
    let params = FixtureParams::new(0, "-");
    for name in scenario::NAMES {
        let s = load(name, &params)?;
        println!("{:<24} {} ({} steps)", s.name, s.summary, s.steps.len());
    }
    Ok(())
}

pub async fn run(name: &str, location: &str, run_id: Option<u32>) -> Result<()> {
    let params = params_for(location, run_id);
    info!(scenario = name, run_id = params.run_id, "running scenario");
    let s = load(name, &params)?;

    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(SimSqlProvider::new());
    let verifier = Verifier::new(store, provider.clone())
        .with_destroy_check_type(s.destroy_check.clone());

    match verifier.run(&s.steps).await {
        Ok(summary) => {
            print!("{}", output::render_summary(s.name, &summary));
            let live = provider.live_count().await;
            if live > 0 {
                bail!("{} resources survived teardown", live);
            }
            Ok(())
        }
        Err(e) => Err(anyhow!(e).context(format!("scenario '{}' failed", name))),
    }
}

pub fn render(name: &str, location: &str, run_id: Option<u32>) -> Result<()> {
    let params = params_for(location, run_id);
    let s = load(name, &params)?;
    print!("{}", output::render_steps_yaml(&s.steps)?);
    Ok(())
}
