use engine::{LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{self, ConfigError};
use super::scene_impl::SchoolScene;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Schoolday Startup ===");

    let scenario = config::load_scenario_from_env()?;
    let seed = config::seed_from_env()?;
    info!(
        seed = ?seed,
        food_count = scenario.transition.food.len(),
        proximity_threshold = scenario.proximity_threshold,
        "scenario_ready"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: Box::new(SchoolScene::new(scenario, seed)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
