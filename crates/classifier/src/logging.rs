use crate::config::ClassifierConfig;

pub fn setup_logging(config: &ClassifierConfig) -> anyhow::Result<()> {
    common::setup_logging(config.environment, config.log_level.as_deref())
}
