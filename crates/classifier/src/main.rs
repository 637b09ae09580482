use anyhow::Context;
use classifier::{
    Classifier, ClassifierConfig, LabelTable, ModelContainer, backend::tract::TractEngine,
    logging::setup_logging,
};
use preprocess::RasterImage;

fn main() -> anyhow::Result<()> {
    let config = ClassifierConfig::from_env()?;
    setup_logging(&config)?;

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    let model = ModelContainer::load_from_path(&config.model_path)
        .with_context(|| format!("loading model {}", config.model_path))?;
    let labels = LabelTable::from_path(&config.label_path)
        .with_context(|| format!("loading labels {}", config.label_path))?;

    let image_path = config
        .image_path
        .clone()
        .context("IMAGE_PATH must point at the image to classify")?;
    let image = image::open(&image_path).with_context(|| format!("decoding {image_path}"))?;
    let image = RasterImage::from(image);

    let mut classifier = Classifier::new(TractEngine, &config);
    classifier.set_model(model);
    classifier.set_labels(labels);
    classifier.set_image(Some(image));

    let results = classifier.classify()?;
    if results.is_empty() {
        println!("no class above {:.4}", config.confidence_threshold);
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. {:>6.2}%  {:>5}  {}",
            rank + 1,
            result.confidence * 100.0,
            result.index,
            result.label
        );
    }

    Ok(())
}
