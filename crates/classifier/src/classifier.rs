use crate::backend::{GraphOptions, InferenceEngine};
use crate::config::ClassifierConfig;
use crate::errors::{ClassifierError, Result};
use crate::labels::LabelTable;
use crate::model::ModelContainer;
use crate::postprocessing::{Classification, Ranker};
use crate::session::Session;
use common::span;
use preprocess::{CpuPreProcessor, PreparedInput, Preprocess, RasterImage};

/// Single-image classification pipeline.
///
/// Owns the model, label table and bound image. [`Self::allocate_tensor_buffers`]
/// builds the session and fills its input; [`Self::infer`] runs the model and
/// ranks the output. The session is reused until the model changes.
pub struct Classifier<E: InferenceEngine> {
    engine: E,
    options: GraphOptions,
    preprocessor: CpuPreProcessor,
    ranker: Ranker,
    model: Option<ModelContainer>,
    labels: LabelTable,
    image: Option<RasterImage>,
    session: Option<Session<E::Graph>>,
    prepared: Option<PreparedInput>,
    results: Vec<Classification>,
}

impl<E: InferenceEngine> Classifier<E> {
    pub fn new(engine: E, config: &ClassifierConfig) -> Self {
        Self {
            engine,
            options: GraphOptions {
                num_threads: config.num_threads,
                ..GraphOptions::default()
            },
            preprocessor: CpuPreProcessor::new(config.preprocess),
            ranker: Ranker::new(config.confidence_threshold, config.max_results),
            model: None,
            labels: LabelTable::default(),
            image: None,
            session: None,
            prepared: None,
            results: Vec::new(),
        }
    }

    /// Replace the model. Any session built from the previous one is dropped.
    pub fn set_model(&mut self, model: ModelContainer) {
        self.model = Some(model);
        self.session = None;
        self.prepared = None;
        self.results.clear();
    }

    pub fn model(&self) -> Option<&ModelContainer> {
        self.model.as_ref()
    }

    pub fn set_labels(&mut self, labels: LabelTable) {
        self.labels = labels;
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn set_image(&mut self, image: Option<RasterImage>) {
        self.image = image;
    }

    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    pub fn session(&self) -> Option<&Session<E::Graph>> {
        self.session.as_ref()
    }

    /// Input written by the last successful [`Self::allocate_tensor_buffers`].
    pub fn prepared(&self) -> Option<&PreparedInput> {
        self.prepared.as_ref()
    }

    /// Results of the last successful [`Self::infer`]. Empty after a failure.
    pub fn results(&self) -> &[Classification] {
        &self.results
    }

    /// Build and allocate the session if needed, then preprocess the bound
    /// image into its input tensor.
    pub fn allocate_tensor_buffers(&mut self) -> Result<()> {
        let _s = span!("allocate_tensor_buffers");

        self.prepared = None;
        self.results.clear();

        if self.session.is_none() {
            let model = self.model.as_ref().ok_or(ClassifierError::EmptyInput)?;
            let mut session = Session::build(&self.engine, model, &self.options)?;
            session.allocate()?;
            self.session = Some(session);
        }

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ClassifierError::execution("session unavailable"))?;

        let prepared = self
            .preprocessor
            .prepare(self.image.as_ref(), session.input_spec())?;
        session.fill_input(&prepared.data)?;

        tracing::debug!(
            width = prepared.width,
            height = prepared.height,
            channels = prepared.channels,
            written = prepared.written,
            "Input tensor filled"
        );

        self.prepared = Some(prepared);
        Ok(())
    }

    /// Run the model on the filled input and rank its output.
    pub fn infer(&mut self) -> Result<&[Classification]> {
        let _s = span!("infer");

        self.results.clear();

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ClassifierError::execution("tensors have not been allocated"))?;
        if self.prepared.is_none() {
            return Err(ClassifierError::execution("input tensor has not been filled"));
        }

        session.run()?;
        let results = self
            .ranker
            .rank(session.output()?, session.output_spec(), &self.labels)?;

        for (rank, result) in results.iter().enumerate() {
            tracing::info!(
                rank = rank + 1,
                confidence = result.confidence,
                index = result.index,
                label = %result.label,
                "Classification"
            );
        }

        self.results = results;
        Ok(&self.results)
    }

    /// [`Self::allocate_tensor_buffers`] followed by [`Self::infer`].
    pub fn classify(&mut self) -> Result<&[Classification]> {
        self.allocate_tensor_buffers()?;
        self.infer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::{FailurePoint, ScriptedEngine};
    use crate::errors::ErrorKind;
    use crate::model::MODEL_SIGNATURE;
    use common::{ElementType, TensorData, TensorSpec};
    use ndarray::{ArrayD, IxDyn};
    use preprocess::PixelFormat;

    fn test_model() -> ModelContainer {
        let mut bytes = vec![0u8; 4];
        bytes.extend_from_slice(MODEL_SIGNATURE.as_bytes());
        ModelContainer::load(&bytes).unwrap()
    }

    fn test_engine() -> ScriptedEngine {
        ScriptedEngine::new(
            TensorSpec::new([1, 8, 8, 3], ElementType::F32),
            TensorSpec::new([1, 4], ElementType::F32),
        )
        .with_output(TensorData::F32(
            ArrayD::from_shape_vec(IxDyn(&[1, 4]), vec![0.1, 0.6, 0.0, 0.3]).unwrap(),
        ))
    }

    fn test_image(width: u32, height: u32) -> RasterImage {
        let data = vec![100u8; (width * height * 3) as usize];
        RasterImage::new(width, height, PixelFormat::Rgb8, data).unwrap()
    }

    fn ready_classifier(engine: ScriptedEngine) -> Classifier<ScriptedEngine> {
        let mut classifier = Classifier::new(engine, &ClassifierConfig::test_default());
        classifier.set_model(test_model());
        classifier.set_labels(LabelTable::from_text("zero\none\ntwo\nthree"));
        classifier.set_image(Some(test_image(16, 16)));
        classifier
    }

    #[test]
    fn test_classify() {
        let mut classifier = ready_classifier(test_engine());
        let labels: Vec<_> = classifier
            .classify()
            .unwrap()
            .iter()
            .map(|c| c.label.clone())
            .collect();

        assert_eq!(labels, vec!["one", "three", "zero"]);
        assert_eq!(classifier.results().len(), 3);
        assert_eq!(classifier.session().unwrap().graph().num_threads(), 1);
    }

    #[test]
    fn test_session_reused_until_model_changes() {
        let mut classifier = ready_classifier(test_engine());
        classifier.classify().unwrap();
        classifier.classify().unwrap();
        assert_eq!(classifier.session().unwrap().graph().invocations(), 2);

        classifier.set_model(test_model());
        assert!(classifier.session().is_none());
        assert!(classifier.results().is_empty());
    }

    #[test]
    fn test_missing_model() {
        let mut classifier = Classifier::new(test_engine(), &ClassifierConfig::test_default());
        classifier.set_image(Some(test_image(8, 8)));
        assert_eq!(
            classifier.allocate_tensor_buffers().unwrap_err().kind(),
            ErrorKind::EmptyInput
        );
    }

    #[test]
    fn test_missing_image() {
        let mut classifier = ready_classifier(test_engine());
        classifier.set_image(None);
        assert_eq!(
            classifier.classify().unwrap_err().kind(),
            ErrorKind::NullSource
        );
        assert!(classifier.prepared().is_none());
    }

    #[test]
    fn test_infer_before_allocation() {
        let mut classifier = ready_classifier(test_engine());
        assert_eq!(
            classifier.infer().unwrap_err().kind(),
            ErrorKind::ExecutionFailed
        );
    }

    #[test]
    fn test_failed_run_clears_results() {
        let mut classifier = ready_classifier(test_engine().failing_at(FailurePoint::Invoke));
        classifier.allocate_tensor_buffers().unwrap();
        assert_eq!(
            classifier.infer().unwrap_err().kind(),
            ErrorKind::ExecutionFailed
        );
        assert!(classifier.results().is_empty());
    }

    #[test]
    fn test_build_failure_propagates() {
        let mut classifier = ready_classifier(test_engine().failing_at(FailurePoint::Build));
        assert_eq!(
            classifier.classify().unwrap_err().kind(),
            ErrorKind::GraphBuildFailed
        );
        assert!(classifier.session().is_none());
    }
}
