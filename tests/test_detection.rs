//! Integration tests for the detector adapters and detector factory.

mod common;

use common::{blank_page, RecordingResolver, ScriptedLoader, ScriptedModel};
use commonforms::detection::{
    create_detector, Backend, DetectionModel, DetectionParams, Detector, FfdetrDetector,
    FfdnetDetector, PredictParams, RawDetection,
};
use commonforms::error::{Error, Result};
use commonforms::ml::{ModelLoader, ModelVariant};
use commonforms::pipeline::config::{DetectionConfig, Device, ReadingOrderConfig};
use commonforms::pipeline::LineGroupingStrategy;
use commonforms::widget::WidgetType;
use image::DynamicImage;
use std::path::Path;

fn params(batch_size: usize) -> DetectionParams {
    DetectionParams {
        confidence: 0.4,
        image_size: 1024,
        batch_size,
    }
}

fn ffdnet(script: Vec<Vec<RawDetection>>) -> FfdnetDetector {
    FfdnetDetector::new(
        Box::new(ScriptedModel::new(script)),
        Box::new(LineGroupingStrategy::new()),
    )
}

fn assert_close(actual: f32, expected: f32) {
    assert!((actual - expected).abs() < 1e-5, "{} != {}", actual, expected);
}

#[test]
fn test_ffdnet_center_boxes() {
    let mut detector = ffdnet(vec![vec![RawDetection::new(0, [0.5, 0.5, 0.2, 0.1], 0.9)]]);
    let result = detector
        .extract_widgets(&[blank_page(100, 100)], &params(4))
        .unwrap();

    let widget = &result[&0][0];
    assert_eq!(widget.widget_type, WidgetType::TextBox);
    assert_eq!(widget.page, 0);
    assert_close(widget.bounding_box.x0, 0.4);
    assert_close(widget.bounding_box.y0, 0.45);
    assert_close(widget.bounding_box.x1, 0.6);
    assert_close(widget.bounding_box.y1, 0.55);
}

#[test]
fn test_ffdetr_pixel_boxes() {
    let mut detector = FfdetrDetector::new(
        Box::new(ScriptedModel::new(vec![vec![RawDetection::new(
            1,
            [100.0, 200.0, 150.0, 250.0],
            0.8,
        )]])),
        Box::new(LineGroupingStrategy::new()),
    );
    let result = detector
        .extract_widgets(&[blank_page(1000, 2000)], &params(4))
        .unwrap();

    let widget = &result[&0][0];
    assert_eq!(widget.widget_type, WidgetType::ChoiceButton);
    assert_close(widget.bounding_box.x0, 0.1);
    assert_close(widget.bounding_box.y0, 0.1);
    assert_close(widget.bounding_box.x1, 0.15);
    assert_close(widget.bounding_box.y1, 0.125);
    assert_eq!(detector.backend(), Backend::FFDetr);
}

/// Overlapping boxes of different classes describe one object; the most
/// confident survives.
#[test]
fn test_cross_class_duplicates_are_suppressed() {
    let mut detector = ffdnet(vec![vec![
        RawDetection::new(0, [0.30, 0.30, 0.20, 0.05], 0.70),
        RawDetection::new(2, [0.31, 0.30, 0.20, 0.05], 0.95),
        RawDetection::new(1, [0.80, 0.80, 0.02, 0.02], 0.60),
    ]]);
    let result = detector
        .extract_widgets(&[blank_page(200, 200)], &params(1))
        .unwrap();

    let kinds: Vec<WidgetType> = result[&0].iter().map(|w| w.widget_type).collect();
    assert_eq!(kinds, vec![WidgetType::Signature, WidgetType::ChoiceButton]);
}

#[test]
fn test_low_confidence_is_dropped() {
    let mut detector = ffdnet(vec![vec![
        RawDetection::new(0, [0.2, 0.2, 0.1, 0.05], 0.39),
        RawDetection::new(0, [0.6, 0.6, 0.1, 0.05], 0.40),
    ]]);
    let result = detector
        .extract_widgets(&[blank_page(100, 100)], &params(4))
        .unwrap();
    assert_eq!(result[&0].len(), 1);
    assert_close(result[&0][0].bounding_box.x0, 0.55);
}

#[test]
fn test_pages_without_widgets_are_omitted() {
    let mut detector = ffdnet(vec![
        vec![],
        vec![RawDetection::new(0, [0.5, 0.5, 0.1, 0.1], 0.9)],
        vec![RawDetection::new(0, [0.5, 0.5, 0.1, 0.1], 0.1)],
    ]);
    let pages = vec![blank_page(50, 50), blank_page(50, 50), blank_page(50, 50)];
    let result = detector.extract_widgets(&pages, &params(2)).unwrap();

    assert_eq!(result.keys().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(result[&1][0].page, 1);
}

/// Per-page results don't depend on how pages are split into batches.
#[test]
fn test_batch_boundaries_do_not_change_results() {
    let script = || {
        (0..5)
            .map(|i| {
                let y = 0.1 + i as f32 * 0.1;
                vec![
                    RawDetection::new(0, [0.7, y, 0.2, 0.04], 0.9),
                    RawDetection::new(1, [0.2, y, 0.03, 0.03], 0.8),
                ]
            })
            .collect::<Vec<_>>()
    };
    let pages: Vec<_> = (0..5).map(|_| blank_page(64, 64)).collect();

    let model_one = ScriptedModel::new(script());
    let calls_one = model_one.calls.clone();
    let mut one_at_a_time = FfdnetDetector::new(Box::new(model_one), Box::new(LineGroupingStrategy::new()));

    let model_all = ScriptedModel::new(script());
    let calls_all = model_all.calls.clone();
    let mut batched = FfdnetDetector::new(Box::new(model_all), Box::new(LineGroupingStrategy::new()));

    let a = one_at_a_time.extract_widgets(&pages, &params(1)).unwrap();
    let b = batched.extract_widgets(&pages, &params(3)).unwrap();
    assert_eq!(a, b);

    let sizes = |calls: &std::sync::Arc<std::sync::Mutex<Vec<(usize, PredictParams)>>>| {
        calls.lock().unwrap().iter().map(|(n, _)| *n).collect::<Vec<_>>()
    };
    assert_eq!(sizes(&calls_one), vec![1, 1, 1, 1, 1]);
    assert_eq!(sizes(&calls_all), vec![3, 2]);

    // Reading order within each page: checkbox on the left first.
    assert_eq!(a[&0][0].widget_type, WidgetType::ChoiceButton);
    assert_eq!(a[&0][1].widget_type, WidgetType::TextBox);
}

#[test]
fn test_unknown_class_is_fatal() {
    let mut detector = ffdnet(vec![vec![RawDetection::new(5, [0.5, 0.5, 0.1, 0.1], 0.9)]]);
    let err = detector
        .extract_widgets(&[blank_page(10, 10)], &params(1))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownClass { class_id: 5, backend: "FFDNet" }));
}

struct ShortModel;

impl DetectionModel for ShortModel {
    fn predict(&mut self, images: &[&DynamicImage], _: &PredictParams) -> Result<Vec<Vec<RawDetection>>> {
        Ok(vec![Vec::new(); images.len().saturating_sub(1)])
    }
}

#[test]
fn test_short_model_output_is_batch_mismatch() {
    let mut detector = FfdnetDetector::new(Box::new(ShortModel), Box::new(LineGroupingStrategy::new()));
    let pages = vec![blank_page(10, 10), blank_page(10, 10)];
    let err = detector.extract_widgets(&pages, &params(2)).unwrap_err();
    assert!(matches!(err, Error::BatchMismatch { expected: 2, found: 1 }));
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let mut detector = ffdnet(Vec::new());
    let err = detector
        .extract_widgets(&[blank_page(10, 10)], &params(0))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_fast_mode_model_parameters() {
    let model = ScriptedModel::new(vec![vec![]]);
    let calls = model.calls.clone();
    let mut detector = FfdnetDetector::new(Box::new(model), Box::new(LineGroupingStrategy::new()))
        .with_fast(true);
    detector.extract_widgets(&[blank_page(10, 10)], &params(1)).unwrap();

    let (_, predict) = calls.lock().unwrap()[0].clone();
    assert_eq!(predict.image_size, 1216);
    assert!(!predict.augment);
    assert_eq!(predict.iou, 1.0);

    let model = ScriptedModel::new(vec![vec![]]);
    let calls = model.calls.clone();
    let mut detector = FfdnetDetector::new(Box::new(model), Box::new(LineGroupingStrategy::new()));
    detector.extract_widgets(&[blank_page(10, 10)], &params(1)).unwrap();

    let (_, predict) = calls.lock().unwrap()[0].clone();
    assert_eq!(predict.image_size, 1024);
    assert!(predict.augment);
}

#[test]
fn test_factory_picks_fast_ffdnet_weights() {
    let resolver = RecordingResolver::default();
    let requests = resolver.requests.clone();
    let loader = ScriptedLoader::new(Vec::new());
    let loaded = loader.loaded.clone();

    let config = DetectionConfig::default()
        .with_model("FFDNet-S")
        .with_fast(true)
        .with_device(Device::Cuda(1));
    let detector = create_detector(&config, &ReadingOrderConfig::default(), &resolver, &loader).unwrap();

    assert_eq!(detector.backend(), Backend::FFDNet);
    assert_eq!(
        *requests.lock().unwrap(),
        vec![("FFDNet-S".to_string(), ModelVariant::Fast)]
    );
    let loaded = loaded.lock().unwrap();
    assert_eq!(loaded[0].0, Backend::FFDNet);
    assert_eq!(loaded[0].2, Device::Cuda(1));
}

#[test]
fn test_factory_ignores_fast_for_ffdetr() {
    let resolver = RecordingResolver::default();
    let requests = resolver.requests.clone();
    let loader = ScriptedLoader::new(Vec::new());

    let config = DetectionConfig::default().with_fast(true);
    let detector = create_detector(&config, &ReadingOrderConfig::default(), &resolver, &loader).unwrap();

    assert_eq!(detector.backend(), Backend::FFDetr);
    assert_eq!(requests.lock().unwrap()[0].1, ModelVariant::Standard);
}

/// Loader that reads only `.onnx` files and must never be asked to load.
struct OnnxOnlyLoader;

impl ModelLoader for OnnxOnlyLoader {
    fn load(&self, _: Backend, weights: &Path, _: Device) -> Result<Box<dyn DetectionModel>> {
        panic!("unexpected load of {}", weights.display())
    }

    fn supports(&self, weights: &Path) -> bool {
        weights.extension().is_some_and(|ext| ext == "onnx")
    }
}

#[test]
fn test_unloadable_registered_model_is_rejected_before_fetch() {
    for config in [
        DetectionConfig::default(),
        DetectionConfig::default().with_model("FFDNet-L"),
        DetectionConfig::default().with_model("ffdetr").with_fast(true),
    ] {
        let resolver = RecordingResolver::default();
        let requests = resolver.requests.clone();

        let err = create_detector(&config, &ReadingOrderConfig::default(), &resolver, &OnnxOnlyLoader)
            .err()
            .expect("unloadable model accepted");

        assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("--fast")), "{err}");
        assert!(requests.lock().unwrap().is_empty(), "{} was fetched", config.model);
    }
}

#[test]
fn test_loadable_registered_model_is_fetched() {
    let resolver = RecordingResolver::default();
    let requests = resolver.requests.clone();
    let loader = ScriptedLoader::new(Vec::new());

    let config = DetectionConfig::default().with_model("FFDNet-S").with_fast(true);
    assert!(OnnxOnlyLoader.supports(Path::new("FFDNet-S.onnx")));
    create_detector(&config, &ReadingOrderConfig::default(), &resolver, &loader).unwrap();
    assert_eq!(requests.lock().unwrap().len(), 1);
}
