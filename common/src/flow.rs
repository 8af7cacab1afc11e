//! 検出フロー（CLI/WASM共通）
//!
//! 画像取得 -> 病害識別 -> (病害ありなら) 防除提案 -> 履歴へ保存
//!
//! 外部呼び出しは順番に1回ずつ行い、リトライ・タイムアウト・キャンセルはしない。
//! 失敗した試行は何も保存せずIdleへ戻る。

use crate::error::{Error, Result};
use crate::store::HistoryStore;
use crate::types::{DetectionResult, Identification, Recommendation, RecommendationRequest, Verdict};
use std::cell::Cell;
use std::fmt;

/// 画像の取得元（カメラ・ファイル）
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// "data:<mime>;base64,..." 形式で画像を返す
    async fn capture(&mut self) -> Result<String>;
}

/// 病害識別
#[allow(async_fn_in_trait)]
pub trait Identifier {
    async fn identify(&self, image_data_url: &str) -> Result<Identification>;
}

/// 防除提案
#[allow(async_fn_in_trait)]
pub trait Recommender {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation>;
}

/// 取得済みのData URLをそのまま返す取得元
#[derive(Debug, Clone)]
pub struct DataUrlSource(pub String);

impl ImageSource for DataUrlSource {
    async fn capture(&mut self) -> Result<String> {
        if self.0.starts_with("data:") {
            Ok(self.0.clone())
        } else {
            Err(Error::Capture("Data URLではありません".into()))
        }
    }
}

/// フローの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Capturing,
    Identifying,
    Recommending,
    Done,
    Error,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Capturing => "capturing",
            FlowState::Identifying => "identifying",
            FlowState::Recommending => "recommending",
            FlowState::Done => "done",
            FlowState::Error => "error",
        }
    }

    /// 処理中（画面をビジー表示にする）か
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FlowState::Capturing | FlowState::Identifying | FlowState::Recommending
        )
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1回の試行の結果
#[derive(Debug)]
pub enum FlowOutcome {
    /// 保存した（詳細表示用のID）
    Stored { id: String },
    /// 病害なし。保存しない
    Healthy(Identification),
    /// 植物不明・対応外。保存しない
    Unsupported(Identification),
    /// 取得または外部呼び出しの失敗。保存しない
    Failed(Error),
}

impl FlowOutcome {
    pub fn stored_id(&self) -> Option<&str> {
        match self {
            FlowOutcome::Stored { id } => Some(id),
            _ => None,
        }
    }
}

type Clock = Box<dyn Fn() -> i64>;
type Observer = Box<dyn Fn(FlowState)>;

/// 検出フロー
pub struct DetectionFlow<S> {
    store: S,
    clock: Clock,
    observer: Option<Observer>,
    state: Cell<FlowState>,
    last_id: Cell<i64>,
}

impl<S: HistoryStore> DetectionFlow<S> {
    /// `clock` はエポックミリ秒を返す
    pub fn new(store: S, clock: impl Fn() -> i64 + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
            observer: None,
            state: Cell::new(FlowState::Idle),
            last_id: Cell::new(i64::MIN),
        }
    }

    /// 状態遷移の通知先を設定
    pub fn with_observer(mut self, observer: impl Fn(FlowState) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> FlowState {
        self.state.get()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 1回分の検出を実行
    pub async fn run<C, I, R>(&self, source: &mut C, identifier: &I, recommender: &R) -> FlowOutcome
    where
        C: ImageSource,
        I: Identifier,
        R: Recommender,
    {
        self.transition(FlowState::Capturing);
        let image_data_url = match source.capture().await {
            Ok(url) => url,
            Err(e) => {
                // デバイス側の失敗はErrorを経由せずIdleへ
                log::warn!("画像の取得に失敗: {}", e);
                self.transition(FlowState::Idle);
                return FlowOutcome::Failed(e);
            }
        };

        self.transition(FlowState::Identifying);
        let identification = match identifier.identify(&image_data_url).await {
            Ok(identification) => identification,
            Err(e) => return self.fail(e),
        };
        log::debug!(
            "識別結果: {} / {} ({:.2})",
            identification.disease_name,
            identification.plant_type,
            identification.confidence_score
        );

        match identification.verdict() {
            Verdict::Unsupported => {
                self.transition(FlowState::Idle);
                return FlowOutcome::Unsupported(identification);
            }
            Verdict::Healthy => {
                self.transition(FlowState::Idle);
                return FlowOutcome::Healthy(identification);
            }
            Verdict::Diseased => {}
        }

        self.transition(FlowState::Recommending);
        let request = RecommendationRequest::for_identification(&identification);
        let recommendation = match recommender.recommend(&request).await {
            Ok(recommendation) => recommendation,
            Err(e) => return self.fail(e),
        };

        let (id, timestamp) = self.next_id();
        let record = DetectionResult::new(
            id.clone(),
            timestamp,
            image_data_url,
            identification,
            Some(recommendation),
        );
        if !self.store.add(record) {
            log::warn!("検出結果 {} を履歴に保存できませんでした", id);
        }

        self.transition(FlowState::Done);
        self.transition(FlowState::Idle);
        FlowOutcome::Stored { id }
    }

    fn fail(&self, error: Error) -> FlowOutcome {
        log::error!("検出に失敗: {}", error);
        self.transition(FlowState::Error);
        self.transition(FlowState::Idle);
        FlowOutcome::Failed(error)
    }

    fn transition(&self, next: FlowState) {
        self.state.set(next);
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }

    /// 時計が進まなくても、既存の記録と重ならないIDを払い出す
    fn next_id(&self) -> (String, i64) {
        let now = (self.clock)();
        let mut candidate = now.max(self.last_id.get().saturating_add(1));
        while self.store.get_by_id(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        self.last_id.set(candidate);
        (candidate.to_string(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryHistory;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::rc::Rc;

    const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

    struct StubIdentifier {
        result: RefCell<Option<Result<Identification>>>,
        calls: Cell<usize>,
    }

    impl StubIdentifier {
        fn returning(disease: &str, plant: &str, score: f64) -> Self {
            Self {
                result: RefCell::new(Some(Ok(Identification {
                    disease_name: disease.to_string(),
                    scientific_name: None,
                    confidence_score: score,
                    plant_type: plant.to_string(),
                }))),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: RefCell::new(Some(Err(Error::Api("API error: 500".into())))),
                calls: Cell::new(0),
            }
        }
    }

    impl Identifier for StubIdentifier {
        async fn identify(&self, image_data_url: &str) -> Result<Identification> {
            assert_eq!(image_data_url, IMAGE);
            self.calls.set(self.calls.get() + 1);
            match self.result.borrow().as_ref() {
                Some(Ok(identification)) => Ok(identification.clone()),
                _ => Err(Error::Api("API error: 500".into())),
            }
        }
    }

    struct StubRecommender {
        fail: bool,
        requests: RefCell<Vec<RecommendationRequest>>,
    }

    impl StubRecommender {
        fn ok() -> Self {
            Self {
                fail: false,
                requests: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Recommender for StubRecommender {
        async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
            self.requests.borrow_mut().push(request.clone());
            if self.fail {
                return Err(Error::Api("network down".into()));
            }
            Ok(Recommendation {
                treatment_recommendations: format!(
                    "Fungicide Recommendations: X for {}\nOrganic Alternatives: Y",
                    request.disease_name
                ),
            })
        }
    }

    struct FailingCamera;

    impl ImageSource for FailingCamera {
        async fn capture(&mut self) -> Result<String> {
            Err(Error::Capture("NotAllowedError".into()))
        }
    }

    fn flow_at(now: i64) -> DetectionFlow<MemoryHistory> {
        DetectionFlow::new(MemoryHistory::in_memory(), move || now)
    }

    /// 既存の記録を1件持つフロー
    fn seeded_flow_at(now: i64) -> (DetectionFlow<MemoryHistory>, Vec<DetectionResult>) {
        let store = MemoryHistory::in_memory();
        let existing = DetectionResult::new(
            "500",
            500,
            IMAGE,
            Identification {
                disease_name: "Leaf Rust".to_string(),
                scientific_name: None,
                confidence_score: 0.87,
                plant_type: "Wheat".to_string(),
            },
            None,
        );
        assert!(store.add(existing));
        let before = store.get_all();
        (DetectionFlow::new(store, move || now), before)
    }

    #[test]
    fn test_diseased_is_stored() {
        let flow = flow_at(1_700_000_000_000);
        let identifier = StubIdentifier::returning("Rust", "Beans", 0.92);
        let recommender = StubRecommender::ok();

        let outcome = block_on(flow.run(&mut DataUrlSource(IMAGE.to_string()), &identifier, &recommender));

        let id = outcome.stored_id().expect("保存されていない").to_string();
        assert_eq!(id, "1700000000000");
        assert_eq!(flow.state(), FlowState::Idle);

        let record = flow.store().get_by_id(&id).expect("記録が見つからない");
        assert_eq!(record.timestamp, 1_700_000_000_000);
        assert_eq!(record.image_data_url, IMAGE);
        assert_eq!(record.identification.disease_name, "Rust");
        assert_eq!(record.identification.confidence_score, 0.92);
        assert!(record
            .recommendations
            .expect("提案がない")
            .treatment_recommendations
            .contains("X for Rust"));

        let requests = recommender.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].disease_name, "Rust");
        assert_eq!(requests[0].crop_name, "Beans");
    }

    #[test]
    fn test_unknown_plant_not_stored() {
        let (flow, before) = seeded_flow_at(1000);
        let recommender = StubRecommender::ok();
        let outcome = block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::returning("Rust", "Unknown", 0.4),
            &recommender,
        ));

        assert!(matches!(outcome, FlowOutcome::Unsupported(_)));
        assert_eq!(flow.store().get_all(), before);
        assert!(recommender.requests.borrow().is_empty());
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn test_not_supported_not_stored() {
        let (flow, before) = seeded_flow_at(1000);
        let outcome = block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::returning("Disease not supported", "Tomato", 0.3),
            &StubRecommender::ok(),
        ));
        assert!(matches!(outcome, FlowOutcome::Unsupported(_)));
        assert_eq!(flow.store().get_all(), before);
    }

    #[test]
    fn test_healthy_not_stored() {
        let (flow, before) = seeded_flow_at(1000);
        let recommender = StubRecommender::ok();
        let outcome = block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::returning("Healthy", "Maize", 1.0),
            &recommender,
        ));

        match outcome {
            FlowOutcome::Healthy(identification) => assert_eq!(identification.plant_type, "Maize"),
            other => panic!("Expected Healthy, got {:?}", other),
        }
        assert_eq!(flow.store().get_all(), before);
        assert!(recommender.requests.borrow().is_empty());
    }

    #[test]
    fn test_identification_failure() {
        let flow = flow_at(1000);
        let identifier = StubIdentifier::failing();
        let recommender = StubRecommender::ok();
        let outcome = block_on(flow.run(&mut DataUrlSource(IMAGE.to_string()), &identifier, &recommender));

        assert!(matches!(outcome, FlowOutcome::Failed(Error::Api(_))));
        assert_eq!(identifier.calls.get(), 1);
        assert!(recommender.requests.borrow().is_empty());
        assert!(flow.store().get_all().is_empty());
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn test_recommendation_failure() {
        let flow = flow_at(1000);
        let outcome = block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::returning("Blight", "Maize", 0.81),
            &StubRecommender::failing(),
        ));

        assert!(matches!(outcome, FlowOutcome::Failed(_)));
        assert!(flow.store().get_all().is_empty());
    }

    #[test]
    fn test_capture_failure() {
        let flow = flow_at(1000);
        let identifier = StubIdentifier::returning("Rust", "Beans", 0.9);
        let outcome = block_on(flow.run(&mut FailingCamera, &identifier, &StubRecommender::ok()));

        assert!(matches!(outcome, FlowOutcome::Failed(Error::Capture(_))));
        assert_eq!(identifier.calls.get(), 0);
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn test_invalid_data_url_source() {
        let flow = flow_at(1000);
        let outcome = block_on(flow.run(
            &mut DataUrlSource("leaf.jpg".to_string()),
            &StubIdentifier::returning("Rust", "Beans", 0.9),
            &StubRecommender::ok(),
        ));
        assert!(matches!(outcome, FlowOutcome::Failed(Error::Capture(_))));
    }

    #[test]
    fn test_state_transitions_success() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let flow = flow_at(1000).with_observer(move |s| sink.borrow_mut().push(s));

        block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::returning("Rust", "Beans", 0.9),
            &StubRecommender::ok(),
        ));

        assert_eq!(
            *seen.borrow(),
            vec![
                FlowState::Capturing,
                FlowState::Identifying,
                FlowState::Recommending,
                FlowState::Done,
                FlowState::Idle,
            ]
        );
    }

    #[test]
    fn test_state_transitions_failure() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let flow = flow_at(1000).with_observer(move |s| sink.borrow_mut().push(s));

        block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::failing(),
            &StubRecommender::ok(),
        ));

        assert_eq!(
            *seen.borrow(),
            vec![
                FlowState::Capturing,
                FlowState::Identifying,
                FlowState::Error,
                FlowState::Idle,
            ]
        );
    }

    #[test]
    fn test_ids_unique_with_frozen_clock() {
        let flow = flow_at(5000);
        let identifier = StubIdentifier::returning("Rust", "Beans", 0.9);
        let recommender = StubRecommender::ok();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let outcome = block_on(flow.run(&mut DataUrlSource(IMAGE.to_string()), &identifier, &recommender));
            ids.push(outcome.stored_id().unwrap().to_string());
        }

        assert_eq!(ids, vec!["5000", "5001", "5002"]);
        let stored: Vec<String> = flow.store().get_all().into_iter().map(|r| r.id).collect();
        assert_eq!(stored, vec!["5002", "5001", "5000"]);
    }

    #[test]
    fn test_ids_skip_existing_records() {
        let store = MemoryHistory::in_memory();
        store.add(DetectionResult::new("9000", 9000, IMAGE, Identification::default(), None));

        let flow = DetectionFlow::new(store, || 9000);
        let outcome = block_on(flow.run(
            &mut DataUrlSource(IMAGE.to_string()),
            &StubIdentifier::returning("Rust", "Beans", 0.9),
            &StubRecommender::ok(),
        ));

        assert_eq!(outcome.stored_id(), Some("9001"));
        assert_eq!(flow.store().get_all().len(), 2);
    }

    #[test]
    fn test_flow_state_busy() {
        assert!(!FlowState::Idle.is_busy());
        assert!(FlowState::Identifying.is_busy());
        assert!(FlowState::Recommending.is_busy());
        assert!(!FlowState::Error.is_busy());
        assert_eq!(FlowState::Recommending.to_string(), "recommending");
    }
}
