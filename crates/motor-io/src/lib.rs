pub mod bridge;
pub mod inference;
pub mod metrics;
pub mod protocol;

pub use bridge::{Bridge, BridgeConfig, BridgeError, BridgeStats};
pub use inference::{
    Classifier, EdgeProcessor, InferenceError, InferenceFeatures, LabelMapping, MappingError,
    Prediction, PredictionMsg,
};
pub use metrics::{init_metrics, serve_metrics};
pub use protocol::{IncomingMessage, ProtocolVersion, SampleMsg, DEFAULT_TOPIC};
