//! Detection building blocks: the upload heuristic, the mock predictor and
//! upload storage

pub mod predictor;
pub mod storage;
pub mod validate;

pub use predictor::{MockPredictor, Prediction};
pub use storage::{remove_upload, store_upload};
pub use validate::{inspect_image, validate_image, ImageCheck, NOT_A_CROP_MESSAGE};
