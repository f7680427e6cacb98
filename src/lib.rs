//! Hyperspectral plant-phenotyping analysis workflow.
//!
//! The crate is the processing side of a UI-driven phenotyping setup: the
//! external configuration UI produces a settings mapping and owns a
//! feedback queue; one call to [`process::execute`] loads the configured
//! image cube, builds a binary mask, labels the objects inside the
//! UI-supplied ROIs, runs the configured analyses and reports a preview
//! image plus a results payload back through the queue.
//!
//! The mask-building step is replaceable per execution through the
//! [`mask::MaskProvider`] capability; the built-in provider thresholds a
//! single wavelength band.

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

pub mod analysis;
pub mod calibration;
pub mod feedback;
pub mod imageutil;
pub mod indices;
pub mod labeling;
pub mod loader;
pub mod mask;
pub mod process;
pub mod roi;
pub mod settings;
pub mod spectral;
pub mod ui;

pub use feedback::{FeedbackMessage, FeedbackSink};
pub use mask::{MaskProvider, WavelengthThresholdMask};
pub use process::execute;
pub use settings::Settings;
pub use spectral::SpectralArray;
