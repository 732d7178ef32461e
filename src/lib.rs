//! Perceptron classifiers over small labeled tables.
//!
//! A CSV file is parsed into a [`Dataset`], split 80/20 by a [`Partitioner`]
//! and used to train either a single [`Perceptron`] or a one-vs-all
//! [`OneVsAll`] ensemble. Split datasets and trained models can be saved
//! and loaded again.

#[macro_use]
extern crate num_derive;

pub mod classifier;
pub mod codec;
pub mod dataset;
pub mod ensemble;
pub mod error;
pub mod label_encoder;
pub mod logging;
pub mod model;
pub mod perceptron;
pub mod split;
pub mod store;

pub use classifier::Classifier;
pub use dataset::{Dataset, Partition};
pub use ensemble::OneVsAll;
pub use error::{Error, Result};
pub use label_encoder::LabelEncoder;
pub use model::Model;
pub use perceptron::{Perceptron, PerceptronBuilder, TrainReport};
pub use split::Partitioner;
pub use store::ModelStore;
