// THEORY:
// The learning layer answers the analysis question: do the six ocean statistics
// separate bad days from the rest? It offers two independent views of the same
// feature matrix:
//
// 1.  **Unsupervised**: k-means with two clusters, compared against the labels
//     through a confusion matrix. Good agreement means the classes form natural
//     groups in feature space.
// 2.  **Supervised**: an RBF support vector classifier scored by repeated random
//     train/test splits. The mean accuracy and its standard error tell how well
//     the labels can be predicted from the statistics at all.
//
// Every learner takes an `ndarray` matrix with one row per image and a binary
// target vector (`bad -> 0`, everything else `-> 1`). All randomness is driven by
// explicit seeds so a run can be reproduced exactly.

pub mod kmeans;
pub mod metrics;
pub mod scaler;
pub mod svm;
pub mod validation;

pub use kmeans::{KMeans, KMeansFit};
pub use metrics::ConfusionMatrix;
pub use scaler::StandardScaler;
pub use svm::{SupportVectorClassifier, SvcParams};
pub use validation::{ScoreSummary, ShuffleSplit};
