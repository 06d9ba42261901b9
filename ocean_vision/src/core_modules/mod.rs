pub mod boundary;
pub mod channel;
pub mod contour;
pub mod day_class;
pub mod edge_map;
pub mod features;
pub mod histogram;
pub mod morphology;
pub mod utils;
pub mod watershed;
