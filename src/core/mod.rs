//! Monitoring core: asset registry, log filter, balance diff, classifier,
//! dispatcher, and the per-notification pipeline tying them together.

pub mod asset_registry;
pub mod balance_diff;
pub mod classifier;
pub mod dispatcher;
pub mod log_filter;
pub mod pipeline;

pub use asset_registry::ReferenceAssetRegistry;
pub use balance_diff::{BalanceDiff, MATERIAL_CHANGE_EPSILON, diff};
pub use classifier::{classify, extract_buy_detail, extract_sell_detail};
pub use dispatcher::{EventDispatcher, EventSink, FnSink, NoopSink, render};
pub use pipeline::EventPipeline;
