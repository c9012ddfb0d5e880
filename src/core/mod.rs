pub mod engine;
pub mod reconciler;
pub mod scheduler;
pub mod sizer;
