pub mod answers;
pub mod knockout;
pub mod matchers;
pub mod policy;
pub mod result;
pub mod scoring;
pub mod weights;
