pub mod engine;
pub mod extract;
pub mod filter;
pub mod harness;
pub mod report;
pub mod sandbox;
pub mod verifier;

pub use crate::domain::model::{
    CheckMode, CodeBlock, Document, DocumentReport, RunReport, Verdict, VerificationOutcome,
};
pub use crate::domain::ports::{ConfigProvider, Verifier};
pub use crate::utils::error::Result;
