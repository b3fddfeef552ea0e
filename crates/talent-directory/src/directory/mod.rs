//! Admin console and public directory over the record store, plus the HTTP
//! router that fronts it together with the import pipeline.

pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use router::{directory_router, DirectoryState};
pub use service::{
    CertificateDraft, ChallengeScore, DirectoryError, DirectoryQuery, DirectoryService, PublicCard,
};
