//! Signal processing collaborators consumed by SSD: band-pass filtering and spectral
//! estimation, with the window functions they share.

pub mod filter;
pub mod spectral;
pub mod traits;
pub mod windows;
