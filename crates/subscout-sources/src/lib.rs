//! # Subscout Sources
//!
//! Provider integrations implementing `subscout_core::Source`.
//!
//! | source | default | recursive | key |
//! |---|---|---|---|
//! | alienvault | yes | yes | no |
//! | anubis | yes | no | no |
//! | certspotter | yes | yes | token |
//! | crtsh | yes | yes | no |
//! | fofa | yes | no | `email:key` |
//! | hackertarget | yes | yes | no |
//! | securitytrails | yes | yes | token |
//!
//! Every provider accepts `with_base_url` so tests can point it at a mock server.

mod alienvault;
mod anubis;
mod certspotter;
mod crtsh;
mod decode;
mod fofa;
mod hackertarget;
mod securitytrails;

use std::sync::Arc;

use subscout_core::Source;

pub use alienvault::AlienVault;
pub use anubis::Anubis;
pub use certspotter::CertSpotter;
pub use crtsh::Crtsh;
pub use fofa::Fofa;
pub use hackertarget::HackerTarget;
pub use securitytrails::SecurityTrails;

/// Every known provider, in catalogue order
pub fn all_sources() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(AlienVault::new()),
        Arc::new(Anubis::new()),
        Arc::new(CertSpotter::new()),
        Arc::new(Crtsh::new()),
        Arc::new(Fofa::new()),
        Arc::new(HackerTarget::new()),
        Arc::new(SecurityTrails::new()),
    ]
}
